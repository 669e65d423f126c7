//! Rename of copied objects and the mapping that locates them.

pub mod mapping;
pub mod service;

pub use mapping::RenameMapper;
pub use service::RenameService;
