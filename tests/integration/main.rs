//! End-to-end scenarios against the in-memory storage service.

mod helpers;

mod copy_test;
mod rename_test;
mod transfer_test;
