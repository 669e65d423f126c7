//! Choice of transfer strategy from the shape of the source object.

use datacopy_entity::data::PartStructure;
use datacopy_entity::transfer::TransferStrategy;

/// Where the source object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Inside the storage service, reachable by identifier.
    Provider,
    /// In an external S3 bucket.
    External,
}

/// What should happen to the source after the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferIntent {
    /// Keep the source.
    Copy,
    /// Remove the source once the destination is written.
    Move,
}

/// Select a strategy. Every combination is listed explicitly.
pub fn select(
    origin: SourceOrigin,
    structure: PartStructure,
    intent: TransferIntent,
) -> TransferStrategy {
    match (origin, structure, intent) {
        (SourceOrigin::Provider, PartStructure::MultiPart, TransferIntent::Move) => {
            TransferStrategy::ServerSideMove
        }
        (SourceOrigin::Provider, PartStructure::MultiPart, TransferIntent::Copy) => {
            TransferStrategy::SizeAwareStream
        }
        (SourceOrigin::Provider, PartStructure::SinglePart, TransferIntent::Copy)
        | (SourceOrigin::Provider, PartStructure::SinglePart, TransferIntent::Move) => {
            TransferStrategy::StreamedPipeCopy
        }
        (SourceOrigin::External, PartStructure::MultiPart, TransferIntent::Copy)
        | (SourceOrigin::External, PartStructure::MultiPart, TransferIntent::Move) => {
            TransferStrategy::SizeAwareStream
        }
        (SourceOrigin::External, PartStructure::SinglePart, TransferIntent::Copy)
        | (SourceOrigin::External, PartStructure::SinglePart, TransferIntent::Move) => {
            TransferStrategy::StreamedPipeCopy
        }
    }
}
