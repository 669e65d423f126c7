//! Rename tasks.

use serde::Deserialize;

use datacopy_core::error::AppError;
use datacopy_core::types::{DataId, DataUri, ProjectId};
use datacopy_entity::data::DataRef;
use datacopy_entity::rename::RenameMappingRequest;
use datacopy_entity::transfer::TransferOutcome;
use datacopy_service::ServiceContext;

use crate::output;

/// Event for `rename`; the output of `renaming-map-params` fits it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameEvent {
    project_id: ProjectId,
    input_data_id: DataId,
    output_data_uri: DataUri,
}

/// Event for `complete-rename`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRenameEvent {
    project_id: ProjectId,
    input_data_id: DataId,
}

pub async fn renaming_map_params(
    ctx: &ServiceContext,
    event: RenameMappingRequest,
) -> Result<(), AppError> {
    let mapping = ctx.rename_mapper().renaming_map_params(&event).await?;
    output::print_outcome(&mapping)
}

pub async fn rename(ctx: &ServiceContext, event: RenameEvent) -> Result<(), AppError> {
    let source = DataRef::new(event.project_id, event.input_data_id);
    let outcome = ctx.renamer().rename(&source, &event.output_data_uri).await?;
    output::print_outcome(&outcome)
}

pub async fn complete_rename(ctx: &ServiceContext, event: CompleteRenameEvent) -> Result<(), AppError> {
    let source = DataRef::new(event.project_id, event.input_data_id);
    ctx.renamer().complete_rename(&source).await?;
    output::print_outcome(&TransferOutcome::Success)
}
