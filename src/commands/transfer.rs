//! Classification and single-object upload tasks.

use serde::{Deserialize, Serialize};

use datacopy_core::error::AppError;
use datacopy_core::types::S3Uri;
use datacopy_entity::data::DataRef;
use datacopy_entity::rename::ExternalSourceMetadata;
use datacopy_service::ServiceContext;

use crate::output;

/// Event for `find-single-part-files`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataListEvent {
    data_list: Vec<DataRef>,
}

/// Event for `get-source-file-size`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDataEvent {
    source_data: DataRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileSize {
    file_size_in_bytes: u64,
}

/// Event for `external-source-metadata`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSourceEvent {
    source_uri: S3Uri,
}

/// Event for `upload-single-part`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSinglePartEvent {
    source_data: DataRef,
    destination_data: DataRef,
}

/// Event for `upload-external`. Size and shape are looked up when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadExternalEvent {
    source_uri: S3Uri,
    destination_data: DataRef,
    #[serde(default)]
    source_file_size_in_bytes: Option<u64>,
    #[serde(default)]
    is_multipart_file: Option<bool>,
}

pub async fn find_single_part_files(ctx: &ServiceContext, event: DataListEvent) -> Result<(), AppError> {
    let partition = ctx.classifier().partition(&event.data_list).await?;
    output::print_outcome(&partition)
}

pub async fn get_source_file_size(ctx: &ServiceContext, event: SourceDataEvent) -> Result<(), AppError> {
    let file_size_in_bytes = ctx.resolver().source_file_size(&event.source_data).await?;
    output::print_outcome(&FileSize { file_size_in_bytes })
}

pub async fn external_source_metadata(
    ctx: &ServiceContext,
    event: ExternalSourceEvent,
) -> Result<(), AppError> {
    let metadata = ctx
        .external_transfers()
        .source_metadata(&event.source_uri)
        .await?;
    output::print_outcome(&metadata)
}

pub async fn upload_single_part(
    ctx: &ServiceContext,
    event: UploadSinglePartEvent,
) -> Result<(), AppError> {
    let outcome = ctx
        .transfers()
        .upload_single_part(&event.source_data, &event.destination_data)
        .await?;
    output::print_outcome(&outcome)
}

pub async fn upload_external(ctx: &ServiceContext, event: UploadExternalEvent) -> Result<(), AppError> {
    let metadata = match (event.source_file_size_in_bytes, event.is_multipart_file) {
        (Some(source_file_size_in_bytes), Some(is_multipart_file)) => Some(ExternalSourceMetadata {
            source_file_size_in_bytes,
            is_multipart_file,
        }),
        _ => None,
    };
    let outcome = ctx
        .external_transfers()
        .upload_external(&event.source_uri, &event.destination_data, metadata)
        .await?;
    output::print_outcome(&outcome)
}
