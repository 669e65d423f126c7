//! Copy-set and batch copy job tasks.

use serde::{Deserialize, Serialize};

use datacopy_core::error::AppError;
use datacopy_core::types::{DataUri, JobId};
use datacopy_entity::data::DataRef;
use datacopy_entity::job::{CopyJobState, CopyJobStatus, JobSubmission, JobSummary};
use datacopy_service::ServiceContext;

use crate::output;

/// Event for `decompose`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposeEvent {
    source_uri_list: Vec<DataUri>,
    destination_uri: DataUri,
}

/// Event for `expand-folder`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandFolderEvent {
    source_uri: DataUri,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UriList {
    uri_list: Vec<DataUri>,
}

/// Event for `submit` and `launch`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvent {
    destination_data: DataRef,
    source_data_list: Vec<DataRef>,
}

/// Event for `poll`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollEvent {
    #[serde(alias = "job_id")]
    job_id: JobId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollOutput {
    job_id: JobId,
    provider_status: CopyJobStatus,
    status: JobSummary,
}

/// Event for `advance`: the caller-persisted state plus the original request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceEvent {
    job_state: CopyJobState,
    destination_data: DataRef,
    source_data_list: Vec<DataRef>,
}

pub async fn decompose(ctx: &ServiceContext, event: DecomposeEvent) -> Result<(), AppError> {
    let plan = ctx
        .decomposer()
        .decompose(&event.source_uri_list, &event.destination_uri)
        .await?;
    output::print_outcome(&plan)
}

pub async fn expand_folder(ctx: &ServiceContext, event: ExpandFolderEvent) -> Result<(), AppError> {
    let uri_list = ctx.decomposer().expand_folder(&event.source_uri).await?;
    output::print_outcome(&UriList { uri_list })
}

pub async fn submit(ctx: &ServiceContext, event: SubmitEvent) -> Result<(), AppError> {
    let job_id = ctx
        .lifecycle()
        .submit(&event.destination_data, &event.source_data_list)
        .await?;
    output::print_outcome(&JobSubmission { job_id })
}

pub async fn launch(ctx: &ServiceContext, event: SubmitEvent) -> Result<(), AppError> {
    let state = ctx
        .lifecycle()
        .launch(&event.destination_data, &event.source_data_list)
        .await?;
    output::print_outcome(&state)
}

pub async fn poll(ctx: &ServiceContext, event: PollEvent) -> Result<(), AppError> {
    let provider_status = ctx.lifecycle().poll(&event.job_id).await?;
    output::print_outcome(&PollOutput {
        job_id: event.job_id,
        provider_status,
        status: provider_status.summarize(),
    })
}

pub async fn advance(ctx: &ServiceContext, event: AdvanceEvent) -> Result<(), AppError> {
    let state = ctx
        .lifecycle()
        .advance(
            event.job_state,
            &event.destination_data,
            &event.source_data_list,
        )
        .await?;
    output::print_outcome(&state)
}
