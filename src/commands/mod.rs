//! CLI command definitions and dispatch.

pub mod copy;
pub mod rename;
pub mod transfer;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;

use datacopy_core::config::AppConfig;
use datacopy_core::error::AppError;
use datacopy_service::ServiceContext;
use datacopy_storage::providers::IcaDataStore;
use datacopy_storage::s3::S3ExternalObjects;
use datacopy_storage::transfer::{ServerSideMove, SizeAwareStream, StreamedPipeCopy};
use datacopy_storage::TransferExecutors;

/// DataCopy: copy, move, and rename tasks for project-scoped storage
#[derive(Debug, Parser)]
#[command(name = "datacopy", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(long, default_value = "config")]
    pub config_dir: String,

    /// Configuration environment (overlay file name); falls back to DATACOPY_ENV
    #[arg(long)]
    pub env: Option<String>,

    /// JSON event; read from stdin when omitted
    #[arg(short, long, global = true)]
    pub event: Option<String>,

    /// Task to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level tasks
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split sources into a flat file list and per-folder sub-jobs
    Decompose,
    /// List a folder's immediate children as URIs
    ExpandFolder,
    /// Submit a batch copy job and print its id
    Submit,
    /// Submit a batch copy job and print the initial job state
    Launch,
    /// Read a job's status once
    Poll,
    /// Apply one retry-policy step to a job state
    Advance,
    /// Split objects into multi-part and single-part lists
    FindSinglePartFiles,
    /// Print the size of a stored file
    GetSourceFileSize,
    /// Print size and part structure of an external S3 object
    ExternalSourceMetadata,
    /// Copy one stored file into a folder, idempotently
    UploadSinglePart,
    /// Copy one external S3 object into a folder, idempotently
    UploadExternal,
    /// Locate a copied object and compute its rename target
    RenamingMapParams,
    /// Move a stored file to a new path or name
    Rename,
    /// Retry only the source delete of an incomplete rename
    CompleteRename,
}

impl Cli {
    /// Execute the selected task
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let ctx = build_context(config).await?;
        match &self.command {
            Commands::Decompose => copy::decompose(&ctx, self.read_event().await?).await,
            Commands::ExpandFolder => copy::expand_folder(&ctx, self.read_event().await?).await,
            Commands::Submit => copy::submit(&ctx, self.read_event().await?).await,
            Commands::Launch => copy::launch(&ctx, self.read_event().await?).await,
            Commands::Poll => copy::poll(&ctx, self.read_event().await?).await,
            Commands::Advance => copy::advance(&ctx, self.read_event().await?).await,
            Commands::FindSinglePartFiles => {
                transfer::find_single_part_files(&ctx, self.read_event().await?).await
            }
            Commands::GetSourceFileSize => {
                transfer::get_source_file_size(&ctx, self.read_event().await?).await
            }
            Commands::ExternalSourceMetadata => {
                transfer::external_source_metadata(&ctx, self.read_event().await?).await
            }
            Commands::UploadSinglePart => {
                transfer::upload_single_part(&ctx, self.read_event().await?).await
            }
            Commands::UploadExternal => {
                transfer::upload_external(&ctx, self.read_event().await?).await
            }
            Commands::RenamingMapParams => {
                rename::renaming_map_params(&ctx, self.read_event().await?).await
            }
            Commands::Rename => rename::rename(&ctx, self.read_event().await?).await,
            Commands::CompleteRename => {
                rename::complete_rename(&ctx, self.read_event().await?).await
            }
        }
    }

    /// Parse the event from `--event` or stdin.
    async fn read_event<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let raw = match &self.event {
            Some(event) => event.clone(),
            None => {
                let mut buffer = String::new();
                tokio::io::stdin().read_to_string(&mut buffer).await?;
                buffer
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| AppError::validation(format!("Invalid event: {e}")))
    }
}

/// Wire the production storage seams together.
async fn build_context(config: AppConfig) -> Result<ServiceContext, AppError> {
    // ── Step 1: Storage service provider ─────────────────────────
    let store = Arc::new(IcaDataStore::new(&config.store)?);

    // ── Step 2: External buckets (ambient AWS credentials) ───────
    let external = Arc::new(S3ExternalObjects::from_env().await);

    // ── Step 3: Transfer executors, one per strategy ─────────────
    let http = reqwest::Client::new();
    let executors = TransferExecutors::new()
        .with(Arc::new(StreamedPipeCopy::new(http.clone())))
        .with(Arc::new(SizeAwareStream::new(http, &config.transfer)))
        .with(Arc::new(ServerSideMove::new(&config.transfer)));

    tracing::debug!(scheme = %config.store.scheme, "Service context ready");
    Ok(ServiceContext::new(
        store,
        external,
        Arc::new(executors),
        Arc::new(config),
    ))
}
