//! Decomposition of a copy request into per-folder jobs.
//!
//! Each batch copy job carries at most one folder's worth of files: files
//! listed directly go into the flat list, and every folder source becomes a
//! sub-job that the caller decomposes again on its own.

use std::sync::Arc;

use tracing::info;

use datacopy_core::error::AppError;
use datacopy_core::types::DataUri;
use datacopy_entity::copy::{CopySetPlan, RecursiveCopyJob};
use datacopy_storage::DataStore;

use crate::resolver::DataResolver;

/// Splits a source list against one destination folder.
#[derive(Debug, Clone)]
pub struct CopySetDecomposer {
    /// Remote storage service.
    store: Arc<dyn DataStore>,
    /// Locator resolver.
    resolver: DataResolver,
}

impl CopySetDecomposer {
    /// Creates a new decomposer.
    pub fn new(store: Arc<dyn DataStore>, resolver: DataResolver) -> Self {
        Self { store, resolver }
    }

    /// Partition `sources` into a flat file list and one sub-job per folder.
    ///
    /// The destination must be a folder locator and is created if missing.
    pub async fn decompose(
        &self,
        sources: &[DataUri],
        destination: &DataUri,
    ) -> Result<CopySetPlan, AppError> {
        if !destination.is_folder() {
            return Err(AppError::invalid_destination(format!(
                "Destination URI {destination} must end with '/'"
            )));
        }

        let destination_folder = self.resolver.resolve_or_create_folder(destination).await?;
        let destination_uri = destination_folder.uri(self.resolver.scheme());

        let mut source_data_list = Vec::new();
        let mut recursive_copy_jobs_uri_list = Vec::new();

        for source in sources {
            let descriptor = self.resolver.resolve_uri(source).await?;
            if descriptor.is_file() {
                source_data_list.push(descriptor.data_ref());
            } else {
                recursive_copy_jobs_uri_list.push(RecursiveCopyJob {
                    source_uri: descriptor.uri(self.resolver.scheme()),
                    destination_uri: destination_uri.join_folder(&descriptor.name),
                });
            }
        }

        info!(
            destination = %destination_uri,
            files = source_data_list.len(),
            folders = recursive_copy_jobs_uri_list.len(),
            "Decomposed copy set"
        );

        Ok(CopySetPlan {
            source_data_list,
            destination_data: destination_folder.data_ref(),
            recursive_copy_jobs_uri_list,
        })
    }

    /// Immediate children of a folder as locators; folders end with `/`.
    pub async fn expand_folder(&self, source: &DataUri) -> Result<Vec<DataUri>, AppError> {
        let folder = self.resolver.resolve_uri(&source.as_folder()).await?;
        let children = self
            .store
            .list_children(&folder.project_id, &folder.data_id)
            .await?;
        Ok(children
            .iter()
            .map(|child| {
                let uri = child.uri(self.resolver.scheme());
                if child.is_folder() {
                    uri.as_folder()
                } else {
                    uri
                }
            })
            .collect())
    }
}
