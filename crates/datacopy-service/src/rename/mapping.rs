//! Locating the copy of an object so it can be renamed in place.

use datacopy_core::error::AppError;
use datacopy_core::types::DataUri;
use datacopy_entity::data::{DataDescriptor, DataRef};
use datacopy_entity::rename::{RenameMapping, RenameMappingRequest};

use crate::resolver::DataResolver;

/// Maps an original object and a new name onto the copied object and its
/// final location.
#[derive(Debug, Clone)]
pub struct RenameMapper {
    /// Locator resolver.
    resolver: DataResolver,
}

impl RenameMapper {
    /// Creates a new mapper.
    pub fn new(resolver: DataResolver) -> Self {
        Self { resolver }
    }

    /// Compute the rename parameters for one object of a finished copy.
    ///
    /// An `inputFileUri` under one of the listed sources maps directly to
    /// `destination/<name>`. Otherwise `dataId` is looked up among the
    /// sources: a file source maps to `destination/<name>`, an object inside
    /// a folder source maps to `destination/<folder>/<relative dir>/<name>`.
    pub async fn renaming_map_params(
        &self,
        request: &RenameMappingRequest,
    ) -> Result<RenameMapping, AppError> {
        validate_output_name(&request.output_file_name)?;
        if request.data_id.is_none() && request.input_file_uri.is_none() {
            return Err(AppError::validation(
                "One of dataId or inputFileUri is required",
            ));
        }

        let destination = self
            .resolver
            .resolve_uri(&request.destination_uri.as_folder())
            .await?
            .uri(self.resolver.scheme());

        if let Some(input) = &request.input_file_uri {
            let listed = request
                .external_source_uri_list
                .iter()
                .cloned()
                .chain(request.source_uri_list.iter().map(ToString::to_string))
                .any(|source| input.starts_with(&source));
            if listed {
                let name = input.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
                return self.mapping(&destination, name, &request.output_file_name).await;
            }
        }

        let data_id = request.data_id.as_ref().ok_or_else(|| {
            AppError::validation("dataId is required when inputFileUri is not one of the sources")
        })?;

        for source_uri in &request.source_uri_list {
            let source = self.resolver.resolve_uri(source_uri).await?;
            if source.is_file() {
                if &source.data_id == data_id {
                    return self
                        .mapping(&destination, &source.name, &request.output_file_name)
                        .await;
                }
                continue;
            }

            let original = match self
                .resolver
                .resolve_ref(&DataRef::new(source.project_id.clone(), data_id.clone()))
                .await
            {
                Ok(found) => found,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let Some(relative) = original.path.strip_prefix(source.path.as_str()) else {
                continue;
            };
            let relative_dir = relative.rfind('/').map_or("", |idx| &relative[..=idx]);
            let copied_folder = DataUri::new(
                destination.scheme.clone(),
                destination.project_id.clone(),
                format!("{}{}/{relative_dir}", destination.path, source.name),
            );
            return self
                .mapping(&copied_folder, &original.name, &request.output_file_name)
                .await;
        }

        Err(AppError::not_found(format!(
            "{data_id} is not one of the sources or inside a source folder"
        )))
    }

    async fn mapping(
        &self,
        folder: &DataUri,
        copied_name: &str,
        output_file_name: &str,
    ) -> Result<RenameMapping, AppError> {
        let copied: DataDescriptor = self.resolver.resolve_uri(&folder.join_file(copied_name)).await?;
        let file_size_in_bytes = copied
            .file_size_in_bytes
            .ok_or_else(|| AppError::external_service(format!("{} has no size", copied.path)))?;
        Ok(RenameMapping {
            project_id: copied.project_id,
            input_data_id: copied.data_id,
            output_data_uri: folder.join_file(output_file_name),
            file_size_in_bytes,
        })
    }
}

/// A new object name must be a single, real path component.
pub fn validate_output_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(AppError::validation(format!(
            "outputFileName '{name}' must be a plain file name"
        )));
    }
    Ok(())
}
