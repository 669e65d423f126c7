//! Resolution of locators into data descriptors.

use std::sync::Arc;

use tracing::{debug, info};

use datacopy_core::error::AppError;
use datacopy_core::types::{DataLocator, DataUri};
use datacopy_entity::data::{DataDescriptor, DataRef, DataType};
use datacopy_storage::DataStore;

/// Turns URIs and identifier pairs into fresh [`DataDescriptor`]s.
#[derive(Debug, Clone)]
pub struct DataResolver {
    /// Remote storage service.
    store: Arc<dyn DataStore>,
}

impl DataResolver {
    /// Creates a new resolver.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// URI scheme of the underlying store.
    pub fn scheme(&self) -> &str {
        self.store.scheme()
    }

    /// Resolve any locator. Read-only.
    pub async fn resolve(&self, locator: &DataLocator) -> Result<DataDescriptor, AppError> {
        debug!(%locator, "Resolving");
        match locator {
            DataLocator::Uri(uri) => self.resolve_uri(uri).await,
            DataLocator::Id {
                project_id,
                data_id,
            } => self.store.get_by_id(project_id, data_id).await,
        }
    }

    /// Resolve an identifier pair.
    pub async fn resolve_ref(&self, data_ref: &DataRef) -> Result<DataDescriptor, AppError> {
        self.resolve(&data_ref.locator()).await
    }

    /// Resolve a path locator. A trailing `/` selects folders, anything else files.
    pub async fn resolve_uri(&self, uri: &DataUri) -> Result<DataDescriptor, AppError> {
        let data_type = if uri.is_folder() {
            DataType::Folder
        } else {
            DataType::File
        };
        let mut candidates = self
            .store
            .find_by_path(&uri.project_id, &uri.path, data_type)
            .await?;

        match candidates.len() {
            0 => Err(AppError::not_found(format!("No object at {uri}"))),
            1 => Ok(candidates.remove(0)),
            count => {
                let mut exact: Vec<_> = candidates.into_iter().filter(|d| d.path == uri.path).collect();
                if exact.len() == 1 {
                    Ok(exact.remove(0))
                } else {
                    Err(AppError::ambiguous_path(format!(
                        "{count} objects match {uri}"
                    )))
                }
            }
        }
    }

    /// Resolve a folder locator, creating it and any missing parents.
    pub async fn resolve_or_create_folder(&self, uri: &DataUri) -> Result<DataDescriptor, AppError> {
        if !uri.is_folder() {
            return Err(AppError::invalid_destination(format!(
                "Destination {uri} must end with '/'"
            )));
        }

        let mut missing = Vec::new();
        let mut cursor = uri.clone();
        let mut current = loop {
            match self.resolve_uri(&cursor).await {
                Ok(found) => break found,
                Err(e) if e.is_not_found() && cursor.path != "/" => {
                    missing.push(cursor.name().to_string());
                    cursor = cursor.parent();
                }
                Err(e) => return Err(e),
            }
        };

        for name in missing.iter().rev() {
            info!(project_id = %uri.project_id, parent = %current.path, name = %name, "Creating folder");
            current = self
                .store
                .create_folder(&uri.project_id, &current.path, name)
                .await?;
        }
        Ok(current)
    }

    /// Resolve an identifier pair that must name a folder.
    pub async fn resolve_folder_ref(&self, data_ref: &DataRef) -> Result<DataDescriptor, AppError> {
        let folder = self.resolve_ref(data_ref).await?;
        if !folder.is_folder() {
            return Err(AppError::invalid_destination(format!(
                "{} is not a folder",
                folder.path
            )));
        }
        Ok(folder)
    }

    /// Look a file up inside a folder by name. `Ok(None)` when absent.
    pub async fn find_in_folder(
        &self,
        folder: &DataDescriptor,
        name: &str,
    ) -> Result<Option<DataDescriptor>, AppError> {
        let uri = folder.uri(self.scheme()).join_file(name);
        match self.resolve_uri(&uri).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Size of a file in bytes.
    pub async fn source_file_size(&self, data_ref: &DataRef) -> Result<u64, AppError> {
        let file = self.resolve_ref(data_ref).await?;
        if !file.is_file() {
            return Err(AppError::validation(format!("{} is not a file", file.path)));
        }
        file.file_size_in_bytes
            .ok_or_else(|| AppError::external_service(format!("{} has no size", file.path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datacopy_core::ErrorKind;
    use datacopy_storage::providers::MemoryDataStore;

    fn setup() -> (Arc<MemoryDataStore>, DataResolver) {
        let store = Arc::new(MemoryDataStore::new());
        let resolver = DataResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn test_resolve_file_and_folder() {
        let (store, resolver) = setup();
        store.add_file("p", "/in/a.txt", 5, None);

        let file = resolver
            .resolve_uri(&DataUri::parse("icav2://p/in/a.txt").unwrap())
            .await
            .unwrap();
        assert_eq!(file.size(), 5);

        let folder = resolver
            .resolve_uri(&DataUri::parse("icav2://p/in/").unwrap())
            .await
            .unwrap();
        assert!(folder.is_folder());
    }

    #[tokio::test]
    async fn test_resolve_by_uri_and_by_id_agree() {
        let (store, resolver) = setup();
        let added = store.add_file("p", "/in/a.txt", 5, None);

        let by_uri = resolver
            .resolve(&DataLocator::from(DataUri::parse("icav2://p/in/a.txt").unwrap()))
            .await
            .unwrap();
        let by_id = resolver
            .resolve(&DataLocator::id(added.project_id.clone(), added.data_id.clone()))
            .await
            .unwrap();
        assert_eq!(by_uri, by_id);
        assert_eq!(by_id.data_id, added.data_id);

        let err = resolver
            .resolve(&DataRef::new("p", "fil.missing").locator())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_trailing_slash_selects_type() {
        let (store, resolver) = setup();
        store.add_file("p", "/in/a.txt", 5, None);
        let err = resolver
            .resolve_uri(&DataUri::parse("icav2://p/in/a.txt/").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_case_variants_are_ambiguous_without_exact_match() {
        let (store, resolver) = setup();
        store.add_file("p", "/in/A.txt", 1, None);
        store.add_file("p", "/in/a.TXT", 1, None);
        let err = resolver
            .resolve_uri(&DataUri::parse("icav2://p/in/a.txt").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AmbiguousPath);

        let exact = resolver
            .resolve_uri(&DataUri::parse("icav2://p/in/A.txt").unwrap())
            .await
            .unwrap();
        assert_eq!(exact.path, "/in/A.txt");
    }

    #[tokio::test]
    async fn test_resolve_or_create_folder_creates_parents() {
        let (store, resolver) = setup();
        store.add_folder("p", "/out/");
        let folder = resolver
            .resolve_or_create_folder(&DataUri::parse("icav2://p/out/x/y/").unwrap())
            .await
            .unwrap();
        assert_eq!(folder.path, "/out/x/y/");
        assert!(store.find("p", "/out/x/").is_some());

        let again = resolver
            .resolve_or_create_folder(&DataUri::parse("icav2://p/out/x/y/").unwrap())
            .await
            .unwrap();
        assert_eq!(again.data_id, folder.data_id);
    }

    #[tokio::test]
    async fn test_resolve_or_create_rejects_file_uri() {
        let (_, resolver) = setup();
        let err = resolver
            .resolve_or_create_folder(&DataUri::parse("icav2://p/out").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDestination);
    }
}
