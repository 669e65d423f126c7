//! Classification of stored objects by how they were written.

use futures::future::try_join_all;
use tracing::info;

use datacopy_core::error::AppError;
use datacopy_entity::data::{DataRef, PartStructure, PartStructurePartition};

use crate::resolver::DataResolver;

/// Splits objects into multi-part and single-part lists by content tag.
#[derive(Debug, Clone)]
pub struct PartStructureClassifier {
    /// Locator resolver.
    resolver: DataResolver,
}

impl PartStructureClassifier {
    /// Creates a new classifier.
    pub fn new(resolver: DataResolver) -> Self {
        Self { resolver }
    }

    /// Part structure of one object. Objects without a tag are single-part.
    pub async fn classify(&self, data_ref: &DataRef) -> Result<PartStructure, AppError> {
        let descriptor = self.resolver.resolve_ref(data_ref).await?;
        Ok(if descriptor.is_multi_part() {
            PartStructure::MultiPart
        } else {
            PartStructure::SinglePart
        })
    }

    /// Partition `data_list`, preserving input order within each side.
    pub async fn partition(
        &self,
        data_list: &[DataRef],
    ) -> Result<PartStructurePartition, AppError> {
        let structures = try_join_all(data_list.iter().map(|r| self.classify(r))).await?;

        let mut partition = PartStructurePartition::default();
        for (data_ref, structure) in data_list.iter().zip(structures) {
            match structure {
                PartStructure::MultiPart => partition.multi_part_data_list.push(data_ref.clone()),
                PartStructure::SinglePart => {
                    partition.single_part_data_list.push(data_ref.clone())
                }
            }
        }

        info!(
            multi_part = partition.multi_part_data_list.len(),
            single_part = partition.single_part_data_list.len(),
            "Partitioned objects by part structure"
        );
        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datacopy_core::ErrorKind;
    use datacopy_storage::providers::MemoryDataStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_partition_by_tag() {
        let store = Arc::new(MemoryDataStore::new());
        let multi = store.add_file("p", "/in/a.bam", 10, Some("a1b2c3-5")).data_ref();
        let single = store.add_file("p", "/in/b.txt", 1, Some("a1b2c3d4e5f6")).data_ref();
        let untagged = store.add_file("p", "/in/c.txt", 1, None).data_ref();
        let classifier = PartStructureClassifier::new(DataResolver::new(store));

        let partition = classifier
            .partition(&[single.clone(), multi.clone(), untagged.clone()])
            .await
            .unwrap();
        assert_eq!(partition.multi_part_data_list, vec![multi]);
        assert_eq!(partition.single_part_data_list, vec![single, untagged]);
    }

    #[tokio::test]
    async fn test_unknown_object_fails() {
        let store = Arc::new(MemoryDataStore::new());
        let classifier = PartStructureClassifier::new(DataResolver::new(store));
        let err = classifier
            .partition(&[DataRef::new("p", "fil.missing")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
