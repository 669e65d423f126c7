//! Partition of objects by how they were written.

use serde::{Deserialize, Serialize};

use super::descriptor::DataRef;

/// Objects split by part structure, preserving input order within each list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartStructurePartition {
    /// Objects written by a multipart upload.
    pub multi_part_data_list: Vec<DataRef>,
    /// Objects written by a single PUT.
    pub single_part_data_list: Vec<DataRef>,
}
