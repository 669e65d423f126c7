//! Object lifecycle status as reported by the storage service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a data object in the remote storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStatus {
    /// Created but not fully written; may be the residue of an interrupted upload.
    Partial,
    /// Fully written and readable.
    Available,
    /// Moving to archive storage.
    Archiving,
    /// In archive storage.
    Archived,
    /// Being restored from archive storage.
    Unarchiving,
    /// Scheduled for deletion.
    Deleting,
}

impl DataStatus {
    /// Whether the object is the residue of an incomplete write.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial)
    }

    /// Return the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partial => "PARTIAL",
            Self::Available => "AVAILABLE",
            Self::Archiving => "ARCHIVING",
            Self::Archived => "ARCHIVED",
            Self::Unarchiving => "UNARCHIVING",
            Self::Deleting => "DELETING",
        }
    }
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let status: DataStatus = serde_json::from_str("\"PARTIAL\"").unwrap();
        assert!(status.is_partial());
        assert_eq!(
            serde_json::to_string(&DataStatus::Available).unwrap(),
            "\"AVAILABLE\""
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(serde_json::from_str::<DataStatus>("\"MYSTERY\"").is_err());
    }
}
