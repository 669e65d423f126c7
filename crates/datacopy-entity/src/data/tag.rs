//! Content tags and the multi-part heuristic.
//!
//! S3-backed storage reports an entity tag per object. Objects written by a
//! multipart upload carry a tag of the form `{hash}-{partCount}`; this is the
//! only signal used to tell the two shapes apart.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MULTI_PART_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\w+-\d+)$").expect("multi-part tag pattern is valid"));

/// How an object was originally written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartStructure {
    /// Written by a multipart upload.
    MultiPart,
    /// Written by a single PUT.
    SinglePart,
}

/// Opaque content tag of an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectTag(pub String);

impl ObjectTag {
    /// Wrap a raw tag string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the tag. The whole tag must match `\w+-\d+`.
    pub fn part_structure(&self) -> PartStructure {
        if MULTI_PART_TAG.is_match(&self.0) {
            PartStructure::MultiPart
        } else {
            PartStructure::SinglePart
        }
    }

    /// Whether the tag identifies a multipart-uploaded object.
    pub fn is_multi_part(&self) -> bool {
        self.part_structure() == PartStructure::MultiPart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_part_tag() {
        assert!(ObjectTag::new("a1b2c3-5").is_multi_part());
        assert!(ObjectTag::new("d41d8cd98f00b204e9800998ecf8427e-12").is_multi_part());
    }

    #[test]
    fn test_single_part_tag() {
        assert!(!ObjectTag::new("a1b2c3d4e5f6").is_multi_part());
        assert_eq!(
            ObjectTag::new("a1b2c3d4e5f6").part_structure(),
            PartStructure::SinglePart
        );
    }

    #[test]
    fn test_requires_full_match() {
        assert!(!ObjectTag::new("\"a1b2c3-5\"").is_multi_part());
        assert!(!ObjectTag::new("a1b2c3-5x").is_multi_part());
        assert!(!ObjectTag::new("-5").is_multi_part());
        assert!(!ObjectTag::new("").is_multi_part());
    }
}
