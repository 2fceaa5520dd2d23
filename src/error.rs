//! # Errors and Block Warnings
//!
//! Error types for the block graph compiler.
//!
//! Only a handful of conditions are fatal to a whole generation pass (a missing
//! board profile, malformed JSON input). Everything else is reported as a
//! [`BlockWarning`]: a non-blocking annotation attached to the offending block
//! under a stable tag, so the editor can clear it once the user fixes the graph.

use crate::board::MapperKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Warning tag for a dropdown value that the active board no longer offers.
pub const TAG_STALE_OPTION: &str = "bPin";
/// Warning tag for a pin or unit missing from the board profile.
pub const TAG_UNKNOWN_RESOURCE: &str = "unknown_resource";
/// Warning tag for two incompatible reservations of one pin.
pub const TAG_PIN_CONFLICT: &str = "pin_conflict";
/// Warning tag for a block kind with no emission rule.
pub const TAG_UNKNOWN_BLOCK: &str = "unknown_block";
/// Warning tag for a statement block plugged into a value socket.
pub const TAG_STATEMENT_IN_VALUE: &str = "statement_in_value_socket";

/// Tags owned by the generation pass. A block keeps one of these only while
/// the latest pass still reports it.
pub const GENERATION_TAGS: [&str; 4] = [
    TAG_UNKNOWN_RESOURCE,
    TAG_PIN_CONFLICT,
    TAG_UNKNOWN_BLOCK,
    TAG_STATEMENT_IN_VALUE,
];

#[derive(Error, Debug)]
pub enum MbgcError {
    #[error("Board profile not found: {0}")]
    BoardNotFound(String),

    #[error("Unknown resource: {resource} is not present in the {mapper} mapper")]
    UnknownResource { resource: String, mapper: MapperKind },

    #[error("Pin {pin} is already reserved as {existing} by block {existing_block}; cannot reserve it as {requested}")]
    ResourceConflict {
        pin: String,
        existing: String,
        existing_block: String,
        requested: String,
    },

    /// A use block without its setup block, or a setup block whose paired
    /// pins belong to different units.
    #[error("{0}")]
    StructuralMismatch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MbgcError>;

/// A non-fatal annotation on a single block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWarning {
    pub block_id: String,
    pub tag: String,
    pub message: String,
}

impl BlockWarning {
    pub fn new(
        block_id: impl Into<String>,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            tag: tag.into(),
            message: message.into(),
        }
    }

    /// Wrap a recoverable error as a warning on `block_id`.
    pub fn from_error(block_id: impl Into<String>, tag: impl Into<String>, error: &MbgcError) -> Self {
        Self::new(block_id, tag, error.to_string())
    }
}

/// A warning removed from a block because the condition behind it is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedWarning {
    pub block_id: String,
    pub tag: String,
}

impl ClearedWarning {
    pub fn new(block_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            tag: tag.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MbgcError::UnknownResource {
            resource: "PC_13".to_string(),
            mapper: MapperKind::Serial,
        };
        assert_eq!(
            err.to_string(),
            "Unknown resource: PC_13 is not present in the serial mapper"
        );

        let err = MbgcError::ResourceConflict {
            pin: "PA_5".to_string(),
            existing: "OUTPUT".to_string(),
            existing_block: "b1".to_string(),
            requested: "PWM".to_string(),
        };
        assert!(err.to_string().contains("PA_5"));
        assert!(err.to_string().contains("PWM"));

        let err = MbgcError::StructuralMismatch("Serial_1 mismatches Serial_2".to_string());
        assert_eq!(err.to_string(), "Serial_1 mismatches Serial_2");
    }

    #[test]
    fn test_warning_from_error() {
        let err = MbgcError::BoardNotFound("uno".to_string());
        let warning = BlockWarning::from_error("b7", TAG_UNKNOWN_RESOURCE, &err);
        assert_eq!(warning.block_id, "b7");
        assert_eq!(warning.tag, "unknown_resource");
        assert_eq!(warning.message, "Board profile not found: uno");
    }
}
