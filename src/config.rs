//! # Compiler Options
//!
//! Knobs for a generation pass. Every field has a default, so an empty JSON
//! object is a valid configuration.

use crate::board::DEFAULT_BOARD;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// What to do when one pin is claimed for two incompatible roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationPolicy {
    /// Report a `pin_conflict` warning on the later block.
    #[default]
    Strict,
    /// Accept re-reservation silently.
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Board profile id looked up in the [`BoardRegistry`](crate::board::BoardRegistry)
    pub board: String,
    /// One level of indentation inside statement inputs
    pub indent: String,
    pub reservation_policy: ReservationPolicy,
    /// Wrap setup and loop bodies in `int main()`
    pub emit_main: bool,
    /// Emit the "auto-generated" banner
    pub header: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            board: DEFAULT_BOARD.to_string(),
            indent: "  ".to_string(),
            reservation_policy: ReservationPolicy::Strict,
            emit_main: true,
            header: true,
        }
    }
}

impl CompilerOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = board.into();
        self
    }

    pub fn with_reservation_policy(mut self, policy: ReservationPolicy) -> Self {
        self.reservation_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.board, "nucleo_f103rb");
        assert_eq!(options.indent, "  ");
        assert_eq!(options.reservation_policy, ReservationPolicy::Strict);
        assert!(options.emit_main);
        assert!(options.header);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options =
            CompilerOptions::from_json(r#"{ "reservation_policy": "permissive", "header": false }"#)
                .unwrap();
        assert_eq!(options.reservation_policy, ReservationPolicy::Permissive);
        assert!(!options.header);
        assert_eq!(options.board, DEFAULT_BOARD);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(CompilerOptions::from_json("{ board: }").is_err());
    }
}
