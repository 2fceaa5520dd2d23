//! # Generation Context
//!
//! Mutable state of a single generation pass. A fresh context is created for
//! every call to the generator and consumed when the program is assembled, so
//! no registration or reservation leaks from one pass into the next.

use super::registry::Registries;
use super::reservation::{PinRole, ReservationTracker};
use crate::board::BoardProfile;
use crate::config::ReservationPolicy;
use crate::error::BlockWarning;

#[derive(Debug)]
pub struct GenerationContext {
    pub registries: Registries,
    pub reservations: ReservationTracker,
    warnings: Vec<BlockWarning>,
}

impl GenerationContext {
    pub fn new(policy: ReservationPolicy) -> Self {
        Self {
            registries: Registries::new(),
            reservations: ReservationTracker::new(policy),
            warnings: Vec::new(),
        }
    }

    /// Record a warning. A second warning with the same block and tag
    /// replaces the first.
    pub fn warn(&mut self, warning: BlockWarning) {
        tracing::warn!(
            "[CODEGEN] Block {} [{}]: {}",
            warning.block_id,
            warning.tag,
            warning.message
        );
        match self
            .warnings
            .iter_mut()
            .find(|w| w.block_id == warning.block_id && w.tag == warning.tag)
        {
            Some(existing) => *existing = warning,
            None => self.warnings.push(warning),
        }
    }

    pub fn reserve(
        &mut self,
        block_id: &str,
        pin: &str,
        role: PinRole,
        purpose: &str,
        board: &BoardProfile,
    ) {
        for warning in self.reservations.reserve(block_id, pin, role, purpose, board) {
            self.warn(warning);
        }
    }

    pub fn warnings(&self) -> &[BlockWarning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Registries, Vec<BlockWarning>) {
        (self.registries, self.warnings)
    }
}
