//! # Pin Reservation Tracker
//!
//! Records which role each pin is claimed for during one generation pass and
//! reports a conflict when a later block claims the same pin for an
//! incompatible role.

use crate::board::BoardProfile;
use crate::config::ReservationPolicy;
use crate::error::{BlockWarning, MbgcError, TAG_PIN_CONFLICT, TAG_UNKNOWN_RESOURCE};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinRole {
    Input,
    Output,
    Pwm,
    Servo,
    Stepper,
    Serial,
    I2c,
    Spi,
    Interrupt,
}

impl PinRole {
    /// Roles that may share a pin. An interrupt line can also be read
    /// as a plain input.
    pub fn compatible_with(self, other: PinRole) -> bool {
        self == other
            || matches!(
                (self, other),
                (PinRole::Input, PinRole::Interrupt) | (PinRole::Interrupt, PinRole::Input)
            )
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinRole::Input => "INPUT",
            PinRole::Output => "OUTPUT",
            PinRole::Pwm => "PWM",
            PinRole::Servo => "SERVO",
            PinRole::Stepper => "STEPPER",
            PinRole::Serial => "SERIAL",
            PinRole::I2c => "I2C",
            PinRole::Spi => "SPI",
            PinRole::Interrupt => "INTERRUPT",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub block_id: String,
    pub role: PinRole,
    pub purpose: String,
}

#[derive(Debug, Clone)]
pub struct ReservationTracker {
    policy: ReservationPolicy,
    pins: HashMap<String, Reservation>,
}

impl ReservationTracker {
    pub fn new(policy: ReservationPolicy) -> Self {
        Self {
            policy,
            pins: HashMap::new(),
        }
    }

    /// Claim `pin` for `role` on behalf of `block_id`.
    ///
    /// The first claim of a pin wins. A later incompatible claim yields a
    /// `pin_conflict` warning under the strict policy; a pin the board does
    /// not have yields an `unknown_resource` warning.
    pub fn reserve(
        &mut self,
        block_id: &str,
        pin: &str,
        role: PinRole,
        purpose: &str,
        board: &BoardProfile,
    ) -> Vec<BlockWarning> {
        let mut warnings = Vec::new();

        if pin.is_empty() {
            return warnings;
        }

        if !board.knows_pin(pin) {
            warnings.push(BlockWarning::new(
                block_id,
                TAG_UNKNOWN_RESOURCE,
                format!("Pin {} is not available on board {}", pin, board.id),
            ));
        }

        match self.pins.get(pin) {
            Some(existing) => {
                if self.policy == ReservationPolicy::Strict && !existing.role.compatible_with(role) {
                    let err = MbgcError::ResourceConflict {
                        pin: pin.to_string(),
                        existing: existing.role.to_string(),
                        existing_block: existing.block_id.clone(),
                        requested: role.to_string(),
                    };
                    warnings.push(BlockWarning::from_error(block_id, TAG_PIN_CONFLICT, &err));
                }
            }
            None => {
                tracing::debug!("[CODEGEN] Reserved {} as {} for {} ({})", pin, role, block_id, purpose);
                self.pins.insert(
                    pin.to_string(),
                    Reservation {
                        block_id: block_id.to_string(),
                        role,
                        purpose: purpose.to_string(),
                    },
                );
            }
        }

        warnings
    }

    pub fn get(&self, pin: &str) -> Option<&Reservation> {
        self.pins.get(pin)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
