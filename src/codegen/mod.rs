//! # mbed Code Generation
//!
//! C++ code generation for mbed block graphs.

mod context;
mod mbed_codegen;
mod node_handlers;
mod precedence;
mod registry;
mod reservation;
pub mod text;

pub use context::GenerationContext;
pub use mbed_codegen::*;
pub use precedence::{parenthesize, Precedence};
pub use registry::{Registries, Sections, MBED_INCLUDE};
pub use reservation::{PinRole, Reservation, ReservationTracker};
