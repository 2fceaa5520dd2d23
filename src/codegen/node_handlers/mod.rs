//! # Node-Specific Handlers
//!
//! Emission rules per block family. Each family module exposes an `emit`
//! function that returns `None` for kinds it does not own; [`emit`] asks the
//! families in turn.
//!
//! Handlers follow two conventions:
//! - peripheral wrapper names are `prefix + pin` (or `prefix + unit`), so every
//!   block touching the same pin in the same role lands on the same
//!   declaration key
//! - an empty socket falls back to a literal default instead of failing

mod filesystem;
mod io;
mod logic;
mod parser;
mod sensors;
mod serial;
mod servo;
mod spi;
mod time;
mod variables;

use super::mbed_codegen::{BlockCodeGenerator, Emission};
use super::precedence::Precedence;
use super::text;
use crate::graph::Block;

/// Slot used for function call arguments: anything except a bare comma
/// expression.
pub(crate) const ARGUMENT: Precedence = Precedence::Assignment;

type FamilyEmitter = fn(&mut BlockCodeGenerator<'_>, &Block) -> Option<Emission>;

const FAMILIES: &[FamilyEmitter] = &[
    logic::emit,
    io::emit,
    serial::emit,
    servo::emit,
    time::emit,
    spi::emit,
    sensors::emit,
    variables::emit,
    filesystem::emit,
    parser::emit,
];

/// Emit `block` with the handler registered for its kind.
pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    FAMILIES.iter().find_map(|family| family(gen, block))
}

pub(crate) fn statement(code: impl Into<String>) -> Option<Emission> {
    Some(Emission::Statement(code.into()))
}

pub(crate) fn value(code: impl Into<String>, order: Precedence) -> Option<Emission> {
    Some(Emission::Value(code.into(), order))
}

/// Arguments of a printf-style call: the `CONTENT` format expression and
/// the optional `CONTENT_STR` extra arguments.
pub(crate) struct FormatArgs {
    pub content: String,
    pub extra: Option<String>,
}

impl FormatArgs {
    /// Read the sockets, applying the trailing newline checkbox when present.
    pub fn read(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Self {
        let mut content = gen.value_or(block, "CONTENT", ARGUMENT, "0");
        if block.is_checked("NEW_LINE") {
            content = text::append_newline(&content);
        }
        let extra = gen.value_to_code(block, "CONTENT_STR", ARGUMENT);
        Self { content, extra }
    }

    /// `callee(leading..., content[, extra]);`
    pub fn call(&self, callee: &str, leading: &[&str]) -> String {
        let mut args: Vec<&str> = leading.to_vec();
        args.push(&self.content);
        if let Some(extra) = &self.extra {
            args.push(extra);
        }
        format!("{}({});\n", callee, args.join(","))
    }
}
