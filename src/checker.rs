//! # Cross-Block Consistency Checker
//!
//! Validation pass run whenever the graph changes. It never touches generated
//! code; it only places or clears advisory warnings on blocks.
//!
//! Three rules are checked:
//! - a setup block whose paired pins (RX/TX, SDA/SCL) resolve to different
//!   units is flagged and its label reset to a neutral placeholder
//! - a block using a peripheral instance needs a top-level setup block of the
//!   same family for the same unit
//! - a literal tone frequency must lie in the range the PWM can produce

use crate::blocks::{self, Capability, PeripheralFamily};
use crate::board::BoardProfile;
use crate::error::{BlockWarning, MbgcError, TAG_UNKNOWN_RESOURCE};
use crate::graph::{Block, BlockGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// Warning tag for an out of range tone frequency.
pub const TAG_TONE: &str = "io_tone";

/// Frequencies a tone block can produce, in Hz.
pub const TONE_RANGE: RangeInclusive<f64> = 31.0..=65535.0;

const MISSING_SETUP: &str = "A setup block for %1 must be added to the workspace to use this block!";

pub use crate::error::ClearedWarning;

/// What one checker pass changed, for the host to re-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Warnings placed by this pass. Generation warnings are not included;
    /// they come from [`BlockGraph::apply_warnings`].
    pub set: Vec<BlockWarning>,
    /// Warnings this pass removed because their condition no longer holds
    pub cleared: Vec<ClearedWarning>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.set.is_empty()
    }

    pub fn warnings_for(&self, block_id: &str) -> impl Iterator<Item = &BlockWarning> {
        let block_id = block_id.to_string();
        self.set.iter().filter(move |w| w.block_id == block_id)
    }
}

/// Pending change to one block, computed before the graph is mutated.
enum Update {
    Warn { tag: String, message: String },
    Clear { tag: String },
    Label { field: &'static str, text: String },
}

impl Update {
    fn warn(tag: impl Into<String>, error: MbgcError) -> Self {
        Update::Warn {
            tag: tag.into(),
            message: error.to_string(),
        }
    }
}

/// Run every consistency rule over `graph` and apply the resulting warnings
/// and label changes to its blocks.
pub fn check_graph(graph: &mut BlockGraph, board: &BoardProfile) -> CheckReport {
    let setups = setup_units(graph, board);
    debug!("[CHECK] {} configured peripheral instances", setups.len());

    let mut updates: Vec<(String, Update)> = Vec::new();
    for block in graph.blocks() {
        for capability in blocks::capabilities(&block.kind) {
            let pending = match capability {
                Capability::SetupInstance(setup) => check_pairing(block, setup, board),
                Capability::UsesInstance(uses) => {
                    let unit = block.field(uses.field);
                    if setups.contains(&(uses.family, unit.clone())) {
                        vec![Update::Clear { tag: uses.tag.to_string() }]
                    } else {
                        vec![Update::warn(
                            uses.tag,
                            MbgcError::StructuralMismatch(MISSING_SETUP.replace("%1", &unit)),
                        )]
                    }
                }
                Capability::ToneFrequency => vec![check_tone(graph, block)],
                Capability::NamedSetup(_) => Vec::new(),
            };
            updates.extend(pending.into_iter().map(|u| (block.id.clone(), u)));
        }
    }

    let mut report = CheckReport::default();
    for (block_id, update) in updates {
        let Some(block) = graph.get_mut(&block_id) else {
            continue;
        };
        match update {
            Update::Warn { tag, message } => {
                block.set_warning(&tag, Some(message.clone()));
                report.set.push(BlockWarning::new(block_id, tag, message));
            }
            Update::Clear { tag } => {
                if block.set_warning(&tag, None) {
                    report.cleared.push(ClearedWarning { block_id, tag });
                }
            }
            Update::Label { field, text } => block.set_field(field, text),
        }
    }

    debug!(
        "[CHECK] {} warnings set, {} cleared",
        report.set.len(),
        report.cleared.len()
    );
    report
}

/// Units configured by top-level setup blocks, per family.
fn setup_units(graph: &BlockGraph, board: &BoardProfile) -> HashSet<(PeripheralFamily, String)> {
    let mut units = HashSet::new();
    for block in graph.top_blocks() {
        if let Some(setup) = blocks::setup_instance(&block.kind) {
            if let Ok(unit) = board.resolve_unit(&block.field(setup.primary_field), setup.mapper) {
                units.insert((setup.family, unit.to_string()));
            }
        } else if let Some(named) = blocks::named_setup(&block.kind) {
            units.insert((named.family, block.field(named.field)));
        }
    }
    units
}

fn check_pairing(block: &Block, setup: &blocks::SetupInstance, board: &BoardProfile) -> Vec<Update> {
    let mismatch = setup.mismatch_tag().to_string();
    let primary_pin = block.field(setup.primary_field);
    let secondary_pin = block.field(setup.secondary_field);
    let neutral = setup.label.map(|label| Update::Label {
        field: label.field,
        text: label.neutral.to_string(),
    });

    let primary = match board.resolve_unit(&primary_pin, setup.mapper) {
        Ok(unit) => unit,
        Err(err) => {
            let mut updates = vec![
                Update::warn(TAG_UNKNOWN_RESOURCE, err),
                Update::Clear { tag: mismatch },
            ];
            updates.extend(neutral);
            return updates;
        }
    };

    let mut updates = vec![Update::Clear {
        tag: TAG_UNKNOWN_RESOURCE.to_string(),
    }];
    match board.resolve_unit(&secondary_pin, setup.mapper) {
        Ok(secondary) if secondary == primary => {
            updates.push(Update::Clear { tag: mismatch });
            if let Some(label) = setup.label {
                updates.push(Update::Label {
                    field: label.field,
                    text: label.render(primary),
                });
            }
        }
        other => {
            let secondary = other.map(str::to_string).unwrap_or(secondary_pin);
            updates.push(Update::warn(
                mismatch,
                MbgcError::StructuralMismatch(format!("{} mismatches {}", primary, secondary)),
            ));
            updates.extend(neutral);
        }
    }
    updates
}

/// Only a literal number plugged into `FREQUENCY` can be judged statically.
fn check_tone(graph: &BlockGraph, block: &Block) -> Update {
    let literal = block
        .values
        .get("FREQUENCY")
        .and_then(|id| graph.get(id))
        .filter(|child| child.kind == "math_number")
        .and_then(|child| child.field("NUM").trim().parse::<f64>().ok());

    match literal {
        Some(frequency) if !TONE_RANGE.contains(&frequency) => Update::Warn {
            tag: TAG_TONE.to_string(),
            message: format!(
                "Tone frequency {} Hz is outside the supported range of {} to {} Hz",
                frequency,
                TONE_RANGE.start(),
                TONE_RANGE.end()
            ),
        },
        _ => Update::Clear {
            tag: TAG_TONE.to_string(),
        },
    }
}
