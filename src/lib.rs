//! # mbed Block Graph Compiler (MBGC)
//!
//! Compiler for turning visual block programs into mbed C++ source code for
//! microcontroller boards.
//!
//! MBGC takes the block graph an editor produces and provides:
//! - a board capability table mapping pin selections to hardware units
//! - per-block emission of C++ expressions and statements with correct
//!   operator precedence
//! - deduplicated global declarations, setup code and callback functions
//! - pin reservation tracking that reports conflicting uses of one pin
//! - a consistency checker pairing peripheral setup blocks with their users
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mbgc::{compile_graph, Block, BlockGraph};
//!
//! let mut graph = BlockGraph::new("blink");
//! graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "on"));
//! graph.add_block(Block::new("on", "io_builtin_led").with_field("BUILT_IN_LED", "PA_5"));
//!
//! match compile_graph(&graph) {
//!     Ok(code) => {
//!         std::fs::write("main.cpp", code)?;
//!     }
//!     Err(e) => eprintln!("Compilation failed: {}", e),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! MBGC follows a two-phase compilation pipeline:
//!
//! 1. **Board Resolution** - Look up the selected board profile
//! 2. **Code Generation** - Walk the graph from the `mbed_functions` framing
//!    block, emitting each block through its family handler while
//!    declarations and setup code collect in per-pass registries
//!
//! The consistency checker runs separately, on every graph change, and only
//! annotates blocks with warnings.

pub mod blocks;
pub mod board;
pub mod checker;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;


// Re-export the main compilation API
pub use compiler::{
    check_graph_with_options,
    compile_graph,
    compile_graph_with_options,
    compile_json,
};

pub use board::{BoardProfile, BoardRegistry, DEFAULT_BOARD};
pub use checker::{check_graph, CheckReport};
pub use codegen::GeneratedProgram;
pub use config::{CompilerOptions, ReservationPolicy};
pub use error::{BlockWarning, MbgcError, Result};
pub use graph::{Block, BlockGraph, FieldValue, ValueType};
