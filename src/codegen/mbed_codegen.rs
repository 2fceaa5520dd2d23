//! # mbed Code Generator for Block Graphs
//!
//! Walks a [`BlockGraph`] and produces mbed C++ source.
//!
//! Value blocks become inline expressions tagged with a [`Precedence`]; statement
//! blocks become full source lines. Global declarations, setup statements and
//! callback functions are registered in the pass's [`GenerationContext`] and
//! assembled into a [`GeneratedProgram`] once the walk is done.

use super::context::GenerationContext;
use super::node_handlers;
use super::precedence::{parenthesize, Precedence};
use super::registry::Sections;
use super::reservation::PinRole;
use super::text;
use crate::blocks::{self, Shape};
use crate::board::{BoardProfile, MapperKind};
use crate::config::CompilerOptions;
use crate::error::{
    BlockWarning, TAG_STATEMENT_IN_VALUE, TAG_UNKNOWN_BLOCK, TAG_UNKNOWN_RESOURCE,
};
use crate::graph::{Block, BlockGraph, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Framing block holding the setup and loop statement inputs.
pub const FRAMING_BLOCK: &str = "mbed_functions";

/// Output of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Inline expression and the precedence of its outermost operator
    Value(String, Precedence),
    /// Zero or more complete, newline terminated source lines
    Statement(String),
}

/// A generated program, kept in sections until rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProgram {
    pub name: String,
    pub sections: Sections,
    /// Statements that run once after the registered setup statements
    pub setup_body: String,
    pub loop_body: String,
    pub warnings: Vec<BlockWarning>,
    pub indent: String,
    pub header: bool,
    pub emit_main: bool,
}

impl GeneratedProgram {
    /// Render the final source: banner, includes, functions, declarations,
    /// then setup and loop inside `main`.
    pub fn render(&self) -> String {
        let mut code = String::new();

        if self.header {
            if self.name.is_empty() {
                code.push_str("// Auto-generated code from an mbed block graph\n");
            } else {
                code.push_str(&format!("// Auto-generated code from mbed block graph: {}\n", self.name));
            }
            code.push_str("// DO NOT EDIT - Changes will be overwritten\n");
            code.push_str("// Compiled with MBGC (mbed Block Graph Compiler)\n\n");
        }

        for include in &self.sections.includes {
            code.push_str(include);
            code.push('\n');
        }
        code.push('\n');

        for function in &self.sections.functions {
            code.push_str(function);
            code.push_str("\n\n");
        }

        if !self.sections.declarations.is_empty() {
            for declaration in &self.sections.declarations {
                code.push_str(declaration);
                code.push('\n');
            }
            code.push('\n');
        }

        let inner = if self.emit_main { self.indent.clone() } else { String::new() };
        let mut setup = String::new();
        for statement in &self.sections.setup {
            setup.push_str(statement.trim_end());
            setup.push('\n');
        }
        setup.push_str(&self.setup_body);

        if self.emit_main {
            let loop_indent = self.indent.repeat(2);
            code.push_str("int main() {\n");
            code.push_str(&text::prefix_lines(&setup, &inner));
            code.push_str(&format!("{}while (1) {{\n", inner));
            code.push_str(&text::prefix_lines(&self.loop_body, &loop_indent));
            code.push_str(&format!("{}}}\n", inner));
            code.push_str("}\n");
        } else {
            code.push_str(&setup);
            if !self.loop_body.is_empty() {
                code.push('\n');
                code.push_str(&self.loop_body);
            }
        }

        code
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Block-graph-specific mbed code generator
pub struct BlockCodeGenerator<'a> {
    graph: &'a BlockGraph,
    board: &'a BoardProfile,
    options: &'a CompilerOptions,
    ctx: GenerationContext,
    /// Blocks currently being emitted, to break value-socket cycles
    visiting: HashSet<String>,
}

impl<'a> BlockCodeGenerator<'a> {
    pub fn new(graph: &'a BlockGraph, board: &'a BoardProfile, options: &'a CompilerOptions) -> Self {
        Self {
            graph,
            board,
            options,
            ctx: GenerationContext::new(options.reservation_policy),
            visiting: HashSet::new(),
        }
    }

    pub fn graph(&self) -> &'a BlockGraph {
        self.graph
    }

    pub fn board(&self) -> &'a BoardProfile {
        self.board
    }

    pub fn context(&self) -> &GenerationContext {
        &self.ctx
    }

    /// Generate the complete program from the graph
    pub fn generate_program(mut self) -> GeneratedProgram {
        let graph = self.graph;
        let mut setup_body = String::new();
        let mut loop_body = String::new();

        let top_blocks = graph.top_blocks();
        tracing::debug!("[CODEGEN] {} top-level blocks", top_blocks.len());

        for top in top_blocks {
            if top.kind == FRAMING_BLOCK {
                if let Some(first) = top.statements.get("SETUP_FUNC") {
                    setup_body.push_str(&self.chain_to_code(first));
                }
                if let Some(first) = top.statements.get("LOOP_FUNC") {
                    loop_body.push_str(&self.chain_to_code(first));
                }
                continue;
            }

            match blocks::lookup(&top.kind).map(|info| info.shape) {
                Some(Shape::Value(_)) => {
                    // Evaluated for its registrations only
                    let _ = self.block_to_code(top);
                }
                _ => setup_body.push_str(&self.chain_to_code(&top.id)),
            }
        }

        let (registries, warnings) = self.ctx.into_parts();
        let sections = registries.drain();
        tracing::debug!(
            "[CODEGEN] Drained {} functions, {} declarations, {} setup statements",
            sections.functions.len(),
            sections.declarations.len(),
            sections.setup.len()
        );

        GeneratedProgram {
            name: graph.metadata.name.clone(),
            sections,
            setup_body,
            loop_body,
            warnings,
            indent: self.options.indent.clone(),
            header: self.options.header,
            emit_main: self.options.emit_main,
        }
    }

    /// Emit a single block through its family handler.
    pub fn block_to_code(&mut self, block: &Block) -> Option<Emission> {
        if !self.visiting.insert(block.id.clone()) {
            tracing::warn!("[CODEGEN] Cycle through block {} skipped", block.id);
            return None;
        }

        tracing::debug!("[CODEGEN] Emitting block {} ({})", block.id, block.kind);
        let emission = node_handlers::emit(self, block);
        self.visiting.remove(&block.id);

        if emission.is_none() {
            self.warn(
                block,
                TAG_UNKNOWN_BLOCK,
                format!("No code generator for block kind '{}'", block.kind),
            );
        }
        emission
    }

    /// Expression text of the block plugged into `socket`, parenthesised for
    /// a slot requiring at least `slot`. `None` when the socket is empty.
    pub fn value_to_code(&mut self, block: &Block, socket: &str, slot: Precedence) -> Option<String> {
        let graph = self.graph;
        let child = graph.get(block.values.get(socket)?)?;

        if let Some(info) = blocks::lookup(&child.kind) {
            if !info.is_value() {
                self.statement_in_value(child, block, socket);
                return None;
            }
        }

        match self.block_to_code(child)? {
            Emission::Value(code, _) if code.is_empty() => None,
            Emission::Value(code, order) => Some(parenthesize(code, order, slot)),
            Emission::Statement(_) => {
                self.statement_in_value(child, block, socket);
                None
            }
        }
    }

    /// [`value_to_code`](Self::value_to_code) with a literal fallback for an
    /// empty socket.
    pub fn value_or(&mut self, block: &Block, socket: &str, slot: Precedence, default: &str) -> String {
        self.value_to_code(block, socket, slot)
            .unwrap_or_else(|| default.to_string())
    }

    fn statement_in_value(&mut self, child: &Block, parent: &Block, socket: &str) {
        self.warn(
            child,
            TAG_STATEMENT_IN_VALUE,
            format!(
                "Statement block {} cannot be plugged into value input {} of block {}",
                child.kind, socket, parent.id
            ),
        );
    }

    /// Code of the chain in statement input `socket`, indented one level.
    pub fn statement_to_code(&mut self, block: &Block, socket: &str) -> String {
        match block.statements.get(socket) {
            Some(first) => {
                let code = self.chain_to_code(first);
                text::prefix_lines(&code, &self.options.indent)
            }
            None => String::new(),
        }
    }

    /// Concatenated statement text of a `next`-linked chain, in link order.
    pub fn chain_to_code(&mut self, first: &str) -> String {
        let graph = self.graph;
        let mut code = String::new();

        for block in graph.chain(first) {
            match self.block_to_code(block) {
                Some(Emission::Statement(text)) => code.push_str(&text),
                Some(Emission::Value(..)) => {
                    tracing::debug!("[CODEGEN] Discarding value of detached block {}", block.id);
                }
                None => {}
            }
        }

        code
    }

    /// Declared result type of a value block.
    pub fn result_type(&self, block: &Block) -> Option<ValueType> {
        block.output.or_else(|| match blocks::lookup(&block.kind)?.shape {
            Shape::Value(value_type) => Some(value_type),
            Shape::Statement => None,
        })
    }

    pub fn warn(&mut self, block: &Block, tag: &str, message: impl Into<String>) {
        self.ctx.warn(BlockWarning::new(block.id.clone(), tag, message));
    }

    pub fn reserve(&mut self, block: &Block, pin: &str, role: PinRole, purpose: &str) {
        let board = self.board;
        self.ctx.reserve(&block.id, pin, role, purpose, board);
    }

    /// Canonical unit for `pin`. An unknown pin is reported on the block and
    /// the pin name itself is used so generation can continue.
    pub fn resolve_unit(&mut self, block: &Block, pin: &str, mapper: MapperKind) -> String {
        let board = self.board;
        match board.resolve_unit(pin, mapper) {
            Ok(unit) => unit.to_string(),
            Err(err) => {
                self.ctx
                    .warn(BlockWarning::from_error(block.id.clone(), TAG_UNKNOWN_RESOURCE, &err));
                pin.to_string()
            }
        }
    }

    pub fn add_include(&mut self, key: &str, text: impl Into<String>) {
        self.ctx.registries.add_include(key, text);
    }

    pub fn add_declaration(&mut self, key: &str, text: impl Into<String>) {
        self.ctx.registries.add_declaration(key, text);
    }

    pub fn add_setup(&mut self, key: &str, text: impl Into<String>, run_first: bool) {
        self.ctx.registries.add_setup(key, text, run_first);
    }

    pub fn add_function(&mut self, key: &str, text: impl Into<String>) {
        self.ctx.registries.add_function(key, text);
    }

    /// Turn statement input `socket` into `void name(params) { ... }` and
    /// register it. Re-registering the same name replaces the body.
    pub fn add_callback(&mut self, block: &Block, name: &str, params: &[&str], socket: &str) {
        let body = self.statement_to_code(block, socket);
        let function = text::callback_function("void", name, params, &body);
        self.add_function(name, function);
    }
}
