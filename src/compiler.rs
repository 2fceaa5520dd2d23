//! # Block Graph Compiler
//!
//! Main entry points for compiling block graphs to mbed C++ source and for
//! running the consistency checks an editor needs after each graph change.

use crate::board::{refresh_graph_options, BoardRegistry};
use crate::checker::{self, CheckReport};
use crate::codegen::{BlockCodeGenerator, GeneratedProgram};
use crate::config::CompilerOptions;
use crate::error::Result;
use crate::graph::BlockGraph;

/// Compile a block graph to mbed C++ source code
///
/// Uses the default [`CompilerOptions`] and the built-in board profiles.
///
/// # Arguments
///
/// * `graph` - The block graph to compile
///
/// # Returns
///
/// * `Ok(String)` - The rendered C++ program
/// * `Err(MbgcError)` - When the configured board profile does not exist
///
/// # Examples
///
/// ```rust,no_run
/// use mbgc::{compile_graph, Block, BlockGraph};
///
/// let mut graph = BlockGraph::new("blink");
/// graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "led"));
/// graph.add_block(Block::new("led", "io_builtin_led").with_field("BUILT_IN_LED", "PA_5"));
///
/// match compile_graph(&graph) {
///     Ok(code) => println!("Generated:\n{}", code),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn compile_graph(graph: &BlockGraph) -> Result<String> {
    let program = compile_graph_with_options(graph, &CompilerOptions::default(), &BoardRegistry::builtin())?;
    Ok(program.render())
}

/// Compile a block graph with explicit options and board profiles
///
/// Block-level problems (unknown pins, pin conflicts, unknown block kinds) do
/// not fail the compilation; they are returned in
/// [`GeneratedProgram::warnings`].
///
/// # Arguments
///
/// * `graph` - The block graph to compile
/// * `options` - Board selection, indentation and output framing
/// * `boards` - Board profiles to look `options.board` up in
///
/// # Returns
///
/// * `Ok(GeneratedProgram)` - The program in sections, ready to render
/// * `Err(MbgcError)` - When the board profile does not exist
pub fn compile_graph_with_options(
    graph: &BlockGraph,
    options: &CompilerOptions,
    boards: &BoardRegistry,
) -> Result<GeneratedProgram> {
    tracing::info!("[MBGC] Starting block graph compilation");
    tracing::info!("[MBGC] Graph: {} ({} blocks)", graph.metadata.name, graph.len());

    // Phase 1: Resolve board profile
    tracing::info!("[MBGC] Phase 1: Loading board profile '{}'...", options.board);
    let board = boards.get(&options.board)?;
    tracing::info!("[MBGC] Using board {}", board.name);

    // Phase 2: Generate code
    tracing::info!("[MBGC] Phase 2: Generating mbed code...");
    let generator = BlockCodeGenerator::new(graph, board, options);
    let program = generator.generate_program();

    if program.has_warnings() {
        tracing::warn!("[MBGC] {} block warnings", program.warnings.len());
    }
    tracing::info!(
        "[MBGC] Code generation complete ({} declarations, {} functions)",
        program.sections.declarations.len(),
        program.sections.functions.len()
    );
    tracing::info!("[MBGC] Compilation successful!");

    Ok(program)
}

/// Compile a graph serialized as JSON
///
/// # Arguments
///
/// * `graph_json` - A serialized [`BlockGraph`]
/// * `options` - Board selection, indentation and output framing
///
/// # Returns
///
/// * `Ok(GeneratedProgram)` - The program in sections, ready to render
/// * `Err(MbgcError)` - On malformed JSON or an unknown board
pub fn compile_json(graph_json: &str, options: &CompilerOptions) -> Result<GeneratedProgram> {
    let graph = BlockGraph::from_json(graph_json)?;
    compile_graph_with_options(&graph, options, &BoardRegistry::builtin())
}

/// Validate a graph after it changed
///
/// Refreshes every board-bound dropdown against the selected board (flagging
/// values the board no longer offers), then runs the cross-block consistency
/// checker. Warnings are stored on the blocks themselves; the report lists
/// the stale-option and checker warnings set and cleared by this call.
///
/// # Arguments
///
/// * `graph` - The block graph to annotate
/// * `options` - Supplies the selected board id
/// * `boards` - Board profiles to look `options.board` up in
///
/// # Returns
///
/// * `Ok(CheckReport)` - Warnings set and cleared by this pass
/// * `Err(MbgcError)` - When the board profile does not exist
pub fn check_graph_with_options(
    graph: &mut BlockGraph,
    options: &CompilerOptions,
    boards: &BoardRegistry,
) -> Result<CheckReport> {
    let board = boards.get(&options.board)?;

    tracing::info!("[MBGC] Refreshing board options for {} blocks", graph.len());
    let refresh = refresh_graph_options(graph, board);

    tracing::info!("[MBGC] Checking peripheral setup pairing...");
    let mut report = checker::check_graph(graph, board);
    report.set.extend(refresh.stale);
    report.cleared.extend(refresh.cleared);

    tracing::info!("[MBGC] Check complete ({} warnings)", report.set.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClearedWarning, MbgcError, TAG_STALE_OPTION};
    use crate::graph::Block;

    #[test]
    fn test_unknown_board_fails() {
        let graph = BlockGraph::new("g");
        let options = CompilerOptions::default().with_board("arduino_uno");
        let result = compile_graph_with_options(&graph, &options, &BoardRegistry::builtin());
        assert!(matches!(result, Err(MbgcError::BoardNotFound(_))));
    }

    #[test]
    fn test_compile_json() {
        let json = r#"{
            "metadata": { "name": "json" },
            "blocks": [
                { "id": "main", "kind": "mbed_functions", "statements": { "LOOP_FUNC": "d" } },
                { "id": "d", "kind": "time_delay" }
            ]
        }"#;
        let program = compile_json(json, &CompilerOptions::default()).unwrap();
        assert_eq!(program.loop_body, "wait(0);\n");
        assert_eq!(program.name, "json");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = compile_json("{ not json", &CompilerOptions::default());
        assert!(matches!(result, Err(MbgcError::Json(_))));
    }

    #[test]
    fn test_check_reports_stale_options() {
        let mut graph = BlockGraph::new("check");
        graph.add_block(Block::new("w", "io_digitalwrite").with_field("PIN", "D13"));

        let report =
            check_graph_with_options(&mut graph, &CompilerOptions::default(), &BoardRegistry::builtin()).unwrap();
        assert_eq!(report.set.len(), 1);
        assert_eq!(report.set[0].tag, TAG_STALE_OPTION);
        assert!(graph.get("w").unwrap().warning(TAG_STALE_OPTION).is_some());

        graph.get_mut("w").unwrap().set_field("PIN", "PA_5");
        let report =
            check_graph_with_options(&mut graph, &CompilerOptions::default(), &BoardRegistry::builtin()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.cleared, vec![ClearedWarning::new("w", TAG_STALE_OPTION)]);
        assert!(graph.get("w").unwrap().warning(TAG_STALE_OPTION).is_none());
    }
}
