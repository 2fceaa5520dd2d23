//! Delays, clocks and tickers.

use super::{statement, value, ARGUMENT};
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::codegen::text;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "time_delay" => {
            // wait() takes seconds, the block takes milliseconds
            let millis = gen.value_or(block, "DELAY_TIME_MILI", Precedence::Multiplicative, "0");
            statement(format!("wait({});\n", text::divide_literal(&millis, 1000.0)))
        }
        "time_delaymicros" => {
            let micros = gen.value_or(block, "DELAY_TIME_MICRO", ARGUMENT, "0");
            statement(format!("delayMicroseconds({});\n", micros))
        }
        "time_millis" => value("millis()", Precedence::UnaryPostfix),
        "time_micros" => value("micros()", Precedence::UnaryPostfix),
        "infinite_loop" => statement("while(true);\n"),
        "ticker_attach" => ticker_attach(gen, block),
        _ => None,
    }
}

/// Ticker named after the block so the name is stable across passes.
fn ticker_attach(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let ticks = block.field_or("ticks", "1");
    let ticker = format!("tick{}", text::identifier_suffix(&block.id));
    let function = format!("{}_handle", ticker);

    gen.add_callback(block, &function, &[], "function_body");
    gen.add_declaration(&ticker, format!("Ticker {};", ticker));
    statement(format!("{}.attach(&{},{});\n", ticker, function, ticks))
}

#[cfg(test)]
mod tests {
    use crate::board::nucleo_f103rb;
    use crate::codegen::mbed_codegen::{BlockCodeGenerator, GeneratedProgram};
    use crate::config::CompilerOptions;
    use crate::graph::{Block, BlockGraph};

    fn generate(graph: &BlockGraph) -> GeneratedProgram {
        let board = nucleo_f103rb();
        let options = CompilerOptions::default();
        BlockCodeGenerator::new(graph, &board, &options).generate_program()
    }

    #[test]
    fn test_delay_converts_milliseconds() {
        let mut graph = BlockGraph::new("delay");
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "d1"));
        graph.add_block(Block::new("d1", "time_delay").with_value("DELAY_TIME_MILI", "n").with_next("d2"));
        graph.add_block(Block::new("n", "math_number").with_field("NUM", 250.0));
        graph.add_block(Block::new("d2", "time_delay").with_value("DELAY_TIME_MILI", "v").with_next("d3"));
        graph.add_block(Block::new("v", "variables_get").with_field("VAR", "period"));
        graph.add_block(Block::new("d3", "time_delay"));

        assert_eq!(
            generate(&graph).loop_body,
            "wait(0.25);\nwait(period / 1000.0);\nwait(0);\n"
        );
    }

    #[test]
    fn test_ticker_is_named_after_block() {
        let mut graph = BlockGraph::new("ticker");
        graph.add_block(Block::new("main", "mbed_functions").with_statement("SETUP_FUNC", "t-1"));
        graph.add_block(
            Block::new("t-1", "ticker_attach")
                .with_field("ticks", 0.5)
                .with_statement("function_body", "i"),
        );
        graph.add_block(Block::new("i", "infinite_loop"));

        let program = generate(&graph);
        assert_eq!(program.setup_body, "tickt_2d_1.attach(&tickt_2d_1_handle,0.5);\n");
        assert_eq!(program.sections.declarations, vec!["Ticker tickt_2d_1;"]);
        assert_eq!(
            program.sections.functions,
            vec!["void tickt_2d_1_handle() {\n  while(true);\n}"]
        );
    }

    #[test]
    fn test_tickers_with_similar_ids_stay_apart() {
        let mut graph = BlockGraph::new("tickers");
        graph.add_block(Block::new("main", "mbed_functions").with_statement("SETUP_FUNC", "a#b"));
        graph.add_block(
            Block::new("a#b", "ticker_attach")
                .with_statement("function_body", "x")
                .with_next("a$b"),
        );
        graph.add_block(Block::new("a$b", "ticker_attach").with_statement("function_body", "y"));
        graph.add_block(Block::new("x", "io_digitalwrite").with_field("PIN", "PA_5"));
        graph.add_block(Block::new("y", "io_digitalwrite").with_field("PIN", "PA_6"));

        let program = generate(&graph);
        assert_eq!(
            program.sections.declarations,
            vec![
                "DigitalOut myDigitalOutPA_5(PA_5);",
                "Ticker ticka_23_b;",
                "DigitalOut myDigitalOutPA_6(PA_6);",
                "Ticker ticka_24_b;"
            ]
        );
        assert_eq!(program.sections.functions.len(), 2);
    }
}
