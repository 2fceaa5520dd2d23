//! G-code interpreter blocks. The motion callbacks are called back by the
//! parser library, so each one becomes a free function with a fixed signature.

use super::{statement, ARGUMENT};
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "gcode_init" => statement("GCode_Init();\n"),
        "gcode_parse" => {
            let line = gen.value_or(block, "GCODE", ARGUMENT, "\"\"");
            statement(format!("GCode_DoNext({});\n", line))
        }
        "gcode_cb_home" => callback(gen, block, "Move_Home", &["int selected_axes"]),
        "gcode_cb_absmove" => callback(gen, block, "Move_AbsoluteMove", &["int xyza[4]", "int feedrate"]),
        "gcode_cb_setpos" => callback(gen, block, "Move_SetCurrentPos", &["int xyza[4]"]),
        _ => None,
    }
}

fn callback(gen: &mut BlockCodeGenerator<'_>, block: &Block, name: &str, params: &[&str]) -> Option<Emission> {
    gen.add_callback(block, name, params, "function_body");
    statement("")
}

#[cfg(test)]
mod tests {
    use crate::board::nucleo_f103rb;
    use crate::codegen::mbed_codegen::BlockCodeGenerator;
    use crate::config::CompilerOptions;
    use crate::graph::{Block, BlockGraph};

    #[test]
    fn test_motion_callbacks_and_parse() {
        let mut graph = BlockGraph::new("gcode");
        graph.add_block(Block::new("home", "gcode_cb_home").with_statement("function_body", "led"));
        graph.add_block(Block::new("led", "io_builtin_led").with_field("BUILT_IN_LED", "PA_5"));
        graph.add_block(Block::new("move", "gcode_cb_absmove"));
        graph.add_block(
            Block::new("main", "mbed_functions")
                .with_statement("SETUP_FUNC", "init")
                .with_statement("LOOP_FUNC", "parse"),
        );
        graph.add_block(Block::new("init", "gcode_init"));
        graph.add_block(Block::new("parse", "gcode_parse").with_value("GCODE", "line"));
        graph.add_block(Block::new("line", "text").with_field("TEXT", "G28"));

        let board = nucleo_f103rb();
        let options = CompilerOptions::default();
        let program = BlockCodeGenerator::new(&graph, &board, &options).generate_program();
        assert_eq!(
            program.sections.functions,
            vec![
                "void Move_Home(int selected_axes) {\n  myDigitalOutPA_5.write(LOW);\n}",
                "void Move_AbsoluteMove(int xyza[4], int feedrate) {\n}"
            ]
        );
        assert_eq!(program.setup_body, "GCode_Init();\n");
        assert_eq!(program.loop_body, "GCode_DoNext(\"G28\");\n");
    }
}
