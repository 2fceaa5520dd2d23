//! SD card file system and stdio file blocks.

use super::{statement, FormatArgs, ARGUMENT};
use crate::board::SpiPins;
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::reservation::PinRole;
use crate::codegen::text;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "sd_fs" => sd_fs(gen, block),
        "fs_fopen" => {
            let file = file_handle(gen, block);
            let path = gen.value_or(block, "PATH", ARGUMENT, "\"\"");
            statement(format!(
                "{} = fopen({}, {});\n",
                file,
                path,
                text::c_string_literal(&block.field_or("MODE", "r"))
            ))
        }
        "fs_fprintf" => {
            let file = file_handle(gen, block);
            let args = FormatArgs::read(gen, block);
            statement(args.call("fprintf", &[&file]))
        }
        "fs_fscanf" => fs_fscanf(gen, block),
        "fs_fclose" => {
            let file = file_handle(gen, block);
            statement(format!("fclose({});\n", file))
        }
        _ => None,
    }
}

/// Global `FILE *` named by the block's `FILE` field.
fn file_handle(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> String {
    let file = block.field_or("FILE", "fp");
    gen.add_declaration(&format!("file_{}", file), format!("FILE *{};", file));
    file
}

fn sd_fs(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pins = SpiPins {
        mosi: block.field("MOSI"),
        miso: block.field("MISO"),
        sck: block.field("SCK"),
    };
    let cs = block.field("CS");
    for (pin, purpose) in [(&pins.mosi, "SD MOSI"), (&pins.miso, "SD MISO"), (&pins.sck, "SD SCK")] {
        gen.reserve(block, pin, PinRole::Spi, purpose);
    }
    gen.reserve(block, &cs, PinRole::Output, "SD CS");

    let name = format!("sd_{}", pins.mosi);
    gen.add_include("SDFileSystem", "#include \"SDFileSystem.h\"");
    gen.add_declaration(
        &name,
        format!(
            "SDFileSystem {}({},{},{},{},\"sd\");",
            name, pins.mosi, pins.miso, pins.sck, cs
        ),
    );
    statement("")
}

/// Every word of the extra arguments is passed by address.
fn fs_fscanf(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let file = file_handle(gen, block);
    let content = gen.value_or(block, "CONTENT", ARGUMENT, "0");
    let code = match gen.value_to_code(block, "CONTENT_STR", ARGUMENT) {
        Some(extra) => format!("fscanf({},{},{});\n", file, content, text::address_of_words(&extra)),
        None => format!("fscanf({},{});\n", file, content),
    };
    statement(code)
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
    fn test_file_round_trip_statements() {
        let mut graph = BlockGraph::new("files");
        graph.add_block(
            Block::new("sd", "sd_fs")
                .with_field("MOSI", "PB_15")
                .with_field("MISO", "PB_14")
                .with_field("SCK", "PB_13")
                .with_field("CS", "PB_12")
                .with_next("open"),
        );
        graph.add_block(
            Block::new("open", "fs_fopen")
                .with_field("FILE", "log")
                .with_field("MODE", "w")
                .with_value("PATH", "path")
                .with_next("print"),
        );
        graph.add_block(Block::new("path", "text").with_field("TEXT", "/sd/log.txt"));
        graph.add_block(
            Block::new("print", "fs_fprintf")
                .with_field("FILE", "log")
                .with_field("NEW_LINE", true)
                .with_value("CONTENT", "fmt")
                .with_value("CONTENT_STR", "v")
                .with_next("close"),
        );
        graph.add_block(Block::new("fmt", "text").with_field("TEXT", "%d"));
        graph.add_block(Block::new("v", "variables_get").with_field("VAR", "count"));
        graph.add_block(Block::new("close", "fs_fclose").with_field("FILE", "log"));

        let program = generate(&graph);
        assert_eq!(
            program.setup_body,
            "log = fopen(\"/sd/log.txt\", \"w\");\nfprintf(log,\"%d\\n\",count);\nfclose(log);\n"
        );
        assert_eq!(
            program.sections.declarations,
            vec![
                "SDFileSystem sd_PB_15(PB_15,PB_14,PB_13,PB_12,\"sd\");",
                "FILE *log;"
            ]
        );
        assert_eq!(program.sections.includes[1], "#include \"SDFileSystem.h\"");
    }

    #[test]
    fn test_fscanf_passes_words_by_address() {
        let mut graph = BlockGraph::new("scan");
        graph.add_block(
            Block::new("scan", "fs_fscanf")
                .with_value("CONTENT", "fmt")
                .with_value("CONTENT_STR", "vars"),
        );
        graph.add_block(Block::new("fmt", "text").with_field("TEXT", "%d %d"));
        graph.add_block(
            Block::new("vars", "print_content")
                .with_value("format_content", "a")
                .with_value("join_content", "b"),
        );
        graph.add_block(Block::new("a", "variables_get").with_field("VAR", "x"));
        graph.add_block(Block::new("b", "variables_get").with_field("VAR", "y"));

        let program = generate(&graph);
        assert_eq!(program.setup_body, "fscanf(fp,\"%d %d\",&x,&y);\n");
        assert_eq!(program.sections.declarations, vec!["FILE *fp;"]);
    }
}
