//! Global variables, assignment and type casts.

use super::{statement, value, ARGUMENT};
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::graph::{Block, ValueType};

const DEFAULT_NAME: &str = "item";

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "variables_declare" => declare(gen, block),
        "variables_declare_array" => declare_array(gen, block),
        "variables_get" => value(block.field_or("VAR", DEFAULT_NAME), Precedence::Atomic),
        "variables_set" => {
            let assigned = gen.value_or(block, "VALUE", Precedence::Assignment, "0");
            statement(format!("{} = {};\n", block.field_or("VAR", DEFAULT_NAME), assigned))
        }
        "variables_set_type" => cast(gen, block),
        _ => None,
    }
}

fn field_type(block: &Block) -> ValueType {
    ValueType::from_field(&block.field("VARIABLE_SETTYPE_TYPE")).unwrap_or(ValueType::Number)
}

/// Type a variable was declared with, if a declare block for it exists.
fn declared_type(gen: &BlockCodeGenerator<'_>, name: &str) -> Option<ValueType> {
    gen.graph()
        .blocks()
        .iter()
        .find(|b| b.kind == "variables_declare" && b.field_or("VARNAME", DEFAULT_NAME) == name)
        .map(field_type)
}

fn source_type(gen: &BlockCodeGenerator<'_>, block: &Block) -> Option<ValueType> {
    match block.kind.as_str() {
        "variables_get" => declared_type(gen, &block.field_or("VAR", DEFAULT_NAME)),
        "variables_set_type" => Some(field_type(block)),
        _ => gen.result_type(block),
    }
}

fn declare(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let name = block.field_or("VARNAME", DEFAULT_NAME);
    let value_type = field_type(block);
    if value_type == ValueType::Text {
        gen.add_include("string", "#include <string>");
    }

    let declaration = match gen.value_to_code(block, "VALUE", Precedence::Assignment) {
        Some(initial) => format!("{} {} = {};", value_type.cpp_type(), name, initial),
        None => format!("{} {};", value_type.cpp_type(), name),
    };
    gen.add_declaration(&format!("var_{}", name), declaration);
    statement("")
}

fn declare_array(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let name = block.field_or("VARNAME", DEFAULT_NAME);
    let value_type = field_type(block);
    if value_type == ValueType::Text {
        gen.add_include("string", "#include <string>");
    }
    gen.add_declaration(
        &format!("var_{}", name),
        format!("{} {}[{}];", value_type.cpp_type(), name, block.field_or("LEN", "10")),
    );
    statement("")
}

/// Cast the input (or the `VARNAME` variable) to the selected type. Text
/// conversions go through the standard library, everything else is a C cast.
fn cast(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let target = field_type(block);
    let graph = gen.graph();

    let (code, order, source) = match block
        .values
        .get("VARIABLE_SETTYPE_INPUT")
        .and_then(|id| graph.get(id))
    {
        Some(child) => {
            let source = source_type(gen, child);
            // Every rewrite below wraps the input in parentheses
            match gen.value_to_code(block, "VARIABLE_SETTYPE_INPUT", ARGUMENT) {
                Some(code) => (code, ARGUMENT, source),
                None => ("0".to_string(), Precedence::Atomic, None),
            }
        }
        None => {
            let name = block.field_or("VARNAME", DEFAULT_NAME);
            let source = declared_type(gen, &name);
            (name, Precedence::Atomic, source)
        }
    };

    if source == Some(target) {
        return value(code, order);
    }

    let cast = match (source, target) {
        (_, ValueType::Text) => format!("std::to_string({})", code),
        (Some(ValueType::Text), ValueType::ShortNumber | ValueType::Number) => format!("std::stoi({})", code),
        (Some(ValueType::Text), ValueType::LargeNumber) => format!("std::stol({})", code),
        (Some(ValueType::Text), ValueType::Decimal) => format!("std::stof({})", code),
        _ => return value(format!("({})({})", target.cpp_type(), code), Precedence::UnaryPrefix),
    };
    value(cast, Precedence::UnaryPostfix)
}
