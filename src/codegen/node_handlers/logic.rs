//! Core language blocks: literals, arithmetic, logic and control flow.

use super::{statement, value};
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission, FRAMING_BLOCK};
use crate::codegen::precedence::Precedence;
use crate::codegen::text;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        // Setup and loop inputs are read by the program assembler
        FRAMING_BLOCK => statement(""),
        "math_number" => math_number(block),
        "text" => value(text::c_string_literal(&block.field("TEXT")), Precedence::Atomic),
        "logic_boolean" => {
            let code = if block.field("BOOL") == "TRUE" { "true" } else { "false" };
            value(code, Precedence::Atomic)
        }
        "math_arithmetic" => math_arithmetic(gen, block),
        "logic_compare" => logic_compare(gen, block),
        "logic_operation" => logic_operation(gen, block),
        "logic_negate" => {
            let operand = gen.value_or(block, "BOOL", Precedence::UnaryPrefix, "true");
            value(format!("!{}", operand), Precedence::UnaryPrefix)
        }
        "controls_if" => controls_if(gen, block),
        "controls_whileUntil" => controls_while_until(gen, block),
        _ => None,
    }
}

fn math_number(block: &Block) -> Option<Emission> {
    let code = block.field_or("NUM", "0");
    let order = if code.starts_with('-') {
        Precedence::UnaryPrefix
    } else {
        Precedence::Atomic
    };
    value(code, order)
}

fn math_arithmetic(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let (operator, order) = match block.field("OP").as_str() {
        "MINUS" => ("-", Precedence::Additive),
        "MULTIPLY" => ("*", Precedence::Multiplicative),
        "DIVIDE" => ("/", Precedence::Multiplicative),
        "MODULO" => ("%", Precedence::Multiplicative),
        "POWER" => {
            let base = gen.value_or(block, "A", super::ARGUMENT, "0");
            let exponent = gen.value_or(block, "B", super::ARGUMENT, "0");
            return value(format!("pow({}, {})", base, exponent), Precedence::UnaryPostfix);
        }
        _ => ("+", Precedence::Additive),
    };
    let left = gen.value_or(block, "A", order, "0");
    let right = gen.value_or(block, "B", order.tighter(), "0");
    value(format!("{} {} {}", left, operator, right), order)
}

fn logic_compare(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let (operator, order) = match block.field("OP").as_str() {
        "NEQ" => ("!=", Precedence::Equality),
        "LT" => ("<", Precedence::Relational),
        "LTE" => ("<=", Precedence::Relational),
        "GT" => (">", Precedence::Relational),
        "GTE" => (">=", Precedence::Relational),
        _ => ("==", Precedence::Equality),
    };
    let left = gen.value_or(block, "A", order, "0");
    let right = gen.value_or(block, "B", order.tighter(), "0");
    value(format!("{} {} {}", left, operator, right), order)
}

fn logic_operation(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let (operator, order) = if block.field("OP") == "OR" {
        ("||", Precedence::LogicalOr)
    } else {
        ("&&", Precedence::LogicalAnd)
    };
    let left = gen.value_to_code(block, "A", order);
    let right = gen.value_to_code(block, "B", order.tighter());

    // One missing operand takes the identity of the operator
    let (left, right) = match (left, right) {
        (None, None) => ("false".to_string(), "false".to_string()),
        (left, right) => {
            let identity = if operator == "&&" { "true" } else { "false" };
            (
                left.unwrap_or_else(|| identity.to_string()),
                right.unwrap_or_else(|| identity.to_string()),
            )
        }
    };
    value(format!("{} {} {}", left, operator, right), order)
}

fn controls_if(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let has_branch = |n: usize| {
        block.values.contains_key(&format!("IF{}", n))
            || block.statements.contains_key(&format!("DO{}", n))
    };

    let mut code = String::new();
    let mut n = 0;
    loop {
        let condition = gen.value_or(block, &format!("IF{}", n), Precedence::None, "false");
        let branch = gen.statement_to_code(block, &format!("DO{}", n));
        if n > 0 {
            code.push_str(" else ");
        }
        code.push_str(&format!("if ({}) {{\n{}}}", condition, branch));
        n += 1;
        if !has_branch(n) {
            break;
        }
    }

    if block.statements.contains_key("ELSE") {
        let branch = gen.statement_to_code(block, "ELSE");
        code.push_str(&format!(" else {{\n{}}}", branch));
    }
    code.push('\n');
    statement(code)
}

fn controls_while_until(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let condition = if block.field("MODE") == "UNTIL" {
        let operand = gen.value_or(block, "BOOL", Precedence::UnaryPrefix, "false");
        format!("!{}", operand)
    } else {
        gen.value_or(block, "BOOL", Precedence::None, "false")
    };
    let branch = gen.statement_to_code(block, "DO");
    statement(format!("while ({}) {{\n{}}}\n", condition, branch))
}
