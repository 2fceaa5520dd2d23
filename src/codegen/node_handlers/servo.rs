//! Servo (PWM driven) and stepper motor blocks.

use super::{statement, value, ARGUMENT};
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::codegen::reservation::PinRole;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "servo_write" => servo_write(gen, block),
        "servo_read" => {
            let name = servo_out(gen, block, "Servo Read");
            value(format!("{}.read()", name), Precedence::UnaryPostfix)
        }
        "stepper_setup" => stepper_setup(gen, block),
        "stepper_rotate" => stepper_rotate(gen, block),
        "stepper_wait" => statement(format!("while(stepper{}.remain);\n", block.field("STEP_Pin"))),
        _ => None,
    }
}

/// `PwmOut myServo<pin>` keyed `servo_<pin>`; read and write share it.
fn servo_out(gen: &mut BlockCodeGenerator<'_>, block: &Block, purpose: &str) -> String {
    let pin = block.field("SERVO_PIN");
    gen.reserve(block, &pin, PinRole::Servo, purpose);
    let name = format!("myServo{}", pin);
    gen.add_declaration(&format!("servo_{}", pin), format!("PwmOut {}({});", name, pin));
    name
}

fn servo_write(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let width = gen.value_or(block, "SERVO_PULSEWIDTH", ARGUMENT, "1");
    let name = servo_out(gen, block, "Servo Write");
    let unit = block.field_or("TimeDomain", "us");

    let mut code = format!("{}.period_ms(20);\n", name);
    code.push_str(&format!("{}.pulsewidth_{}({});\n", name, unit, width));
    statement(code)
}

fn stepper_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let step = block.field("STEP_Pin");
    let dir = block.field("DIR_Pin");
    let enable = block.field("EN_Pin");

    gen.reserve(block, &step, PinRole::Stepper, "Stepper STEP");
    gen.reserve(block, &dir, PinRole::Stepper, "Stepper DIR");
    gen.reserve(block, &enable, PinRole::Stepper, "Stepper EN");

    gen.add_include("Stepper", "#include <stepper.h>");
    gen.add_declaration(
        &format!("stepper{}", step),
        format!("Stepper stepper{} = {{{},{},{}}};", step, step, dir, enable),
    );
    statement("")
}

fn stepper_rotate(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let period = gen.value_or(block, "PERIOD", ARGUMENT, "1");
    let steps = gen.value_or(block, "STEP", ARGUMENT, "1");
    let suffix = if block.field("UNIT_PERIOD") == "us" { "_us" } else { "" };
    statement(format!(
        "stepper{}.rotate{}({}, {});\n",
        block.field("STEP_Pin"),
        suffix,
        period,
        steps
    ))
}

#[cfg(test)]
mod tests {
    use crate::board::nucleo_f103rb;
    use crate::codegen::mbed_codegen::BlockCodeGenerator;
    use crate::config::CompilerOptions;
    use crate::graph::{Block, BlockGraph};

    #[test]
    fn test_servo_read_and_write_share_declaration() {
        let mut graph = BlockGraph::new("servo");
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "w"));
        graph.add_block(
            Block::new("w", "servo_write")
                .with_field("SERVO_PIN", "PB_4")
                .with_field("TimeDomain", "us")
                .with_value("SERVO_PULSEWIDTH", "n")
                .with_next("s"),
        );
        graph.add_block(Block::new("n", "math_number").with_field("NUM", 1500.0));
        graph.add_block(Block::new("s", "variables_set").with_field("VAR", "duty").with_value("VALUE", "r"));
        graph.add_block(Block::new("r", "servo_read").with_field("SERVO_PIN", "PB_4"));

        let board = nucleo_f103rb();
        let options = CompilerOptions::default();
        let program = BlockCodeGenerator::new(&graph, &board, &options).generate_program();
        assert_eq!(
            program.loop_body,
            "myServoPB_4.period_ms(20);\nmyServoPB_4.pulsewidth_us(1500);\nduty = myServoPB_4.read();\n"
        );
        assert_eq!(program.sections.declarations, vec!["PwmOut myServoPB_4(PB_4);"]);
        assert!(program.warnings.is_empty());
    }

    #[test]
    fn test_stepper_blocks() {
        let mut graph = BlockGraph::new("stepper");
        graph.add_block(
            Block::new("main", "mbed_functions")
                .with_statement("SETUP_FUNC", "setup")
                .with_statement("LOOP_FUNC", "rot"),
        );
        graph.add_block(
            Block::new("setup", "stepper_setup")
                .with_field("STEP_Pin", "PA_8")
                .with_field("DIR_Pin", "PA_9")
                .with_field("EN_Pin", "PA_10"),
        );
        graph.add_block(
            Block::new("rot", "stepper_rotate")
                .with_field("STEP_Pin", "PA_8")
                .with_field("UNIT_PERIOD", "us")
                .with_next("wait"),
        );
        graph.add_block(Block::new("wait", "stepper_wait").with_field("STEP_Pin", "PA_8"));

        let board = nucleo_f103rb();
        let options = CompilerOptions::default();
        let program = BlockCodeGenerator::new(&graph, &board, &options).generate_program();
        assert_eq!(program.sections.includes[1], "#include <stepper.h>");
        assert_eq!(program.sections.declarations, vec!["Stepper stepperPA_8 = {PA_8,PA_9,PA_10};"]);
        assert_eq!(program.loop_body, "stepperPA_8.rotate_us(1, 1);\nwhile(stepperPA_8.remain);\n");
    }
}
