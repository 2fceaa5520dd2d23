//! Digital, analog, PWM, interrupt and tone blocks.

use super::{statement, value, ARGUMENT};
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::codegen::reservation::PinRole;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "io_digitalwrite" => digital_write(gen, block, "PIN", "Digital Write"),
        "io_builtin_led" => digital_write(gen, block, "BUILT_IN_LED", "Set LED"),
        "io_digitalread" => digital_read(gen, block),
        "io_analogread" => analog_read(gen, block),
        "io_highlow" => value(block.field_or("STATE", "LOW"), Precedence::Atomic),
        "io_pwm_set" => pwm_set(gen, block),
        "io_pulsein" => pulse_in(gen, block, false),
        "io_pulsetimeout" => pulse_in(gen, block, true),
        "io_interrupt" => interrupt(gen, block),
        "set_interrupt_prio" => statement(format!(
            "NVIC_SetPriority({}, {});\n",
            block.field("IRQ"),
            block.field_or("PRIO", "1")
        )),
        "io_tone" => tone(gen, block),
        "io_notone" => {
            let pwm = pwm_out(gen, block, "TONEPIN", "Tone");
            statement(format!("{}.write(0.0f);\n", pwm))
        }
        _ => None,
    }
}

/// `DigitalOut myDigitalOut<pin>`, shared with SPI chip selects.
pub(crate) fn digital_out(gen: &mut BlockCodeGenerator<'_>, pin: &str) -> String {
    let name = format!("myDigitalOut{}", pin);
    gen.add_declaration(&name, format!("DigitalOut {}({});", name, pin));
    name
}

/// `PwmOut myPwm<pin>` keyed `pwm_<pin>`.
fn pwm_out(gen: &mut BlockCodeGenerator<'_>, block: &Block, field: &str, purpose: &str) -> String {
    let pin = block.field(field);
    gen.reserve(block, &pin, PinRole::Pwm, purpose);
    let name = format!("myPwm{}", pin);
    gen.add_declaration(&format!("pwm_{}", pin), format!("PwmOut {}({});", name, pin));
    name
}

fn digital_write(
    gen: &mut BlockCodeGenerator<'_>,
    block: &Block,
    field: &str,
    purpose: &str,
) -> Option<Emission> {
    let pin = block.field(field);
    let state = gen.value_or(block, "STATE", ARGUMENT, "LOW");
    gen.reserve(block, &pin, PinRole::Output, purpose);
    let name = digital_out(gen, &pin);
    statement(format!("{}.write({});\n", name, state))
}

fn digital_read(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pin = block.field("PIN");
    gen.reserve(block, &pin, PinRole::Input, "Digital Read");
    let name = format!("myDigitalIn{}", pin);
    gen.add_declaration(&name, format!("DigitalIn {}({});", name, pin));
    value(format!("{}.read()", name), Precedence::UnaryPostfix)
}

fn analog_read(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pin = block.field("PIN");
    gen.reserve(block, &pin, PinRole::Input, "Analogue Read");
    let name = format!("myIO{}", pin);
    gen.add_declaration(&format!("io_{}", pin), format!("AnalogIn {}({});", name, pin));
    value(format!("{}.read()", name), Precedence::UnaryPostfix)
}

fn pwm_set(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let period = gen.value_or(block, "PWM_PERIOD", ARGUMENT, "1");
    let width = gen.value_or(block, "PWM_WIDTH", ARGUMENT, "1");
    let name = pwm_out(gen, block, "PWM_PIN", "PWM Write");
    // The unit dropdown selects the call, no arithmetic on the value
    let period_unit = block.field_or("UNIT_PERIOD", "ms");
    let width_unit = block.field_or("UNIT_WIDTH", "ms");

    let mut code = format!("{}.period_{}({});\n", name, period_unit, period);
    code.push_str(&format!("{}.pulsewidth_{}({});\n", name, width_unit, width));
    statement(code)
}

fn pulse_in(gen: &mut BlockCodeGenerator<'_>, block: &Block, with_timeout: bool) -> Option<Emission> {
    let pin = block.field("PULSEPIN");
    let level = gen.value_or(block, "PULSETYPE", ARGUMENT, "HIGH");
    gen.reserve(block, &pin, PinRole::Input, "Pulse Pin");
    gen.add_setup(&format!("io_{}", pin), format!("pinMode({}, INPUT);", pin), false);

    let code = if with_timeout {
        let timeout = gen.value_or(block, "TIMEOUT", ARGUMENT, "0");
        format!("pulseIn({}, {}, {})", pin, level, timeout)
    } else {
        format!("pulseIn({}, {})", pin, level)
    };
    value(code, Precedence::UnaryPostfix)
}

fn interrupt(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pin = block.field("Pin");
    let name = format!("intr{}", pin);
    let edge = block.field_or("Type", "rise");
    let pull = block.field_or("Pull", "PullNone");

    gen.reserve(block, &pin, PinRole::Interrupt, "Interrupt");
    gen.add_declaration(&name, format!("InterruptIn {}({});", name, pin));
    gen.add_setup(&format!("{}_mode", name), format!("{}.mode({});", name, pull), true);

    let function = format!("{}_interrupt_fun", name);
    gen.add_callback(block, &function, &[], "function_body");
    statement(format!("{}.{}(&{});\n", name, edge, function))
}

fn tone(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let frequency = gen.value_or(block, "FREQUENCY", Precedence::Multiplicative.tighter(), "440");
    let name = pwm_out(gen, block, "TONEPIN", "Tone");
    let mut code = format!("{}.period(1.0 / {});\n", name, frequency);
    code.push_str(&format!("{}.write(0.5f);\n", name));
    statement(code)
}

#[cfg(test)]
mod tests {
    use crate::board::nucleo_f103rb;
    use crate::codegen::mbed_codegen::{BlockCodeGenerator, GeneratedProgram};
    use crate::config::CompilerOptions;
    use crate::error::TAG_PIN_CONFLICT;
    use crate::graph::{Block, BlockGraph};

    fn program(loop_blocks: Vec<Block>, extra: Vec<Block>) -> GeneratedProgram {
        let mut graph = BlockGraph::new("io");
        let first = loop_blocks.first().map(|b| b.id.clone()).unwrap_or_default();
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", &first));
        for block in loop_blocks.into_iter().chain(extra) {
            graph.add_block(block);
        }
        let board = nucleo_f103rb();
        let options = CompilerOptions::default();
        BlockCodeGenerator::new(&graph, &board, &options).generate_program()
    }

    #[test]
    fn test_digital_write_with_state() {
        let program = program(
            vec![Block::new("w", "io_digitalwrite").with_field("PIN", "PA_5").with_value("STATE", "hl")],
            vec![Block::new("hl", "io_highlow").with_field("STATE", "HIGH")],
        );
        assert_eq!(program.loop_body, "myDigitalOutPA_5.write(HIGH);\n");
        assert_eq!(program.sections.declarations, vec!["DigitalOut myDigitalOutPA_5(PA_5);"]);
    }

    #[test]
    fn test_builtin_led_shares_digital_out() {
        let program = program(
            vec![
                Block::new("w", "io_digitalwrite").with_field("PIN", "PA_5").with_next("led"),
                Block::new("led", "io_builtin_led").with_field("BUILT_IN_LED", "PA_5"),
            ],
            vec![],
        );
        assert_eq!(program.sections.declarations.len(), 1);
        assert!(program.warnings.is_empty());
    }

    #[test]
    fn test_pwm_units_select_calls() {
        let program = program(
            vec![Block::new("p", "io_pwm_set")
                .with_field("PWM_PIN", "PA_8")
                .with_field("UNIT_PERIOD", "ms")
                .with_field("UNIT_WIDTH", "us")
                .with_value("PWM_PERIOD", "n")],
            vec![Block::new("n", "math_number").with_field("NUM", 20.0)],
        );
        assert_eq!(
            program.loop_body,
            "myPwmPA_8.period_ms(20);\nmyPwmPA_8.pulsewidth_us(1);\n"
        );
        assert_eq!(program.sections.declarations, vec!["PwmOut myPwmPA_8(PA_8);"]);
    }

    #[test]
    fn test_interrupt_callback() {
        let program = program(
            vec![Block::new("i", "io_interrupt")
                .with_field("Pin", "PC_13")
                .with_field("Type", "fall")
                .with_field("Pull", "PullUp")
                .with_statement("function_body", "led")],
            vec![Block::new("led", "io_builtin_led").with_field("BUILT_IN_LED", "PA_5")],
        );
        assert_eq!(program.loop_body, "intrPC_13.fall(&intrPC_13_interrupt_fun);\n");
        assert_eq!(
            program.sections.functions,
            vec!["void intrPC_13_interrupt_fun() {\n  myDigitalOutPA_5.write(LOW);\n}"]
        );
        assert_eq!(program.sections.setup, vec!["intrPC_13.mode(PullUp);"]);
        assert!(program
            .sections
            .declarations
            .contains(&"InterruptIn intrPC_13(PC_13);".to_string()));
    }

    #[test]
    fn test_output_and_pwm_on_one_pin_conflict() {
        let program = program(
            vec![
                Block::new("w", "io_digitalwrite").with_field("PIN", "PA_8").with_next("p"),
                Block::new("p", "io_pwm_set").with_field("PWM_PIN", "PA_8"),
            ],
            vec![],
        );
        assert_eq!(program.warnings.len(), 1);
        assert_eq!(program.warnings[0].block_id, "p");
        assert_eq!(program.warnings[0].tag, TAG_PIN_CONFLICT);
    }

    #[test]
    fn test_tone_and_pulse() {
        let program = program(
            vec![
                Block::new("t", "io_tone").with_field("TONEPIN", "PA_9").with_value("FREQUENCY", "f").with_next("s"),
                Block::new("s", "variables_set").with_field("VAR", "width").with_value("VALUE", "pulse"),
            ],
            vec![
                Block::new("f", "math_number").with_field("NUM", 262.0),
                Block::new("pulse", "io_pulsein").with_field("PULSEPIN", "PB_0"),
            ],
        );
        assert_eq!(
            program.loop_body,
            "myPwmPA_9.period(1.0 / 262);\nmyPwmPA_9.write(0.5f);\nwidth = pulseIn(PB_0, HIGH);\n"
        );
        assert_eq!(program.sections.setup, vec!["pinMode(PB_0, INPUT);"]);
    }
}
