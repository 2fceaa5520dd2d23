//! Serial port and PN532 (serial attached NFC reader) blocks.

use super::{statement, value, FormatArgs, ARGUMENT};
use crate::board::MapperKind;
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::codegen::reservation::PinRole;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "serial_setup" => serial_setup(gen, block),
        "serial_print" => {
            let unit = block.field("SERIAL_Pins");
            let args = FormatArgs::read(gen, block);
            statement(args.call(&format!("{}.printf", unit), &[]))
        }
        "serial_getc" => value(
            format!("{}.getc()", block.field("SERIAL_Pins")),
            Precedence::UnaryPostfix,
        ),
        "serial_attach" => {
            let unit = block.field("SERIAL_Pins");
            let function = format!("{}_interrupt_fun", unit);
            gen.add_callback(block, &function, &[], "function_body");
            statement(format!("{}.attach(&{});\n", unit, function))
        }
        "print_content" => print_content(gen, block),
        "pn532_setup" => pn532_setup(gen, block),
        "pn532_wait_card" => {
            let timeout = block.field_or("TIMEOUT", "100");
            pn532_call(block, &format!("start_check({})", timeout))
        }
        "pn532_read_user" => pn532_call(block, "get_userid()"),
        "pn532_read_passwd" => pn532_call(block, "get_passwd()"),
        _ => None,
    }
}

/// Reserve an RX/TX pair and resolve the unit from the RX pin.
fn serial_pins(gen: &mut BlockCodeGenerator<'_>, block: &Block, purpose: &str) -> (String, String, String) {
    let rx = block.field("SERIAL_ID");
    let tx = block.field("SERIAL_ID_TX");
    gen.reserve(block, &rx, PinRole::Serial, &format!("{} RX", purpose));
    gen.reserve(block, &tx, PinRole::Serial, &format!("{} TX", purpose));
    let unit = gen.resolve_unit(block, &rx, MapperKind::Serial);
    (rx, tx, unit)
}

fn serial_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let (rx, tx, unit) = serial_pins(gen, block, "Serial");
    let speed = block.field_or("SPEED", "9600");
    gen.add_declaration(
        &format!("serial_{}", rx),
        format!("Serial {}({},{});", unit, tx, rx),
    );
    statement(format!("{}.baud({});\n", unit, speed))
}

/// `format,extra` spliced into a printf argument list as one expression.
fn print_content(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let format = gen.value_or(block, "format_content", ARGUMENT, "");
    let code = match gen.value_to_code(block, "join_content", ARGUMENT) {
        Some(join) if !format.is_empty() => format!("{},{}", format, join),
        _ => format,
    };
    value(code, Precedence::Atomic)
}

fn pn532_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let (rx, tx, unit) = serial_pins(gen, block, "PN532");
    let hsu = format!("pn_hsu_{}", unit);
    let reader = format!("pn532_{}", unit);
    gen.add_declaration(&hsu, format!("Serial {}({},{},115200);", hsu, tx, rx));
    gen.add_declaration(&reader, format!("PN532Checker {}(&{});", reader, hsu));
    statement("")
}

fn pn532_call(block: &Block, call: &str) -> Option<Emission> {
    value(
        format!("pn532_{}.{}", block.field("SERIAL_Pins"), call),
        Precedence::UnaryPostfix,
    )
}
