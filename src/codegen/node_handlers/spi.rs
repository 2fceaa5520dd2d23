//! SPI bus blocks and the SPI attached modules: nRF24L01 radio, W5500
//! ethernet with MQTT, and the LD3320 voice module.

use super::io::digital_out;
use super::{statement, value, ARGUMENT};
use crate::board::SpiPins;
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::codegen::reservation::PinRole;
use crate::codegen::text;
use crate::error::TAG_UNKNOWN_RESOURCE;
use crate::graph::{Block, ValueType};

/// Callback the networking library invokes for every received MQTT command.
pub const W5500_CALLBACK: &str = "W5500_on_command";

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "spi_setup" => spi_setup(gen, block),
        "spi_transfer" => {
            let data = gen.value_or(block, "SPI_DATA", ARGUMENT, "0");
            statement(format!("spi_{}.write({});\n", block.field("SPI_ID"), data))
        }
        "spi_transfer_return" => spi_transfer_return(gen, block),
        "nrf24_setup" => nrf24_setup(gen, block),
        "nrf24_irq" => statement(format!("{}.NRF24L01_IRQ();\n", nrf24_name(block))),
        "nrf24_check" => statement(format!("{}.NRF24L01_Check();\n", nrf24_name(block))),
        "nrf24_readable" => value(format!("{}.readable()", nrf24_name(block)), Precedence::UnaryPostfix),
        "nrf24_checksum" => value(
            format!("{}.Get_Checksum({})", nrf24_name(block), block.field("BUF")),
            Precedence::UnaryPostfix,
        ),
        "nrf24_write_len" => statement(format!(
            "{}.NRF_Send_TX({},{});\n",
            nrf24_name(block),
            block.field("BUF"),
            block.field("LEN")
        )),
        "nrf24_connect" => statement(format!("{}.Nrf_Connect({});\n", nrf24_name(block), block.field("BUF"))),
        "w5500_setup" => w5500_setup(gen, block),
        "w5500_yield" => statement(format!("w5500client_.yield({});\n", block.field_or("timeout", "1000"))),
        "w5500_publish" => {
            let topic = gen.value_or(block, "topic", ARGUMENT, "\"\"");
            let payload = gen.value_or(block, "value", ARGUMENT, "\"\"");
            statement(format!("publish_value(w5500client_, {}, {});\n", topic, payload))
        }
        "w5500_command" => w5500_command(gen, block),
        "ld3320_setup" => ld3320_setup(gen, block),
        "ld3320_start" => statement("ld3320_inst.start();\n"),
        "ld3320_add" => statement(format!(
            "ld3320_inst.addCommand({}, {});\n",
            text::c_string_literal(&block.field("words")),
            block.field_or("id", "0")
        )),
        "ld3320_read" => value("ld3320_inst.read()", Precedence::UnaryPostfix),
        _ => None,
    }
}

fn reserve_bus(gen: &mut BlockCodeGenerator<'_>, block: &Block, pins: &SpiPins, purpose: &str) {
    gen.reserve(block, &pins.mosi, PinRole::Spi, &format!("{} MOSI", purpose));
    gen.reserve(block, &pins.miso, PinRole::Spi, &format!("{} MISO", purpose));
    gen.reserve(block, &pins.sck, PinRole::Spi, &format!("{} SCK", purpose));
}

fn spi_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let spi_id = block.field("SPI_ID");
    let chip_select = block.field("PIN");
    let mode = block.field_or("SPI_MODE", "0");
    // Frequency is entered in units of 100 kHz
    let frequency = gen.value_or(block, "frequency", Precedence::Multiplicative, "1");

    let choice = block.field("SPI1_ID");
    let board = gen.board();
    let pins = match board.spi_bus_pins(&spi_id, Some(choice.as_str())) {
        Some(pins) => pins.clone(),
        None => {
            gen.warn(
                block,
                TAG_UNKNOWN_RESOURCE,
                format!("SPI bus {} is not available on board {}", spi_id, board.id),
            );
            SpiPins {
                mosi: "NC".to_string(),
                miso: "NC".to_string(),
                sck: "NC".to_string(),
            }
        }
    };
    if pins.mosi != "NC" {
        reserve_bus(gen, block, &pins, &spi_id);
    }
    gen.reserve(block, &chip_select, PinRole::Output, "SPI chip select");

    let name = format!("spi_{}", spi_id);
    gen.add_declaration(
        &name,
        format!("SPI {}({},{},{});", name, pins.mosi, pins.miso, pins.sck),
    );
    let select = digital_out(gen, &chip_select);

    let mut code = format!(
        "{}.frequency({});\n",
        name,
        text::multiply_literal(&frequency, 100000.0)
    );
    code.push_str(&format!("{}.format(8,{});\n", name, mode));
    code.push_str(&format!("{}.write(0);\n", select));
    statement(code)
}

/// With a slave select pin the transfer is wrapped in a helper function
/// that toggles the pin around it.
fn spi_transfer_return(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let spi_name = format!("spi_{}", block.field("SPI_ID"));
    let data = gen.value_or(block, "SPI_DATA", ARGUMENT, "0");
    let slave = block.field_or("SPI_SS", "none");

    if slave == "none" {
        return value(format!("{}.write({})", spi_name, data), Precedence::UnaryPostfix);
    }

    gen.reserve(block, &slave, PinRole::Output, "SPI slave select");
    let select = digital_out(gen, &slave);
    let function = format!("spiReturnSlave{}", slave);
    let body = [
        "  int spiReturn = 0;".to_string(),
        format!("  {}.write(1);", select),
        format!("  spiReturn = {}.write({});", spi_name, data),
        format!("  {}.write(0);", select),
        "  return spiReturn;".to_string(),
    ]
    .join("\n");
    gen.add_function(&function, text::callback_function("int", &function, &[], &format!("{}\n", body)));
    value(format!("{}()", function), Precedence::UnaryPostfix)
}

fn nrf24_name(block: &Block) -> String {
    format!("nrf24_{}", block.field("MOSI"))
}

fn nrf24_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pins = SpiPins {
        mosi: block.field("MOSI"),
        miso: block.field("MISO"),
        sck: block.field("SCK"),
    };
    let cs = block.field("CS");
    let ce = block.field("CE");
    let irq = block.field("IRQ");
    reserve_bus(gen, block, &pins, "nRF24L01");
    gen.reserve(block, &cs, PinRole::Output, "nRF24L01 CSN");
    gen.reserve(block, &ce, PinRole::Output, "nRF24L01 CE");
    gen.reserve(block, &irq, PinRole::Interrupt, "nRF24L01 IRQ");

    let name = nrf24_name(block);
    gen.add_include("nRF24L01P", "#include \"nRF24L01P.h\"");
    gen.add_declaration(
        &name,
        format!(
            "nRF24L01P {}({},{},{},{},{},{});",
            name, pins.mosi, pins.miso, pins.sck, cs, ce, irq
        ),
    );

    let address = block.field_or("ADDR", "0");
    let mut code = format!("{}.setRxAddress({}ull);\n", name, address);
    code.push_str(&format!("{}.setTxAddress({}ull);\n", name, address));
    code.push_str(&format!(
        "{}.NRF24L01_Init({}, {});\n",
        name,
        block.field_or("RFCH", "0"),
        block.field_or("TR", "0")
    ));
    code.push_str(&format!("{}.nIRQ_.mode(PullDown);\n", name));
    code.push_str(&format!("{}.nIRQ_.rise(&nRF_Analysis);\n", name));
    statement(code)
}

/// `{"name",""},` per non-empty entry of a comma separated list.
fn w5500_topic_table(list: &str) -> String {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| format!("{{{},\"\"}},", text::c_string_literal(item)))
        .collect()
}

fn optional_string(field: &str) -> String {
    if field.is_empty() {
        "NULL".to_string()
    } else {
        text::c_string_literal(field)
    }
}

fn w5500_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pins = SpiPins {
        mosi: block.field("MOSI"),
        miso: block.field("MISO"),
        sck: block.field("SCK"),
    };
    let cs = block.field("CS");
    let reset = block.field("RESET");
    reserve_bus(gen, block, &pins, "W5500");
    gen.reserve(block, &cs, PinRole::Output, "W5500 CS");
    gen.reserve(block, &reset, PinRole::Output, "W5500 RESET");

    gen.add_include("w5500", "#include \"networking.h\"");
    gen.add_declaration(
        "w5500_wiz",
        format!(
            "WIZnetInterface w5500_wiz({},{},{},{},{});",
            pins.mosi, pins.miso, pins.sck, cs, reset
        ),
    );
    gen.add_declaration("w5500sock_", "MQTTSocket w5500sock_;");
    gen.add_declaration("w5500client_", "MClient w5500client_(w5500sock_);");
    gen.add_declaration(
        "w5500sensors_",
        format!(
            "const char* w5500sensors_[][2] = {{{}{{NULL,NULL}}}};",
            w5500_topic_table(&block.field("sensors"))
        ),
    );
    gen.add_declaration(
        "w5500actuators_",
        format!(
            "const char* w5500actuators_[][2] = {{{}{{NULL,NULL}}}};",
            w5500_topic_table(&block.field("actuators"))
        ),
    );

    // The library needs a command handler even when no block defines one
    if gen.context().registries.function(W5500_CALLBACK).is_none() {
        register_w5500_callback(gen, "");
    }

    statement(format!(
        "networking_init(w5500_wiz, w5500sock_, w5500client_, {}, {}, w5500sensors_, w5500actuators_, {}, {}, {});\n",
        text::c_string_literal(block.field("host").trim()),
        text::c_string_literal(block.field("node").trim()),
        W5500_CALLBACK,
        optional_string(&block.field("mqttUser")),
        optional_string(&block.field("mqttPasswd"))
    ))
}

fn register_w5500_callback(gen: &mut BlockCodeGenerator<'_>, body: &str) {
    gen.add_include("string", "#include <string>");
    let text_type = ValueType::Text.cpp_type();
    let params = [format!("{} topic", text_type), format!("{} value", text_type)];
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    gen.add_function(
        W5500_CALLBACK,
        text::callback_function("void", W5500_CALLBACK, &params, body),
    );
}

/// Command handler body; the block itself emits nothing in place.
fn w5500_command(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let body = gen.statement_to_code(block, "function_body");
    register_w5500_callback(gen, &body);
    statement("")
}

fn ld3320_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let pins = SpiPins {
        mosi: block.field("MOSI"),
        miso: block.field("MISO"),
        sck: block.field("SCK"),
    };
    let cs = block.field("CS");
    let reset = block.field("RESET");
    reserve_bus(gen, block, &pins, "LD3320");
    gen.reserve(block, &cs, PinRole::Output, "LD3320 NSS");
    gen.reserve(block, &reset, PinRole::Output, "LD3320 RST");

    gen.add_include("ld3320", "#include \"ld3320.h\"");
    gen.add_declaration(
        "ld3320_inst",
        format!(
            "VoiceRecognition ld3320_inst({},{},{},{},{});",
            cs, pins.miso, pins.mosi, pins.sck, reset
        ),
    );
    statement("ld3320_inst.init();\n")
}
