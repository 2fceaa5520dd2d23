//! Sensor modules: I2C light and pressure sensors, single wire sensors, the
//! YL analog sensor boards and the JY901 serial IMU.

use super::{statement, value, ARGUMENT};
use crate::board::MapperKind;
use crate::codegen::mbed_codegen::{BlockCodeGenerator, Emission};
use crate::codegen::precedence::Precedence;
use crate::codegen::reservation::PinRole;
use crate::graph::Block;

pub fn emit(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    match block.kind.as_str() {
        "bh1750_setup" => i2c_setup(gen, block, "BH1750", "bh1750"),
        "bh1750_read" => unit_call(block, "bh1750", "I2C_Pins", "getlightdata()"),
        "bmp180_setup" => i2c_setup(gen, block, "BMP180", "bmp180"),
        "bmp180_temp" => unit_call(block, "bmp180", "I2C_Pins", "BMP180GetTemperature()"),
        "bmp180_pressure" => unit_call(block, "bmp180", "I2C_Pins", "BMP180GetPressure()"),

        "dht11_setup" => single_wire_setup(gen, block, "dht11", "dht11"),
        "dht11_temp" => unit_call(block, "dht11", "IO", "gettemperature()"),
        "dht11_humidity" => unit_call(block, "dht11", "IO", "gethumidity()"),
        "dht11_readable" => unit_call(block, "dht11", "IO", "getdata()"),
        "ds18B20_setup" => single_wire_setup(gen, block, "DS18B20", "ds18B20"),
        "ds18B20_temp" => unit_call(block, "ds18B20", "IO", "gettemperature()"),
        "ds18B20_readable" => unit_call(block, "ds18B20", "IO", "getdata()"),
        "sr501_setup" => single_wire_setup(gen, block, "sr501", "sr501"),
        "sr501_o" => unit_call(block, "sr501", "IO", "read()"),
        "sr501_readable" => value(format!("sr501_{}==true", block.field("IO")), Precedence::Equality),
        "sr501_reset" => statement(format!("sr501_{}.reset();\n", block.field("IO"))),

        "analog_setup" => analog_setup(gen, block),
        "analog_o" => unit_call(block, "analog", "IO", "read()"),
        "analog_readable" => value(format!("analog_{}==true", block.field("IO")), Precedence::Equality),
        "analog_reset" => statement(format!("analog_{}.reset();\n", block.field("IO"))),

        "jy901_setup" => jy901_setup(gen, block),
        "jy901_receive" => statement(format!("jy901_{}.receiveData();\n", block.field("JY901_NAME"))),
        "jy901_getacc" => jy901_get(gen, block, "getAcc"),
        "jy901_getgyo" => jy901_get(gen, block, "getGyo"),
        "jy901_getmag" => jy901_get(gen, block, "getMag"),
        "jy901_getatt" => jy901_get(gen, block, "getAttitude"),
        _ => None,
    }
}

/// `<prefix>_<field value>.<call>`
fn unit_call(block: &Block, prefix: &str, field: &str, call: &str) -> Option<Emission> {
    value(
        format!("{}_{}.{}", prefix, block.field(field), call),
        Precedence::UnaryPostfix,
    )
}

/// I2C sensor named after the bus its SDA pin belongs to.
fn i2c_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block, class: &str, prefix: &str) -> Option<Emission> {
    let sda = block.field("I2C_SDA");
    let scl = block.field("I2C_SCL");
    gen.reserve(block, &sda, PinRole::I2c, &format!("{} SDA", class));
    gen.reserve(block, &scl, PinRole::I2c, &format!("{} SCL", class));

    let unit = gen.resolve_unit(block, &sda, MapperKind::I2c);
    let name = format!("{}_{}", prefix, unit);
    gen.add_declaration(&name, format!("{} {}({},{});", class, name, sda, scl));
    statement("")
}

fn single_wire_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block, class: &str, prefix: &str) -> Option<Emission> {
    let io = block.field("IO");
    gen.reserve(block, &io, PinRole::Input, class);
    let name = format!("{}_{}", prefix, io);
    gen.add_declaration(&name, format!("{} {}({});", class, name, io));
    statement("")
}

/// YL sensor board: digital threshold output plus the analog level.
fn analog_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let io = block.field("IO");
    let aio = block.field("AIO");
    gen.reserve(block, &io, PinRole::Input, "YL digital output");
    gen.reserve(block, &aio, PinRole::Input, "YL analog output");
    let name = format!("analog_{}", io);
    gen.add_declaration(&name, format!("YL {}({},{});", name, io, aio));
    statement("")
}

fn jy901_setup(gen: &mut BlockCodeGenerator<'_>, block: &Block) -> Option<Emission> {
    let tx = block.field("TX");
    let rx = block.field("RX");
    gen.reserve(block, &tx, PinRole::Serial, "JY901 TX");
    gen.reserve(block, &rx, PinRole::Serial, "JY901 RX");

    let unit = gen.resolve_unit(block, &tx, MapperKind::Serial);
    let name = format!("jy901_{}", unit);
    gen.add_declaration(&name, format!("JY901 {}({},{});", name, tx, rx));
    statement("")
}

/// Getter that fills three caller-provided variables.
fn jy901_get(gen: &mut BlockCodeGenerator<'_>, block: &Block, method: &str) -> Option<Emission> {
    let args: Vec<String> = ["ARG1", "ARG2", "ARG3"]
        .iter()
        .enumerate()
        .map(|(i, socket)| gen.value_or(block, socket, ARGUMENT, &format!("invalid{}", i + 1)))
        .collect();
    statement(format!(
        "jy901_{}.{}({});\n",
        block.field("JY901_NAME"),
        method,
        args.join(",")
    ))
}

#[cfg(test)]
mod tests {
    use crate::board::nucleo_f103rb;
    use crate::codegen::mbed_codegen::{BlockCodeGenerator, GeneratedProgram};
    use crate::config::CompilerOptions;
    use crate::error::TAG_PIN_CONFLICT;
    use crate::graph::{Block, BlockGraph};

    fn generate(graph: &BlockGraph) -> GeneratedProgram {
        let board = nucleo_f103rb();
        let options = CompilerOptions::default();
        BlockCodeGenerator::new(graph, &board, &options).generate_program()
    }

    #[test]
    fn test_i2c_sensors_named_after_bus() {
        let mut graph = BlockGraph::new("i2c");
        graph.add_block(
            Block::new("light", "bh1750_setup")
                .with_field("I2C_SDA", "PB_7")
                .with_field("I2C_SCL", "PB_6"),
        );
        graph.add_block(
            Block::new("press", "bmp180_setup")
                .with_field("I2C_SDA", "PB_11")
                .with_field("I2C_SCL", "PB_10"),
        );
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "set"));
        graph.add_block(Block::new("set", "variables_set").with_field("VAR", "lux").with_value("VALUE", "r"));
        graph.add_block(Block::new("r", "bh1750_read").with_field("I2C_Pins", "I2C_1"));

        let program = generate(&graph);
        assert_eq!(
            program.sections.declarations,
            vec!["BH1750 bh1750_I2C_1(PB_7,PB_6);", "BMP180 bmp180_I2C_2(PB_11,PB_10);"]
        );
        assert_eq!(program.loop_body, "lux = bh1750_I2C_1.getlightdata();\n");
        assert!(program.warnings.is_empty());
    }

    #[test]
    fn test_single_wire_sensors() {
        let mut graph = BlockGraph::new("wire");
        graph.add_block(Block::new("dht", "dht11_setup").with_field("IO", "PA_0").with_next("pir"));
        graph.add_block(Block::new("pir", "sr501_setup").with_field("IO", "PA_1"));
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "if"));
        graph.add_block(
            Block::new("if", "controls_if")
                .with_value("IF0", "ready")
                .with_statement("DO0", "reset"),
        );
        graph.add_block(Block::new("ready", "sr501_readable").with_field("IO", "PA_1"));
        graph.add_block(Block::new("reset", "sr501_reset").with_field("IO", "PA_1"));

        let program = generate(&graph);
        assert_eq!(
            program.sections.declarations,
            vec!["dht11 dht11_PA_0(PA_0);", "sr501 sr501_PA_1(PA_1);"]
        );
        assert_eq!(program.loop_body, "if (sr501_PA_1==true) {\n  sr501_PA_1.reset();\n}\n");
    }

    #[test]
    fn test_jy901_getters_default_arguments() {
        let mut graph = BlockGraph::new("imu");
        graph.add_block(Block::new("setup", "jy901_setup").with_field("TX", "PA_2").with_field("RX", "PA_3"));
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "rx"));
        graph.add_block(Block::new("rx", "jy901_receive").with_field("JY901_NAME", "Serial_2").with_next("acc"));
        graph.add_block(
            Block::new("acc", "jy901_getacc")
                .with_field("JY901_NAME", "Serial_2")
                .with_value("ARG1", "ax"),
        );
        graph.add_block(Block::new("ax", "variables_get").with_field("VAR", "ax"));

        let program = generate(&graph);
        assert_eq!(program.sections.declarations, vec!["JY901 jy901_Serial_2(PA_2,PA_3);"]);
        assert_eq!(
            program.loop_body,
            "jy901_Serial_2.receiveData();\njy901_Serial_2.getAcc(ax,invalid2,invalid3);\n"
        );
    }

    #[test]
    fn test_sensor_on_output_pin_conflicts() {
        let mut graph = BlockGraph::new("clash");
        graph.add_block(Block::new("w", "io_digitalwrite").with_field("PIN", "PA_0").with_next("dht"));
        graph.add_block(Block::new("dht", "dht11_setup").with_field("IO", "PA_0"));

        let program = generate(&graph);
        assert_eq!(program.warnings.len(), 1);
        assert_eq!(program.warnings[0].block_id, "dht");
        assert_eq!(program.warnings[0].tag, TAG_PIN_CONFLICT);
    }

    #[test]
    fn test_yl_analog_sensor() {
        let mut graph = BlockGraph::new("soil");
        graph.add_block(Block::new("yl", "analog_setup").with_field("IO", "PB_0").with_field("AIO", "PA_4"));
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "set"));
        graph.add_block(
            Block::new("set", "variables_set")
                .with_field("VAR", "level")
                .with_value("VALUE", "o")
                .with_next("if"),
        );
        graph.add_block(Block::new("o", "analog_o").with_field("IO", "PB_0"));
        graph.add_block(
            Block::new("if", "controls_if")
                .with_value("IF0", "wet")
                .with_statement("DO0", "reset"),
        );
        graph.add_block(Block::new("wet", "analog_readable").with_field("IO", "PB_0"));
        graph.add_block(Block::new("reset", "analog_reset").with_field("IO", "PB_0"));

        let program = generate(&graph);
        assert_eq!(program.sections.declarations, vec!["YL analog_PB_0(PB_0,PA_4);"]);
        assert_eq!(
            program.loop_body,
            "level = analog_PB_0.read();\nif (analog_PB_0==true) {\n  analog_PB_0.reset();\n}\n"
        );
        assert!(program.warnings.is_empty());
    }
}
