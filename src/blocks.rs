//! # Block Catalogue
//!
//! Static registration data for every block kind the compiler understands.
//!
//! Each entry declares, up front:
//! - the block's **shape** (statement or value producer with its result type)
//! - the **capabilities** it implements, which the consistency checker queries
//!   by tag instead of probing blocks for optional behaviour
//! - the fields whose dropdown options come from the board capability table
//!
//! Emission rules live in `codegen::node_handlers`; this module only answers
//! "what is this kind of block".

use crate::board::{Category, MapperKind};
use crate::graph::ValueType;

/// How a block plugs into the program graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Statement,
    Value(ValueType),
}

/// Peripheral instances that setup and use blocks are paired on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralFamily {
    Serial,
    Pn532,
    Jy901,
    Bh1750,
    Bmp180,
    Stepper,
    Spi,
}

/// Display label that a setup block rewrites to show its resolved unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLabel {
    pub field: &'static str,
    /// `%1` is replaced with the canonical unit
    pub template: &'static str,
    pub neutral: &'static str,
}

impl InstanceLabel {
    pub fn render(&self, unit: &str) -> String {
        self.template.replace("%1", unit)
    }
}

/// A block that configures a peripheral instance from two paired pin fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupInstance {
    pub family: PeripheralFamily,
    /// Field whose resolved unit names the instance
    pub primary_field: &'static str,
    /// Paired field that must resolve to the same unit
    pub secondary_field: &'static str,
    pub mapper: MapperKind,
    pub label: Option<InstanceLabel>,
}

impl SetupInstance {
    pub fn mismatch_tag(&self) -> &'static str {
        match self.mapper {
            MapperKind::Serial => "serial_rx_tx_mismatch",
            MapperKind::I2c => "i2c_mismatch",
        }
    }
}

/// A setup block whose instance is named directly by one field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedSetup {
    pub family: PeripheralFamily,
    pub field: &'static str,
}

/// A block that reads or writes through an instance configured elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsesInstance {
    pub family: PeripheralFamily,
    /// Field holding the canonical unit name
    pub field: &'static str,
    pub tag: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SetupInstance(SetupInstance),
    NamedSetup(NamedSetup),
    UsesInstance(UsesInstance),
    /// Literal `FREQUENCY` input must lie in the audible PWM range
    ToneFrequency,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockKindInfo {
    pub kind: &'static str,
    pub shape: Shape,
    pub capabilities: &'static [Capability],
    pub option_fields: &'static [(&'static str, Category)],
}

const NONE: &[Capability] = &[];
const NO_OPTIONS: &[(&str, Category)] = &[];

const fn statement(kind: &'static str) -> BlockKindInfo {
    BlockKindInfo {
        kind,
        shape: Shape::Statement,
        capabilities: NONE,
        option_fields: NO_OPTIONS,
    }
}

const fn value(kind: &'static str, value_type: ValueType) -> BlockKindInfo {
    BlockKindInfo {
        kind,
        shape: Shape::Value(value_type),
        capabilities: NONE,
        option_fields: NO_OPTIONS,
    }
}

impl BlockKindInfo {
    const fn with_options(mut self, option_fields: &'static [(&'static str, Category)]) -> Self {
        self.option_fields = option_fields;
        self
    }

    const fn with_capabilities(mut self, capabilities: &'static [Capability]) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn is_value(&self) -> bool {
        matches!(self.shape, Shape::Value(_))
    }
}

const fn uses(family: PeripheralFamily, field: &'static str, tag: &'static str) -> Capability {
    Capability::UsesInstance(UsesInstance { family, field, tag })
}

const SERIAL_USE: &[Capability] = &[uses(PeripheralFamily::Serial, "SERIAL_Pins", "serial_setup")];
const PN532_USE: &[Capability] = &[uses(PeripheralFamily::Pn532, "SERIAL_Pins", "pn532_setup")];
const JY901_USE: &[Capability] = &[uses(PeripheralFamily::Jy901, "JY901_NAME", "jy901_setup")];
const STEPPER_USE: &[Capability] = &[uses(PeripheralFamily::Stepper, "STEP_Pin", "stepper_rotate")];
const SPI_USE: &[Capability] = &[uses(PeripheralFamily::Spi, "SPI_ID", "spi_setup")];

const SERIAL_SETUP: &[Capability] = &[Capability::SetupInstance(SetupInstance {
    family: PeripheralFamily::Serial,
    primary_field: "SERIAL_ID",
    secondary_field: "SERIAL_ID_TX",
    mapper: MapperKind::Serial,
    label: Some(InstanceLabel {
        field: "SERIAL_NAME",
        template: "%1 Setup RX:",
        neutral: "Serial Setup RX",
    }),
})];

const PN532_SETUP: &[Capability] = &[Capability::SetupInstance(SetupInstance {
    family: PeripheralFamily::Pn532,
    primary_field: "SERIAL_ID",
    secondary_field: "SERIAL_ID_TX",
    mapper: MapperKind::Serial,
    label: Some(InstanceLabel {
        field: "SERIAL_NAME",
        template: "PN532 on %1 RX:",
        neutral: "PN532 RX:",
    }),
})];

const JY901_SETUP: &[Capability] = &[Capability::SetupInstance(SetupInstance {
    family: PeripheralFamily::Jy901,
    primary_field: "TX",
    secondary_field: "RX",
    mapper: MapperKind::Serial,
    label: None,
})];

const BH1750_SETUP: &[Capability] = &[Capability::SetupInstance(SetupInstance {
    family: PeripheralFamily::Bh1750,
    primary_field: "I2C_SDA",
    secondary_field: "I2C_SCL",
    mapper: MapperKind::I2c,
    label: Some(InstanceLabel {
        field: "BH1750_NAME",
        template: "BH1750 on %1 Setup SDA:",
        neutral: "BH1750 Setup SDA",
    }),
})];

const BMP180_SETUP: &[Capability] = &[Capability::SetupInstance(SetupInstance {
    family: PeripheralFamily::Bmp180,
    primary_field: "I2C_SDA",
    secondary_field: "I2C_SCL",
    mapper: MapperKind::I2c,
    label: Some(InstanceLabel {
        field: "BMP180_NAME",
        template: "BMP180 on %1 Setup SDA:",
        neutral: "BMP180 Setup SDA",
    }),
})];

const PIN_DIGITAL: &[(&str, Category)] = &[("PIN", Category::DigitalPins)];
const IO_DIGITAL: &[(&str, Category)] = &[("IO", Category::DigitalPins)];
const SERIAL_UNIT: &[(&str, Category)] = &[("SERIAL_Pins", Category::SerialPins)];
const I2C_UNIT: &[(&str, Category)] = &[("I2C_Pins", Category::I2cPins)];
const I2C_PAIR: &[(&str, Category)] = &[
    ("I2C_SDA", Category::DigitalPins),
    ("I2C_SCL", Category::DigitalPins),
];
const SERIAL_PAIR: &[(&str, Category)] = &[
    ("SERIAL_ID", Category::DigitalPins),
    ("SERIAL_ID_TX", Category::DigitalPins),
];

static CATALOGUE: &[BlockKindInfo] = &[
    // Framing
    statement("mbed_functions"),
    // Core language
    value("math_number", ValueType::Number),
    value("text", ValueType::Text),
    value("logic_boolean", ValueType::Boolean),
    value("math_arithmetic", ValueType::Number),
    value("logic_compare", ValueType::Boolean),
    value("logic_operation", ValueType::Boolean),
    value("logic_negate", ValueType::Boolean),
    statement("controls_if"),
    statement("controls_whileUntil"),
    // IO
    statement("io_digitalwrite").with_options(PIN_DIGITAL),
    value("io_digitalread", ValueType::Boolean).with_options(PIN_DIGITAL),
    statement("io_builtin_led").with_options(&[("BUILT_IN_LED", Category::BuiltinLed)]),
    value("io_analogread", ValueType::Decimal).with_options(&[("PIN", Category::AnalogPins)]),
    value("io_highlow", ValueType::Boolean),
    statement("io_pwm_set").with_options(&[("PWM_PIN", Category::PwmPins)]),
    value("io_pulsein", ValueType::Number).with_options(&[("PULSEPIN", Category::DigitalPins)]),
    value("io_pulsetimeout", ValueType::Number).with_options(&[("PULSEPIN", Category::DigitalPins)]),
    statement("io_interrupt").with_options(&[("Pin", Category::DigitalPins)]),
    statement("set_interrupt_prio").with_options(&[("IRQ", Category::IrqNumber)]),
    statement("io_tone")
        .with_options(&[("TONEPIN", Category::PwmPins)])
        .with_capabilities(&[Capability::ToneFrequency]),
    statement("io_notone").with_options(&[("TONEPIN", Category::PwmPins)]),
    // Serial
    statement("serial_setup")
        .with_options(&[
            ("SERIAL_ID", Category::DigitalPins),
            ("SERIAL_ID_TX", Category::DigitalPins),
            ("SPEED", Category::SerialSpeed),
        ])
        .with_capabilities(SERIAL_SETUP),
    statement("serial_print")
        .with_options(SERIAL_UNIT)
        .with_capabilities(SERIAL_USE),
    value("serial_getc", ValueType::Character)
        .with_options(SERIAL_UNIT)
        .with_capabilities(SERIAL_USE),
    statement("serial_attach")
        .with_options(SERIAL_UNIT)
        .with_capabilities(SERIAL_USE),
    value("print_content", ValueType::Text),
    statement("pn532_setup")
        .with_options(SERIAL_PAIR)
        .with_capabilities(PN532_SETUP),
    value("pn532_wait_card", ValueType::Boolean)
        .with_options(SERIAL_UNIT)
        .with_capabilities(PN532_USE),
    value("pn532_read_user", ValueType::Number)
        .with_options(SERIAL_UNIT)
        .with_capabilities(PN532_USE),
    value("pn532_read_passwd", ValueType::Number)
        .with_options(SERIAL_UNIT)
        .with_capabilities(PN532_USE),
    // Servo and stepper
    statement("servo_write").with_options(&[("SERVO_PIN", Category::PwmPins)]),
    value("servo_read", ValueType::Decimal).with_options(&[("SERVO_PIN", Category::PwmPins)]),
    statement("stepper_setup")
        .with_options(&[
            ("STEP_Pin", Category::DigitalPins),
            ("DIR_Pin", Category::DigitalPins),
            ("EN_Pin", Category::DigitalPins),
        ])
        .with_capabilities(&[Capability::NamedSetup(NamedSetup {
            family: PeripheralFamily::Stepper,
            field: "STEP_Pin",
        })]),
    statement("stepper_rotate").with_capabilities(STEPPER_USE),
    statement("stepper_wait").with_capabilities(STEPPER_USE),
    // Time
    statement("time_delay"),
    statement("time_delaymicros"),
    value("time_millis", ValueType::LargeNumber),
    value("time_micros", ValueType::LargeNumber),
    statement("infinite_loop"),
    statement("ticker_attach"),
    // SPI
    statement("spi_setup")
        .with_options(&[("SPI_ID", Category::Spi), ("SPI1_ID", Category::Spi1Choice)])
        .with_capabilities(&[Capability::NamedSetup(NamedSetup {
            family: PeripheralFamily::Spi,
            field: "SPI_ID",
        })]),
    statement("spi_transfer")
        .with_options(&[("SPI_ID", Category::Spi)])
        .with_capabilities(SPI_USE),
    value("spi_transfer_return", ValueType::Number)
        .with_options(&[("SPI_ID", Category::Spi)])
        .with_capabilities(SPI_USE),
    statement("nrf24_setup"),
    statement("nrf24_irq"),
    statement("nrf24_check"),
    value("nrf24_readable", ValueType::Boolean),
    value("nrf24_checksum", ValueType::Number),
    statement("nrf24_write_len"),
    statement("nrf24_connect"),
    statement("w5500_setup"),
    statement("w5500_yield"),
    statement("w5500_publish"),
    statement("w5500_command"),
    statement("ld3320_setup"),
    statement("ld3320_start"),
    statement("ld3320_add"),
    value("ld3320_read", ValueType::Number),
    // Sensors
    statement("bh1750_setup")
        .with_options(I2C_PAIR)
        .with_capabilities(BH1750_SETUP),
    value("bh1750_read", ValueType::Decimal)
        .with_options(I2C_UNIT)
        .with_capabilities(&[uses(PeripheralFamily::Bh1750, "I2C_Pins", "bh1750_read")]),
    statement("bmp180_setup")
        .with_options(I2C_PAIR)
        .with_capabilities(BMP180_SETUP),
    value("bmp180_temp", ValueType::Decimal)
        .with_options(I2C_UNIT)
        .with_capabilities(&[uses(PeripheralFamily::Bmp180, "I2C_Pins", "bmp180_temp")]),
    value("bmp180_pressure", ValueType::Decimal)
        .with_options(I2C_UNIT)
        .with_capabilities(&[uses(PeripheralFamily::Bmp180, "I2C_Pins", "bmp180_pressure")]),
    statement("dht11_setup").with_options(IO_DIGITAL),
    value("dht11_temp", ValueType::Decimal).with_options(IO_DIGITAL),
    value("dht11_humidity", ValueType::Decimal).with_options(IO_DIGITAL),
    value("dht11_readable", ValueType::Boolean).with_options(IO_DIGITAL),
    statement("ds18B20_setup").with_options(IO_DIGITAL),
    value("ds18B20_temp", ValueType::Decimal).with_options(IO_DIGITAL),
    value("ds18B20_readable", ValueType::Boolean).with_options(IO_DIGITAL),
    statement("sr501_setup").with_options(IO_DIGITAL),
    value("sr501_o", ValueType::Boolean).with_options(IO_DIGITAL),
    value("sr501_readable", ValueType::Boolean).with_options(IO_DIGITAL),
    statement("sr501_reset").with_options(IO_DIGITAL),
    statement("analog_setup").with_options(&[("IO", Category::DigitalPins), ("AIO", Category::AnalogPins)]),
    value("analog_o", ValueType::Number).with_options(IO_DIGITAL),
    value("analog_readable", ValueType::Boolean).with_options(IO_DIGITAL),
    statement("analog_reset").with_options(IO_DIGITAL),
    statement("jy901_setup")
        .with_options(&[("TX", Category::SerialPinsTx), ("RX", Category::SerialPinsRx)])
        .with_capabilities(JY901_SETUP),
    statement("jy901_receive").with_capabilities(JY901_USE),
    statement("jy901_getacc").with_capabilities(JY901_USE),
    statement("jy901_getgyo").with_capabilities(JY901_USE),
    statement("jy901_getmag").with_capabilities(JY901_USE),
    statement("jy901_getatt").with_capabilities(JY901_USE),
    // Variables
    statement("variables_declare"),
    statement("variables_declare_array"),
    value("variables_get", ValueType::Number),
    statement("variables_set"),
    value("variables_set_type", ValueType::Number),
    // Filesystem
    statement("sd_fs"),
    statement("fs_fopen"),
    statement("fs_fprintf"),
    statement("fs_fscanf"),
    statement("fs_fclose"),
    // G-code parser
    statement("gcode_init"),
    statement("gcode_parse"),
    statement("gcode_cb_home"),
    statement("gcode_cb_absmove"),
    statement("gcode_cb_setpos"),
];

/// Registration data for a block kind.
pub fn lookup(kind: &str) -> Option<&'static BlockKindInfo> {
    CATALOGUE.iter().find(|info| info.kind == kind)
}

pub fn all() -> &'static [BlockKindInfo] {
    CATALOGUE
}

pub fn capabilities(kind: &str) -> &'static [Capability] {
    lookup(kind).map(|info| info.capabilities).unwrap_or(NONE)
}

pub fn option_fields(kind: &str) -> &'static [(&'static str, Category)] {
    lookup(kind).map(|info| info.option_fields).unwrap_or(NO_OPTIONS)
}

pub fn setup_instance(kind: &str) -> Option<&'static SetupInstance> {
    capabilities(kind).iter().find_map(|cap| match cap {
        Capability::SetupInstance(setup) => Some(setup),
        _ => None,
    })
}

pub fn named_setup(kind: &str) -> Option<&'static NamedSetup> {
    capabilities(kind).iter().find_map(|cap| match cap {
        Capability::NamedSetup(setup) => Some(setup),
        _ => None,
    })
}

pub fn uses_instance(kind: &str) -> Option<&'static UsesInstance> {
    capabilities(kind).iter().find_map(|cap| match cap {
        Capability::UsesInstance(uses) => Some(uses),
        _ => None,
    })
}

pub fn has_capability(kind: &str, capability: Capability) -> bool {
    capabilities(kind).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_kinds_are_unique() {
        let mut seen = HashSet::new();
        for info in all() {
            assert!(seen.insert(info.kind), "duplicate kind {}", info.kind);
        }
    }

    #[test]
    fn test_capability_queries() {
        let setup = setup_instance("serial_setup").unwrap();
        assert_eq!(setup.family, PeripheralFamily::Serial);
        assert_eq!(setup.mismatch_tag(), "serial_rx_tx_mismatch");
        assert_eq!(setup.label.unwrap().render("Serial_1"), "Serial_1 Setup RX:");

        let uses = uses_instance("serial_getc").unwrap();
        assert_eq!(uses.family, PeripheralFamily::Serial);
        assert_eq!(uses.tag, "serial_setup");

        assert_eq!(setup_instance("bmp180_setup").unwrap().mismatch_tag(), "i2c_mismatch");
        assert!(setup_instance("io_digitalwrite").is_none());
        assert!(has_capability("io_tone", Capability::ToneFrequency));
        assert_eq!(named_setup("spi_setup").unwrap().field, "SPI_ID");
        assert_eq!(uses_instance("stepper_wait").unwrap().family, PeripheralFamily::Stepper);
        assert!(capabilities("no_such_block").is_empty());
    }

    #[test]
    fn test_shapes() {
        assert!(lookup("io_digitalread").unwrap().is_value());
        assert!(!lookup("io_digitalwrite").unwrap().is_value());
        assert_eq!(
            lookup("io_analogread").unwrap().shape,
            Shape::Value(ValueType::Decimal)
        );
    }

    #[test]
    fn test_option_fields() {
        assert_eq!(option_fields("io_digitalwrite"), &[("PIN", Category::DigitalPins)]);
        assert_eq!(option_fields("serial_setup").len(), 3);
        assert!(option_fields("time_millis").is_empty());
        assert!(option_fields("spi_setup").contains(&("SPI1_ID", Category::Spi1Choice)));
        assert_eq!(option_fields("analog_setup")[1], ("AIO", Category::AnalogPins));
    }
}
