//! # Board Capability Table
//!
//! Static per-board description of the hardware resources a block program can
//! use: pin lists per capability, serial/I2C/SPI units and the resolver maps
//! that tell which logical unit a physical pin belongs to.
//!
//! Profiles are plain data. The built-in [`nucleo_f103rb`] profile ships with
//! the crate; further profiles can be loaded from JSON and registered in a
//! [`BoardRegistry`].

use crate::blocks;
use crate::error::{BlockWarning, ClearedWarning, MbgcError, Result, TAG_STALE_OPTION};
use crate::graph::{Block, BlockGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Id of the profile used when nothing else is configured.
pub const DEFAULT_BOARD: &str = "nucleo_f103rb";

/// A dropdown option: `(label, value)`.
pub type BoardOption = (String, String);

/// Resource categories a block field can draw its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    DigitalPins,
    AnalogPins,
    PwmPins,
    SerialPinsRx,
    SerialPinsTx,
    SerialPins,
    SerialSpeed,
    Spi,
    Spi1Choice,
    I2cPinsSda,
    I2cPinsScl,
    I2cPins,
    I2cSpeed,
    BuiltinLed,
    IrqNumber,
}

impl Category {
    /// Categories whose values are physical pin names.
    pub const PIN_CATEGORIES: [Category; 8] = [
        Category::DigitalPins,
        Category::AnalogPins,
        Category::PwmPins,
        Category::SerialPinsRx,
        Category::SerialPinsTx,
        Category::I2cPinsSda,
        Category::I2cPinsScl,
        Category::BuiltinLed,
    ];
}

/// Which resolver map to consult when turning a pin into a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapperKind {
    Serial,
    I2c,
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperKind::Serial => write!(f, "serial"),
            MapperKind::I2c => write!(f, "i2c"),
        }
    }
}

/// Pin assignment of one SPI bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiPins {
    pub mosi: String,
    pub miso: String,
    pub sck: String,
}

impl SpiPins {
    fn new(mosi: &str, miso: &str, sck: &str) -> Self {
        Self {
            mosi: mosi.to_string(),
            miso: miso.to_string(),
            sck: sck.to_string(),
        }
    }
}

/// Capability table of one board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub digital_pins: Vec<BoardOption>,
    pub analog_pins: Vec<BoardOption>,
    pub pwm_pins: Vec<BoardOption>,
    pub serial_pins_rx: Vec<BoardOption>,
    pub serial_pins_tx: Vec<BoardOption>,
    pub serial_pins: Vec<BoardOption>,
    pub serial_speed: Vec<BoardOption>,
    pub serial_mapper: HashMap<String, String>,
    pub spi: Vec<BoardOption>,
    #[serde(default)]
    pub spi1_choice: Vec<BoardOption>,
    #[serde(default)]
    pub spi1_alternative: Option<SpiPins>,
    pub spi_pins: HashMap<String, SpiPins>,
    pub i2c_pins_sda: Vec<BoardOption>,
    pub i2c_pins_scl: Vec<BoardOption>,
    pub i2c_pins: Vec<BoardOption>,
    pub i2c_speed: Vec<BoardOption>,
    pub i2c_mapper: HashMap<String, String>,
    pub builtin_led: Vec<BoardOption>,
    pub irq_number: Vec<BoardOption>,
}

impl BoardProfile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Ordered options for a category.
    pub fn options(&self, category: Category) -> &[BoardOption] {
        match category {
            Category::DigitalPins => &self.digital_pins,
            Category::AnalogPins => &self.analog_pins,
            Category::PwmPins => &self.pwm_pins,
            Category::SerialPinsRx => &self.serial_pins_rx,
            Category::SerialPinsTx => &self.serial_pins_tx,
            Category::SerialPins => &self.serial_pins,
            Category::SerialSpeed => &self.serial_speed,
            Category::Spi => &self.spi,
            Category::Spi1Choice => &self.spi1_choice,
            Category::I2cPinsSda => &self.i2c_pins_sda,
            Category::I2cPinsScl => &self.i2c_pins_scl,
            Category::I2cPins => &self.i2c_pins,
            Category::I2cSpeed => &self.i2c_speed,
            Category::BuiltinLed => &self.builtin_led,
            Category::IrqNumber => &self.irq_number,
        }
    }

    /// Option values (the second element of each pair) for a category.
    pub fn option_values(&self, category: Category) -> Vec<String> {
        self.options(category)
            .iter()
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn has_option(&self, category: Category, value: &str) -> bool {
        self.options(category).iter().any(|(_, v)| v == value)
    }

    /// True when `pin` appears in any pin category of this board.
    pub fn knows_pin(&self, pin: &str) -> bool {
        Category::PIN_CATEGORIES
            .iter()
            .any(|&category| self.has_option(category, pin))
    }

    fn mapper(&self, kind: MapperKind) -> &HashMap<String, String> {
        match kind {
            MapperKind::Serial => &self.serial_mapper,
            MapperKind::I2c => &self.i2c_mapper,
        }
    }

    /// Canonical unit name (e.g. `Serial_1`) for a pin.
    pub fn resolve_unit(&self, pin: &str, kind: MapperKind) -> Result<&str> {
        self.mapper(kind)
            .get(pin)
            .map(String::as_str)
            .ok_or_else(|| MbgcError::UnknownResource {
                resource: pin.to_string(),
                mapper: kind,
            })
    }

    /// MOSI/MISO/SCK pins of an SPI bus, honouring the SPI1 alternative
    /// pin set selected through `choice`.
    pub fn spi_bus_pins(&self, spi_id: &str, choice: Option<&str>) -> Option<&SpiPins> {
        if spi_id == "SPI1" {
            if let (Some(alternative), Some(choice)) = (&self.spi1_alternative, choice) {
                let alt_key = format!("{},{},{}", alternative.sck, alternative.miso, alternative.mosi);
                if choice == alt_key {
                    return Some(alternative);
                }
            }
        }
        self.spi_pins.get(spi_id)
    }
}

/// Replace the option list of `field` with the board's `category` options.
///
/// The current value is left untouched. When it is no longer offered a
/// stale-option warning is placed on the block; otherwise that warning is
/// cleared. Returns the warning that was set, if any.
pub fn refresh_options(
    block: &mut Block,
    field: &str,
    category: Category,
    board: &BoardProfile,
) -> Option<BlockWarning> {
    let current = block.field(field);
    let values = board.option_values(category);
    let present = values.iter().any(|value| *value == current);
    block.options.insert(field.to_string(), values);

    if present {
        block.set_warning(TAG_STALE_OPTION, None);
        None
    } else {
        let message = format!("The old pin value {} is no longer available.", current);
        tracing::warn!("[BOARD] Block {}: {}", block.id, message);
        block.set_warning(TAG_STALE_OPTION, Some(message.clone()));
        Some(BlockWarning::new(block.id.clone(), TAG_STALE_OPTION, message))
    }
}

/// Stale-option warnings placed and removed by [`refresh_graph_options`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionRefresh {
    pub stale: Vec<BlockWarning>,
    pub cleared: Vec<ClearedWarning>,
}

/// Refresh every category-bound field of every block after a board change.
///
/// Fields a block does not carry are skipped: the editor drops conditional
/// inputs (the SPI1 pin choice) from the block instead of leaving them empty.
pub fn refresh_graph_options(graph: &mut BlockGraph, board: &BoardProfile) -> OptionRefresh {
    let mut refresh = OptionRefresh::default();

    for block in graph.blocks_mut() {
        let bindings = blocks::option_fields(&block.kind);
        if bindings.is_empty() {
            continue;
        }
        let was_stale = block.warning(TAG_STALE_OPTION).is_some();
        // A block with several bound fields keeps the warning of any stale one
        let mut stale = None;
        for &(field, category) in bindings {
            if !block.fields.contains_key(field) {
                continue;
            }
            if let Some(warning) = refresh_options(block, field, category, board) {
                stale = Some(warning);
            }
        }
        match stale {
            Some(warning) => {
                block.set_warning(TAG_STALE_OPTION, Some(warning.message.clone()));
                refresh.stale.push(warning);
            }
            None => {
                block.set_warning(TAG_STALE_OPTION, None);
                if was_stale {
                    refresh.cleared.push(ClearedWarning::new(block.id.clone(), TAG_STALE_OPTION));
                }
            }
        }
    }

    refresh
}

/// Known board profiles, keyed by id.
#[derive(Debug, Clone)]
pub struct BoardRegistry {
    profiles: HashMap<String, BoardProfile>,
}

impl BoardRegistry {
    /// Registry holding only the built-in profiles.
    pub fn builtin() -> Self {
        let mut registry = Self {
            profiles: HashMap::new(),
        };
        registry.register(nucleo_f103rb());
        registry
    }

    pub fn register(&mut self, profile: BoardProfile) {
        tracing::debug!("[BOARD] Registered profile {} ({})", profile.id, profile.name);
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn get(&self, id: &str) -> Result<&BoardProfile> {
        self.profiles
            .get(id)
            .ok_or_else(|| MbgcError::BoardNotFound(id.to_string()))
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }
}

impl Default for BoardRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Built-in profiles
// ---------------------------------------------------------------------------

const F103_DIGITAL: &[&str] = &[
    "PA_0", "PA_1", "PA_10", "PA_11", "PA_12", "PA_13", "PA_14", "PA_15", "PA_2", "PA_3", "PA_4",
    "PA_5", "PA_6", "PA_7", "PA_8", "PA_9", "PB_0", "PB_1", "PB_10", "PB_11", "PB_12", "PB_13",
    "PB_14", "PB_15", "PB_2", "PB_3", "PB_4", "PB_5", "PB_6", "PB_7", "PB_8", "PB_9", "PC_0",
    "PC_1", "PC_10", "PC_11", "PC_12", "PC_13", "PC_14", "PC_15", "PC_2", "PC_3", "PC_4", "PC_5",
    "PC_6", "PC_7", "PC_8", "PC_9", "PD_2", "PF_0", "PF_1",
];

const F103_ANALOG: &[&str] = &[
    "PA_0", "PA_1", "PA_2", "PA_3", "PA_4", "PA_5", "PA_6", "PA_7", "PB_0", "PB_1", "PC_0",
    "PC_1", "PC_2", "PC_3", "PC_4", "PC_5",
];

// Timers are not distinguished
const F103_PWM: &[&str] = &[
    "PA_1", "PA_10", "PA_11", "PA_15", "PA_2", "PA_3", "PA_6", "PA_7", "PA_8", "PA_9", "PB_0",
    "PB_1", "PB_10", "PB_11", "PB_13", "PB_14", "PB_15", "PB_3", "PB_4", "PB_5", "PC_4", "PC_6",
    "PC_7", "PC_8", "PC_9",
];

const F103_SERIAL_RX: &[&str] = &["PA_10", "PA_3", "PB_11", "PB_7", "PC_11"];
const F103_SERIAL_TX: &[&str] = &["PB_6", "PC_10", "PA_9", "PB_10", "PA_2"];
const F103_SERIAL_UNITS: &[&str] = &["Serial_1", "Serial_2", "Serial_3"];
const F103_SERIAL_SPEED: &[&str] = &[
    "9600", "300", "600", "1200", "2400", "4800", "14400", "19200", "28800", "31250", "38400",
    "57600", "115200",
];
const F103_SERIAL_MAPPER: &[(&str, &str)] = &[
    ("PC_10", "Serial_3"),
    ("PB_7", "Serial_1"),
    ("PC_11", "Serial_3"),
    ("PB_6", "Serial_1"),
    ("PA_9", "Serial_1"),
    ("PB_10", "Serial_3"),
    ("PA_10", "Serial_1"),
    ("PA_2", "Serial_2"),
    ("PA_3", "Serial_2"),
    ("PB_11", "Serial_3"),
];

const F103_I2C_SDA: &[&str] = &["PB_9", "PB_11", "PB_7"];
const F103_I2C_SCL: &[&str] = &["PB_8", "PB_10", "PB_6"];
const F103_I2C_UNITS: &[&str] = &["I2C_1", "I2C_2"];
const F103_I2C_MAPPER: &[(&str, &str)] = &[
    ("PB_6", "I2C_1"),
    ("PB_7", "I2C_1"),
    ("PB_8", "I2C_1"),
    ("PB_9", "I2C_1"),
    ("PB_10", "I2C_2"),
    ("PB_11", "I2C_2"),
];

const F103_IRQ: &[&str] = &[
    "WWDG_IRQn", "PVD_IRQn", "TAMPER_IRQn", "RTC_IRQn", "FLASH_IRQn", "RCC_IRQn", "EXTI0_IRQn",
    "EXTI1_IRQn", "EXTI2_IRQn", "EXTI3_IRQn", "EXTI4_IRQn", "DMA1_Channel1_IRQn",
    "DMA1_Channel2_IRQn", "DMA1_Channel3_IRQn", "DMA1_Channel4_IRQn", "DMA1_Channel5_IRQn",
    "DMA1_Channel6_IRQn", "DMA1_Channel7_IRQn", "ADC1_2_IRQn", "USB_HP_CAN1_TX_IRQn",
    "USB_LP_CAN1_RX0_IRQn", "CAN1_RX1_IRQn", "CAN1_SCE_IRQn", "EXTI9_5_IRQn", "TIM1_BRK_IRQn",
    "TIM1_UP_IRQn", "TIM1_TRG_COM_IRQn", "TIM1_CC_IRQn", "TIM2_IRQn", "TIM3_IRQn", "TIM4_IRQn",
    "I2C1_EV_IRQn", "I2C1_ER_IRQn", "I2C2_EV_IRQn", "I2C2_ER_IRQn", "SPI1_IRQn", "SPI2_IRQn",
    "USART1_IRQn", "USART2_IRQn", "USART3_IRQn", "EXTI15_10_IRQn", "RTC_Alarm_IRQn",
    "USBWakeUp_IRQn",
];

fn same(values: &[&str]) -> Vec<BoardOption> {
    values
        .iter()
        .map(|v| (v.to_string(), v.to_string()))
        .collect()
}

fn labelled(values: &[(&str, &str)]) -> Vec<BoardOption> {
    values
        .iter()
        .map(|(label, value)| (label.to_string(), value.to_string()))
        .collect()
}

fn mapper(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(pin, unit)| (pin.to_string(), unit.to_string()))
        .collect()
}

/// mbed NUCLEO-F103RB (STM32F103).
pub fn nucleo_f103rb() -> BoardProfile {
    let mut spi_pins = HashMap::new();
    spi_pins.insert("SPI1".to_string(), SpiPins::new("PA_7", "PA_6", "PA_5"));
    spi_pins.insert("SPI2".to_string(), SpiPins::new("PB_15", "PB_14", "PB_13"));

    BoardProfile {
        id: DEFAULT_BOARD.to_string(),
        name: "NUCLEO F103RB".to_string(),
        description: "mbed NUCLEO standard compatible board".to_string(),
        digital_pins: same(F103_DIGITAL),
        analog_pins: same(F103_ANALOG),
        pwm_pins: same(F103_PWM),
        serial_pins_rx: same(F103_SERIAL_RX),
        serial_pins_tx: same(F103_SERIAL_TX),
        serial_pins: same(F103_SERIAL_UNITS),
        serial_speed: same(F103_SERIAL_SPEED),
        serial_mapper: mapper(F103_SERIAL_MAPPER),
        spi: same(&["SPI2", "SPI1"]),
        spi1_choice: same(&["PA_5,PA_6,PA_7", "PB_3,PB_4,PB_5"]),
        spi1_alternative: Some(SpiPins::new("PB_5", "PB_4", "PB_3")),
        spi_pins,
        i2c_pins_sda: same(F103_I2C_SDA),
        i2c_pins_scl: same(F103_I2C_SCL),
        i2c_pins: same(F103_I2C_UNITS),
        i2c_speed: labelled(&[("100kHz", "100000L"), ("400kHz", "400000L")]),
        i2c_mapper: mapper(F103_I2C_MAPPER),
        builtin_led: labelled(&[("LED_1", "PA_5")]),
        irq_number: same(F103_IRQ),
    }
}
