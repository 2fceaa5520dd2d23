//! # Block Graph
//!
//! The user's program as handed over by the editor: a flat list of blocks
//! linked through value sockets, statement sockets and `next` links.
//!
//! The graph is plain data. It knows nothing about code generation; the
//! generator and the consistency checker walk it through the lookup helpers
//! defined here.

use crate::codegen::text;
use crate::error::{BlockWarning, ClearedWarning, Result, GENERATION_TAGS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Literal value stored in a block field (dropdown selection, number entry,
/// text entry or checkbox).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Number(n) => write!(f, "{}", text::format_number(*n)),
            // Checkbox fields read back as TRUE / FALSE
            FieldValue::Bool(true) => write!(f, "TRUE"),
            FieldValue::Bool(false) => write!(f, "FALSE"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Result type declared by a value-producing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    ShortNumber,
    Number,
    LargeNumber,
    Decimal,
    Text,
    Character,
    Array,
    Null,
}

impl ValueType {
    /// The C++ spelling of this type in generated declarations.
    pub fn cpp_type(&self) -> &'static str {
        match self {
            ValueType::Boolean => "bool",
            ValueType::ShortNumber => "short",
            ValueType::Number => "int",
            ValueType::LargeNumber => "long",
            ValueType::Decimal => "float",
            ValueType::Text => "std::string",
            ValueType::Character => "char",
            ValueType::Array => "int[]",
            ValueType::Null => "void",
        }
    }

    /// Parse the type names used by type-selector dropdowns.
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            "BOOLEAN" => Some(ValueType::Boolean),
            "SHORT_NUMBER" => Some(ValueType::ShortNumber),
            "NUMBER" => Some(ValueType::Number),
            "LARGE_NUMBER" => Some(ValueType::LargeNumber),
            "DECIMAL" => Some(ValueType::Decimal),
            "TEXT" => Some(ValueType::Text),
            "CHARACTER" => Some(ValueType::Character),
            "ARRAY" => Some(ValueType::Array),
            "NULL" => Some(ValueType::Null),
            _ => None,
        }
    }
}

/// A single node of the program graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
    /// Value socket name -> id of the block plugged into it
    #[serde(default)]
    pub values: HashMap<String, String>,
    /// Statement socket name -> id of the first block of the child chain
    #[serde(default)]
    pub statements: HashMap<String, String>,
    #[serde(default)]
    pub next: Option<String>,
    /// Declared result type when the block is used as a value producer
    #[serde(default)]
    pub output: Option<ValueType>,
    /// Current dropdown option values per field
    #[serde(default)]
    pub options: HashMap<String, Vec<String>>,
    /// Active warnings keyed by tag
    #[serde(default)]
    pub warnings: BTreeMap<String, String>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            fields: HashMap::new(),
            values: HashMap::new(),
            statements: HashMap::new(),
            next: None,
            output: None,
            options: HashMap::new(),
            warnings: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_value(mut self, socket: &str, block_id: &str) -> Self {
        self.values.insert(socket.to_string(), block_id.to_string());
        self
    }

    pub fn with_statement(mut self, socket: &str, block_id: &str) -> Self {
        self.statements.insert(socket.to_string(), block_id.to_string());
        self
    }

    pub fn with_next(mut self, block_id: &str) -> Self {
        self.next = Some(block_id.to_string());
        self
    }

    pub fn with_output(mut self, value_type: ValueType) -> Self {
        self.output = Some(value_type);
        self
    }

    /// Field value as generator text, empty when the field is absent.
    pub fn field(&self, name: &str) -> String {
        self.fields.get(name).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn field_or(&self, name: &str, default: &str) -> String {
        match self.fields.get(name) {
            Some(value) => {
                let text = value.to_string();
                if text.is_empty() {
                    default.to_string()
                } else {
                    text
                }
            }
            None => default.to_string(),
        }
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Checkbox fields are stored either as booleans or as `"TRUE"`.
    pub fn is_checked(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(FieldValue::Bool(b)) => *b,
            Some(FieldValue::Text(t)) => t == "TRUE",
            _ => false,
        }
    }

    /// Set the warning under `tag`, or clear it when `text` is `None`.
    ///
    /// Returns `true` when the stored warnings changed.
    pub fn set_warning(&mut self, tag: &str, text: Option<String>) -> bool {
        match text {
            Some(text) => self.warnings.insert(tag.to_string(), text.clone()) != Some(text),
            None => self.warnings.remove(tag).is_some(),
        }
    }

    pub fn warning(&self, tag: &str) -> Option<&str> {
        self.warnings.get(tag).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The whole user program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockGraph {
    #[serde(default)]
    pub metadata: GraphMetadata,
    blocks: Vec<Block>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl BlockGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: GraphMetadata {
                name: name.into(),
                description: String::new(),
            },
            blocks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Load a graph from the editor's JSON export.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut graph: BlockGraph = serde_json::from_str(json)?;
        graph.reindex();
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn reindex(&mut self) {
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (block.id.clone(), i))
            .collect();
    }

    /// Add a block, replacing any existing block with the same id.
    pub fn add_block(&mut self, block: Block) {
        match self.index.get(&block.id) {
            Some(&i) => self.blocks[i] = block,
            None => {
                self.index.insert(block.id.clone(), self.blocks.len());
                self.blocks.push(block);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.index.get(id).map(|&i| &self.blocks[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Block> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.blocks[i]),
            None => None,
        }
    }

    /// All blocks in insertion order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks that nothing links to, in insertion order.
    pub fn top_blocks(&self) -> Vec<&Block> {
        let referenced: HashSet<&str> = self
            .blocks
            .iter()
            .flat_map(|block| {
                block
                    .values
                    .values()
                    .chain(block.statements.values())
                    .chain(block.next.iter())
                    .map(String::as_str)
            })
            .collect();

        self.blocks
            .iter()
            .filter(|block| !referenced.contains(block.id.as_str()))
            .collect()
    }

    /// The block whose `next` link points at `id`.
    pub fn previous_of(&self, id: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|block| block.next.as_deref() == Some(id))
    }

    /// Follow `next` links starting at `first`. Stops on a dangling id or a cycle.
    pub fn chain(&self, first: &str) -> Vec<&Block> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(first);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                tracing::warn!("[GRAPH] Cycle detected in statement chain at block {}", id);
                break;
            }
            match self.get(id) {
                Some(block) => {
                    chain.push(block);
                    cursor = block.next.as_deref();
                }
                None => break,
            }
        }

        chain
    }

    /// Attach warnings produced by a generation pass to their blocks.
    ///
    /// Generation-owned tags that the pass no longer reports are removed from
    /// every block; the removals are returned so the host can re-render.
    pub fn apply_warnings(&mut self, warnings: &[BlockWarning]) -> Vec<ClearedWarning> {
        let reported: HashSet<(&str, &str)> = warnings
            .iter()
            .map(|w| (w.block_id.as_str(), w.tag.as_str()))
            .collect();

        let mut cleared = Vec::new();
        for block in &mut self.blocks {
            for tag in GENERATION_TAGS {
                if !reported.contains(&(block.id.as_str(), tag)) && block.set_warning(tag, None) {
                    cleared.push(ClearedWarning::new(block.id.clone(), tag));
                }
            }
        }

        for warning in warnings {
            if let Some(block) = self.get_mut(&warning.block_id) {
                block.set_warning(&warning.tag, Some(warning.message.clone()));
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> BlockGraph {
        let mut graph = BlockGraph::new("sample");
        graph.add_block(Block::new("main", "mbed_functions").with_statement("LOOP_FUNC", "w1"));
        graph.add_block(
            Block::new("w1", "io_digitalwrite")
                .with_field("PIN", "PA_5")
                .with_value("STATE", "hl")
                .with_next("w2"),
        );
        graph.add_block(Block::new("hl", "io_highlow").with_field("STATE", "HIGH"));
        graph.add_block(Block::new("w2", "io_digitalwrite").with_field("PIN", "PA_6"));
        graph.add_block(Block::new("setup", "serial_setup"));
        graph
    }

    #[test]
    fn test_top_blocks_exclude_linked_blocks() {
        let graph = sample_graph();
        let ids: Vec<_> = graph.top_blocks().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["main", "setup"]);
    }

    #[test]
    fn test_chain_and_previous() {
        let graph = sample_graph();
        let ids: Vec<_> = graph.chain("w1").iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2"]);
        assert_eq!(graph.previous_of("w2").map(|b| b.id.as_str()), Some("w1"));
        assert!(graph.previous_of("w1").is_none());
    }

    #[test]
    fn test_chain_stops_on_cycle() {
        let mut graph = BlockGraph::new("cycle");
        graph.add_block(Block::new("a", "time_millis").with_next("b"));
        graph.add_block(Block::new("b", "time_millis").with_next("a"));
        assert_eq!(graph.chain("a").len(), 2);
    }

    #[test]
    fn test_field_rendering() {
        let block = Block::new("b", "x")
            .with_field("N", 9600.0)
            .with_field("F", 0.5)
            .with_field("C", true)
            .with_field("T", "PA_5")
            .with_field("BIG", 1e20)
            .with_field("NEG", -3.0);
        assert_eq!(block.field("N"), "9600");
        assert_eq!(block.field("BIG"), "100000000000000000000");
        assert_eq!(block.field("NEG"), "-3");
        assert_eq!(block.field("F"), "0.5");
        assert_eq!(block.field("C"), "TRUE");
        assert_eq!(block.field("T"), "PA_5");
        assert_eq!(block.field("missing"), "");
        assert_eq!(block.field_or("missing", "100"), "100");
        assert!(block.is_checked("C"));
    }

    #[test]
    fn test_set_warning_reports_changes() {
        let mut block = Block::new("b", "serial_print");
        assert!(block.set_warning("serial_setup", Some("missing".to_string())));
        assert!(!block.set_warning("serial_setup", Some("missing".to_string())));
        assert_eq!(block.warning("serial_setup"), Some("missing"));
        assert!(block.set_warning("serial_setup", None));
        assert!(!block.set_warning("serial_setup", None));
    }

    #[test]
    fn test_apply_warnings_replaces_generation_warnings() {
        let mut graph = sample_graph();
        graph.get_mut("w2").unwrap().set_warning("serial_setup", Some("checker".to_string()));

        let first = vec![
            BlockWarning::new("w1", "pin_conflict", "PA_5 taken"),
            BlockWarning::new("w2", "unknown_block", "no rule"),
        ];
        assert!(graph.apply_warnings(&first).is_empty());
        assert!(graph.get("w1").unwrap().warning("pin_conflict").is_some());

        let second = vec![BlockWarning::new("w2", "unknown_block", "no rule")];
        let cleared = graph.apply_warnings(&second);
        assert_eq!(cleared, vec![ClearedWarning::new("w1", "pin_conflict")]);
        assert!(graph.get("w1").unwrap().warning("pin_conflict").is_none());
        assert!(graph.get("w2").unwrap().warning("unknown_block").is_some());
        // Checker tags are left to the checker
        assert_eq!(graph.get("w2").unwrap().warning("serial_setup"), Some("checker"));
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let json = r#"{
            "metadata": { "name": "blink" },
            "blocks": [
                { "id": "w", "kind": "io_digitalwrite", "fields": { "PIN": "PA_5", "NEW_LINE": true } }
            ]
        }"#;
        let graph = BlockGraph::from_json(json).unwrap();
        assert_eq!(graph.metadata.name, "blink");
        let block = graph.get("w").unwrap();
        assert_eq!(block.field("PIN"), "PA_5");
        assert!(block.is_checked("NEW_LINE"));
    }

    #[test]
    fn test_add_block_replaces_same_id() {
        let mut graph = BlockGraph::new("replace");
        graph.add_block(Block::new("a", "time_millis"));
        graph.add_block(Block::new("a", "time_micros"));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("a").unwrap().kind, "time_micros");
    }
}
