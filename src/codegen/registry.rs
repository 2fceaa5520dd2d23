//! # Declaration, Setup and Function Registries
//!
//! Keyed accumulators for the global parts of a generated program. A pass
//! registers fragments while walking the graph; [`Registries::drain`] turns
//! them into ordered [`Sections`] once the walk is done.
//!
//! Every `add_*` is an upsert: re-registering a key replaces its text but keeps
//! the position of the first registration, so the same pin referenced by ten
//! blocks still produces a single declaration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Include that every mbed program starts with.
pub const MBED_INCLUDE: &str = "#include \"mbed.h\"";

/// Insertion-ordered map with upsert semantics.
#[derive(Debug, Clone)]
struct KeyedEntries<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for KeyedEntries<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> KeyedEntries<T> {
    /// Returns `true` when the key was new.
    fn upsert(&mut self, key: &str, value: T) -> bool {
        match self.index.get(key) {
            Some(&i) => {
                self.entries[i].1 = value;
                false
            }
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value));
                true
            }
        }
    }

    fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SetupEntry {
    text: String,
    run_first: bool,
}

/// Global program fragments in final emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub includes: Vec<String>,
    pub functions: Vec<String>,
    pub declarations: Vec<String>,
    pub setup: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Registries {
    includes: KeyedEntries<String>,
    functions: KeyedEntries<String>,
    declarations: KeyedEntries<String>,
    setups: KeyedEntries<SetupEntry>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_include(&mut self, key: &str, text: impl Into<String>) {
        self.includes.upsert(key, text.into());
    }

    /// Register a complete function definition under its name.
    pub fn add_function(&mut self, key: &str, text: impl Into<String>) {
        if !self.functions.upsert(key, text.into()) {
            tracing::debug!("[CODEGEN] Function {} redefined", key);
        }
    }

    pub fn add_declaration(&mut self, key: &str, text: impl Into<String>) {
        if self.declarations.upsert(key, text.into()) {
            tracing::debug!("[CODEGEN] Declaration {} registered", key);
        }
    }

    /// Register a one-time setup statement. `run_first` entries are emitted
    /// ahead of ordinary setup statements.
    pub fn add_setup(&mut self, key: &str, text: impl Into<String>, run_first: bool) {
        let entry = SetupEntry {
            text: text.into(),
            run_first,
        };
        if self.setups.upsert(key, entry) {
            tracing::debug!("[CODEGEN] Setup {} registered (run_first={})", key, run_first);
        }
    }

    pub fn has_declaration(&self, key: &str) -> bool {
        self.declarations.get(key).is_some()
    }

    pub fn declaration(&self, key: &str) -> Option<&str> {
        self.declarations.get(key).map(String::as_str)
    }

    pub fn function(&self, key: &str) -> Option<&str> {
        self.functions.get(key).map(String::as_str)
    }

    pub fn setup(&self, key: &str) -> Option<&str> {
        self.setups.get(key).map(|entry| entry.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.includes.len() + self.functions.len() + self.declarations.len() + self.setups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce the ordered sections: includes (mbed first), functions,
    /// declarations, then run-first setups before the rest.
    pub fn drain(self) -> Sections {
        let mut includes = vec![MBED_INCLUDE.to_string()];
        includes.extend(self.includes.values().filter(|text| *text != MBED_INCLUDE).cloned());

        let (first, rest): (Vec<&SetupEntry>, Vec<&SetupEntry>) =
            self.setups.values().partition(|entry| entry.run_first);

        Sections {
            includes,
            functions: self.functions.values().cloned().collect(),
            declarations: self.declarations.values().cloned().collect(),
            setup: first
                .into_iter()
                .chain(rest)
                .map(|entry| entry.text.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_keep_first_position() {
        let mut registries = Registries::new();
        registries.add_declaration("a", "int a;");
        registries.add_declaration("b", "int b;");
        registries.add_declaration("a", "long a;");

        let sections = registries.drain();
        assert_eq!(sections.declarations, vec!["long a;", "int b;"]);
    }

    #[test]
    fn test_setup_run_first_ordering() {
        let mut registries = Registries::new();
        registries.add_setup("late", "late();", false);
        registries.add_setup("early", "early();", true);
        registries.add_setup("later", "later();", false);
        registries.add_setup("earlier", "earlier();", true);

        let sections = registries.drain();
        assert_eq!(sections.setup, vec!["early();", "earlier();", "late();", "later();"]);
    }

    #[test]
    fn test_idempotent_registration() {
        let build = |twice: bool| {
            let mut registries = Registries::new();
            for _ in 0..if twice { 2 } else { 1 } {
                registries.add_function("f", "void f() {\n}");
                registries.add_declaration("d", "DigitalOut d(PA_5);");
                registries.add_setup("s", "d.write(0);", true);
            }
            registries.drain()
        };
        assert_eq!(build(false), build(true));
    }

    #[test]
    fn test_mbed_include_always_first() {
        let mut registries = Registries::new();
        registries.add_include("stepper", "#include <stepper.h>");
        registries.add_include("mbed", MBED_INCLUDE);

        let sections = Registries::new().drain();
        assert_eq!(sections.includes, vec![MBED_INCLUDE]);

        let sections = registries.drain();
        assert_eq!(sections.includes, vec![MBED_INCLUDE, "#include <stepper.h>"]);
    }

    #[test]
    fn test_lookup_helpers() {
        let mut registries = Registries::new();
        assert!(registries.is_empty());
        registries.add_declaration("serial_PA_10", "Serial Serial_1(PA_9,PA_10);");
        registries.add_setup("serial_PA_10", "Serial_1.baud(9600);", false);
        assert!(registries.has_declaration("serial_PA_10"));
        assert_eq!(registries.setup("serial_PA_10"), Some("Serial_1.baud(9600);"));
        assert!(registries.function("serial_PA_10").is_none());
        assert_eq!(registries.len(), 2);
    }
}
