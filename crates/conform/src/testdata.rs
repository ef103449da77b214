//! The test-data table: which exports to call and with what.

use crate::result::{ConformError, ConformResult};
use crate::value::WasmValue;
use serde_json::Value as JsonValue;

/// Ordered mapping from export name to its argument list.
///
/// Order is the order of the keys in the JSON source. A key repeated in the
/// source keeps its first position and its last value, as `JSON.parse` does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestDataTable {
    entries: Vec<(String, Vec<WasmValue>)>,
}

impl TestDataTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of argument arrays.
    ///
    /// A number literal beyond the `f64` range (`1e400`) is a parse error,
    /// not `Infinity`; pass such values as the string `"Infinity"`.
    pub fn from_json_str(text: &str) -> ConformResult<Self> {
        let JsonValue::Object(map) = serde_json::from_str::<JsonValue>(text)? else {
            return Err(ConformError::test_data("top-level value must be an object"));
        };

        let mut table = Self::new();
        for (name, value) in map {
            let JsonValue::Array(raw_args) = value else {
                return Err(ConformError::test_data(format!(
                    "arguments for `{name}` must be an array"
                )));
            };
            let args = raw_args
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    WasmValue::from_json(raw).ok_or_else(|| {
                        ConformError::test_data(format!(
                            "argument {i} of `{name}` must be a number, string, boolean or null"
                        ))
                    })
                })
                .collect::<ConformResult<Vec<_>>>()?;
            table.insert(name, args);
        }
        Ok(table)
    }

    /// Add an entry, replacing the arguments of an existing one in place
    pub fn insert(&mut self, name: impl Into<String>, args: Vec<WasmValue>) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = args;
        } else {
            self.entries.push((name, args));
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, args: Vec<WasmValue>) -> Self {
        self.insert(name, args);
        self
    }

    /// Arguments for an export
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[WasmValue]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, args)| args.as_slice())
    }

    /// Entries in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[WasmValue])> {
        self.entries
            .iter()
            .map(|(name, args)| (name.as_str(), args.as_slice()))
    }

    /// Export names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
