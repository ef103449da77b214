//! Result record and its persisted JSON form.

use crate::result::ConformResult;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Outcome of one export call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stringified return value
    Returned(String),
    /// Composed failure text
    Failed(String),
}

impl Outcome {
    /// The string stored in the result document
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Returned(text) | Self::Failed(text) => text,
        }
    }

    /// Whether the call failed
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcomes keyed by export name, in test-data order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecord {
    entries: Vec<(String, Outcome)>,
}

impl ResultRecord {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` entries
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Record an outcome, replacing an earlier one for the same export
    pub fn insert(&mut self, name: impl Into<String>, outcome: Outcome) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = outcome;
        } else {
            self.entries.push((name, outcome));
        }
    }

    /// Outcome for an export
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries
            .iter()
            .map(|(name, outcome)| (name.as_str(), outcome))
    }

    /// Export names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failed calls
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .count()
    }

    /// Serialize to the result document
    pub fn to_document(&self) -> ConformResult<ResultDocument> {
        Ok(ResultDocument {
            json: serde_json::to_string(self)?,
        })
    }
}

/// Serializes as a flat object of strings, keys in record order
impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, outcome) in &self.entries {
            map.serialize_entry(name, outcome.text())?;
        }
        map.end()
    }
}

/// Compact JSON text of a result record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDocument {
    json: String,
}

impl ResultDocument {
    /// The JSON text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// The JSON text as bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> ResultRecord {
        let mut record = ResultRecord::new();
        record.insert("divide", Outcome::Returned("2".into()));
        record.insert(
            "divideByZero",
            Outcome::Failed("RuntimeError: divide by zero\n".into()),
        );
        record
    }

    #[test]
    fn test_document_is_compact_and_ordered() {
        let document = sample().to_document().unwrap();
        assert_eq!(
            document.as_str(),
            r#"{"divide":"2","divideByZero":"RuntimeError: divide by zero\n"}"#
        );
    }

    #[test]
    fn test_document_is_deterministic() {
        let first = sample().to_document().unwrap();
        let second = sample().to_document().unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_failure_count() {
        assert_eq!(sample().failure_count(), 1);
        assert!(sample().get("divideByZero").unwrap().is_failure());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = sample();
        record.insert("divide", Outcome::Returned("3".into()));
        let names: Vec<_> = record.names().collect();
        assert_eq!(names, ["divide", "divideByZero"]);
        assert_eq!(record.get("divide").unwrap().text(), "3");
    }

    #[test]
    fn test_empty_record() {
        let document = ResultRecord::new().to_document().unwrap();
        assert_eq!(document.as_str(), "{}");
    }
}
