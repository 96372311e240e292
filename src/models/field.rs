use serde::Serialize;

/// One labelled value extracted from a QR payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Column label (Vietnamese for CCCD payloads)
    pub label: String,
    /// Extracted value
    pub value: String,
}

impl Field {
    /// Create a new field
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A decoded card: the raw payload and the fields extracted from it.
///
/// Labels are distinct within one record, so a list of records flattens to
/// a table with one row per card and one column per label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedRecord {
    /// Payload exactly as decoded
    pub raw: String,
    /// Ordered fields
    pub fields: Vec<Field>,
}

impl ScannedRecord {
    /// Look up a field value by label
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}
