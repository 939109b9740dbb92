use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A stored document: its id plus schemaless fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    pub create_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            create_time: None,
        }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// A document to create. Fields listed in `server_timestamps` are filled by
/// the store at write time and override anything in `fields`.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub fields: Map<String, Value>,
    pub server_timestamps: Vec<String>,
}

impl NewDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.remove(&field);
        self.server_timestamps.push(field);
        self
    }
}

pub(crate) fn validate_segment(kind: &str, value: &str) -> crate::DocumentResult<()> {
    if value.trim().is_empty() || value.contains('/') {
        return Err(crate::DocumentError::invalid(format!(
            "{kind} must be a non-empty path segment, got '{value}'"
        )));
    }
    Ok(())
}
