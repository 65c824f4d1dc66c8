use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// A generated value, ready to bind as one insert parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Pre-formatted decimal literal; scale is already applied exactly.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Uuid(value) | Value::Decimal(value) => {
                Some(value.as_str())
            }
            _ => None,
        }
    }

    /// Render for flat-file output. NULL renders empty, matching the
    /// loaders these files feed.
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Decimal(value) | Value::Text(value) | Value::Uuid(value) => value.clone(),
            Value::Bytes(bytes) => bytes.iter().map(|byte| format!("{byte:02x}")).collect(),
            Value::Date(value) => value.format("%Y-%m-%d").to_string(),
            Value::Time(value) => value.format("%H:%M:%S").to_string(),
            Value::Timestamp(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::TimestampTz(value) => value.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            Value::Json(value) => value.to_string(),
            Value::TextArray(items) => format!("{{{}}}", items.join(",")),
            Value::IntArray(items) => format!(
                "{{{}}}",
                items
                    .iter()
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}
