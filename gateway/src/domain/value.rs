//! Device values: the closed set of shapes a structured parser may return.
//!
//! Drivers hand the gateway whatever their parsers produce. Instead of
//! inspecting arbitrary objects at runtime, every parser result is expressed
//! in one of these variants and the normalizer dispatches on them explicitly.

use std::fmt;

/// A parser result before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Mapping with arbitrary keys, in insertion order.
    Map(Vec<(DeviceValue, DeviceValue)>),
    /// Ordered sequence.
    Seq(Vec<DeviceValue>),
    /// Unordered collection; iteration order carries no meaning.
    Set(Vec<DeviceValue>),
    /// An object exposing a bag of named attributes.
    Object {
        type_name: String,
        attributes: Vec<(String, DeviceValue)>,
    },
    /// A value with no structure beyond its text representation.
    Opaque(String),
}

impl DeviceValue {
    /// Convenience constructor for a string-keyed mapping.
    #[must_use]
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DeviceValue)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Self::Text(k.into()), v))
                .collect(),
        )
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl From<&str> for DeviceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DeviceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DeviceValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for DeviceValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for DeviceValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Seq(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Self::Text(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Nesting depth past which the text form shows only a container summary.
pub const MAX_TEXT_DEPTH: usize = 32;

impl DeviceValue {
    /// Placeholder that never descends into children: scalars render in full,
    /// containers as their kind plus length.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Map(entries) => format!("<map len={}>", entries.len()),
            Self::Seq(items) => format!("<seq len={}>", items.len()),
            Self::Set(items) => format!("<set len={}>", items.len()),
            Self::Object { type_name, .. } => format!("<{type_name}>"),
            scalar => scalar.to_string(),
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Self::Map(_) | Self::Seq(_) | Self::Set(_) if depth >= MAX_TEXT_DEPTH => {
                f.write_str(&self.summary())
            }
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) | Self::Opaque(s) => f.write_str(s),
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    k.fmt_at(f, depth + 1)?;
                    f.write_str(": ")?;
                    v.fmt_at(f, depth + 1)?;
                }
                f.write_str("}")
            }
            Self::Seq(items) | Self::Set(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_at(f, depth + 1)?;
                }
                f.write_str("]")
            }
            Self::Object { type_name, .. } => write!(f, "<{type_name}>"),
        }
    }
}

/// Text form of a value: strings render bare, everything else renders the
/// way a reader of the device output would expect. Containers nested deeper
/// than [`MAX_TEXT_DEPTH`] collapse to their [`DeviceValue::summary`].
impl fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, 0)
    }
}
