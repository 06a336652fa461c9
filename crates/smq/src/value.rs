//! The tagged metadata value type and ordered metadata bag for SMQ.
//!
//! Same closed tag set as the GGUF reader (\S3's metadata bag is shared
//! semantics, not shared code — SMQ is "authored by us and versioned
//! independently", \S4.4), so a [`crate::import`]-style converter just
//! walks one bag and inserts into the other.

use indexmap::IndexMap;

use crate::error::FormatError;

/// A single untyped metadata value, closed to the same tag set GGUF uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `u8`
    U8(u8),
    /// `i8`
    I8(i8),
    /// `u16`
    U16(u16),
    /// `i16`
    I16(i16),
    /// `u32`
    U32(u32),
    /// `i32`
    I32(i32),
    /// `u64`
    U64(u64),
    /// `i64`
    I64(i64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `bool`
    Bool(bool),
    /// length-prefixed UTF-8 string
    String(String),
    /// a homogeneous array of any non-array tag
    Array(Vec<Value>),
}

impl Value {
    /// The wire-format value-tag byte for this value's variant.
    pub fn tag(&self) -> u32 {
        match self {
            Value::U8(_) => 0,
            Value::I8(_) => 1,
            Value::U16(_) => 2,
            Value::I16(_) => 3,
            Value::U32(_) => 4,
            Value::I32(_) => 5,
            Value::F32(_) => 6,
            Value::Bool(_) => 7,
            Value::String(_) => 8,
            Value::Array(_) => 9,
            Value::U64(_) => 10,
            Value::I64(_) => 11,
            Value::F64(_) => 12,
        }
    }

    /// Borrows the string payload.
    pub fn as_str(&self, context: &str) -> Result<&str, FormatError> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Coerces any integer-tagged value to `u64`.
    pub fn as_u64(&self, context: &str) -> Result<u64, FormatError> {
        match *self {
            Value::U8(v) => Ok(v as u64),
            Value::U16(v) => Ok(v as u64),
            Value::U32(v) => Ok(v as u64),
            Value::U64(v) => Ok(v),
            Value::I8(v) if v >= 0 => Ok(v as u64),
            Value::I16(v) if v >= 0 => Ok(v as u64),
            Value::I32(v) if v >= 0 => Ok(v as u64),
            Value::I64(v) if v >= 0 => Ok(v as u64),
            ref other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Coerces any integer-tagged value to `u32`.
    pub fn as_u32(&self, context: &str) -> Result<u32, FormatError> {
        self.as_u64(context).map(|v| v as u32)
    }

    /// Coerces any integer-tagged value to `i32`.
    pub fn as_i32(&self, context: &str) -> Result<i32, FormatError> {
        match *self {
            Value::U8(v) => Ok(v as i32),
            Value::U16(v) => Ok(v as i32),
            Value::U32(v) => Ok(v as i32),
            Value::U64(v) => Ok(v as i32),
            Value::I8(v) => Ok(v as i32),
            Value::I16(v) => Ok(v as i32),
            Value::I32(v) => Ok(v),
            Value::I64(v) => Ok(v as i32),
            ref other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Coerces any numeric-tagged value to `f64`.
    pub fn as_f64(&self, context: &str) -> Result<f64, FormatError> {
        match *self {
            Value::F32(v) => Ok(v as f64),
            Value::F64(v) => Ok(v),
            Value::U8(v) => Ok(v as f64),
            Value::U16(v) => Ok(v as f64),
            Value::U32(v) => Ok(v as f64),
            Value::U64(v) => Ok(v as f64),
            Value::I8(v) => Ok(v as f64),
            Value::I16(v) => Ok(v as f64),
            Value::I32(v) => Ok(v as f64),
            Value::I64(v) => Ok(v as f64),
            ref other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Coerces a boolean-tagged value.
    pub fn as_bool(&self, context: &str) -> Result<bool, FormatError> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Borrows the array payload.
    pub fn as_array(&self, context: &str) -> Result<&[Value], FormatError> {
        match self {
            Value::Array(items) => Ok(items.as_slice()),
            other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Convenience: an array of strings.
    pub fn as_string_array(&self, context: &str) -> Result<Vec<String>, FormatError> {
        self.as_array(context)?
            .iter()
            .map(|v| v.as_str(context).map(|s| s.to_owned()))
            .collect()
    }
}

/// An ordered `String -> Value` mapping, backed by [`indexmap::IndexMap`]
/// so declaration order survives a write-then-read round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBag {
    entries: IndexMap<String, Value>,
}

impl MetadataBag {
    /// An empty bag.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Inserts a key/value pair, preserving first-seen order on update.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Iterates `(key, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An optional string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str(key).ok())
    }

    /// An optional `u32` value, coerced from any integer tag.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.as_u32(key).ok())
    }

    /// An optional `bool` value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool(key).ok())
    }

    /// An optional array of strings.
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(|v| v.as_string_array(key).ok())
    }
}
