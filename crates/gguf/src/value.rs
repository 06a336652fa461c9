//! The tagged metadata value type and the ordered metadata bag.

use indexmap::IndexMap;

use crate::error::FormatError;

/// A single untyped metadata value. The tag set is closed; nested arrays
/// are rejected at parse time (see [`crate::reader`]).
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

    /// Borrows the string payload, or errors with `context` describing the
    /// accessor that failed.
    pub fn as_str(&self, context: &str) -> Result<&str, FormatError> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            other => Err(FormatError::WrongValueType {
                context: context.to_string(),
                found: other.tag(),
            }),
        }
    }

    /// Coerces any integer-tagged value to `u64`. Used for keys (like
    /// `general.alignment`) whose producer may have picked any integer
    /// width.
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

    /// Coerces any integer-tagged value to `u32`, per \S4.3 step 5's
    /// alignment coercion.
    pub fn as_u32(&self, context: &str) -> Result<u32, FormatError> {
        self.as_u64(context).map(|v| v as u32)
    }

    /// Coerces any integer-tagged value to `i32`, per \S4.7 step 4's
    /// special-token-id coercion ("coercing any integer tag to signed
    /// 32-bit").
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

    /// Convenience: an array of strings, e.g. `tokenizer.ggml.tokens`.
    pub fn as_string_array(&self, context: &str) -> Result<Vec<String>, FormatError> {
        self.as_array(context)?
            .iter()
            .map(|v| v.as_str(context).map(|s| s.to_owned()))
            .collect()
    }

    /// Convenience: an array of `f32`, e.g. `tokenizer.ggml.scores`.
    pub fn as_f32_array(&self, context: &str) -> Result<Vec<f32>, FormatError> {
        self.as_array(context)?
            .iter()
            .map(|v| v.as_f64(context).map(|f| f as f32))
            .collect()
    }

    /// Convenience: an array of `i32`, e.g. `tokenizer.ggml.token_type`.
    pub fn as_i32_array(&self, context: &str) -> Result<Vec<i32>, FormatError> {
        self.as_array(context)?
            .iter()
            .map(|v| v.as_i32(context))
            .collect()
    }
}

/// An ordered `String -> Value` mapping.
///
/// Declaration order is preserved (round-trip property \S8.2 depends on
/// this), backed by [`indexmap::IndexMap`] rather than a hash map, per the
/// design note in \S9: "the reader assigns tensor absolute offsets by
/// walking the manifest in declaration order ... must use an ordered
/// structure for the manifest, not a hash map."
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

    /// A required string value, or a `FormatError` naming `key`.
    pub fn require_str(&self, key: &str) -> Result<&str, FormatError> {
        self.get(key)
            .ok_or_else(|| FormatError::MissingKey(key.to_string()))?
            .as_str(key)
    }

    /// An optional string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str(key).ok())
    }

    /// A required `u32` value, coerced from any integer tag.
    pub fn require_u32(&self, key: &str) -> Result<u32, FormatError> {
        self.get(key)
            .ok_or_else(|| FormatError::MissingKey(key.to_string()))?
            .as_u32(key)
    }

    /// An optional `u32` value, coerced from any integer tag.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.as_u32(key).ok())
    }

    /// An optional `u32` value with a default when absent.
    pub fn get_u32_or(&self, key: &str, default: u32) -> u32 {
        self.get_u32(key).unwrap_or(default)
    }

    /// An optional `i32` value, coerced from any integer tag.
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|v| v.as_i32(key).ok())
    }

    /// An optional `bool` value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool(key).ok())
    }

    /// An optional `bool` value with a default when absent.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// An optional `f32` value.
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|v| v.as_f64(key).ok()).map(|v| v as f32)
    }

    /// An optional array of strings.
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(|v| v.as_string_array(key).ok())
    }

    /// An optional array of `f32`.
    pub fn get_f32_array(&self, key: &str) -> Option<Vec<f32>> {
        self.get(key).and_then(|v| v.as_f32_array(key).ok())
    }

    /// An optional array of `i32`.
    pub fn get_i32_array(&self, key: &str) -> Option<Vec<i32>> {
        self.get(key).and_then(|v| v.as_i32_array(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_declaration_order() {
        let mut bag = MetadataBag::new();
        bag.insert("z", Value::U32(1));
        bag.insert("a", Value::U32(2));
        let keys: Vec<&str> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn alignment_coercion_accepts_any_integer_width() {
        let mut bag = MetadataBag::new();
        bag.insert("general.alignment", Value::U8(64));
        assert_eq!(bag.get_u32("general.alignment"), Some(64));
    }

    #[test]
    fn missing_required_key_errors() {
        let bag = MetadataBag::new();
        assert!(bag.require_str("general.architecture").is_err());
    }
}
