//! The generic value representation shared by the store and the backing file.
//!
//! Every configuration entry is kept as a [`ConfigValue`]: a tagged variant over
//! the handful of shapes a JSON document can hold for a setting.  Typed access
//! (`bool`, `i32`, enums, ...) goes through [`crate::value::ConfigType`], which
//! converts to and from this representation.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::CodecError;

// ── Value kinds ───────────────────────────────────────────────────────────────

/// The shape of a [`ConfigValue`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Enum,
    Array,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Enum => "enum",
            ValueKind::Array => "array",
        };
        f.write_str(name)
    }
}

// ── Cached enum ───────────────────────────────────────────────────────────────

/// An enum constant that has already been resolved from its name.
///
/// Stored in place of the plain name string when the store's enum cache is
/// enabled, so later reads skip the name lookup.  On disk it is written as the
/// bare name, exactly like [`ConfigValue::String`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEnum {
    /// `ConfigEnum::TYPE_NAME` of the enum the constant belongs to.
    pub type_name: &'static str,
    /// Symbolic name of the constant.
    pub name: &'static str,
    /// Position of the constant in `ConfigEnum::VARIANTS`.
    pub ordinal: usize,
}

// ── ConfigValue ───────────────────────────────────────────────────────────────

/// A configuration value as held in memory and persisted to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(CachedEnum),
    Array(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Returns the shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Enum(_) => ValueKind::Enum,
            ConfigValue::Array(_) => ValueKind::Array,
        }
    }

    /// Returns the shape this value takes once written to the document.
    ///
    /// A cached enum is persisted as its name, so it counts as a string.
    pub fn persisted_kind(&self) -> ValueKind {
        match self {
            ConfigValue::Enum(_) => ValueKind::String,
            other => other.kind(),
        }
    }

    /// Returns the textual payload of a string or cached enum.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            ConfigValue::Enum(e) => Some(e.name),
            _ => None,
        }
    }

    /// Deep equality of the persisted form.
    ///
    /// Two values are equal here when writing either one would produce the same
    /// document text: floats compare bit-for-bit, arrays compare element-wise,
    /// and a cached enum equals the string holding its name.
    pub fn same_persisted(&self, other: &ConfigValue) -> bool {
        match (self, other) {
            (ConfigValue::Bool(a), ConfigValue::Bool(b)) => a == b,
            (ConfigValue::Int(a), ConfigValue::Int(b)) => a == b,
            (ConfigValue::Float(a), ConfigValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConfigValue::Array(a), ConfigValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_persisted(y))
            }
            (a, b) => match (a.as_str(), b.as_str()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Checks that the value can be written and read back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NonFiniteFloat`] for NaN or infinite floats (JSON
    /// has no representation for them) and [`CodecError::HeterogeneousArray`]
    /// when an array mixes element shapes.
    pub fn check_persistable(&self) -> Result<(), CodecError> {
        match self {
            ConfigValue::Float(f) if !f.is_finite() => Err(CodecError::NonFiniteFloat),
            ConfigValue::Array(items) => {
                let mut expected = None;
                for (index, item) in items.iter().enumerate() {
                    item.check_persistable()?;
                    let found = item.persisted_kind();
                    match expected {
                        None => expected = Some(found),
                        Some(kind) if kind != found => {
                            return Err(CodecError::HeterogeneousArray {
                                expected: kind,
                                found,
                                index,
                            });
                        }
                        Some(_) => {}
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::String(s) => write!(f, "{s:?}"),
            ConfigValue::Enum(e) => write!(f, "{}", e.name),
            ConfigValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(value)
    }
}

// ── Serde ─────────────────────────────────────────────────────────────────────

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Int(i) => serializer.serialize_i64(*i),
            ConfigValue::Float(x) => serializer.serialize_f64(*x),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Enum(e) => serializer.serialize_str(e.name),
            ConfigValue::Array(items) => items.serialize(serializer),
        }
    }
}

/// Mirror of [`ConfigValue`] as it appears in a document.
///
/// Variant order matters for `untagged`: integers must be tried before floats
/// so that `5` stays an `Int` while `5.0` becomes a `Float`.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<DocumentValue>),
}

impl From<DocumentValue> for ConfigValue {
    fn from(value: DocumentValue) -> Self {
        match value {
            DocumentValue::Bool(b) => ConfigValue::Bool(b),
            DocumentValue::Int(i) => ConfigValue::Int(i),
            DocumentValue::Float(x) => ConfigValue::Float(x),
            DocumentValue::String(s) => ConfigValue::String(s),
            DocumentValue::Array(items) => {
                ConfigValue::Array(items.into_iter().map(ConfigValue::from).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DocumentValue::deserialize(deserializer).map(ConfigValue::from)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(name: &'static str, ordinal: usize) -> ConfigValue {
        ConfigValue::Enum(CachedEnum {
            type_name: "Mode",
            name,
            ordinal,
        })
    }

    #[test]
    fn test_same_persisted_treats_cached_enum_as_its_name() {
        assert!(cached("FAST", 1).same_persisted(&ConfigValue::from("FAST")));
        assert!(ConfigValue::from("FAST").same_persisted(&cached("FAST", 1)));
        assert!(!cached("FAST", 1).same_persisted(&ConfigValue::from("SLOW")));
    }

    #[test]
    fn test_same_persisted_compares_arrays_element_wise() {
        // Arrange
        let a = ConfigValue::Array(vec![ConfigValue::Int(1), ConfigValue::Int(2)]);
        let b = ConfigValue::Array(vec![ConfigValue::Int(1), ConfigValue::Int(2)]);
        let shorter = ConfigValue::Array(vec![ConfigValue::Int(1)]);

        // Act / Assert
        assert!(a.same_persisted(&b));
        assert!(!a.same_persisted(&shorter));
    }

    #[test]
    fn test_same_persisted_distinguishes_int_from_float() {
        assert!(!ConfigValue::Int(5).same_persisted(&ConfigValue::Float(5.0)));
    }

    #[test]
    fn test_same_persisted_distinguishes_signed_zero() {
        // 0.0 and -0.0 are written differently, so they are not a no-op.
        assert!(!ConfigValue::Float(0.0).same_persisted(&ConfigValue::Float(-0.0)));
    }

    #[test]
    fn test_check_persistable_rejects_nan() {
        let result = ConfigValue::Float(f64::NAN).check_persistable();
        assert_eq!(result, Err(CodecError::NonFiniteFloat));
    }

    #[test]
    fn test_check_persistable_rejects_mixed_array() {
        // Arrange
        let mixed = ConfigValue::Array(vec![ConfigValue::Int(1), ConfigValue::from("two")]);

        // Act
        let result = mixed.check_persistable();

        // Assert
        assert_eq!(
            result,
            Err(CodecError::HeterogeneousArray {
                expected: ValueKind::Int,
                found: ValueKind::String,
                index: 1,
            })
        );
    }

    #[test]
    fn test_check_persistable_accepts_strings_mixed_with_cached_enums() {
        let list = ConfigValue::Array(vec![ConfigValue::from("FAST"), cached("SLOW", 0)]);
        assert!(list.check_persistable().is_ok());
    }

    #[test]
    fn test_deserialize_keeps_integers_and_floats_apart() {
        // Arrange
        let json = r#"[5, 5.0, true, "x"]"#;

        // Act
        let value: ConfigValue = serde_json::from_str(json).expect("deserialize");

        // Assert
        assert_eq!(
            value,
            ConfigValue::Array(vec![
                ConfigValue::Int(5),
                ConfigValue::Float(5.0),
                ConfigValue::Bool(true),
                ConfigValue::from("x"),
            ])
        );
    }

    #[test]
    fn test_serialize_writes_cached_enum_as_name() {
        let json = serde_json::to_string(&cached("FAST", 1)).expect("serialize");
        assert_eq!(json, r#""FAST""#);
    }

    #[test]
    fn test_display_renders_arrays() {
        let value = ConfigValue::Array(vec![ConfigValue::Int(1), ConfigValue::from("a")]);
        assert_eq!(value.to_string(), r#"[1, "a"]"#);
    }
}
