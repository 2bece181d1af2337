//! Typed conversion to and from [`ConfigValue`].
//!
//! # Coercion table
//!
//! Reads accept a fixed set of stored shapes per declared type.  Anything
//! outside the table is a [`CodecError`]; there is no silent coercion between
//! unrelated types.
//!
//! | declared      | accepted stored shapes                         |
//! |---------------|------------------------------------------------|
//! | `bool`        | `Bool`                                         |
//! | `i8`          | `Int` (range checked)                          |
//! | `i32`         | `Int` (range checked), numeric `String`        |
//! | `i64`         | `Int`, numeric `String`                        |
//! | `f32`         | `Float` (narrowed)                             |
//! | `f64`         | `Float`                                        |
//! | `String`      | `String`, cached `Enum` (its name)             |
//! | enum          | `String` (case-sensitive name), cached `Enum`  |
//! | `Vec<T>`      | `Array` whose elements all decode as `T`       |

use std::fmt;

use crate::codec::CodecError;
use crate::value::config_value::{CachedEnum, ConfigValue, ValueKind};

/// A Rust type that can be stored as a configuration value.
pub trait ConfigType: Sized + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The shape [`ConfigType::to_value`] produces.
    const KIND: ValueKind;

    /// Human-readable type name used in error messages.
    fn type_name() -> &'static str;

    /// Converts to the persisted representation.
    fn to_value(&self) -> ConfigValue;

    /// Converts to the representation kept in memory when the enum cache is on.
    ///
    /// Only enums differ from [`ConfigType::to_value`].
    fn to_cached_value(&self) -> ConfigValue {
        self.to_value()
    }

    /// Converts from a stored value following the coercion table.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the stored shape is not accepted for this
    /// type or its payload cannot be represented.
    fn from_value(value: &ConfigValue) -> Result<Self, CodecError>;
}

fn mismatch(expected: ValueKind, found: &ConfigValue) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

impl ConfigType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn type_name() -> &'static str {
        "boolean"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Bool(*self)
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            other => Err(mismatch(ValueKind::Bool, other)),
        }
    }
}

impl ConfigType for i8 {
    const KIND: ValueKind = ValueKind::Int;

    fn type_name() -> &'static str {
        "byte"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Int(i64::from(*self))
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            ConfigValue::Int(i) => i8::try_from(*i).map_err(|_| CodecError::OutOfRange {
                value: i.to_string(),
                target: "byte",
            }),
            other => Err(mismatch(ValueKind::Int, other)),
        }
    }
}

impl ConfigType for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn type_name() -> &'static str {
        "integer"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Int(i64::from(*self))
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            ConfigValue::Int(i) => i32::try_from(*i).map_err(|_| CodecError::OutOfRange {
                value: i.to_string(),
                target: "integer",
            }),
            ConfigValue::String(s) => s.parse().map_err(|_| CodecError::InvalidNumber {
                text: s.clone(),
                target: "integer",
            }),
            other => Err(mismatch(ValueKind::Int, other)),
        }
    }
}

impl ConfigType for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn type_name() -> &'static str {
        "long"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Int(*self)
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            ConfigValue::Int(i) => Ok(*i),
            ConfigValue::String(s) => s.parse().map_err(|_| CodecError::InvalidNumber {
                text: s.clone(),
                target: "long",
            }),
            other => Err(mismatch(ValueKind::Int, other)),
        }
    }
}

impl ConfigType for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn type_name() -> &'static str {
        "float"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Float(f64::from(*self))
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            // Narrowing: a value written from an f32 comes back bit-identical.
            ConfigValue::Float(x) => Ok(*x as f32),
            other => Err(mismatch(ValueKind::Float, other)),
        }
    }
}

impl ConfigType for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn type_name() -> &'static str {
        "double"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Float(*self)
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            ConfigValue::Float(x) => Ok(*x),
            other => Err(mismatch(ValueKind::Float, other)),
        }
    }
}

impl ConfigType for String {
    const KIND: ValueKind = ValueKind::String;

    fn type_name() -> &'static str {
        "string"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::String(self.clone())
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            // A cached enum persists as its name, so it reads as that string.
            ConfigValue::String(_) | ConfigValue::Enum(_) => match value.as_str() {
                Some(text) => Ok(text.to_owned()),
                None => Err(mismatch(ValueKind::String, value)),
            },
            other => Err(mismatch(ValueKind::String, other)),
        }
    }
}

impl<T: ConfigType> ConfigType for Vec<T> {
    const KIND: ValueKind = ValueKind::Array;

    fn type_name() -> &'static str {
        "array"
    }

    fn to_value(&self) -> ConfigValue {
        ConfigValue::Array(self.iter().map(ConfigType::to_value).collect())
    }

    fn to_cached_value(&self) -> ConfigValue {
        ConfigValue::Array(self.iter().map(ConfigType::to_cached_value).collect())
    }

    fn from_value(value: &ConfigValue) -> Result<Self, CodecError> {
        match value {
            ConfigValue::Array(items) => items.iter().map(T::from_value).collect(),
            other => Err(mismatch(ValueKind::Array, other)),
        }
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// A fieldless enum whose constants are persisted by name.
///
/// Implement it with the [`config_enum!`](crate::config_enum) macro, which also
/// wires up [`ConfigType`] and [`crate::domain::SettingType`].
pub trait ConfigEnum: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Module-qualified name of the enum type, used to validate cached constants.
    const TYPE_NAME: &'static str;

    /// Every constant, in declaration order.
    const VARIANTS: &'static [Self];

    /// Symbolic name of this constant.
    fn name(&self) -> &'static str;

    /// Position of this constant in [`ConfigEnum::VARIANTS`].
    fn ordinal(&self) -> usize {
        Self::VARIANTS.iter().position(|v| v == self).unwrap_or(0)
    }

    /// Case-sensitive lookup by symbolic name.
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.name() == name)
    }
}

/// Persisted form of an enum constant: its name.
pub fn enum_to_value<E: ConfigEnum>(value: &E) -> ConfigValue {
    ConfigValue::String(value.name().to_owned())
}

/// In-memory form of an enum constant when the enum cache is on.
pub fn enum_to_cached_value<E: ConfigEnum>(value: &E) -> ConfigValue {
    ConfigValue::Enum(CachedEnum {
        type_name: E::TYPE_NAME,
        name: value.name(),
        ordinal: value.ordinal(),
    })
}

/// Resolves an enum constant from a stored name or cached constant.
///
/// # Errors
///
/// Returns [`CodecError::UnknownEnumName`] when the name is not declared by
/// `E` and [`CodecError::TypeMismatch`] for non-textual values.
pub fn enum_from_value<E: ConfigEnum>(value: &ConfigValue) -> Result<E, CodecError> {
    let unknown = |name: &str| CodecError::UnknownEnumName {
        type_name: E::TYPE_NAME,
        name: name.to_owned(),
    };
    match value {
        // The ordinal is only a shortcut; the name decides.
        ConfigValue::Enum(cached) => E::VARIANTS
            .get(cached.ordinal)
            .copied()
            .filter(|v| cached.type_name == E::TYPE_NAME && v.name() == cached.name)
            .or_else(|| E::from_name(cached.name))
            .ok_or_else(|| unknown(cached.name)),
        ConfigValue::String(name) => E::from_name(name).ok_or_else(|| unknown(name)),
        other => Err(mismatch(ValueKind::Enum, other)),
    }
}

/// Declares a fieldless enum usable as a configuration value.
///
/// The enum gets `Debug`, `Clone`, `Copy`, `PartialEq` and `Eq`, plus
/// [`ConfigEnum`], [`ConfigType`] and [`SettingType`](crate::domain::SettingType)
/// implementations.  The first constant is the fallback default.
///
/// ```rust
/// use confkit_core::{config_enum, ConfigEnum};
///
/// config_enum! {
///     pub enum Theme {
///         Light,
///         Dark,
///     }
/// }
///
/// assert_eq!(Theme::from_name("Dark"), Some(Theme::Dark));
/// assert_eq!(Theme::Light.name(), "Light");
/// ```
#[macro_export]
macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident $(, $rest:ident)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $first,
            $($rest,)*
        }

        impl $crate::value::ConfigEnum for $name {
            const TYPE_NAME: &'static str = concat!(module_path!(), "::", stringify!($name));
            const VARIANTS: &'static [Self] = &[$name::$first, $($name::$rest,)*];

            fn name(&self) -> &'static str {
                match self {
                    $name::$first => stringify!($first),
                    $($name::$rest => stringify!($rest),)*
                }
            }
        }

        impl $crate::value::ConfigType for $name {
            const KIND: $crate::value::ValueKind = $crate::value::ValueKind::Enum;

            fn type_name() -> &'static str {
                stringify!($name)
            }

            fn to_value(&self) -> $crate::value::ConfigValue {
                $crate::value::enum_to_value(self)
            }

            fn to_cached_value(&self) -> $crate::value::ConfigValue {
                $crate::value::enum_to_cached_value(self)
            }

            fn from_value(
                value: &$crate::value::ConfigValue,
            ) -> ::std::result::Result<Self, $crate::codec::CodecError> {
                $crate::value::enum_from_value(value)
            }
        }

        impl $crate::domain::SettingType for $name {
            const VARIANT: $crate::domain::HandlerVariant = $crate::domain::HandlerVariant::Enum;

            fn fallback_default() -> Self {
                $name::$first
            }
        }
    };
}

// ── Tests ─────────────────────────────────────────────────────────────────────
