//! Per-type handler policy: which constraints a variant accepts, how it
//! validates, and what it falls back to without a declared default.

use std::fmt;

use crate::domain::constraint::{Constraint, ConstraintKind, ValidationError};
use crate::value::ConfigType;

/// The typed handler variant a setting type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerVariant {
    Boolean,
    Byte,
    Integer,
    Long,
    Float,
    Double,
    String,
    Enum,
    Array,
}

impl fmt::Display for HandlerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerVariant::Boolean => "boolean",
            HandlerVariant::Byte => "byte",
            HandlerVariant::Integer => "integer",
            HandlerVariant::Long => "long",
            HandlerVariant::Float => "float",
            HandlerVariant::Double => "double",
            HandlerVariant::String => "string",
            HandlerVariant::Enum => "enum",
            HandlerVariant::Array => "array",
        };
        f.write_str(name)
    }
}

const INT_CONSTRAINTS: &[ConstraintKind] = &[ConstraintKind::IntRange];
const FLOAT_CONSTRAINTS: &[ConstraintKind] = &[ConstraintKind::FloatRange];

/// A [`ConfigType`] that can back a key handler.
pub trait SettingType: ConfigType {
    /// The handler variant for this type.
    const VARIANT: HandlerVariant;

    /// Constraint kinds that may be declared on keys of this type.
    fn allowed_constraints() -> &'static [ConstraintKind] {
        &[]
    }

    /// Checks this value against one declared constraint.
    ///
    /// Only called with constraints whose kind is in
    /// [`SettingType::allowed_constraints`].
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] describing the violation.
    fn validate(&self, _constraint: &Constraint) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Default used when a descriptor declares none.
    fn fallback_default() -> Self;
}

impl SettingType for bool {
    const VARIANT: HandlerVariant = HandlerVariant::Boolean;

    fn fallback_default() -> Self {
        false
    }
}

impl SettingType for String {
    const VARIANT: HandlerVariant = HandlerVariant::String;

    fn fallback_default() -> Self {
        String::new()
    }
}

macro_rules! int_setting {
    ($ty:ty, $variant:ident) => {
        impl SettingType for $ty {
            const VARIANT: HandlerVariant = HandlerVariant::$variant;

            fn allowed_constraints() -> &'static [ConstraintKind] {
                INT_CONSTRAINTS
            }

            fn validate(&self, constraint: &Constraint) -> Result<(), ValidationError> {
                match constraint {
                    Constraint::IntRange(range) => range.check(i64::from(*self)),
                    Constraint::FloatRange(_) => Ok(()),
                }
            }

            fn fallback_default() -> Self {
                0
            }
        }
    };
}

int_setting!(i8, Byte);
int_setting!(i32, Integer);
int_setting!(i64, Long);

macro_rules! float_setting {
    ($ty:ty, $variant:ident) => {
        impl SettingType for $ty {
            const VARIANT: HandlerVariant = HandlerVariant::$variant;

            fn allowed_constraints() -> &'static [ConstraintKind] {
                FLOAT_CONSTRAINTS
            }

            fn validate(&self, constraint: &Constraint) -> Result<(), ValidationError> {
                match constraint {
                    Constraint::FloatRange(range) => range.check(f64::from(*self)),
                    Constraint::IntRange(_) => Ok(()),
                }
            }

            fn fallback_default() -> Self {
                0.0
            }
        }
    };
}

float_setting!(f32, Float);
float_setting!(f64, Double);

impl<T: SettingType> SettingType for Vec<T> {
    const VARIANT: HandlerVariant = HandlerVariant::Array;

    fn allowed_constraints() -> &'static [ConstraintKind] {
        T::allowed_constraints()
    }

    fn validate(&self, constraint: &Constraint) -> Result<(), ValidationError> {
        for (index, element) in self.iter().enumerate() {
            element
                .validate(constraint)
                .map_err(|source| ValidationError::Element {
                    index,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn fallback_default() -> Self {
        Vec::new()
    }
}
