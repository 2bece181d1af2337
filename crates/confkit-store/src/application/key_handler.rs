//! KeyHandler: the typed facade over one configuration key.
//!
//! # What a handler does (for beginners)
//!
//! The store only knows untyped [`ConfigValue`]s.  A `KeyHandler<T>` pins one
//! key to one Rust type `T` and adds the policy around it:
//!
//! - **Default resolution** – the descriptor's default, or the type's fallback
//!   (`false`, `0`, `0.0`, `""`, the first enum constant, an empty array).
//! - **Validation** – declared constraints are checked before any write
//!   reaches the store, so a rejected value never touches it.
//! - **Notification** – successful writes and rejections are reported to the
//!   handler's listeners and then to the owning storage handler's listeners.
//!
//! Handlers are created by
//! [`StorageHandler::register`](crate::application::StorageHandler::register),
//! which checks the declaration and initializes the handler once.
//!
//! The typed variants are the [`SettingType`] implementations: `bool`, `i8`,
//! `i32`, `i64`, `f32`, `f64`, `String`, enums declared with
//! [`config_enum!`](confkit_core::config_enum), and `Vec<T>` of any of them.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use confkit_core::{
    ConfigType, ConfigValue, Constraint, FloatRange, HandlerVariant, IntRange, KeyDescriptor,
    SchemaError, SettingType, ValidationError,
};

use crate::application::events::{ConfigEvent, ConfigEventSink, EventSender};
use crate::application::storage_handler::StorageCore;
use crate::error::ConfigError;

/// Typed access to one key of a store.
pub struct KeyHandler<T: SettingType> {
    key: String,
    description: Option<String>,
    default: T,
    constraints: Vec<Constraint>,
    storage: Arc<StorageCore>,
    events: EventSender,
    initialized: AtomicBool,
}

impl<T: SettingType> KeyHandler<T> {
    pub(crate) fn new(descriptor: KeyDescriptor<T>, storage: Arc<StorageCore>) -> Self {
        Self {
            key: descriptor.key().to_owned(),
            description: descriptor.description_text().map(str::to_owned),
            default: descriptor
                .default()
                .cloned()
                .unwrap_or_else(T::fallback_default),
            constraints: descriptor.constraints().to_vec(),
            storage,
            events: EventSender::new(),
            initialized: AtomicBool::new(false),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Checks the declaration and moves the handler to the initialized state.
    ///
    /// A second call is a no-op.  The first successful call emits
    /// [`ConfigEvent::HandlerInitialized`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the key is empty, a constraint is not
    /// allowed for `T` or has inconsistent bounds, or the default violates the
    /// constraints or cannot be persisted.
    pub fn init_handler(&self) -> Result<(), SchemaError> {
        if self.is_initialized() {
            return Ok(());
        }
        self.check_declaration()?;
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!(
                store = %self.storage.name(),
                key = %self.key,
                variant = %T::VARIANT,
                "key handler initialized"
            );
            self.emit(ConfigEvent::HandlerInitialized {
                key: self.key.clone(),
                variant: T::VARIANT,
            });
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn check_declaration(&self) -> Result<(), SchemaError> {
        if self.key.is_empty() {
            return Err(SchemaError::EmptyKey);
        }
        for constraint in &self.constraints {
            if !T::allowed_constraints().contains(&constraint.kind()) {
                return Err(SchemaError::ConstraintNotAllowed {
                    key: self.key.clone(),
                    constraint: constraint.kind(),
                    variant: T::VARIANT,
                });
            }
            if let Some(reason) = constraint.bounds_problem() {
                return Err(SchemaError::InvalidBounds {
                    key: self.key.clone(),
                    reason,
                });
            }
        }
        self.validate_value(&self.default)
            .map_err(|source| SchemaError::DefaultRejected {
                key: self.key.clone(),
                source,
            })?;
        self.default
            .to_value()
            .check_persistable()
            .map_err(|source| SchemaError::DefaultNotPersistable {
                key: self.key.clone(),
                source,
            })
    }

    // ── Values ────────────────────────────────────────────────────────────

    /// Reads the current value, falling back to the default.
    pub fn get_value(&self) -> T {
        self.storage.store().get(&self.key, self.default.clone())
    }

    /// Validates and stores `value`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Validation`] if a constraint rejects the value; the
    ///   store is not touched and [`ConfigEvent::ValidationFailed`] is emitted.
    /// - [`ConfigError::Store`] if the store refuses the write.
    pub fn set_value(&self, value: T) -> Result<(), ConfigError> {
        if let Err(error) = self.validate_value(&value) {
            debug!(key = %self.key, error = %error, "rejected configuration value");
            self.emit(ConfigEvent::ValidationFailed {
                key: self.key.clone(),
                variant: T::VARIANT,
                rejected: value.to_value(),
                error: error.clone(),
            });
            return Err(ConfigError::Validation {
                key: self.key.clone(),
                source: error,
            });
        }

        let old = self.peek_value();
        let new = value.to_value();
        self.storage.put_primitive(&self.key, value)?;
        self.emit(ConfigEvent::ValueUpdated {
            key: self.key.clone(),
            variant: T::VARIANT,
            old: old.to_value(),
            new,
        });
        Ok(())
    }

    /// Checks `value` against every declared constraint.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate_value(&self, value: &T) -> Result<(), ValidationError> {
        self.constraints
            .iter()
            .try_for_each(|constraint| value.validate(constraint))
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Returns `true` when the current value equals the default.
    pub fn is_default(&self) -> bool {
        self.peek_value() == self.default
    }

    /// Stores the default value.
    ///
    /// # Errors
    ///
    /// See [`KeyHandler::set_value`].
    pub fn reset_to_default(&self) -> Result<(), ConfigError> {
        self.set_value(self.default.clone())
    }

    /// Current value without the auto-populate side effect.
    fn peek_value(&self) -> T {
        self.storage
            .store()
            .get_raw(&self.key)
            .and_then(|raw| T::from_value(&raw).ok())
            .unwrap_or_else(|| self.default.clone())
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn variant(&self) -> HandlerVariant {
        T::VARIANT
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The declared integer range, if any.
    pub fn int_range(&self) -> Option<IntRange> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::IntRange(range) => Some(*range),
            Constraint::FloatRange(_) => None,
        })
    }

    /// The declared float range, if any.
    pub fn float_range(&self) -> Option<FloatRange> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::FloatRange(range) => Some(*range),
            Constraint::IntRange(_) => None,
        })
    }

    /// Increment a UI spinner should use, taken from the declared range.
    pub fn spinner_step(&self) -> Option<f64> {
        self.int_range()
            .map(|r| r.step as f64)
            .or_else(|| self.float_range().map(|r| r.step))
    }

    // ── Listeners ─────────────────────────────────────────────────────────

    pub fn add_listener(&self, listener: Arc<dyn ConfigEventSink>) {
        self.events.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ConfigEventSink>) -> bool {
        self.events.remove_listener(listener)
    }

    fn emit(&self, event: ConfigEvent) {
        self.events.fire(&event);
        self.storage.events().fire(&event);
    }
}

impl<T: SettingType> fmt::Debug for KeyHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandler")
            .field("key", &self.key)
            .field("variant", &T::VARIANT)
            .field("default", &self.default)
            .field("constraints", &self.constraints)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

// ── Untyped view ──────────────────────────────────────────────────────────────

/// Object-safe view of a [`KeyHandler`] of any type.
///
/// Lets the storage handler keep handlers of different types in one registry
/// and lets generic collaborators (a settings table, an import tool) work
/// with raw values.
pub trait AnyKeyHandler: Send + Sync {
    fn key(&self) -> &str;

    fn variant(&self) -> HandlerVariant;

    /// Name of the handler's Rust-side type, e.g. `"integer"`.
    fn type_name(&self) -> &'static str;

    fn description(&self) -> Option<&str>;

    /// Current value in its persisted form.
    fn get_raw(&self) -> ConfigValue;

    /// Default value in its persisted form.
    fn default_raw(&self) -> ConfigValue;

    /// Converts `value` to the handler's type, then validates and stores it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Decode`] when the value does not convert, otherwise as
    /// [`KeyHandler::set_value`].
    fn set_raw(&self, value: &ConfigValue) -> Result<(), ConfigError>;

    /// # Errors
    ///
    /// See [`KeyHandler::set_value`].
    fn reset_to_default(&self) -> Result<(), ConfigError>;

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: SettingType> AnyKeyHandler for KeyHandler<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn variant(&self) -> HandlerVariant {
        T::VARIANT
    }

    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn get_raw(&self) -> ConfigValue {
        self.get_value().to_value()
    }

    fn default_raw(&self) -> ConfigValue {
        self.default.to_value()
    }

    fn set_raw(&self, value: &ConfigValue) -> Result<(), ConfigError> {
        let typed = T::from_value(value).map_err(|source| ConfigError::Decode {
            key: self.key.clone(),
            source,
        })?;
        self.set_value(typed)
    }

    fn reset_to_default(&self) -> Result<(), ConfigError> {
        KeyHandler::reset_to_default(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::MockConfigEventSink;
    use crate::infrastructure::medium::MemoryMedium;
    use crate::infrastructure::storage::{ConfigStore, StoreLocation};
    use confkit_core::ConstraintKind;

    fn core() -> Arc<StorageCore> {
        let store = ConfigStore::builder(StoreLocation::Named("handlers".to_string()))
            .medium(MemoryMedium::new())
            .open()
            .expect("open");
        Arc::new(StorageCore::new("handlers", Arc::new(store)))
    }

    fn retries(core: &Arc<StorageCore>) -> KeyHandler<i32> {
        let handler = KeyHandler::new(
            KeyDescriptor::new("retries").default_value(3).int_range(0, 5),
            Arc::clone(core),
        );
        handler.init_handler().expect("valid declaration");
        handler
    }

    #[test]
    fn test_get_value_returns_default_and_populates() {
        // Arrange
        let core = core();
        let handler = retries(&core);

        // Act
        let value = handler.get_value();

        // Assert
        assert_eq!(value, 3);
        assert_eq!(core.store().get_raw("retries"), Some(ConfigValue::Int(3)));
    }

    #[test]
    fn test_rejected_value_leaves_store_untouched() {
        // Arrange
        let core = core();
        let handler = retries(&core);
        handler.get_value();
        let mark = core.store().set_mark();

        // Act
        let result = handler.set_value(10);

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::Validation {
                source: ValidationError::AboveMaximum { .. },
                ..
            })
        ));
        assert_eq!(handler.get_value(), 3);
        assert_eq!(core.store().set_mark(), mark);
    }

    #[test]
    fn test_accepted_value_is_stored() {
        let core = core();
        let handler = retries(&core);
        handler.set_value(4).expect("within range");
        assert_eq!(handler.get_value(), 4);
        assert!(!handler.is_default());
    }

    #[test]
    fn test_set_value_notifies_listener_with_old_and_new() {
        // Arrange
        let core = core();
        let handler = retries(&core);
        let mut sink = MockConfigEventSink::new();
        sink.expect_on_config_event()
            .withf(|e| {
                *e == ConfigEvent::ValueUpdated {
                    key: "retries".to_string(),
                    variant: HandlerVariant::Integer,
                    old: ConfigValue::Int(3),
                    new: ConfigValue::Int(5),
                }
            })
            .times(1)
            .return_const(());
        handler.add_listener(Arc::new(sink));

        // Act
        handler.set_value(5).expect("set");

        // Assert – verified on drop
        assert_eq!(handler.get_value(), 5);
    }

    #[test]
    fn test_validation_failure_is_reported_to_listener() {
        // Arrange
        let core = core();
        let handler = retries(&core);
        let mut sink = MockConfigEventSink::new();
        sink.expect_on_config_event()
            .withf(|e| matches!(e, ConfigEvent::ValidationFailed { rejected: ConfigValue::Int(-1), .. }))
            .times(1)
            .return_const(());
        handler.add_listener(Arc::new(sink));

        // Act
        let result = handler.set_value(-1);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_default_uses_type_fallback() {
        let handler = KeyHandler::<String>::new(KeyDescriptor::new("title"), core());
        assert_eq!(handler.default_value(), "");
    }

    #[test]
    fn test_float_constraint_on_integer_key_is_a_schema_error() {
        // Arrange
        let handler = KeyHandler::<i32>::new(
            KeyDescriptor::new("count").float_range(0.0, 1.0),
            core(),
        );

        // Act
        let result = handler.init_handler();

        // Assert
        assert_eq!(
            result,
            Err(SchemaError::ConstraintNotAllowed {
                key: "count".to_string(),
                constraint: ConstraintKind::FloatRange,
                variant: HandlerVariant::Integer,
            })
        );
        assert!(!handler.is_initialized());
    }

    #[test]
    fn test_default_outside_range_is_a_schema_error() {
        let handler = KeyHandler::<i64>::new(
            KeyDescriptor::new("limit").default_value(100).int_range(0, 10),
            core(),
        );
        assert!(matches!(
            handler.init_handler(),
            Err(SchemaError::DefaultRejected { .. })
        ));
    }

    #[test]
    fn test_non_finite_default_is_a_schema_error() {
        let handler = KeyHandler::<f64>::new(
            KeyDescriptor::new("ratio").default_value(f64::INFINITY),
            core(),
        );
        assert!(matches!(
            handler.init_handler(),
            Err(SchemaError::DefaultNotPersistable { .. })
        ));
    }

    #[test]
    fn test_second_init_is_a_no_op() {
        // Arrange
        let core = core();
        let handler = retries(&core);
        let mut sink = MockConfigEventSink::new();
        sink.expect_on_config_event().times(0);
        handler.add_listener(Arc::new(sink));

        // Act
        let again = handler.init_handler();

        // Assert
        assert!(again.is_ok());
        assert!(handler.is_initialized());
    }

    #[test]
    fn test_array_elements_are_validated() {
        // Arrange
        let handler = KeyHandler::<Vec<i32>>::new(
            KeyDescriptor::new("ports").int_range(1, 1024),
            core(),
        );
        handler.init_handler().expect("valid");

        // Act
        let result = handler.validate_value(&vec![80, 0, 443]);

        // Assert
        assert!(matches!(
            result,
            Err(ValidationError::Element { index: 1, .. })
        ));
    }

    #[test]
    fn test_spinner_step_comes_from_range() {
        let handler = KeyHandler::<f32>::new(
            KeyDescriptor::new("gain").float_range_with_step(0.0, 2.0, 0.25),
            core(),
        );
        assert_eq!(handler.spinner_step(), Some(0.25));
        assert!(handler.int_range().is_none());
    }

    #[test]
    fn test_set_raw_rejects_unconvertible_value() {
        let core = core();
        let handler = retries(&core);
        let result = AnyKeyHandler::set_raw(&handler, &ConfigValue::Bool(true));
        assert!(matches!(result, Err(ConfigError::Decode { .. })));
    }

    #[test]
    fn test_reset_to_default_restores_default() {
        let core = core();
        let handler = retries(&core);
        handler.set_value(1).expect("set");
        handler.reset_to_default().expect("reset");
        assert!(handler.is_default());
    }
}
