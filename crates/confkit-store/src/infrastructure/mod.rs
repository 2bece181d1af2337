//! Infrastructure layer for the configuration engine.
//!
//! Contains the pieces that touch the outside world: backing media (files or
//! memory), the store that persists to them, and the settings file.
//!
//! **Dependency rule**: this layer depends on `confkit_core` only.  The
//! `application` layer builds typed handlers on top of
//! [`storage::ConfigStore`]; nothing here imports `application`.

pub mod medium;
pub mod storage;
