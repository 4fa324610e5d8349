//! Facade, configuration and logging wiring for the storage engine.

/// Engine configuration loaded from TOML.
pub mod config;

/// Owner of the engine's singleton-like instances.
pub mod engine_environment;

/// Logging setup.
pub mod logging;

/// The storage manager facade.
pub mod storage_manager;
