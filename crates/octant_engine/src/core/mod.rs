//! # Core Engine Module
//!
//! Shared abstractions used by every other subsystem:
//!
//! - **Config**: serializable engine configuration (TOML / RON)
//! - **Error**: the crate-wide error type

pub mod config;
pub mod error;

pub use config::{Config, ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult};
