//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → CLI overrides applied in main
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - The client IP precedence table is not configurable

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, RecoveryConfig, ServiceConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
