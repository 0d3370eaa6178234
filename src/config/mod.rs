//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, all errors at once)
//!     → CustodianConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime mutation of
//!   chain tables or monitor tunables
//! - All fields have defaults to allow minimal configs
//! - Secrets (the custody master key) resolve from the environment first

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    ChainConfig, CustodianConfig, CustodyConfig, ObservabilityConfig, ServerConfig,
    WithdrawalConfig,
};
