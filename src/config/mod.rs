//! Service Configuration
//!
//! Loaded once at startup from TOML and shared read-only through
//! `Arc<AppConfig>` in the API state.
//!
//! ## Loading Order
//!
//! 1. `FEELRATE_CONFIG` environment variable (path to TOML file)
//! 2. `feelrate.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Environment overrides (`FEELRATE_SERVER_ADDR`, `PORT`, `FEELRATE_DATA_DIR`,
//! `FEELRATE_ADMIN_*`) and CLI flags are applied on top.

mod app_config;
pub mod validation;

pub use app_config::*;
