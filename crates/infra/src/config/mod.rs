//! Configuration loading
//!
//! Builds an [`agnost_domain::AnalyticsConfig`] from environment variables
//! and/or a JSON or TOML file.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    apply_env_overrides, load, load_from_env, load_from_file, load_org_id, probe_config_paths,
};
