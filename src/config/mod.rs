//! Configuration module for Edge-Warmer
//!
//! This module loads the TOML configuration, fills secrets and proxy
//! endpoints from the environment, and validates the result. The loaded
//! [`Config`] is immutable and handed to every component explicitly.
//!
//! # Example
//!
//! ```no_run
//! use edge_warmer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("warmer.toml")).unwrap();
//! println!("Warming {} sites", config.sites.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ExportConfig, PurgeConfig, SiteConfig, SiteMode, WarmerConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, load_config, load_config_with_env, parse_config, ENV_API_TOKEN,
    ENV_WEBHOOK_URL, ENV_ZONE_ID,
};
