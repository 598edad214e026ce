//! Configuration module for Catalog-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use catalog_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("catalog.toml")).unwrap();
//! println!("Auth probe timeout: {}s", config.client.auth_probe_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, CrawlConfig, CredentialEntry};

// Re-export parser functions
pub use parser::{load_config, parse_config};

// Re-export validation for settings overridden after loading
pub use validation::validate;
