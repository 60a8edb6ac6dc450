//! Shared types, error model, and configuration for TutorForge.
//!
//! This crate is the foundation depended on by all other TutorForge crates.
//! It provides:
//! - [`TutorForgeError`] — the unified error type
//! - Domain types ([`Outline`], [`SectionSpec`], [`CrawledPage`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`LlmConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, LlmConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, TutorForgeError};
pub use types::{CrawledPage, Outline, SectionSpec};
