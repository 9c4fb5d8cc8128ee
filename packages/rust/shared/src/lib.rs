//! Shared types, error model, and configuration for Templatesmith.
//!
//! This crate is the foundation depended on by all other Templatesmith crates.
//! It provides:
//! - [`TemplatesmithError`]: the unified error type
//! - Domain types ([`EditRequest`], [`EditResult`], [`FetchCatalogEntry`], [`FetchReport`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`EditorConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EditorConfig, EditorSettings, FetchConfig, FetcherSettings, ServerSettings,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, TemplatesmithError};
pub use types::{
    DEFAULT_SOURCE_FILENAME, EditRequest, EditResult, FetchCatalogEntry, FetchOutcome,
    FetchReport, TruncationWarning, Usage,
};
