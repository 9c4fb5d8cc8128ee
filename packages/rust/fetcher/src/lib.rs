//! Bulk template downloader.
//!
//! This crate provides:
//! - [`catalog`]: the fixed list of published template names
//! - [`engine`]: a bounded concurrent fetch-and-write loop with per-entry reporting

pub mod catalog;
pub mod engine;

pub use catalog::{TEMPLATE_NAMES, builtin_catalog};
pub use engine::{FetchProgress, SilentFetchProgress, TemplateFetcher};
