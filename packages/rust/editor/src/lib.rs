//! Natural-language editing of print templates.
//!
//! This crate provides:
//! - [`editor`]: the validate, prompt, generate, clean-up pipeline ([`TemplateEditor`])
//! - [`chat`]: the [`ChatCompletion`] seam and its OpenAI-compatible client
//! - [`rules`]: the versioned rule book and field catalog behind the system prompt
//! - [`layout`]: column-width rescaling for table edits
//! - [`naming`], [`response`], [`prompt`], [`debug`]: supporting pieces

pub mod chat;
pub mod debug;
pub mod editor;
pub mod layout;
pub mod naming;
pub mod prompt;
pub mod response;
pub mod rules;

pub use chat::{ChatCompletion, ChatMessage, ChatRequest, ChatResponse, OpenAiChatClient, Role, StaticChat};
pub use debug::DebugArtifacts;
pub use editor::TemplateEditor;
pub use naming::{
    ALLOWED_EXTENSIONS, check_upload_extension, content_disposition, content_type_for,
    modified_filename,
};
pub use response::{check_truncation, extract_document};
pub use rules::{FieldCatalog, RuleBook, render_system_prompt};
