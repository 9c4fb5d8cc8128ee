//! Single-shot template edit: validate, prompt, generate, clean up.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use templatesmith_shared::{EditRequest, EditResult, EditorConfig, Result, TemplatesmithError};

use crate::chat::{ChatCompletion, ChatRequest, OpenAiChatClient};
use crate::debug::DebugArtifacts;
use crate::naming::{effective_filename, modified_filename};
use crate::prompt::build_messages;
use crate::response::{check_truncation, extract_document};
use crate::rules::{FieldCatalog, RuleBook, render_system_prompt};

/// Applies natural-language edits to templates.
///
/// Stateless across requests; share one instance behind an `Arc`.
pub struct TemplateEditor {
    config: EditorConfig,
    chat: Arc<dyn ChatCompletion>,
    rules_version: String,
    system_prompt: String,
    fields: FieldCatalog,
    artifacts: DebugArtifacts,
}

/// Request fields after validation.
struct ValidatedEdit<'a> {
    document: &'a str,
    instruction: &'a str,
    credential: &'a str,
    source_filename: String,
}

impl TemplateEditor {
    /// Build an editor backed by the OpenAI-compatible client, loading the
    /// rule book from `rules_path` when set.
    pub fn from_config(config: EditorConfig) -> Result<Self> {
        let chat = OpenAiChatClient::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let rules = match &config.rules_path {
            Some(path) => RuleBook::from_path(path)?,
            None => RuleBook::embedded()?,
        };
        let fields = FieldCatalog::embedded()?;
        let artifacts = DebugArtifacts::from_option(config.debug_dir.as_deref())?;

        Ok(Self::with_chat(config, Arc::new(chat), &rules, fields, artifacts))
    }

    /// Build an editor around any [`ChatCompletion`] implementation.
    pub fn with_chat(
        config: EditorConfig,
        chat: Arc<dyn ChatCompletion>,
        rules: &RuleBook,
        fields: FieldCatalog,
        artifacts: DebugArtifacts,
    ) -> Self {
        Self {
            config,
            chat,
            rules_version: rules.version.clone(),
            system_prompt: render_system_prompt(rules, &fields),
            fields,
            artifacts,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn rules_version(&self) -> &str {
        &self.rules_version
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one edit. Nothing leaves the process unless the document, the
    /// instruction and the effective credential are all non-blank.
    #[instrument(skip_all, fields(model = %self.config.model))]
    pub async fn apply_edit(&self, request: EditRequest) -> Result<EditResult> {
        let edit = self.validate(&request)?;
        let output_filename = modified_filename(&edit.source_filename);

        info!(
            source = %edit.source_filename,
            document_len = edit.document.chars().count(),
            instruction = edit.instruction,
            "applying template edit"
        );

        self.artifacts
            .save("input_template", ".xml", edit.document)
            .await;
        self.artifacts
            .save("prompt", ".txt", edit.instruction)
            .await;
        self.artifacts
            .save("system_prompt", ".txt", &self.system_prompt)
            .await;

        let chat_request = ChatRequest {
            model: self.config.model.clone(),
            messages: build_messages(&self.system_prompt, edit.instruction, edit.document),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = match self.chat.complete(&chat_request, edit.credential).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "template edit failed");
                self.artifacts
                    .save("modify_template_error", ".log", &format!("Error: {e}"))
                    .await;
                return Err(e);
            }
        };

        self.artifacts
            .save("raw_response", ".txt", &response.content)
            .await;

        let content = extract_document(&response.content);
        if content.len() != response.content.len() {
            self.artifacts
                .save("cleaned_response", ".xml", content)
                .await;
        }
        if content.trim().is_empty() {
            let err = TemplatesmithError::Upstream("completion contained no template".into());
            warn!(error = %err, "template edit failed");
            self.artifacts
                .save("modify_template_error", ".log", &format!("Error: {err}"))
                .await;
            return Err(err);
        }

        let unknown: Vec<String> = self
            .fields
            .unknown_references(content)
            .into_iter()
            .filter(|path| !edit.document.contains(path.as_str()))
            .collect();
        if !unknown.is_empty() {
            warn!(
                references = ?unknown,
                "edited template references fields outside the data catalog"
            );
        }

        let usage = response.usage;
        self.artifacts
            .save(
                "analysis",
                ".txt",
                &format!(
                    "Completion Tokens: {}\nPrompt Tokens: {}\nTotal Tokens: {}",
                    usage.completion_units, usage.prompt_units, usage.total_units
                ),
            )
            .await;

        let truncation = check_truncation(edit.document, content);
        match &truncation {
            Some(t) => warn!(
                input_len = t.input_len,
                output_len = t.output_len,
                "edited template is much shorter than the original"
            ),
            None => info!(
                output_len = content.chars().count(),
                prompt_tokens = usage.prompt_units,
                completion_tokens = usage.completion_units,
                total_tokens = usage.total_units,
                output = %output_filename,
                "template edit complete"
            ),
        }

        Ok(EditResult {
            content: content.to_string(),
            usage,
            output_filename,
            truncation,
        })
    }

    fn validate<'a>(&'a self, request: &'a EditRequest) -> Result<ValidatedEdit<'a>> {
        if request.document_content.trim().is_empty() {
            return Err(TemplatesmithError::validation("Template content is required"));
        }
        if request.instruction.trim().is_empty() {
            return Err(TemplatesmithError::validation("Prompt is required"));
        }

        let credential = request
            .credential
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self
                .config
                .default_credential
                .as_deref()
                .filter(|c| !c.trim().is_empty()))
            .ok_or_else(|| TemplatesmithError::validation("API key is required"))?;

        Ok(ValidatedEdit {
            document: &request.document_content,
            instruction: &request.instruction,
            credential: credential.trim(),
            source_filename: effective_filename(request.source_filename.as_deref()),
        })
    }
}

impl std::fmt::Debug for TemplateEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEditor")
            .field("config", &self.config)
            .field("rules_version", &self.rules_version)
            .field("debug_artifacts", &self.artifacts.is_enabled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Role, StaticChat};
    use crate::prompt::user_message;
    use templatesmith_shared::Usage;

    fn config(default_credential: Option<&str>) -> EditorConfig {
        EditorConfig {
            api_base_url: "http://127.0.0.1:9/v1".into(),
            model: "gpt-4o".into(),
            max_tokens: 8000,
            temperature: 0.1,
            request_timeout_secs: 5,
            default_credential: default_credential.map(String::from),
            debug_dir: None,
            rules_path: None,
        }
    }

    fn editor_with(chat: Arc<StaticChat>, default_credential: Option<&str>) -> TemplateEditor {
        TemplateEditor::with_chat(
            config(default_credential),
            chat,
            &RuleBook::embedded().unwrap(),
            FieldCatalog::embedded().unwrap(),
            DebugArtifacts::disabled(),
        )
    }

    const DOC: &str = "<fo:root>\n  <fo:block>Invoice</fo:block>\n</fo:root>";

    #[tokio::test]
    async fn fenced_reply_is_unwrapped() {
        let reply = format!("Sure!\n```xml\n{DOC}\n```\nDone.");
        let chat = Arc::new(StaticChat::replying(reply, Usage::new(1200, 300)));
        let editor = editor_with(chat.clone(), None);

        let result = editor
            .apply_edit(
                EditRequest::new(DOC, "bold the header")
                    .with_credential(Some("sk-test".into()))
                    .with_source_filename(Some("invoice.fo.vm".into())),
            )
            .await
            .unwrap();

        assert_eq!(result.content, DOC);
        assert_eq!(result.output_filename, "invoice_modified.fo.vm");
        assert_eq!(result.usage.total_units, 1500);
        assert!(result.truncation.is_none());
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn request_carries_rules_and_settings() {
        let chat = Arc::new(StaticChat::replying(DOC, Usage::new(10, 5)));
        let editor = editor_with(chat.clone(), Some("sk-default"));

        editor
            .apply_edit(EditRequest::new(DOC, "  add a GSTIN column  "))
            .await
            .unwrap();

        let sent = chat.last_request().unwrap();
        assert_eq!(sent.model, "gpt-4o");
        assert_eq!(sent.max_tokens, 8000);
        assert!((sent.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, Role::System);
        assert_eq!(sent.messages[0].content, editor.system_prompt());
        assert!(sent.messages[0].content.contains("AVAILABLE DATA FIELDS"));
        assert!(sent.messages[0].content.ends_with("Don't leave anything out."));
        assert_eq!(sent.messages[1].content, user_message("  add a GSTIN column  ", DOC));
    }

    #[tokio::test]
    async fn blank_fenced_reply_is_upstream_error() {
        for reply in ["```xml\n```", "Sorry, here:\n```xml\n\n```", "```xml\n   \n```"] {
            let chat = Arc::new(StaticChat::replying(reply, Usage::new(10, 0)));
            let editor = editor_with(chat.clone(), Some("sk-default"));

            let err = editor
                .apply_edit(EditRequest::new("<fo:root/>", "x"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, TemplatesmithError::Upstream(ref m) if m.contains("no template")),
                "{reply:?} gave {err}"
            );
            assert_eq!(chat.calls(), 1);
        }
    }

    #[tokio::test]
    async fn unknown_field_reference_does_not_fail_edit() {
        let edited = format!("{DOC}<fo:block>$data.vendorNickname</fo:block>");
        let chat = Arc::new(StaticChat::replying(edited.clone(), Usage::new(10, 5)));
        let editor = editor_with(chat, Some("sk-default"));

        let result = editor
            .apply_edit(EditRequest::new(DOC, "add a nickname"))
            .await
            .unwrap();
        assert_eq!(result.content, edited);
    }

    #[tokio::test]
    async fn unfenced_reply_is_verbatim_and_default_name_used() {
        let chat = Arc::new(StaticChat::replying(DOC, Usage::new(10, 5)));
        let editor = editor_with(chat, Some("sk-default"));

        let result = editor
            .apply_edit(EditRequest::new(DOC, "keep it"))
            .await
            .unwrap();

        assert_eq!(result.content, DOC);
        assert_eq!(result.output_filename, "template_modified.xml");
        assert_eq!(result.usage, Usage::new(10, 5));
    }

    #[tokio::test]
    async fn blank_fields_fail_before_any_call() {
        let chat = Arc::new(StaticChat::replying(DOC, Usage::default()));
        let editor = editor_with(chat.clone(), None);

        let cases = [
            EditRequest::new("", "x").with_credential(Some("sk".into())),
            EditRequest::new("  \n", "x").with_credential(Some("sk".into())),
            EditRequest::new(DOC, "").with_credential(Some("sk".into())),
            EditRequest::new(DOC, "x"),
            EditRequest::new(DOC, "x").with_credential(Some("   ".into())),
        ];
        for request in cases {
            let err = editor.apply_edit(request).await.unwrap_err();
            assert!(err.is_validation(), "{err}");
        }
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credential_message() {
        let editor = editor_with(Arc::new(StaticChat::failing()), None);
        let err = editor
            .apply_edit(EditRequest::new(DOC, "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "validation error: API key is required");
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let chat = Arc::new(StaticChat::failing());
        let editor = editor_with(chat.clone(), Some("sk-default"));

        let err = editor
            .apply_edit(EditRequest::new(DOC, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TemplatesmithError::Upstream(_)));
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn short_output_is_flagged_not_failed() {
        let chat = Arc::new(StaticChat::replying("```xml\n<fo:root/>\n```", Usage::new(50, 5)));
        let editor = editor_with(chat, Some("sk-default"));

        let document = format!("<fo:root>{}</fo:root>", "<fo:block/>".repeat(20));
        let result = editor
            .apply_edit(EditRequest::new(document.clone(), "drop everything"))
            .await
            .unwrap();

        assert_eq!(result.content, "<fo:root/>");
        let warning = result.truncation.unwrap();
        assert_eq!(warning.input_len, document.chars().count());
        assert_eq!(warning.output_len, 10);
    }

    #[tokio::test]
    async fn debug_artifacts_written_when_enabled() {
        let dir = std::env::temp_dir().join(format!("ts-editor-{}", uuid::Uuid::now_v7()));
        let chat = Arc::new(StaticChat::replying(format!("```xml\n{DOC}\n```"), Usage::new(3, 4)));
        let editor = TemplateEditor::with_chat(
            config(Some("sk-default")),
            chat,
            &RuleBook::embedded().unwrap(),
            FieldCatalog::embedded().unwrap(),
            DebugArtifacts::in_dir(&dir).unwrap(),
        );

        editor
            .apply_edit(EditRequest::new(DOC, "x"))
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        for prefix in [
            "input_template_",
            "prompt_",
            "system_prompt_",
            "raw_response_",
            "cleaned_response_",
            "analysis_",
        ] {
            assert!(names.iter().any(|n| n.starts_with(prefix)), "missing {prefix}");
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
