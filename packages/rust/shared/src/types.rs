//! Core domain types shared by the fetcher, editor, and apps.

use serde::{Deserialize, Serialize};

/// File name used when the caller does not provide one.
pub const DEFAULT_SOURCE_FILENAME: &str = "template.xml";

// ---------------------------------------------------------------------------
// Edit request / result
// ---------------------------------------------------------------------------

/// One natural-language edit against one template.
#[derive(Clone, Default)]
pub struct EditRequest {
    /// Full template text.
    pub document_content: String,
    /// What the caller wants changed.
    pub instruction: String,
    /// Per-request API key. Falls back to the configured default.
    pub credential: Option<String>,
    /// Name of the uploaded file, if any.
    pub source_filename: Option<String>,
}

impl EditRequest {
    pub fn new(document_content: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            document_content: document_content.into(),
            instruction: instruction.into(),
            credential: None,
            source_filename: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_source_filename(mut self, filename: Option<String>) -> Self {
        self.source_filename = filename;
        self
    }
}

impl std::fmt::Debug for EditRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditRequest")
            .field("document_len", &self.document_content.len())
            .field("instruction", &self.instruction)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("source_filename", &self.source_filename)
            .finish()
    }
}

/// Token accounting reported by the text-generation collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_units: u64,
    pub completion_units: u64,
    pub total_units: u64,
}

impl Usage {
    /// Build a usage record; the total is always derived from its parts.
    pub fn new(prompt_units: u64, completion_units: u64) -> Self {
        Self {
            prompt_units,
            completion_units,
            total_units: prompt_units + completion_units,
        }
    }
}

/// Raised (as a log event, not an error) when the rewritten document is
/// suspiciously short compared to its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TruncationWarning {
    pub input_len: usize,
    pub output_len: usize,
}

/// Outcome of a successful edit.
#[derive(Debug, Clone)]
pub struct EditResult {
    /// The complete rewritten document, never a fragment.
    pub content: String,
    pub usage: Usage,
    /// Attachment name derived from the source file name.
    pub output_filename: String,
    pub truncation: Option<TruncationWarning>,
}

// ---------------------------------------------------------------------------
// Fetch catalog / report
// ---------------------------------------------------------------------------

/// A single downloadable template; the name doubles as the output file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCatalogEntry {
    pub name: String,
}

impl FetchCatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub name: String,
    pub succeeded: bool,
    /// Failure reason, for logs.
    pub error: Option<String>,
}

/// Aggregated download report. `failed` preserves catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub succeeded: usize,
    pub failed: Vec<String>,
}

impl FetchReport {
    /// Fold per-entry outcomes (already in catalog order) into a report.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a FetchOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            if outcome.succeeded {
                report.succeeded += 1;
            } else {
                report.failed.push(outcome.name.clone());
            }
        }
        report
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_total_is_derived() {
        let usage = Usage::new(1200, 340);
        assert_eq!(usage.total_units, 1540);
        assert_eq!(Usage::default().total_units, 0);
    }

    #[test]
    fn edit_request_debug_hides_credential() {
        let req = EditRequest::new("<fo:root/>", "add a column")
            .with_credential(Some("sk-live-abc".into()));
        let rendered = format!("{req:?}");
        assert!(!rendered.contains("sk-live-abc"));
        assert!(rendered.contains("add a column"));
    }

    #[test]
    fn report_keeps_failure_order() {
        let outcomes = vec![
            FetchOutcome { name: "c.vm".into(), succeeded: false, error: None },
            FetchOutcome { name: "a.vm".into(), succeeded: true, error: None },
            FetchOutcome { name: "b.vm".into(), succeeded: false, error: Some("HTTP 404".into()) },
        ];
        let report = FetchReport::from_outcomes(&outcomes);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, vec!["c.vm".to_string(), "b.vm".to_string()]);
        assert_eq!(report.attempted(), 3);
    }
}
