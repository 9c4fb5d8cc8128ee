//! Versioned rule book and field catalog.
//!
//! Both are plain TOML data. The defaults are compiled in; a rule book can be
//! replaced at startup through `editor.rules_path`. Rendering turns them into
//! the system message sent with every edit.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use templatesmith_shared::{Result, TemplatesmithError};

const DEFAULT_RULES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/rules/default.toml"));
const DEFAULT_FIELDS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/rules/fields.toml"));

/// Top-level fields rendered per line.
const FIELDS_PER_LINE: usize = 6;

/// `$data.a`, `$data.a.b`, `${data.a.b}` and `$!data.a`. A trailing `(`
/// marks the last segment as a method call.
static DATA_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$!?\{?data\.([A-Za-z_]\w*)(?:\.([A-Za-z_]\w*))?(\()?").expect("valid regex")
});

// ---------------------------------------------------------------------------
// RuleBook
// ---------------------------------------------------------------------------

/// A titled group of rules. Declaration order is rendering order.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSection {
    pub id: String,
    pub title: String,
}

/// One editing constraint.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub id: String,
    /// Id of the [`RuleSection`] this rule belongs to.
    pub section: String,
    pub text: String,
}

/// The full, versioned set of editing constraints.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleBook {
    pub version: String,
    pub preamble: String,
    /// Final instruction demanding the complete document back.
    pub closing: String,
    pub sections: Vec<RuleSection>,
    pub rules: Vec<Rule>,
}

impl RuleBook {
    /// The rule book compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_RULES)
    }

    /// Load a rule book from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TemplatesmithError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|e| {
            TemplatesmithError::parse(format!("rule book {}: {e}", path.display()))
        })
    }

    /// Parse and validate a rule book.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let book: Self = toml::from_str(content)
            .map_err(|e| TemplatesmithError::parse(format!("invalid rule book: {e}")))?;
        book.validate()?;
        Ok(book)
    }

    fn validate(&self) -> Result<()> {
        if self.closing.trim().is_empty() {
            return Err(TemplatesmithError::parse("rule book has no closing instruction"));
        }

        let section_ids: HashSet<&str> = self.sections.iter().map(|s| s.id.as_str()).collect();
        let mut rule_ids = HashSet::new();
        for rule in &self.rules {
            if !rule_ids.insert(rule.id.as_str()) {
                return Err(TemplatesmithError::parse(format!(
                    "duplicate rule id '{}'",
                    rule.id
                )));
            }
            if !section_ids.contains(rule.section.as_str()) {
                return Err(TemplatesmithError::parse(format!(
                    "rule '{}' references unknown section '{}'",
                    rule.id, rule.section
                )));
            }
        }
        Ok(())
    }

    /// Look up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Render the preamble and numbered rules, grouped by section.
    ///
    /// Numbering is continuous across sections.
    pub fn render(&self) -> String {
        let mut out = self.preamble.trim().to_string();
        let mut number = 0;

        for section in &self.sections {
            let mut rules = self.rules.iter().filter(|r| r.section == section.id).peekable();
            if rules.peek().is_none() {
                continue;
            }

            out.push_str("\n\n");
            out.push_str(&section.title);
            out.push(':');
            for rule in rules {
                number += 1;
                out.push('\n');
                out.push_str(&format!("{number}. {}", rule.text.trim()));
            }
        }

        out
    }
}

// ---------------------------------------------------------------------------
// FieldCatalog
// ---------------------------------------------------------------------------

/// A nested object exposed as `$data.<name>.<field>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectFields {
    pub name: String,
    pub fields: Vec<String>,
}

/// A list exposed as `$data.<name>[i].<field>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayFields {
    pub name: String,
    pub description: String,
    pub fields: Vec<String>,
}

/// Every variable a rewritten template is allowed to reference.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldCatalog {
    pub heading: String,
    pub intro: String,
    pub top_level: Vec<String>,
    #[serde(default)]
    pub objects: Vec<ObjectFields>,
    #[serde(default)]
    pub arrays: Vec<ArrayFields>,
}

impl FieldCatalog {
    /// The field catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_FIELDS)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TemplatesmithError::parse(format!("invalid field catalog: {e}")))
    }

    /// Whether a dotted path such as `fromAddress.city` or `itemLines.mrp`
    /// names a catalogued field.
    pub fn contains(&self, path: &str) -> bool {
        match path.split_once('.') {
            None => {
                self.top_level.iter().any(|f| f == path)
                    || self.objects.iter().any(|o| o.name == path)
                    || self.arrays.iter().any(|a| a.name == path)
            }
            Some((parent, child)) => {
                self.objects
                    .iter()
                    .any(|o| o.name == parent && o.fields.iter().any(|f| f == child))
                    || self
                        .arrays
                        .iter()
                        .any(|a| a.name == parent && a.fields.iter().any(|f| f == child))
            }
        }
    }

    /// Distinct `$data` paths in `document` that are not catalogued, in
    /// first-seen order. Method calls such as `$data.itemLines.size()` are
    /// checked up to the receiver.
    pub fn unknown_references(&self, document: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut unknown = Vec::new();

        for caps in DATA_REF_RE.captures_iter(document) {
            let head = &caps[1];
            let path = match (caps.get(2), caps.get(3)) {
                (Some(child), None) => format!("{head}.{}", child.as_str()),
                (None, Some(_)) => continue,
                _ => head.to_string(),
            };
            if seen.insert(path.clone()) && !self.contains(&path) {
                unknown.push(path);
            }
        }
        unknown
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}:\n{}", self.heading, self.intro);

        out.push_str("\n\nTOP-LEVEL FIELDS:");
        for chunk in self.top_level.chunks(FIELDS_PER_LINE) {
            out.push_str("\n- ");
            out.push_str(&chunk.join(", "));
        }

        if !self.objects.is_empty() {
            out.push_str("\n\nNESTED OBJECTS:");
            for object in &self.objects {
                out.push_str(&format!("\n- {}: {{{}}}", object.name, object.fields.join(", ")));
            }
        }

        if !self.arrays.is_empty() {
            out.push_str("\n\nARRAYS:");
            for array in &self.arrays {
                out.push_str(&format!(
                    "\n- {}: Array of {} with fields:\n  {{{}}}",
                    array.name,
                    array.description,
                    array.fields.join(", ")
                ));
            }
        }

        out
    }
}

/// Compose the full system message: rules, field catalog, closing instruction.
pub fn render_system_prompt(rules: &RuleBook, fields: &FieldCatalog) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        rules.render(),
        fields.render(),
        rules.closing.trim()
    )
}
