//! File-name handling for uploads and attachments.

use templatesmith_shared::{DEFAULT_SOURCE_FILENAME, Result, TemplatesmithError};

/// Extensions accepted for uploaded templates.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".xml", ".fo", ".vm", ".xsl", ".xslt"];

/// Inserted before the extension of the attachment name.
const MODIFIED_SUFFIX: &str = "_modified";

/// Caller-supplied name reduced to its last path component, or the default.
pub fn effective_filename(source: Option<&str>) -> String {
    source
        .map(|name| name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name).trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SOURCE_FILENAME)
        .to_string()
}

/// Insert `_modified` before the full extension: `invoice.fo.vm` becomes
/// `invoice_modified.fo.vm`, `README` becomes `README_modified`.
///
/// A leading dot is part of the stem, so `.hidden` becomes `.hidden_modified`.
pub fn modified_filename(filename: &str) -> String {
    let split = filename
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '.')
        .map(|(idx, _)| idx);

    match split {
        Some(idx) => format!("{}{MODIFIED_SUFFIX}{}", &filename[..idx], &filename[idx..]),
        None => format!("{filename}{MODIFIED_SUFFIX}"),
    }
}

/// Reject uploads whose name does not end in an allowed extension.
pub fn check_upload_extension(filename: &str) -> Result<()> {
    let lower = filename.to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(TemplatesmithError::validation(format!(
            "Invalid file type. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Content type for the attachment.
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".xml") || lower.ends_with(".xsl") || lower.ends_with(".xslt") {
        "application/xml"
    } else {
        "application/octet-stream"
    }
}

/// `Content-Disposition` value for downloading `filename`.
///
/// The quoted `filename` is an ASCII fallback with `"`, `\`, control and
/// non-ASCII characters replaced by `_`. When that loses anything, the exact
/// name follows as RFC 5987 `filename*=UTF-8''...`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_ext_value(filename)
        )
    }
}

/// Percent-encode everything outside RFC 5987 `attr-char`.
fn encode_ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
