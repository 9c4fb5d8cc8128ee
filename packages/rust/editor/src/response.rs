//! Post-processing of the generated text.

use std::sync::LazyLock;

use regex::Regex;

use templatesmith_shared::TruncationWarning;

/// First fenced block, optionally tagged `xml`. The newline before the
/// closing fence belongs to the fence, not the body.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:xml)?\n(.*?)\n?```").expect("valid regex"));

/// Return the interior of the first fenced block in `raw`, or `raw` verbatim
/// when there is none.
pub fn extract_document(raw: &str) -> &str {
    if !raw.contains("```") {
        return raw;
    }
    FENCE_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str())
}

/// Flag outputs shorter than half the input (in characters).
pub fn check_truncation(input: &str, output: &str) -> Option<TruncationWarning> {
    let input_len = input.chars().count();
    let output_len = output.chars().count();
    (output_len * 2 < input_len).then_some(TruncationWarning {
        input_len,
        output_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tagged_block_exactly() {
        let raw = "Here you go:\n```xml\n<fo:root>\n  <a/>\n</fo:root>\n```\nLet me know!";
        assert_eq!(extract_document(raw), "<fo:root>\n  <a/>\n</fo:root>");
    }

    #[test]
    fn extracts_regardless_of_prefix_and_suffix() {
        assert_eq!(extract_document("prefix```xml\nBODY\n```suffix"), "BODY");
        assert_eq!(extract_document("```xml\nBODY\n```"), "BODY");
    }

    #[test]
    fn extracts_untagged_block() {
        assert_eq!(extract_document("```\n<x/>\n```"), "<x/>");
    }

    #[test]
    fn keeps_inner_whitespace() {
        assert_eq!(extract_document("```xml\n\n  BODY  \n\n```"), "\n  BODY  \n");
    }

    #[test]
    fn first_block_wins() {
        let raw = "```xml\nFIRST\n```\nand\n```xml\nSECOND\n```";
        assert_eq!(extract_document(raw), "FIRST");
    }

    #[test]
    fn unfenced_text_is_verbatim() {
        let raw = "<fo:root>\n</fo:root>\n";
        assert_eq!(extract_document(raw), raw);
    }

    #[test]
    fn unmatched_fence_is_verbatim() {
        // Other language tags and unterminated fences fall through.
        let raw = "```velocity\n#set($x = 1)\n```";
        assert_eq!(extract_document(raw), raw);
        let raw = "```xml\n<never-closed/>";
        assert_eq!(extract_document(raw), raw);
    }

    #[test]
    fn truncation_threshold_is_half() {
        let input = "x".repeat(100);
        assert!(check_truncation(&input, &"y".repeat(50)).is_none());
        assert!(check_truncation(&input, &"y".repeat(80)).is_none());
        assert_eq!(
            check_truncation(&input, &"y".repeat(49)),
            Some(TruncationWarning {
                input_len: 100,
                output_len: 49
            })
        );
    }

    #[test]
    fn truncation_counts_characters() {
        // Four characters, twelve bytes.
        let input = "€€€€";
        assert!(check_truncation(input, "ab").is_none());
        assert!(check_truncation(input, "a").is_some());
    }
}
