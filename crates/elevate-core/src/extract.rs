//! Fenced code block extraction from model output.
//!
//! Best-effort: the first block with a matching language tag wins and nothing
//! here ever fails. Text without a matching fence passes through unchanged.

use regex::Regex;

fn fence_pattern(tag: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?s)```{}[ \t]*\r?\n(.*?)```", regex::escape(tag))).ok()
}

/// Trimmed interior of the first block fenced as ```` ```tag ````.
pub fn extract_fenced_block<'a>(raw: &'a str, tag: &str) -> Option<&'a str> {
    let pattern = fence_pattern(tag)?;
    pattern
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
}

/// The first `tag` block, or `raw` unchanged when there is none.
pub fn extract_or_raw<'a>(raw: &'a str, tag: &str) -> &'a str {
    extract_fenced_block(raw, tag).unwrap_or(raw)
}

/// A python block, else a json block, else `raw` unchanged.
pub fn extract_code(raw: &str) -> &str {
    extract_fenced_block(raw, "python")
        .or_else(|| extract_fenced_block(raw, "json"))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_python_block() {
        let raw = "Here you go:\n```python\nprint('hi')\n\n```\nEnjoy.";
        assert_eq!(extract_code(raw), "print('hi')");
    }

    #[test]
    fn test_falls_back_to_json_block() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_code(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_python_wins_over_json() {
        let raw = "```json\n{}\n```\n```python\nx = 1\n```";
        assert_eq!(extract_code(raw), "x = 1");
    }

    #[test]
    fn test_first_match_is_returned() {
        let raw = "```python\nfirst = 1\n```\n```python\nsecond = 2\n```";
        assert_eq!(extract_fenced_block(raw, "python"), Some("first = 1"));
    }

    #[test]
    fn test_unfenced_text_is_unchanged_and_idempotent() {
        let raw = "  <Imports>import os</Imports>\n";
        assert_eq!(extract_code(raw), raw);
        assert_eq!(extract_code(extract_code(raw)), raw);
        assert_eq!(extract_or_raw(raw, "python"), raw);
    }

    #[test]
    fn test_other_tags_are_ignored() {
        let raw = "```markdown\n# Title\n```";
        assert_eq!(extract_fenced_block(raw, "python"), None);
        assert_eq!(extract_or_raw(raw, "markdown"), "# Title");
    }

    #[test]
    fn test_unterminated_fence_is_not_a_match() {
        let raw = "```python\nprint('never closed')";
        assert_eq!(extract_code(raw), raw);
    }
}
