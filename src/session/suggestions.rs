//! Follow-up suggestion markers embedded in model text.

use std::sync::OnceLock;

use regex::Regex;

fn suggest_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"<suggest>(.*?)</suggest>").expect("suggestion tag regex must compile")
    })
}

/// Model text with its suggestion markers removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub suggestions: Vec<String>,
}

/// Pull `<suggest>...</suggest>` markers out of `text`.
///
/// Only single-line tags match. Contents are trimmed, empty ones dropped and
/// at most `max` kept in order of appearance. The remaining text is trimmed.
pub fn extract_suggestions(text: &str, max: usize) -> Extracted {
    let tag = suggest_tag();
    let suggestions = tag
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .take(max)
        .map(str::to_string)
        .collect();

    Extracted {
        text: tag.replace_all(text, "").trim().to_string(),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_tags_and_keeps_order() {
        let extracted = extract_suggestions(
            "How did today go?\n<suggest> Log my mood </suggest>\n<suggest>Add a habit</suggest>",
            3,
        );

        assert_eq!(extracted.text, "How did today go?");
        assert_eq!(extracted.suggestions, vec!["Log my mood", "Add a habit"]);
    }

    #[test]
    fn caps_at_max() {
        let extracted = extract_suggestions(
            "<suggest>a</suggest><suggest>b</suggest><suggest>c</suggest><suggest>d</suggest>",
            3,
        );
        assert_eq!(extracted.suggestions, vec!["a", "b", "c"]);
        assert_eq!(extracted.text, "");
    }

    #[test]
    fn drops_empty_and_ignores_multiline_tags() {
        let extracted = extract_suggestions("Hi <suggest> </suggest><suggest>split\nline</suggest>", 3);
        assert!(extracted.suggestions.is_empty());
        assert_eq!(extracted.text, "Hi <suggest>split\nline</suggest>");
    }

    #[test]
    fn idempotent_on_tag_free_text() {
        let once = extract_suggestions("  Just text.  ", 3);
        let twice = extract_suggestions(&once.text, 3);

        assert_eq!(once.text, "Just text.");
        assert_eq!(once, twice);
    }
}
