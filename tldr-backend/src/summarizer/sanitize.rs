use once_cell::sync::Lazy;
use regex::Regex;

/// "TL;DR" labels anywhere in the text, with the separator that follows them
static TLDR_LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\s)?tl;dr[:\-\s]*").unwrap());

/// Markdown header lines ("## Summary")
static MARKDOWN_HEADER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#+\s*.*\n?").unwrap());

/// Clean generated text into something postable after "TL;DR: ".
///
/// Every step only removes characters, so the passes are repeated until the
/// text stops changing. That keeps `sanitize(sanitize(x)) == sanitize(x)` for
/// inputs where one removal exposes another label or double space.
pub fn sanitize_response(response: &str) -> String {
    let mut current = response.to_string();
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn sanitize_pass(response: &str) -> String {
    let without_labels = TLDR_LABEL_PATTERN.replace_all(response, "");
    let without_headers = MARKDOWN_HEADER_PATTERN.replace_all(&without_labels, "");
    without_headers
        .replace(".  ", ". ")
        .replace(",  ", ", ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_leading_label() {
        assert_eq!(sanitize_response("TL;DR: The cat sat."), "The cat sat.");
        assert_eq!(sanitize_response("tl;dr - short"), "short");
        assert_eq!(sanitize_response("  **tl;dr**  x"), "****  x");
    }

    #[test]
    fn test_strips_label_anywhere() {
        let out = sanitize_response("Honestly tl;dr: it was fine");
        assert!(!out.to_lowercase().contains("tl;dr"));
        assert_eq!(out, "Honestlyit was fine");
    }

    #[test]
    fn test_strips_markdown_headers() {
        assert_eq!(
            sanitize_response("## Summary\nPeople argued about tabs."),
            "People argued about tabs."
        );
        assert_eq!(
            sanitize_response("Intro.\n# Heading\nBody"),
            "Intro.\nBody"
        );
    }

    #[test]
    fn test_collapses_post_punctuation_double_spaces() {
        assert_eq!(sanitize_response("One.  Two,  three"), "One. Two, three");
        // Only after '.' and ','
        assert_eq!(sanitize_response("a  b"), "a  b");
    }

    #[test]
    fn test_empty_result_passes_through() {
        assert_eq!(sanitize_response("TL;DR:"), "");
        assert_eq!(sanitize_response("# only a header"), "");
        assert_eq!(sanitize_response(""), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "TL;DR: The cat sat.",
            "tl;tl;drdr nested",
            "Wait.   Three spaces,    four",
            "#\n# \n## x\nbody  ",
            "  tl;dr\n\n## Header\nfine.  ok  ",
            "TL;DR TL;DR tl;dr",
            "",
        ];
        for input in inputs {
            let once = sanitize_response(input);
            assert_eq!(sanitize_response(&once), once, "input: {:?}", input);
        }
    }
}
