/// Posts with more words than this get an unsolicited TL;DR
pub const LONG_POST_WORD_THRESHOLD: usize = 200;

/// Marker meaning the author already summarized their post
pub const TLDR_MARKER: &str = "tl;dr";

/// Number of maximal runs of non-whitespace characters
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether a post's plain text warrants an unsolicited summary
pub fn is_long_post(text: &str) -> bool {
    count_words(text) > LONG_POST_WORD_THRESHOLD && !text.to_lowercase().contains(TLDR_MARKER)
}
