//! Plain-text extraction from status HTML.
//!
//! Text nodes are concatenated in document order with character references
//! decoded. Nothing is inserted between block elements, so `<p>a</p><p>b</p>`
//! becomes `ab`. Malformed markup makes the extractor give up and return the
//! input untouched.

/// Extract the concatenated text content of `html`.
///
/// Falls back to returning `html` unchanged (and logging a warning) when a
/// tag, comment or declaration is never closed.
pub fn extract_text_from_html(html: &str) -> String {
    match parse_text_nodes(html) {
        Ok(text) => text,
        Err(reason) => {
            log::warn!("Error parsing HTML ({}), using raw content", reason);
            html.to_string()
        }
    }
}

fn parse_text_nodes(html: &str) -> Result<String, String> {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find(|c: char| c == '<' || c == '&') {
        text.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('&') {
            let (decoded, consumed) = decode_entity(rest);
            text.push_str(&decoded);
            rest = &rest[consumed..];
            continue;
        }

        // A '<' only opens markup when followed by a name start or '/', '!', '?'
        let opens_markup = rest[1..]
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
            .unwrap_or(false);
        if !opens_markup {
            text.push('<');
            rest = &rest[1..];
            continue;
        }

        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .ok_or_else(|| "unterminated comment".to_string())?;
            rest = &rest[4 + end + 3..];
            continue;
        }

        let end = find_tag_end(rest).ok_or_else(|| "unterminated tag".to_string())?;
        let tag = &rest[..=end];
        rest = &rest[end + 1..];

        // Raw-text elements: their body is a single text node, not markup
        if let Some(name) = raw_text_element(tag) {
            let close = format!("</{}", name);
            let body_end = find_ascii_case_insensitive(rest, &close)
                .ok_or_else(|| format!("unterminated <{}> element", name))?;
            text.push_str(&rest[..body_end]);
            rest = &rest[body_end..];
        }
    }

    text.push_str(rest);
    Ok(text)
}

/// Index of the '>' closing the tag at the start of `s`, skipping quoted
/// attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(i),
            None => {}
        }
    }
    None
}

fn raw_text_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name: String = tag[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match name.as_str() {
        "script" => Some("script"),
        "style" => Some("style"),
        "textarea" => Some("textarea"),
        "title" => Some("title"),
        _ => None,
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Decode the character reference at the start of `s` (which begins with '&').
/// Returns the decoded text and the number of bytes consumed. Unknown or
/// unterminated references are kept literally.
fn decode_entity(s: &str) -> (String, usize) {
    let Some(semi) = s[1..].find(';').map(|i| i + 1).filter(|&i| i <= 12) else {
        return ("&".to_string(), 1);
    };
    let name = &s[1..semi];

    let decoded = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
    } else {
        named_entity(name)
    };

    match decoded {
        Some(c) => (c.to_string(), semi + 1),
        None => ("&".to_string(), 1),
    }
}

/// Named references seen in status markup: the XML five, spacing, and the
/// typographic punctuation remote servers and clients commonly emit
fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwj" => '\u{200d}',
        "zwnj" => '\u{200c}',
        "shy" => '\u{ad}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201a}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bdquo" => '\u{201e}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "lsaquo" => '\u{2039}',
        "rsaquo" => '\u{203a}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "prime" => '\u{2032}',
        "Prime" => '\u{2033}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "plusmn" => '\u{b1}',
        "times" => '\u{d7}',
        "divide" => '\u{f7}',
        "minus" => '\u{2212}',
        "para" => '\u{b6}',
        "sect" => '\u{a7}',
        "euro" => '\u{20ac}',
        "pound" => '\u{a3}',
        "yen" => '\u{a5}',
        "cent" => '\u{a2}',
        "iexcl" => '\u{a1}',
        "iquest" => '\u{bf}',
        "larr" => '\u{2190}',
        "rarr" => '\u{2192}',
        "uarr" => '\u{2191}',
        "darr" => '\u{2193}',
        "hearts" => '\u{2665}',
        _ => return None,
    };
    Some(c)
}
