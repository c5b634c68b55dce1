//! Byte cleaning, text decoding and tag-value helpers.
//!
//! The legacy export interleaves short uppercase tags (`NAME`, `BIRT`,
//! `DATE`, ...) with their values and a lot of binary padding. There is no
//! length framing we can trust, so a value runs from the end of its tag to
//! the start of the next known tag.

use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Every tag the decoder knows about. A value ends where one of these starts.
pub const KNOWN_TAGS: &[&str] = &[
    "NAME", "GIVN", "SURN", "SEX", "ПОЛ", "BIRT", "DEAT", "MARR", "NOTE", "OBJE", "POSX", "POSY",
    "HUSB", "WIFE", "CHIL", "FAMS", "FAMC", "DATE", "PLAC", "SOUR", "PAGE", "FORM", "TITL", "FILE",
    "ABBR", "TEXT",
];

/// Tags that close an event sub-block. `DATE`, `PLAC`, `SOUR` and `PAGE`
/// stay nested inside the event they follow.
pub const TOP_LEVEL_TAGS: &[&str] = &[
    "NAME", "GIVN", "SURN", "SEX", "ПОЛ", "BIRT", "DEAT", "MARR", "NOTE", "OBJE", "POSX", "POSY",
    "HUSB", "WIFE", "CHIL", "FAMS", "FAMC",
];

static KNOWN_TAG_RE: Lazy<Regex> = Lazy::new(|| tag_alternation(KNOWN_TAGS));
static TOP_LEVEL_TAG_RE: Lazy<Regex> = Lazy::new(|| tag_alternation(TOP_LEVEL_TAGS));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static COMMENTARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\([^)]*\)?|\[[^\]]*\]?|\{[^}]*\}?|"[^"]*"?|«[^»]*»?"#)
        .expect("valid commentary regex")
});

fn tag_alternation(tags: &[&str]) -> Regex {
    let pattern = tags
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("valid tag regex")
}

/// Drop every `0x00` byte. The format pads heavily with NULs, which would
/// otherwise split tags from their values.
pub fn clean_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().filter(|&b| b != 0).collect()
}

/// Text decodings the decoder can try.
#[derive(Debug, Clone, Copy)]
pub enum TextEncoding {
    Utf8,
    Legacy(&'static Encoding),
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Legacy(encoding) => encoding.name(),
        }
    }

    /// Decode without ever failing; invalid sequences become U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Legacy(encoding) => {
                encoding.decode_without_bom_handling(bytes).0.into_owned()
            }
        }
    }
}

/// Keep only the text strictly between the first `open` marker and the last
/// `close` marker. Returns the input unchanged when either marker is missing
/// or they are out of order.
pub fn strip_noise_blocks<'a>(text: &'a str, open: &str, close: &str) -> &'a str {
    let (Some(first), Some(last)) = (text.find(open), text.rfind(close)) else {
        return text;
    };
    let start = first + open.len();
    if start > last {
        return text;
    }
    &text[start..last]
}

/// Byte offset of the next known tag at or after `from`.
pub fn next_known_tag(text: &str, from: usize) -> Option<usize> {
    KNOWN_TAG_RE.find_at(text, from).map(|m| m.start())
}

/// Byte offset of the next top-level tag at or after `from`.
pub fn next_top_level_tag(text: &str, from: usize) -> Option<usize> {
    TOP_LEVEL_TAG_RE.find_at(text, from).map(|m| m.start())
}

/// Raw value following the first occurrence of `tag`, up to the next known tag.
pub fn raw_tag_value<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let start = text.find(tag)? + tag.len();
    Some(value_from(text, start))
}

/// Raw values following every occurrence of `tag`, with their start offsets.
pub fn raw_tag_values<'a>(text: &'a str, tag: &str) -> Vec<(usize, &'a str)> {
    text.match_indices(tag)
        .map(|(pos, _)| {
            let start = pos + tag.len();
            (pos, value_from(text, start))
        })
        .collect()
}

/// Cleaned value of the first occurrence of `tag`, if it is non-blank.
pub fn tag_value(text: &str, tag: &str) -> Option<String> {
    raw_tag_value(text, tag).and_then(clean_value)
}

/// Text from `start` up to the next known tag or the end of `text`.
pub fn value_from(text: &str, start: usize) -> &str {
    let end = next_known_tag(text, start).unwrap_or(text.len());
    &text[start..end]
}

/// Strip control characters, BOMs and replacement characters, collapse
/// whitespace and trim. Returns `None` for a blank result.
pub fn clean_value(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .filter(|&c| c != '\u{feff}' && c != '\u{fffd}')
        .collect();
    let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
    let trimmed = collapsed.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Remove parenthetical, bracketed, braced and quoted commentary. An
/// unterminated opener swallows the rest of the text.
pub fn strip_commentary(text: &str) -> Cow<'_, str> {
    COMMENTARY_RE.replace_all(text, " ")
}

/// Trim every leading and trailing character that is not a letter.
pub fn trim_non_letters(text: &str) -> &str {
    text.trim_matches(|c: char| !c.is_alphabetic())
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Byte offset `chars` characters after `from`, clamped to the text end.
pub fn advance_chars(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte offset `chars` characters before `to`, clamped to zero.
pub fn retreat_chars(text: &str, to: usize, chars: usize) -> usize {
    if chars == 0 {
        return to;
    }
    text[..to]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_bytes_are_removed() {
        assert_eq!(clean_bytes(b"N\0A\0M\0E\0\0J"), b"NAMEJ");
    }

    #[test]
    fn cyrillic_code_page_decodes() {
        // "Иван" in windows-1251
        let bytes = [0xC8, 0xE2, 0xE0, 0xED];
        let text = TextEncoding::Legacy(encoding_rs::WINDOWS_1251).decode(&bytes);
        assert_eq!(text, "Иван");
        assert!(TextEncoding::Utf8.decode(&bytes).contains('\u{fffd}'));
    }

    #[test]
    fn noise_blocks_are_cut_away() {
        let text = "header SUBM Ann Author P1NAME.. F1HUSB.. AUTH trailer Bob";
        assert_eq!(
            strip_noise_blocks(text, "SUBM", "AUTH"),
            " Ann Author P1NAME.. F1HUSB.. "
        );
        assert_eq!(strip_noise_blocks(text, "SUBM", "MISSING"), text);
        assert_eq!(strip_noise_blocks("AUTH x SUBM", "SUBM", "AUTH"), "AUTH x SUBM");
    }

    #[test]
    fn values_stop_at_next_known_tag() {
        let body = "NAMEJohn /Smith/SEXMBIRTDATE1 JAN 1900PLACBoston";
        assert_eq!(raw_tag_value(body, "NAME"), Some("John /Smith/"));
        assert_eq!(raw_tag_value(body, "SEX"), Some("M"));
        assert_eq!(raw_tag_value(body, "PLAC"), Some("Boston"));
        assert_eq!(raw_tag_value(body, "GIVN"), None);
    }

    #[test]
    fn clean_value_strips_control_and_markers() {
        assert_eq!(
            clean_value("\u{feff}\x05 John\u{fffd}\x01  Smith \x02"),
            Some("John Smith".to_string())
        );
        assert_eq!(clean_value(" \x03\x04 "), None);
    }

    #[test]
    fn commentary_is_removed() {
        assert_eq!(
            collapse_whitespace(&strip_commentary("John (see note) /Smith/")),
            "John /Smith/"
        );
        assert_eq!(
            collapse_whitespace(&strip_commentary(r#"Mary [twin] "Polly" Jones (unfinished"#)),
            "Mary Jones"
        );
    }

    #[test]
    fn char_offsets_respect_boundaries() {
        let text = "аб cd";
        assert_eq!(advance_chars(text, 0, 2), 4);
        assert_eq!(advance_chars(text, 0, 50), text.len());
        assert_eq!(retreat_chars(text, text.len(), 2), 5);
        assert_eq!(retreat_chars(text, 4, 10), 0);
    }
}
