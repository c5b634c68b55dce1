//! Record sectionizer.
//!
//! Record starts look like a capital letter followed by 1-5 digits (`P42`,
//! `F7`, `S3`). The same shape is used for cross-references (`HUSBP7`), so
//! a candidate only counts as a record start when:
//! - the character before it is not alphanumeric,
//! - it does not follow a reference tag across a short gap of spaces, `@`
//!   or control bytes (`HUSB P7`, `SOUR @S1@`), and
//! - the lookahead window after it holds a tag expected for its kind.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use super::text::advance_chars;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][0-9]{1,5}").expect("valid token regex"));

/// Tags whose value is a record token rather than a record of its own.
const REFERENCE_TAGS: &[&str] = &["HUSB", "WIFE", "CHIL", "FAMS", "FAMC", "SOUR"];

/// Delimiter characters allowed between a reference tag and its token.
/// Matches the `\W{0,3}` gap the member parsers accept.
const REFERENCE_GAP: usize = 3;

/// What a record token introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Person,
    Family,
    Source,
}

impl RecordKind {
    /// Kind implied by the token letter. Other letters never start a record.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'P' | 'I' => Some(RecordKind::Person),
            'F' => Some(RecordKind::Family),
            'S' => Some(RecordKind::Source),
            _ => None,
        }
    }

    /// Tags that must appear in the lookahead window.
    pub fn expected_tags(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Person => &[
                "NAME", "GIVN", "SURN", "SEX", "ПОЛ", "POSX", "POSY", "BIRT", "DEAT",
            ],
            RecordKind::Family => &["HUSB", "WIFE", "CHIL", "MARR"],
            RecordKind::Source => &["TITL", "ABBR", "TEXT"],
        }
    }
}

/// One accepted record: its token and the body up to the next record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub token: &'a str,
    pub kind: RecordKind,
    /// Byte range of the token in the sectionized text.
    pub span: Range<usize>,
    pub body: &'a str,
}

/// Split `text` into accepted record sections, in stream order.
///
/// Text before the first accepted token belongs to no record and is dropped.
pub fn sectionize(text: &str, lookahead: usize) -> Vec<Section<'_>> {
    let starts: Vec<(Range<usize>, RecordKind)> = TOKEN_RE
        .find_iter(text)
        .filter_map(|m| accept(text, m.range(), lookahead).map(|kind| (m.range(), kind)))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (span, kind))| {
            let end = starts
                .get(i + 1)
                .map(|(next, _)| next.start)
                .unwrap_or(text.len());
            Section {
                token: &text[span.clone()],
                kind: *kind,
                span: span.clone(),
                body: &text[span.end..end],
            }
        })
        .collect()
}

fn accept(text: &str, span: Range<usize>, lookahead: usize) -> Option<RecordKind> {
    let token = &text[span.clone()];
    let kind = RecordKind::from_letter(token.chars().next()?)?;

    // P123456 is not a token with 5 digits
    if text[span.end..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    if let Some(prev) = text[..span.start].chars().next_back() {
        if prev.is_alphanumeric() {
            return None;
        }
    }

    if let Some(tag) = referencing_tag(&text[..span.start]) {
        debug!(
            "event=sectionize status=reject token={} offset={} reason=reference tag={}",
            token, span.start, tag
        );
        return None;
    }

    let window_end = advance_chars(text, span.end, lookahead);
    let window = &text[span.end..window_end];
    if !kind.expected_tags().iter().any(|tag| window.contains(tag)) {
        debug!(
            "event=sectionize status=reject token={} offset={} reason=no_expected_tag",
            token, span.start
        );
        return None;
    }

    Some(kind)
}

/// The reference tag `before` ends with, once up to [`REFERENCE_GAP`]
/// delimiter characters are skipped.
fn referencing_tag(before: &str) -> Option<&'static str> {
    let mut end = before.len();
    for (i, c) in before.char_indices().rev().take(REFERENCE_GAP) {
        if c.is_alphanumeric() || c == '_' {
            break;
        }
        end = i;
    }
    let head = &before[..end];
    REFERENCE_TAGS.iter().copied().find(|tag| head.ends_with(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_people_and_families() {
        let text = "\x01P1NAMEJohn /Smith/SEXM\x02P2NAMEJane /Doe/SEXF\x03F1HUSBP1WIFEP2";
        let sections = sectionize(text, 200);

        let tokens: Vec<_> = sections.iter().map(|s| (s.token, s.kind)).collect();
        assert_eq!(
            tokens,
            vec![
                ("P1", RecordKind::Person),
                ("P2", RecordKind::Person),
                ("F1", RecordKind::Family),
            ]
        );
        assert_eq!(sections[0].body, "NAMEJohn /Smith/SEXM\x02");
        assert_eq!(sections[2].body, "HUSBP1WIFEP2");
    }

    #[test]
    fn references_are_not_record_starts() {
        let text = " F3HUSBP7WIFEP8CHILP9CHILP10";
        let sections = sectionize(text, 200);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].token, "F3");
    }

    #[test]
    fn delimited_references_are_not_record_starts() {
        let forms = [
            "\x01F1HUSB P1 WIFE P2\x01P1NAMEJohn\x01P2NAMEJane",
            "\x01F1HUSB@P1@WIFE@P2@\x01P1NAMEJohn\x01P2NAMEJane",
            "\x01F1HUSB\x02P1\x02WIFE\x02\x03P2\x01P1NAMEJohn\x01P2NAMEJane",
        ];
        for text in forms {
            let tokens: Vec<_> = sectionize(text, 200).iter().map(|s| s.token).collect();
            assert_eq!(tokens, vec!["F1", "P1", "P2"], "{text:?}");
        }

        let cited = "\x01P1BIRTDATE1900SOUR @S1@ DEATDATE1950\x01S1TITLParish book";
        let tokens: Vec<_> = sectionize(cited, 200).iter().map(|s| s.token).collect();
        assert_eq!(tokens, vec!["P1", "S1"]);
    }

    #[test]
    fn reference_gap_is_bounded() {
        assert_eq!(referencing_tag("CHIL @"), Some("CHIL"));
        assert_eq!(referencing_tag("FAMS\x01\x02\x03"), Some("FAMS"));
        assert_eq!(referencing_tag("FAMS\x01\x02\x03\x04"), None);
        assert_eq!(referencing_tag("SEX\x01"), None);
        assert_eq!(referencing_tag(""), None);
    }

    #[test]
    fn candidates_without_expected_tags_are_rejected() {
        // "A1" has an unknown letter, "P5" has no person tag nearby.
        let text = " A1NAMEx P5 somewhere on road P6NAMEAnn";
        let sections = sectionize(text, 10);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].token, "P6");
    }

    #[test]
    fn lookahead_window_is_bounded() {
        let filler = "x".repeat(300);
        let text = format!(" P1{filler}NAMEJohn");
        assert!(sectionize(&text, 200).is_empty());
        assert_eq!(sectionize(&text, 400).len(), 1);
    }

    #[test]
    fn six_digit_runs_are_not_tokens() {
        let text = " P123456NAMEJohn";
        assert!(sectionize(text, 200).is_empty());
    }

    #[test]
    fn no_tokens_no_sections() {
        assert!(sectionize("plain text with NAME and SEX tags", 200).is_empty());
        assert!(sectionize("", 200).is_empty());
    }
}
