//! Person body parsing.
//!
//! Every field goes through an ordered rule list (see [`super::rules`]).
//! Absent fields stay `None`; nothing is defaulted to placeholder text.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{parse_event, parse_media, parse_notes};
use super::records::{PersonRecord, Sex};
use super::rules::{Rule, first_match};
use super::text::{
    clean_value, collapse_whitespace, raw_tag_value, strip_commentary, tag_value, trim_non_letters,
    value_from,
};

static CORRUPT_NAME_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"N[^A-Za-z]?A[^A-Za-z]?M[^A-Za-z]?E|NAM|AME").expect("valid name tag regex")
});
static INLINE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{L}[\p{L} .'\-]*?)\s*/\s*(\p{L}[\p{L} .'\-]*?)\s*/")
        .expect("valid inline name regex")
});
static RUSSIAN_SEX_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(мужской|мужчина|муж\.|женский|женщина|жен\.)").expect("valid sex word regex")
});
static COORDINATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\w\-]{0,3}(-?\d+(?:[.,]\d+)?)").expect("valid coordinate regex"));

/// Name pieces recovered from a person body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub full: Option<String>,
    pub given: Option<String>,
    pub surname: Option<String>,
}

/// Name heuristics, most trustworthy first.
pub static NAME_RULES: &[Rule<NameParts>] = &[
    Rule::new("structured_name", structured_name),
    Rule::new("given_surname_tags", given_surname_tags),
    Rule::new("corrupted_name_tag", corrupted_name_tag),
    Rule::new("inline_before_sex", inline_before_sex),
    Rule::new("plain_name_tag", plain_name_tag),
];

/// Sex heuristics, most trustworthy first.
pub static SEX_RULES: &[Rule<Sex>] = &[
    Rule::new("sex_tag", sex_tag),
    Rule::new("russian_sex_tag", russian_sex_tag),
    Rule::new("russian_sex_words", russian_sex_words),
];

/// Parse one person section body.
pub fn parse_person_body(body: &str, media_title_window: usize) -> PersonRecord {
    let name = first_match(NAME_RULES, body)
        .map(|(_, parts)| parts)
        .unwrap_or_default();
    PersonRecord {
        name: name.full,
        given: name.given,
        surname: name.surname,
        sex: first_match(SEX_RULES, body).map(|(_, sex)| sex),
        birth: parse_event(body, "BIRT"),
        death: parse_event(body, "DEAT"),
        notes: parse_notes(body),
        media: parse_media(body, media_title_window),
        position: parse_position(body),
    }
}

/// Split and clean a raw name value such as `John (see note) /Smith/ Jr`.
///
/// Commentary is removed before splitting on the surname slashes; each part
/// then loses its leading and trailing non-letter characters.
pub fn parse_name(raw: &str) -> Option<NameParts> {
    let cleaned = clean_value(&strip_commentary(raw))?;

    let (given, surname) = match cleaned.split_once('/') {
        Some((before, rest)) => {
            let (surname, after) = rest.split_once('/').unwrap_or((rest, ""));
            (format!("{before} {after}"), Some(surname.to_string()))
        }
        None => (cleaned.clone(), None),
    };

    let given = non_blank(trim_non_letters(&collapse_whitespace(&given)));
    let surname = surname
        .as_deref()
        .map(collapse_whitespace)
        .and_then(|s| non_blank(trim_non_letters(&s)));

    let full = [given.as_deref(), surname.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let parts = NameParts {
        full: non_blank(&full),
        given,
        surname,
    };
    parts.full.is_some().then_some(parts)
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn has_non_ascii_letter(text: &str) -> bool {
    text.chars().any(|c| c.is_alphabetic() && !c.is_ascii())
}

fn structured_name(body: &str) -> Option<NameParts> {
    let raw = raw_tag_value(body, "NAME")?;
    if !raw.contains('/') && !has_non_ascii_letter(raw) {
        return None;
    }
    parse_name(raw)
}

fn given_surname_tags(body: &str) -> Option<NameParts> {
    let part = |tag: &str| {
        tag_value(body, tag).and_then(|v| non_blank(trim_non_letters(&strip_commentary(&v))))
    };
    let given = part("GIVN");
    let surname = part("SURN");
    if given.is_none() && surname.is_none() {
        return None;
    }
    let full = [given.as_deref(), surname.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    Some(NameParts {
        full: Some(collapse_whitespace(&full)),
        given: given.map(|g| collapse_whitespace(&g)),
        surname: surname.map(|s| collapse_whitespace(&s)),
    })
}

/// A damaged `NAME` tag (a stray byte inside it, or a lost first/last
/// letter) still followed by a slash-delimited name.
fn corrupted_name_tag(body: &str) -> Option<NameParts> {
    CORRUPT_NAME_TAG_RE.find_iter(body).find_map(|m| {
        let raw = value_from(body, m.end());
        if raw.contains('/') {
            parse_name(raw)
        } else {
            None
        }
    })
}

/// A bare `Given /Surname/` fragment somewhere before the sex tag.
fn inline_before_sex(body: &str) -> Option<NameParts> {
    let scope = body.find("SEX").map(|end| &body[..end]).unwrap_or(body);
    let caps = INLINE_NAME_RE.captures(scope)?;
    parse_name(&format!("{} /{}/", &caps[1], &caps[2]))
}

fn plain_name_tag(body: &str) -> Option<NameParts> {
    parse_name(raw_tag_value(body, "NAME")?)
}

fn sex_from_char(c: char) -> Sex {
    match c {
        'M' | 'm' | '1' | 'М' | 'м' => Sex::Male,
        'F' | 'f' | '2' | 'Ж' | 'ж' => Sex::Female,
        _ => Sex::Unknown,
    }
}

/// First letter or digit after `tag`, mapped to a sex.
fn sex_after(body: &str, tag: &str) -> Option<Sex> {
    let start = body.find(tag)? + tag.len();
    body[start..]
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(sex_from_char)
}

fn sex_tag(body: &str) -> Option<Sex> {
    sex_after(body, "SEX")
}

fn russian_sex_tag(body: &str) -> Option<Sex> {
    sex_after(body, "ПОЛ")
}

fn russian_sex_words(body: &str) -> Option<Sex> {
    let word = RUSSIAN_SEX_WORD_RE.find(body)?.as_str().to_lowercase();
    Some(if word.starts_with("муж") {
        Sex::Male
    } else {
        Sex::Female
    })
}

fn coordinate(body: &str, tag: &str) -> Option<f64> {
    let raw = raw_tag_value(body, tag)?;
    let caps = COORDINATE_RE.captures(raw)?;
    caps[1].replace(',', ".").parse().ok()
}

/// Canvas coordinates from `POSX`/`POSY`; both must be present.
pub fn parse_position(body: &str) -> Option<(f64, f64)> {
    Some((coordinate(body, "POSX")?, coordinate(body, "POSY")?))
}
