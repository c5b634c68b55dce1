//! Family body parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::fields::{parse_event, parse_media, parse_notes};
use super::records::FamilyRecord;

static HUSBAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"HUSB\W{0,3}([A-Z][0-9]{1,5})").expect("valid husband regex"));
static WIFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"WIFE\W{0,3}([A-Z][0-9]{1,5})").expect("valid wife regex"));
static CHILD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CHIL\W{0,3}([A-Z][0-9]{1,5})").expect("valid child regex"));

fn member(re: &Regex, body: &str) -> Option<String> {
    re.captures(body).map(|caps| caps[1].to_string())
}

/// Parse one family section body: member tokens, marriage, notes, media.
pub fn parse_family_body(body: &str, media_title_window: usize) -> FamilyRecord {
    let mut children: Vec<String> = Vec::new();
    for caps in CHILD_RE.captures_iter(body) {
        let token = caps[1].to_string();
        if !children.contains(&token) {
            children.push(token);
        }
    }

    FamilyRecord {
        husband: member(&HUSBAND_RE, body),
        wife: member(&WIFE_RE, body),
        children,
        marriage: parse_event(body, "MARR"),
        notes: parse_notes(body),
        media: parse_media(body, media_title_window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_and_marriage() {
        let body = "HUSBP1WIFE@P2@CHILP3CHIL\x01P14CHILP3MARRDATE5 MAY 1920PLACRiga";
        let family = parse_family_body(body, 160);
        assert_eq!(family.husband.as_deref(), Some("P1"));
        assert_eq!(family.wife.as_deref(), Some("P2"));
        assert_eq!(family.children, vec!["P3".to_string(), "P14".to_string()]);
        let marriage = family.marriage.unwrap();
        assert_eq!(marriage.date.as_deref(), Some("5 MAY 1920"));
        assert_eq!(marriage.place.as_deref(), Some("Riga"));
    }

    #[test]
    fn missing_members_stay_absent() {
        let family = parse_family_body("WIFEP9", 160);
        assert_eq!(family.husband, None);
        assert_eq!(family.wife.as_deref(), Some("P9"));
        assert!(family.children.is_empty());
        assert_eq!(family.marriage, None);
    }
}
