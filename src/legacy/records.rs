//! Draft records produced while decoding.
//!
//! Drafts are mutable and keyed by their legacy token. They only live until
//! [`crate::model::build`] turns them into domain entities.

use std::collections::HashMap;

/// Sex as recorded in the legacy stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

/// A citation captured inside an event sub-block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationRecord {
    /// Literal text after the `SOUR` tag: either a global source number or
    /// free citation text.
    pub text: Option<String>,
    pub page: Option<String>,
}

/// Birth, death or marriage data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    pub date: Option<String>,
    pub place: Option<String>,
    pub citations: Vec<CitationRecord>,
}

impl EventRecord {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.place.is_none() && self.citations.is_empty()
    }
}

/// A multimedia reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaRecord {
    pub format: Option<String>,
    pub title: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonRecord {
    /// Full cleaned name, slashes removed.
    pub name: Option<String>,
    pub given: Option<String>,
    pub surname: Option<String>,
    pub sex: Option<Sex>,
    pub birth: Option<EventRecord>,
    pub death: Option<EventRecord>,
    pub notes: Vec<String>,
    pub media: Vec<MediaRecord>,
    pub position: Option<(f64, f64)>,
}

impl PersonRecord {
    /// True when any of the name fields holds non-blank text.
    pub fn has_name(&self) -> bool {
        [&self.name, &self.given, &self.surname]
            .iter()
            .any(|field| field.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyRecord {
    pub husband: Option<String>,
    pub wife: Option<String>,
    pub children: Vec<String>,
    pub marriage: Option<EventRecord>,
    pub notes: Vec<String>,
    pub media: Vec<MediaRecord>,
}

/// Fill gaps in a record from a later record with the same token.
pub trait Absorb {
    fn absorb(&mut self, other: Self);
}

fn fill<T>(slot: &mut Option<T>, other: Option<T>) {
    if slot.is_none() {
        *slot = other;
    }
}

impl Absorb for PersonRecord {
    fn absorb(&mut self, other: Self) {
        fill(&mut self.name, other.name);
        fill(&mut self.given, other.given);
        fill(&mut self.surname, other.surname);
        if matches!(self.sex, None | Some(Sex::Unknown)) && other.sex.is_some() {
            self.sex = other.sex;
        }
        fill(&mut self.birth, other.birth);
        fill(&mut self.death, other.death);
        fill(&mut self.position, other.position);
        self.notes.extend(other.notes);
        self.media.extend(other.media);
    }
}

impl Absorb for FamilyRecord {
    fn absorb(&mut self, other: Self) {
        fill(&mut self.husband, other.husband);
        fill(&mut self.wife, other.wife);
        fill(&mut self.marriage, other.marriage);
        for child in other.children {
            if !self.children.contains(&child) {
                self.children.push(child);
            }
        }
        self.notes.extend(other.notes);
        self.media.extend(other.media);
    }
}

/// Draft records indexed by token, kept in first-seen order.
#[derive(Debug, Clone)]
pub struct DraftArena<T> {
    records: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for DraftArena<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Absorb> DraftArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, merging into an existing one with the same token.
    pub fn upsert(&mut self, token: &str, record: T) {
        match self.index.get(token) {
            Some(&slot) => self.records[slot].1.absorb(record),
            None => {
                self.index.insert(token.to_string(), self.records.len());
                self.records.push((token.to_string(), record));
            }
        }
    }

    pub fn get(&self, token: &str) -> Option<&T> {
        self.index.get(token).map(|&slot| &self.records[slot].1)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.records.iter().map(|(token, record)| (token.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_tokens_fill_gaps_only() {
        let mut arena = DraftArena::new();
        arena.upsert(
            "P1",
            PersonRecord {
                given: Some("John".into()),
                sex: Some(Sex::Unknown),
                ..Default::default()
            },
        );
        arena.upsert(
            "P1",
            PersonRecord {
                given: Some("Johann".into()),
                surname: Some("Smith".into()),
                sex: Some(Sex::Male),
                notes: vec!["second body".into()],
                ..Default::default()
            },
        );

        assert_eq!(arena.len(), 1);
        let person = arena.get("P1").unwrap();
        assert_eq!(person.given.as_deref(), Some("John"));
        assert_eq!(person.surname.as_deref(), Some("Smith"));
        assert_eq!(person.sex, Some(Sex::Male));
        assert_eq!(person.notes, vec!["second body".to_string()]);
    }

    #[test]
    fn arena_keeps_first_seen_order() {
        let mut arena = DraftArena::new();
        for token in ["F2", "F10", "F1"] {
            arena.upsert(token, FamilyRecord::default());
        }
        let order: Vec<_> = arena.iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["F2", "F10", "F1"]);
    }

    #[test]
    fn blank_names_do_not_count() {
        let person = PersonRecord {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(!person.has_name());
    }
}
