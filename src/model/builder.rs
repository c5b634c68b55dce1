//! Turns decoded legacy drafts into a [`ProjectBundle`].

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use super::types::*;
use crate::legacy::text::{clean_value, next_known_tag, tag_value};
use crate::legacy::{
    CitationRecord, DraftArena, EventRecord, FamilyRecord, LegacyDecode, MediaRecord,
    PersonRecord, Sex,
};

/// `SOUR3`, `S3`, `@S3@` and bare `3` all cite global source 3.
static SOURCE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:SOUR)?\s*@?S?([0-9]{1,2})@?$").expect("valid source number regex")
});

/// Build the domain graph from a legacy decode.
pub fn build(decoded: &LegacyDecode) -> ProjectBundle {
    ModelBuilder::new(&decoded.common_sources).build(&decoded.persons, &decoded.families)
}

/// Holds the id tables while one bundle is assembled.
struct ModelBuilder {
    sources: Vec<Source>,
    source_ids: HashMap<u8, SourceId>,
    individual_ids: HashMap<String, IndividualId>,
}

impl ModelBuilder {
    fn new(common_sources: &BTreeMap<u8, String>) -> Self {
        let sources: Vec<Source> = common_sources
            .iter()
            .map(|(&slot, raw)| source_from_raw(slot, raw))
            .collect();
        let source_ids = sources
            .iter()
            .filter_map(|s| s.number.map(|n| (n, s.id)))
            .collect();
        Self {
            sources,
            source_ids,
            individual_ids: HashMap::new(),
        }
    }

    fn build(
        mut self,
        persons: &DraftArena<PersonRecord>,
        families: &DraftArena<FamilyRecord>,
    ) -> ProjectBundle {
        let referenced: HashSet<&str> = families
            .iter()
            .flat_map(|(_, f)| {
                f.husband
                    .iter()
                    .chain(f.wife.iter())
                    .chain(f.children.iter())
                    .map(String::as_str)
            })
            .collect();

        let mut individuals = Vec::with_capacity(persons.len());
        for (token, draft) in persons.iter() {
            if !referenced.contains(token) && !carries_identity(draft) {
                debug!("event=model_build status=dropped token={token} reason=empty_draft");
                continue;
            }
            let individual = self.individual(draft);
            self.individual_ids.insert(token.to_string(), individual.id);
            individuals.push(individual);
        }

        let families = families
            .iter()
            .map(|(token, draft)| self.family(token, draft))
            .collect();

        ProjectBundle {
            individuals,
            families,
            sources: self.sources,
        }
    }

    fn individual(&self, draft: &PersonRecord) -> Individual {
        let (given, surname) = match (&draft.given, &draft.surname) {
            (None, None) => (draft.name.clone().unwrap_or_default(), String::new()),
            (given, surname) => (
                given.clone().unwrap_or_default(),
                surname.clone().unwrap_or_default(),
            ),
        };

        let events = [
            (EventKind::Birth, &draft.birth),
            (EventKind::Death, &draft.death),
        ]
        .into_iter()
        .filter_map(|(kind, record)| record.as_ref().map(|r| self.event(kind, r)))
        .collect();

        Individual {
            id: Uuid::new_v4(),
            given,
            surname,
            gender: match draft.sex {
                Some(Sex::Male) => Gender::Male,
                Some(Sex::Female) => Gender::Female,
                Some(Sex::Unknown) | None => Gender::Unknown,
            },
            events,
            notes: notes(&draft.notes),
            media: media(&draft.media),
            position: draft.position.map(|(x, y)| LayoutPosition { x, y }),
        }
    }

    fn family(&self, token: &str, draft: &FamilyRecord) -> Family {
        Family {
            id: Uuid::new_v4(),
            husband: draft.husband.as_deref().and_then(|t| self.member(token, t)),
            wife: draft.wife.as_deref().and_then(|t| self.member(token, t)),
            children: draft
                .children
                .iter()
                .filter_map(|t| self.member(token, t))
                .collect(),
            marriage: draft
                .marriage
                .as_ref()
                .map(|r| self.event(EventKind::Marriage, r)),
            notes: notes(&draft.notes),
            media: media(&draft.media),
        }
    }

    fn member(&self, family: &str, token: &str) -> Option<IndividualId> {
        let id = self.individual_ids.get(token).copied();
        if id.is_none() {
            debug!("event=model_build status=unresolved family={family} member={token}");
        }
        id
    }

    fn event(&self, kind: EventKind, record: &EventRecord) -> Event {
        Event {
            kind,
            date: record.date.clone(),
            place: record.place.clone(),
            citations: record
                .citations
                .iter()
                .filter_map(|c| self.citation(c))
                .collect(),
        }
    }

    fn citation(&self, record: &CitationRecord) -> Option<SourceCitation> {
        let text = record.text.as_deref()?;
        let target = SOURCE_NUMBER_RE
            .captures(text)
            .and_then(|caps| caps[1].parse::<u8>().ok())
            .and_then(|slot| self.source_ids.get(&slot))
            .map(|&id| CitationTarget::Source { id })
            .unwrap_or_else(|| CitationTarget::Text {
                text: text.to_string(),
            });
        Some(SourceCitation {
            target,
            page: record.page.clone(),
        })
    }
}

/// Name, a definite sex or a life event keeps an unreferenced draft alive.
fn carries_identity(draft: &PersonRecord) -> bool {
    draft.has_name()
        || matches!(draft.sex, Some(Sex::Male | Sex::Female))
        || draft.birth.is_some()
        || draft.death.is_some()
}

fn source_from_raw(slot: u8, raw: &str) -> Source {
    let leading = clean_value(&raw[..next_known_tag(raw, 0).unwrap_or(raw.len())]);
    Source {
        id: Uuid::new_v4(),
        number: Some(slot),
        title: tag_value(raw, "TITL").or(leading),
        abbreviation: tag_value(raw, "ABBR"),
        text: raw.to_string(),
    }
}

fn notes(texts: &[String]) -> Vec<Note> {
    texts.iter().map(|text| Note { text: text.clone() }).collect()
}

fn media(records: &[MediaRecord]) -> Vec<MediaAttachment> {
    records
        .iter()
        .filter_map(|record| {
            let Some(path) = record.file.as_deref() else {
                debug!("event=model_build status=dropped_media reason=no_file");
                return None;
            };
            let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
            Some(MediaAttachment {
                file_name,
                path: path.to_string(),
                title: record.title.clone(),
                format: record.format.clone(),
            })
        })
        .collect()
}
