//! Canonical genealogy domain model.
//!
//! # Invariants
//! - Every `IndividualId` held by a [`Family`] resolves to an individual in
//!   the same [`ProjectBundle`], or is absent.
//! - A [`SourceCitation`] points at exactly one of: a [`Source`] or literal
//!   citation text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type IndividualId = Uuid;
pub type FamilyId = Uuid;
pub type SourceId = Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Birth,
    Death,
    Marriage,
}

/// What a citation refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CitationTarget {
    /// One of the shared sources of the bundle.
    Source { id: SourceId },
    /// Free citation text with no shared source behind it.
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    #[serde(flatten)]
    pub target: CitationTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<SourceCitation>,
}

/// A shared source, referenced by citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    /// Global source slot (1-6) in the legacy file, when imported from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    /// Raw captured text.
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub file_name: String,
    /// Relative path with `/` separators.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub given: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub surname: String,
    #[serde(default)]
    pub gender: Gender,
    /// Life events in birth, death order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LayoutPosition>,
}

impl Individual {
    pub fn event(&self, kind: EventKind) -> Option<&Event> {
        self.events.iter().find(|e| e.kind == kind)
    }

    /// `given surname`, skipping blank parts.
    pub fn display_name(&self) -> String {
        [self.given.as_str(), self.surname.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub husband: Option<IndividualId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wife: Option<IndividualId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IndividualId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marriage: Option<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaAttachment>,
}

/// One project: the whole domain graph handed to the rest of the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectBundle {
    #[serde(default)]
    pub individuals: Vec<Individual>,
    #[serde(default)]
    pub families: Vec<Family>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ProjectBundle {
    pub fn individual(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.iter().find(|i| i.id == id)
    }

    pub fn source(&self, id: SourceId) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty() && self.families.is_empty() && self.sources.is_empty()
    }

    /// Drop family references that do not resolve to an individual here.
    pub fn prune_dangling_references(&mut self) -> usize {
        let known: std::collections::HashSet<IndividualId> =
            self.individuals.iter().map(|i| i.id).collect();
        let mut pruned = 0;
        for family in &mut self.families {
            for slot in [&mut family.husband, &mut family.wife] {
                if slot.is_some_and(|id| !known.contains(&id)) {
                    *slot = None;
                    pruned += 1;
                }
            }
            let before = family.children.len();
            family.children.retain(|id| known.contains(id));
            pruned += before - family.children.len();
        }
        pruned
    }
}
