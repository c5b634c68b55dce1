//! Project container: a [`ProjectBundle`] stored as JSON members of a ZIP.
//!
//! | entry         | content                                   | required |
//! |---------------|-------------------------------------------|----------|
//! | `data.json`   | the bundle without layout positions       | yes      |
//! | `layout.json` | individual id -> `{x, y}`                 | no       |
//! | `meta.json`   | format version, generator, save timestamp | no       |

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{IndividualId, LayoutPosition, ProjectBundle};
use crate::zip::{ContainerEntries, ContainerWriter, WriterOptions, read_entries};

pub const DATA_ENTRY: &str = "data.json";
pub const LAYOUT_ENTRY: &str = "layout.json";
pub const META_ENTRY: &str = "meta.json";

/// Version of the `data.json` layout written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Contents of `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub format_version: u32,
    pub generator: String,
    pub generator_version: String,
    pub saved_at: NaiveDateTime,
}

impl ProjectMetadata {
    fn current(options: &WriterOptions) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generator: env!("CARGO_PKG_NAME").to_string(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            saved_at: options
                .modified
                .unwrap_or_else(|| Local::now().naive_local()),
        }
    }
}

type Layout = BTreeMap<IndividualId, LayoutPosition>;

/// Serialize a bundle into project container bytes.
pub fn save(bundle: &ProjectBundle, options: &WriterOptions) -> Result<Vec<u8>> {
    let mut data = bundle.clone();
    let mut layout = Layout::new();
    for individual in &mut data.individuals {
        if let Some(position) = individual.position.take() {
            layout.insert(individual.id, position);
        }
    }

    let mut writer = ContainerWriter::new(options.clone());
    writer.add(DATA_ENTRY, &serde_json::to_vec(&data)?)?;
    if !layout.is_empty() {
        writer.add(LAYOUT_ENTRY, &serde_json::to_vec(&layout)?)?;
    }
    writer.add(
        META_ENTRY,
        &serde_json::to_vec_pretty(&ProjectMetadata::current(options))?,
    )?;
    let bytes = writer.finish()?;

    info!(
        "event=project_save individuals={} families={} sources={} positions={} bytes={}",
        data.individuals.len(),
        data.families.len(),
        data.sources.len(),
        layout.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Load a bundle from project container bytes.
pub fn load(bytes: &[u8]) -> Result<ProjectBundle> {
    let entries = read_entries(bytes)?;
    load_entries(&entries)
}

/// Load a bundle from already extracted container entries.
pub fn load_entries(entries: &ContainerEntries) -> Result<ProjectBundle> {
    let data = entries
        .get(DATA_ENTRY)
        .ok_or_else(|| Error::MissingEntry(DATA_ENTRY.to_string()))?;
    let mut bundle: ProjectBundle = serde_json::from_slice(data)?;

    if let Some(layout) = optional::<Layout>(entries, LAYOUT_ENTRY) {
        apply_layout(&mut bundle, &layout);
    }

    let pruned = bundle.prune_dangling_references();
    if pruned > 0 {
        warn!("event=project_load status=pruned dangling_references={pruned}");
    }

    info!(
        "event=project_load individuals={} families={} sources={}",
        bundle.individuals.len(),
        bundle.families.len(),
        bundle.sources.len()
    );
    Ok(bundle)
}

/// The `meta.json` payload, if the container has a readable one.
pub fn metadata(bytes: &[u8]) -> Result<Option<ProjectMetadata>> {
    let entries = read_entries(bytes)?;
    Ok(optional(&entries, META_ENTRY))
}

fn optional<T: DeserializeOwned>(entries: &ContainerEntries, name: &str) -> Option<T> {
    let raw = entries.get(name)?;
    match serde_json::from_slice(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("event=project_load status=ignored entry={name} error={e}");
            None
        }
    }
}

fn apply_layout(bundle: &mut ProjectBundle, layout: &Layout) {
    let mut applied = 0;
    for individual in &mut bundle.individuals {
        if let Some(position) = layout.get(&individual.id) {
            individual.position = Some(*position);
            applied += 1;
        }
    }
    if applied < layout.len() {
        debug!(
            "event=project_load status=orphan_positions count={}",
            layout.len() - applied
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Individual};
    use crate::zip::write_entries;
    use uuid::Uuid;

    fn individual(given: &str, position: Option<LayoutPosition>) -> Individual {
        Individual {
            id: Uuid::new_v4(),
            given: given.to_string(),
            surname: String::new(),
            gender: Gender::Unknown,
            events: Vec::new(),
            notes: Vec::new(),
            media: Vec::new(),
            position,
        }
    }

    #[test]
    fn positions_live_in_layout_entry() {
        let bundle = ProjectBundle {
            individuals: vec![
                individual("Ann", Some(LayoutPosition { x: 1.5, y: -2.0 })),
                individual("Bob", None),
            ],
            ..Default::default()
        };
        let bytes = save(&bundle, &WriterOptions::deterministic()).unwrap();

        let entries = read_entries(&bytes).unwrap();
        let names: Vec<_> = entries.names().collect();
        assert_eq!(names, vec![DATA_ENTRY, LAYOUT_ENTRY, META_ENTRY]);
        let data = String::from_utf8(entries.get(DATA_ENTRY).unwrap().to_vec()).unwrap();
        assert!(!data.contains("position"));

        assert_eq!(load(&bytes).unwrap(), bundle);
    }

    #[test]
    fn no_positions_no_layout_entry() {
        let bundle = ProjectBundle {
            individuals: vec![individual("Ann", None)],
            ..Default::default()
        };
        let bytes = save(&bundle, &WriterOptions::deterministic()).unwrap();
        assert!(!read_entries(&bytes).unwrap().contains(LAYOUT_ENTRY));
    }

    #[test]
    fn missing_data_entry() {
        let bytes = write_entries(
            &[(META_ENTRY.to_string(), b"{}".to_vec())],
            &WriterOptions::deterministic(),
        )
        .unwrap();
        assert!(matches!(load(&bytes), Err(Error::MissingEntry(name)) if name == DATA_ENTRY));
    }

    #[test]
    fn broken_layout_is_ignored() {
        let bytes = write_entries(
            &[
                (DATA_ENTRY.to_string(), br#"{"individuals":[]}"#.to_vec()),
                (LAYOUT_ENTRY.to_string(), b"not json".to_vec()),
            ],
            &WriterOptions::deterministic(),
        )
        .unwrap();
        assert!(load(&bytes).unwrap().is_empty());
    }

    #[test]
    fn broken_data_is_an_error() {
        let bytes = write_entries(
            &[(DATA_ENTRY.to_string(), b"{".to_vec())],
            &WriterOptions::deterministic(),
        )
        .unwrap();
        assert!(matches!(load(&bytes), Err(Error::Json(_))));
    }

    #[test]
    fn metadata_records_generator_and_time() {
        let options = WriterOptions::deterministic();
        let bytes = save(&ProjectBundle::default(), &options).unwrap();
        let meta = metadata(&bytes).unwrap().unwrap();
        assert_eq!(meta.format_version, FORMAT_VERSION);
        assert_eq!(meta.generator, "treeport");
        assert_eq!(Some(meta.saved_at), options.modified);
    }
}
