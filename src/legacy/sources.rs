//! Global source table.
//!
//! Up to six shared sources are stored as `S1`..`S6` blocks and cited by
//! number from anywhere in the file. The table is scanned over the whole
//! cleaned text, independently of person/family sectionizing.

use log::debug;
use std::collections::BTreeMap;

use super::sections::{RecordKind, sectionize};
use super::text::clean_value;

/// Highest global source slot number.
pub const MAX_GLOBAL_SOURCES: u8 = 6;

/// Collect the raw text of each numbered global source block.
///
/// The first block seen for a slot wins; slots outside `1..=max` are ignored.
pub fn scan_global_sources(text: &str, lookahead: usize, max: u8) -> BTreeMap<u8, String> {
    let mut table = BTreeMap::new();
    for section in sectionize(text, lookahead) {
        if section.kind != RecordKind::Source {
            continue;
        }
        let Ok(slot) = section.token[1..].parse::<u8>() else {
            continue;
        };
        if slot == 0 || slot > max || table.contains_key(&slot) {
            continue;
        }
        if let Some(raw) = clean_value(section.body) {
            debug!("event=global_source slot={} len={}", slot, raw.len());
            table.insert(slot, raw);
        }
        if table.len() == max as usize {
            break;
        }
    }
    table
}
