//! Field extractors shared by person and family bodies: event sub-blocks,
//! notes and media.

use once_cell::sync::Lazy;
use regex::Regex;

use super::records::{CitationRecord, EventRecord, MediaRecord};
use super::text::{
    clean_value, next_top_level_tag, raw_tag_values, retreat_chars, tag_value, value_from,
};

/// How far before a bare file path the fallback media scan looks for a title.
pub const DEFAULT_MEDIA_TITLE_WINDOW: usize = 160;

static MEDIA_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:[a-z]:)?[\w\\/.\-]+\.(?:jpe?g|png|gif|bmp|tiff?|pdf|djvu)\b")
        .expect("valid media path regex")
});

/// The sub-block following `tag`, up to the next top-level tag.
pub fn event_block<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let start = body.find(tag)? + tag.len();
    let end = next_top_level_tag(body, start).unwrap_or(body.len());
    Some(&body[start..end])
}

/// Date, place and citations of the event introduced by `tag`.
///
/// `SOUR`/`PAGE` are read from inside the same bounded sub-block, so a page
/// always stays with the citation (and event) it was written under. Events
/// without any data are reported as absent.
pub fn parse_event(body: &str, tag: &str) -> Option<EventRecord> {
    let block = event_block(body, tag)?;
    let event = EventRecord {
        date: tag_value(block, "DATE"),
        place: tag_value(block, "PLAC"),
        citations: parse_citations(block),
    };
    (!event.is_empty()).then_some(event)
}

/// Every `SOUR` in `block`, each paired with the first `PAGE` before the
/// next `SOUR`.
pub fn parse_citations(block: &str) -> Vec<CitationRecord> {
    let sources = raw_tag_values(block, "SOUR");
    sources
        .iter()
        .enumerate()
        .filter_map(|(i, (pos, raw))| {
            let scope_end = sources.get(i + 1).map(|(next, _)| *next).unwrap_or(block.len());
            let scope = &block[*pos..scope_end];
            let citation = CitationRecord {
                text: clean_value(raw),
                page: tag_value(scope, "PAGE"),
            };
            (citation.text.is_some() || citation.page.is_some()).then_some(citation)
        })
        .collect()
}

/// Every `NOTE` block, cleaned of binary artifacts.
pub fn parse_notes(body: &str) -> Vec<String> {
    raw_tag_values(body, "NOTE")
        .into_iter()
        .filter_map(|(_, raw)| clean_value(raw))
        .filter_map(|note| {
            let stripped = strip_leading_artifacts(&note);
            (!stripped.is_empty()).then(|| stripped.to_string())
        })
        .collect()
}

/// Drop up to two leading stray characters left over from the binary layout:
/// a lowercase ASCII letter or digit that is directly followed by whitespace
/// or by an uppercase letter (`"jHe was"`, `"x Farmer"`).
pub fn strip_leading_artifacts(note: &str) -> &str {
    let mut rest = note;
    for _ in 0..2 {
        let mut chars = rest.chars();
        let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
            break;
        };
        let stray = (first.is_ascii_lowercase() || first.is_ascii_digit())
            && (second.is_whitespace() || second.is_uppercase());
        if !stray {
            break;
        }
        rest = rest[first.len_utf8()..].trim_start();
    }
    rest
}

/// Media references: `OBJE` blocks when present, otherwise bare file paths
/// paired with the nearest preceding `TITL` within `title_window` characters.
pub fn parse_media(body: &str, title_window: usize) -> Vec<MediaRecord> {
    let blocks = media_blocks(body);
    if !blocks.is_empty() {
        return blocks;
    }
    scan_media_paths(body, title_window)
}

fn media_blocks(body: &str) -> Vec<MediaRecord> {
    let starts: Vec<usize> = body.match_indices("OBJE").map(|(pos, _)| pos).collect();
    starts
        .iter()
        .filter_map(|&pos| {
            let start = pos + "OBJE".len();
            let end = next_top_level_tag(body, start).unwrap_or(body.len());
            let block = &body[start..end];
            let media = MediaRecord {
                format: tag_value(block, "FORM"),
                title: tag_value(block, "TITL"),
                file: tag_value(block, "FILE").map(normalize_path),
            };
            (media.format.is_some() || media.title.is_some() || media.file.is_some())
                .then_some(media)
        })
        .collect()
}

fn scan_media_paths(body: &str, title_window: usize) -> Vec<MediaRecord> {
    let mut found: Vec<MediaRecord> = Vec::new();
    for m in MEDIA_PATH_RE.find_iter(body) {
        // The path regex happily eats a glued-on tag ("photoFILEa.jpg").
        let mut start = m.start();
        let text = m.as_str();
        if let Some(i) = text.rfind("FILE") {
            start += i + "FILE".len();
        }
        let path = normalize_path(body[start..m.end()].to_string());
        if path.is_empty() || found.iter().any(|f| f.file.as_deref() == Some(path.as_str())) {
            continue;
        }

        let window_start = retreat_chars(body, start, title_window);
        let window = &body[window_start..start];
        let title = window
            .rfind("TITL")
            .map(|i| value_from(&body[..start], window_start + i + "TITL".len()))
            .and_then(clean_value);

        found.push(MediaRecord {
            format: extension_of(&path),
            title,
            file: Some(path),
        });
    }
    found
}

fn normalize_path(path: String) -> String {
    path.trim().replace('\\', "/")
}

fn extension_of(path: &str) -> Option<String> {
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
}
