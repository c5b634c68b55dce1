//! Heuristic decoder for the undocumented legacy genealogy export.
//!
//! The format's record layout is unknown. What survives in the byte stream
//! is a sequence of short record tokens (`P12`, `F3`, `S1`) and uppercase
//! field tags with their text values, buried in binary padding. The decoder
//! recovers structure from those remnants only.
//!
//! ## Pipeline
//!
//! 1. [`text::clean_bytes`]: drop NUL padding
//! 2. decode as UTF-8; if that yields no named person and the stream has
//!    high-bit bytes, retry with a legacy Cyrillic code page
//! 3. [`sources::scan_global_sources`]: numbered shared sources, whole text
//! 4. [`text::strip_noise_blocks`]: cut submitter/author blocks
//! 5. [`sections::sectionize`]: split into person/family/source bodies
//! 6. [`person::parse_person_body`] / [`family::parse_family_body`]
//!
//! Decoding never fails. Input without any recognizable record yields an
//! empty [`LegacyDecode`], letting the caller try another interpretation.
//!
//! The acceptance heuristics (token shapes, lookahead window, noise markers)
//! were tuned on sample exports and may over- or under-accept on unseen
//! files.

pub mod family;
pub mod fields;
pub mod person;
pub mod records;
pub mod rules;
pub mod sections;
pub mod sources;
pub mod text;

use encoding_rs::Encoding;
use log::{debug, info};
use std::collections::BTreeMap;

pub use records::{
    CitationRecord, DraftArena, EventRecord, FamilyRecord, MediaRecord, PersonRecord, Sex,
};
pub use sections::{RecordKind, Section};
pub use text::TextEncoding;

use sections::sectionize;
use text::{clean_bytes, strip_noise_blocks};

/// Tunables for [`decode_with`].
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Characters after a candidate token searched for an expected tag.
    pub lookahead: usize,
    /// Submitter/author markers; text outside them is discarded.
    pub noise_markers: Option<(String, String)>,
    /// Single-byte code page tried when UTF-8 yields no names.
    pub fallback_encoding: &'static Encoding,
    /// Characters before a bare media path searched for its title.
    pub media_title_window: usize,
    /// Number of global source slots.
    pub max_global_sources: u8,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            lookahead: 200,
            noise_markers: Some(("SUBM".to_string(), "AUTH".to_string())),
            fallback_encoding: encoding_rs::WINDOWS_1251,
            media_title_window: fields::DEFAULT_MEDIA_TITLE_WINDOW,
            max_global_sources: sources::MAX_GLOBAL_SOURCES,
        }
    }
}

/// Everything recovered from one legacy file.
#[derive(Debug, Clone)]
pub struct LegacyDecode {
    pub persons: DraftArena<PersonRecord>,
    pub families: DraftArena<FamilyRecord>,
    /// Raw text of global sources by slot number.
    pub common_sources: BTreeMap<u8, String>,
    /// Text encoding the records were decoded with.
    pub encoding: TextEncoding,
}

impl LegacyDecode {
    fn empty(encoding: TextEncoding) -> Self {
        Self {
            persons: DraftArena::new(),
            families: DraftArena::new(),
            common_sources: BTreeMap::new(),
            encoding,
        }
    }

    /// No person and no family record was recognized.
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.families.is_empty()
    }

    /// Quality signal for choosing between decodings: persons with a name.
    pub fn named_count(&self) -> usize {
        self.persons.iter().filter(|(_, p)| p.has_name()).count()
    }
}

/// Decode a legacy export with default options.
pub fn decode(bytes: &[u8]) -> LegacyDecode {
    decode_with(bytes, &DecoderOptions::default())
}

/// Decode a legacy export.
pub fn decode_with(bytes: &[u8], options: &DecoderOptions) -> LegacyDecode {
    let cleaned = clean_bytes(bytes);

    let primary = decode_as(&cleaned, TextEncoding::Utf8, options);
    if primary.named_count() > 0 || !cleaned.iter().any(|&b| b >= 0x80) {
        return finish(primary);
    }

    let fallback = decode_as(&cleaned, TextEncoding::Legacy(options.fallback_encoding), options);
    debug!(
        "event=legacy_decode status=encoding_retry encoding={} named={}",
        fallback.encoding.name(),
        fallback.named_count()
    );
    if fallback.named_count() > 0 {
        finish(fallback)
    } else {
        finish(primary)
    }
}

fn finish(decoded: LegacyDecode) -> LegacyDecode {
    info!(
        "event=legacy_decode status=ok encoding={} persons={} families={} sources={}",
        decoded.encoding.name(),
        decoded.persons.len(),
        decoded.families.len(),
        decoded.common_sources.len()
    );
    decoded
}

fn decode_as(cleaned: &[u8], encoding: TextEncoding, options: &DecoderOptions) -> LegacyDecode {
    let text = encoding.decode(cleaned);
    let mut decoded = LegacyDecode::empty(encoding);

    decoded.common_sources =
        sources::scan_global_sources(&text, options.lookahead, options.max_global_sources);

    let records = match &options.noise_markers {
        Some((open, close)) => strip_noise_blocks(&text, open, close),
        None => text.as_str(),
    };

    for section in sectionize(records, options.lookahead) {
        match section.kind {
            RecordKind::Person => decoded.persons.upsert(
                section.token,
                person::parse_person_body(section.body, options.media_title_window),
            ),
            RecordKind::Family => decoded.families.upsert(
                section.token,
                family::parse_family_body(section.body, options.media_title_window),
            ),
            RecordKind::Source => {}
        }
    }

    decoded
}
