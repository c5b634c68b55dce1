//! ZIP project container reading and writing.
//!
//! The project save format is a plain ZIP archive holding a few JSON members.
//! Everything needed to produce and consume it lives here, on top of raw
//! DEFLATE and CRC32 primitives.
//!
//! ## Architecture
//!
//! - [`compression`]: raw DEFLATE compress/inflate and CRC32
//! - [`structures`]: ZIP format records (EOCD, central and local headers)
//! - [`reader`]: locate the EOCD, walk the central directory, extract payloads
//! - [`writer`]: emit local headers, the central directory and the EOCD
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Standard single-disk ZIP (PKZIP APPNOTE 6.3.x compatible)
//! - STORED (no compression) and DEFLATE methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No ZIP64; writing fails past 4 GiB or 65535 entries
//! - Other compression methods are surfaced as raw bytes

pub mod compression;
mod entries;
mod reader;
mod structures;
mod writer;

pub use entries::ContainerEntries;
pub use reader::{find_eocd, list_entries, payload_range, read_entries};
pub use structures::*;
pub use writer::{ContainerWriter, WriterOptions, write_entries};
