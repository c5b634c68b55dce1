//! In-memory ZIP container writer.
//!
//! Output layout, in order:
//! 1. One Local File Header + payload per entry (offsets tracked as written)
//! 2. One Central Directory File Header per entry, in the same order
//! 3. A single End of Central Directory record (single disk, no comment)

use chrono::{Local, NaiveDate, NaiveDateTime};
use flate2::Compression;
use log::{trace, warn};
use std::io;

use super::compression;
use super::structures::*;

/// Knobs for [`ContainerWriter`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// DEFLATE level. Entries that do not shrink are stored instead.
    pub level: Compression,
    /// Timestamp recorded in every header. `None` means "now".
    pub modified: Option<NaiveDateTime>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            level: Compression::default(),
            modified: None,
        }
    }
}

impl WriterOptions {
    /// Options with a fixed 1980-01-01 timestamp so output is byte-stable.
    pub fn deterministic() -> Self {
        Self {
            level: Compression::default(),
            modified: NaiveDate::from_ymd_opt(1980, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        }
    }

    fn dos_timestamp(&self) -> DosDateTime {
        DosDateTime::from_naive(self.modified.unwrap_or_else(|| Local::now().naive_local()))
    }
}

/// Streaming ZIP builder writing into an in-memory buffer.
///
/// ## Example
///
/// ```
/// use treeport::zip::{ContainerWriter, WriterOptions, read_entries};
///
/// let mut writer = ContainerWriter::new(WriterOptions::default());
/// writer.add("data.json", br#"{"a":1}"#)?;
/// let bytes = writer.finish()?;
///
/// let entries = read_entries(&bytes)?;
/// assert_eq!(entries.get("data.json"), Some(&br#"{"a":1}"#[..]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ContainerWriter {
    options: WriterOptions,
    modified: DosDateTime,
    out: Vec<u8>,
    /// Header of each written entry with the offset of its local header
    written: Vec<(EntryHeader, u32)>,
}

impl ContainerWriter {
    pub fn new(options: WriterOptions) -> Self {
        let modified = options.dos_timestamp();
        Self {
            options,
            modified,
            out: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Append one entry.
    ///
    /// The payload is DEFLATE-compressed when that makes it smaller. If the
    /// compressor fails, the entry is stored uncompressed instead.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidInput` when the entry or archive would need ZIP64
    /// (payloads or offsets past 4 GiB, more than 65535 entries, names longer
    /// than 65535 bytes).
    pub fn add(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        if self.written.len() >= u16::MAX as usize {
            return Err(too_large("entry count exceeds 65535"));
        }
        if name.len() > u16::MAX as usize {
            return Err(too_large("file name longer than 65535 bytes"));
        }
        let uncompressed_size =
            u32::try_from(data.len()).map_err(|_| too_large("entry larger than 4 GiB"))?;
        let lfh_offset =
            u32::try_from(self.out.len()).map_err(|_| too_large("archive larger than 4 GiB"))?;

        let crc32 = compression::crc32(data);
        let deflated = match compression::deflate(data, self.options.level) {
            Ok(bytes) if bytes.len() < data.len() => Some(bytes),
            Ok(_) => None,
            Err(err) => {
                warn!(
                    "event=container_write status=stored_fallback name={} error={}",
                    name, err
                );
                None
            }
        };
        let (method, payload) = match deflated.as_deref() {
            Some(bytes) => (CompressionMethod::Deflate, bytes),
            None => (CompressionMethod::Stored, data),
        };

        let header = EntryHeader {
            file_name: name.to_string(),
            flags: if name.is_ascii() { 0 } else { FLAG_UTF8_NAME },
            compression_method: method,
            modified: self.modified,
            crc32,
            compressed_size: payload.len() as u32,
            uncompressed_size,
        };
        header.write_local(&mut self.out)?;
        self.out.extend_from_slice(payload);
        trace!(
            "event=container_write name={} lfh_offset={} method={} size={}",
            name,
            lfh_offset,
            method.as_u16(),
            payload.len()
        );

        self.written.push((header, lfh_offset));
        Ok(())
    }

    /// Emit the central directory and EOCD, returning the archive bytes.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        let cd_offset =
            u32::try_from(self.out.len()).map_err(|_| too_large("archive larger than 4 GiB"))?;
        for (header, lfh_offset) in &self.written {
            header.write_central(*lfh_offset, &mut self.out)?;
        }
        let cd_size = u32::try_from(self.out.len() - cd_offset as usize)
            .map_err(|_| too_large("central directory larger than 4 GiB"))?;

        EndOfCentralDirectory::new(self.written.len() as u16, cd_size, cd_offset)
            .write_to(&mut self.out)?;
        Ok(self.out)
    }
}

/// Package `entries` into a ZIP archive, in order.
pub fn write_entries(entries: &[(String, Vec<u8>)], options: &WriterOptions) -> io::Result<Vec<u8>> {
    let mut writer = ContainerWriter::new(options.clone());
    for (name, data) in entries {
        writer.add(name, data)?;
    }
    writer.finish()
}

fn too_large(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("ZIP64 not supported: {what}"))
}
