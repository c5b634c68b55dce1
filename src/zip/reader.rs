//! In-memory ZIP container reader.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. Walk the Central Directory to get metadata for all entries
//! 3. For each entry, jump to its Local File Header, skip its own name and
//!    extra field, and slice out the compressed payload
//!
//! Only the EOCD is mandatory. Every other structural problem is confined to
//! the entry it occurs in: that entry is logged and skipped.

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace, warn};
use std::io::Cursor;
use std::ops::Range;

use crate::error::{Error, Result};

use super::compression;
use super::entries::ContainerEntries;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Find and parse the End of Central Directory record.
///
/// Tries the no-comment position first, then scans backwards over the
/// largest window a comment could occupy.
///
/// # Returns
///
/// A tuple of (EOCD record, offset of EOCD in the buffer), or `None` when no
/// signature with a consistent comment length exists.
pub fn find_eocd(data: &[u8]) -> Option<(EndOfCentralDirectory, usize)> {
    if data.len() < EndOfCentralDirectory::SIZE {
        return None;
    }

    let last = data.len() - EndOfCentralDirectory::SIZE;
    if &data[last..last + 4] == EndOfCentralDirectory::SIGNATURE
        && data[last + 20..last + 22] == [0, 0]
    {
        return EndOfCentralDirectory::from_bytes(&data[last..]).map(|eocd| (eocd, last));
    }

    let floor = last.saturating_sub(MAX_COMMENT_SIZE);
    for i in (floor..=last).rev() {
        if &data[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
            continue;
        }
        let comment_len = u16::from_le_bytes([data[i + 20], data[i + 21]]) as usize;
        if comment_len <= data.len() - i - EndOfCentralDirectory::SIZE {
            if let Some(eocd) = EndOfCentralDirectory::from_bytes(&data[i..]) {
                return Some((eocd, i));
            }
        }
    }

    None
}

/// List every entry recorded in the central directory.
///
/// # Errors
///
/// Returns [`Error::InvalidContainer`] only when the EOCD cannot be located.
/// Malformed central directory records are skipped.
pub fn list_entries(data: &[u8]) -> Result<Vec<ZipFileEntry>> {
    let (eocd, eocd_offset) = find_eocd(data)
        .ok_or_else(|| Error::InvalidContainer("End of Central Directory not found".into()))?;

    let cd_start = eocd.cd_offset as usize;
    if cd_start > eocd_offset {
        warn!(
            "event=container_read status=bad_cd_offset cd_offset={} eocd_offset={}",
            cd_start, eocd_offset
        );
        return Ok(Vec::new());
    }

    // The EOCD offset bounds the directory even when cd_size lies.
    let directory = &data[cd_start..eocd_offset];
    let mut cursor = Cursor::new(directory);
    let mut entries = Vec::with_capacity(eocd.total_entries as usize);

    for index in 0..eocd.total_entries {
        let record_start = cursor.position() as usize;
        match ZipFileEntry::read_central(&mut cursor) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                warn!(
                    "event=container_read status=skip_cd_record index={} offset={} error={}",
                    index,
                    cd_start + record_start,
                    err
                );
                match next_signature(directory, record_start + 1, CDFH_SIGNATURE) {
                    Some(pos) => cursor.set_position(pos as u64),
                    None => break,
                }
            }
        }
    }

    Ok(entries)
}

/// Locate the compressed payload of an entry inside `data`.
///
/// The local header's name and extra field lengths may differ from the
/// central directory's, so they are read from the local header itself.
pub fn payload_range(data: &[u8], entry: &ZipFileEntry) -> Option<Range<usize>> {
    let lfh_offset = usize::try_from(entry.lfh_offset).ok()?;
    let header = data.get(lfh_offset..lfh_offset.checked_add(LFH_SIZE)?)?;
    if &header[0..4] != LFH_SIGNATURE {
        return None;
    }

    let mut cursor = Cursor::new(header);
    cursor.set_position(26); // Offset to filename length field
    let file_name_length = cursor.read_u16::<LittleEndian>().ok()? as usize;
    let extra_field_length = cursor.read_u16::<LittleEndian>().ok()? as usize;

    let start = lfh_offset + LFH_SIZE + file_name_length + extra_field_length;
    let end = start.checked_add(usize::try_from(entry.compressed_size).ok()?)?;
    if end > data.len() {
        return None;
    }
    Some(start..end)
}

/// Read and decompress every file entry in the container.
///
/// # Errors
///
/// Returns [`Error::InvalidContainer`] only when the EOCD cannot be located.
/// Entries with a bad local header, an out-of-bounds payload, a corrupt
/// DEFLATE stream or a CRC mismatch are logged and skipped. Entries using an
/// unsupported compression method are returned as their raw bytes.
pub fn read_entries(data: &[u8]) -> Result<ContainerEntries> {
    let listed = list_entries(data)?;
    let mut entries = ContainerEntries::new();

    for entry in listed.iter().filter(|e| !e.is_directory) {
        let Some(range) = payload_range(data, entry) else {
            warn!(
                "event=container_read status=skip_entry name={} reason=bad_local_header lfh_offset={}",
                entry.file_name, entry.lfh_offset
            );
            continue;
        };
        trace!(
            "event=container_read name={} payload_offset={} compressed_size={}",
            entry.file_name, range.start, entry.compressed_size
        );

        let raw = &data[range];
        let payload = match entry.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                match compression::inflate(raw, entry.uncompressed_size) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!(
                            "event=container_read status=skip_entry name={} reason=inflate error={}",
                            entry.file_name, err
                        );
                        continue;
                    }
                }
            }
            CompressionMethod::Unknown(method) => {
                warn!(
                    "event=container_read status=raw_entry name={} method={}",
                    entry.file_name, method
                );
                entries.insert(entry.file_name.clone(), raw.to_vec());
                continue;
            }
        };

        let actual = compression::crc32(&payload);
        if actual != entry.crc32 {
            warn!(
                "event=container_read status=skip_entry name={} reason=crc_mismatch expected={:#010x} actual={:#010x}",
                entry.file_name, entry.crc32, actual
            );
            continue;
        }

        if !entries.insert(entry.file_name.clone(), payload) {
            debug!(
                "event=container_read status=duplicate_name name={}",
                entry.file_name
            );
        }
    }

    Ok(entries)
}

fn next_signature(haystack: &[u8], from: usize, signature: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(signature.len())
        .position(|w| w == signature)
        .map(|pos| from + pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::writer::{WriterOptions, write_entries};

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let owned: Vec<(String, Vec<u8>)> = entries
            .iter()
            .map(|(n, d)| (n.to_string(), d.to_vec()))
            .collect();
        write_entries(&owned, &WriterOptions::deterministic()).unwrap()
    }

    #[test]
    fn empty_buffer_is_invalid() {
        assert!(matches!(
            read_entries(&[]),
            Err(Error::InvalidContainer(_))
        ));
        assert!(matches!(
            read_entries(b"NAMEJohn /Smith/ and nothing zip-like here"),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn finds_eocd_behind_comment() {
        let mut data = archive(&[("a.txt", b"hello")]);
        let eocd_at = data.len() - EndOfCentralDirectory::SIZE;
        data[eocd_at + 20..eocd_at + 22].copy_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(b"note");

        let (_, offset) = find_eocd(&data).unwrap();
        assert_eq!(offset, eocd_at);
        let entries = read_entries(&data).unwrap();
        assert_eq!(entries.get("a.txt"), Some(&b"hello"[..]));
    }

    #[test]
    fn corrupt_local_header_skips_only_that_entry() {
        let mut data = archive(&[("first", b"one"), ("second", b"two")]);
        // First local header sits at offset 0.
        data[0] = b'X';

        let entries = read_entries(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("second"), Some(&b"two"[..]));
    }

    #[test]
    fn corrupt_central_record_skips_only_that_entry() {
        let data = archive(&[("first", b"one"), ("second", b"two")]);
        let (eocd, _) = find_eocd(&data).unwrap();
        let mut data = data;
        data[eocd.cd_offset as usize] = b'X';

        let entries = read_entries(&data).unwrap();
        assert_eq!(entries.names().collect::<Vec<_>>(), vec!["second"]);
    }

    #[test]
    fn crc_mismatch_skips_entry() {
        let mut data = archive(&[("a.txt", b"payload")]);
        // Stored payload starts right after the 30-byte header and 5-byte name.
        data[LFH_SIZE + 5] ^= 0xFF;

        let entries = read_entries(&data).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn unknown_method_surfaces_raw_bytes() {
        let mut data = archive(&[("a.bin", b"raw!")]);
        // Patch method to 12 (bzip2) in both the local and the central header.
        data[8..10].copy_from_slice(&12u16.to_le_bytes());
        let (eocd, _) = find_eocd(&data).unwrap();
        let cd = eocd.cd_offset as usize;
        data[cd + 10..cd + 12].copy_from_slice(&12u16.to_le_bytes());

        let entries = read_entries(&data).unwrap();
        assert_eq!(entries.get("a.bin"), Some(&b"raw!"[..]));
    }

    #[test]
    fn listing_reports_methods_and_sizes() {
        let big = vec![b'a'; 4096];
        let data = archive(&[("big", &big), ("tiny", b"x")]);

        let listed = list_entries(&data).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].file_name, "big");
        assert_eq!(listed[0].compression_method, CompressionMethod::Deflate);
        assert_eq!(listed[0].uncompressed_size, 4096);
        assert!(listed[0].compressed_size < 4096);
        assert_eq!(listed[1].compression_method, CompressionMethod::Stored);
        assert_eq!(listed[1].lfh_offset as usize, LFH_SIZE + 3 + listed[0].compressed_size as usize);
    }
}
