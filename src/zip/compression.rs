//! Raw DEFLATE and CRC32 primitives used by the container codec.
//!
//! ZIP stores DEFLATE streams without zlib or gzip framing, so everything here
//! goes through flate2's raw `Deflate*` types.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

/// Compute the CRC32 (IEEE, reflected polynomial 0xEDB88320) of a byte slice.
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Compress `data` into a raw DEFLATE stream.
pub fn deflate(data: &[u8], level: Compression) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2 + 64), level);
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflate a raw DEFLATE stream.
///
/// `expected_size` is the uncompressed size declared by the archive. It is
/// used as the output bound: the decoder never produces more than that many
/// bytes, even if the stream itself would.
pub fn inflate(data: &[u8], expected_size: u64) -> std::io::Result<Vec<u8>> {
    let capacity = usize::try_from(expected_size).unwrap_or(0).min(data.len().saturating_mul(1032));
    let mut output = Vec::with_capacity(capacity);
    DeflateDecoder::new(data)
        .take(expected_size)
        .read_to_end(&mut output)?;
    Ok(output)
}
