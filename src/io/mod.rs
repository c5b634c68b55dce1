//! Byte sources for input files.
//!
//! The decoding core works on in-memory buffers. This layer fetches those
//! buffers from a local path or an HTTP(S) URL.

mod http;
mod local;

pub use http::{HttpReader, RetryPolicy};
pub use local::LocalFileReader;

use anyhow::{Result, bail};
use async_trait::async_trait;
use log::debug;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// Returns the number of bytes read; `0` means `offset` is at or past
    /// the end of the source.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

/// Load an entire source into memory.
pub async fn read_all<R: ReadAt + ?Sized>(reader: &R) -> Result<Vec<u8>> {
    let size = usize::try_from(reader.size())?;
    let mut buf = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
        let n = reader.read_at(filled as u64, &mut buf[filled..]).await?;
        if n == 0 {
            bail!("source ended at offset {filled}, expected {size} bytes");
        }
        filled += n;
    }

    debug!("event=read_all bytes={size}");
    Ok(buf)
}
