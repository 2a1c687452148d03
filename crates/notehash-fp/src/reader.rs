//! .nhx file reader

use crate::format::{FormatError, IndexFile, IndexHeader, IndexMetadata, StoredBucket, HEADER_SIZE};
use crate::writer::CRC64;
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

pub struct IndexReader;

impl IndexReader {
    /// Read .nhx file
    pub fn read(path: &Path) -> Result<IndexFile> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open index file: {}", path.display()))?;

        // SAFETY: the map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to map index file: {}", path.display()))?;

        Self::read_bytes(&mmap).with_context(|| format!("Invalid index file: {}", path.display()))
    }

    /// Parse an in-memory .nhx image
    pub fn read_bytes(bytes: &[u8]) -> Result<IndexFile> {
        let header = IndexHeader::from_bytes(bytes)?;

        let end = usize::try_from(header.payload_size_stored)
            .ok()
            .and_then(|size| HEADER_SIZE.checked_add(size))
            .unwrap_or(usize::MAX);
        if bytes.len() < end {
            return Err(FormatError::Truncated {
                expected: end,
                actual: bytes.len(),
            }
            .into());
        }
        let stored = &bytes[HEADER_SIZE..end];

        let actual = CRC64.checksum(stored);
        if actual != header.checksum {
            return Err(FormatError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            }
            .into());
        }

        let payload = if header.is_compressed() {
            zstd::decode_all(stored).context("Failed to decompress index payload")?
        } else {
            stored.to_vec()
        };

        let (metadata, buckets): (IndexMetadata, Vec<StoredBucket>) =
            bincode::deserialize(&payload).context("Failed to decode index payload")?;

        Ok(IndexFile {
            header,
            metadata,
            buckets,
        })
    }
}
