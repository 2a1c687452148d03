//! .nhx file writer

use crate::format::{IndexFile, IndexMetadata, StoredBucket};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub(crate) const CRC64: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);

pub struct IndexWriter {
    compression_level: i32,
}

impl IndexWriter {
    pub fn new() -> Self {
        Self {
            compression_level: 3,
        }
    }

    /// Use a specific zstd level; 0 disables compression.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Write .nhx file
    pub fn write(&self, path: &Path, index_file: &IndexFile) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create index file: {}", path.display()))?;

        let mut writer = BufWriter::new(file);

        let payload = encode_payload(&index_file.metadata, &index_file.buckets)?;

        let mut header = index_file.header.clone();
        header.payload_size = payload.len() as u64;

        let stored = if self.compression_level > 0 {
            header.set_compressed(true);
            zstd::encode_all(payload.as_slice(), self.compression_level)
                .context("Failed to compress index payload")?
        } else {
            header.set_compressed(false);
            payload
        };

        header.payload_size_stored = stored.len() as u64;
        header.checksum = CRC64.checksum(&stored);

        writer.write_all(&header.to_bytes())?;
        writer.write_all(&stored)?;
        writer.flush()?;

        Ok(())
    }
}

impl Default for IndexWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_payload(metadata: &IndexMetadata, buckets: &[StoredBucket]) -> Result<Vec<u8>> {
    bincode::serialize(&(metadata, buckets)).context("Failed to encode index payload")
}
