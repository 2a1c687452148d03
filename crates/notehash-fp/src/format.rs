//! .nhx index file format structures

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Magic bytes for .nhx files: "NHIX"
pub const MAGIC: [u8; 4] = [0x4E, 0x48, 0x49, 0x58];

/// Current format version
pub const VERSION: u16 = 1;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 48;

/// Errors detected while validating an index file
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid index file: magic bytes mismatch")]
    BadMagic,
    #[error("unsupported index file version {0} (expected {VERSION})")]
    UnsupportedVersion(u16),
    #[error("index file truncated: {actual} bytes, need at least {expected}")]
    Truncated { expected: usize, actual: usize },
    #[error("checksum mismatch: header {expected:#018x}, payload {actual:#018x}")]
    ChecksumMismatch { expected: u64, actual: u64 },
}

/// File header (48 bytes fixed size, little-endian)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    /// Magic bytes: "NHIX"
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Flags (bit 0: compressed)
    pub flags: u16,
    /// Number of distinct fingerprint keys
    pub num_keys: u32,
    /// Number of index entries across all keys
    pub num_entries: u64,
    /// Size of payload (uncompressed)
    pub payload_size: u64,
    /// Size of payload as stored (equals payload_size if uncompressed)
    pub payload_size_stored: u64,
    /// CRC64 checksum of the stored payload
    pub checksum: u64,
    /// Reserved
    pub reserved: u32,
}

impl IndexHeader {
    pub fn new(num_keys: u32, num_entries: u64, payload_size: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            num_keys,
            num_entries,
            payload_size,
            payload_size_stored: payload_size,
            checksum: 0,
            reserved: 0,
        }
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & 0x1) != 0
    }

    pub fn set_compressed(&mut self, compressed: bool) {
        if compressed {
            self.flags |= 0x1;
        } else {
            self.flags &= !0x1;
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.flags.to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_keys.to_le_bytes());
        buf[12..20].copy_from_slice(&self.num_entries.to_le_bytes());
        buf[20..28].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[28..36].copy_from_slice(&self.payload_size_stored.to_le_bytes());
        buf[36..44].copy_from_slice(&self.checksum.to_le_bytes());
        buf[44..48].copy_from_slice(&self.reserved.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != MAGIC {
            return Err(FormatError::BadMagic);
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        Ok(Self {
            magic,
            version,
            flags: u16::from_le_bytes([bytes[6], bytes[7]]),
            num_keys: u32::from_le_bytes(le_array(&bytes[8..12])),
            num_entries: u64::from_le_bytes(le_array(&bytes[12..20])),
            payload_size: u64::from_le_bytes(le_array(&bytes[20..28])),
            payload_size_stored: u64::from_le_bytes(le_array(&bytes[28..36])),
            checksum: u64::from_le_bytes(le_array(&bytes[36..44])),
            reserved: u32::from_le_bytes(le_array(&bytes[44..48])),
        })
    }
}

fn le_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

/// Index-level metadata shared by every file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Hash variant used at build time (e.g. "time-diff")
    pub hash_variant: String,
    /// Fan-out factor used at build time
    pub fan_out: u32,
    /// Number of reference files fingerprinted
    pub num_files: u32,
    /// RFC3339 creation timestamp
    pub created_at: String,
}

impl IndexMetadata {
    pub fn new(hash_variant: impl Into<String>, fan_out: u32, num_files: u32) -> Self {
        Self {
            hash_variant: hash_variant.into(),
            fan_out,
            num_files,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One occurrence of a key inside a reference file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub onset: i64,
    pub source: String,
    pub label: String,
}

/// All occurrences of one key, in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBucket {
    pub key: i64,
    pub entries: Vec<StoredEntry>,
}

/// Complete .nhx file structure
#[derive(Debug, Clone)]
pub struct IndexFile {
    pub header: IndexHeader,
    pub metadata: IndexMetadata,
    pub buckets: Vec<StoredBucket>,
}

impl IndexFile {
    /// Build a file from metadata and buckets; header sizes are filled by the writer.
    pub fn new(metadata: IndexMetadata, buckets: Vec<StoredBucket>) -> Self {
        let num_entries = buckets.iter().map(|b| b.entries.len() as u64).sum();
        Self {
            header: IndexHeader::new(buckets.len() as u32, num_entries, 0),
            metadata,
            buckets,
        }
    }
}
