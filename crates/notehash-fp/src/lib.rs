//! Notehash fingerprint index file formats
//!
//! Three interchangeable on-disk encodings of the same inverted index:
//! pretty JSON, BSON, and a compressed binary `.nhx` file.

pub mod format;
pub mod json_format;
pub mod reader;
pub mod writer;

pub use format::{
    FormatError, IndexFile, IndexHeader, IndexMetadata, StoredBucket, StoredEntry, HEADER_SIZE,
    MAGIC, VERSION,
};
pub use json_format::IndexJsonFile;
pub use reader::IndexReader;
pub use writer::IndexWriter;
