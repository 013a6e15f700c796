use crate::chunk::ChunkTag;
use thiserror::Error;

/// Top-level error of a conversion run.
///
/// Every variant is terminal: the conversion produces no output once any
/// stage fails.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Input format error: {0}")]
    InputFormat(#[from] InputFormatError),

    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Compression error in chunk {index} ({tag}): {source}")]
    Compression {
        /// Position of the offending chunk in the sequence.
        index: usize,
        /// Type tag of the offending chunk.
        tag: ChunkTag,
        #[source]
        source: CompressionError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised before any chunk is parsed.
#[derive(Debug, Error, PartialEq)]
pub enum InputFormatError {
    #[error("Input too short: got {actual_size} bytes, need at least {required_size}")]
    TooShort {
        actual_size: usize,
        required_size: usize,
    },

    #[error("Missing PNG signature")]
    BadSignature,
}

/// Errors in the layout of the chunk stream.
#[derive(Debug, Error, PartialEq)]
pub enum StructuralError {
    #[error("No IEND chunk within the first {max_chunks} chunks")]
    MissingEndMarker { max_chunks: usize },

    #[error("Chunk {index} ({tag}) declares {length} bytes, limit is {max_length}")]
    ChunkTooLarge {
        index: usize,
        tag: ChunkTag,
        length: u32,
        max_length: usize,
    },

    #[error("{tag} payload of {length} bytes does not fit a 32-bit length field")]
    PayloadTooLong { tag: ChunkTag, length: usize },

    #[error("Chunk {index} truncated at offset {offset}: need {needed} bytes, {available} left")]
    Truncated {
        index: usize,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Chunk {index} ({tag}) crc mismatch: declared {declared:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        index: usize,
        tag: ChunkTag,
        declared: u32,
        computed: u32,
    },
}

/// Errors of the inflate/deflate round trip of a single pixel-data chunk.
#[derive(Debug, Error, PartialEq)]
pub enum CompressionError {
    #[error("Output exceeds scratch capacity of {capacity} bytes")]
    CapacityExceeded { capacity: usize },

    #[error("Corrupt deflate stream: {0}")]
    CorruptStream(String),

    #[error("Deflate stream ended after {consumed} bytes without a final block")]
    TruncatedStream { consumed: usize },

    #[error("Failed to allocate {capacity} byte scratch buffer")]
    ScratchAllocation { capacity: usize },

    #[error("Deflate failed: {0}")]
    Deflate(String),
}

/// Errors in user supplied configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}
