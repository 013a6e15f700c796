//! Converts Apple "CgBI" PNG files into standard PNG files.
//!
//! CgBI images store IDAT data as a headerless deflate stream and carry a
//! private `CgBI` chunk. Conversion reads the chunk stream, re-deflates each
//! IDAT payload into a zlib stream, and writes everything back without the
//! `CgBI` chunk. Channel order is left untouched.
//!
//! # Example
//!
//! ```
//! use fixpng::{check_signature, ConvertConfig, PNG_SIGNATURE};
//!
//! assert!(check_signature(&PNG_SIGNATURE).is_ok());
//! assert!(check_signature(b"GIF89a..").is_err());
//! let _config = ConvertConfig::default().with_max_chunks(64);
//! ```
pub mod checksum;
pub mod chunk;
pub mod codec;
pub mod config;
pub mod error;
pub mod processor;
pub mod reader;
pub mod writer;

pub use chunk::{Chunk, ChunkSequence, ChunkTag};
pub use config::{ConvertConfig, PixelDataPolicy};
pub use error::{CompressionError, ConfigError, ConvertError, InputFormatError, StructuralError};
pub use processor::ChunkProcessor;
pub use reader::ChunkReader;
pub use writer::ChunkWriter;

/// The eight bytes every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// What a conversion did, chunk by chunk.
///
/// # Fields
///
/// * `chunks_read` - Chunks parsed, up to and including IEND.
/// * `recompressed` - IDAT payloads rewritten as zlib streams.
/// * `merged` - IDAT chunks joined into the first one under [`PixelDataPolicy::Concatenate`].
/// * `private_dropped` - `CgBI` chunks left out of the output.
/// * `duplicates_dropped` - IDAT chunks left out after the first one.
/// * `chunks_written` - Chunks in the output, IEND included.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub chunks_read: usize,
    pub recompressed: usize,
    pub merged: usize,
    pub private_dropped: usize,
    pub duplicates_dropped: usize,
    pub chunks_written: usize,
}

/// Checks that `bytes` starts with the PNG signature.
pub fn check_signature(bytes: &[u8]) -> Result<(), InputFormatError> {
    if bytes.len() < PNG_SIGNATURE.len() {
        return Err(InputFormatError::TooShort {
            actual_size: bytes.len(),
            required_size: PNG_SIGNATURE.len(),
        });
    }
    if bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(InputFormatError::BadSignature);
    }
    Ok(())
}

/// Converts a whole CgBI file held in memory into standard PNG bytes.
pub fn convert(bytes: &[u8], config: &ConvertConfig) -> Result<Vec<u8>, ConvertError> {
    convert_with_report(bytes, config).map(|(output, _)| output)
}

/// Like [`convert`], also returning what was changed.
///
/// # Errors
/// Fails on the first error of any stage; no output is produced in that case.
pub fn convert_with_report(
    bytes: &[u8],
    config: &ConvertConfig,
) -> Result<(Vec<u8>, ConversionReport), ConvertError> {
    config.validate()?;
    check_signature(bytes)?;

    let mut chunks = ChunkReader::new(&bytes[PNG_SIGNATURE.len()..], config).parse()?;
    let chunks_read = chunks.len();

    let processed = ChunkProcessor::from_config(config).process(&mut chunks)?;

    let mut output = Vec::new();
    let written = ChunkWriter.write_to(&chunks, &mut output)?;

    let report = ConversionReport {
        chunks_read,
        recompressed: processed.recompressed,
        merged: processed.merged,
        private_dropped: written.private_dropped,
        duplicates_dropped: written.duplicates_dropped,
        chunks_written: written.written,
    };
    log::debug!("Conversion report: {report:?}");
    Ok((output, report))
}
