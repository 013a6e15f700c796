mod raw_decoder;
mod zlib_encoder;

use crate::error::CompressionError;
pub use raw_decoder::RawDeflateDecoder;
pub use zlib_encoder::ZlibEncoder;

/// Decompresses the pixel-data stream of a source chunk.
pub trait Decoder {
    /// Inflates `data` into at most `capacity` bytes.
    ///
    /// # Errors
    /// Output longer than `capacity` is a [`CompressionError::CapacityExceeded`],
    /// never a silently truncated result.
    fn decode(&self, data: &[u8], capacity: usize) -> Result<Vec<u8>, CompressionError>;
}

/// Compresses pixel data into the form written to the output.
pub trait Encoder {
    /// Deflates `data` into at most `capacity` bytes.
    fn encode(&self, data: &[u8], capacity: usize) -> Result<Vec<u8>, CompressionError>;
}

/// Allocates a zeroed scratch buffer, reporting allocation failure instead of aborting.
fn scratch_buffer(capacity: usize) -> Result<Vec<u8>, CompressionError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(capacity)
        .map_err(|_| CompressionError::ScratchAllocation { capacity })?;
    buffer.resize(capacity, 0);
    Ok(buffer)
}
