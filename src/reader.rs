use crate::checksum::checksum;
use crate::chunk::{Chunk, ChunkSequence, ChunkTag};
use crate::config::ConvertConfig;
use crate::error::StructuralError;

const LENGTH_SIZE: usize = 4;
const TAG_SIZE: usize = 4;
const CRC_SIZE: usize = 4;

/// Size of the smallest possible chunk on the wire.
pub const MIN_CHUNK_SIZE: usize = LENGTH_SIZE + TAG_SIZE + CRC_SIZE;

/// Splits the bytes following the PNG signature into chunks.
///
/// Parsing stops at (and includes) the first IEND chunk; anything after it is ignored.
pub struct ChunkReader<'a> {
    buffer: &'a [u8],
    offset: usize,
    max_chunks: usize,
    max_chunk_length: usize,
    verify_crc: bool,
}

impl<'a> ChunkReader<'a> {
    /// Creates a reader over `buffer`, which must start right after the signature.
    pub fn new(buffer: &'a [u8], config: &ConvertConfig) -> Self {
        ChunkReader {
            buffer,
            offset: 0,
            max_chunks: config.max_chunks,
            max_chunk_length: config.max_chunk_length,
            verify_crc: config.verify_crc,
        }
    }

    /// Parses chunks up to and including IEND.
    ///
    /// # Errors
    /// * [`StructuralError::MissingEndMarker`] if `max_chunks` chunks were read without an IEND.
    /// * [`StructuralError::ChunkTooLarge`] if a length field exceeds `max_chunk_length`.
    /// * [`StructuralError::Truncated`] if the buffer ends inside a chunk.
    /// * [`StructuralError::ChecksumMismatch`] if crc verification is enabled and fails.
    pub fn parse(mut self) -> Result<ChunkSequence, StructuralError> {
        let mut chunks = ChunkSequence::new();

        while chunks.len() < self.max_chunks {
            let index = chunks.len();
            let chunk = self.read_chunk(index)?;
            log::debug!(
                "Found chunk {index}: {}, length {}, crc {:08x}",
                chunk.tag(),
                chunk.length(),
                chunk.crc()
            );

            let is_end = chunk.tag().is_end_marker();
            chunks.push(chunk);
            if is_end {
                return Ok(chunks);
            }
        }

        Err(StructuralError::MissingEndMarker {
            max_chunks: self.max_chunks,
        })
    }

    fn read_chunk(&mut self, index: usize) -> Result<Chunk, StructuralError> {
        let length = u32::from_be_bytes(self.take_array(index)?);
        let tag = ChunkTag::new(self.take_array(index)?);

        if length as usize > self.max_chunk_length {
            return Err(StructuralError::ChunkTooLarge {
                index,
                tag,
                length,
                max_length: self.max_chunk_length,
            });
        }

        let payload = self.take(index, length as usize)?.to_vec();
        let declared = u32::from_be_bytes(self.take_array(index)?);

        if self.verify_crc {
            let computed = checksum(tag, &payload);
            if computed != declared {
                return Err(StructuralError::ChecksumMismatch {
                    index,
                    tag,
                    declared,
                    computed,
                });
            }
        }

        Ok(Chunk::from_wire(tag, length, payload, declared))
    }

    fn take(&mut self, index: usize, needed: usize) -> Result<&'a [u8], StructuralError> {
        let available = self.buffer.len() - self.offset;
        if needed > available {
            return Err(StructuralError::Truncated {
                index,
                offset: self.offset,
                needed,
                available,
            });
        }
        let buffer = self.buffer;
        let bytes = &buffer[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, index: usize) -> Result<[u8; N], StructuralError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(index, N)?);
        Ok(array)
    }
}
