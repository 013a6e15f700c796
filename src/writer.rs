use crate::chunk::{Chunk, ChunkSequence};
use crate::PNG_SIGNATURE;
use std::io::{self, Write};

/// Counts of what [`ChunkWriter`] emitted and suppressed.
///
/// # Fields
///
/// * `written` - Chunks serialized, IEND included.
/// * `private_dropped` - `CgBI` chunks left out.
/// * `duplicates_dropped` - IDAT chunks left out because an earlier IDAT was written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub private_dropped: usize,
    pub duplicates_dropped: usize,
}

/// Serializes a chunk sequence as a standard PNG.
///
/// CgBI chunks are never written, only the first IDAT is kept, and nothing follows IEND.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkWriter;

impl ChunkWriter {
    /// Serializes `chunks` into a new buffer.
    pub fn write(&self, chunks: &ChunkSequence) -> io::Result<Vec<u8>> {
        let capacity = PNG_SIGNATURE.len() + chunks.iter().map(Chunk::encoded_len).sum::<usize>();
        let mut output = Vec::with_capacity(capacity);
        self.write_to(chunks, &mut output)?;
        Ok(output)
    }

    /// Serializes `chunks` into `out`, signature first.
    ///
    /// # Arguments
    ///
    /// * `chunks` - Sequence after processing; it is not modified.
    /// * `out` - Destination, flushed once IEND has been written.
    ///
    /// # Returns
    ///
    /// What was written and what was suppressed.
    pub fn write_to<W: Write>(&self, chunks: &ChunkSequence, mut out: W) -> io::Result<WriteSummary> {
        let mut summary = WriteSummary::default();
        let mut wrote_pixel_data = false;

        out.write_all(&PNG_SIGNATURE)?;

        for (index, chunk) in chunks.iter().enumerate() {
            let tag = chunk.tag();

            if tag.is_private() {
                log::warn!("Dropping private chunk {index} ({tag})");
                summary.private_dropped += 1;
                continue;
            }
            if tag.is_pixel_data() {
                if wrote_pixel_data {
                    log::warn!("Dropping duplicate pixel data chunk {index} ({tag})");
                    summary.duplicates_dropped += 1;
                    continue;
                }
                wrote_pixel_data = true;
            }

            write_chunk(&mut out, chunk)?;
            summary.written += 1;

            if tag.is_end_marker() {
                break;
            }
        }

        out.flush()?;
        Ok(summary)
    }
}

fn write_chunk<W: Write>(out: &mut W, chunk: &Chunk) -> io::Result<()> {
    out.write_all(&chunk.length().to_be_bytes())?;
    out.write_all(chunk.tag().as_bytes())?;
    if chunk.length() > 0 {
        out.write_all(chunk.payload())?;
    }
    out.write_all(&chunk.crc().to_be_bytes())
}
