use crate::chunk::{ChunkSequence, ChunkTag};
use crate::codec::{Decoder, Encoder, RawDeflateDecoder, ZlibEncoder};
use crate::config::{ConvertConfig, PixelDataPolicy, ENV_PIXEL_DATA_POLICY};
use crate::error::{CompressionError, ConvertError};

/// Counts of what [`ChunkProcessor::process`] changed.
///
/// # Fields
///
/// * `recompressed` - IDAT chunks whose payload was recompressed.
/// * `merged` - IDAT chunks folded into the first one and removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub recompressed: usize,
    pub merged: usize,
}

/// Rewrites the pixel data of a chunk sequence from headerless deflate into zlib.
///
/// With [`PixelDataPolicy::KeepFirst`] each IDAT must hold a complete deflate
/// stream; a stream split over several IDAT chunks fails at its first piece
/// and needs [`PixelDataPolicy::Concatenate`].
///
/// # Type Parameters
///
/// * `D` - Decoder for the source pixel-data stream.
/// * `E` - Encoder producing the output pixel-data stream.
pub struct ChunkProcessor<D: Decoder, E: Encoder> {
    decoder: D,
    encoder: E,
    scratch_capacity: usize,
    policy: PixelDataPolicy,
}

impl ChunkProcessor<RawDeflateDecoder, ZlibEncoder> {
    /// Processor converting CgBI pixel data at the default compression level.
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self::new(RawDeflateDecoder, ZlibEncoder::default(), config)
    }
}

impl<D: Decoder, E: Encoder> ChunkProcessor<D, E> {
    /// Creates a processor from explicit codecs.
    ///
    /// # Arguments
    ///
    /// * `decoder` - Inflates the source IDAT payloads.
    /// * `encoder` - Deflates the pixel data written back.
    /// * `config` - Supplies the scratch capacity and the pixel-data policy.
    pub fn new(decoder: D, encoder: E, config: &ConvertConfig) -> Self {
        ChunkProcessor {
            decoder,
            encoder,
            scratch_capacity: config.scratch_capacity,
            policy: config.pixel_data_policy,
        }
    }

    /// Recompresses every IDAT chunk before IEND in place, leaving all other chunks untouched.
    ///
    /// A chunk is only modified once its new payload is complete, so a failure never
    /// leaves a partially rewritten chunk behind.
    ///
    /// # Errors
    /// [`ConvertError::Compression`] naming the first chunk that failed to inflate or deflate.
    pub fn process(&self, chunks: &mut ChunkSequence) -> Result<ProcessSummary, ConvertError> {
        match self.policy {
            PixelDataPolicy::KeepFirst => self.recompress_each(chunks),
            PixelDataPolicy::Concatenate => self.recompress_joined(chunks),
        }
    }

    fn recompress_each(&self, chunks: &mut ChunkSequence) -> Result<ProcessSummary, ConvertError> {
        let mut summary = ProcessSummary::default();

        let end = chunks.end_index();
        let pixel_chunks = chunks
            .iter()
            .take(end)
            .filter(|chunk| chunk.tag().is_pixel_data())
            .count();

        for (index, chunk) in chunks.iter_mut().enumerate() {
            let tag = chunk.tag();
            if tag.is_end_marker() {
                break;
            }
            if !tag.is_pixel_data() {
                continue;
            }

            let recompressed = self.recompress(chunk.payload()).map_err(|source| {
                if pixel_chunks > 1 && matches!(source, CompressionError::TruncatedStream { .. }) {
                    log::warn!(
                        "Chunk {index} ({tag}) holds part of a split stream; \
                         set {}=concatenate to join the {pixel_chunks} IDAT chunks",
                        ENV_PIXEL_DATA_POLICY
                    );
                }
                ConvertError::Compression { index, tag, source }
            })?;

            log::info!(
                "Recompressed chunk {index} ({tag}): {} -> {} bytes",
                chunk.length(),
                recompressed.len()
            );
            chunk.replace_payload(recompressed)?;
            log::debug!("Chunk {index} ({tag}) new crc {:08x}", chunk.crc());
            summary.recompressed += 1;
        }

        Ok(summary)
    }

    /// Treats all IDAT payloads before IEND as one stream, stored in the first IDAT.
    fn recompress_joined(&self, chunks: &mut ChunkSequence) -> Result<ProcessSummary, ConvertError> {
        let end = chunks.end_index();
        let pixel_indices: Vec<usize> = chunks
            .iter()
            .take(end)
            .enumerate()
            .filter(|(_, chunk)| chunk.tag().is_pixel_data())
            .map(|(index, _)| index)
            .collect();

        let Some(&first) = pixel_indices.first() else {
            return Ok(ProcessSummary::default());
        };

        let joined: Vec<u8> = pixel_indices
            .iter()
            .filter_map(|&index| chunks.get(index))
            .flat_map(|chunk| chunk.payload().iter().copied())
            .collect();

        let recompressed = self
            .recompress(&joined)
            .map_err(|source| ConvertError::Compression {
                index: first,
                tag: ChunkTag::IDAT,
                source,
            })?;

        log::info!(
            "Recompressed {} IDAT chunks as one: {} -> {} bytes",
            pixel_indices.len(),
            joined.len(),
            recompressed.len()
        );

        if let Some(chunk) = chunks.get_mut(first) {
            chunk.replace_payload(recompressed)?;
        }
        chunks.retain_indexed(|index, chunk| {
            index == first || index >= end || !chunk.tag().is_pixel_data()
        });

        Ok(ProcessSummary {
            recompressed: 1,
            merged: pixel_indices.len() - 1,
        })
    }

    /// Inflates then deflates `payload`, each step in its own scratch buffer.
    fn recompress(&self, payload: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let pixels = self.decoder.decode(payload, self.scratch_capacity)?;
        self.encoder.encode(&pixels, self.scratch_capacity)
    }
}
