use crate::codec::{scratch_buffer, Decoder};
use crate::error::CompressionError;
use flate2::{Decompress, FlushDecompress, Status};

/// Inflates a headerless deflate stream, as stored in the IDAT chunks of CgBI files.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawDeflateDecoder;

impl Decoder for RawDeflateDecoder {
    fn decode(&self, data: &[u8], capacity: usize) -> Result<Vec<u8>, CompressionError> {
        let mut output = scratch_buffer(capacity)?;
        let mut inflater = Decompress::new(false);

        loop {
            let consumed = inflater.total_in() as usize;
            let produced = inflater.total_out() as usize;

            let status = inflater
                .decompress(
                    &data[consumed..],
                    &mut output[produced..],
                    FlushDecompress::None,
                )
                .map_err(|e| CompressionError::CorruptStream(e.to_string()))?;

            let now_consumed = inflater.total_in() as usize;
            let now_produced = inflater.total_out() as usize;

            match status {
                Status::StreamEnd => {
                    output.truncate(now_produced);
                    return Ok(output);
                }
                Status::Ok | Status::BufError => {
                    if now_produced == capacity {
                        return Err(CompressionError::CapacityExceeded { capacity });
                    }
                    if now_consumed == consumed && now_produced == produced {
                        return Err(CompressionError::TruncatedStream {
                            consumed: now_consumed,
                        });
                    }
                }
            }
        }
    }
}
