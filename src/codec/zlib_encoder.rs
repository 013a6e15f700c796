use crate::codec::{scratch_buffer, Encoder};
use crate::error::CompressionError;
use flate2::{Compress, Compression, FlushCompress, Status};

/// Deflates into a zlib-wrapped stream, the form standard PNG readers expect in IDAT.
#[derive(Debug, Clone, Copy)]
pub struct ZlibEncoder {
    level: Compression,
}

impl ZlibEncoder {
    pub fn new(level: Compression) -> Self {
        ZlibEncoder { level }
    }
}

impl Default for ZlibEncoder {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

impl Encoder for ZlibEncoder {
    fn encode(&self, data: &[u8], capacity: usize) -> Result<Vec<u8>, CompressionError> {
        let mut output = scratch_buffer(capacity)?;
        let mut deflater = Compress::new(self.level, true);

        loop {
            let consumed = deflater.total_in() as usize;
            let produced = deflater.total_out() as usize;

            let status = deflater
                .compress(
                    &data[consumed..],
                    &mut output[produced..],
                    FlushCompress::Finish,
                )
                .map_err(|e| CompressionError::Deflate(e.to_string()))?;

            let now_consumed = deflater.total_in() as usize;
            let now_produced = deflater.total_out() as usize;

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
                        return Err(CompressionError::Deflate(format!(
                            "no progress after {now_consumed} input bytes"
                        )));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn inflate_wrapped(data: &[u8]) -> Vec<u8> {
        let mut decoded = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut decoded).unwrap();
        decoded
    }

    #[test]
    fn output_is_zlib_wrapped() {
        let pixels: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
        let encoded = ZlibEncoder::default().encode(&pixels, 64 * 1024).unwrap();

        // CMF: deflate with a 32K window, and the header must be a multiple of 31.
        assert_eq!(encoded[0], 0x78);
        assert_eq!(u16::from_be_bytes([encoded[0], encoded[1]]) % 31, 0);
        assert_eq!(inflate_wrapped(&encoded), pixels);
    }

    #[test]
    fn empty_input_still_produces_a_stream() {
        let encoded = ZlibEncoder::default().encode(&[], 64).unwrap();
        assert!(!encoded.is_empty());
        assert!(inflate_wrapped(&encoded).is_empty());
    }

    #[test]
    fn incompressible_input_over_capacity_is_an_error() {
        let pixels: Vec<u8> = (0..512).map(|_| rand::random::<u8>()).collect();
        let err = ZlibEncoder::default().encode(&pixels, 520).unwrap_err();
        assert_eq!(err, CompressionError::CapacityExceeded { capacity: 520 });
    }
}
