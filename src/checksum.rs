use crate::chunk::ChunkTag;
use crc32fast::Hasher;

/// Computes the CRC-32 (IEEE 802.3) of a chunk: the type tag followed by the payload.
pub fn checksum(tag: ChunkTag, payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new_with_initial(0);
    hasher.update(tag.as_bytes());
    hasher.update(payload);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iend_checksum_matches_known_value() {
        assert_eq!(checksum(ChunkTag::IEND, &[]), 0xAE42_6082);
    }

    #[test]
    fn checksum_covers_tag_and_payload() {
        let payload = [0u8, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0];
        assert_eq!(checksum(ChunkTag::IHDR, &payload), 0x1F15_C489);
        assert_ne!(
            checksum(ChunkTag::IHDR, &payload),
            checksum(ChunkTag::IDAT, &payload)
        );
    }
}
