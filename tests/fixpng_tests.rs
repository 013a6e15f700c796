#[cfg(test)]
mod test {
    extern crate fixpng;
    use fixpng::checksum::checksum;
    use fixpng::{
        convert, convert_with_report, ChunkReader, ChunkTag, CompressionError, ConvertConfig,
        ConvertError, InputFormatError, PixelDataPolicy, StructuralError, PNG_SIGNATURE,
    };
    use flate2::read::{DeflateDecoder, ZlibDecoder};
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};

    const PIXELS: [u8; 4] = [0x10, 0x20, 0x30, 0x40];

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn deflate_raw(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn inflate_raw(data: &[u8]) -> Vec<u8> {
        let mut decoded = Vec::new();
        DeflateDecoder::new(data).read_to_end(&mut decoded).unwrap();
        decoded
    }

    fn inflate_wrapped(data: &[u8]) -> Vec<u8> {
        let mut decoded = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut decoded).unwrap();
        decoded
    }

    /// Builds a file from (tag, payload) pairs with valid crcs.
    fn png_file(chunks: &[(ChunkTag, Vec<u8>)]) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        for (tag, payload) in chunks {
            bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            bytes.extend_from_slice(tag.as_bytes());
            bytes.extend_from_slice(payload);
            bytes.extend_from_slice(&checksum(*tag, payload).to_be_bytes());
        }
        bytes
    }

    fn ihdr() -> (ChunkTag, Vec<u8>) {
        // 2x2, 8 bit grayscale.
        (
            ChunkTag::IHDR,
            vec![0, 0, 0, 2, 0, 0, 0, 2, 8, 0, 0, 0, 0],
        )
    }

    fn cgbi() -> (ChunkTag, Vec<u8>) {
        (ChunkTag::CGBI, vec![0x50, 0x00, 0x20, 0x02])
    }

    fn iend() -> (ChunkTag, Vec<u8>) {
        (ChunkTag::IEND, Vec::new())
    }

    fn read_output(bytes: &[u8]) -> fixpng::ChunkSequence {
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        ChunkReader::new(&bytes[8..], &ConvertConfig::default())
            .parse()
            .unwrap()
    }

    #[test]
    fn cgbi_file_becomes_standard_png() {
        init_logger();
        let input = png_file(&[
            ihdr(),
            cgbi(),
            (ChunkTag::IDAT, deflate_raw(&PIXELS)),
            iend(),
        ]);

        let output = convert(&input, &ConvertConfig::default()).unwrap();
        let chunks = read_output(&output);

        assert_eq!(chunks.count_tag(ChunkTag::CGBI), 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.get(0).unwrap().tag(), ChunkTag::IHDR);

        let idat = chunks.get(1).unwrap();
        assert_eq!(idat.tag(), ChunkTag::IDAT);
        assert_eq!(inflate_wrapped(idat.payload()), PIXELS);
        assert_eq!(idat.crc(), checksum(ChunkTag::IDAT, idat.payload()));

        assert_eq!(chunks.get(2).unwrap().tag(), ChunkTag::IEND);
    }

    #[test]
    fn every_output_chunk_has_a_matching_crc() {
        init_logger();
        let input = png_file(&[
            cgbi(),
            ihdr(),
            (ChunkTag::new(*b"sRGB"), vec![0]),
            (ChunkTag::IDAT, deflate_raw(&[0xaa; 64])),
            (ChunkTag::new(*b"tEXt"), b"Comment\0hello".to_vec()),
            iend(),
        ]);

        let output = convert(&input, &ConvertConfig::default()).unwrap();
        let config = ConvertConfig::default().with_verify_crc(true);
        let chunks = ChunkReader::new(&output[8..], &config).parse().unwrap();

        for chunk in &chunks {
            assert_eq!(chunk.crc(), checksum(chunk.tag(), chunk.payload()));
        }
    }

    #[test]
    fn order_and_count_are_preserved() {
        init_logger();
        let text = (ChunkTag::new(*b"tEXt"), b"Title\0x".to_vec());
        let input = png_file(&[
            cgbi(),
            ihdr(),
            text.clone(),
            (ChunkTag::IDAT, deflate_raw(&[1, 2, 3, 4])),
            (ChunkTag::IDAT, deflate_raw(&[5, 6, 7, 8])),
            cgbi(),
            (ChunkTag::IDAT, deflate_raw(&[9])),
            iend(),
        ]);

        let (output, report) = convert_with_report(&input, &ConvertConfig::default()).unwrap();

        // 8 read, minus 2 private, minus 2 duplicate IDAT.
        assert_eq!(report.chunks_read, 8);
        assert_eq!(report.recompressed, 3);
        assert_eq!(report.private_dropped, 2);
        assert_eq!(report.duplicates_dropped, 2);
        assert_eq!(report.chunks_written, 4);

        let chunks = read_output(&output);
        let tags: Vec<ChunkTag> = chunks.iter().map(|chunk| chunk.tag()).collect();
        assert_eq!(
            tags,
            vec![ChunkTag::IHDR, text.0, ChunkTag::IDAT, ChunkTag::IEND]
        );
        assert_eq!(chunks.get(1).unwrap().payload(), text.1.as_slice());
        assert_eq!(inflate_wrapped(chunks.get(2).unwrap().payload()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn recompressed_pixel_data_round_trips() {
        init_logger();
        let pixels: Vec<u8> = (0..64 * 1024).map(|_| rand::random::<u8>() & 0x0f).collect();
        let source = deflate_raw(&pixels);
        let input = png_file(&[ihdr(), (ChunkTag::IDAT, source.clone()), iend()]);

        let output = convert(&input, &ConvertConfig::default()).unwrap();
        let chunks = read_output(&output);

        assert_eq!(
            inflate_wrapped(chunks.get(1).unwrap().payload()),
            inflate_raw(&source)
        );
    }

    #[test]
    fn trailing_bytes_after_iend_are_dropped() {
        init_logger();
        let mut input = png_file(&[ihdr(), (ChunkTag::IDAT, deflate_raw(&PIXELS)), iend()]);
        input.extend_from_slice(b"trailing garbage");

        let output = convert(&input, &ConvertConfig::default()).unwrap();
        assert_eq!(&output[output.len() - 8..output.len() - 4], b"IEND");
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut input = png_file(&[ihdr(), iend()]);
        input[0] = 0x88;

        let err = convert(&input, &ConvertConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InputFormat(InputFormatError::BadSignature)
        ));
    }

    #[test]
    fn too_many_chunks_without_iend_is_a_structural_error() {
        let mut chunks = vec![ihdr()];
        for _ in 0..30 {
            chunks.push((ChunkTag::new(*b"tEXt"), b"k\0v".to_vec()));
        }
        chunks.push(iend());
        let input = png_file(&chunks);

        let err = convert(&input, &ConvertConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Structural(StructuralError::MissingEndMarker { max_chunks: 20 })
        ));

        let config = ConvertConfig::default().with_max_chunks(32);
        assert!(convert(&input, &config).is_ok());
    }

    #[test]
    fn corrupt_pixel_data_fails_the_whole_conversion() {
        let input = png_file(&[ihdr(), cgbi(), (ChunkTag::IDAT, vec![0xff; 16]), iend()]);

        let err = convert(&input, &ConvertConfig::default()).unwrap_err();
        match err {
            ConvertError::Compression { index, tag, .. } => {
                assert_eq!(index, 2);
                assert_eq!(tag, ChunkTag::IDAT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pixel_data_over_scratch_capacity_fails() {
        let input = png_file(&[ihdr(), (ChunkTag::IDAT, deflate_raw(&[0u8; 8192])), iend()]);
        let config = ConvertConfig::default().with_scratch_capacity(4096);

        let err = convert(&input, &config).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Compression {
                source: CompressionError::CapacityExceeded { capacity: 4096 },
                ..
            }
        ));
    }

    #[test]
    fn recompressed_pixel_data_over_scratch_capacity_fails() {
        // Random pixels inflate within 1030 bytes but need at least 1035 as zlib.
        let pixels: Vec<u8> = (0..1024).map(|_| rand::random::<u8>()).collect();
        let input = png_file(&[ihdr(), (ChunkTag::IDAT, deflate_raw(&pixels)), iend()]);
        let config = ConvertConfig::default()
            .with_scratch_capacity(1030)
            .with_max_chunk_length(4096);

        let err = convert(&input, &config).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Compression {
                index: 1,
                tag: ChunkTag::IDAT,
                source: CompressionError::CapacityExceeded { capacity: 1030 },
            }
        ));
    }

    #[test]
    fn default_policy_rejects_split_pixel_data() {
        init_logger();
        let pixels: Vec<u8> = (0..4000).map(|_| rand::random::<u8>()).collect();
        let stream = deflate_raw(&pixels);
        let (head, tail) = stream.split_at(stream.len() / 2);
        let input = png_file(&[
            ihdr(),
            (ChunkTag::IDAT, head.to_vec()),
            (ChunkTag::IDAT, tail.to_vec()),
            iend(),
        ]);

        let err = convert(&input, &ConvertConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Compression {
                index: 1,
                source: CompressionError::TruncatedStream { .. },
                ..
            }
        ));
    }

    #[test]
    fn concatenate_policy_keeps_split_pixel_data() {
        init_logger();
        let pixels: Vec<u8> = (0..4000).map(|_| rand::random::<u8>()).collect();
        let stream = deflate_raw(&pixels);
        let (head, tail) = stream.split_at(stream.len() / 2);
        let input = png_file(&[
            cgbi(),
            ihdr(),
            (ChunkTag::IDAT, head.to_vec()),
            (ChunkTag::IDAT, tail.to_vec()),
            iend(),
        ]);
        let config = ConvertConfig::default().with_pixel_data_policy(PixelDataPolicy::Concatenate);

        let (output, report) = convert_with_report(&input, &config).unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(report.duplicates_dropped, 0);

        let chunks = read_output(&output);
        assert_eq!(chunks.count_tag(ChunkTag::IDAT), 1);
        assert_eq!(inflate_wrapped(chunks.get(1).unwrap().payload()), pixels);
    }
}
