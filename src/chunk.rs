use crate::checksum::checksum;
use crate::error::StructuralError;
use std::fmt;

/// Four byte type tag naming the role of a chunk.
#[derive(Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct ChunkTag([u8; 4]);

impl ChunkTag {
    /// Image header.
    pub const IHDR: Self = Self(*b"IHDR");
    /// Pixel data.
    pub const IDAT: Self = Self(*b"IDAT");
    /// End of the chunk stream.
    pub const IEND: Self = Self(*b"IEND");
    /// Apple's private metadata chunk, removed on output.
    pub const CGBI: Self = Self(*b"CgBI");

    /// Wraps four raw tag bytes. Any bytes are accepted; unknown tags pass through.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The tag as it appears on the wire.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// True for `IDAT`, the chunks that get recompressed.
    pub fn is_pixel_data(&self) -> bool {
        *self == Self::IDAT
    }

    /// True for `IEND`; nothing after it is read or written.
    pub fn is_end_marker(&self) -> bool {
        *self == Self::IEND
    }

    /// True for `CgBI`, which never reaches the output.
    pub fn is_private(&self) -> bool {
        *self == Self::CGBI
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({self})")
    }
}

/// A single length-tagged, checksummed record of the container.
///
/// `length` always equals `payload.len()`; the only way to change the
/// payload is [`Chunk::replace_payload`], which keeps the crc in sync.
///
/// # Fields
///
/// * `length` - Payload size, big-endian `u32` on the wire.
/// * `tag` - Role of the chunk.
/// * `payload` - Chunk data, opaque unless the chunk is `IDAT`.
/// * `crc` - CRC-32 over `tag` followed by `payload`.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    length: u32,
    tag: ChunkTag,
    payload: Vec<u8>,
    crc: u32,
}

impl Chunk {
    /// Builds a chunk with a freshly computed crc.
    ///
    /// # Arguments
    ///
    /// * `tag` - Type tag of the new chunk.
    /// * `payload` - Chunk data; its length becomes the length field.
    ///
    /// # Errors
    ///
    /// [`StructuralError::PayloadTooLong`] if `payload` does not fit the 32-bit length field.
    pub fn new(tag: ChunkTag, payload: Vec<u8>) -> Result<Self, StructuralError> {
        let length = payload_length(tag, &payload)?;
        let crc = checksum(tag, &payload);
        Ok(Chunk {
            length,
            tag,
            payload,
            crc,
        })
    }

    /// Builds a chunk as read from the wire, keeping the declared length and crc.
    pub(crate) fn from_wire(tag: ChunkTag, length: u32, payload: Vec<u8>, crc: u32) -> Self {
        debug_assert_eq!(length as usize, payload.len());
        Chunk {
            length,
            tag,
            payload,
            crc,
        }
    }

    /// Number of payload bytes.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn tag(&self) -> ChunkTag {
        self.tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The crc as stored, which is only recomputed when the payload is replaced.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Returns true if the stored crc matches the tag and payload.
    pub fn is_crc_valid(&self) -> bool {
        self.crc == checksum(self.tag, &self.payload)
    }

    /// Swaps in a new payload, updating the length and recomputing the crc.
    ///
    /// The chunk is left untouched if `payload` is too long for the length field.
    pub(crate) fn replace_payload(&mut self, payload: Vec<u8>) -> Result<(), StructuralError> {
        self.length = payload_length(self.tag, &payload)?;
        self.crc = checksum(self.tag, &payload);
        self.payload = payload;
        Ok(())
    }

    /// Number of bytes this chunk occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        12 + self.payload.len()
    }
}

fn payload_length(tag: ChunkTag, payload: &[u8]) -> Result<u32, StructuralError> {
    u32::try_from(payload.len()).map_err(|_| StructuralError::PayloadTooLong {
        tag,
        length: payload.len(),
    })
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("tag", &self.tag)
            .field("length", &self.length)
            .field("crc", &format_args!("{:08x}", self.crc))
            .finish()
    }
}

/// Ordered chunks of one container, in on-disk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSequence {
    chunks: Vec<Chunk>,
}

impl ChunkSequence {
    pub fn new() -> Self {
        ChunkSequence { chunks: Vec::new() }
    }

    /// Appends `chunk` at the end, keeping on-disk order.
    pub fn push(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    /// Number of chunks, IEND and anything after it included.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Chunk> {
        self.chunks.iter_mut()
    }

    /// Chunk at `index` in on-disk order.
    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Chunk> {
        self.chunks.get_mut(index)
    }

    /// Index of the IEND chunk, or the length of the sequence if there is none.
    pub fn end_index(&self) -> usize {
        self.chunks
            .iter()
            .position(|chunk| chunk.tag.is_end_marker())
            .unwrap_or(self.chunks.len())
    }

    /// Keeps only the chunks for which `keep` returns true, preserving order.
    pub(crate) fn retain_indexed<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize, &Chunk) -> bool,
    {
        let mut index = 0;
        self.chunks.retain(|chunk| {
            let kept = keep(index, chunk);
            index += 1;
            kept
        });
    }

    /// Number of chunks carrying `tag`.
    pub fn count_tag(&self, tag: ChunkTag) -> usize {
        self.chunks.iter().filter(|chunk| chunk.tag == tag).count()
    }
}

impl From<Vec<Chunk>> for ChunkSequence {
    fn from(chunks: Vec<Chunk>) -> Self {
        ChunkSequence { chunks }
    }
}

impl<'a> IntoIterator for &'a ChunkSequence {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}
