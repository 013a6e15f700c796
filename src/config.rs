use crate::error::ConfigError;

/// Chunks parsed before an IEND must have been seen.
pub const DEFAULT_MAX_CHUNKS: usize = 20;
/// Capacity of each inflate and deflate scratch buffer: 1 MiB.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 1024 * 1024;

pub const ENV_MAX_CHUNKS: &str = "FIXPNG_MAX_CHUNKS";
pub const ENV_SCRATCH_CAPACITY: &str = "FIXPNG_SCRATCH_CAPACITY";
pub const ENV_MAX_CHUNK_LENGTH: &str = "FIXPNG_MAX_CHUNK_LENGTH";
pub const ENV_VERIFY_CRC: &str = "FIXPNG_VERIFY_CRC";
pub const ENV_PIXEL_DATA_POLICY: &str = "FIXPNG_PIXEL_DATA_POLICY";

/// What to do with an image whose pixel data is split over several IDAT chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelDataPolicy {
    /// Recompress every IDAT on its own and write only the first one.
    ///
    /// Each IDAT must hold a complete deflate stream. A stream split over
    /// several IDATs fails with `TruncatedStream` at its first chunk; convert
    /// those with [`PixelDataPolicy::Concatenate`]
    /// (`FIXPNG_PIXEL_DATA_POLICY=concatenate`).
    #[default]
    KeepFirst,
    /// Join all IDAT payloads into the first IDAT before recompressing.
    Concatenate,
}

impl PixelDataPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep-first" | "first" => Some(PixelDataPolicy::KeepFirst),
            "concatenate" | "concat" => Some(PixelDataPolicy::Concatenate),
            _ => None,
        }
    }
}

/// Limits and policies of a single conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Maximum number of chunks read while looking for IEND.
    pub max_chunks: usize,
    /// Capacity of the per-chunk inflate and deflate buffers.
    pub scratch_capacity: usize,
    /// Largest payload the reader will allocate for a single chunk.
    pub max_chunk_length: usize,
    /// Reject chunks whose declared crc does not match their contents.
    pub verify_crc: bool,
    /// How IDAT chunks after the first one are treated.
    pub pixel_data_policy: PixelDataPolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            max_chunks: DEFAULT_MAX_CHUNKS,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            max_chunk_length: DEFAULT_SCRATCH_CAPACITY,
            verify_crc: false,
            pixel_data_policy: PixelDataPolicy::KeepFirst,
        }
    }
}

impl ConvertConfig {
    /// Sets how many chunks may be read before IEND is required.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Sets the scratch capacity. The chunk length bound follows it unless set separately afterwards.
    pub fn with_scratch_capacity(mut self, scratch_capacity: usize) -> Self {
        self.scratch_capacity = scratch_capacity;
        self.max_chunk_length = scratch_capacity;
        self
    }

    /// Sets the largest declared chunk length the reader accepts.
    pub fn with_max_chunk_length(mut self, max_chunk_length: usize) -> Self {
        self.max_chunk_length = max_chunk_length;
        self
    }

    /// Enables or disables crc checks on read.
    pub fn with_verify_crc(mut self, verify_crc: bool) -> Self {
        self.verify_crc = verify_crc;
        self
    }

    /// Sets the multi-IDAT policy.
    ///
    /// # Arguments
    ///
    /// * `policy` - [`PixelDataPolicy::KeepFirst`] for one complete stream per IDAT,
    ///   [`PixelDataPolicy::Concatenate`] for a stream split over several IDATs.
    pub fn with_pixel_data_policy(mut self, policy: PixelDataPolicy) -> Self {
        self.pixel_data_policy = policy;
        self
    }

    /// Reads overrides from the `FIXPNG_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns for each key.
    ///
    /// # Type Parameters
    ///
    /// * `F` - Maps a `FIXPNG_*` key to its value, `None` when unset.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for unparsable values, [`ConfigError::Zero`] for zero limits.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConvertConfig::default();

        if let Some(value) = lookup(ENV_MAX_CHUNKS) {
            config.max_chunks = parse_usize(ENV_MAX_CHUNKS, &value)?;
        }
        if let Some(value) = lookup(ENV_SCRATCH_CAPACITY) {
            config = config.with_scratch_capacity(parse_usize(ENV_SCRATCH_CAPACITY, &value)?);
        }
        if let Some(value) = lookup(ENV_MAX_CHUNK_LENGTH) {
            config.max_chunk_length = parse_usize(ENV_MAX_CHUNK_LENGTH, &value)?;
        }
        if let Some(value) = lookup(ENV_VERIFY_CRC) {
            config.verify_crc = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid(ENV_VERIFY_CRC, &value)),
            };
        }
        if let Some(value) = lookup(ENV_PIXEL_DATA_POLICY) {
            config.pixel_data_policy = PixelDataPolicy::parse(&value)
                .ok_or_else(|| invalid(ENV_PIXEL_DATA_POLICY, &value))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is usable.
    ///
    /// Lengths must fit the 32-bit length field of a chunk.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunks == 0 {
            return Err(ConfigError::Zero { key: ENV_MAX_CHUNKS });
        }
        if self.scratch_capacity == 0 {
            return Err(ConfigError::Zero {
                key: ENV_SCRATCH_CAPACITY,
            });
        }
        if self.max_chunk_length == 0 {
            return Err(ConfigError::Zero {
                key: ENV_MAX_CHUNK_LENGTH,
            });
        }
        if u32::try_from(self.scratch_capacity).is_err() {
            return Err(invalid(ENV_SCRATCH_CAPACITY, &self.scratch_capacity.to_string()));
        }
        if u32::try_from(self.max_chunk_length).is_err() {
            return Err(invalid(ENV_MAX_CHUNK_LENGTH, &self.max_chunk_length.to_string()));
        }
        Ok(())
    }
}

fn parse_usize(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}
