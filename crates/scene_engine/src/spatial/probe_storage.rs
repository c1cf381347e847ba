//! Light-probe cubemap storage
//!
//! Fixed-capacity array of cubemap layers. Layers are handed out in order
//! and every face of every layer fills in progressively, one block-compressed
//! mip level at a time, as streamed data arrives.
//!
//! The streamed file format is parsed by [`ProbeLevelReader`]: an opaque
//! 64-byte header, then for each level from the top resolution downwards a
//! little-endian `u32` byte length, the level bytes, and zero padding up to a
//! 4-byte boundary.

/// Size of the opaque container header that precedes the mip chain
pub const PROBE_FILE_HEADER_LEN: usize = 64;

/// Errors from the probe store and its stream reader
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Every layer is already handed out
    #[error("Probe storage is full ({capacity} layers)")]
    StorageFull {
        /// Layer count
        capacity: u32,
    },

    /// Layer index out of range
    #[error("Invalid probe layer {0}")]
    InvalidLayer(u32),

    /// Face index outside 0..6
    #[error("Invalid cube face {0}")]
    InvalidFace(usize),

    /// Level index past the smallest stored mip
    #[error("Invalid mip level {0}")]
    InvalidLevel(u32),

    /// Level payload has the wrong block-compressed size
    #[error("Mip level {level}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Level index
        level: u32,
        /// Size implied by the level resolution
        expected: usize,
        /// Size found
        actual: usize,
    },

    /// Stream ended inside a length prefix or the header
    #[error("Probe stream truncated at mip level {level}")]
    Truncated {
        /// Level being read
        level: u32,
    },

    /// Length prefix runs past the end of the stream
    #[error("Mip level {level} claims {len} bytes but only {remaining} remain")]
    Oversized {
        /// Level being read
        level: u32,
        /// Declared length
        len: usize,
        /// Bytes left in the stream
        remaining: usize,
    },
}

/// Byte size of one block-compressed level: 4x4 blocks of 16 bytes
pub fn compressed_level_len(res: u32) -> usize {
    let blocks = res.div_ceil(4) as usize;
    blocks * blocks * 16
}

#[derive(Debug, Clone, Default)]
struct ProbeLayer {
    faces: [Vec<Option<Vec<u8>>>; 6],
}

impl ProbeLayer {
    fn new(mip_count: usize) -> Self {
        Self {
            faces: std::array::from_fn(|_| vec![None; mip_count]),
        }
    }
}

/// Cubemap array for light probes
#[derive(Debug, Clone)]
pub struct ProbeStorage {
    res: u32,
    min_res: u32,
    capacity: u32,
    size: u32,
    layers: Vec<ProbeLayer>,
}

impl ProbeStorage {
    /// Create storage for `capacity` cubemaps of `res`-sized faces
    pub fn new(res: u32, capacity: u32, min_res: u32) -> Self {
        let mut storage = Self {
            res,
            min_res: min_res.max(1),
            capacity,
            size: 0,
            layers: Vec::new(),
        };
        storage.reset_layers();
        storage
    }

    fn reset_layers(&mut self) {
        let mips = self.mip_count() as usize;
        self.layers = (0..self.capacity).map(|_| ProbeLayer::new(mips)).collect();
    }

    /// Face resolution of level 0
    pub fn res(&self) -> u32 {
        self.res
    }

    /// Smallest stored face resolution
    pub fn min_res(&self) -> u32 {
        self.min_res
    }

    /// Total layer count
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Layers handed out so far
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of stored levels, from `res` down to `min_res`
    pub fn mip_count(&self) -> u32 {
        let mut count = 0;
        let mut r = self.res;
        while r >= self.min_res && r > 0 {
            count += 1;
            r /= 2;
        }
        count
    }

    /// Face resolution at `level`
    pub fn level_res(&self, level: u32) -> u32 {
        self.res >> level
    }

    /// Hand out the next free layer
    pub fn allocate(&mut self) -> Result<u32, ProbeError> {
        if self.size >= self.capacity {
            return Err(ProbeError::StorageFull {
                capacity: self.capacity,
            });
        }
        let layer = self.size;
        self.size += 1;
        Ok(layer)
    }

    /// Install one mip level of one face
    pub fn set_pixel_data(&mut self, level: u32, layer: u32, face: usize, data: &[u8]) -> Result<(), ProbeError> {
        if layer >= self.size {
            return Err(ProbeError::InvalidLayer(layer));
        }
        if face >= 6 {
            return Err(ProbeError::InvalidFace(face));
        }
        if level >= self.mip_count() {
            return Err(ProbeError::InvalidLevel(level));
        }
        let expected = compressed_level_len(self.level_res(level));
        if data.len() != expected {
            return Err(ProbeError::LengthMismatch {
                level,
                expected,
                actual: data.len(),
            });
        }

        self.layers[layer as usize].faces[face][level as usize] = Some(data.to_vec());
        Ok(())
    }

    /// Stored bytes of one level
    pub fn level_data(&self, layer: u32, face: usize, level: u32) -> Option<&[u8]> {
        self.layers
            .get(layer as usize)?
            .faces
            .get(face)?
            .get(level as usize)?
            .as_deref()
    }

    /// How many leading levels of a face are present
    pub fn loaded_levels(&self, layer: u32, face: usize) -> u32 {
        self.layers
            .get(layer as usize)
            .and_then(|l| l.faces.get(face))
            .map_or(0, |levels| levels.iter().take_while(|l| l.is_some()).count() as u32)
    }

    /// Release every layer, keeping dimensions
    pub fn clear(&mut self) {
        self.size = 0;
        self.reset_layers();
    }
}

/// One decoded level from a probe stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeLevel<'a> {
    /// Level index, 0 is the largest
    pub level: u32,
    /// Face resolution of the level
    pub res: u32,
    /// Level bytes
    pub data: &'a [u8],
}

/// Iterator over the length-prefixed mip chain of a probe face file
///
/// Yields levels while the resolution stays at or above the minimum. The
/// first malformed prefix yields an error and ends iteration.
#[derive(Debug, Clone)]
pub struct ProbeLevelReader<'a> {
    data: &'a [u8],
    offset: usize,
    level: u32,
    res: u32,
    min_res: u32,
    done: bool,
}

impl<'a> ProbeLevelReader<'a> {
    /// Start reading a face file whose top level is `res`
    pub fn new(data: &'a [u8], res: u32, min_res: u32) -> Self {
        Self {
            data,
            offset: PROBE_FILE_HEADER_LEN,
            level: 0,
            res,
            min_res: min_res.max(1),
            done: false,
        }
    }
}

impl<'a> Iterator for ProbeLevelReader<'a> {
    type Item = Result<ProbeLevel<'a>, ProbeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.res < self.min_res {
            return None;
        }
        let level = self.level;

        let Some(prefix) = self.data.get(self.offset..self.offset + 4) else {
            self.done = true;
            return Some(Err(ProbeError::Truncated { level }));
        };
        let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        self.offset += 4;

        let remaining = self.data.len() - self.offset;
        if len > remaining {
            self.done = true;
            return Some(Err(ProbeError::Oversized { level, len, remaining }));
        }

        let data = &self.data[self.offset..self.offset + len];
        self.offset += len;
        self.offset = (self.offset + 3) & !3;

        let out = ProbeLevel {
            level,
            res: self.res,
            data,
        };
        self.level += 1;
        self.res /= 2;
        Some(Ok(out))
    }
}
