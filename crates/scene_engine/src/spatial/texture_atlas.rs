//! Decal texture atlas
//!
//! A fixed-size RGBA8 canvas kept in CPU memory. Decal images are packed into
//! it through a [`TextureSplitter`], each surrounded by a border of replicated
//! edge texels so filtering near the edge never samples a neighbour. Callers
//! receive normalized `(u, v, w, h)` rectangles. Once a scene finished loading
//! the atlas is finalized, which builds a box-filtered mip chain ready for
//! upload.

use crate::spatial::texture_splitter::TextureSplitter;

/// Errors reported by the atlas
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    /// No free rectangle large enough
    #[error("No space left in atlas for {width}x{height} image")]
    NoSpace {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Pixel buffer does not match the stated dimensions
    #[error("Pixel data has {actual} bytes, expected {expected}")]
    InvalidData {
        /// Bytes required by `width * height * 4`
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
}

/// A placed image inside the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    /// Top-left texel of the image, excluding the border
    pub pos: [u32; 2],
    /// Image size in texels
    pub size: [u32; 2],
}

/// One level of the finalized mip chain
#[derive(Debug, Clone)]
pub struct AtlasMip {
    /// Level width
    pub width: u32,
    /// Level height
    pub height: u32,
    /// RGBA8 texels
    pub data: Vec<u8>,
}

/// RGBA8 atlas for decal textures
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    width: u32,
    height: u32,
    border: u32,
    splitter: TextureSplitter,
    pixels: Vec<u8>,
    mips: Vec<AtlasMip>,
    finalized: bool,
}

impl TextureAtlas {
    /// Create an empty atlas; the canvas is allocated on first use
    pub fn new(width: u32, height: u32, border: u32) -> Self {
        Self {
            width,
            height,
            border,
            splitter: TextureSplitter::new(width, height),
            pixels: Vec::new(),
            mips: Vec::new(),
            finalized: false,
        }
    }

    /// Canvas dimensions
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// Number of images currently placed
    pub fn region_count(&self) -> usize {
        self.splitter.allocated_count()
    }

    /// True once [`TextureAtlas::finalize`] ran and nothing changed since
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Copy an RGBA8 image into the atlas
    pub fn allocate(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<AtlasRegion, AtlasError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(AtlasError::InvalidData {
                expected,
                actual: rgba.len(),
            });
        }

        let padded = [width + 2 * self.border, height + 2 * self.border];
        let (_, origin) = self
            .splitter
            .allocate(padded)
            .ok_or(AtlasError::NoSpace { width, height })?;

        if self.pixels.is_empty() {
            self.pixels = vec![0; self.width as usize * self.height as usize * 4];
        }

        let b = self.border as i64;
        for y in 0..padded[1] {
            let sy = (y as i64 - b).clamp(0, height as i64 - 1) as usize;
            for x in 0..padded[0] {
                let sx = (x as i64 - b).clamp(0, width as i64 - 1) as usize;
                let src = (sy * width as usize + sx) * 4;
                let dst = ((origin[1] + y) as usize * self.width as usize + (origin[0] + x) as usize) * 4;
                self.pixels[dst..dst + 4].copy_from_slice(&rgba[src..src + 4]);
            }
        }

        self.finalized = false;
        Ok(AtlasRegion {
            pos: [origin[0] + self.border, origin[1] + self.border],
            size: [width, height],
        })
    }

    /// Normalized `(u, v, w, h)` of a region
    pub fn normalized(&self, region: &AtlasRegion) -> [f32; 4] {
        [
            region.pos[0] as f32 / self.width as f32,
            region.pos[1] as f32 / self.height as f32,
            region.size[0] as f32 / self.width as f32,
            region.size[1] as f32 / self.height as f32,
        ]
    }

    /// Texel at `(x, y)` of level 0
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height || self.pixels.is_empty() {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[i..i + 4]);
        Some(out)
    }

    /// Level 0 texels; empty until the first allocation
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mip levels below level 0, valid after finalization
    pub fn mips(&self) -> &[AtlasMip] {
        &self.mips
    }

    /// Build the mip chain down to 1x1
    pub fn finalize(&mut self) {
        self.mips.clear();
        if self.pixels.is_empty() {
            self.finalized = true;
            return;
        }

        let (mut w, mut h) = (self.width, self.height);
        while w > 1 || h > 1 {
            let src = self.mips.last().map_or(&self.pixels[..], |m| &m.data[..]);
            let next = downsample(src, w, h);
            w = next.width;
            h = next.height;
            self.mips.push(next);
        }
        self.finalized = true;
        log::debug!(
            "Decal atlas finalized: {} regions, {} mip levels",
            self.region_count(),
            self.mips.len() + 1
        );
    }

    /// Forget every region and release the canvas
    pub fn clear(&mut self) {
        self.splitter.clear();
        self.pixels = Vec::new();
        self.mips.clear();
        self.finalized = false;
    }
}

fn downsample(src: &[u8], w: u32, h: u32) -> AtlasMip {
    let nw = (w / 2).max(1);
    let nh = (h / 2).max(1);
    let mut data = vec![0u8; nw as usize * nh as usize * 4];

    for y in 0..nh {
        for x in 0..nw {
            let mut acc = [0u32; 4];
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let sx = (x * 2 + dx).min(w - 1) as usize;
                let sy = (y * 2 + dy).min(h - 1) as usize;
                let i = (sy * w as usize + sx) * 4;
                for c in 0..4 {
                    acc[c] += u32::from(src[i + c]);
                }
            }
            let o = (y as usize * nw as usize + x as usize) * 4;
            for c in 0..4 {
                data[o + c] = ((acc[c] + 2) / 4) as u8;
            }
        }
    }

    AtlasMip {
        width: nw,
        height: nh,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, c: [u8; 4]) -> Vec<u8> {
        c.iter().copied().cycle().take((w * h * 4) as usize).collect()
    }

    #[test]
    fn test_region_is_inset_by_border() {
        let mut atlas = TextureAtlas::new(64, 32, 2);
        let region = atlas.allocate(&solid(8, 4, [255, 0, 0, 255]), 8, 4).unwrap();
        assert_eq!(region.pos, [2, 2]);
        assert_eq!(atlas.normalized(&region), [2.0 / 64.0, 2.0 / 32.0, 8.0 / 64.0, 4.0 / 32.0]);
    }

    #[test]
    fn test_border_replicates_edge() {
        let mut atlas = TextureAtlas::new(32, 32, 1);
        let mut img = solid(2, 1, [10, 10, 10, 255]);
        img[4..8].copy_from_slice(&[200, 0, 0, 255]);
        let region = atlas.allocate(&img, 2, 1).unwrap();

        let [x, y] = region.pos;
        assert_eq!(atlas.pixel(x - 1, y), Some([10, 10, 10, 255]));
        assert_eq!(atlas.pixel(x + 2, y), Some([200, 0, 0, 255]));
        assert_eq!(atlas.pixel(x + 1, y + 1), Some([200, 0, 0, 255]));
        assert_eq!(atlas.pixel(x, y - 1), Some([10, 10, 10, 255]));
    }

    #[test]
    fn test_rejects_bad_buffers_and_full_atlas() {
        let mut atlas = TextureAtlas::new(16, 16, 0);
        assert!(matches!(
            atlas.allocate(&[0; 7], 1, 2),
            Err(AtlasError::InvalidData { expected: 8, actual: 7 })
        ));
        atlas.allocate(&solid(16, 16, [1, 2, 3, 4]), 16, 16).unwrap();
        assert!(matches!(
            atlas.allocate(&solid(1, 1, [0; 4]), 1, 1),
            Err(AtlasError::NoSpace { .. })
        ));
    }

    #[test]
    fn test_finalize_builds_mips() {
        let mut atlas = TextureAtlas::new(8, 4, 0);
        atlas.allocate(&solid(8, 4, [100, 50, 0, 255]), 8, 4).unwrap();
        atlas.finalize();

        let dims: Vec<_> = atlas.mips().iter().map(|m| (m.width, m.height)).collect();
        assert_eq!(dims, vec![(4, 2), (2, 1), (1, 1)]);
        assert_eq!(&atlas.mips()[2].data[..], &[100, 50, 0, 255]);
        assert!(atlas.is_finalized());
    }

    #[test]
    fn test_clear_then_reallocate_matches_fresh() {
        let mut atlas = TextureAtlas::new(64, 64, 1);
        atlas.allocate(&solid(10, 10, [9; 4]), 10, 10).unwrap();
        atlas.clear();
        assert_eq!(atlas.region_count(), 0);
        assert!(atlas.pixels().is_empty());

        let again = atlas.allocate(&solid(4, 4, [1; 4]), 4, 4).unwrap();
        let fresh = TextureAtlas::new(64, 64, 1)
            .allocate(&solid(4, 4, [1; 4]), 4, 4)
            .unwrap();
        assert_eq!(again.pos, fresh.pos);
    }
}
