//! Image decoding for texture data
//!
//! Decodes PNG and anything else the `image` crate handles into tightly
//! packed RGBA8, the layout the texture atlases copy from.

use std::path::Path;

use crate::assets::AssetError;

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Pixel data, four bytes per texel, rows top to bottom
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {e}", path.display())))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded image {width}x{height} from {}", path.display());
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes).map_err(|e| AssetError::InvalidData(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Image filled with one color
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let texels = width as usize * height as usize;
        Self {
            data: color.repeat(texels),
            width,
            height,
        }
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, AssetError> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| AssetError::InvalidData("pixel buffer does not match dimensions".into()))?;
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| AssetError::InvalidData(e.to_string()))?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!(img.data.len(), 4 * 2 * 4);
        assert_eq!(&img.data[0..4], &[255, 0, 0, 255]);
        assert_eq!(&img.data[28..32], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_png_roundtrip_keeps_pixels() {
        let img = ImageData::solid_color(3, 5, [10, 20, 30, 40]);
        let decoded = ImageData::from_bytes(&img.to_png().unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            ImageData::from_bytes(b"definitely not a png"),
            Err(AssetError::InvalidData(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        std::fs::write(&path, ImageData::solid_color(2, 2, [255, 0, 0, 255]).to_png().unwrap()).unwrap();
        let img = ImageData::from_file(&path).unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert!(ImageData::from_file(dir.path().join("missing.png")).is_err());
    }
}
