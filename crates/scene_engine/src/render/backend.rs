//! Backend abstraction traits for GPU resource creation
//!
//! The scene layer never talks to a graphics API. Whenever the resource cache
//! needs a GPU object it hands encoded bytes to a [`RenderBackend`], which
//! decodes, uploads and returns an opaque [`GpuHandle`] plus whatever metadata
//! the cache records (sizes, mesh bounds, triangle groups).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::math::AABB;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by a backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Bytes could not be decoded
    #[error("Failed to decode '{name}': {reason}")]
    Decode {
        /// Resource name
        name: String,
        /// What went wrong
        reason: String,
    },

    /// The backend cannot create this kind of object
    #[error("Unsupported resource '{0}'")]
    Unsupported(String),

    /// Shader compilation or linking failed
    #[error("Failed to compile program '{name}': {log}")]
    Compile {
        /// Program name
        name: String,
        /// Compiler output
        log: String,
    },
}

/// Opaque GPU object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuHandle(pub u64);

bitflags! {
    /// Texture creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        /// Signed normalized data
        const SIGNED = 1 << 0;
        /// sRGB color data
        const SRGB = 1 << 1;
        /// Clamp instead of repeat
        const NO_REPEAT = 1 << 2;
        /// Referenced by a loaded scene
        const USAGE_SCENE = 1 << 3;
    }
}

/// Texel storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexFormat {
    /// Let the backend pick from the container
    #[default]
    Undefined,
    /// 8-bit RGBA
    RawRGBA8888,
    /// Block compressed
    Compressed,
}

/// Sampler filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexFilter {
    /// No filtering
    NoFilter,
    /// Bilinear with mips
    Bilinear,
    /// Trilinear with mips
    #[default]
    Trilinear,
    /// Bilinear without mip chain
    BilinearNoMipmap,
}

/// Sampler addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexRepeat {
    /// Wrap around
    #[default]
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureParams {
    /// Creation flags
    pub flags: TextureFlags,
    /// Storage format
    pub format: TexFormat,
    /// Filtering mode
    pub filter: TexFilter,
    /// Addressing mode
    pub repeat: TexRepeat,
}

impl TextureParams {
    /// Parameters with the given flags and default sampling
    pub fn with_flags(flags: TextureFlags) -> Self {
        let repeat = if flags.contains(TextureFlags::NO_REPEAT) {
            TexRepeat::ClampToEdge
        } else {
            TexRepeat::Repeat
        };
        Self {
            flags,
            repeat,
            ..Self::default()
        }
    }

    /// Sampling chosen from the file name: RGBE images are sampled without
    /// mips and clamped, everything else trilinear and repeating
    pub fn for_file(name: &str, flags: TextureFlags) -> Self {
        let mut params = Self::with_flags(flags);
        if name.contains(".tga_rgbe") {
            params.filter = TexFilter::BilinearNoMipmap;
            params.repeat = TexRepeat::ClampToEdge;
        } else {
            params.filter = TexFilter::Trilinear;
        }
        params
    }
}

/// What the backend learned while creating a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// GPU object
    pub gpu: GpuHandle,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
}

/// What the backend learned while creating a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    /// GPU object
    pub gpu: GpuHandle,
    /// Object-space bounds
    pub bbox: AABB,
    /// Default material name of each triangle group
    pub group_materials: Vec<String>,
    /// Bone count for skinned meshes
    pub bone_count: Option<u32>,
}

/// What the backend learned while creating an animation sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimInfo {
    /// Number of keyframes
    pub frame_count: u32,
    /// Playback rate
    pub fps: f32,
}

/// GPU resource factory used by the resource cache
pub trait RenderBackend: Send {
    /// Create a 2D texture from an encoded image
    fn create_texture(&mut self, name: &str, data: &[u8], params: &TextureParams) -> BackendResult<TextureInfo>;

    /// Create a cube texture from six encoded faces (+X, -X, +Y, -Y, +Z, -Z)
    fn create_texture_cube(&mut self, name: &str, faces: [&[u8]; 6], params: &TextureParams) -> BackendResult<TextureInfo>;

    /// Create a mesh from an encoded mesh file
    fn create_mesh(&mut self, name: &str, data: &[u8]) -> BackendResult<MeshInfo>;

    /// Compile and link a shader program
    fn compile_program(&mut self, name: &str, vs_source: &str, fs_source: &str) -> BackendResult<GpuHandle>;

    /// Decode a skeletal animation
    fn create_anim_sequence(&mut self, name: &str, data: &[u8]) -> BackendResult<AnimInfo>;

    /// Allocate an untyped GPU buffer
    fn create_buffer(&mut self, name: &str, size: u32) -> BackendResult<GpuHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgbe_textures_clamp_without_mips() {
        let p = TextureParams::for_file("./t/sky.tga_rgbe", TextureFlags::USAGE_SCENE);
        assert_eq!(p.filter, TexFilter::BilinearNoMipmap);
        assert_eq!(p.repeat, TexRepeat::ClampToEdge);

        let p = TextureParams::for_file("./t/wall.dds", TextureFlags::USAGE_SCENE);
        assert_eq!(p.filter, TexFilter::Trilinear);
        assert_eq!(p.repeat, TexRepeat::Repeat);
        assert!(p.flags.contains(TextureFlags::USAGE_SCENE));
    }

    #[test]
    fn test_no_repeat_flag_clamps() {
        let p = TextureParams::with_flags(TextureFlags::NO_REPEAT);
        assert_eq!(p.repeat, TexRepeat::ClampToEdge);
    }
}
