//! Payloads stored in the resource cache

use crate::assets::resource::ResourceRef;
use crate::foundation::math::AABB;
use crate::render::{GpuHandle, TextureParams};

/// Handle to a cached mesh
pub type MeshRef = ResourceRef<Mesh>;
/// Handle to a cached material
pub type MaterialRef = ResourceRef<Material>;
/// Handle to a cached shader program
pub type ProgramRef = ResourceRef<Program>;
/// Handle to a cached texture
pub type TextureRef = ResourceRef<Texture>;
/// Handle to a cached animation sequence
pub type AnimSeqRef = ResourceRef<AnimSequence>;
/// Handle to a cached buffer
pub type BufferRef = ResourceRef<Buffer>;

/// Triangle group of a mesh with its material
#[derive(Debug, Clone)]
pub struct TriGroup {
    /// Material named by the mesh file
    pub material_name: String,
    /// Resolved material, possibly overridden by the scene
    pub material: Option<MaterialRef>,
}

/// Bones and the animations attached to them
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    /// Bone count
    pub bone_count: u32,
    /// Attached animation sequences
    pub anims: Vec<AnimSeqRef>,
}

/// Uploaded mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    /// GPU object
    pub gpu: GpuHandle,
    /// Object-space bounds
    pub bbox: AABB,
    /// Triangle groups in file order
    pub groups: Vec<TriGroup>,
    /// Present for skinned meshes
    pub skeleton: Option<Skeleton>,
}

/// Surface description: a program, its textures and constants
#[derive(Debug, Clone, Default)]
pub struct Material {
    /// Shader program
    pub program: Option<ProgramRef>,
    /// Bound textures in slot order
    pub textures: Vec<TextureRef>,
    /// Shader constants
    pub params: Vec<[f32; 4]>,
}

/// Compiled shader program
#[derive(Debug, Clone)]
pub struct Program {
    /// GPU object
    pub gpu: GpuHandle,
    /// Vertex shader file
    pub vs_name: String,
    /// Fragment shader file
    pub fs_name: String,
}

/// Uploaded 2D or cube texture
#[derive(Debug, Clone)]
pub struct Texture {
    /// GPU object
    pub gpu: GpuHandle,
    /// Creation parameters
    pub params: TextureParams,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Six-face cube map
    pub cube: bool,
}

/// Skeletal animation clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimSequence {
    /// Number of keyframes
    pub frame_count: u32,
    /// Playback rate
    pub fps: f32,
}

impl AnimSequence {
    /// Clip length in seconds
    pub fn duration(&self) -> f32 {
        if self.fps > 0.0 {
            self.frame_count as f32 / self.fps
        } else {
            0.0
        }
    }
}

/// GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffer {
    /// GPU object
    pub gpu: GpuHandle,
    /// Size in bytes
    pub size: u32,
}
