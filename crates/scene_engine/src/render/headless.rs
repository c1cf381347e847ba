//! Headless render backend
//!
//! Creates no GPU objects. It validates and decodes what it is given, hands
//! out sequential handles and keeps counts, which is enough to run the whole
//! scene layer in tools and tests.
//!
//! Textures may be any image the `image` crate decodes, or a DDS/KTX container
//! whose header supplies the dimensions. Meshes and animations are small RON
//! descriptions ([`MeshDesc`], [`AnimDesc`]).

use serde::{Deserialize, Serialize};

use crate::assets::ImageData;
use crate::foundation::math::{Vec3, AABB};
use crate::render::backend::{
    AnimInfo, BackendError, BackendResult, GpuHandle, MeshInfo, RenderBackend, TextureInfo, TextureParams,
};

const DDS_MAGIC: &[u8; 4] = b"DDS ";
const KTX_MAGIC: &[u8; 12] = b"\xABKTX 11\xBB\r\n\x1A\n";

/// Mesh file understood by [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    /// Bounds minimum
    pub bbox_min: [f32; 3],
    /// Bounds maximum
    pub bbox_max: [f32; 3],
    /// Material of each triangle group
    #[serde(default)]
    pub groups: Vec<String>,
    /// Bone count when skinned
    #[serde(default)]
    pub bones: Option<u32>,
}

impl MeshDesc {
    /// Encode as RON bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        ron::to_string(self).unwrap_or_default().into_bytes()
    }
}

/// Animation file understood by [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimDesc {
    /// Number of keyframes
    pub frame_count: u32,
    /// Playback rate
    pub fps: f32,
}

impl AnimDesc {
    /// Encode as RON bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        ron::to_string(self).unwrap_or_default().into_bytes()
    }
}

/// Object counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// 2D and cube textures
    pub textures: usize,
    /// Meshes
    pub meshes: usize,
    /// Programs
    pub programs: usize,
    /// Animation sequences
    pub anims: usize,
    /// Buffers
    pub buffers: usize,
}

/// Backend that never touches a GPU
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    stats: HeadlessStats,
}

impl HeadlessBackend {
    /// Create a backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects created so far
    pub fn stats(&self) -> HeadlessStats {
        self.stats
    }

    fn handle(&mut self) -> GpuHandle {
        self.next_handle += 1;
        GpuHandle(self.next_handle)
    }

    fn decode_dims(name: &str, data: &[u8]) -> BackendResult<(u32, u32)> {
        let read_u32 = |at: usize| {
            data.get(at..at + 4)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        };

        let dims = if data.starts_with(DDS_MAGIC) {
            read_u32(16).zip(read_u32(12))
        } else if data.starts_with(KTX_MAGIC) {
            read_u32(36).zip(read_u32(40))
        } else {
            let img = ImageData::from_bytes(data).map_err(|e| BackendError::Decode {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            Some((img.width, img.height))
        };

        dims.ok_or_else(|| BackendError::Decode {
            name: name.to_string(),
            reason: "truncated texture header".to_string(),
        })
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_texture(&mut self, name: &str, data: &[u8], _params: &TextureParams) -> BackendResult<TextureInfo> {
        let (width, height) = Self::decode_dims(name, data)?;
        self.stats.textures += 1;
        Ok(TextureInfo {
            gpu: self.handle(),
            width,
            height,
        })
    }

    fn create_texture_cube(&mut self, name: &str, faces: [&[u8]; 6], _params: &TextureParams) -> BackendResult<TextureInfo> {
        let mut res = None;
        for face in faces {
            let (w, h) = Self::decode_dims(name, face)?;
            if w != h || res.is_some_and(|r| r != w) {
                return Err(BackendError::Decode {
                    name: name.to_string(),
                    reason: format!("cube face {w}x{h} is not square or differs from the others"),
                });
            }
            res = Some(w);
        }

        let res = res.unwrap_or(0);
        self.stats.textures += 1;
        Ok(TextureInfo {
            gpu: self.handle(),
            width: res,
            height: res,
        })
    }

    fn create_mesh(&mut self, name: &str, data: &[u8]) -> BackendResult<MeshInfo> {
        let desc: MeshDesc = ron::de::from_bytes(data).map_err(|e| BackendError::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        self.stats.meshes += 1;
        Ok(MeshInfo {
            gpu: self.handle(),
            bbox: AABB::new(Vec3::from(desc.bbox_min), Vec3::from(desc.bbox_max)),
            group_materials: desc.groups,
            bone_count: desc.bones,
        })
    }

    fn compile_program(&mut self, name: &str, vs_source: &str, fs_source: &str) -> BackendResult<GpuHandle> {
        if vs_source.trim().is_empty() || fs_source.trim().is_empty() {
            return Err(BackendError::Compile {
                name: name.to_string(),
                log: "empty shader source".to_string(),
            });
        }
        self.stats.programs += 1;
        Ok(self.handle())
    }

    fn create_anim_sequence(&mut self, name: &str, data: &[u8]) -> BackendResult<AnimInfo> {
        let desc: AnimDesc = ron::de::from_bytes(data).map_err(|e| BackendError::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.stats.anims += 1;
        Ok(AnimInfo {
            frame_count: desc.frame_count,
            fps: desc.fps,
        })
    }

    fn create_buffer(&mut self, _name: &str, _size: u32) -> BackendResult<GpuHandle> {
        self.stats.buffers += 1;
        Ok(self.handle())
    }
}

/// Minimal DDS header with the given dimensions, for tools and tests
pub fn dds_header(width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![0u8; 128];
    out[..4].copy_from_slice(DDS_MAGIC);
    out[4..8].copy_from_slice(&124u32.to_le_bytes());
    out[12..16].copy_from_slice(&height.to_le_bytes());
    out[16..20].copy_from_slice(&width.to_le_bytes());
    out
}
