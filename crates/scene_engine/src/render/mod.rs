//! Render collaborator interface
//!
//! [`RenderBackend`] is the only point where the scene layer asks for GPU
//! objects. [`HeadlessBackend`] implements it without a device.

pub mod backend;
pub mod headless;

pub use backend::{
    AnimInfo, BackendError, BackendResult, GpuHandle, MeshInfo, RenderBackend, TexFilter, TexFormat, TexRepeat,
    TextureFlags, TextureInfo, TextureParams,
};
pub use headless::{AnimDesc, HeadlessBackend, HeadlessStats, MeshDesc};
