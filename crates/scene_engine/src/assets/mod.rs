//! Asset loading and resource caching
//!
//! - [`AssetLoader`] reads files, synchronously or on background threads
//! - [`ResourceContext`] owns the named caches of GPU resources
//! - [`MaterialParser`] reads material description files

pub mod file_loader;
pub mod image_loader;
pub mod materials;
pub mod resource;
pub mod resource_manager;
pub mod resource_types;

pub use file_loader::FileAssetLoader;
pub use image_loader::ImageData;
pub use materials::{MaterialParser, MaterialSource, ProgramDecl, TextureDecl};
pub use resource::{LoadStatus, ResourceKey, ResourceRef, ResourceStorage};
pub use resource_manager::ResourceContext;
pub use resource_types::{
    AnimSeqRef, AnimSequence, Buffer, BufferRef, Material, MaterialRef, Mesh, MeshRef, Program, ProgramRef,
    Skeleton, Texture, TextureRef, TriGroup,
};

use thiserror::Error;

use crate::render::BackendError;

/// Called with the file contents when a background read succeeds
pub type LoadSuccess = Box<dyn FnOnce(Vec<u8>) + Send + 'static>;

/// Called when a background read fails
pub type LoadFailure = Box<dyn FnOnce() + Send + 'static>;

/// File access used by the scene layer
///
/// Exactly one of the two callbacks given to [`AssetLoader::load_async`] runs,
/// on whatever thread the loader chooses. Callbacks must not assume they run
/// on the main thread.
pub trait AssetLoader: Send + Sync {
    /// Read a whole file on the calling thread
    fn read_file_sync(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// Read a file in the background and report through one of the callbacks
    fn load_async(&self, path: &str, on_success: LoadSuccess, on_failure: LoadFailure);
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid asset data: {0}")]
    InvalidData(String),

    /// Unsupported format
    #[error("Unsupported asset format: {0}")]
    UnsupportedFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// GPU object creation failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}
