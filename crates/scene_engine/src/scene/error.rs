//! Scene load and save errors
//!
//! Everything here aborts a load. Asset I/O and decode problems are not in
//! this list: they are logged and leave the affected resource not ready.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ecs::component::ComponentError;
use crate::ecs::EntityId;
use crate::spatial::{AtlasError, ProbeError};

/// Fatal scene errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Document has no `name`
    #[error("Level has no name")]
    MissingName,

    /// Document or object node has the wrong shape
    #[error("Malformed scene: {0}")]
    Malformed(String),

    /// A component node failed to deserialize or register
    #[error(transparent)]
    Component(#[from] ComponentError),

    /// Object node without a Transform
    #[error("Object {0} has no Transform")]
    MissingTransform(usize),

    /// Entity index out of range
    #[error("No entity {0}")]
    InvalidEntity(EntityId),

    /// Lightmap atlas is full
    #[error("Cannot allocate {width}x{height} lightmap region")]
    LightmapAllocation {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Decal atlas rejected a texture
    #[error("Cannot allocate decal texture '{texture}': {source}")]
    DecalAllocation {
        /// Texture file
        texture: String,
        /// Atlas failure
        #[source]
        source: AtlasError,
    },

    /// Probe storage is full
    #[error(transparent)]
    ProbeStorage(#[from] ProbeError),

    /// Invalid scene configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scene text is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scene file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
