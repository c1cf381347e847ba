//! # Scene Engine
//!
//! Scene data and asset streaming layer of a real-time 3D engine.
//!
//! ## Features
//!
//! - **Scene Documents**: JSON levels read into a slot-based component store and written back
//! - **Resource Caches**: Named, reference-counted meshes, materials, programs, textures and animations
//! - **Atlases**: Lightmap and decal atlas packing, light-probe cubemap storage
//! - **Streaming**: Background texture and probe loads applied on the owning thread
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     scene_engine::foundation::logging::init();
//!
//!     let config = SceneConfig::default();
//!     let io = Arc::new(FileAssetLoader::new(config.io_threads)?);
//!     let mut scene = SceneManager::new(config, Box::new(HeadlessBackend::new()), io)?;
//!
//!     scene.load_scene_from_str(&std::fs::read_to_string("assets_pc/scenes/level.json")?)?;
//!     loop {
//!         scene.process_pending_tasks();
//!         if scene.pending_texture_loads() == 0 {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetLoader, FileAssetLoader, ResourceContext, ResourceRef},
        core::config::{AssetPaths, Platform, SceneConfig},
        ecs::{
            components::{AnimState, Decal, Drawable, LightProbe, LightSource, Lightmap, Occluder, Transform},
            slot, EntityId, SceneComponent,
        },
        foundation::math::{Mat4, Vec3, AABB},
        render::{HeadlessBackend, RenderBackend},
        scene::{SceneError, SceneManager},
    };
}
