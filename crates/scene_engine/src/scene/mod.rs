//! Scene management
//!
//! ## Architecture
//!
//! ```text
//! Scene document (JSON)
//!      ↓
//! Scene Manager ── post-load hooks ──→ allocators (lightmaps, decals, probes)
//!      ↓                        └────→ resource caches (meshes, materials, textures)
//! Streaming bridge ←── asset loader threads
//! ```
//!
//! The Scene Manager:
//! - Reads objects and their components through the component registry
//! - Resolves resource references and packs atlas space per component
//! - Streams textures and probe cubemaps in the background
//! - Writes the scene back in the same document format

mod error;
mod post_load;
mod resolver;
mod scene_data;
mod scene_manager;
mod streaming;

#[cfg(test)]
mod tests;

pub use error::SceneError;
pub use post_load::{
    post_load_decal, post_load_drawable, post_load_light_probe, post_load_light_source, post_load_lightmap,
    post_load_occluder, typed_hook, BoxedHook, PostLoadContext, PostLoadHook,
};
pub use resolver::SceneResources;
pub use scene_data::{Environment, EnvironmentDesc, SceneData};
pub use scene_manager::SceneManager;
pub use streaming::{SceneToken, StreamingBridge, Task};
