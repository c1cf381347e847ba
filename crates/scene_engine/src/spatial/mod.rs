//! Spatial allocators and indexing
//!
//! - [`TextureSplitter`]: rectangle allocator used for the lightmap atlas
//! - [`TextureAtlas`]: RGBA decal atlas with border padding and mips
//! - [`ProbeStorage`]: cubemap array for light probes with streamed mips
//! - [`SpatialIndex`]: lookup over entity world bounds

pub mod probe_storage;
pub mod spatial_index;
pub mod texture_atlas;
pub mod texture_splitter;

pub use probe_storage::{ProbeError, ProbeLevel, ProbeLevelReader, ProbeStorage};
pub use spatial_index::{LinearIndex, SpatialIndex};
pub use texture_atlas::{AtlasError, AtlasRegion, TextureAtlas};
pub use texture_splitter::{SplitNode, TextureSplitter};
