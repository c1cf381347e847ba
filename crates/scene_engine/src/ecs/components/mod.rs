//! Built-in scene components
//!
//! Each component knows how to read and write itself from a scene document.
//! Derived state (matrices, resolved resources, atlas placements) is skipped
//! by serialization and rebuilt at load time.

pub mod anim_state;
pub mod decal;
pub mod drawable;
pub mod light_probe;
pub mod light_source;
pub mod lightmap;
pub mod occluder;
pub mod transform;

pub use anim_state::AnimState;
pub use decal::Decal;
pub use drawable::Drawable;
pub use light_probe::LightProbe;
pub use light_source::LightSource;
pub use lightmap::Lightmap;
pub use occluder::Occluder;
pub use transform::Transform;
