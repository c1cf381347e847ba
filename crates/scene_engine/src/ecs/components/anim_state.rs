//! Animation playback state

use serde::{Deserialize, Serialize};

use crate::ecs::component::SceneComponent;

/// Per-object skeletal animation clock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimState {
    /// Playback time in seconds
    pub anim_time: f32,
    /// Index into the mesh's animation list
    pub anim_index: u32,
}

impl SceneComponent for AnimState {
    const NAME: &'static str = "AnimState";
}
