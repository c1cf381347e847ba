//! Occluder component

use serde::{Deserialize, Serialize};

use crate::assets::MeshRef;
use crate::ecs::component::SceneComponent;

/// Low-detail mesh used only for occlusion culling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Occluder {
    /// Mesh file, relative to the models directory
    pub mesh_file: String,

    /// Resolved mesh
    #[serde(skip)]
    pub mesh: Option<MeshRef>,
}

impl SceneComponent for Occluder {
    const NAME: &'static str = "Occluder";
}
