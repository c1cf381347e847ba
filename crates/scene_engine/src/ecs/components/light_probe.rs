//! Light probe component

use serde::{Deserialize, Serialize};

use crate::ecs::component::SceneComponent;
use crate::foundation::math::{Vec3, AABB};

/// Spherical region lit from a cubemap in the probe storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightProbe {
    /// Center relative to the object
    pub offset: [f32; 3],
    /// Radius of influence
    pub radius: f32,

    /// Cubemap layer in the probe storage, set at load
    #[serde(skip)]
    pub layer_index: Option<u32>,
}

impl Default for LightProbe {
    fn default() -> Self {
        Self {
            offset: [0.0; 3],
            radius: 1.0,
            layer_index: None,
        }
    }
}

impl LightProbe {
    /// Object-space bounds of the influence sphere
    pub fn object_bounds(&self) -> AABB {
        AABB::from_center_extents(Vec3::from(self.offset), Vec3::repeat(self.radius))
    }
}

impl SceneComponent for LightProbe {
    const NAME: &'static str = "LightProbe";
}
