//! Transform component
//!
//! Position and euler rotation as authored in the scene document, plus the
//! derived world matrix and bounds. `bbox` is the object-space union of
//! everything the object's other components contribute; `bbox_ws` is that box
//! carried into world space by `mat`.

use serde::{Deserialize, Serialize};

use crate::ecs::component::SceneComponent;
use crate::foundation::math::{translation_rotation, Mat4, AABB};

/// Placement of a scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// World position
    pub pos: [f32; 3],
    /// Euler rotation in degrees
    pub rot: [f32; 3],

    /// Object-to-world matrix
    #[serde(skip, default = "Mat4::identity")]
    pub mat: Mat4,
    /// Object-space bounds
    #[serde(skip)]
    pub bbox: AABB,
    /// World-space bounds
    #[serde(skip)]
    pub bbox_ws: AABB,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            rot: [0.0; 3],
            mat: Mat4::identity(),
            bbox: AABB::empty(),
            bbox_ws: AABB::empty(),
        }
    }
}

impl Transform {
    /// Transform at `pos` with no rotation
    pub fn from_position(pos: [f32; 3]) -> Self {
        let mut tr = Self {
            pos,
            ..Self::default()
        };
        tr.update_matrix();
        tr
    }

    /// Rebuild `mat` from `pos` and `rot`
    pub fn update_matrix(&mut self) {
        self.mat = translation_rotation(self.pos, self.rot);
    }

    /// Rebuild `bbox_ws` from `bbox` and `mat`
    pub fn update_bbox(&mut self) {
        self.bbox_ws = self.bbox.transformed(&self.mat);
    }
}

impl SceneComponent for Transform {
    const NAME: &'static str = "Transform";

    fn on_read(&mut self) {
        self.update_matrix();
    }
}
