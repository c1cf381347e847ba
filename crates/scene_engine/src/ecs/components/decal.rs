//! Decal component
//!
//! An oriented box projector. Its textures are packed into the shared decal
//! atlas at load time and referenced by normalized atlas rectangles.

use serde::{Deserialize, Serialize};

use crate::ecs::component::SceneComponent;
use crate::foundation::math::{translation_rotation, Mat4, Vec3, AABB};

/// Projected decal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decal {
    /// Box center relative to the object
    pub pos: [f32; 3],
    /// Euler rotation in degrees
    pub rot: [f32; 3],
    /// Half-size of the projection box
    pub dim: [f32; 3],
    /// Diffuse texture file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Normal map file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub norm: Option<String>,
    /// Specular texture file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,

    /// Object-to-decal view matrix
    #[serde(skip, default = "Mat4::identity")]
    pub view: Mat4,
    /// Orthographic projection onto the box
    #[serde(skip, default = "Mat4::identity")]
    pub proj: Mat4,
    /// Diffuse atlas rectangle `(u, v, w, h)`
    #[serde(skip)]
    pub diff_rect: [f32; 4],
    /// Normal atlas rectangle
    #[serde(skip)]
    pub norm_rect: [f32; 4],
    /// Specular atlas rectangle
    #[serde(skip)]
    pub spec_rect: [f32; 4],
}

impl Default for Decal {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            rot: [0.0; 3],
            dim: [1.0; 3],
            diff: None,
            norm: None,
            spec: None,
            view: Mat4::identity(),
            proj: Mat4::identity(),
            diff_rect: [0.0; 4],
            norm_rect: [0.0; 4],
            spec_rect: [0.0; 4],
        }
    }
}

impl Decal {
    /// Rebuild `view` and `proj` from the authored box
    pub fn update_matrices(&mut self) {
        let world_from_decal = translation_rotation(self.pos, self.rot);
        self.view = world_from_decal.try_inverse().unwrap_or_else(Mat4::identity);
        let inv_dim = Vec3::from(self.dim).map(|d| if d.abs() > f32::EPSILON { 1.0 / d } else { 0.0 });
        self.proj = Mat4::new_nonuniform_scaling(&inv_dim);
    }

    /// Object-space bounds: the clip cube pushed through `inverse(proj * view)`
    pub fn object_bounds(&self) -> Option<AABB> {
        let clip_to_object = (self.proj * self.view).try_inverse()?;
        let cube = AABB::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        Some(cube.transformed(&clip_to_object))
    }

    /// Texture names with the rectangle each one fills
    pub fn textures_mut(&mut self) -> [(Option<&str>, &mut [f32; 4]); 3] {
        [
            (self.diff.as_deref(), &mut self.diff_rect),
            (self.norm.as_deref(), &mut self.norm_rect),
            (self.spec.as_deref(), &mut self.spec_rect),
        ]
    }
}

impl SceneComponent for Decal {
    const NAME: &'static str = "Decal";

    fn on_read(&mut self) {
        self.update_matrices();
    }
}
