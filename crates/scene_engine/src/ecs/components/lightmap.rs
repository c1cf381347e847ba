//! Lightmap component
//!
//! Requests a rectangle of the shared lightmap atlas. After loading, `xform`
//! maps the object's lightmap UVs into the atlas: `(x/W, 1 - y/H, w/W, -h/H)`,
//! with the V axis flipped because the atlas origin is top-left.

use serde::{Deserialize, Serialize};

use crate::ecs::component::SceneComponent;

/// Lightmap region of an object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lightmap {
    /// Requested region size in texels
    pub size: [u32; 2],

    /// Allocated top-left texel
    #[serde(skip)]
    pub pos: [u32; 2],
    /// UV scale and offset into the atlas
    #[serde(skip)]
    pub xform: [f32; 4],
}

impl Lightmap {
    /// Set `pos` and derive `xform` for an atlas of `atlas` size
    pub fn place(&mut self, pos: [u32; 2], atlas: [u32; 2]) {
        let (aw, ah) = (atlas[0] as f32, atlas[1] as f32);
        self.pos = pos;
        self.xform = [
            pos[0] as f32 / aw,
            1.0 - pos[1] as f32 / ah,
            self.size[0] as f32 / aw,
            -(self.size[1] as f32) / ah,
        ];
    }
}

impl SceneComponent for Lightmap {
    const NAME: &'static str = "Lightmap";
}
