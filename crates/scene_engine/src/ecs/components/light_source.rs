//! Light source component
//!
//! Point and spot lights. The spot cone is given as a half-angle in degrees
//! (180 is an omni light) and kept as its cosine in `spot`.
//!
//! Bounds are built in the light's local frame, where the light shines down
//! `-Y`, then carried into object space by [`LightSource::local_transform`].

use serde::{Deserialize, Serialize};

use crate::ecs::component::SceneComponent;
use crate::foundation::math::{Mat4, Vec3, Vec4, AABB};

/// Punctual light attached to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSource {
    /// Linear RGB color
    pub color: [f32; 3],
    /// Intensity multiplier
    pub brightness: f32,
    /// Position relative to the object
    pub offset: [f32; 3],
    /// Direction the light points
    pub dir: [f32; 3],
    /// Emitter radius
    pub radius: f32,
    /// Distance at which the light stops contributing; falls back to `radius`
    pub influence: f32,
    /// Cone half-angle in degrees
    pub spot_angle: f32,
    /// Whether the light casts shadows
    pub cast_shadow: bool,

    /// Cosine of `spot_angle`
    #[serde(skip)]
    pub spot: f32,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            brightness: 1.0,
            offset: [0.0; 3],
            dir: [0.0, -1.0, 0.0],
            radius: 1.0,
            influence: 0.0,
            spot_angle: 180.0,
            cast_shadow: false,
            spot: -1.0,
        }
    }
}

impl LightSource {
    /// Normalized direction; `-Y` for a zero vector
    pub fn direction(&self) -> Vec3 {
        Vec3::from(self.dir)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0))
    }

    /// Local-to-object matrix with columns `side, -dir, up, offset`
    ///
    /// The up hint is the world axis least aligned with the direction, lowest
    /// axis first on ties.
    pub fn local_transform(&self) -> Mat4 {
        let dir = self.direction();
        let a = dir.abs();
        let hint = if a.x <= a.y && a.x <= a.z {
            Vec3::x()
        } else if a.y <= a.z {
            Vec3::y()
        } else {
            Vec3::z()
        };
        let side = dir.cross(&hint).normalize();
        let up = side.cross(&dir);

        let mut m = Mat4::identity();
        m.set_column(0, &side.push(0.0));
        m.set_column(1, &(-dir).push(0.0));
        m.set_column(2, &up.push(0.0));
        m.set_column(3, &Vec4::new(self.offset[0], self.offset[1], self.offset[2], 1.0));
        m
    }

    /// Bounds of the lit volume in the light's local frame
    pub fn local_bounds(&self) -> AABB {
        let r = self.influence;
        let down = Vec3::new(0.0, -1.0, 0.0);
        let mut bbox = AABB::from_point(Vec3::zeros());

        let p1 = down * r;
        bbox.expand_to_point(p1);

        let p2 = down * (self.spot * r);
        let d = (1.0 - self.spot * self.spot).max(0.0).sqrt() * r;
        bbox.expand_to_point(p2 - Vec3::new(d, 0.0, d));
        bbox.expand_to_point(p2 + Vec3::new(d, 0.0, d));

        if self.spot < 0.0 {
            bbox.expand_to_point(p1 - Vec3::new(r, 0.0, r));
            bbox.expand_to_point(p1 + Vec3::new(r, 0.0, r));
        }
        bbox
    }

    /// Bounds of the lit volume in object space
    pub fn object_bounds(&self) -> AABB {
        self.local_bounds().transformed(&self.local_transform())
    }
}

impl SceneComponent for LightSource {
    const NAME: &'static str = "LightSource";

    fn on_read(&mut self) {
        if let Some(dir) = Vec3::from(self.dir).try_normalize(f32::EPSILON) {
            self.dir = dir.into();
        }
        if self.influence <= 0.0 {
            self.influence = self.radius;
        }
        self.spot = self.spot_angle.to_radians().cos();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn read(value: serde_json::Value) -> LightSource {
        let mut ls: LightSource = serde_json::from_value(value).unwrap();
        ls.on_read();
        ls
    }

    #[test]
    fn test_defaults_and_derived_fields() {
        let ls = read(json!({ "radius": 2.0, "spot_angle": 60.0 }));
        assert_relative_eq!(ls.influence, 2.0);
        assert_relative_eq!(ls.spot, 0.5, epsilon = 1e-6);
        assert_eq!(ls.dir, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_omni_light_bounds_are_a_cube() {
        let ls = read(json!({ "influence": 4.0, "offset": [1.0, 0.0, 0.0] }));
        let bbox = ls.object_bounds();
        assert_relative_eq!(bbox.min, Vec3::new(-3.0, -4.0, -4.0), epsilon = 1e-4);
        assert_relative_eq!(bbox.max, Vec3::new(5.0, 4.0, 4.0), epsilon = 1e-4);
    }

    #[test]
    fn test_wide_spot_bounds_reach_behind_the_cone_tip() {
        let ls = read(json!({ "influence": 2.0, "spot_angle": 120.0 }));
        assert_relative_eq!(ls.spot, -0.5, epsilon = 1e-6);

        let bbox = ls.local_bounds();
        assert_relative_eq!(bbox.min, Vec3::new(-2.0, -2.0, -2.0), epsilon = 1e-4);
        assert_relative_eq!(bbox.max, Vec3::new(2.0, 1.0, 2.0), epsilon = 1e-4);
    }

    #[test]
    fn test_spot_bounds_follow_direction_and_offset() {
        let ls = read(json!({
            "influence": 10.0,
            "spot_angle": 30.0,
            "dir": [1.0, 0.0, 0.0],
            "offset": [0.0, 5.0, 0.0]
        }));
        let bbox = ls.object_bounds();
        assert_relative_eq!(bbox.max.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(bbox.min.x, 0.0, epsilon = 1e-4);
        assert!(bbox.contains_point(Vec3::new(0.0, 5.0, 0.0)));
        assert!(bbox.contains_point(Vec3::new(8.0, 5.0, 0.0)));
        assert!(!bbox.contains_point(Vec3::new(-1.0, 5.0, 0.0)));
    }
}
