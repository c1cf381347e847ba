//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the axis-aligned bounding box used by
//! every bounds computation in the scene layer.

pub use nalgebra::{Matrix3, Matrix4, Rotation3, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Build a homogeneous rotation from euler angles given in degrees (x, y, z).
pub fn rotation_from_euler_deg(rot: [f32; 3]) -> Mat4 {
    Rotation3::from_euler_angles(
        rot[0].to_radians(),
        rot[1].to_radians(),
        rot[2].to_radians(),
    )
    .to_homogeneous()
}

/// Translation followed by an euler rotation in degrees.
pub fn translation_rotation(pos: [f32; 3], rot: [f32; 3]) -> Mat4 {
    Mat4::new_translation(&Vec3::from(pos)) * rotation_from_euler_deg(rot)
}

/// Axis-aligned bounding box
///
/// The empty box has `min > max` on every axis, so expanding it by any
/// point yields exactly that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

impl AABB {
    /// Create an AABB from explicit corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A box that contains nothing
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(-f32::MAX),
        }
    }

    /// Degenerate box around a single point
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// True when no point has been added
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the center point of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box to include `p`
    pub fn expand_to_point(&mut self, p: Vec3) {
        self.min = self.min.inf(&p);
        self.max = self.max.sup(&p);
    }

    /// Grow the box to include `other`
    pub fn expand_to_aabb(&mut self, other: &AABB) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Union of two boxes
    pub fn union(&self, other: &AABB) -> AABB {
        let mut out = *self;
        out.expand_to_aabb(other);
        out
    }

    /// The eight corners, in bit order x/y/z of the index
    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::zeros(); 8];
        for (i, c) in out.iter_mut().enumerate() {
            *c = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        out
    }

    /// Box enclosing this box after transformation by `m`
    pub fn transformed(&self, m: &Mat4) -> AABB {
        if self.is_empty() {
            return *self;
        }
        let mut out = AABB::empty();
        for c in self.corners() {
            let p = m.transform_point(&Point3::from(c));
            out.expand_to_point(p.coords);
        }
        out
    }

    /// Check if a point is inside the AABB
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this AABB intersects with another
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}
