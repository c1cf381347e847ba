//! Abstract spatial index over entity bounds
//!
//! The scene rebuilds the index from world-space boxes after every load.
//! Culling structures (BVH, octree, grid) plug in behind [`SpatialIndex`];
//! [`LinearIndex`] is the brute-force default.

use crate::ecs::EntityId;
use crate::foundation::math::AABB;

/// Spatial lookup over `(entity, world bounds)` pairs
pub trait SpatialIndex: Send + Sync {
    /// Replace the contents with `items`
    fn rebuild(&mut self, items: &[(EntityId, AABB)]);

    /// Entities whose bounds intersect `aabb`
    fn query_aabb(&self, aabb: &AABB) -> Vec<EntityId>;

    /// Entities whose bounds contain `point`
    fn query_point(&self, point: crate::foundation::math::Vec3) -> Vec<EntityId> {
        self.query_aabb(&AABB::from_point(point))
    }

    /// Remove everything
    fn clear(&mut self);

    /// Number of indexed entities
    fn entity_count(&self) -> usize;
}

/// Flat list, tests every box on each query
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    items: Vec<(EntityId, AABB)>,
}

impl LinearIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for LinearIndex {
    fn rebuild(&mut self, items: &[(EntityId, AABB)]) {
        self.items = items.iter().filter(|(_, b)| !b.is_empty()).copied().collect();
    }

    fn query_aabb(&self, aabb: &AABB) -> Vec<EntityId> {
        self.items
            .iter()
            .filter(|(_, b)| b.intersects(aabb))
            .map(|(id, _)| *id)
            .collect()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn entity_count(&self) -> usize {
        self.items.len()
    }
}
