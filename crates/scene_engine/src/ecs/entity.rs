//! Entity implementation
//!
//! A scene object is a row of component indices, one per registered slot,
//! plus a bitmask saying which of those indices are meaningful.

use bitflags::bitflags;

use crate::foundation::collections::INVALID_INDEX;

/// Number of component slots an object can carry
pub const MAX_COMPONENT_TYPES: usize = 32;

/// Index of an object in the scene's object list
pub type EntityId = u32;

/// Fixed slot assignments for the built-in components
pub mod slot {
    /// [`Transform`](crate::ecs::components::Transform)
    pub const TRANSFORM: usize = 0;
    /// [`Drawable`](crate::ecs::components::Drawable)
    pub const DRAWABLE: usize = 1;
    /// [`Occluder`](crate::ecs::components::Occluder)
    pub const OCCLUDER: usize = 2;
    /// [`Lightmap`](crate::ecs::components::Lightmap)
    pub const LIGHTMAP: usize = 3;
    /// [`LightSource`](crate::ecs::components::LightSource)
    pub const LIGHT_SOURCE: usize = 4;
    /// [`Decal`](crate::ecs::components::Decal)
    pub const DECAL: usize = 5;
    /// [`LightProbe`](crate::ecs::components::LightProbe)
    pub const LIGHT_PROBE: usize = 6;
    /// [`AnimState`](crate::ecs::components::AnimState)
    pub const ANIM_STATE: usize = 7;
}

bitflags! {
    /// Which component slots an object uses
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentMask: u32 {
        /// Transform slot
        const TRANSFORM = 1 << slot::TRANSFORM;
        /// Drawable slot
        const DRAWABLE = 1 << slot::DRAWABLE;
        /// Occluder slot
        const OCCLUDER = 1 << slot::OCCLUDER;
        /// Lightmap slot
        const LIGHTMAP = 1 << slot::LIGHTMAP;
        /// Light source slot
        const LIGHT_SOURCE = 1 << slot::LIGHT_SOURCE;
        /// Decal slot
        const DECAL = 1 << slot::DECAL;
        /// Light probe slot
        const LIGHT_PROBE = 1 << slot::LIGHT_PROBE;
        /// Animation state slot
        const ANIM_STATE = 1 << slot::ANIM_STATE;
    }
}

impl ComponentMask {
    /// Mask with only `slot` set; works for custom slots too
    pub fn from_slot(slot: usize) -> Self {
        debug_assert!(slot < MAX_COMPONENT_TYPES);
        Self::from_bits_retain(1 << slot)
    }

    /// True if `slot` is set
    pub fn has_slot(self, slot: usize) -> bool {
        slot < MAX_COMPONENT_TYPES && self.bits() & (1 << slot) != 0
    }

    /// Set slots in ascending order
    pub fn slots(self) -> impl Iterator<Item = usize> {
        (0..MAX_COMPONENT_TYPES).filter(move |&s| self.has_slot(s))
    }
}

/// A loaded scene object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneObject {
    /// Optional unique name
    pub name: Option<String>,
    /// Slots in use
    pub comp_mask: ComponentMask,
    /// Storage index per slot, [`INVALID_INDEX`] when unused
    pub components: [u32; MAX_COMPONENT_TYPES],
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: None,
            comp_mask: ComponentMask::empty(),
            components: [INVALID_INDEX; MAX_COMPONENT_TYPES],
        }
    }
}

impl SceneObject {
    /// Object with no components
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage index of the component in `slot`, if present
    pub fn component(&self, slot: usize) -> Option<u32> {
        self.comp_mask.has_slot(slot).then(|| self.components[slot])
    }

    /// Record a component; mask and index change together
    pub fn attach(&mut self, slot: usize, index: u32) {
        self.components[slot] = index;
        self.comp_mask.insert(ComponentMask::from_slot(slot));
    }

    /// Forget a component; returns its former storage index
    pub fn detach(&mut self, slot: usize) -> Option<u32> {
        let index = self.component(slot)?;
        self.components[slot] = INVALID_INDEX;
        self.comp_mask.remove(ComponentMask::from_slot(slot));
        Some(index)
    }
}
