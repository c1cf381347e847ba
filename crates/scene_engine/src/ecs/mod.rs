//! Entity-Component store
//!
//! Scene objects are rows of component indices; components live in
//! type-erased per-slot storages held by a [`ComponentRegistry`].

pub mod component;
pub mod components;
pub mod entity;
pub mod registry;

pub use component::{CompStorage, ComponentError, DefaultCompStorage, SceneComponent};
pub use entity::{slot, ComponentMask, EntityId, SceneObject, MAX_COMPONENT_TYPES};
pub use registry::ComponentRegistry;
