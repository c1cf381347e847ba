//! Component traits and the type-erased storage contract
//!
//! Concrete component types implement [`SceneComponent`]. The registry never
//! sees them directly: it holds one [`CompStorage`] trait object per slot and
//! talks to it through indices, `dyn Any` views and JSON values. Any storage
//! layout can sit behind the trait; [`DefaultCompStorage`] is the sparse-array
//! one used for every built-in component.

use std::any::Any;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::foundation::collections::SparseArray;

/// Data attached to scene objects and round-tripped through scene documents
pub trait SceneComponent: Serialize + DeserializeOwned + Default + Any + Send + Sync {
    /// Key under which the component appears in an object node
    const NAME: &'static str;

    /// Recompute derived fields after deserialization
    fn on_read(&mut self) {}
}

/// Errors from component storages and the registry
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// Slot outside `0..MAX_COMPONENT_TYPES`
    #[error("Component slot {0} is out of range")]
    InvalidSlot(usize),

    /// Slot has no storage
    #[error("No component registered in slot {0}")]
    Unregistered(usize),

    /// Registration attempted after the first scene load
    #[error("Component registry is sealed, cannot register '{0}'")]
    RegistrySealed(String),

    /// Another slot already uses the name
    #[error("Component name '{0}' is already registered")]
    DuplicateName(String),

    /// Index does not refer to a live component
    #[error("{component}: no component at index {index}")]
    InvalidIndex {
        /// Component name
        component: String,
        /// Offending index
        index: u32,
    },

    /// Node could not be read or written
    #[error("{component}: {source}")]
    Serde {
        /// Component name
        component: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Type-erased storage for one component type
pub trait CompStorage: Send + Sync {
    /// Component name, matched against object node keys
    fn name(&self) -> &str;

    /// Allocate a default-constructed component
    fn create(&mut self) -> u32;

    /// Free a component; false if the index was not live
    fn delete(&mut self, index: u32) -> bool;

    /// Read-only view of a component
    fn get(&self, index: u32) -> Option<&dyn Any>;

    /// Mutable view of a component
    fn get_mut(&mut self, index: u32) -> Option<&mut dyn Any>;

    /// First live index or `INVALID_INDEX`
    fn first(&self) -> u32;

    /// Next live index after `index` or `INVALID_INDEX`
    fn next(&self, index: u32) -> u32;

    /// Number of live components
    fn count(&self) -> usize;

    /// Drop every component
    fn clear(&mut self);

    /// Overwrite the component at `index` from a serialized node
    fn read_from_serialized(&mut self, index: u32, node: &JsonValue) -> Result<(), ComponentError>;

    /// Serialize the component at `index`
    fn write_to_serialized(&self, index: u32) -> Result<JsonValue, ComponentError>;

    /// Whether live components are packed contiguously
    fn is_dense(&self) -> bool {
        false
    }
}

/// Sparse-array storage for a [`SceneComponent`]
pub struct DefaultCompStorage<T: SceneComponent> {
    data: SparseArray<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SceneComponent> Default for DefaultCompStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SceneComponent> DefaultCompStorage<T> {
    /// Empty storage
    pub fn new() -> Self {
        Self {
            data: SparseArray::new(),
            _marker: PhantomData,
        }
    }

    /// Boxed for registration
    pub fn boxed() -> Box<dyn CompStorage> {
        Box::new(Self::new())
    }

    /// Typed access
    pub fn get_typed(&self, index: u32) -> Option<&T> {
        self.data.get(index)
    }

    fn invalid(index: u32) -> ComponentError {
        ComponentError::InvalidIndex {
            component: T::NAME.to_string(),
            index,
        }
    }

    fn serde_error(source: serde_json::Error) -> ComponentError {
        ComponentError::Serde {
            component: T::NAME.to_string(),
            source,
        }
    }
}

impl<T: SceneComponent> CompStorage for DefaultCompStorage<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn create(&mut self) -> u32 {
        self.data.emplace()
    }

    fn delete(&mut self, index: u32) -> bool {
        self.data.remove(index).is_some()
    }

    fn get(&self, index: u32) -> Option<&dyn Any> {
        self.data.get(index).map(|c| c as &dyn Any)
    }

    fn get_mut(&mut self, index: u32) -> Option<&mut dyn Any> {
        self.data.get_mut(index).map(|c| c as &mut dyn Any)
    }

    fn first(&self) -> u32 {
        self.data.first()
    }

    fn next(&self, index: u32) -> u32 {
        self.data.next(index)
    }

    fn count(&self) -> usize {
        self.data.len()
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn read_from_serialized(&mut self, index: u32, node: &JsonValue) -> Result<(), ComponentError> {
        let slot = self.data.get_mut(index).ok_or_else(|| Self::invalid(index))?;
        let mut comp = T::deserialize(node).map_err(Self::serde_error)?;
        comp.on_read();
        *slot = comp;
        Ok(())
    }

    fn write_to_serialized(&self, index: u32) -> Result<JsonValue, ComponentError> {
        let comp = self.data.get(index).ok_or_else(|| Self::invalid(index))?;
        serde_json::to_value(comp).map_err(Self::serde_error)
    }
}
