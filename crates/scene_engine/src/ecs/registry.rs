//! Component registry
//!
//! Fixed table of [`CompStorage`] objects indexed by slot, each with an
//! optional post-load hook. The hook type is a parameter so the registry does
//! not depend on what the scene loader passes to hooks.
//!
//! Registration happens while the owner is being set up. Once the owner seals
//! the registry (at the first scene load) the table is frozen.

use crate::ecs::component::{CompStorage, ComponentError, SceneComponent};
use crate::ecs::entity::MAX_COMPONENT_TYPES;

/// Slot table of component storages and hooks
pub struct ComponentRegistry<H> {
    storages: [Option<Box<dyn CompStorage>>; MAX_COMPONENT_TYPES],
    hooks: [Option<H>; MAX_COMPONENT_TYPES],
    sealed: bool,
}

impl<H> Default for ComponentRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ComponentRegistry<H> {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            storages: std::array::from_fn(|_| None),
            hooks: std::array::from_fn(|_| None),
            sealed: false,
        }
    }

    /// Install `storage` in `slot`, replacing anything already there
    pub fn register(&mut self, slot: usize, storage: Box<dyn CompStorage>, hook: Option<H>) -> Result<(), ComponentError> {
        if slot >= MAX_COMPONENT_TYPES {
            return Err(ComponentError::InvalidSlot(slot));
        }
        if self.sealed {
            return Err(ComponentError::RegistrySealed(storage.name().to_string()));
        }
        if let Some(other) = self.find_slot(storage.name()) {
            if other != slot {
                return Err(ComponentError::DuplicateName(storage.name().to_string()));
            }
        }

        log::debug!("Registered component '{}' in slot {slot}", storage.name());
        self.storages[slot] = Some(storage);
        self.hooks[slot] = hook;
        Ok(())
    }

    /// Freeze the table
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether [`ComponentRegistry::seal`] was called
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Slot whose storage is called `name`; case-sensitive
    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.storages
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.name() == name))
    }

    /// Storage in `slot`
    pub fn storage(&self, slot: usize) -> Option<&dyn CompStorage> {
        self.storages.get(slot)?.as_deref()
    }

    /// Mutable storage in `slot`
    pub fn storage_mut(&mut self, slot: usize) -> Option<&mut (dyn CompStorage + 'static)> {
        self.storages.get_mut(slot)?.as_deref_mut()
    }

    /// Hook in `slot`
    pub fn hook(&self, slot: usize) -> Option<&H> {
        self.hooks.get(slot)?.as_ref()
    }

    /// Storage and hook of one slot borrowed together
    pub fn parts_mut(&mut self, slot: usize) -> Option<(&mut (dyn CompStorage + 'static), Option<&H>)> {
        let storage = self.storages.get_mut(slot)?.as_deref_mut()?;
        let hook = self.hooks.get(slot).and_then(Option::as_ref);
        Some((storage, hook))
    }

    /// Registered slots in ascending order
    pub fn slots(&self) -> impl Iterator<Item = (usize, &dyn CompStorage)> {
        self.storages
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_deref().map(|s| (i, s)))
    }

    /// Typed component lookup
    pub fn get<T: SceneComponent>(&self, slot: usize, index: u32) -> Option<&T> {
        self.storage(slot)?.get(index)?.downcast_ref::<T>()
    }

    /// Typed mutable component lookup
    pub fn get_mut<T: SceneComponent>(&mut self, slot: usize, index: u32) -> Option<&mut T> {
        self.storage_mut(slot)?.get_mut(index)?.downcast_mut::<T>()
    }

    /// Empty every storage; registrations stay
    pub fn clear_storages(&mut self) {
        for storage in self.storages.iter_mut().flatten() {
            storage.clear();
        }
    }
}
