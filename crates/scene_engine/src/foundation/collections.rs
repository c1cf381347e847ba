//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

/// Sentinel returned by [`SparseArray::first`] and [`SparseArray::next`]
/// when iteration is exhausted.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Index-stable sparse array
///
/// Removed slots are recycled by later insertions. Iteration visits occupied
/// slots in ascending index order.
#[derive(Debug, Clone)]
pub struct SparseArray<T> {
    items: Vec<Option<T>>,
    free_indices: Vec<u32>,
    len: usize,
}

impl<T> Default for SparseArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseArray<T> {
    /// Create a new sparse array
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free_indices: Vec::new(),
            len: 0,
        }
    }

    /// Insert an item and return its index
    pub fn insert(&mut self, item: T) -> u32 {
        self.len += 1;
        if let Some(index) = self.free_indices.pop() {
            self.items[index as usize] = Some(item);
            index
        } else {
            let index = self.items.len() as u32;
            self.items.push(Some(item));
            index
        }
    }

    /// Remove an item by index
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let item = self.items.get_mut(index as usize)?.take()?;
        self.free_indices.push(index);
        self.len -= 1;
        Some(item)
    }

    /// Get an item by index
    pub fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)?.as_ref()
    }

    /// Get a mutable reference to an item by index
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.items.get_mut(index as usize)?.as_mut()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every item and forget recycled indices
    pub fn clear(&mut self) {
        self.items.clear();
        self.free_indices.clear();
        self.len = 0;
    }

    /// Lowest occupied index, or [`INVALID_INDEX`]
    pub fn first(&self) -> u32 {
        self.scan_from(0)
    }

    /// Next occupied index after `index`, or [`INVALID_INDEX`]
    pub fn next(&self, index: u32) -> u32 {
        if index == INVALID_INDEX {
            return INVALID_INDEX;
        }
        self.scan_from(index as usize + 1)
    }

    fn scan_from(&self, start: usize) -> u32 {
        self.items
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, item)| item.is_some())
            .map_or(INVALID_INDEX, |(i, _)| i as u32)
    }

    /// Iterate occupied slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().map(|v| (i as u32, v)))
    }
}

impl<T: Default> SparseArray<T> {
    /// Insert a default-constructed item
    pub fn emplace(&mut self) -> u32 {
        self.insert(T::default())
    }
}
