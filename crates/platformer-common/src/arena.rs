//! Generational arena storage.
//!
//! Slots are reused through a free list. Every reuse bumps the slot
//! generation, so [`Handle`]s to removed values stay dead forever.
//! Iteration always walks slots in index order, which keeps simulations
//! that iterate an arena deterministic.

use tracing::trace;

use crate::error::{ArenaError, ArenaResult};
use crate::ids::Handle;

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena-based storage addressed by typed generational handles.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Creates an arena with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no live values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots (live and free).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Inserts a value and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.insert_with(|_| value)
    }

    /// Inserts a value built from its own handle.
    ///
    /// Useful for values that need to know their identity.
    pub fn insert_with(&mut self, build: impl FnOnce(Handle<T>) -> T) -> Handle<T> {
        let handle = if let Some(index) = self.free_list.pop() {
            Handle::from_raw_parts(index, self.slots[index as usize].generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: None,
            });
            Handle::from_raw_parts(index, 0)
        };

        self.slots[handle.index() as usize].value = Some(build(handle));
        self.len += 1;
        handle
    }

    /// Removes the value behind a handle.
    pub fn remove(&mut self, handle: Handle<T>) -> ArenaResult<T> {
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .ok_or_else(|| not_found(handle))?;

        let value = slot.value.take().ok_or_else(|| not_found(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index());
        self.len -= 1;

        trace!("Freed arena slot {}", handle);
        Ok(value)
    }

    /// Gets a reference to a live value.
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Gets a mutable reference to a live value.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Gets a reference to a live value, or an error for stale handles.
    pub fn try_get(&self, handle: Handle<T>) -> ArenaResult<&T> {
        self.get(handle).ok_or_else(|| not_found(handle))
    }

    /// Checks whether a handle refers to a live value.
    #[must_use]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Iterates over live values with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::from_raw_parts(index as u32, slot.generation), value))
        })
    }

    /// Iterates mutably over live values with their handles, in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (Handle::from_raw_parts(index as u32, generation), value))
        })
    }

    /// Iterates over live values.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    /// Returns all live handles.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Removes every value for which `keep` returns false.
    ///
    /// Returns the number of removed values.
    pub fn retain(&mut self, mut keep: impl FnMut(Handle<T>, &mut T) -> bool) -> usize {
        let doomed: Vec<Handle<T>> = self
            .iter_mut()
            .filter_map(|(handle, value)| (!keep(handle, value)).then_some(handle))
            .collect();

        doomed
            .into_iter()
            .filter(|handle| self.remove(*handle).is_ok())
            .count()
    }

    /// Removes every value. Slots are kept so old handles stay dead.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
        self.len = 0;
    }
}

fn not_found<T>(handle: Handle<T>) -> ArenaError {
    ArenaError::NotFound {
        index: handle.index(),
        generation: handle.generation(),
    }
}
