//! crates/logging-sink/src/arena.rs
//! Fixed-capacity slab with generation-checked keys.
//!
//! Keys pair a slot index with the generation of the value stored there.
//! Removing a value bumps the slot's generation, so stale keys never reach a
//! later occupant of the same slot.

use std::fmt;

/// Opaque handle into an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

impl SlotKey {
    /// Slot position.
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the occupant this key was issued for.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Bounded collection addressed by [`SlotKey`].
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    len: usize,
    capacity: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena holding at most `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            len: 0,
            capacity,
        }
    }

    /// Maximum number of live values.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live values.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no value is live.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if another insert would fail.
    pub const fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Stores `value`, handing it back when the arena is full.
    pub fn insert(&mut self, value: T) -> Result<SlotKey, T> {
        if self.is_full() {
            return Err(value);
        }

        let index = match self.slots.iter().position(|slot| slot.value.is_none()) {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                self.slots.len() - 1
            }
        };

        let slot = &mut self.slots[index];
        slot.value = Some(value);
        self.len += 1;
        Ok(SlotKey {
            index: index as u32,
            generation: slot.generation,
        })
    }

    fn slot(&self, key: SlotKey) -> Option<&Slot<T>> {
        self.slots
            .get(key.index())
            .filter(|slot| slot.generation == key.generation && slot.value.is_some())
    }

    /// Returns `true` if `key` refers to a live value.
    pub fn contains(&self, key: SlotKey) -> bool {
        self.slot(key).is_some()
    }

    /// Borrows the value for `key`.
    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slot(key).and_then(|slot| slot.value.as_ref())
    }

    /// Mutably borrows the value for `key`.
    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index())
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Removes and returns the value for `key`.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self
            .slots
            .get_mut(key.index())
            .filter(|slot| slot.generation == key.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.len -= 1;
        Some(value)
    }

    /// Iterates over live values with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotKey {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Mutably iterates over live values with their keys.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotKey, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|value| {
                (
                    SlotKey {
                        index: index as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }

    /// Keys of all live values.
    pub fn keys(&self) -> Vec<SlotKey> {
        self.iter().map(|(key, _)| key).collect()
    }

    /// Removes every value, invalidating all keys.
    pub fn drain(&mut self) -> Vec<(SlotKey, T)> {
        let mut out = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                out.push((
                    SlotKey {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                ));
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.len = 0;
        out
    }
}
