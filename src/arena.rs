//! Generation-counted slot arena
//!
//! Backs both the device and stream registries. Removing a value bumps the
//! slot's generation, so an old index can never alias whatever reuses the slot.

/// Position in an [`Arena`] plus the generation it was issued under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Index {
    pub slot: u32,
    pub generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> Index {
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.value = Some(value);
            return Index {
                slot,
                generation: entry.generation,
            };
        }

        let slot = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Index {
            slot,
            generation: 0,
        }
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        self.slots
            .get(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    /// Swap the value at a live `index`, returning the old one
    pub fn replace(&mut self, index: Index, value: T) -> Option<T> {
        let entry = self
            .slots
            .get_mut(index.slot as usize)
            .filter(|entry| entry.generation == index.generation)?;
        entry.value.as_mut().map(|old| std::mem::replace(old, value))
    }

    pub fn remove(&mut self, index: Index) -> Option<T> {
        let entry = self.slots.get_mut(index.slot as usize)?;
        if entry.generation != index.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index.slot);
        Some(value)
    }

    /// True if `index` was handed out by this arena at some point, live or not.
    pub fn was_issued(&self, index: Index) -> bool {
        match self.slots.get(index.slot as usize) {
            Some(entry) if index.generation < entry.generation => true,
            Some(entry) => index.generation == entry.generation && entry.value.is_some(),
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.value.as_ref().map(|value| {
                (
                    Index {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Remove every value matching `remove`, returning them
    pub fn drain_where(&mut self, mut remove: impl FnMut(&T) -> bool) -> Vec<T> {
        let doomed: Vec<Index> = self
            .iter()
            .filter(|(_, value)| remove(value))
            .map(|(index, _)| index)
            .collect();
        doomed
            .into_iter()
            .filter_map(|index| self.remove(index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
