//! The indirect-object registry.
//!
//! Objects are stored in allocation order. Slot `i` holds object number
//! `i + 1`, so numbers are stable for the life of the registry: deleting an
//! object leaves a tombstone ([`IndirectObject::Null`]) in its slot instead of
//! shifting later objects down. Only the garbage collector's compaction pass
//! renumbers.

use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::objects::IndirectObject;
use serde::{Deserialize, Serialize};

/// Append-only, 1-based store of indirect objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRegistry {
    slots: Vec<IndirectObject>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` and return its reference.
    pub fn allocate(&mut self, object: IndirectObject) -> ObjectRef {
        self.slots.push(object);
        ObjectRef::new(self.slots.len() as u32, 0)
    }

    /// Reserve a number now and fill it later with [`replace`](Self::replace).
    pub fn reserve(&mut self) -> ObjectRef {
        self.allocate(IndirectObject::Null)
    }

    fn index(&self, r: ObjectRef) -> Option<usize> {
        let index = (r.id as usize).checked_sub(1)?;
        (index < self.slots.len()).then_some(index)
    }

    /// Object stored under `r`, tombstones included.
    pub fn get(&self, r: ObjectRef) -> Option<&IndirectObject> {
        self.index(r).map(|i| &self.slots[i])
    }

    /// Mutable access to the object stored under `r`.
    pub fn get_mut(&mut self, r: ObjectRef) -> Result<&mut IndirectObject> {
        match self.index(r) {
            Some(i) => Ok(&mut self.slots[i]),
            None => Err(Error::ObjectNotFound(r.id)),
        }
    }

    /// Overwrite the slot for `r`, returning the previous value.
    pub fn replace(&mut self, r: ObjectRef, object: IndirectObject) -> Result<IndirectObject> {
        let slot = self.get_mut(r)?;
        Ok(std::mem::replace(slot, object))
    }

    /// Tombstone the slot for `r`, returning the previous value.
    pub fn delete(&mut self, r: ObjectRef) -> Result<IndirectObject> {
        self.replace(r, IndirectObject::Null)
    }

    /// Highest object number in use (tombstones count).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots that are not tombstones.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|o| !o.is_null()).count()
    }

    /// All slots with their references, in number order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &IndirectObject)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectRef::new(i as u32 + 1, 0), o))
    }

    /// Mutable iteration in number order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectRef, &mut IndirectObject)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(i, o)| (ObjectRef::new(i as u32 + 1, 0), o))
    }

    /// Replace every slot at once. Used by compaction.
    pub(crate) fn rebuild(&mut self, slots: Vec<IndirectObject>) {
        self.slots = slots;
    }

    pub(crate) fn take_slots(&mut self) -> Vec<IndirectObject> {
        std::mem::take(&mut self.slots)
    }
}
