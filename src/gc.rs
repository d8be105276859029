//! Mark-and-sweep over the object registry.
//!
//! Marking starts at the given roots (the catalog, plus the info and
//! encryption dictionaries the trailer points at) and follows every
//! reference held by a reached object. Unreached live objects are then
//! either tombstoned in place or dropped with the survivors renumbered.

use crate::object::ObjectRef;
use crate::objects::{IndirectObject, PdfObject};
use crate::registry::ObjectRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What happens to unreachable objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GcMode {
    /// Replace them with tombstones; numbers stay valid
    #[default]
    Tombstone,
    /// Remove them and renumber the survivors
    Compact,
}

/// Outcome of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GcReport {
    /// Live objects before collecting
    pub before: usize,
    /// Live objects after collecting
    pub after: usize,
    /// Live objects that were unreachable
    pub removed: usize,
}

/// Old-to-new object numbers produced by compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renumbering {
    map: HashMap<u32, u32>,
}

impl Renumbering {
    /// Whether no object moved.
    pub fn is_identity(&self) -> bool {
        self.map.iter().all(|(old, new)| old == new)
    }

    /// New reference for `r`, if it survived.
    pub fn get(&self, r: ObjectRef) -> Option<ObjectRef> {
        self.map.get(&r.id).map(|&id| ObjectRef::new(id, r.gen))
    }

    /// Rewrite `r` in place. References to removed objects are left alone.
    pub fn apply(&self, r: &mut ObjectRef) {
        if let Some(&id) = self.map.get(&r.id) {
            r.id = id;
        }
    }
}

/// Slots reachable from `roots`. Tombstones that are still referenced are
/// marked so their numbers survive compaction.
fn mark(registry: &ObjectRegistry, roots: &[ObjectRef]) -> Vec<bool> {
    let mut marked = vec![false; registry.len()];
    let mut stack: Vec<ObjectRef> = roots.to_vec();

    while let Some(r) = stack.pop() {
        let Some(object) = registry.get(r) else {
            continue;
        };
        let index = r.id as usize - 1;
        if marked[index] {
            continue;
        }
        marked[index] = true;
        object.visit_refs(&mut |child| stack.push(child));
    }
    marked
}

/// Collect unreachable objects.
///
/// Never fails: references to missing objects are skipped, and with nothing
/// to remove this is a no-op. In [`GcMode::Compact`] every reference held by
/// a surviving object is rewritten; handles kept outside the registry must
/// be passed through the returned [`Renumbering`].
pub fn collect(
    registry: &mut ObjectRegistry,
    roots: &[ObjectRef],
    mode: GcMode,
) -> (GcReport, Renumbering) {
    let before = registry.live_count();
    let marked = mark(registry, roots);

    let mut removed = 0;
    let mut renumbering = Renumbering::default();

    match mode {
        GcMode::Tombstone => {
            for ((_, object), reached) in registry.iter_mut().zip(&marked) {
                if !reached && !object.is_null() {
                    *object = IndirectObject::Null;
                    removed += 1;
                }
            }
        },
        GcMode::Compact => {
            let slots = registry.take_slots();
            let mut kept = Vec::with_capacity(slots.len());
            for (index, object) in slots.into_iter().enumerate() {
                if marked[index] {
                    kept.push(object);
                    renumbering.map.insert(index as u32 + 1, kept.len() as u32);
                } else if !object.is_null() {
                    removed += 1;
                }
            }
            for object in &mut kept {
                object.visit_refs_mut(&mut |r| renumbering.apply(r));
            }
            registry.rebuild(kept);
        },
    }

    let report = GcReport {
        before,
        after: registry.live_count(),
        removed,
    };
    log::info!(
        "garbage collection ({:?}): {} live before, {} after, {} removed",
        mode,
        report.before,
        report.after,
        report.removed
    );
    (report, renumbering)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Object, dict};

    fn link(to: &[u32]) -> IndirectObject {
        let refs = to.iter().map(|&id| Object::Reference(ObjectRef::new(id, 0))).collect();
        IndirectObject::Raw(Object::Dictionary(dict([("Kids", Object::Array(refs))])))
    }

    fn refs_of(object: &IndirectObject) -> Vec<u32> {
        let mut out = Vec::new();
        object.visit_refs(&mut |r| out.push(r.id));
        out
    }

    fn sample() -> ObjectRegistry {
        // 1 -> 3 -> 5, while 2 and 4 are unreachable
        let mut registry = ObjectRegistry::new();
        registry.allocate(link(&[3]));
        registry.allocate(link(&[]));
        registry.allocate(link(&[5]));
        registry.allocate(link(&[2]));
        registry.allocate(link(&[1]));
        registry
    }

    #[test]
    fn test_tombstone_mode_keeps_numbers() {
        let mut registry = sample();
        let (report, renumbering) = collect(&mut registry, &[ObjectRef::new(1, 0)], GcMode::Tombstone);
        assert_eq!(report, GcReport { before: 5, after: 3, removed: 2 });
        assert!(renumbering.is_identity());
        assert_eq!(registry.len(), 5);
        assert!(registry.get(ObjectRef::new(2, 0)).unwrap().is_null());
        assert!(registry.get(ObjectRef::new(4, 0)).unwrap().is_null());
    }

    #[test]
    fn test_compact_mode_renumbers_consistently() {
        let mut registry = sample();
        let (report, renumbering) = collect(&mut registry, &[ObjectRef::new(1, 0)], GcMode::Compact);
        assert_eq!(report.removed, 2);
        assert_eq!(registry.len(), 3);
        assert_eq!(renumbering.get(ObjectRef::new(5, 0)), Some(ObjectRef::new(3, 0)));
        assert_eq!(renumbering.get(ObjectRef::new(2, 0)), None);

        assert_eq!(refs_of(registry.get(ObjectRef::new(1, 0)).unwrap()), vec![2]);
        assert_eq!(refs_of(registry.get(ObjectRef::new(2, 0)).unwrap()), vec![3]);
        assert_eq!(refs_of(registry.get(ObjectRef::new(3, 0)).unwrap()), vec![1]);
    }

    #[test]
    fn test_second_run_is_noop() {
        for mode in [GcMode::Tombstone, GcMode::Compact] {
            let mut registry = sample();
            collect(&mut registry, &[ObjectRef::new(1, 0)], mode);
            let snapshot = registry.clone();
            let (report, renumbering) = collect(&mut registry, &[ObjectRef::new(1, 0)], mode);
            assert_eq!(report.removed, 0);
            assert!(renumbering.is_identity());
            assert_eq!(registry, snapshot);
        }
    }

    #[test]
    fn test_referenced_tombstone_survives_compaction() {
        let mut registry = ObjectRegistry::new();
        registry.allocate(link(&[3]));
        registry.allocate(link(&[]));
        registry.allocate(IndirectObject::Null);
        let (report, _) = collect(&mut registry, &[ObjectRef::new(1, 0)], GcMode::Compact);
        assert_eq!(report.removed, 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(refs_of(registry.get(ObjectRef::new(1, 0)).unwrap()), vec![2]);
        assert!(registry.get(ObjectRef::new(2, 0)).unwrap().is_null());
    }

    #[test]
    fn test_bad_roots_are_ignored() {
        let mut registry = sample();
        let (report, _) = collect(&mut registry, &[ObjectRef::new(0, 0), ObjectRef::new(42, 0)], GcMode::Tombstone);
        assert_eq!(report.removed, 5);
        let (report, _) = collect(&mut registry, &[], GcMode::Tombstone);
        assert_eq!(report.removed, 0);
    }
}
