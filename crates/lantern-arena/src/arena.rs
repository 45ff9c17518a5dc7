//! Fixed-size units and the growable, slot-stable [`Arena`].
//!
//! A [`Unit`] is a boxed slice of `growth_unit` default-initialized
//! elements. The [`Arena`] chains units and maps a flat slot index to
//! `(index / growth_unit, index % growth_unit)`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{ArenaConfig, DeletionPolicy};
use crate::error::ArenaError;

/// Callback run on an element just before its slot is reset.
pub type Destructor<T> = Box<dyn FnMut(&mut T) + Send>;

/// Counter for unique [`DeletionEpoch`] allocation.
static EPOCH_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one deletion cycle of one arena.
///
/// Assigned lazily on the first `delete` and dropped by `clear`. Freed
/// slots recorded under an epoch are only offered back to the arena that
/// owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeletionEpoch(u64);

impl DeletionEpoch {
    fn next() -> Self {
        Self(EPOCH_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DeletionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fixed-size block of slots.
///
/// Units are allocated to full size up front and never resized.
struct Unit<T> {
    elems: Box<[T]>,
    live: Box<[bool]>,
}

impl<T: Default> Unit<T> {
    fn new(len: usize) -> Self {
        Self {
            elems: (0..len).map(|_| T::default()).collect(),
            live: vec![false; len].into_boxed_slice(),
        }
    }
}

/// A growable array of `T` whose slots never move.
///
/// Inserting reuses the smallest freed index when the policy permits
/// deletion; otherwise it bumps the highest index and grows by one unit
/// when capacity is exhausted.
pub struct Arena<T> {
    units: Vec<Unit<T>>,
    growth_unit: usize,
    max_units: Option<usize>,
    policy: DeletionPolicy,
    epoch: Option<DeletionEpoch>,
    free: BinaryHeap<Reverse<usize>>,
    destructor: Option<Destructor<T>>,
    live: usize,
    max_idx: Option<usize>,
}

impl<T: Default> Arena<T> {
    /// Create an arena with one pre-allocated unit.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            units: vec![Unit::new(config.growth_unit)],
            growth_unit: config.growth_unit,
            max_units: config.max_units,
            policy: config.policy,
            epoch: None,
            free: BinaryHeap::new(),
            destructor: None,
            live: 0,
            max_idx: None,
        })
    }

    /// Attach a destructor, run on `delete` and `clear`.
    pub fn with_destructor(mut self, destructor: impl FnMut(&mut T) + Send + 'static) -> Self {
        self.destructor = Some(Box::new(destructor));
        self
    }

    /// Insert a default element and return its index and a mutable
    /// reference to it.
    ///
    /// The returned slot is always in its default state: freed slots are
    /// reset when deleted.
    pub fn insert(&mut self) -> Result<(usize, &mut T), ArenaError> {
        let index = match self.reusable_slot() {
            Some(index) => index,
            None => {
                let next = self.max_idx.map_or(0, |m| m + 1);
                if next >= self.capacity() {
                    self.grow()?;
                }
                self.max_idx = Some(next);
                next
            }
        };
        self.live += 1;
        let (unit, offset) = self.locate(index);
        let unit = &mut self.units[unit];
        unit.live[offset] = true;
        Ok((index, &mut unit.elems[offset]))
    }

    /// Insert `value` and return its index.
    pub fn insert_with(&mut self, value: T) -> Result<usize, ArenaError> {
        let (index, slot) = self.insert()?;
        *slot = value;
        Ok(index)
    }

    /// Delete the element at `index`.
    ///
    /// Runs the destructor, resets the slot to its default, and records the
    /// index for reuse. The first delete assigns the arena's deletion epoch.
    pub fn delete(&mut self, index: usize) -> Result<(), ArenaError> {
        if self.policy == DeletionPolicy::NoDelete {
            return Err(ArenaError::DeleteForbidden);
        }
        self.check_bounds(index)?;
        let (unit, offset) = self.locate(index);
        if !self.units[unit].live[offset] {
            return Err(ArenaError::NotLive { index });
        }

        let elem = &mut self.units[unit].elems[offset];
        if let Some(destructor) = self.destructor.as_mut() {
            destructor(elem);
        }
        *elem = T::default();
        self.units[unit].live[offset] = false;
        self.live -= 1;

        if self.epoch.is_none() {
            self.epoch = Some(DeletionEpoch::next());
        }
        self.free.push(Reverse(index));
        Ok(())
    }

    fn reusable_slot(&mut self) -> Option<usize> {
        if self.policy == DeletionPolicy::NoDelete {
            return None;
        }
        self.free.pop().map(|Reverse(index)| index)
    }

    fn grow(&mut self) -> Result<(), ArenaError> {
        if let Some(max_units) = self.max_units {
            if self.units.len() >= max_units {
                return Err(ArenaError::CapacityExceeded { max_units });
            }
        }
        self.units.push(Unit::new(self.growth_unit));
        Ok(())
    }
}

impl<T> Arena<T> {
    /// Resolve `index` to its element, live or vacant.
    ///
    /// Vacant slots hold their default value.
    pub fn pick(&self, index: usize) -> Result<&T, ArenaError> {
        self.check_bounds(index)?;
        let (unit, offset) = self.locate(index);
        Ok(&self.units[unit].elems[offset])
    }

    /// Mutable variant of [`pick`](Self::pick).
    pub fn pick_mut(&mut self, index: usize) -> Result<&mut T, ArenaError> {
        self.check_bounds(index)?;
        let (unit, offset) = self.locate(index);
        Ok(&mut self.units[unit].elems[offset])
    }

    /// The live element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        if !self.is_live(index) {
            return None;
        }
        let (unit, offset) = self.locate(index);
        Some(&self.units[unit].elems[offset])
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if !self.is_live(index) {
            return None;
        }
        let (unit, offset) = self.locate(index);
        Some(&mut self.units[unit].elems[offset])
    }

    /// Like [`get`](Self::get) but reports why the slot is unavailable.
    pub fn live(&self, index: usize) -> Result<&T, ArenaError> {
        self.check_bounds(index)?;
        self.get(index).ok_or(ArenaError::NotLive { index })
    }

    /// Like [`get_mut`](Self::get_mut) but reports why the slot is
    /// unavailable.
    pub fn live_mut(&mut self, index: usize) -> Result<&mut T, ArenaError> {
        self.check_bounds(index)?;
        if !self.is_live(index) {
            return Err(ArenaError::NotLive { index });
        }
        let (unit, offset) = self.locate(index);
        Ok(&mut self.units[unit].elems[offset])
    }

    /// Whether `index` holds a live element.
    pub fn is_live(&self, index: usize) -> bool {
        if self.max_idx.is_none_or(|m| index > m) {
            return false;
        }
        let (unit, offset) = self.locate(index);
        self.units
            .get(unit)
            .is_some_and(|u| u.live.get(offset).copied().unwrap_or(false))
    }

    /// Destruct every live element, tail unit first, and release all units.
    ///
    /// The arena stays usable: the next insert allocates a fresh unit and
    /// starts again from index 0.
    pub fn clear(&mut self) {
        while let Some(mut unit) = self.units.pop() {
            if let Some(destructor) = self.destructor.as_mut() {
                for (elem, live) in unit.elems.iter_mut().zip(unit.live.iter()) {
                    if *live {
                        destructor(elem);
                    }
                }
            }
        }
        self.free.clear();
        self.epoch = None;
        self.live = 0;
        self.max_idx = None;
    }

    /// Iterate live elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        let growth = self.growth_unit;
        self.units.iter().enumerate().flat_map(move |(u, unit)| {
            unit.elems
                .iter()
                .zip(unit.live.iter())
                .enumerate()
                .filter(|(_, (_, live))| **live)
                .map(move |(o, (elem, _))| (u * growth + o, elem))
        })
    }

    /// Iterate live elements mutably in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        let growth = self.growth_unit;
        self.units.iter_mut().enumerate().flat_map(move |(u, unit)| {
            unit.elems
                .iter_mut()
                .zip(unit.live.iter())
                .enumerate()
                .filter(|(_, (_, live))| **live)
                .map(move |(o, (elem, _))| (u * growth + o, elem))
        })
    }

    /// Indices of live elements, collected so the caller may mutate the
    /// arena while walking them.
    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(|(i, _)| i).collect()
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no element is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Highest index ever assigned since construction or the last clear.
    pub fn max_idx(&self) -> Option<usize> {
        self.max_idx
    }

    /// Number of allocated units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Total slots across all units.
    pub fn capacity(&self) -> usize {
        self.units.len() * self.growth_unit
    }

    /// Number of freed slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// The current deletion epoch, assigned on the first delete.
    pub fn epoch(&self) -> Option<DeletionEpoch> {
        self.epoch
    }

    /// The configured deletion policy.
    pub fn policy(&self) -> DeletionPolicy {
        self.policy
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        (index / self.growth_unit, index % self.growth_unit)
    }

    fn check_bounds(&self, index: usize) -> Result<(), ArenaError> {
        match self.max_idx {
            Some(max) if index <= max => Ok(()),
            max_idx => Err(ArenaError::OutOfBounds { index, max_idx }),
        }
    }
}

impl<T> Drop for Arena<T> {
    fn drop(&mut self) {
        if self.destructor.is_some() {
            self.clear();
        }
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("live", &self.live)
            .field("max_idx", &self.max_idx)
            .field("units", &self.units.len())
            .field("growth_unit", &self.growth_unit)
            .field("policy", &self.policy)
            .field("epoch", &self.epoch)
            .field("free", &self.free.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn arena(growth: usize) -> Arena<u64> {
        Arena::new(ArenaConfig::new(growth, DeletionPolicy::DeleteAllowed)).unwrap()
    }

    #[test]
    fn insert_returns_sequential_default_slots() {
        let mut a = arena(4);
        let (i0, v0) = a.insert().unwrap();
        assert_eq!((i0, *v0), (0, 0));
        *v0 = 10;
        let (i1, v1) = a.insert().unwrap();
        assert_eq!((i1, *v1), (1, 0));
        assert_eq!(a.len(), 2);
        assert_eq!(*a.pick(0).unwrap(), 10);
    }

    #[test]
    fn grows_by_whole_units() {
        let mut a = arena(4);
        for _ in 0..4 {
            a.insert().unwrap();
        }
        assert_eq!(a.unit_count(), 1);
        let (idx, _) = a.insert().unwrap();
        assert_eq!(idx, 4);
        assert_eq!(a.unit_count(), 2);
        assert_eq!(a.capacity(), 8);
    }

    #[test]
    fn pick_past_max_idx_is_checked() {
        let mut a = arena(4);
        assert_eq!(
            a.pick(0),
            Err(ArenaError::OutOfBounds {
                index: 0,
                max_idx: None
            })
        );
        a.insert().unwrap();
        assert!(a.pick(0).is_ok());
        assert_eq!(
            a.pick(3),
            Err(ArenaError::OutOfBounds {
                index: 3,
                max_idx: Some(0)
            })
        );
    }

    #[test]
    fn delete_forbidden_on_no_delete_arena() {
        let mut a: Arena<u8> =
            Arena::new(ArenaConfig::new(2, DeletionPolicy::NoDelete)).unwrap();
        a.insert().unwrap();
        assert_eq!(a.delete(0), Err(ArenaError::DeleteForbidden));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn delete_resets_slot_and_assigns_epoch_once() {
        let mut a = arena(4);
        a.insert_with(5).unwrap();
        a.insert_with(6).unwrap();
        assert!(a.epoch().is_none());
        a.delete(0).unwrap();
        let epoch = a.epoch();
        assert!(epoch.is_some());
        assert_eq!(*a.pick(0).unwrap(), 0);
        assert!(!a.is_live(0));
        a.delete(1).unwrap();
        assert_eq!(a.epoch(), epoch);
    }

    #[test]
    fn double_delete_is_not_live() {
        let mut a = arena(4);
        a.insert().unwrap();
        a.delete(0).unwrap();
        assert_eq!(a.delete(0), Err(ArenaError::NotLive { index: 0 }));
        assert_eq!(a.free_count(), 1);
    }

    #[test]
    fn reuse_pops_smallest_freed_index() {
        let mut a = arena(4);
        for _ in 0..6 {
            a.insert().unwrap();
        }
        a.delete(4).unwrap();
        a.delete(1).unwrap();
        a.delete(3).unwrap();
        assert_eq!(a.insert().unwrap().0, 1);
        assert_eq!(a.insert().unwrap().0, 3);
        assert_eq!(a.insert().unwrap().0, 4);
        assert_eq!(a.insert().unwrap().0, 6);
    }

    #[test]
    fn destructor_runs_on_delete_and_clear() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut a = arena(2).with_destructor(move |v: &mut u64| log.lock().unwrap().push(*v));
        for v in [1, 2, 3, 4, 5] {
            a.insert_with(v).unwrap();
        }
        a.delete(1).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![2]);
        a.clear();
        // Tail unit first; vacant slot 1 is skipped.
        assert_eq!(*seen.lock().unwrap(), vec![2, 5, 3, 4, 1]);
        assert!(a.is_empty());
        assert_eq!(a.unit_count(), 0);
        assert!(a.epoch().is_none());
    }

    #[test]
    fn cleared_arena_restarts_at_zero() {
        let mut a = arena(2);
        a.insert().unwrap();
        a.insert().unwrap();
        a.delete(0).unwrap();
        a.clear();
        assert_eq!(a.max_idx(), None);
        let (idx, _) = a.insert().unwrap();
        assert_eq!(idx, 0);
        assert_eq!(a.unit_count(), 1);
        assert_eq!(a.free_count(), 0);
    }

    #[test]
    fn capacity_cap_is_enforced() {
        let mut a: Arena<u8> =
            Arena::new(ArenaConfig::new(2, DeletionPolicy::DeleteAllowed).with_max_units(1))
                .unwrap();
        a.insert().unwrap();
        a.insert().unwrap();
        assert_eq!(
            a.insert().map(|(i, _)| i),
            Err(ArenaError::CapacityExceeded { max_units: 1 })
        );
        // A failed insert leaves the arena consistent.
        assert_eq!(a.len(), 2);
        assert_eq!(a.max_idx(), Some(1));
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut a = arena(3);
        for v in 10..15 {
            a.insert_with(v).unwrap();
        }
        a.delete(2).unwrap();
        let live: Vec<_> = a.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(live, vec![(0, 10), (1, 11), (3, 13), (4, 14)]);
        for (_, v) in a.iter_mut() {
            *v += 1;
        }
        assert_eq!(a.get(4), Some(&15));
        assert_eq!(a.get(2), None);
        assert_eq!(a.indices(), vec![0, 1, 3, 4]);
    }

    #[test]
    fn live_reports_vacancy() {
        let mut a = arena(3);
        a.insert().unwrap();
        a.insert().unwrap();
        a.delete(1).unwrap();
        assert_eq!(a.live(1), Err(ArenaError::NotLive { index: 1 }));
        assert!(matches!(a.live(7), Err(ArenaError::OutOfBounds { .. })));
        assert!(a.live_mut(0).is_ok());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn inserted_slots_are_default_and_stable(
                growth in 1usize..8,
                ops in proptest::collection::vec(any::<bool>(), 1..64),
            ) {
                let mut a = arena(growth);
                let mut live: Vec<usize> = Vec::new();
                for insert in ops {
                    if insert || live.is_empty() {
                        let (idx, v) = a.insert().unwrap();
                        prop_assert_eq!(*v, 0);
                        *v = idx as u64 + 1;
                        live.push(idx);
                    } else {
                        let idx = live.remove(live.len() / 2);
                        a.delete(idx).unwrap();
                    }
                }
                // Addresses of live elements survive further non-deleting inserts.
                let before: Vec<(usize, *const u64)> =
                    live.iter().map(|&i| (i, a.pick(i).unwrap() as *const u64)).collect();
                for _ in 0..(growth * 3) {
                    a.insert().unwrap();
                }
                for (i, ptr) in before {
                    prop_assert_eq!(a.pick(i).unwrap() as *const u64, ptr);
                    prop_assert_eq!(*a.pick(i).unwrap(), i as u64 + 1);
                }
            }

            #[test]
            fn freed_slots_reused_before_growth(
                growth in 1usize..8,
                n in 1usize..40,
                m_frac in 0.0f64..1.0,
            ) {
                let m = ((n as f64) * m_frac) as usize;
                let mut a = arena(growth);
                for _ in 0..n {
                    a.insert().unwrap();
                }
                let units = a.unit_count();
                for idx in 0..m {
                    a.delete(idx).unwrap();
                }
                for _ in 0..m {
                    a.insert().unwrap();
                }
                prop_assert_eq!(a.unit_count(), units);
                prop_assert_eq!(a.len(), n);
            }

            #[test]
            fn live_count_matches_iteration(
                ops in proptest::collection::vec((any::<bool>(), 0usize..32), 1..80),
            ) {
                let mut a = arena(4);
                for (insert, target) in ops {
                    if insert {
                        a.insert().unwrap();
                    } else if let Some(max) = a.max_idx() {
                        let _ = a.delete(target % (max + 1));
                    }
                }
                prop_assert_eq!(a.len(), a.iter().count());
                prop_assert_eq!(a.len() + a.free_count(), a.max_idx().map_or(0, |m| m + 1));
            }
        }
    }
}
