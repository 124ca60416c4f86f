use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::slice;

use strata_core::Resource;
use strata_vfs::StoreLocation;

/// Resources registered at one location. `Many` always holds at least two.
#[derive(Debug, Clone)]
enum Slot {
    One(Resource),
    Many(Vec<Resource>),
}

impl Slot {
    fn iter(&self) -> slice::Iter<'_, Resource> {
        match self {
            Slot::One(resource) => slice::from_ref(resource).iter(),
            Slot::Many(resources) => resources.iter(),
        }
    }

    fn insert(&mut self, resource: Resource) -> bool {
        match self {
            Slot::One(existing) if *existing == resource => false,
            Slot::One(existing) => {
                let first = existing.clone();
                *self = Slot::Many(vec![first, resource]);
                true
            }
            Slot::Many(resources) if resources.contains(&resource) => false,
            Slot::Many(resources) => {
                resources.push(resource);
                true
            }
        }
    }
}

/// Sorted multimap from store location to the resources registered there.
///
/// Because [`StoreLocation`] orders every location directly before its
/// descendants, "everything at or below L" is one contiguous key range and
/// overlapping registrations are adjacent.
#[derive(Debug, Clone, Default)]
pub struct LocationMap {
    entries: BTreeMap<StoreLocation, Slot>,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resource` at `location`. Returns `false` if it was already
    /// registered there.
    pub fn add(&mut self, location: StoreLocation, resource: Resource) -> bool {
        match self.entries.entry(location) {
            Entry::Vacant(entry) => {
                entry.insert(Slot::One(resource));
                true
            }
            Entry::Occupied(mut entry) => entry.get_mut().insert(resource),
        }
    }

    /// Unregisters `resource` from `location`. Returns `false` if it was not
    /// registered there.
    pub fn remove(&mut self, location: &StoreLocation, resource: &Resource) -> bool {
        let Some(slot) = self.entries.get_mut(location) else {
            return false;
        };
        match slot {
            Slot::One(existing) => {
                if *existing != *resource {
                    return false;
                }
                self.entries.remove(location);
                true
            }
            Slot::Many(resources) => {
                let Some(index) = resources.iter().position(|r| r == resource) else {
                    return false;
                };
                resources.remove(index);
                if resources.len() == 1 {
                    if let Some(last) = resources.pop() {
                        *slot = Slot::One(last);
                    }
                }
                true
            }
        }
    }

    /// Resources registered exactly at `location`.
    pub fn exact<'a>(
        &'a self,
        location: &StoreLocation,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.entries.get(location).into_iter().flat_map(Slot::iter)
    }

    /// Resources registered at `location` or anywhere below it.
    ///
    /// A root location has no upper bound, so its subtree is the whole map.
    pub fn under<'a>(
        &'a self,
        location: &StoreLocation,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        let range = match location.subtree_end() {
            Some(end) => self
                .entries
                .range((Bound::Included(location.clone()), Bound::Excluded(end))),
            None => self.entries.range::<StoreLocation, _>(..),
        };
        range.flat_map(|(_, slot)| slot.iter())
    }

    /// Projects owning a registration that overlaps another registration.
    ///
    /// Two registrations overlap when they share a location or one location
    /// contains the other. A project may be yielded more than once.
    pub fn overlapping_projects(&self) -> OverlappingProjects<'_> {
        OverlappingProjects {
            entries: self.entries.iter(),
            previous: None,
            pending: Vec::new(),
        }
    }

    /// Number of distinct locations with at least one registration.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Iterator returned by [`LocationMap::overlapping_projects`].
///
/// Walks the map once in order, remembering the most recent location that
/// started a new subtree. Every later entry that lies below it is an overlap.
/// The remembered location is only replaced when an entry falls outside its
/// subtree, so chains like `A ⊃ B ⊃ C` report all three.
#[derive(Debug)]
pub struct OverlappingProjects<'a> {
    entries: btree_map::Iter<'a, StoreLocation, Slot>,
    /// The current subtree root and its single resource; the resource is
    /// cleared once it has been reported.
    previous: Option<(&'a StoreLocation, Option<&'a Resource>)>,
    pending: Vec<&'a Resource>,
}

impl Iterator for OverlappingProjects<'_> {
    type Item = Resource;

    fn next(&mut self) -> Option<Resource> {
        loop {
            if let Some(resource) = self.pending.pop() {
                return Some(resource.owning_project());
            }

            let (location, slot) = self.entries.next()?;
            let current = match slot {
                Slot::One(resource) => Some(resource),
                // Resources sharing a location all overlap each other.
                Slot::Many(resources) => {
                    self.pending.extend(resources.iter());
                    None
                }
            };

            if let Some((previous_location, previous_resource)) = self.previous {
                if previous_location.is_parent_of(location) {
                    self.pending.extend(previous_resource);
                    self.pending.extend(current);
                    self.previous = Some((previous_location, None));
                    continue;
                }
            }
            self.previous = Some((location, current));
        }
    }
}
