use std::collections::HashSet;

use strata_core::Resource;

use crate::location_map::LocationMap;

/// Projects that own at least one overlapping registration.
///
/// A project outside this set provably has no aliases, so most alias queries
/// can stop at a single set lookup.
#[derive(Debug, Clone, Default)]
pub struct AliasedProjects {
    projects: HashSet<Resource>,
}

impl AliasedProjects {
    /// Recomputes the set from scratch.
    ///
    /// Only non-default locations can overlap anything, so when none are
    /// registered the scan is skipped and the set is simply emptied.
    pub fn rebuild(&mut self, locations: &LocationMap, non_default_count: i64) {
        self.projects.clear();
        if non_default_count <= 0 {
            return;
        }
        self.projects.extend(locations.overlapping_projects());
    }

    pub fn contains(&self, project: &Resource) -> bool {
        self.projects.contains(project)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// The aliased projects in sorted order.
    pub fn to_sorted_vec(&self) -> Vec<Resource> {
        let mut projects: Vec<_> = self.projects.iter().cloned().collect();
        projects.sort();
        projects
    }
}
