use std::collections::BTreeSet;

use strata_core::Resource;

/// Changes recorded since the location index was last reconciled.
#[derive(Debug, Clone, Default)]
pub struct DirtyState {
    changed_links: BTreeSet<Resource>,
    changed_projects: bool,
}

/// Everything [`DirtyState::take`] drained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub links: Vec<Resource>,
    /// A project was added, removed, opened, closed or redescribed; the whole
    /// index has to be rebuilt.
    pub projects: bool,
}

impl DirtyState {
    pub fn mark_link(&mut self, link: Resource) {
        self.changed_links.insert(link);
    }

    pub fn mark_projects(&mut self) {
        self.changed_projects = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.changed_projects || !self.changed_links.is_empty()
    }

    pub fn take(&mut self) -> PendingChanges {
        PendingChanges {
            links: std::mem::take(&mut self.changed_links).into_iter().collect(),
            projects: std::mem::take(&mut self.changed_projects),
        }
    }
}
