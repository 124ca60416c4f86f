use strata_core::Resource;

/// Notification sent *before* a link or filter operation runs.
///
/// The operation may still fail after the notification, so the alias engine
/// only records which resources to re-examine; the end state is recomputed
/// lazily on the next query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    LinkCreate { resource: Resource },
    LinkDelete { resource: Resource },
    LinkMove { source: Resource, destination: Resource },
    LinkCopy { destination: Resource },
    LinkChange { resource: Resource },
    FilterAdd { resource: Resource },
    FilterRemove { resource: Resource },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectDeltaKind {
    Added,
    Removed,
    Changed {
        /// The project description (location, links) changed.
        description: bool,
        /// The project was opened or closed.
        open: bool,
    },
}

/// One project-level entry of a post-change resource delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDelta {
    pub project: Resource,
    pub kind: ProjectDeltaKind,
}

impl ProjectDelta {
    pub fn added(project: Resource) -> Self {
        Self {
            project,
            kind: ProjectDeltaKind::Added,
        }
    }

    pub fn removed(project: Resource) -> Self {
        Self {
            project,
            kind: ProjectDeltaKind::Removed,
        }
    }

    pub fn description_changed(project: Resource) -> Self {
        Self {
            project,
            kind: ProjectDeltaKind::Changed {
                description: true,
                open: false,
            },
        }
    }

    pub fn open_state_changed(project: Resource) -> Self {
        Self {
            project,
            kind: ProjectDeltaKind::Changed {
                description: false,
                open: true,
            },
        }
    }

    /// Returns `true` if this delta can change which locations projects and
    /// their links occupy.
    pub fn affects_locations(&self) -> bool {
        match self.kind {
            ProjectDeltaKind::Added | ProjectDeltaKind::Removed => true,
            ProjectDeltaKind::Changed { description, open } => description || open,
        }
    }
}
