use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::ResourcePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Folder,
    File,
}

/// A handle to a project, folder or file in the workspace tree.
///
/// Handles are plain values: holding one says nothing about whether the
/// resource currently exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resource {
    kind: ResourceKind,
    path: ResourcePath,
}

impl Resource {
    pub fn new(kind: ResourceKind, path: impl Into<ResourcePath>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn project(name: &str) -> Self {
        Self::new(ResourceKind::Project, ResourcePath::from_segments([name]))
    }

    pub fn folder(path: impl Into<ResourcePath>) -> Self {
        Self::new(ResourceKind::Folder, path)
    }

    pub fn file(path: impl Into<ResourcePath>) -> Self {
        Self::new(ResourceKind::File, path)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn is_project(&self) -> bool {
        self.kind == ResourceKind::Project
    }

    pub fn name(&self) -> &str {
        self.path.last_segment().unwrap_or_default()
    }

    /// Returns the project containing this resource (a project is its own project).
    pub fn owning_project(&self) -> Resource {
        match self.path.project_path() {
            Some(path) => Resource::new(ResourceKind::Project, path),
            None => Resource::new(ResourceKind::Project, ResourcePath::ROOT),
        }
    }

    /// Returns the child of this container named `name`, typed as `kind`.
    pub fn child(&self, kind: ResourceKind, name: &str) -> Resource {
        Resource::new(kind, self.path.join(name))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

/// How far below a resource an operation reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// The resource itself.
    Zero,
    /// The resource and its direct members.
    One,
    /// The resource and everything below it.
    #[default]
    Infinite,
}
