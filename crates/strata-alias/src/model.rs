use std::io;

use strata_core::{Depth, Resource};
use strata_vfs::{FileSystem, StoreLocation};
use tokio_util::sync::CancellationToken;

/// A link declared in a project description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescription {
    pub resource: Resource,
    /// The resolved target, or `None` if it could not be resolved (for example
    /// an undefined path variable).
    pub location: Option<StoreLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDescription {
    /// Set when the project does not live at the default location under the
    /// workspace root.
    pub location: Option<StoreLocation>,
    pub links: Vec<LinkDescription>,
}

/// The resource tree as seen by the alias engine.
///
/// Implementations own the tree, its persistence and all disk access. The
/// engine calls the query methods while holding its own lock, so they must not
/// call back into the `AliasManager`. `refresh` and `delete_project` are only
/// called after the lock has been released and may notify the manager.
pub trait ResourceModel: Send + Sync {
    /// Every project in the workspace, open or closed, hidden ones included.
    fn projects(&self) -> Vec<Resource>;

    fn exists(&self, resource: &Resource) -> bool;

    /// Returns `true` if the resource exists and its project is open.
    fn is_accessible(&self, resource: &Resource) -> bool;

    fn is_linked(&self, resource: &Resource) -> bool;

    /// Virtual folders have no backing location and are never indexed.
    fn is_virtual(&self, _resource: &Resource) -> bool {
        false
    }

    /// The effective location of a resource, or `None` if it is undefined.
    fn location(&self, resource: &Resource) -> Option<StoreLocation>;

    /// `None` for projects whose description cannot be read (e.g. closed or removed).
    fn project_description(&self, project: &Resource) -> Option<ProjectDescription>;

    /// The existing direct member of `container` named `name`, if any.
    fn find_member(&self, container: &Resource, name: &str) -> Option<Resource>;

    /// The existing direct members of `project` that are links.
    fn linked_members(&self, project: &Resource) -> Vec<Resource>;

    /// Returns `true` if resource filters hide this resource.
    fn is_filtered(&self, _resource: &Resource) -> bool {
        false
    }

    /// Re-synchronizes the tree below `resource` with disk.
    fn refresh(
        &self,
        resource: &Resource,
        depth: Depth,
        background: bool,
        token: &CancellationToken,
    ) -> io::Result<()>;

    /// Removes a project from the tree without touching disk.
    fn delete_project(&self, project: &Resource) -> io::Result<()>;

    fn file_system(&self) -> &dyn FileSystem;
}
