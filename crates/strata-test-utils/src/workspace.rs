use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use strata_alias::{
    AliasManager, LifecycleEvent, LinkDescription, ProjectDelta, ProjectDescription,
    ResourceModel, UpdateAliasesError,
};
use strata_config::AliasConfig;
use strata_core::{Depth, Resource, ResourceKind, ResourcePath};
use strata_vfs::{FileSystem, LocalFs, StoreLocation};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct ProjectState {
    /// Explicit location; `None` means `<root>/<name>`.
    location: Option<StoreLocation>,
    open: bool,
    links: BTreeMap<Resource, Option<StoreLocation>>,
    members: BTreeSet<Resource>,
    filtered: BTreeSet<Resource>,
}

impl ProjectState {
    fn new(location: Option<StoreLocation>) -> Self {
        Self {
            location,
            open: true,
            links: BTreeMap::new(),
            members: BTreeSet::new(),
            filtered: BTreeSet::new(),
        }
    }

    fn link_at(&self, path: &ResourcePath) -> Option<(&Resource, &Option<StoreLocation>)> {
        self.links.iter().find(|(link, _)| link.path() == path)
    }

    fn member_at(&self, path: &ResourcePath) -> Option<&Resource> {
        self.members.iter().find(|member| member.path() == path)
    }

    fn remove_subtree(&mut self, resource: &Resource) {
        let prefix = resource.path();
        self.members.retain(|member| !prefix.is_prefix_of(member.path()));
        self.links.retain(|link, _| !prefix.is_prefix_of(link.path()));
    }

    /// Forgets every member that is not a link or below one.
    fn retain_linked_members(&mut self) {
        let links = &self.links;
        self.members.retain(|member| {
            links
                .keys()
                .any(|link| link.path().is_prefix_of(member.path()))
        });
    }

    /// Adds the folders between the project and `resource` that are missing.
    fn insert_ancestors(&mut self, resource: &Resource) {
        let mut ancestor = resource.path().parent();
        while let Some(path) = ancestor {
            if path.segment_count() < 2 {
                break;
            }
            if self.member_at(&path).is_none() {
                self.members.insert(Resource::folder(path.clone()));
            }
            ancestor = path.parent();
        }
    }
}

#[derive(Debug, Default)]
struct Tree {
    projects: BTreeMap<String, ProjectState>,
    refreshed: Vec<Resource>,
    deleted: Vec<Resource>,
    failing: BTreeSet<Resource>,
}

impl Tree {
    fn project(&self, resource: &Resource) -> Option<&ProjectState> {
        self.projects.get(resource.owning_project().name())
    }

    fn project_mut(&mut self, resource: &Resource) -> Option<&mut ProjectState> {
        self.projects.get_mut(resource.owning_project().name())
    }

    fn location(&self, root: &StoreLocation, resource: &Resource) -> Option<StoreLocation> {
        let project = resource.owning_project();
        let state = self.project(resource)?;
        let mut location = state
            .location
            .clone()
            .unwrap_or_else(|| root.child(project.name()));

        // The deepest link at or above the resource decides where it lives.
        let segments = resource.path().segments();
        let mut rest_from = 1;
        for len in (2..=segments.len()).rev() {
            let prefix = ResourcePath::from_segments(&segments[..len]);
            if let Some((_, target)) = state.link_at(&prefix) {
                location = target.clone()?;
                rest_from = len;
                break;
            }
        }
        for segment in &segments[rest_from..] {
            location = location.child(segment.clone());
        }
        Some(location)
    }

    fn exists(&self, resource: &Resource) -> bool {
        match self.project(resource) {
            Some(_) if resource.is_project() => true,
            Some(state) => state.open && state.members.contains(resource),
            None => false,
        }
    }

    fn is_open(&self, resource: &Resource) -> bool {
        self.project(resource).is_some_and(|state| state.open)
    }

    /// Makes the tree below `resource` match what is on disk.
    fn sync(
        &mut self,
        fs: &dyn FileSystem,
        root: &StoreLocation,
        resource: &Resource,
        depth: Depth,
    ) -> io::Result<()> {
        let Some(location) = self.location(root, resource) else {
            return Ok(());
        };
        let present = fs.exists(&location);
        {
            let Some(state) = self.project_mut(resource) else {
                return Ok(());
            };
            if !state.open {
                return Ok(());
            }
            let is_link = state.links.contains_key(resource);
            match (resource.is_project(), present) {
                (true, _) => {}
                (false, true) => {
                    state.insert_ancestors(resource);
                    state.members.insert(resource.clone());
                }
                // Links stay declared even when their target is gone.
                (false, false) if is_link => {}
                (false, false) => state.remove_subtree(resource),
            }
        }
        if !present || depth == Depth::Zero || !fs.is_dir(&location) {
            return Ok(());
        }

        let child_depth = match depth {
            Depth::One => Depth::Zero,
            _ => Depth::Infinite,
        };
        let mut on_disk = BTreeSet::new();
        for entry in fs.read_dir(&location)? {
            let kind = if fs.is_dir(&entry) {
                ResourceKind::Folder
            } else {
                ResourceKind::File
            };
            let child = resource.child(kind, entry.name());
            on_disk.insert(child.path().clone());

            let hidden_by_link = self
                .project(&child)
                .is_some_and(|state| state.link_at(child.path()).is_some());
            if !hidden_by_link {
                self.sync(fs, root, &child, child_depth)?;
            }
        }

        if let Some(state) = self.project_mut(resource) {
            let stale: Vec<Resource> = state
                .members
                .iter()
                .filter(|member| member.path().parent().as_ref() == Some(resource.path()))
                .filter(|member| !on_disk.contains(member.path()))
                .filter(|member| !state.links.contains_key(*member))
                .cloned()
                .collect();
            for member in &stale {
                state.remove_subtree(member);
            }
        }
        Ok(())
    }
}

/// A workspace tree over a temporary directory.
///
/// Projects at the default location live directly under [`root`](Self::root).
/// Every mutation notifies the workspace's [`AliasManager`] the way a real
/// resource tree would: lifecycle events before link operations, project deltas
/// after project operations, and `update_aliases` after content changes.
///
/// Disk errors panic; the helpers are meant for tests.
#[derive(Debug)]
pub struct FixtureWorkspace {
    root: TempDir,
    root_location: StoreLocation,
    fs: LocalFs,
    tree: Mutex<Tree>,
    aliases: AliasManager,
    token: CancellationToken,
}

impl Default for FixtureWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureWorkspace {
    pub fn new() -> Self {
        Self::with_config(AliasConfig::default())
    }

    pub fn with_config(config: AliasConfig) -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let root_location = StoreLocation::local(root.path()).expect("absolute tempdir");
        let workspace = Self {
            root,
            root_location,
            fs: LocalFs::new(),
            tree: Mutex::new(Tree::default()),
            aliases: AliasManager::new(config),
            token: CancellationToken::new(),
        };
        workspace.aliases.startup(&workspace);
        workspace
    }

    pub fn aliases(&self) -> &AliasManager {
        &self.aliases
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Cancels the token passed along with every alias update.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Creates `<root>/.external/<name>` and returns its location. Nothing in
    /// the workspace lives there until a project or link points at it.
    pub fn external_dir(&self, name: &str) -> StoreLocation {
        let path = self.root().join(".external").join(name);
        fs::create_dir_all(&path).expect("external dir creatable");
        location_of(&path)
    }

    /// The local path behind `resource`, if it has a `file` location.
    pub fn path_of(&self, resource: &Resource) -> Option<PathBuf> {
        self.location(resource)?.to_local_path()
    }

    pub fn create_project(&self, name: &str) -> Resource {
        self.add_project(name, None)
    }

    pub fn create_project_at(&self, name: &str, location: &StoreLocation) -> Resource {
        self.add_project(name, Some(location.clone()))
    }

    fn add_project(&self, name: &str, location: Option<StoreLocation>) -> Resource {
        let project = Resource::project(name);
        {
            let mut tree = self.tree.lock();
            tree.projects
                .insert(name.to_owned(), ProjectState::new(location));
            let path = tree
                .location(&self.root_location, &project)
                .and_then(|location| location.to_local_path())
                .expect("project has a local location");
            fs::create_dir_all(path).expect("project dir creatable");
            tree.sync(&self.fs, &self.root_location, &project, Depth::Infinite)
                .expect("project readable");
        }
        self.aliases
            .resource_changed(&[ProjectDelta::added(project.clone())]);
        project
    }

    /// Points an existing project at a new location (or back at the default).
    pub fn set_project_location(&self, name: &str, location: Option<&StoreLocation>) {
        let project = Resource::project(name);
        {
            let mut tree = self.tree.lock();
            let Some(state) = tree.projects.get_mut(name) else {
                return;
            };
            state.location = location.cloned();
            state.retain_linked_members();
            tree.sync(&self.fs, &self.root_location, &project, Depth::Infinite)
                .expect("project readable");
        }
        self.aliases
            .resource_changed(&[ProjectDelta::description_changed(project)]);
    }

    pub fn close_project(&self, name: &str) {
        self.set_open(name, false);
    }

    pub fn open_project(&self, name: &str) {
        self.set_open(name, true);
    }

    fn set_open(&self, name: &str, open: bool) {
        let project = Resource::project(name);
        {
            let mut tree = self.tree.lock();
            let Some(state) = tree.projects.get_mut(name) else {
                return;
            };
            if state.open == open {
                return;
            }
            state.open = open;
            if open {
                tree.sync(&self.fs, &self.root_location, &project, Depth::Infinite)
                    .expect("project readable");
            }
        }
        self.aliases
            .resource_changed(&[ProjectDelta::open_state_changed(project)]);
    }

    /// Removes a project from the tree. Its directory is left on disk.
    pub fn remove_project(&self, name: &str) {
        let project = Resource::project(name);
        if self.tree.lock().projects.remove(name).is_none() {
            return;
        }
        self.aliases
            .resource_changed(&[ProjectDelta::removed(project)]);
    }

    pub fn create_link(&self, link: &Resource, location: &StoreLocation) {
        self.declare_link(link, Some(location.clone()));
    }

    /// Creates a link whose target cannot be resolved, like one using an
    /// undefined path variable.
    pub fn create_unresolved_link(&self, link: &Resource) {
        self.declare_link(link, None);
    }

    fn declare_link(&self, link: &Resource, location: Option<StoreLocation>) {
        self.aliases.handle_lifecycle(
            self,
            &LifecycleEvent::LinkCreate {
                resource: link.clone(),
            },
        );
        self.insert_link(link, location);
    }

    fn insert_link(&self, link: &Resource, location: Option<StoreLocation>) {
        let mut tree = self.tree.lock();
        let Some(state) = tree.project_mut(link) else {
            return;
        };
        state.insert_ancestors(link);
        state.members.insert(link.clone());
        state.links.insert(link.clone(), location);
        tree.sync(&self.fs, &self.root_location, link, Depth::Infinite)
            .expect("link target readable");
    }

    pub fn delete_link(&self, link: &Resource) {
        self.aliases.handle_lifecycle(
            self,
            &LifecycleEvent::LinkDelete {
                resource: link.clone(),
            },
        );
        if let Some(state) = self.tree.lock().project_mut(link) {
            state.remove_subtree(link);
        }
    }

    pub fn move_link(&self, source: &Resource, destination: &Resource) {
        self.aliases.handle_lifecycle(
            self,
            &LifecycleEvent::LinkMove {
                source: source.clone(),
                destination: destination.clone(),
            },
        );
        let target = {
            let mut tree = self.tree.lock();
            let Some(state) = tree.project_mut(source) else {
                return;
            };
            let Some(target) = state.links.get(source).cloned() else {
                return;
            };
            state.remove_subtree(source);
            target
        };
        self.insert_link(destination, target);
    }

    /// Points an existing link at a new target.
    pub fn retarget_link(&self, link: &Resource, location: &StoreLocation) {
        self.aliases.handle_lifecycle(
            self,
            &LifecycleEvent::LinkChange {
                resource: link.clone(),
            },
        );
        let mut tree = self.tree.lock();
        let Some(state) = tree.project_mut(link) else {
            return;
        };
        state.remove_subtree(link);
        state.members.insert(link.clone());
        state.links.insert(link.clone(), Some(location.clone()));
        tree.sync(&self.fs, &self.root_location, link, Depth::Infinite)
            .expect("link target readable");
    }

    pub fn add_filter(&self, resource: &Resource) {
        self.aliases.handle_lifecycle(
            self,
            &LifecycleEvent::FilterAdd {
                resource: resource.clone(),
            },
        );
        if let Some(state) = self.tree.lock().project_mut(resource) {
            state.filtered.insert(resource.clone());
        }
    }

    pub fn remove_filter(&self, resource: &Resource) {
        self.aliases.handle_lifecycle(
            self,
            &LifecycleEvent::FilterRemove {
                resource: resource.clone(),
            },
        );
        if let Some(state) = self.tree.lock().project_mut(resource) {
            state.filtered.remove(resource);
        }
    }

    pub fn create_folder(&self, folder: &Resource) -> Result<(), UpdateAliasesError> {
        let path = self.path_of(folder).expect("folder has a local location");
        fs::create_dir_all(path).expect("folder creatable");
        self.record_created(folder);
        self.aliases
            .update_aliases(self, folder, None, Depth::Zero, &self.token)
    }

    pub fn create_file(&self, file: &Resource, text: &str) -> Result<(), UpdateAliasesError> {
        let path = self.path_of(file).expect("file has a local location");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir creatable");
        }
        fs::write(path, text).expect("file writable");
        self.record_created(file);
        self.aliases
            .update_aliases(self, file, None, Depth::Zero, &self.token)
    }

    fn record_created(&self, resource: &Resource) {
        if let Some(state) = self.tree.lock().project_mut(resource) {
            state.insert_ancestors(resource);
            state.members.insert(resource.clone());
        }
    }

    /// Deletes a file or folder from disk and from the tree, then updates its
    /// aliases.
    pub fn delete(&self, resource: &Resource) -> Result<(), UpdateAliasesError> {
        let location = self.location(resource).expect("resource has a location");
        let path = location.to_local_path().expect("local location");
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("dir removable");
        } else {
            fs::remove_file(&path).expect("file removable");
        }
        if let Some(state) = self.tree.lock().project_mut(resource) {
            state.remove_subtree(resource);
        }
        self.aliases
            .update_aliases(self, resource, Some(&location), Depth::Infinite, &self.token)
    }

    /// Makes every future refresh of `resource` fail.
    pub fn fail_refresh(&self, resource: &Resource) {
        self.tree.lock().failing.insert(resource.clone());
    }

    /// Direct members of `container`, sorted.
    pub fn members(&self, container: &Resource) -> Vec<Resource> {
        let tree = self.tree.lock();
        let Some(state) = tree.project(container) else {
            return Vec::new();
        };
        if !state.open {
            return Vec::new();
        }
        state
            .members
            .iter()
            .filter(|member| member.path().parent().as_ref() == Some(container.path()))
            .cloned()
            .collect()
    }

    /// Resources refreshed through the alias engine, in call order.
    pub fn refreshed(&self) -> Vec<Resource> {
        self.tree.lock().refreshed.clone()
    }

    /// Projects removed through the alias engine, in call order.
    pub fn deleted_projects(&self) -> Vec<Resource> {
        self.tree.lock().deleted.clone()
    }

    pub fn clear_log(&self) {
        let mut tree = self.tree.lock();
        tree.refreshed.clear();
        tree.deleted.clear();
    }
}

/// The location of an absolute local path.
pub fn location_of(path: &Path) -> StoreLocation {
    StoreLocation::local(path).expect("absolute path")
}

impl ResourceModel for FixtureWorkspace {
    fn projects(&self) -> Vec<Resource> {
        self.tree
            .lock()
            .projects
            .keys()
            .map(|name| Resource::project(name))
            .collect()
    }

    fn exists(&self, resource: &Resource) -> bool {
        self.tree.lock().exists(resource)
    }

    fn is_accessible(&self, resource: &Resource) -> bool {
        let tree = self.tree.lock();
        tree.exists(resource) && tree.is_open(resource)
    }

    fn is_linked(&self, resource: &Resource) -> bool {
        self.tree
            .lock()
            .project(resource)
            .is_some_and(|state| state.open && state.links.contains_key(resource))
    }

    fn location(&self, resource: &Resource) -> Option<StoreLocation> {
        self.tree.lock().location(&self.root_location, resource)
    }

    fn project_description(&self, project: &Resource) -> Option<ProjectDescription> {
        let tree = self.tree.lock();
        let state = tree.project(project)?;
        let links = state
            .links
            .iter()
            .map(|(link, location)| LinkDescription {
                resource: link.clone(),
                location: location.clone(),
            })
            .collect();
        Some(ProjectDescription {
            location: state.location.clone(),
            links,
        })
    }

    fn find_member(&self, container: &Resource, name: &str) -> Option<Resource> {
        let tree = self.tree.lock();
        let state = tree.project(container)?;
        if !state.open {
            return None;
        }
        state.member_at(&container.path().join(name)).cloned()
    }

    fn linked_members(&self, project: &Resource) -> Vec<Resource> {
        let tree = self.tree.lock();
        let Some(state) = tree.project(project) else {
            return Vec::new();
        };
        if !state.open {
            return Vec::new();
        }
        state
            .links
            .keys()
            .filter(|link| link.path().parent().as_ref() == Some(project.path()))
            .cloned()
            .collect()
    }

    fn is_filtered(&self, resource: &Resource) -> bool {
        self.tree.lock().project(resource).is_some_and(|state| {
            state
                .filtered
                .iter()
                .any(|filter| filter.path().is_prefix_of(resource.path()))
        })
    }

    fn refresh(
        &self,
        resource: &Resource,
        depth: Depth,
        background: bool,
        token: &CancellationToken,
    ) -> io::Result<()> {
        if token.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "refresh cancelled"));
        }

        let mut tree = self.tree.lock();
        if tree.failing.contains(resource) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("refresh of {resource} refused"),
            ));
        }
        tracing::trace!(target: "strata.test", %resource, ?depth, background, "refresh");
        tree.refreshed.push(resource.clone());
        tree.sync(&self.fs, &self.root_location, resource, depth)
    }

    fn delete_project(&self, project: &Resource) -> io::Result<()> {
        self.tree.lock().deleted.push(project.clone());
        self.remove_project(project.name());
        Ok(())
    }

    fn file_system(&self) -> &dyn FileSystem {
        &self.fs
    }
}
