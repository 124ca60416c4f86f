//! In-memory [`ResourceModel`] for unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use parking_lot::Mutex;
use strata_core::{Depth, Resource, ResourcePath};
use strata_vfs::{FileSystem, StoreLocation};
use tokio_util::sync::CancellationToken;

use crate::location_map::LocationMap;
use crate::model::{LinkDescription, ProjectDescription, ResourceModel};

#[derive(Debug, Default)]
pub(crate) struct StubFs {
    missing: BTreeSet<StoreLocation>,
    unresolvable: BTreeSet<StoreLocation>,
}

impl FileSystem for StubFs {
    fn exists(&self, location: &StoreLocation) -> bool {
        !self.missing.contains(location) && !self.unresolvable.contains(location)
    }

    fn try_exists(&self, location: &StoreLocation) -> io::Result<bool> {
        if self.unresolvable.contains(location) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unresolvable location ({location})"),
            ));
        }
        Ok(self.exists(location))
    }

    fn is_dir(&self, location: &StoreLocation) -> bool {
        self.exists(location)
    }

    fn read_dir(&self, _location: &StoreLocation) -> io::Result<Vec<StoreLocation>> {
        Ok(Vec::new())
    }
}

#[derive(Debug)]
struct StubProject {
    location: Option<StoreLocation>,
    open: bool,
}

#[derive(Debug)]
pub(crate) struct StubModel {
    root: StoreLocation,
    projects: BTreeMap<Resource, StubProject>,
    links: BTreeMap<Resource, Option<StoreLocation>>,
    failing: BTreeSet<Resource>,
    fs: StubFs,
    refreshed: Mutex<Vec<Resource>>,
    deleted: Mutex<Vec<Resource>>,
}

impl StubModel {
    pub(crate) fn new(root: &str) -> Self {
        Self {
            root: StoreLocation::parse(root).unwrap(),
            projects: BTreeMap::new(),
            links: BTreeMap::new(),
            failing: BTreeSet::new(),
            fs: StubFs::default(),
            refreshed: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add_project(&mut self, name: &str, location: Option<StoreLocation>) -> Resource {
        let project = Resource::project(name);
        self.projects.insert(
            project.clone(),
            StubProject {
                location,
                open: true,
            },
        );
        project
    }

    pub(crate) fn remove_project(&mut self, name: &str) {
        let project = Resource::project(name);
        self.projects.remove(&project);
        self.links.retain(|link, _| link.owning_project() != project);
    }

    pub(crate) fn set_open(&mut self, name: &str, open: bool) {
        if let Some(project) = self.projects.get_mut(&Resource::project(name)) {
            project.open = open;
        }
    }

    pub(crate) fn set_project_location(&mut self, name: &str, location: Option<StoreLocation>) {
        if let Some(project) = self.projects.get_mut(&Resource::project(name)) {
            project.location = location;
        }
    }

    pub(crate) fn add_link(&mut self, link: Resource, location: Option<StoreLocation>) {
        self.links.insert(link, location);
    }

    pub(crate) fn remove_link(&mut self, link: &Resource) {
        self.links.remove(link);
    }

    pub(crate) fn set_missing(&mut self, location: StoreLocation) {
        self.fs.missing.insert(location);
    }

    pub(crate) fn set_unresolvable(&mut self, location: StoreLocation) {
        self.fs.unresolvable.insert(location);
    }

    pub(crate) fn fail_refresh(&mut self, resource: Resource) {
        self.failing.insert(resource);
    }

    pub(crate) fn refreshed(&self) -> Vec<Resource> {
        self.refreshed.lock().clone()
    }

    pub(crate) fn deleted(&self) -> Vec<Resource> {
        self.deleted.lock().clone()
    }

    /// Every registration a fresh alias index would hold for this model.
    pub(crate) fn location_map(&self) -> LocationMap {
        let mut map = LocationMap::new();
        for project in self.projects.keys() {
            if let Some(location) = self.location(project) {
                map.add(location, project.clone());
            }
        }
        for (link, location) in &self.links {
            if let Some(location) = location {
                map.add(location.clone(), link.clone());
            }
        }
        map
    }

    fn project_location(&self, project: &Resource) -> Option<StoreLocation> {
        let state = self.projects.get(project)?;
        Some(
            state
                .location
                .clone()
                .unwrap_or_else(|| self.root.child(project.name())),
        )
    }

    fn is_open(&self, project: &Resource) -> bool {
        self.projects.get(project).is_some_and(|state| state.open)
    }
}

impl ResourceModel for StubModel {
    fn projects(&self) -> Vec<Resource> {
        self.projects.keys().cloned().collect()
    }

    fn exists(&self, resource: &Resource) -> bool {
        let project = resource.owning_project();
        self.projects.contains_key(&project) && (resource.is_project() || self.is_open(&project))
    }

    fn is_accessible(&self, resource: &Resource) -> bool {
        self.exists(resource) && self.is_open(&resource.owning_project())
    }

    fn is_linked(&self, resource: &Resource) -> bool {
        self.links.contains_key(resource) && self.is_open(&resource.owning_project())
    }

    fn location(&self, resource: &Resource) -> Option<StoreLocation> {
        let project = resource.owning_project();
        let mut location = self.project_location(&project)?;
        if resource.is_project() {
            return Some(location);
        }

        let segments = resource.path().segments();
        let mut rest_from = 1;
        for len in (2..=segments.len()).rev() {
            let prefix = ResourcePath::from_segments(&segments[..len]);
            if let Some((_, target)) = self.links.iter().find(|(link, _)| *link.path() == prefix) {
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

    fn project_description(&self, project: &Resource) -> Option<ProjectDescription> {
        let state = self.projects.get(project)?;
        let links = self
            .links
            .iter()
            .filter(|(link, _)| link.owning_project() == *project)
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
        let path = container.path().join(name);
        self.links
            .keys()
            .find(|link| *link.path() == path)
            .filter(|link| self.exists(link))
            .cloned()
    }

    fn linked_members(&self, project: &Resource) -> Vec<Resource> {
        if !self.is_open(project) {
            return Vec::new();
        }
        self.links
            .keys()
            .filter(|link| link.path().parent().as_ref() == Some(project.path()))
            .cloned()
            .collect()
    }

    fn refresh(
        &self,
        resource: &Resource,
        _depth: Depth,
        _background: bool,
        _token: &CancellationToken,
    ) -> io::Result<()> {
        if self.failing.contains(resource) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "refresh refused"));
        }
        self.refreshed.lock().push(resource.clone());
        Ok(())
    }

    fn delete_project(&self, project: &Resource) -> io::Result<()> {
        self.deleted.lock().push(project.clone());
        Ok(())
    }

    fn file_system(&self) -> &dyn FileSystem {
        &self.fs
    }
}
