use std::io;

use parking_lot::{Mutex, MutexGuard};
use strata_config::AliasConfig;
use strata_core::{Depth, Resource};
use strata_vfs::StoreLocation;
use tokio_util::sync::CancellationToken;

use crate::aliased_projects::AliasedProjects;
use crate::compute::{deep_aliases, shallow_aliases};
use crate::dirty::DirtyState;
use crate::error::{AliasError, UpdateAliasesError};
use crate::event::{LifecycleEvent, ProjectDelta};
use crate::location_map::LocationMap;
use crate::model::ResourceModel;

#[derive(Debug, Default)]
struct AliasState {
    locations: LocationMap,
    aliased: AliasedProjects,
    /// Registrations of explicit project locations and links. Projects at the
    /// default location are indexed too but never counted: they are siblings
    /// under the workspace root and cannot overlap each other.
    non_default_count: i64,
    dirty: DirtyState,
}

impl AliasState {
    fn register(&mut self, location: StoreLocation, resource: Resource) {
        if self.locations.add(location, resource) {
            self.non_default_count += 1;
        }
    }

    fn unregister(&mut self, location: &StoreLocation, resource: &Resource) {
        if self.locations.remove(location, resource) {
            self.non_default_count -= 1;
        }
    }

    fn rebuild_locations(&mut self, model: &dyn ResourceModel) {
        self.locations.clear();
        self.non_default_count = 0;
        for project in model.projects() {
            if model.is_accessible(&project) {
                self.add_project(model, &project);
            }
        }
    }

    fn add_project(&mut self, model: &dyn ResourceModel, project: &Resource) {
        let Some(description) = model.project_description(project) else {
            return;
        };

        if let Some(location) = model.location(project) {
            if description.location.is_some() {
                self.register(location, project.clone());
            } else {
                self.locations.add(location, project.clone());
            }
        }

        for link in description.links {
            if !model.exists(&link.resource) || model.is_virtual(&link.resource) {
                continue;
            }
            match link.location {
                Some(location) => self.register(location, link.resource),
                None => tracing::debug!(
                    target: "strata.alias",
                    link = %link.resource,
                    "link target could not be resolved; not indexing it"
                ),
            }
        }
    }

    /// Removes the current registration of a link about to go away.
    fn unregister_link(&mut self, model: &dyn ResourceModel, link: &Resource) {
        if !model.is_linked(link) {
            return;
        }
        if let Some(location) = model.location(link) {
            self.unregister(&location, link);
        }
    }

    fn rebuild_aliased(&mut self) {
        self.aliased.rebuild(&self.locations, self.non_default_count);
    }

    /// Folds pending notifications into the index. Returns `false` if there
    /// was nothing to do.
    fn reconcile(&mut self, model: &dyn ResourceModel) -> bool {
        if !self.dirty.is_dirty() {
            return false;
        }

        let pending = self.dirty.take();
        if pending.projects {
            self.rebuild_locations(model);
        } else {
            for link in pending.links {
                if !model.is_accessible(&link) || !model.is_linked(&link) || model.is_virtual(&link)
                {
                    continue;
                }
                if let Some(location) = model.location(&link) {
                    self.register(location, link);
                }
            }
        }
        self.rebuild_aliased();

        tracing::debug!(
            target: "strata.alias",
            full_rebuild = pending.projects,
            locations = self.locations.len(),
            non_default = self.non_default_count,
            aliased = self.aliased.len(),
            "alias index reconciled"
        );
        true
    }

    /// Cheap pre-check: `true` means `resource` provably has no aliases.
    fn has_no_aliases(&mut self, model: &dyn ResourceModel, resource: &Resource) -> bool {
        let project = resource.owning_project();
        let mut no_aliases = !self.aliased.contains(&project);
        if self.reconcile(model) {
            no_aliases &= self.non_default_count <= 0 || !self.aliased.contains(&project);
        }
        no_aliases
    }
}

/// Tracks which resources share a file-store location.
///
/// All state lives behind one lock. Queries hold it while they consult the
/// [`ResourceModel`]; [`AliasManager::update_aliases`] releases it before
/// calling back into the model to refresh or delete, so those callbacks may
/// notify the manager again.
#[derive(Debug)]
pub struct AliasManager {
    config: AliasConfig,
    state: Mutex<AliasState>,
}

impl Default for AliasManager {
    fn default() -> Self {
        Self::new(AliasConfig::default())
    }
}

impl AliasManager {
    pub fn new(config: AliasConfig) -> Self {
        Self {
            config,
            state: Mutex::new(AliasState::default()),
        }
    }

    pub fn config(&self) -> &AliasConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, AliasState> {
        self.state.lock()
    }

    /// Builds the index from every accessible project in `model`.
    pub fn startup(&self, model: &dyn ResourceModel) {
        let mut state = self.lock_state();
        *state = AliasState::default();
        state.rebuild_locations(model);
        state.rebuild_aliased();

        tracing::info!(
            target: "strata.alias",
            locations = state.locations.len(),
            non_default = state.non_default_count,
            aliased = state.aliased.len(),
            "alias index built"
        );
    }

    /// Drops all indexed state.
    pub fn shutdown(&self) {
        *self.lock_state() = AliasState::default();
        tracing::debug!(target: "strata.alias", "alias index cleared");
    }

    /// Folds pending notifications into the index now instead of on the next
    /// alias query.
    pub fn reconcile(&self, model: &dyn ResourceModel) {
        self.lock_state().reconcile(model);
    }

    /// The shallow aliases of `resource`, or `None` when it has none.
    pub fn compute_aliases(
        &self,
        model: &dyn ResourceModel,
        resource: &Resource,
        location: Option<&StoreLocation>,
    ) -> Option<Vec<Resource>> {
        if !self.config.enabled {
            return None;
        }

        let mut state = self.lock_state();
        if state.has_no_aliases(model, resource) {
            return None;
        }
        let aliases = shallow_aliases(&state.locations, model, resource, location);
        if aliases.is_empty() {
            None
        } else {
            Some(aliases.into_iter().collect())
        }
    }

    /// Resources registered exactly at `location`.
    ///
    /// Pending notifications are not reconciled first; registrations of links
    /// that are about to be deleted or moved are already gone.
    pub fn find_resources(&self, location: &StoreLocation) -> Vec<Resource> {
        self.lock_state().locations.exact(location).cloned().collect()
    }

    /// Brings every alias of `resource` back in sync with disk after it changed.
    ///
    /// With `Depth::Zero` only exact aliases are affected; otherwise aliases
    /// below the resource's location are too. Aliased projects whose location
    /// has vanished are removed from the workspace instead of refreshed (see
    /// [`AliasConfig::delete_missing_projects`]). Filtered aliases are skipped.
    ///
    /// Every alias is attempted; failures are collected and returned together.
    pub fn update_aliases(
        &self,
        model: &dyn ResourceModel,
        resource: &Resource,
        location: Option<&StoreLocation>,
        depth: Depth,
        token: &CancellationToken,
    ) -> Result<(), UpdateAliasesError> {
        if !self.config.enabled {
            return Ok(());
        }

        let aliases: Vec<Resource> = {
            let mut state = self.lock_state();
            if state.has_no_aliases(model, resource) {
                return Ok(());
            }
            let aliases = match depth {
                Depth::Zero => shallow_aliases(&state.locations, model, resource, location),
                Depth::One | Depth::Infinite => {
                    deep_aliases(&state.locations, model, resource, location)
                }
            };
            aliases.into_iter().collect()
        };
        if aliases.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            target: "strata.alias",
            %resource,
            ?depth,
            aliases = aliases.len(),
            "updating aliases"
        );

        let mut failures = Vec::new();
        for alias in aliases {
            if alias.is_project() && self.config.delete_missing_projects {
                match delete_if_missing(model, &alias) {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(source) => {
                        tracing::warn!(
                            target: "strata.alias",
                            project = %alias,
                            error = %source,
                            "failed to remove project with a missing location"
                        );
                        failures.push(AliasError::DeleteProject {
                            resource: alias,
                            source,
                        });
                        continue;
                    }
                }
            }

            if model.is_filtered(&alias) {
                tracing::trace!(target: "strata.alias", %alias, "skipping filtered alias");
                continue;
            }

            if let Err(source) =
                model.refresh(&alias, Depth::Infinite, self.config.background_refresh, token)
            {
                tracing::warn!(
                    target: "strata.alias",
                    %alias,
                    error = %source,
                    "failed to refresh alias"
                );
                failures.push(AliasError::Refresh {
                    resource: alias,
                    source,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(UpdateAliasesError {
                resource: resource.clone(),
                failures,
            })
        }
    }

    /// Records a link or filter operation that is about to run.
    ///
    /// Links about to be deleted, moved or retargeted lose their current
    /// registration immediately; everything else is reconciled lazily.
    pub fn handle_lifecycle(&self, model: &dyn ResourceModel, event: &LifecycleEvent) {
        let mut state = self.lock_state();
        match event {
            LifecycleEvent::LinkDelete { resource } | LifecycleEvent::LinkChange { resource } => {
                state.unregister_link(model, resource);
                state.dirty.mark_link(resource.clone());
            }
            LifecycleEvent::LinkMove {
                source,
                destination,
            } => {
                state.unregister_link(model, source);
                state.dirty.mark_link(destination.clone());
            }
            LifecycleEvent::LinkCopy { destination } => {
                state.dirty.mark_link(destination.clone());
            }
            LifecycleEvent::LinkCreate { resource }
            | LifecycleEvent::FilterAdd { resource }
            | LifecycleEvent::FilterRemove { resource } => {
                state.dirty.mark_link(resource.clone());
            }
        }
    }

    /// Records project-level changes from a completed operation.
    pub fn resource_changed(&self, deltas: &[ProjectDelta]) {
        if deltas.iter().any(ProjectDelta::affects_locations) {
            self.lock_state().dirty.mark_projects();
        }
    }

    pub fn non_default_resource_count(&self) -> i64 {
        self.lock_state().non_default_count
    }

    /// Projects known to have at least one alias, as of the last reconcile.
    pub fn aliased_projects(&self) -> Vec<Resource> {
        self.lock_state().aliased.to_sorted_vec()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock_state().dirty.is_dirty()
    }
}

/// Removes `project` from the workspace if its location no longer exists.
/// Returns `true` if it was removed. A location the file system cannot
/// resolve counts as present.
fn delete_if_missing(model: &dyn ResourceModel, project: &Resource) -> io::Result<bool> {
    if !model.exists(project) {
        return Ok(false);
    }
    let Some(location) = model.location(project) else {
        return Ok(false);
    };
    match model.file_system().try_exists(&location) {
        Ok(true) => return Ok(false),
        Ok(false) => {}
        Err(err) => {
            tracing::debug!(
                target: "strata.alias",
                %project,
                %location,
                error = %err,
                "cannot tell whether project location exists; keeping project"
            );
            return Ok(false);
        }
    }

    tracing::info!(
        target: "strata.alias",
        %project,
        %location,
        "project location no longer exists; removing project"
    );
    model.delete_project(project)?;
    Ok(true)
}
