//! Alias tracking for the Strata workspace.
//!
//! Two resources are *aliases* when they are backed by the same file-store
//! location, for example a project stored at `/disk/shared` and a linked
//! folder in another project pointing at the same directory. When one of them
//! changes on disk the other must be refreshed, or the workspace tree goes
//! stale.
//!
//! [`AliasManager`] keeps a sorted index from [`StoreLocation`] to the
//! projects and links registered there ([`LocationMap`]), plus the set of
//! projects that overlap anything at all ([`AliasedProjects`]). The index is
//! updated lazily: lifecycle notifications only mark it dirty and the next
//! alias query folds the changes in.
//!
//! [`StoreLocation`]: strata_vfs::StoreLocation

mod aliased_projects;
mod compute;
mod dirty;
mod error;
mod event;
mod location_map;
mod manager;
mod model;

#[cfg(test)]
mod test_model;

pub use aliased_projects::AliasedProjects;
pub use compute::{deep_aliases, shallow_aliases};
pub use dirty::{DirtyState, PendingChanges};
pub use error::{AliasError, UpdateAliasesError};
pub use event::{LifecycleEvent, ProjectDelta, ProjectDeltaKind};
pub use location_map::{LocationMap, OverlappingProjects};
pub use manager::AliasManager;
pub use model::{LinkDescription, ProjectDescription, ResourceModel};

pub use strata_config::AliasConfig;
