//! Alias computation over a [`LocationMap`].
//!
//! A resource's shallow aliases are the other resources whose location is
//! exactly the same. They are found by walking from the resource's location up
//! to the store root and translating every registration met on the way back
//! down by the segments climbed so far. Deep aliases add everything registered
//! below the resource's location.

use std::collections::BTreeSet;

use strata_core::{Resource, ResourceKind, ResourcePath};
use strata_vfs::StoreLocation;

use crate::location_map::LocationMap;
use crate::model::ResourceModel;

/// Resources other than `resource` that live at exactly the same location.
///
/// `location` overrides the location reported by the model, which lets callers
/// ask about a location a resource is about to occupy.
pub fn shallow_aliases(
    locations: &LocationMap,
    model: &dyn ResourceModel,
    resource: &Resource,
    location: Option<&StoreLocation>,
) -> BTreeSet<Resource> {
    let mut aliases = BTreeSet::new();
    let Some(start) = location.cloned().or_else(|| model.location(resource)) else {
        return aliases;
    };

    let mut suffix = ResourcePath::ROOT;
    let mut current = Some(start);
    while let Some(location) = current {
        for registered in locations.exact(&location) {
            if let Some(alias) = translate(model, resource, registered, &suffix) {
                aliases.insert(alias);
            }
        }
        suffix.push_front(location.name());
        current = location.parent();
    }
    aliases
}

/// Shallow aliases plus every resource registered at or below the location.
///
/// For a project the registrations below each of its links are included as
/// well, since linked content lives outside the project's own location.
pub fn deep_aliases(
    locations: &LocationMap,
    model: &dyn ResourceModel,
    resource: &Resource,
    location: Option<&StoreLocation>,
) -> BTreeSet<Resource> {
    let Some(location) = location.cloned().or_else(|| model.location(resource)) else {
        return BTreeSet::new();
    };

    let mut aliases = shallow_aliases(locations, model, resource, Some(&location));
    aliases.extend(
        locations
            .under(&location)
            .filter(|registered| *registered != resource)
            .cloned(),
    );

    if resource.is_project() {
        for link in model.linked_members(resource) {
            let Some(link_location) = model.location(&link) else {
                continue;
            };
            aliases.extend(
                locations
                    .under(&link_location)
                    .filter(|registered| **registered != link)
                    .cloned(),
            );
        }
    }
    aliases
}

/// Maps `registered` (found `suffix` levels above the searched location) to
/// the resource that shares the searched location, if there is one.
fn translate(
    model: &dyn ResourceModel,
    searched: &Resource,
    registered: &Resource,
    suffix: &ResourcePath,
) -> Option<Resource> {
    // The searched resource itself, or an ancestor of it.
    if registered.path().is_prefix_of(searched.path()) {
        return None;
    }

    let path = match registered.kind() {
        ResourceKind::Project => {
            // A link inside the project hides whatever the project's own
            // directory has under the same name.
            if let Some(first) = suffix.segment(0) {
                if let Some(member) = model.find_member(registered, first) {
                    if model.is_linked(&member) {
                        return None;
                    }
                }
            }
            registered.path().append(suffix)
        }
        ResourceKind::Folder => registered.path().append(suffix),
        ResourceKind::File => {
            if !suffix.is_root() {
                return None;
            }
            registered.path().clone()
        }
    };

    let kind = match searched.kind() {
        ResourceKind::File => ResourceKind::File,
        _ if path.segment_count() == 1 => ResourceKind::Project,
        _ => ResourceKind::Folder,
    };
    Some(Resource::new(kind, path))
}
