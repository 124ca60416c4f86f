use strata_alias::ResourceModel;
use strata_core::{Depth, Resource};
use strata_test_utils::FixtureWorkspace;
use tokio_util::sync::CancellationToken;

use super::shared_workspace;

#[test]
fn closing_a_project_removes_its_aliases() {
    let s = shared_workspace();
    let bar = Resource::file("/P1/bar.txt");

    s.ws.close_project("P2");
    assert_eq!(s.ws.aliases().compute_aliases(&s.ws, &bar, None), None);
    assert!(s.ws.aliases().aliased_projects().is_empty());
    assert_eq!(s.ws.aliases().non_default_resource_count(), 1);

    s.ws.open_project("P2");
    assert_eq!(
        s.ws.aliases().compute_aliases(&s.ws, &bar, None),
        Some(vec![Resource::file("/P2/foo/bar.txt")])
    );
}

#[test]
fn removed_project_leaves_the_index() {
    let s = shared_workspace();

    s.ws.remove_project("P2");
    s.ws.aliases().reconcile(&s.ws);

    assert_eq!(s.ws.aliases().find_resources(&s.shared), vec![s.p1.clone()]);
    assert!(s.ws.aliases().aliased_projects().is_empty());
}

#[test]
fn relocating_a_project_onto_a_link_target_aliases_them() {
    let ws = FixtureWorkspace::new();
    let target = ws.external_dir("target");
    ws.create_project("P1");
    ws.create_project("P2");
    ws.create_link(&Resource::folder("/P2/foo"), &target);
    ws.aliases().reconcile(&ws);
    assert!(ws.aliases().aliased_projects().is_empty());

    ws.set_project_location("P1", Some(&target));

    assert_eq!(
        ws.aliases()
            .compute_aliases(&ws, &Resource::file("/P2/foo/a.txt"), None),
        Some(vec![Resource::file("/P1/a.txt")])
    );
}

#[test]
fn project_with_a_vanished_directory_is_removed() {
    let ws = FixtureWorkspace::new();
    let location = ws.external_dir("p");
    let p1 = ws.create_project_at("P1", &location);
    let p2 = ws.create_project_at("P2", &location);
    std::fs::remove_dir_all(location.to_local_path().unwrap()).unwrap();

    ws.aliases()
        .update_aliases(&ws, &p2, None, Depth::Infinite, &CancellationToken::new())
        .unwrap();

    assert_eq!(ws.deleted_projects(), vec![p1.clone()]);
    assert!(ws.refreshed().is_empty());
    assert!(!ws.exists(&p1));

    // The removal was reported back while the update was still running.
    assert!(ws.aliases().is_dirty());
    ws.aliases().reconcile(&ws);
    assert_eq!(ws.aliases().find_resources(&location), vec![p2]);
    assert!(ws.aliases().aliased_projects().is_empty());
}

#[test]
fn project_deletion_can_be_turned_off() {
    let ws = FixtureWorkspace::with_config(strata_alias::AliasConfig {
        delete_missing_projects: false,
        ..Default::default()
    });
    let location = ws.external_dir("p");
    let p1 = ws.create_project_at("P1", &location);
    let p2 = ws.create_project_at("P2", &location);
    std::fs::remove_dir_all(location.to_local_path().unwrap()).unwrap();

    ws.aliases()
        .update_aliases(&ws, &p2, None, Depth::Infinite, &CancellationToken::new())
        .unwrap();

    assert!(ws.deleted_projects().is_empty());
    assert_eq!(ws.refreshed(), vec![p1.clone()]);
    assert!(ws.exists(&p1));
}

// macOS file systems reject non UTF-8 names.
#[cfg(target_os = "linux")]
#[test]
fn project_at_an_unresolvable_location_is_kept() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let ws = FixtureWorkspace::new();
    let dir = ws.root().join(OsStr::from_bytes(b"shared\xff"));
    std::fs::create_dir(&dir).unwrap();
    let location = strata_test_utils::location_of(&dir);
    assert!(location.is_malformed());

    let p1 = ws.create_project_at("P1", &location);
    let p2 = ws.create_project_at("P2", &location);
    ws.aliases()
        .update_aliases(&ws, &p2, None, Depth::Infinite, &CancellationToken::new())
        .unwrap();

    assert!(dir.is_dir());
    assert!(ws.deleted_projects().is_empty());
    assert_eq!(ws.refreshed(), vec![p1.clone()]);
    assert!(ws.exists(&p1));
}

#[test]
fn shutdown_and_startup_rebuild_from_the_model() {
    let s = shared_workspace();
    let aliases = s.ws.aliases();

    aliases.shutdown();
    assert!(aliases.find_resources(&s.shared).is_empty());

    aliases.startup(&s.ws);
    assert!(!aliases.is_dirty());
    assert_eq!(aliases.aliased_projects(), vec![s.p1.clone(), s.p2.clone()]);
}
