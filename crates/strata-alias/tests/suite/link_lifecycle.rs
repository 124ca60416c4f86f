use strata_core::Resource;
use strata_test_utils::FixtureWorkspace;

use super::shared_workspace;

#[test]
fn deleted_link_is_forgotten_before_reconcile() {
    let s = shared_workspace();
    s.ws.aliases().reconcile(&s.ws);
    assert_eq!(s.ws.aliases().non_default_resource_count(), 2);

    s.ws.delete_link(&s.foo);

    assert!(s.ws.aliases().is_dirty());
    assert_eq!(s.ws.aliases().find_resources(&s.shared), vec![s.p1.clone()]);
    assert_eq!(s.ws.aliases().non_default_resource_count(), 1);
    assert_eq!(
        s.ws.aliases()
            .compute_aliases(&s.ws, &Resource::file("/P1/bar.txt"), None),
        None
    );
    assert!(s.ws.aliases().aliased_projects().is_empty());
}

#[test]
fn moved_link_is_reindexed_at_its_destination() {
    let s = shared_workspace();
    s.ws.aliases().reconcile(&s.ws);
    let moved = Resource::folder("/P2/moved");

    s.ws.move_link(&s.foo, &moved);
    assert_eq!(s.ws.aliases().find_resources(&s.shared), vec![s.p1.clone()]);

    s.ws.aliases().reconcile(&s.ws);
    assert_eq!(
        s.ws.aliases().find_resources(&s.shared),
        vec![s.p1.clone(), moved.clone()]
    );
    assert_eq!(
        s.ws.aliases()
            .compute_aliases(&s.ws, &Resource::file("/P1/bar.txt"), None),
        Some(vec![Resource::file("/P2/moved/bar.txt")])
    );
}

#[test]
fn retargeted_link_leaves_its_old_location() {
    let s = shared_workspace();
    s.ws.aliases().reconcile(&s.ws);
    let elsewhere = s.ws.external_dir("elsewhere");

    s.ws.retarget_link(&s.foo, &elsewhere);
    s.ws.aliases().reconcile(&s.ws);

    assert_eq!(s.ws.aliases().find_resources(&s.shared), vec![s.p1.clone()]);
    assert_eq!(s.ws.aliases().find_resources(&elsewhere), vec![s.foo.clone()]);
    assert_eq!(s.ws.aliases().non_default_resource_count(), 2);
    assert!(s.ws.aliases().aliased_projects().is_empty());
}

#[test]
fn unresolved_links_are_ignored() {
    let ws = FixtureWorkspace::new();
    ws.create_project("P");
    ws.create_unresolved_link(&Resource::folder("/P/var"));

    ws.aliases().reconcile(&ws);
    assert_eq!(ws.aliases().non_default_resource_count(), 0);
    assert!(ws.aliases().aliased_projects().is_empty());
}

#[test]
fn two_links_to_one_directory_are_aliases() {
    let ws = FixtureWorkspace::new();
    let data = ws.external_dir("data");
    ws.create_project("A");
    ws.create_project("B");
    ws.create_link(&Resource::folder("/A/data"), &data);
    ws.create_link(&Resource::folder("/B/data"), &data);

    ws.create_file(&Resource::file("/A/data/x.csv"), "1,2")
        .unwrap();

    assert_eq!(ws.refreshed(), vec![Resource::file("/B/data/x.csv")]);
    assert_eq!(
        ws.aliases().aliased_projects(),
        vec![Resource::project("A"), Resource::project("B")]
    );
}
