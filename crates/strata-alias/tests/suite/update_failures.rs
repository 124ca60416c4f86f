use std::io;

use strata_alias::{AliasConfig, AliasError};
use strata_core::Resource;
use strata_test_utils::FixtureWorkspace;

use super::shared_workspace;

#[test]
fn failed_refreshes_are_collected_and_the_rest_proceed() {
    let s = shared_workspace();
    s.ws.create_project("P3");
    s.ws.create_link(&Resource::folder("/P3/bar"), &s.shared);
    s.ws.fail_refresh(&Resource::file("/P2/foo/x.txt"));

    let err = s
        .ws
        .create_file(&Resource::file("/P1/x.txt"), "x")
        .unwrap_err();

    assert_eq!(err.resource, Resource::file("/P1/x.txt"));
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].resource(), &Resource::file("/P2/foo/x.txt"));
    assert!(err.to_string().contains("1 alias(es)"), "{err}");
    assert_eq!(s.ws.refreshed(), vec![Resource::file("/P3/bar/x.txt")]);
}

#[test]
fn cancellation_reaches_the_refresh() {
    let s = shared_workspace();
    s.ws.cancel();

    let err = s
        .ws
        .create_file(&Resource::file("/P1/c.txt"), "c")
        .unwrap_err();

    match &err.failures[..] {
        [AliasError::Refresh { resource, source }] => {
            assert_eq!(resource, &Resource::file("/P2/foo/c.txt"));
            assert_eq!(source.kind(), io::ErrorKind::Interrupted);
        }
        other => panic!("unexpected failures: {other:?}"),
    }
}

#[test]
fn disabled_engine_never_refreshes() {
    let ws = FixtureWorkspace::with_config(AliasConfig {
        enabled: false,
        ..AliasConfig::default()
    });
    let shared = ws.external_dir("shared");
    ws.create_project_at("P1", &shared);
    ws.create_project("P2");
    ws.create_link(&Resource::folder("/P2/foo"), &shared);

    ws.create_file(&Resource::file("/P1/bar.txt"), "bar")
        .unwrap();

    assert!(ws.refreshed().is_empty());
    assert_eq!(
        ws.aliases()
            .compute_aliases(&ws, &Resource::file("/P1/bar.txt"), None),
        None
    );
}
