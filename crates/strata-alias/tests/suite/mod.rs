use strata_config::LoggingConfig;
use strata_core::Resource;
use strata_test_utils::FixtureWorkspace;
use strata_vfs::StoreLocation;

mod link_lifecycle;
mod project_lifecycle;
mod update_failures;

/// P1 is stored in `.external/shared`; P2 links `foo` to the same directory.
pub(crate) struct Shared {
    pub ws: FixtureWorkspace,
    pub shared: StoreLocation,
    pub p1: Resource,
    pub p2: Resource,
    pub foo: Resource,
}

pub(crate) fn shared_workspace() -> Shared {
    strata_config::init_tracing(&LoggingConfig::default());
    let ws = FixtureWorkspace::new();
    let shared = ws.external_dir("shared");
    let p1 = ws.create_project_at("P1", &shared);
    let p2 = ws.create_project("P2");
    let foo = Resource::folder("/P2/foo");
    ws.create_link(&foo, &shared);
    Shared {
        ws,
        shared,
        p1,
        p2,
        foo,
    }
}
