//! Utilities shared by Strata tests.
//!
//! The main entry point is [`FixtureWorkspace`]: a resource tree backed by a
//! temporary directory that implements [`strata_alias::ResourceModel`] and
//! forwards every change to its own [`strata_alias::AliasManager`], the way a
//! real workspace would.

mod fixture_fs;

#[cfg(feature = "fixture-workspace")]
mod workspace;

pub use fixture_fs::*;

#[cfg(feature = "fixture-workspace")]
pub use workspace::*;
