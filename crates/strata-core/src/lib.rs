//! Core shared types for Strata.
//!
//! This crate is intentionally small: it only names resources in the
//! workspace tree. Where a resource lives on disk is `strata-vfs`' business.

mod path;
mod resource;

pub use path::ResourcePath;
pub use resource::{Depth, Resource, ResourceKind};
