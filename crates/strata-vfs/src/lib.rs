//! File-store locations for Strata.
//!
//! The VFS layer is responsible for:
//! - Naming locations in local or virtual file systems ([`StoreLocation`]).
//! - Ordering locations so that a location and everything below it form one
//!   contiguous run (see [`StoreLocation`]'s `Ord` impl).
//! - Answering existence / listing questions through the [`FileSystem`] trait.

mod error;
mod fs;
mod location;

pub use error::LocationError;
pub use fs::{FileSystem, LocalFs};
pub use location::StoreLocation;

/// Lexically normalizes a local filesystem path using the same rules as `StoreLocation::local`.
///
/// This does not hit the filesystem and does not resolve symlinks.
pub fn normalize_local_path(path: &std::path::Path) -> std::path::PathBuf {
    crate::location::normalize_local_path(path)
}
