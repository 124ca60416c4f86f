use std::fs;
use std::io;

use crate::location::StoreLocation;

/// File system abstraction for Strata.
///
/// The trait is intentionally small: the alias engine only needs to know
/// whether a location still exists, and refresh implementations need to list
/// directories.
pub trait FileSystem: Send + Sync {
    /// Returns whether a location exists.
    ///
    /// Locations this file system cannot resolve report `false`; use
    /// [`FileSystem::try_exists`] to tell them apart from missing ones.
    fn exists(&self, location: &StoreLocation) -> bool;

    /// Returns `Ok(true)` or `Ok(false)` only when existence could be
    /// determined. Unresolvable locations return an error, usually
    /// `ErrorKind::Unsupported`.
    fn try_exists(&self, location: &StoreLocation) -> io::Result<bool> {
        Ok(self.exists(location))
    }

    /// Returns whether a location exists and is a directory.
    fn is_dir(&self, location: &StoreLocation) -> bool;

    /// Lists directory entries. Implementations may return `ErrorKind::Unsupported`.
    fn read_dir(&self, location: &StoreLocation) -> io::Result<Vec<StoreLocation>>;
}

/// Local OS file system implementation. Only well-formed `file` locations are
/// reachable; [`FileSystem::try_exists`] fails for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn exists(&self, location: &StoreLocation) -> bool {
        location
            .to_local_path()
            .is_some_and(|path| path.exists())
    }

    fn try_exists(&self, location: &StoreLocation) -> io::Result<bool> {
        let Some(path) = location.to_local_path() else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("location cannot be resolved to a local path ({location})"),
            ));
        };
        path.try_exists()
    }

    fn is_dir(&self, location: &StoreLocation) -> bool {
        location.to_local_path().is_some_and(|path| path.is_dir())
    }

    fn read_dir(&self, location: &StoreLocation) -> io::Result<Vec<StoreLocation>> {
        let Some(path) = location.to_local_path() else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("directory listing not supported ({location})"),
            ));
        };

        let mut out = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => out.push(location.child(name)),
                Err(name) => {
                    tracing::debug!(
                        target: "strata.vfs",
                        parent = %location,
                        name = ?name,
                        "skipping directory entry with a non UTF-8 name"
                    );
                }
            }
        }
        out.sort();
        Ok(out)
    }
}
