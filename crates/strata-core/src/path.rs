use std::fmt;

use serde::{Deserialize, Serialize};

/// A workspace-absolute resource path such as `/Project/src/Main.java`.
///
/// The first segment names the project. The empty path is the workspace root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// The workspace root (`/`).
    pub const ROOT: ResourcePath = ResourcePath {
        segments: Vec::new(),
    };

    /// Parses a `/`-separated path. Empty segments are ignored, so `//a/b/`
    /// and `/a/b` name the same resource.
    pub fn new(path: &str) -> Self {
        Self::from_segments(path.split('/'))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|segment: &String| !segment.is_empty())
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the path of the project containing this path, if any.
    pub fn project_path(&self) -> Option<ResourcePath> {
        self.segments.first().map(|name| Self {
            segments: vec![name.clone()],
        })
    }

    pub fn parent(&self) -> Option<ResourcePath> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Returns a new path with `name` appended.
    pub fn join(&self, name: impl Into<String>) -> ResourcePath {
        let mut out = self.clone();
        out.push(name);
        out
    }

    /// Returns a new path with every segment of `suffix` appended.
    pub fn append(&self, suffix: &ResourcePath) -> ResourcePath {
        let mut out = self.clone();
        out.segments.extend(suffix.segments.iter().cloned());
        out
    }

    /// Appends one segment; empty names are ignored.
    pub fn push(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.segments.push(name);
        }
    }

    /// Prepends one segment; empty names are ignored.
    pub fn push_front(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.segments.insert(0, name);
        }
    }

    /// Returns `true` if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &ResourcePath) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for ResourcePath {
    fn from(value: &str) -> Self {
        ResourcePath::new(value)
    }
}

impl From<String> for ResourcePath {
    fn from(value: String) -> Self {
        ResourcePath::new(&value)
    }
}

impl From<ResourcePath> for String {
    fn from(value: ResourcePath) -> Self {
        value.to_string()
    }
}
