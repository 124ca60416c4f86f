use std::cmp::Ordering;
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use url::Url;

use crate::error::LocationError;

/// A location in a local or virtual file system.
///
/// Locations are immutable values. Two locations are equal only if scheme,
/// host, user info, port, device, path segments and query all match; URI
/// fragments are discarded at construction.
///
/// # Ordering
///
/// Locations are ordered by scheme, then host, user info, port and device
/// (absent values sort after present ones), then path segments compared one by
/// one, then segment count (fewer first), then query. As a consequence a
/// location and every location below it form one contiguous run, which ends
/// right before [`StoreLocation::subtree_end`]. Locations whose path could not
/// be decoded sort after every well-formed location of the same scheme.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreLocation {
    scheme: String,
    host: Option<String>,
    user_info: Option<String>,
    port: Option<u16>,
    device: Option<String>,
    segments: Vec<String>,
    query: Option<String>,
    malformed: bool,
}

impl StoreLocation {
    /// A location on the local OS file system (`file` scheme).
    ///
    /// The path is lexically normalized (see [`crate::normalize_local_path`]) and must be
    /// absolute.
    pub fn local(path: impl AsRef<Path>) -> Result<Self, LocationError> {
        let path = normalize_local_path(path.as_ref());
        let mut device = None;
        let mut has_root = false;
        let mut malformed = false;
        let mut segments = Vec::new();

        for component in path.components() {
            match component {
                Component::Prefix(prefix) => {
                    device = Some(prefix.as_os_str().to_string_lossy().into_owned());
                }
                Component::RootDir => has_root = true,
                Component::Normal(segment) => match segment.to_str() {
                    Some(segment) => segments.push(segment.to_owned()),
                    None => {
                        malformed = true;
                        segments.push(segment.to_string_lossy().into_owned());
                    }
                },
                Component::CurDir | Component::ParentDir => {}
            }
        }

        if !has_root {
            return Err(LocationError::RelativePath { path });
        }

        let location = Self {
            scheme: "file".to_owned(),
            host: None,
            user_info: None,
            port: None,
            device,
            segments,
            query: None,
            malformed,
        };
        location.warn_if_malformed();
        Ok(location)
    }

    /// Parses a location from a URI such as `file:///tmp/a` or
    /// `sftp://user@host:2222/srv/data?rev=3`.
    ///
    /// Path segments are percent-decoded, so `%41` and `A` name the same
    /// segment. A leading drive segment (`C:`) becomes the location's device.
    pub fn parse(uri: &str) -> Result<Self, LocationError> {
        let url = Url::parse(uri).map_err(|source| LocationError::InvalidUri {
            uri: uri.to_owned(),
            source,
        })?;

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_owned);
        let user_info = match (url.username(), url.password()) {
            ("", None) => None,
            (user, None) => Some(user.to_owned()),
            (user, Some(password)) => Some(format!("{user}:{password}")),
        };

        let mut malformed = false;
        let mut segments: Vec<String> = Vec::new();
        for raw in url.path().split('/').filter(|raw| !raw.is_empty()) {
            let segment = match percent_decode_utf8(raw) {
                Some(segment) => segment,
                None => {
                    malformed = true;
                    raw.to_owned()
                }
            };
            match segment.as_str() {
                "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(segment),
            }
        }

        let device = match segments.first() {
            Some(first) if is_drive(first) => Some(segments.remove(0).to_ascii_uppercase()),
            _ => None,
        };

        let location = Self {
            scheme: url.scheme().to_owned(),
            host,
            user_info,
            port: url.port(),
            device,
            segments,
            query: url.query().map(str::to_owned),
            malformed,
        };
        location.warn_if_malformed();
        Ok(location)
    }

    fn warn_if_malformed(&self) {
        if self.malformed {
            tracing::warn!(
                target: "strata.vfs",
                location = %self,
                "location path could not be decoded; it will sort after well-formed locations"
            );
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn user_info(&self) -> Option<&str> {
        self.user_info.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns `true` if part of the path could not be decoded.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// The last path segment, or `""` for a root location.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The location one segment up. Roots have no parent. The query does not
    /// carry over to the parent.
    pub fn parent(&self) -> Option<StoreLocation> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
            query: None,
            ..self.clone()
        })
    }

    pub fn child(&self, name: impl Into<String>) -> StoreLocation {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self {
            segments,
            query: None,
            ..self.clone()
        }
    }

    /// Returns `true` if `other` lies strictly below this location.
    pub fn is_parent_of(&self, other: &StoreLocation) -> bool {
        self.same_root(other)
            && other.segments.len() > self.segments.len()
            && other.segments.starts_with(&self.segments)
    }

    /// Returns `true` if this location is `other` or one of its ancestors.
    pub fn contains(&self, other: &StoreLocation) -> bool {
        self.same_root(other) && other.segments.starts_with(&self.segments)
    }

    fn same_root(&self, other: &StoreLocation) -> bool {
        self.scheme == other.scheme
            && self.malformed == other.malformed
            && self.host == other.host
            && self.user_info == other.user_info
            && self.port == other.port
            && self.device == other.device
    }

    /// The smallest location that sorts after this location and everything
    /// below it, but before any sibling: the sibling named `name + "\0"`.
    ///
    /// Returns `None` for roots, whose subtree is unbounded.
    pub fn subtree_end(&self) -> Option<StoreLocation> {
        let parent = self.parent()?;
        Some(parent.child(format!("{}\0", self.name())))
    }

    /// Converts a `file` location into a local path.
    pub fn to_local_path(&self) -> Option<PathBuf> {
        if self.scheme != "file" || self.host.is_some() || self.malformed {
            return None;
        }
        let mut out = PathBuf::new();
        match &self.device {
            Some(device) => out.push(format!("{device}{}", std::path::MAIN_SEPARATOR)),
            None => out.push(std::path::MAIN_SEPARATOR.to_string()),
        }
        out.extend(&self.segments);
        Some(out)
    }
}

impl Ord for StoreLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scheme
            .cmp(&other.scheme)
            .then_with(|| self.malformed.cmp(&other.malformed))
            .then_with(|| cmp_present_first(&self.host, &other.host))
            .then_with(|| cmp_present_first(&self.user_info, &other.user_info))
            .then_with(|| cmp_present_first(&self.port, &other.port))
            .then_with(|| cmp_present_first(&self.device, &other.device))
            // Slice ordering is segment-wise, then shorter-first on a common prefix.
            .then_with(|| self.segments.cmp(&other.segments))
            .then_with(|| cmp_present_first(&self.query, &other.query))
    }
}

impl PartialOrd for StoreLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn cmp_present_first<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for StoreLocation {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoreLocation::parse(s)
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        let has_authority = self.host.is_some() || self.user_info.is_some() || self.port.is_some();
        if has_authority || self.scheme == "file" {
            f.write_str("//")?;
            if let Some(user_info) = &self.user_info {
                write!(f, "{user_info}@")?;
            }
            if let Some(host) = &self.host {
                f.write_str(host)?;
            }
            if let Some(port) = self.port {
                write!(f, ":{port}")?;
            }
        }
        if let Some(device) = &self.device {
            write!(f, "/{device}")?;
        }
        if self.segments.is_empty() && self.device.is_none() {
            f.write_str("/")?;
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn percent_decode_utf8(s: &str) -> Option<String> {
    if !s.as_bytes().contains(&b'%') {
        return Some(s.to_string());
    }

    fn from_hex(b: u8) -> Option<u8> {
        Some(match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => 10 + (b - b'a'),
            b'A'..=b'F' => 10 + (b - b'A'),
            _ => return None,
        })
    }

    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .and_then(|hex| Some((from_hex(hex[0])? << 4) | from_hex(hex[1])?));
                match escaped {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    // Not an escape; keep the `%` literally.
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).ok()
}

pub(crate) fn normalize_local_path(path: &Path) -> PathBuf {
    let mut prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut stack: Vec<OsString> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix_component) => {
                prefix = Some(normalize_prefix(prefix_component));
            }
            Component::RootDir => has_root = true,
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(last) = stack.last() {
                    if last != ".." {
                        stack.pop();
                        continue;
                    }
                }

                if !has_root {
                    stack.push(OsString::from(".."));
                }
            }
            Component::Normal(segment) => stack.push(segment.to_owned()),
        }
    }

    let mut out = PathBuf::new();
    match (prefix, has_root) {
        (Some(mut prefix), true) => {
            prefix.push(std::path::MAIN_SEPARATOR.to_string());
            out.push(prefix);
        }
        (Some(prefix), false) => out.push(prefix),
        (None, true) => out.push(std::path::MAIN_SEPARATOR.to_string()),
        (None, false) => {}
    }
    out.extend(stack);
    out
}

fn normalize_prefix(prefix_component: std::path::PrefixComponent<'_>) -> OsString {
    #[cfg(windows)]
    {
        let prefix = prefix_component.as_os_str().to_string_lossy().into_owned();
        if let Some(colon) = prefix.rfind(':') {
            if colon > 0 {
                let mut bytes = prefix.into_bytes();
                let drive = bytes[colon - 1];
                if drive.is_ascii_alphabetic() {
                    bytes[colon - 1] = drive.to_ascii_uppercase();
                }
                return OsString::from(String::from_utf8(bytes).unwrap_or_default());
            }
        }
        OsString::from(prefix)
    }

    #[cfg(not(windows))]
    {
        prefix_component.as_os_str().to_owned()
    }
}
