use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An absolute path to an object in a hierarchical container.
///
/// The root group is `/`, and the member `b` of group `/a` is `/a/b`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[display("{_0}")]
pub struct ObjectPath(String);

/// An invalid object path.
#[derive(Debug, Error)]
#[error("invalid object path {0}")]
pub struct ObjectPathError(String);

impl ObjectPath {
    /// Create a new object path from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectPathError`] if `path` is not valid according to [`ObjectPath::validate`()].
    pub fn new(path: &str) -> Result<Self, ObjectPathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(ObjectPathError(path.to_string()))
        }
    }

    /// The root group.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice containing the object path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the root group path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Validates a path:
    /// - a path always starts with `/`, and
    /// - a non-root path cannot end with `/`, and
    /// - a path has no empty components (i.e. a `//` substring).
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/") || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }

    /// Returns the path of the member `name` of this group.
    ///
    /// # Errors
    /// Returns [`ObjectPathError`] if `name` is empty or contains `/`.
    pub fn join(&self, name: &str) -> Result<Self, ObjectPathError> {
        if name.is_empty() || name.contains('/') {
            return Err(ObjectPathError(format!("{}/{name}", self.0)));
        }
        if self.is_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }

    /// The final component of the path, empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(_, name)| name)
    }

    /// The parent group path, [`None`] for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rsplit_once('/') {
            Some(("", _)) => Some(Self::root()),
            Some((parent, _)) => Some(Self(parent.to_string())),
            None => None,
        }
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = ObjectPathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = ObjectPathError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        if Self::validate(&path) {
            Ok(Self(path))
        } else {
            Err(ObjectPathError(path))
        }
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> Self {
        path.0
    }
}
