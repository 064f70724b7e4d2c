//! Resource locators and identity.
//!
//! A [`Resource`] is what callers hand in (scheme, authority, path). All
//! resource-scoped state is keyed by a [`ResourceKey`] produced by an
//! [`IdentityService`], so two locators the identity service considers equal
//! share cache entries and session overrides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Scheme used for resources on the local disk.
pub const FILE_SCHEME: &str = "file";

/// A resource locator: `scheme://authority/path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Locator scheme, e.g. `file`.
    pub scheme: String,

    /// Authority component; empty for local files.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authority: String,

    /// Absolute, `/`-separated path.
    pub path: String,
}

impl Resource {
    /// Creates a resource from its parts.
    #[must_use]
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            path: path.into(),
        }
    }

    /// Creates a `file` resource for an absolute path.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(FILE_SCHEME, "", path)
    }

    /// Parses `scheme://authority/path`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidResource` if the scheme is missing or
    /// contains characters outside `[A-Za-z0-9+.-]`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidResource {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = input.split_once("://").ok_or_else(|| invalid("missing '://'"))?;
        if scheme.is_empty() {
            return Err(invalid("empty scheme"));
        }
        if !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(invalid("scheme contains invalid characters"));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        Ok(Self::new(scheme, authority, path))
    }

    /// Returns the last path segment, if any.
    #[must_use]
    pub fn basename(&self) -> Option<&str> {
        self.path.rsplit('/').find(|s| !s.is_empty())
    }

    /// Returns the extension of the last path segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.basename()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}

/// Normalized, comparable identity of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Returns the normalized key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource equality and containment.
pub trait IdentityService: Send + Sync {
    /// Computes the identity key for a resource.
    fn key(&self, resource: &Resource) -> ResourceKey;

    /// Returns true if both resources denote the same location.
    fn is_equal(&self, a: &Resource, b: &Resource) -> bool {
        self.key(a) == self.key(b)
    }

    /// Returns true if `resource` equals `parent` or lives below it.
    fn is_equal_or_parent(&self, resource: &Resource, parent: &Resource) -> bool;
}

/// Path-based identity with optional case folding of the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathIdentity {
    ignore_path_case: bool,
}

impl PathIdentity {
    /// Case-sensitive paths (typical Linux file systems).
    #[must_use]
    pub const fn case_sensitive() -> Self {
        Self {
            ignore_path_case: false,
        }
    }

    /// Case-insensitive paths (typical macOS and Windows file systems).
    #[must_use]
    pub const fn ignore_path_case() -> Self {
        Self {
            ignore_path_case: true,
        }
    }

    fn normalize_path(&self, path: &str) -> String {
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        if self.ignore_path_case {
            path.to_lowercase()
        } else {
            path.to_string()
        }
    }
}

impl IdentityService for PathIdentity {
    fn key(&self, resource: &Resource) -> ResourceKey {
        ResourceKey(format!(
            "{}://{}{}",
            resource.scheme.to_ascii_lowercase(),
            resource.authority.to_ascii_lowercase(),
            self.normalize_path(&resource.path)
        ))
    }

    fn is_equal_or_parent(&self, resource: &Resource, parent: &Resource) -> bool {
        if !resource.scheme.eq_ignore_ascii_case(&parent.scheme)
            || !resource.authority.eq_ignore_ascii_case(&parent.authority)
        {
            return false;
        }

        let child = self.normalize_path(&resource.path);
        let parent = self.normalize_path(&parent.path);
        if child == parent || parent == "/" {
            return true;
        }
        child
            .strip_prefix(parent.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}
