//! Readonly policy.
//!
//! A [`ReadonlyDecision`] is either writable or readonly with the source
//! that decided it. Exactly one source wins per resolution; see
//! [`ReadonlyResolver`] for the precedence.

mod glob;
mod resolver;
mod session;

pub use glob::{ConfiguredGlobMatcher, GlobMatcher, GlobPatternMatcher};
pub use resolver::ReadonlyResolver;
pub use session::SessionReadonlyOverrides;

use serde::{Deserialize, Serialize};

/// What made a resource readonly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadonlySource {
    /// The file system provider is read-only.
    Provider,
    /// A session override.
    Session,
    /// `files.readonlyInclude`.
    Configured,
    /// File permissions, with `files.readonlyFromPermissions` on.
    FileLocked,
    /// The file system flags the file read-only.
    FileReadonly,
}

/// Effective readonly status of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReadonlyDecision {
    /// The resource can be edited.
    Writable,
    /// The resource is readonly.
    Readonly {
        /// Rule that decided.
        source: ReadonlySource,
        /// Human-readable explanation.
        message: String,
    },
}

impl ReadonlyDecision {
    /// A readonly decision.
    #[must_use]
    pub fn readonly(source: ReadonlySource, message: impl Into<String>) -> Self {
        Self::Readonly {
            source,
            message: message.into(),
        }
    }

    /// Returns true if readonly.
    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        matches!(self, Self::Readonly { .. })
    }

    /// The deciding source, if readonly.
    #[must_use]
    pub const fn source(&self) -> Option<ReadonlySource> {
        match self {
            Self::Writable => None,
            Self::Readonly { source, .. } => Some(*source),
        }
    }

    /// The explanation, if readonly.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Writable => None,
            Self::Readonly { message, .. } => Some(message),
        }
    }
}

/// Requested change to a resource's session override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadonlyUpdate {
    /// Force readonly (`true`) or writable (`false`) for this session.
    Set(bool),
    /// Invert the current effective status.
    Toggle,
    /// Drop the session override.
    Reset,
}

impl From<bool> for ReadonlyUpdate {
    fn from(value: bool) -> Self {
        Self::Set(value)
    }
}
