use std::borrow::Cow;

/// Errors raised by the store, feeds and follow manager.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A slug, username, id or follow edge did not resolve.
    #[error("{0} not found")]
    NotFound(Cow<'static, str>),
    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(Cow<'static, str>),
    /// An entity failed validation before reaching the store.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable reason.
        reason: Cow<'static, str>,
    },
}

impl Error {
    /// Shortcut for [`Error::NotFound`].
    pub fn not_found(what: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(what.into())
    }
    /// Shortcut for [`Error::Conflict`].
    pub fn conflict(what: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(what.into())
    }
    /// Shortcut for [`Error::Invalid`].
    pub fn invalid(field: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a [`Error::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
