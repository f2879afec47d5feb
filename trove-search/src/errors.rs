//! Error types for provider search.

use std::fmt;

use thiserror::Error;

use crate::types::ExternalSource;

/// Errors that can occur while searching providers.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Provider answered with a failure status, timed out, or sent a payload
    /// that could not be decoded.
    #[error("Provider {provider} unavailable: {cause}")]
    ProviderUnavailable {
        /// The provider that failed
        provider: ExternalSource,
        /// What went wrong
        cause: FailureCause,
    },

    /// A secret the provider cannot work without is not configured.
    #[error("Missing credentials for provider {provider}")]
    MissingCredentials {
        /// The provider lacking credentials
        provider: ExternalSource,
    },

    /// Caller asked for a content type no provider serves.
    #[error("Unsupported content type: {value}")]
    UnsupportedContentType {
        /// The content type as supplied by the caller
        value: String,
    },

    /// Provider returned success but the body carried an authentication error.
    #[error("Provider {provider} rejected credentials")]
    AuthRejected {
        /// The provider that rejected the request
        provider: ExternalSource,
    },
}

impl SearchError {
    /// Shorthand for a `ProviderUnavailable` error.
    pub fn unavailable(provider: ExternalSource, cause: FailureCause) -> Self {
        SearchError::ProviderUnavailable { provider, cause }
    }

    /// Maps a reqwest failure for `provider` into `ProviderUnavailable`.
    pub fn from_reqwest(provider: ExternalSource, error: reqwest::Error) -> Self {
        Self::unavailable(provider, FailureCause::from_reqwest(error))
    }

    /// True when the provider could not serve the request at all.
    ///
    /// Authentication rejections count as unavailability for orchestration.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            SearchError::ProviderUnavailable { .. } | SearchError::AuthRejected { .. }
        )
    }

    /// The provider this error is about, if any.
    pub fn provider(&self) -> Option<ExternalSource> {
        match self {
            SearchError::ProviderUnavailable { provider, .. }
            | SearchError::MissingCredentials { provider }
            | SearchError::AuthRejected { provider } => Some(*provider),
            SearchError::UnsupportedContentType { .. } => None,
        }
    }
}

/// Reason a provider call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// Non-success HTTP status
    Status(u16),
    /// Request exceeded the configured provider timeout
    Timeout,
    /// Connection or protocol level failure
    Transport(String),
    /// Body could not be decoded
    Malformed(String),
}

impl FailureCause {
    /// Classifies a reqwest error.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FailureCause::Timeout
        } else if let Some(status) = error.status() {
            FailureCause::Status(status.as_u16())
        } else if error.is_decode() {
            FailureCause::Malformed(error.to_string())
        } else {
            FailureCause::Transport(error.to_string())
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Status(code) => write!(f, "HTTP {code}"),
            FailureCause::Timeout => write!(f, "request timed out"),
            FailureCause::Transport(reason) => write!(f, "transport error: {reason}"),
            FailureCause::Malformed(reason) => write!(f, "malformed response: {reason}"),
        }
    }
}
