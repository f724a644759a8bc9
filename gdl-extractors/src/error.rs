use crate::auth::Error;
use crate::extractor_config::ConfigError;
use crate::filter::Fingerprint;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Enumerates the possible errors that can arise during extractor operations.
///
/// `RateLimited` and `ParseFailure` are the two failures callers are expected to
/// inspect: the first means "try again later", the second means the source returned
/// something this extractor can't make sense of.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The server answered with a temporary ban notice instead of content.
    ///
    /// `retry_after` is advisory; nothing in this crate sleeps on it.
    #[error("IP address temporarily banned while fetching {url}, retry after {}s", .retry_after.as_secs())]
    RateLimited { url: Url, retry_after: Duration },

    /// The response was structurally unexpected even after a forced session refresh.
    #[error("Failed to parse response from {url}: {reason}")]
    ParseFailure { url: Url, reason: String },

    /// A page was requested without the page before it being fetched first.
    ///
    /// This is a calling-convention bug, so it is never turned into a page 0 fetch.
    #[error("No continuation token stored for page {page} of search {fingerprint}. Pages must be fetched in order")]
    CursorMissing { fingerprint: Fingerprint, page: u32 },

    /// The server replied with a non-success status that no interceptor handled.
    #[error("Server returned status {status} for {url}")]
    ServerStatus { url: Url, status: StatusCode },

    /// An error occurred during a network request (e.g., connection timeout, DNS resolution failure).
    /// Wraps an underlying `reqwest::Error`.
    #[error("Connection Error")]
    ConnectionError(#[from] reqwest::Error),

    /// A configured or scraped URL could not be parsed.
    #[error("Invalid URL: {source}")]
    InvalidUrl {
        #[from]
        source: url::ParseError,
    },

    /// The source configuration can't be used to build an extractor.
    #[error("Invalid source configuration: {message}")]
    InvalidConfig { message: String },

    /// Reading or writing the session cookie cache failed.
    #[error("Authentication failed. error: {source}")]
    AuthenticationFailure {
        #[from]
        source: Error,
    },
}

impl ExtractorError {
    #[inline]
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// How long the server asked us to stay away, if this is a ban.
    #[inline]
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<ConfigError> for ExtractorError {
    fn from(value: ConfigError) -> Self {
        Self::InvalidConfig {
            message: value.to_string(),
        }
    }
}
