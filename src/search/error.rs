//! Error types for search providers.

use thiserror::Error;

/// Errors that can occur while running a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-level error (DNS, connection refused, TLS, timeout).
    #[error("network error searching for {query:?}: {source}")]
    Network {
        /// The query being searched.
        query: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("search API returned HTTP {status} for {query:?}: {message}")]
    Api {
        /// The query being searched.
        query: String,
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, if any.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid search response for {query:?}: {source}")]
    Decode {
        /// The query being searched.
        query: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The provider could not be configured.
    #[error("invalid search configuration: {reason}")]
    Config {
        /// What is wrong.
        reason: String,
    },
}

impl SearchError {
    /// Creates a network error.
    pub fn network(query: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            query: query.into(),
            source,
        }
    }

    /// Creates an API status error.
    pub fn api(query: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            query: query.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
