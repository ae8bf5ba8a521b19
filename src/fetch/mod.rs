//! Fetch seam: hands one identifier to something that downloads it.
//!
//! [`CommandFetcher`] runs an external download executable (youtube-dl by
//! default) once per identifier. Tests substitute in-memory [`Fetcher`]
//! implementations.

mod command;
mod error;

pub use command::{CommandFetcher, DEFAULT_FETCH_PROGRAM, DEFAULT_NICENESS, FetchCommand, watch_url};
pub use error::FetchError;

use async_trait::async_trait;

use crate::ItemId;

/// Output captured from a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutput {
    /// Whatever the fetch tool printed on stdout.
    pub stdout: String,
}

/// Downloads one item.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs the download for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the download could not be completed.
    async fn fetch(&self, id: &ItemId) -> Result<FetchOutput, FetchError>;
}
