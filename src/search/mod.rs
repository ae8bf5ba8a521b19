//! Search providers that expand a query into candidate identifiers.
//!
//! # Architecture
//!
//! - [`SearchProvider`] - Async trait every provider implements
//! - [`SearchPage`] - Page size and leading-result skip for one call
//! - [`SearchHit`] - One raw result: its kind and identifier
//! - [`YouTubeSearch`] - YouTube Data API v3 implementation
//!
//! Providers return every hit they receive, whatever its kind. Filtering to
//! playable results happens in the expansion stage via
//! [`SearchHit::playable_id`].

mod error;
mod youtube;

pub use error::SearchError;
pub use youtube::{DEFAULT_API_BASE, YouTubeSearch};

use async_trait::async_trait;

use crate::ItemId;

/// Default number of results requested per query.
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// Paging parameters shared by every search call in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPage {
    /// Number of results to request.
    pub max_results: u32,
    /// Number of leading results to drop before filtering by kind.
    pub skip_first: usize,
}

impl Default for SearchPage {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            skip_first: 0,
        }
    }
}

/// Kind of a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    /// A single playable video.
    Video,
    /// A channel page.
    Channel,
    /// A playlist.
    Playlist,
    /// Anything else the provider reports.
    Other(String),
}

impl ResultKind {
    /// Parses a provider kind label such as `youtube#video`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "youtube#video" => Self::Video,
            "youtube#channel" => Self::Channel,
            "youtube#playlist" => Self::Playlist,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true for kinds the fetch tool can download.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Video)
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result kind.
    pub kind: ResultKind,
    /// Identifier, when the provider supplied one for this kind.
    pub id: Option<ItemId>,
}

impl SearchHit {
    /// Creates a playable video hit.
    pub fn video(id: impl Into<ItemId>) -> Self {
        Self {
            kind: ResultKind::Video,
            id: Some(id.into()),
        }
    }

    /// Creates a hit of an arbitrary kind.
    pub fn new(kind: ResultKind, id: Option<ItemId>) -> Self {
        Self { kind, id }
    }

    /// Returns the identifier when this hit is playable.
    #[must_use]
    pub fn playable_id(self) -> Option<ItemId> {
        if self.kind.is_playable() {
            self.id
        } else {
            None
        }
    }
}

/// Expands a query into raw search results.
///
/// Implementations make exactly one upstream call per invocation and honor
/// `page.skip_first` by dropping that many leading results.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Human-readable provider name for logging.
    fn name(&self) -> &str;

    /// Runs one search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, status, or decode failure.
    async fn search(&self, query: &str, page: &SearchPage) -> Result<Vec<SearchHit>, SearchError>;
}
