//! Streaming reader for the newline-delimited query file.
//!
//! Queries are yielded one line at a time so the pipeline can start searching
//! before the whole file has been read. Blank lines are skipped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

/// Default query input file name.
pub const DEFAULT_INPUT_FILE: &str = "todl.txt";

/// Errors that can occur while reading queries.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input file could not be opened.
    #[error("cannot open query file {path}: {source}")]
    Open {
        /// The input path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading a line failed.
    #[error("error reading query input: {source}")]
    Read {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Yields non-blank query lines from a buffered reader.
#[derive(Debug)]
pub struct QueryReader<R = BufReader<File>> {
    lines: Lines<R>,
}

impl QueryReader<BufReader<File>> {
    /// Opens a query file.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Open`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|source| InputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> QueryReader<R> {
    /// Wraps any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Returns the next non-blank query, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] on an IO error.
    pub async fn next_query(&mut self) -> Result<Option<String>, InputError> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .map_err(|source| InputError::Read { source })?
        {
            let query = line.strip_suffix('\r').unwrap_or(&line);
            if !query.trim().is_empty() {
                return Ok(Some(query.to_string()));
            }
        }
        Ok(None)
    }
}
