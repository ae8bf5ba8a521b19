//! External download command wrapper.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{FetchError, FetchOutput, Fetcher};
use crate::ItemId;

/// Default download executable.
pub const DEFAULT_FETCH_PROGRAM: &str = "youtube-dl";

/// Default `nice --adjustment` value for the download process.
pub const DEFAULT_NICENESS: u8 = 20;

const NICE_PROGRAM: &str = "nice";
const ID_PLACEHOLDER: &str = "{id}";
const URL_PLACEHOLDER: &str = "{url}";

/// Returns the watch page URL for a video identifier.
#[must_use]
pub fn watch_url(id: &ItemId) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

/// Builder for the per-item download command line.
///
/// Arguments may contain `{id}` or `{url}` placeholders. When none of them
/// does, the watch URL is appended as the final argument.
///
/// # Example
///
/// ```
/// use tubefetch_core::fetch::FetchCommand;
///
/// let command = FetchCommand::new("yt-dlp")
///     .arg("-x")
///     .niceness(None);
/// assert_eq!(command.program().to_str(), Some("yt-dlp"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCommand {
    program: PathBuf,
    args: Vec<String>,
    niceness: Option<u8>,
    nice_program: PathBuf,
}

impl FetchCommand {
    /// Creates a command for `program` with no arguments, run under
    /// `nice --adjustment 20`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            niceness: Some(DEFAULT_NICENESS),
            nice_program: PathBuf::from(NICE_PROGRAM),
        }
    }

    /// The default audio-extraction invocation of `program`.
    pub fn audio_extract(program: impl Into<PathBuf>) -> Self {
        Self::new(program)
            .arg("-f")
            .arg("bestaudio")
            .arg("-x")
            .arg("--audio-format")
            .arg("m4a")
            .arg("--postprocessor-args")
            .arg("-strict experimental")
    }

    /// Adds one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the `nice` adjustment; `None` or `Some(0)` runs the program directly.
    #[must_use]
    pub fn niceness(mut self, niceness: Option<u8>) -> Self {
        self.niceness = niceness.filter(|n| *n > 0);
        self
    }

    /// The download program.
    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Resolves the program (and `nice`, when used) on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ProgramNotFound`] for the first binary that
    /// cannot be found.
    pub fn resolve(mut self) -> Result<Self, FetchError> {
        self.program = lookup(&self.program)?;
        if self.niceness.is_some() {
            self.nice_program = lookup(&self.nice_program)?;
        }
        debug!(program = %self.program.display(), "fetch program resolved");
        Ok(self)
    }

    /// Expands the argument list for one identifier.
    #[must_use]
    pub fn args_for(&self, id: &ItemId) -> Vec<String> {
        let url = watch_url(id);
        let mut has_placeholder = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(ID_PLACEHOLDER) || arg.contains(URL_PLACEHOLDER) {
                    has_placeholder = true;
                }
                arg.replace(URL_PLACEHOLDER, &url)
                    .replace(ID_PLACEHOLDER, id.as_str())
            })
            .collect();
        if !has_placeholder {
            args.push(url);
        }
        args
    }

    /// Builds the process command for one identifier.
    #[must_use]
    pub fn build(&self, id: &ItemId) -> Command {
        let mut cmd = match self.niceness {
            Some(adjustment) => {
                let mut cmd = Command::new(&self.nice_program);
                cmd.arg("--adjustment")
                    .arg(adjustment.to_string())
                    .arg(&self.program);
                cmd
            }
            None => Command::new(&self.program),
        };
        cmd.args(self.args_for(id));
        cmd
    }
}

impl Default for FetchCommand {
    fn default() -> Self {
        Self::audio_extract(DEFAULT_FETCH_PROGRAM)
    }
}

fn lookup(program: &std::path::Path) -> Result<PathBuf, FetchError> {
    which::which(program).map_err(|source| FetchError::ProgramNotFound {
        program: program.display().to_string(),
        source,
    })
}

/// [`Fetcher`] that runs a [`FetchCommand`] once per identifier.
///
/// The child is killed if the fetch future is dropped, so cancelling a
/// download task also stops its process.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    command: FetchCommand,
}

impl CommandFetcher {
    /// Wraps a command.
    #[must_use]
    pub fn new(command: FetchCommand) -> Self {
        Self { command }
    }

    /// The wrapped command.
    #[must_use]
    pub fn command(&self) -> &FetchCommand {
        &self.command
    }
}

#[async_trait]
impl Fetcher for CommandFetcher {
    #[instrument(skip(self, id), fields(id = %id))]
    async fn fetch(&self, id: &ItemId) -> Result<FetchOutput, FetchError> {
        let output = self
            .command
            .build(id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                program: self.command.program.clone(),
                id: id.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(FetchError::failed(
                id.clone(),
                output.status.to_string(),
                stdout,
                stderr,
            ));
        }

        Ok(FetchOutput { stdout })
    }
}
