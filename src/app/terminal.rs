//! Log output setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::cli::Args;

/// ANSI is off when `--no-color` is given, `NO_COLOR` is set to anything
/// non-empty, or `TERM` is `dumb`.
fn ansi_allowed(no_color_flag: bool, no_color_env: Option<&str>, term: Option<&str>) -> bool {
    let env_opt_out = no_color_env.is_some_and(|value| !value.is_empty());
    let dumb = term.is_some_and(|value| value.eq_ignore_ascii_case("dumb"));
    !(no_color_flag || env_opt_out || dumb)
}

/// `-q` beats `-v`; `RUST_LOG` beats both (see [`init_tracing`]).
pub(crate) fn default_log_level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Installs the stderr subscriber.
pub(crate) fn init_tracing(args: &Args) {
    let no_color = std::env::var("NO_COLOR").ok();
    let term = std::env::var("TERM").ok();
    let ansi = ansi_allowed(args.no_color, no_color.as_deref(), term.as_deref());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(args.verbose, args.quiet)));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_env_filter(filter)
        .try_init();
}
