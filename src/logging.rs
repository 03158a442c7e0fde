//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for command output. `RUST_LOG`
//! wins over the CLI flags when it is set.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Resolve the base level from the global flags.
pub fn level_for(verbose: bool, quiet: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn initialize_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_beats_quiet() {
        assert_eq!(level_for(true, true), Level::DEBUG);
        assert_eq!(level_for(false, true), Level::ERROR);
        assert_eq!(level_for(false, false), Level::WARN);
    }
}
