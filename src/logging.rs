use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config;

const LOG_FILE: &str = "type2learn.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logging for the practice TUI. Writes go to a file; stdout and stderr
/// belong to the terminal UI.
pub fn init_file_logging() {
    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter())
            .init();

        tracing::info!(path = %log_path.display(), "logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No usable log file: drop logs rather than draw over the UI.
    tracing_subscriber::registry().with(env_filter()).init();
}

/// Logging for `serve`, which has no screen to protect.
pub fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!("Failed to create log dir {}: {e}", parent.display()));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!("Failed to open log file {}: {e}", candidate.display()));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    vec![
        config::data_dir().join(LOG_FILE),
        PathBuf::from(".type2learn").join(LOG_FILE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_candidates_end_in_log_name() {
        let candidates = log_file_candidates();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|p| p.ends_with(LOG_FILE)));
    }
}
