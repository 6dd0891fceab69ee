use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Installs the global subscriber. The terminal belongs to the UI, so output
/// goes to the configured file; with no file configured logging stays off.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(cfg: &LogConfig) -> Result<()> {
    let Some(path) = cfg.file.as_ref() else {
        return Ok(());
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("logging: create directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("logging: open {}", path.display()))?;

    // A second call finds a subscriber already installed; that is fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_log_file_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let cfg = LogConfig {
            level: "debug".into(),
            file: Some(dir.path().join("logs").join("postfeed.log")),
        };
        init(&cfg).unwrap();
        init(&cfg).unwrap();
        assert!(dir.path().join("logs").join("postfeed.log").exists());
    }

    #[test]
    fn no_file_means_no_subscriber() {
        let cfg = LogConfig {
            level: "info".into(),
            file: None,
        };
        init(&cfg).unwrap();
    }
}
