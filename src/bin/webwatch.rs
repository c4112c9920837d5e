//! webwatch binary: watch one target described by a TOML config file.
//!
//! Usage: `webwatch [CONFIG]`. Without an argument the config is read from
//! `~/.config/webwatch/config.toml`. Ctrl-C stops the loop after the cycle
//! in flight.

use std::path::PathBuf;
use webwatch::{MandrillNotifier, Notifier, ObservationLoop, WatchConfig, fetcher_for};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; RUST_LOG overrides the default filter.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("webwatch=info,watch_extract=info")
            }),
        )
        .init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(WatchConfig::default_config_path);
    tracing::info!(config = %path.display(), "webwatch starting");

    let config = WatchConfig::from_file(&path)
        .map_err(|e| anyhow::anyhow!("cannot load {}: {e}", path.display()))?;
    config.validate()?;

    let fetcher = fetcher_for(&config)?;
    let notifier: Option<Box<dyn Notifier>> = match &config.notify {
        Some(notify) => Some(Box::new(MandrillNotifier::new(notify.clone())?)),
        None => None,
    };

    let watch = ObservationLoop::new(config, fetcher, notifier)?;
    let cancel = watch.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current cycle");
            cancel.cancel();
        }
    });

    let history = watch.run().await.map_err(|e| {
        tracing::error!(error = %e, "webwatch exited with error");
        anyhow::anyhow!("webwatch failed: {e}")
    })?;

    tracing::info!(entries = history.len(), "webwatch shut down cleanly");
    Ok(())
}
