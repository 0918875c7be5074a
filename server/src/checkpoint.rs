use crate::compression;
use crate::Server;
use anyhow::{Context, Result};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{sleep, Duration};

pub const LEVEL_FILE: &str = "main.level";

const SAVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Serializes the level under the read lock and writes it atomically
/// (temp file, then rename), so a crash mid-save never corrupts the
/// previous checkpoint.
pub async fn save_level(server: &Server) -> Result<()> {
    info!("Saving level...");

    let serialized = {
        let level = server.level.read().await;
        level.serialize()
    };
    let compressed =
        compression::compress(&serialized).context("failed to compress the level")?;

    let tmp = format!("{LEVEL_FILE}.tmp");
    tokio::fs::write(&tmp, &compressed)
        .await
        .with_context(|| format!("failed to write {tmp}"))?;
    tokio::fs::rename(&tmp, LEVEL_FILE)
        .await
        .with_context(|| format!("failed to move {tmp} into place"))?;

    info!("Level saved!");
    Ok(())
}

/// Saves on startup, then every five minutes, then once more when the
/// shutdown notification arrives. Save failures are logged and the loop
/// keeps going; the world stays live even if the disk is unhappy.
pub async fn run(server: Arc<Server>, shutdown: Arc<Notify>) {
    loop {
        if let Err(error) = save_level(&server).await {
            error!("Failed to save level: {error:#}");
        }

        tokio::select!(
            _ = sleep(SAVE_INTERVAL) => {}
            _ = shutdown.notified() => {
                if let Err(error) = save_level(&server).await {
                    error!("Failed to save level: {error:#}");
                }
                return;
            }
        );
    }
}
