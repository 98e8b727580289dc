// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::load_and_compile;
use crate::engine::MethodRegistry;
use crate::observability::messages::{
    config::{ConfigReloaded, ReloadRejected},
    StructuredLog,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

/// Poll a config file and hot-swap the registry whenever it changes.
///
/// A change is a different modification time than the one last seen. The new file is
/// loaded and compiled as a whole; if anything fails the active handlers stay in place
/// and the error is logged. Runs until `cancel` fires.
pub async fn watch_config(
    path: PathBuf,
    registry: Arc<MethodRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut last_seen = modified_at(&path).await;
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let current = modified_at(&path).await;
        if current.is_none() || current == last_seen {
            continue;
        }
        last_seen = current;
        reload_from(&path, &registry).await;
    }
}

/// Load `path` on the blocking pool and swap it into `registry`. Returns whether the
/// swap happened.
pub async fn reload_from(path: &Path, registry: &MethodRegistry) -> bool {
    let path_str = path.display().to_string();
    let owned = path.to_path_buf();
    let loaded = match tokio::task::spawn_blocking(move || load_and_compile(&owned)).await {
        Ok(loaded) => loaded,
        Err(e) => {
            ReloadRejected {
                path: &path_str,
                error: &e,
            }
            .log();
            return false;
        }
    };

    match loaded {
        Ok((_, handlers)) => {
            let method_count = handlers.len();
            registry.update_handlers(handlers).await;
            ConfigReloaded {
                path: &path_str,
                method_count,
            }
            .log();
            true
        }
        Err(error) => {
            ReloadRejected {
                path: &path_str,
                error: &error,
            }
            .log();
            false
        }
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}
