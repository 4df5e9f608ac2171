use std::path::{Path, PathBuf};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use recall_logging::recall_warn;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to watch {path:?}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Keeps the file watcher alive; dropping it stops notifications.
pub struct SnapshotWatcher {
    _watcher: RecommendedWatcher,
}

/// Calls `on_change` whenever the snapshot file is created or modified.
///
/// The parent directory is watched so that snapshots replaced by rename are
/// still seen.
pub fn watch_snapshot<F>(path: &Path, on_change: F) -> Result<SnapshotWatcher, WatchError>
where
    F: Fn() + Send + 'static,
{
    let file_name = path.file_name().map(ToOwned::to_owned);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let relevant = event.kind.is_modify() || event.kind.is_create();
            let ours = event
                .paths
                .iter()
                .any(|changed| changed.file_name() == file_name.as_deref());
            if relevant && ours {
                on_change();
            }
        }
        Err(err) => recall_warn!("Snapshot watcher error: {}", err),
    })
    .map_err(|source| WatchError::Setup {
        path: path.to_path_buf(),
        source,
    })?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|source| WatchError::Setup {
            path: dir.clone(),
            source,
        })?;

    Ok(SnapshotWatcher { _watcher: watcher })
}
