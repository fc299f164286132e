// ── File change notification ──
//
// Watches the parent directory rather than the file itself: editors and
// `mv`-style saves replace the inode, which would silently end a watch
// on the file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ConfigError;

/// A live watch on one file. Dropping it stops watching.
pub struct FileWatch {
    path: PathBuf,
    changes: mpsc::Receiver<()>,
    _watcher: RecommendedWatcher,
}

impl FileWatch {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next change. Bursts of events (write + rename + chmod)
    /// collapse into one notification. Returns `None` if the watcher died.
    pub async fn changed(&mut self) -> Option<()> {
        self.changes.recv().await
    }
}

/// Start watching `path` for creation, modification and replacement.
///
/// The file itself does not have to exist yet, its directory does.
pub fn watch_file(path: &Path) -> Result<FileWatch, ConfigError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name: OsString = path
        .file_name()
        .ok_or_else(|| ConfigError::Validation {
            field: "path".into(),
            reason: format!("{} does not name a file", path.display()),
        })?
        .to_os_string();

    // capacity 1: a pending notification already covers later events
    let (tx, changes) = mpsc::channel(1);
    let watched = file_name.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_relevant(&event, &watched) => {
            debug!(kind = ?event.kind, "watched file changed");
            let _ = tx.try_send(());
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "file watch error"),
    })
    .map_err(|source| watch_error(path, source))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|source| watch_error(path, source))?;
    debug!(path = %path.display(), "watching file");

    Ok(FileWatch {
        path: path.to_path_buf(),
        changes,
        _watcher: watcher,
    })
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    );
    kind_matches
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

fn watch_error(path: &Path, source: notify::Error) -> ConfigError {
    ConfigError::Watch {
        path: path.display().to_string(),
        source,
    }
}
