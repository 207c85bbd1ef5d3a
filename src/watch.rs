//! File watcher: runs `build` on startup, then rebuilds on document changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config;
use crate::error;
use crate::reference::absolute;

/// Debounce delay between filesystem events and rebuild.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals on the given channel whenever a
/// relevant path is created, modified, or removed.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    output: PathBuf,
    suffix: String,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return is_relevant(p, &output, &suffix))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Whether a changed path should trigger a rebuild: a document or the config
/// file, outside the output directory.
fn is_relevant(path: &Path, output: &Path, suffix: &str) -> bool {
    if path.starts_with(output) {
        return false;
    }
    let name = path.file_name().map(|n| return n.to_string_lossy()).unwrap_or_default();
    return name.ends_with(suffix) || name == config::CONFIG_FILE;
}

/// Entry point for the watch command.
///
/// Runs an initial build, then watches the project tree and rebuilds after
/// each burst of changes.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup.
pub fn run() -> Result<ExitCode, error::Error> {
    let root = absolute(Path::new("."));
    let config = config::Config::load(&root)?;

    tracing::info!("initial build");
    let mut last_code = run_build();

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, root.join(&config.output), config.suffix.clone())?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| return error::Error::Watch { reason: e.to_string() })?;

    tracing::info!(root = %root.display(), "watching for changes, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        tracing::info!("change detected, rebuilding");
        last_code = run_build();
    }

    return Ok(last_code);
}

/// Run one build and report fatal errors. Returns the build's exit code.
fn run_build() -> ExitCode {
    return match commands::build() {
        Ok(code) => code,
        Err(e) => {
            crate::diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}
