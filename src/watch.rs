//! Watch mode for automatic rebuilds on file changes
//!
//! Provides file system watching with debouncing for the `wowlua build --watch` command.
//! Every rebuild is a full build. Changes that arrive while a build runs are
//! drained once it finishes and coalesced into a single follow-up build.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::build::{BuildError, BuildResult};
use crate::config::schema::WatchConfig;

/// Error during watch mode
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    ChannelError(String),
    /// Source directory not found
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// Options for watch mode
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Source directory to watch
    pub src_dir: PathBuf,
    /// Library directory to watch, if it exists
    pub lib_dir: PathBuf,
    /// Directory holding wowlua.toml, watched non-recursively
    pub project_root: Option<PathBuf>,
    /// Watch configuration (debounce, clear screen)
    pub config: WatchConfig,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            lib_dir: PathBuf::from("libs"),
            project_root: None,
            config: WatchConfig::default(),
        }
    }
}

/// Clear the terminal screen
fn clear_screen() {
    // ANSI escape code to clear screen and move cursor to top-left
    print!("\x1B[2J\x1B[1;1H");
}

/// Format duration for display
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Watch for file changes and rebuild automatically.
///
/// This function blocks and runs until interrupted (Ctrl+C). `build` is
/// called once on startup and once per batch of relevant changes; a failed
/// build is reported and watching continues.
///
/// # Returns
/// * `Ok(())` if watch mode exits cleanly (shouldn't happen normally)
/// * `Err(WatchError)` if watch setup fails
///
/// # Example
/// ```ignore
/// watch_and_rebuild(WatchOptions::default(), || run_build(&args))?;
/// ```
pub fn watch_and_rebuild<F>(options: WatchOptions, mut build: F) -> Result<(), WatchError>
where
    F: FnMut() -> Result<BuildResult, BuildError>,
{
    // Verify source directory exists
    if !options.src_dir.exists() {
        return Err(WatchError::SourceNotFound(options.src_dir.clone()));
    }

    // Create channel for debounced events
    let (tx, rx) = channel();

    // Create debounced watcher
    let debounce_duration = Duration::from_millis(options.config.debounce_ms as u64);
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;

    let watcher = debouncer.watcher();
    watcher.watch(&options.src_dir, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;
    if options.lib_dir.exists() {
        watcher.watch(&options.lib_dir, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;
    }
    if let Some(root) = &options.project_root {
        watcher.watch(root, RecursiveMode::NonRecursive).map_err(WatchError::WatchPath)?;
    }

    // Initial build
    run_once(&options, &mut build);

    // Watch loop
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let mut changed = relevant_paths(&events);
                drain_pending(&rx, &mut changed);

                if !changed.is_empty() {
                    for path in &changed {
                        if let Some(name) = path.file_name() {
                            println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                        }
                    }
                    run_once(&options, &mut build);
                }
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                tracing::warn!("watch error: {:?}", error);
                eprintln!("[{}] Continuing to watch...", timestamp());
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}

/// Run one build and print its outcome.
fn run_once<F>(options: &WatchOptions, build: &mut F)
where
    F: FnMut() -> Result<BuildResult, BuildError>,
{
    if options.config.clear_screen {
        clear_screen();
    }
    println!("[{}] Building...", timestamp());

    let start = Instant::now();
    match build() {
        Ok(result) => {
            println!("[{}] Build complete ({})", timestamp(), format_duration(start.elapsed()));
            for warning in result.all_warnings() {
                eprintln!("[{}] Warning: {}", timestamp(), warning);
            }
        }
        Err(e) => {
            eprintln!("[{}] Build failed ({}): {}", timestamp(), format_duration(start.elapsed()), e);
        }
    }

    println!("[{}] Watching {} for changes...", timestamp(), options.src_dir.display());
}

/// Pull every batch already queued, so changes made during a build lead to one rebuild.
fn drain_pending(rx: &Receiver<DebounceEventResult>, changed: &mut Vec<PathBuf>) {
    while let Ok(pending) = rx.try_recv() {
        if let Ok(events) = pending {
            for path in relevant_paths(&events) {
                if !changed.contains(&path) {
                    changed.push(path);
                }
            }
        }
    }
}

fn relevant_paths(events: &[DebouncedEvent]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for event in events {
        if matches!(event.kind, DebouncedEventKind::Any) && is_relevant_file(&event.path) && !paths.contains(&event.path) {
            paths.push(event.path.clone());
        }
    }
    paths
}

/// Check if a file is relevant for rebuilding
fn is_relevant_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        matches!(ext.as_str(), "lua" | "toml" | "json")
    } else {
        false
    }
}
