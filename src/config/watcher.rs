// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hot reload of the practice file.
//!
//! `ConfigWatcher` follows one YAML file. A burst of writes is collapsed
//! into a single reload once the file has been quiet for the settle time.
//! Each reload is validated before it is handed out, and
//! `ConfigEvent::apply_to` carries it into a running session.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::TrainerConfig;
use crate::music::Pitch;
use crate::session::Session;
use crate::timing::Metronome;

/// Quiet period after the last write before the file is read
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(300);

/// Outcome of a change to the practice file
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// The file changed and holds a usable configuration
    Reloaded(Box<TrainerConfig>),
    /// The file changed but could not be used
    Error(String),
}

impl ConfigEvent {
    /// Apply a reload to a session. Returns the keys to redisplay.
    pub fn apply_to<M: Metronome>(&self, session: &mut Session<M>) -> Result<Vec<Pitch>> {
        match self {
            ConfigEvent::Reloaded(config) => Ok(config.apply_to(session)?),
            ConfigEvent::Error(message) => Err(anyhow!("{}", message)),
        }
    }
}

/// Watches the practice file for edits
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<ConfigEvent>,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Watch a config file with the default settle time
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_settle_time(path, DEFAULT_SETTLE)
    }

    /// Watch a config file, reloading once it has been quiet for `settle`.
    ///
    /// The parent directory is watched rather than the file, so editors
    /// that save by replacing the file are still followed.
    pub fn with_settle_time<P: AsRef<Path>>(path: P, settle: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| anyhow!("{:?} does not name a config file", path))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (touch_tx, touch_rx) = mpsc::channel::<()>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches(&event, &file_name) => {
                let _ = touch_tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "config watch error"),
        })
        .context("Failed to create file watcher")?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {:?}", dir))?;

        let (event_tx, event_rx) = mpsc::channel();
        let reload_path = path.clone();
        thread::spawn(move || settle_and_reload(&touch_rx, &event_tx, &reload_path, settle));
        debug!(?path, "watching config");

        Ok(Self {
            _watcher: watcher,
            events: event_rx,
            path,
        })
    }

    /// The watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next event, if one is waiting
    pub fn try_recv(&self) -> Option<ConfigEvent> {
        self.events.try_recv().ok()
    }

    /// Block until the next event
    pub fn recv(&self) -> Option<ConfigEvent> {
        self.events.recv().ok()
    }

    /// Block for at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ConfigEvent> {
        self.events.recv_timeout(timeout).ok()
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Wait for the first write of a burst, let the burst finish, then read
/// the file once. Ends when either side of the watcher is dropped.
fn settle_and_reload(
    touches: &Receiver<()>,
    events: &Sender<ConfigEvent>,
    path: &Path,
    settle: Duration,
) {
    while touches.recv().is_ok() {
        loop {
            match touches.recv_timeout(settle) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        if events.send(reload(path)).is_err() {
            return;
        }
    }
}

fn reload(path: &Path) -> ConfigEvent {
    match validate_config(path) {
        Ok(config) => {
            debug!(?path, "config reloaded");
            ConfigEvent::Reloaded(Box::new(config))
        }
        Err(e) => {
            warn!(?path, error = %e, "config reload failed");
            ConfigEvent::Error(format!("{:#}", e))
        }
    }
}

/// Load a config and check that its names resolve
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<TrainerConfig> {
    let config = TrainerConfig::load(path)?;
    config.selection()?;
    config.session_options()?;
    config.playback_options()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;
    use std::fs;
    use tempfile::tempdir;

    fn session_for(config: &TrainerConfig) -> Session<ManualClock> {
        let selection = config.selection().unwrap();
        Session::new(
            selection.key,
            selection.shape,
            selection.hand,
            config.session_options().unwrap(),
            ManualClock::new(config.timing.tempo),
        )
    }

    #[test]
    fn test_validate_config() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("practice.yaml");
        fs::write(&file_path, "trainer:\n  key: \"D\"\ntiming:\n  tempo: 80\n").unwrap();

        let config = validate_config(&file_path).unwrap();
        assert_eq!(config.trainer.key, "D");
        assert_eq!(config.timing.tempo, 80);
    }

    #[test]
    fn test_validate_rejects_unusable_files() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.yaml");

        fs::write(&file_path, "this is not valid yaml: [").unwrap();
        assert!(validate_config(&file_path).is_err());

        // Parses as YAML but names no known shape
        fs::write(&file_path, "trainer:\n  shape: lydian\n").unwrap();
        assert!(validate_config(&file_path).is_err());
    }

    #[test]
    fn test_reload_event_reselects_scale() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("practice.yaml");
        let mut session = session_for(&TrainerConfig::default());

        fs::write(&file_path, "trainer:\n  key: \"E\"\n  hand: left\n").unwrap();
        let event = reload(&file_path);
        let changed = event.apply_to(&mut session).unwrap();
        assert!(changed.contains(&40));
        assert_eq!(session.scale().name(), "E Major");
        assert_eq!(session.scale().start_pitch(), 40);
    }

    #[test]
    fn test_error_event_leaves_session() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("practice.yaml");
        let mut session = session_for(&TrainerConfig::default());

        fs::write(&file_path, "trainer:\n  hand: both\n").unwrap();
        let event = reload(&file_path);
        assert!(matches!(event, ConfigEvent::Error(_)));
        assert!(event.apply_to(&mut session).is_err());
        assert_eq!(session.scale().name(), "C Major");
    }

    #[test]
    fn test_watcher_requires_file_name() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("watch_test.yaml");
        fs::write(&file_path, "trainer:\n  key: \"E\"\n").unwrap();

        let watcher = ConfigWatcher::new(&file_path).unwrap();
        assert_eq!(watcher.path(), file_path.as_path());
        assert!(watcher.try_recv().is_none());

        assert!(ConfigWatcher::new("/").is_err());
    }

    #[test]
    fn test_watched_edit_reaches_session() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("practice.yaml");
        fs::write(&file_path, "trainer:\n  key: \"C\"\n").unwrap();
        let mut session = session_for(&TrainerConfig::default());

        let watcher = ConfigWatcher::with_settle_time(&file_path, Duration::from_millis(100)).unwrap();
        thread::sleep(Duration::from_millis(50));
        fs::write(&file_path, "trainer:\n  key: \"G\"\n  shape: major\n").unwrap();

        // File events are not guaranteed to arrive in time on every platform
        if let Some(event) = watcher.recv_timeout(Duration::from_secs(2)) {
            event.apply_to(&mut session).unwrap();
            assert_eq!(session.scale().name(), "G Major");
        }
    }
}
