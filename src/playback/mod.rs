// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Demonstration playback.
//!
//! A `PlaybackPlan` orders the notes of a scale for one demonstration. The
//! `PlaybackDriver` sounds them on a tokio task at a fixed interval, reports
//! progress through callbacks and an event channel, and stops cooperatively
//! when its `CancelToken` is set. Only one playback runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::info;

use crate::audio::NotePlayer;
use crate::music::{Direction, Pitch, Scale, SCALE_SPAN};

/// Playback errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("a scale is already playing")]
    AlreadyPlaying,
    #[error("playback task failed: {0}")]
    TaskFailed(String),
}

/// Ordered notes of one demonstration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackPlan {
    notes: Vec<Pitch>,
}

impl PlaybackPlan {
    /// Walk the keyboard in playing order and keep the scale notes inside
    /// the two-octave window, stopping after `octaves` octaves plus the
    /// closing tonic.
    pub fn for_scale(
        scale: &Scale,
        keyboard_pitches: &[Pitch],
        direction: Direction,
        octaves: u32,
    ) -> Self {
        let limit = octaves as usize * scale.shape().degree_count() + 1;
        let window_end = scale.start_pitch() + SCALE_SPAN;
        let in_plan = |p: Pitch| {
            p >= scale.start_pitch() && p <= window_end && scale.is_in_scale_for(p, direction)
        };

        let notes: Vec<Pitch> = match direction {
            Direction::Ascending => keyboard_pitches
                .iter()
                .filter(|&&p| in_plan(p))
                .take(limit)
                .copied()
                .collect(),
            Direction::Descending => keyboard_pitches
                .iter()
                .rev()
                .filter(|&&p| in_plan(p))
                .take(limit)
                .copied()
                .collect(),
        };
        Self { notes }
    }

    /// Create a plan from explicit notes
    pub fn from_notes(notes: Vec<Pitch>) -> Self {
        Self { notes }
    }

    /// Notes in playing order
    pub fn notes(&self) -> &[Pitch] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Playback settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Beats per minute, one note per beat
    pub tempo: u32,
    /// Play two notes per beat
    pub halve_interval: bool,
    pub octaves: u32,
    pub direction: Direction,
}

impl PlaybackOptions {
    /// Time between notes
    pub fn interval(&self) -> Duration {
        let secs = 60.0 / self.tempo.max(1) as f64;
        if self.halve_interval {
            Duration::from_secs_f64(secs / 2.0)
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            tempo: 60,
            halve_interval: false,
            octaves: 2,
            direction: Direction::Ascending,
        }
    }
}

/// Stop request shared between the caller and the playback task
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the playback to stop before its next note
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress reported on the handle's event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    NotePlayed(Pitch),
    Completed { played: usize, cancelled: bool },
}

/// Outcome of a playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub played: usize,
    pub cancelled: bool,
}

/// Handle to a running playback
#[derive(Debug)]
pub struct PlaybackHandle {
    token: CancelToken,
    events: UnboundedReceiver<PlaybackEvent>,
    task: JoinHandle<PlaybackSummary>,
}

impl PlaybackHandle {
    /// Request cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The playback's cancel token
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Progress events
    pub fn events(&mut self) -> &mut UnboundedReceiver<PlaybackEvent> {
        &mut self.events
    }

    /// Wait for the playback to finish
    pub async fn join(self) -> Result<PlaybackSummary, PlaybackError> {
        self.task
            .await
            .map_err(|e| PlaybackError::TaskFailed(e.to_string()))
    }
}

/// Clears the active flag when the task ends, however it ends
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sounds playback plans through a `NotePlayer`
pub struct PlaybackDriver {
    player: Arc<dyn NotePlayer>,
    active: Arc<AtomicBool>,
}

impl PlaybackDriver {
    /// Create a driver for a player
    pub fn new(player: Arc<dyn NotePlayer>) -> Self {
        Self {
            player,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a playback is running
    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start playing a plan on the current tokio runtime.
    ///
    /// `on_note` runs right after each note is sounded and before the wait
    /// for the next one. `on_complete` runs exactly once, after the last
    /// note or after cancellation. No note is played once `token` is
    /// cancelled.
    pub fn play_scale<N, C>(
        &self,
        plan: PlaybackPlan,
        options: &PlaybackOptions,
        token: CancelToken,
        mut on_note: N,
        on_complete: C,
    ) -> Result<PlaybackHandle, PlaybackError>
    where
        N: FnMut(Pitch) + Send + 'static,
        C: FnOnce(PlaybackSummary) + Send + 'static,
    {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PlaybackError::AlreadyPlaying);
        }

        let guard = ActiveGuard(self.active.clone());
        let player = self.player.clone();
        let interval = options.interval();
        let task_token = token.clone();
        let (tx, events) = mpsc::unbounded_channel();
        info!(notes = plan.len(), ?interval, "playback started");

        let task = tokio::spawn(async move {
            let _guard = guard;
            let total = plan.len();
            let mut played = 0;

            for (i, &pitch) in plan.notes().iter().enumerate() {
                if task_token.is_cancelled() {
                    break;
                }
                player.play_note(pitch);
                on_note(pitch);
                played += 1;
                let _ = tx.send(PlaybackEvent::NotePlayed(pitch));
                if task_token.is_cancelled() || i + 1 == total {
                    break;
                }
                tokio::time::sleep(interval).await;
            }

            let summary = PlaybackSummary {
                played,
                cancelled: played < total,
            };
            info!(played, cancelled = summary.cancelled, "playback finished");
            on_complete(summary);
            let _ = tx.send(PlaybackEvent::Completed {
                played,
                cancelled: summary.cancelled,
            });
            summary
        });

        Ok(PlaybackHandle {
            token,
            events,
            task,
        })
    }
}
