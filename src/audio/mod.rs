// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note output.
//!
//! The trainer never synthesises audio itself. It asks a `NotePlayer` to
//! sound a pitch and moves on; sample playback lives with the host.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::music::Pitch;

/// Fire-and-forget note output
pub trait NotePlayer: Send + Sync {
    /// Sound a note
    fn play_note(&self, pitch: Pitch);
}

/// Player that logs every note
#[derive(Debug, Clone, Default)]
pub struct TracingPlayer;

impl NotePlayer for TracingPlayer {
    fn play_note(&self, pitch: Pitch) {
        info!(pitch, "play note");
    }
}

/// Player that remembers every note it was asked to play
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    played: Arc<Mutex<Vec<Pitch>>>,
}

impl RecordingPlayer {
    /// Create an empty recording player
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes played so far
    pub fn played(&self) -> Vec<Pitch> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl NotePlayer for RecordingPlayer {
    fn play_note(&self, pitch: Pitch) {
        if let Ok(mut played) = self.played.lock() {
            played.push(pitch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_player_shares_history() {
        let player = RecordingPlayer::new();
        let clone = player.clone();
        clone.play_note(60);
        clone.play_note(62);
        assert_eq!(player.played(), vec![60, 62]);
    }

    #[test]
    fn test_players_are_object_safe() {
        let players: Vec<Box<dyn NotePlayer>> =
            vec![Box::new(TracingPlayer), Box::new(RecordingPlayer::new())];
        for p in &players {
            p.play_note(60);
        }
    }
}
