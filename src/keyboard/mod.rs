// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Virtual piano keyboard.
//!
//! Holds one `PianoKey` per semitone in a fixed range together with the
//! transient press flags the UI highlights. Presses are debounced with a
//! single timer shared by every key.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::music::{pitch_class, Pitch};

/// Default gesture debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Key colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColor {
    White,
    Black,
}

impl KeyColor {
    /// Colour of the key for a pitch
    pub fn of(pitch: Pitch) -> Self {
        if [0, 2, 4, 5, 7, 9, 11].contains(&pitch_class(pitch)) {
            KeyColor::White
        } else {
            KeyColor::Black
        }
    }
}

/// A single key and its press flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PianoKey {
    pitch: Pitch,
    color: KeyColor,
    was_pressed: bool,
    was_last_pressed: bool,
}

impl PianoKey {
    /// Create an unpressed key
    pub fn new(pitch: Pitch) -> Self {
        Self {
            pitch,
            color: KeyColor::of(pitch),
            was_pressed: false,
            was_last_pressed: false,
        }
    }

    /// Get the pitch
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Get the colour
    pub fn color(&self) -> KeyColor {
        self.color
    }

    /// Pressed at least once this attempt
    pub fn was_pressed(&self) -> bool {
        self.was_pressed
    }

    /// The most recently pressed key
    pub fn was_last_pressed(&self) -> bool {
        self.was_last_pressed
    }

    fn clear(&mut self) {
        self.was_pressed = false;
        self.was_last_pressed = false;
    }
}

/// Result of offering a press to the keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    /// Press recorded. Lists every other key that must be redisplayed.
    Accepted { redisplay: Vec<Pitch> },
    /// Arrived inside the debounce window of the previous accepted press
    Debounced,
    /// No key at this pitch
    OutOfRange,
}

impl PressOutcome {
    /// Whether the press was recorded
    pub fn is_accepted(&self) -> bool {
        matches!(self, PressOutcome::Accepted { .. })
    }
}

/// Ordered set of keys from `start` to `start + count`
#[derive(Debug, Clone)]
pub struct Keyboard {
    keys: Vec<PianoKey>,
    debounce: Duration,
    last_accepted: Option<Instant>,
}

impl Keyboard {
    /// Create `count + 1` keys starting at `start`
    pub fn new(start: Pitch, count: usize) -> Self {
        Self::with_debounce(start, count, DEFAULT_DEBOUNCE)
    }

    /// Create a keyboard with a custom debounce window
    pub fn with_debounce(start: Pitch, count: usize, debounce: Duration) -> Self {
        let keys = (0..=count as Pitch).map(|i| PianoKey::new(start + i)).collect();
        Self {
            keys,
            debounce,
            last_accepted: None,
        }
    }

    /// All keys, low to high
    pub fn keys(&self) -> &[PianoKey] {
        &self.keys
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the keyboard has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Lowest pitch
    pub fn first_pitch(&self) -> Option<Pitch> {
        self.keys.first().map(|k| k.pitch)
    }

    /// Highest pitch
    pub fn last_pitch(&self) -> Option<Pitch> {
        self.keys.last().map(|k| k.pitch)
    }

    /// All pitches, low to high
    pub fn pitches(&self) -> Vec<Pitch> {
        self.keys.iter().map(|k| k.pitch).collect()
    }

    fn index_of(&self, pitch: Pitch) -> Option<usize> {
        let first = self.first_pitch()?;
        let index = usize::try_from(pitch - first).ok()?;
        (index < self.keys.len()).then_some(index)
    }

    /// Look up a key
    pub fn key(&self, pitch: Pitch) -> Option<&PianoKey> {
        self.index_of(pitch).map(|i| &self.keys[i])
    }

    /// Whether a press at `at` would be accepted by the debounce timer
    pub fn accepts(&self, at: Instant) -> bool {
        match self.last_accepted {
            Some(last) => at.saturating_duration_since(last) > self.debounce,
            None => true,
        }
    }

    /// Record a press. Moves the last-pressed marker and returns the other
    /// keys whose highlighting depends on it.
    pub fn record_press(&mut self, pitch: Pitch, at: Instant) -> PressOutcome {
        let Some(index) = self.index_of(pitch) else {
            debug!(pitch, "press outside keyboard range");
            return PressOutcome::OutOfRange;
        };
        if !self.accepts(at) {
            debug!(pitch, "press debounced");
            return PressOutcome::Debounced;
        }
        self.last_accepted = Some(at);
        PressOutcome::Accepted {
            redisplay: self.mark_last_pressed(index),
        }
    }

    /// Move the last-pressed marker without touching the debounce timer.
    /// Used to highlight notes during demonstration playback.
    pub fn mark_played(&mut self, pitch: Pitch) -> Vec<Pitch> {
        match self.index_of(pitch) {
            Some(index) => self.mark_last_pressed(index),
            None => Vec::new(),
        }
    }

    fn mark_last_pressed(&mut self, index: usize) -> Vec<Pitch> {
        let mut redisplay = Vec::with_capacity(self.keys.len().saturating_sub(1));
        for (i, key) in self.keys.iter_mut().enumerate() {
            if i == index {
                key.was_pressed = true;
                key.was_last_pressed = true;
            } else {
                key.was_last_pressed = false;
                redisplay.push(key.pitch);
            }
        }
        redisplay
    }

    /// Whether any key was pressed this attempt
    pub fn was_any_key_pressed(&self) -> bool {
        self.keys.iter().any(|k| k.was_pressed)
    }

    /// The most recently pressed key
    pub fn last_pressed(&self) -> Option<Pitch> {
        self.keys.iter().find(|k| k.was_last_pressed).map(|k| k.pitch)
    }

    /// Clear every press flag and the debounce timer
    pub fn reset_all(&mut self) {
        for key in &mut self.keys {
            key.clear();
        }
        self.last_accepted = None;
    }
}
