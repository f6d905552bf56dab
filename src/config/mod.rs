// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for the trainer.
//!
//! This module provides the YAML file that selects the scale to practise
//! and holds the session, metronome and playback settings.

pub mod watcher;

pub use watcher::{validate_config, ConfigEvent, ConfigWatcher};

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use tracing::info;

use crate::music::{
    Accidental, Direction, Hand, Key, Note, ParseError, Pitch, ScaleShape, ShapeKind,
};
use crate::playback::PlaybackOptions;
use crate::session::{Session, SessionOptions, TimingWindow};
use crate::timing::{Clock, Metronome, TimeSignature};

/// Root configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrainerConfig {
    /// Scale selection and practice aids
    #[serde(default)]
    pub trainer: TrainerSection,
    /// Metronome and timing window
    #[serde(default)]
    pub timing: TimingSection,
    /// Demonstration playback
    #[serde(default)]
    pub playback: PlaybackSection,
}

impl TrainerConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Resolve the configured names into a scale selection
    pub fn selection(&self) -> Result<Selection, ParseError> {
        let key = Key::parse(&self.trainer.key, &self.trainer.mode)?;
        let shape = ScaleShape::parse(&self.trainer.shape)?;
        let hand = Hand::parse(&self.trainer.hand)?;
        Ok(Selection { key, shape, hand })
    }

    /// Session settings
    pub fn session_options(&self) -> Result<SessionOptions, ParseError> {
        Ok(SessionOptions {
            direction: Direction::parse(&self.trainer.direction)?,
            show_next_note: self.trainer.show_next_note,
            check_fingers: self.trainer.check_fingers,
            timing: TimingWindow {
                early_below: self.timing.early_below,
                late_above: self.timing.late_above,
            },
            debounce: Duration::from_millis(self.trainer.debounce_ms),
            time_signature: TimeSignature::new(self.timing.beats_per_bar, self.timing.beat_unit),
        })
    }

    /// Playback settings
    pub fn playback_options(&self) -> Result<PlaybackOptions, ParseError> {
        Ok(PlaybackOptions {
            tempo: self.timing.tempo,
            halve_interval: self.playback.halve_interval,
            octaves: self.playback.octaves,
            direction: Direction::parse(&self.trainer.direction)?,
        })
    }

    /// Wall-clock metronome at the configured tempo and resolution
    pub fn clock(&self) -> Clock {
        Clock::with_resolution(self.timing.tempo, self.timing.ticks_per_beat)
    }

    /// Bring a running session in line with this configuration.
    ///
    /// Names are resolved before anything changes, so a bad file leaves the
    /// session as it was. Settings that already match are left alone and do
    /// not interrupt an attempt. Returns the keys to redisplay.
    pub fn apply_to<M: Metronome>(
        &self,
        session: &mut Session<M>,
    ) -> Result<Vec<Pitch>, ParseError> {
        let selection = self.selection()?;
        let options = self.session_options()?;

        let mut changed = session.set_hand(selection.hand);
        changed.extend(session.select_scale(selection.key, selection.shape));
        changed.extend(session.apply_options(options));
        if session.metronome().tempo() != self.timing.tempo {
            session.metronome_mut().set_tempo(self.timing.tempo);
        }

        changed.sort_unstable();
        changed.dedup();
        if !changed.is_empty() {
            info!(scale = %session.scale(), "configuration applied");
        }
        Ok(changed)
    }
}

/// Scale selection and practice aids
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerSection {
    /// Tonic name (e.g., "C", "F#", "Ab")
    #[serde(default = "default_key")]
    pub key: String,
    /// Key mode ("major" or "minor")
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Scale shape (e.g., "major", "harmonic_minor", "chromatic")
    #[serde(default = "default_shape")]
    pub shape: String,
    /// "right" or "left"
    #[serde(default = "default_hand")]
    pub hand: String,
    /// "ascending" or "descending"
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default)]
    pub show_next_note: bool,
    #[serde(default)]
    pub check_fingers: bool,
    /// Minimum time between accepted presses
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_key() -> String {
    "C".to_string()
}
fn default_mode() -> String {
    "major".to_string()
}
fn default_shape() -> String {
    "major".to_string()
}
fn default_hand() -> String {
    "right".to_string()
}
fn default_direction() -> String {
    "ascending".to_string()
}
fn default_debounce_ms() -> u64 {
    200
}

impl Default for TrainerSection {
    fn default() -> Self {
        Self {
            key: default_key(),
            mode: default_mode(),
            shape: default_shape(),
            hand: default_hand(),
            direction: default_direction(),
            show_next_note: false,
            check_fingers: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Metronome and timing window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingSection {
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    #[serde(default = "default_ticks_per_beat")]
    pub ticks_per_beat: u32,
    /// Tick deltas below this are too early
    #[serde(default = "default_early_below")]
    pub early_below: u64,
    /// Tick deltas above this are too late
    #[serde(default = "default_late_above")]
    pub late_above: u64,
    #[serde(default = "default_time_sig")]
    pub beats_per_bar: u8,
    #[serde(default = "default_time_sig")]
    pub beat_unit: u8,
}

fn default_tempo() -> u32 {
    60
}
fn default_ticks_per_beat() -> u32 {
    crate::timing::TICKS_PER_BEAT
}
fn default_early_below() -> u64 {
    6
}
fn default_late_above() -> u64 {
    9
}
fn default_time_sig() -> u8 {
    4
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
            ticks_per_beat: default_ticks_per_beat(),
            early_below: default_early_below(),
            late_above: default_late_above(),
            beats_per_bar: default_time_sig(),
            beat_unit: default_time_sig(),
        }
    }
}

/// Demonstration playback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackSection {
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    /// Two notes per beat
    #[serde(default)]
    pub halve_interval: bool,
}

fn default_octaves() -> u32 {
    2
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            octaves: default_octaves(),
            halve_interval: false,
        }
    }
}

/// A resolved key, shape and hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub key: Key,
    pub shape: ScaleShape,
    pub hand: Hand,
}

impl Selection {
    /// Pick a random scale for a drill
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let tonic = Note::ALL.choose(rng).copied().unwrap_or(Note::C);
        let kind = ShapeKind::ALL.choose(rng).copied().unwrap_or(ShapeKind::Major);
        let mode = kind.key_mode();
        let accidental = if rng.gen_bool(0.5) {
            Accidental::Sharp
        } else {
            Accidental::Flat
        };
        let hand = if rng.gen_bool(0.5) { Hand::Right } else { Hand::Left };
        Self {
            key: Key::new(tonic, mode, accidental),
            shape: ScaleShape::of(kind),
            hand,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            key: Key::default(),
            shape: ScaleShape::default(),
            hand: Hand::Right,
        }
    }
}
