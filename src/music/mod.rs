// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory model for the trainer.
//!
//! This module provides keys, the scale shape catalog, fingering rules,
//! and the concrete two-octave `Scale` that the grading session checks
//! key presses against.

pub mod fingering;
pub mod key;
pub mod scale;
pub mod shape;

pub use fingering::{finger_choices, finger_name, next_finger, Finger, FingerPattern};
pub use key::{Accidental, Direction, Hand, Key, Mode, Note};
pub use scale::{Scale, SCALE_SPAN};
pub use shape::{ScaleShape, ShapeKind};

use thiserror::Error;

/// MIDI-style pitch (semitone number)
pub type Pitch = i32;

/// Get the pitch class (0-11) of any pitch, including negative ones
pub fn pitch_class(pitch: Pitch) -> u8 {
    pitch.rem_euclid(12) as u8
}

/// Errors raised while resolving names into music types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Note name not recognised
    #[error("unknown note name: {0}")]
    UnknownNote(String),
    /// Key mode not recognised
    #[error("unknown key mode: {0}")]
    UnknownMode(String),
    /// Scale shape not in the catalog
    #[error("unknown scale shape: {0}")]
    UnknownShape(String),
    /// Hand not recognised
    #[error("unknown hand: {0} (expected left or right)")]
    UnknownHand(String),
    /// Direction not recognised
    #[error("unknown direction: {0} (expected ascending or descending)")]
    UnknownDirection(String),
}
