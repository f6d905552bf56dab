// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and metronome module.
//!
//! The grading session only reads the metronome: it samples the current
//! tick count when a key is pressed and starts or stops ticking around an
//! attempt. Anything that implements `Metronome` can drive it.

pub mod metronome;

pub use metronome::{Clock, ClockState, ManualClock, TimeSignature, TICKS_PER_BEAT};

/// Metronome contract consumed by the session
pub trait Metronome {
    /// Ticks since the metronome was started. Monotonic while ticking.
    fn tick_count(&self) -> u64;

    /// Tempo in beats per minute
    fn tempo(&self) -> u32;

    /// Change the tempo
    fn set_tempo(&mut self, bpm: u32);

    /// Start ticking from zero
    fn start(&mut self, time_signature: TimeSignature);

    /// Stop ticking
    fn stop(&mut self);

    /// Whether the metronome is running
    fn is_ticking(&self) -> bool;
}
