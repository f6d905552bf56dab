// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Metronome implementations.
//!
//! `Clock` counts sub-beat ticks from wall-clock time at a BPM tempo.
//! `ManualClock` is advanced explicitly and is used for simulated attempts
//! and tests.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::Metronome;

/// Ticks per beat. One press per beat gives a tick delta of 8.
pub const TICKS_PER_BEAT: u32 = 8;

const MIN_BPM: u32 = 20;
const MAX_BPM: u32 = 300;

/// Metronome state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Time signature of the click track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar
    pub beats_per_bar: u8,
    /// Note value of one beat
    pub beat_unit: u8,
}

impl TimeSignature {
    /// Create a time signature
    pub fn new(beats_per_bar: u8, beat_unit: u8) -> Self {
        Self {
            beats_per_bar: beats_per_bar.max(1),
            beat_unit: beat_unit.max(1),
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

/// Wall-clock metronome
#[derive(Debug, Clone)]
pub struct Clock {
    /// Current tempo in BPM
    bpm: u32,
    /// Ticks per beat
    ticks_per_beat: u32,
    /// Current clock state
    state: ClockState,
    /// Time signature set at start
    time_signature: TimeSignature,
    /// Ticks counted before the current tempo segment
    base_ticks: u64,
    /// Start of the current tempo segment
    segment_start: Option<Instant>,
}

impl Clock {
    /// Create a stopped clock at the specified tempo
    pub fn new(bpm: u32) -> Self {
        Self::with_resolution(bpm, TICKS_PER_BEAT)
    }

    /// Create a stopped clock with a custom tick resolution
    pub fn with_resolution(bpm: u32, ticks_per_beat: u32) -> Self {
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            ticks_per_beat: ticks_per_beat.max(1),
            state: ClockState::Stopped,
            time_signature: TimeSignature::default(),
            base_ticks: 0,
            segment_start: None,
        }
    }

    /// Get the current clock state
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Get the time signature
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// Set the tempo. A running clock keeps its tick count.
    pub fn set_bpm(&mut self, bpm: u32) {
        if self.state == ClockState::Running {
            self.base_ticks = self.tick_count();
            self.segment_start = Some(Instant::now());
        }
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    /// Interval between ticks
    pub fn tick_interval(&self) -> Duration {
        // interval = 60 / (BPM * ticks per beat) seconds
        Duration::from_secs_f64(60.0 / (self.bpm as f64 * self.ticks_per_beat as f64))
    }

    /// Current beat number since start
    pub fn beat(&self) -> u64 {
        self.tick_count() / self.ticks_per_beat as u64
    }

    /// Current bar number since start
    pub fn bar(&self) -> u64 {
        self.beat() / self.time_signature.beats_per_bar as u64
    }

    /// Tick count at a given instant
    pub fn tick_count_at(&self, now: Instant) -> u64 {
        match (self.state, self.segment_start) {
            (ClockState::Running, Some(start)) => {
                let elapsed = now.saturating_duration_since(start);
                let ticks = elapsed.as_secs_f64() / self.tick_interval().as_secs_f64();
                self.base_ticks + ticks as u64
            }
            _ => self.base_ticks,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(60)
    }
}

impl Metronome for Clock {
    fn tick_count(&self) -> u64 {
        self.tick_count_at(Instant::now())
    }

    fn tempo(&self) -> u32 {
        self.bpm
    }

    fn set_tempo(&mut self, bpm: u32) {
        self.set_bpm(bpm);
    }

    fn start(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.state = ClockState::Running;
        self.base_ticks = 0;
        self.segment_start = Some(Instant::now());
    }

    fn stop(&mut self) {
        self.base_ticks = self.tick_count();
        self.state = ClockState::Stopped;
        self.segment_start = None;
    }

    fn is_ticking(&self) -> bool {
        self.state == ClockState::Running
    }
}

/// Metronome whose ticks are advanced by the caller
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: u64,
    bpm: u32,
    ticking: bool,
    time_signature: TimeSignature,
}

impl ManualClock {
    /// Create a stopped manual clock
    pub fn new(bpm: u32) -> Self {
        Self {
            ticks: 0,
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            ticking: false,
            time_signature: TimeSignature::default(),
        }
    }

    /// Advance the tick count. Ignored while stopped.
    pub fn advance(&mut self, ticks: u64) {
        if self.ticking {
            self.ticks += ticks;
        }
    }

    /// Get the time signature
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }
}

impl Metronome for ManualClock {
    fn tick_count(&self) -> u64 {
        self.ticks
    }

    fn tempo(&self) -> u32 {
        self.bpm
    }

    fn set_tempo(&mut self, bpm: u32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    fn start(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
        self.ticks = 0;
        self.ticking = true;
    }

    fn stop(&mut self) {
        self.ticking = false;
    }

    fn is_ticking(&self) -> bool {
        self.ticking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_creation() {
        let clock = Clock::new(120);
        assert_eq!(clock.tempo(), 120);
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.tick_count(), 0);
        assert!(!clock.is_ticking());
    }

    #[test]
    fn test_clock_bpm_clamping() {
        assert_eq!(Clock::new(10).tempo(), 20);
        assert_eq!(Clock::new(500).tempo(), 300);
    }

    #[test]
    fn test_tick_interval() {
        let clock = Clock::new(60);
        // 60 BPM, 8 ticks per beat: 125ms per tick
        assert!((clock.tick_interval().as_secs_f64() - 0.125).abs() < 0.0001);
    }

    #[test]
    fn test_tick_count_from_elapsed_time() {
        let mut clock = Clock::new(60);
        clock.start(TimeSignature::default());
        let start = clock.segment_start.unwrap();

        assert_eq!(clock.tick_count_at(start + Duration::from_millis(1000)), 8);
        assert_eq!(clock.tick_count_at(start + Duration::from_millis(2010)), 16);
        assert_eq!(clock.beat(), clock.tick_count() / 8);
    }

    #[test]
    fn test_clock_stop_freezes_count() {
        let mut clock = Clock::new(300);
        clock.start(TimeSignature::new(3, 4));
        thread::sleep(Duration::from_millis(60));
        clock.stop();
        let frozen = clock.tick_count();
        assert!(frozen >= 1);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(clock.tick_count(), frozen);
        assert_eq!(clock.time_signature().beats_per_bar, 3);
    }

    #[test]
    fn test_set_bpm_keeps_count_monotonic() {
        let mut clock = Clock::new(300);
        clock.start(TimeSignature::default());
        thread::sleep(Duration::from_millis(50));
        let before = clock.tick_count();
        clock.set_bpm(20);
        assert!(clock.tick_count() >= before);
    }

    #[test]
    fn test_manual_clock() {
        let mut clock = ManualClock::new(60);
        clock.advance(5);
        assert_eq!(clock.tick_count(), 0);

        clock.start(TimeSignature::default());
        clock.advance(8);
        assert_eq!(clock.tick_count(), 8);

        clock.stop();
        clock.advance(8);
        assert_eq!(clock.tick_count(), 8);

        clock.start(TimeSignature::default());
        assert_eq!(clock.tick_count(), 0);
    }

    #[test]
    fn test_set_tempo_through_trait() {
        fn retempo<M: Metronome>(m: &mut M, bpm: u32) -> u32 {
            m.set_tempo(bpm);
            m.tempo()
        }
        assert_eq!(retempo(&mut ManualClock::new(60), 96), 96);
        assert_eq!(retempo(&mut ManualClock::new(60), 5), MIN_BPM);
        assert_eq!(retempo(&mut Clock::new(60), 400), MAX_BPM);
    }
}
