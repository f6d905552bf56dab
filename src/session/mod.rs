// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Grading session.
//!
//! The `Session` owns the selected scale, the keyboard, one `KeyState` per
//! keyboard pitch and the mode flags. Every user action comes in as a method
//! call on a single owner; observers learn about changes from the returned
//! pitch lists and from `SessionEvent`s.

pub mod events;
pub mod exam;
pub mod state;

pub use events::{EventBus, SessionEvent};
pub use exam::{ExamSummary, LetterGrade};
pub use state::{explain, DisplayState, KeyState};

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::keyboard::{Keyboard, PressOutcome, DEFAULT_DEBOUNCE};
use crate::music::fingering::LITTLE_FINGER;
use crate::music::{Direction, Finger, Hand, Key, Pitch, Scale, ScaleShape, SCALE_SPAN};
use crate::timing::{Metronome, TimeSignature};

/// Keys shown either side of the two-octave window
const KEYBOARD_MARGIN: Pitch = 3;

/// How far ahead the next-note hint looks
const NEXT_NOTE_SCAN: Pitch = 4;

/// Errors from session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Finger numbers run from 0 (thumb) to 4
    #[error("invalid finger {0} (expected 0-4)")]
    InvalidFinger(Finger),
}

/// Practice or exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Practice,
    /// No live feedback, summary at the end
    Exam,
}

/// Progress of a timed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionState {
    #[default]
    NotStarted,
    InQuestion,
    /// Attempt over, results showing
    InAnswer,
}

/// Practice helpers running outside an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PracticeState {
    #[default]
    Idle,
    PlayingScale,
    TimingScale,
}

/// Why an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEnd {
    /// Player reached the last note
    Completed,
    /// Countdown ran out
    TimedOut,
    /// Player stopped it; nothing is graded
    Cancelled,
}

/// Tick-delta window for on-time presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingWindow {
    /// Deltas below this are too early
    pub early_below: u64,
    /// Deltas above this are too late
    pub late_above: u64,
}

impl TimingWindow {
    /// Grade a press by its tick delta. Presses without a delta are on time.
    pub fn classify(&self, delta: Option<u64>) -> DisplayState {
        match delta {
            Some(d) if d > self.late_above => DisplayState::TooLate,
            Some(d) if d < self.early_below => DisplayState::TooEarly,
            _ => DisplayState::Correct,
        }
    }
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self {
            early_below: 6,
            late_above: 9,
        }
    }
}

/// Session settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub direction: Direction,
    /// Highlight the next scale note after each press
    pub show_next_note: bool,
    /// Prompt for and grade fingering
    pub check_fingers: bool,
    pub timing: TimingWindow,
    pub debounce: Duration,
    pub time_signature: TimeSignature,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Ascending,
            show_next_note: false,
            check_fingers: false,
            timing: TimingWindow::default(),
            debounce: DEFAULT_DEBOUNCE,
            time_signature: TimeSignature::default(),
        }
    }
}

/// Why a tap was not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OutOfRange,
    Debounced,
}

/// Result of `Session::record_tap`
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    Ignored(IgnoreReason),
    Accepted {
        /// Position of the press within the attempt
        sequence: u32,
        /// Ticks since the previous press of a timed attempt
        tick_delta: Option<u64>,
        /// Keys to redisplay
        redisplay: Vec<Pitch>,
        /// The press ended the attempt
        attempt_ended: bool,
        /// Exam result when the press ended an exam
        exam: Option<ExamSummary>,
    },
}

impl TapOutcome {
    /// Whether the tap was recorded
    pub fn is_accepted(&self) -> bool {
        matches!(self, TapOutcome::Accepted { .. })
    }
}

/// The trainer's single process-wide state owner
pub struct Session<M: Metronome> {
    scale: Scale,
    keyboard: Keyboard,
    key_states: BTreeMap<Pitch, KeyState>,
    options: SessionOptions,
    app_mode: AppMode,
    question_state: QuestionState,
    practice_state: PracticeState,
    /// Presses accepted this attempt
    sequence: u32,
    last_press_tick: Option<u64>,
    exam_summary: Option<ExamSummary>,
    metronome: M,
    events: EventBus,
}

impl<M: Metronome> Session<M> {
    /// Create a session for a scale selection
    pub fn new(
        key: Key,
        shape: ScaleShape,
        hand: Hand,
        options: SessionOptions,
        metronome: M,
    ) -> Self {
        let scale = Scale::new(key, shape, hand);
        let keyboard = build_keyboard(&scale, options.debounce);
        let key_states = build_key_states(&scale, &keyboard);
        Self {
            scale,
            keyboard,
            key_states,
            options,
            app_mode: AppMode::Practice,
            question_state: QuestionState::NotStarted,
            practice_state: PracticeState::Idle,
            sequence: 0,
            last_press_tick: None,
            exam_summary: None,
            metronome,
            events: EventBus::new(),
        }
    }

    // ---- queries ----

    /// The selected scale
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// The keyboard
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Grading state for a pitch
    pub fn key_state(&self, pitch: Pitch) -> Option<&KeyState> {
        self.key_states.get(&pitch)
    }

    /// Current settings
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn app_mode(&self) -> AppMode {
        self.app_mode
    }

    pub fn question_state(&self) -> QuestionState {
        self.question_state
    }

    pub fn practice_state(&self) -> PracticeState {
        self.practice_state
    }

    /// Result of the most recent exam
    pub fn exam_summary(&self) -> Option<ExamSummary> {
        self.exam_summary
    }

    pub fn metronome(&self) -> &M {
        &self.metronome
    }

    pub fn metronome_mut(&mut self) -> &mut M {
        &mut self.metronome
    }

    /// Subscribe to change events
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether any key was pressed this attempt
    pub fn was_any_key_pressed(&self) -> bool {
        self.keyboard.was_any_key_pressed()
    }

    // ---- selection ----

    /// Replace the key and shape. Rebuilds scale, keyboard and key states
    /// and resets the attempt. Re-selecting the current scale does nothing.
    pub fn select_scale(&mut self, key: Key, shape: ScaleShape) -> Vec<Pitch> {
        if key == self.scale.key() && shape == self.scale.shape() {
            return Vec::new();
        }
        let hand = self.scale.hand();
        self.rebuild(Scale::new(key, shape, hand))
    }

    /// Switch hands. Moves the keyboard and resets the attempt.
    pub fn set_hand(&mut self, hand: Hand) -> Vec<Pitch> {
        if hand == self.scale.hand() {
            return Vec::new();
        }
        self.rebuild(Scale::new(self.scale.key(), self.scale.shape(), hand))
    }

    fn rebuild(&mut self, scale: Scale) -> Vec<Pitch> {
        info!(scale = %scale, hand = ?scale.hand(), "scale selected");
        self.keyboard = build_keyboard(&scale, self.options.debounce);
        self.key_states = build_key_states(&scale, &self.keyboard);
        self.scale = scale;
        self.events
            .emit(SessionEvent::ScaleSelected(self.scale.name()));
        self.reset()
    }

    /// Change playing direction. Resets the attempt.
    pub fn set_direction(&mut self, direction: Direction) -> Vec<Pitch> {
        if direction == self.options.direction {
            return Vec::new();
        }
        self.options.direction = direction;
        self.reset()
    }

    /// Toggle the next-note hint. Resets the attempt.
    pub fn set_show_next_note(&mut self, on: bool) -> Vec<Pitch> {
        if on == self.options.show_next_note {
            return Vec::new();
        }
        self.options.show_next_note = on;
        self.reset()
    }

    /// Toggle fingering checks. Resets the attempt.
    pub fn set_check_fingers(&mut self, on: bool) -> Vec<Pitch> {
        if on == self.options.check_fingers {
            return Vec::new();
        }
        self.options.check_fingers = on;
        self.reset()
    }

    /// Replace every setting at once. Nothing happens when the options are
    /// unchanged; otherwise the attempt is reset, and a new debounce time
    /// rebuilds the keyboard.
    pub fn apply_options(&mut self, options: SessionOptions) -> Vec<Pitch> {
        if options == self.options {
            return Vec::new();
        }
        let new_debounce = options.debounce != self.options.debounce;
        debug!(?options, "session options replaced");
        self.options = options;
        if new_debounce {
            self.rebuild(self.scale.clone())
        } else {
            self.reset()
        }
    }

    // ---- modes ----

    /// Switch between practice and exam. Returns whether anything changed.
    pub fn set_app_mode(&mut self, mode: AppMode) -> bool {
        if self.app_mode == mode {
            return false;
        }
        self.app_mode = mode;
        self.events.emit(SessionEvent::ModeChanged(mode));
        true
    }

    fn set_question_state(&mut self, state: QuestionState) -> bool {
        if self.question_state == state {
            return false;
        }
        self.question_state = state;
        self.events.emit(SessionEvent::QuestionStateChanged(state));
        true
    }

    fn set_practice_state(&mut self, state: PracticeState) -> bool {
        if self.practice_state == state {
            return false;
        }
        self.practice_state = state;
        self.events.emit(SessionEvent::PracticeStateChanged(state));
        true
    }

    /// Mark a demonstration playback as running. Returns false if one
    /// already is.
    pub fn start_playback(&mut self) -> bool {
        self.set_practice_state(PracticeState::PlayingScale)
    }

    /// Mark the demonstration playback as finished
    pub fn finish_playback(&mut self) -> bool {
        if self.practice_state != PracticeState::PlayingScale {
            return false;
        }
        self.set_practice_state(PracticeState::Idle)
    }

    /// Highlight a note sounded by the playback driver
    pub fn show_played_note(&mut self, pitch: Pitch) -> Vec<Pitch> {
        let mut changed = self.keyboard.mark_played(pitch);
        if !changed.is_empty() {
            changed.push(pitch);
            self.events.emit(SessionEvent::KeysChanged(changed.clone()));
        }
        changed
    }

    // ---- attempts ----

    /// Start a timed attempt: reset, start the metronome, begin the question
    pub fn start_attempt(&mut self) -> Vec<Pitch> {
        let changed = self.reset();
        self.metronome.start(self.options.time_signature);
        self.set_practice_state(PracticeState::TimingScale);
        self.set_question_state(QuestionState::InQuestion);
        info!(scale = %self.scale, mode = ?self.app_mode, "attempt started");
        changed
    }

    /// Switch to exam mode and start an attempt
    pub fn start_exam(&mut self) -> Vec<Pitch> {
        self.exam_summary = None;
        self.set_app_mode(AppMode::Exam);
        self.start_attempt()
    }

    /// End the running attempt. Completed and timed-out attempts are graded
    /// and, in exam mode, produce the exam summary. Ending when no attempt
    /// is running does nothing.
    pub fn end_attempt(&mut self, reason: AttemptEnd) -> Option<ExamSummary> {
        if self.question_state != QuestionState::InQuestion {
            return None;
        }
        if self.metronome.is_ticking() {
            self.metronome.stop();
        }
        for state in self.key_states.values_mut() {
            state.next_note_highlight = false;
        }

        let summary = match reason {
            AttemptEnd::Cancelled => None,
            AttemptEnd::Completed | AttemptEnd::TimedOut => {
                if self.app_mode == AppMode::Exam {
                    let summary = self.compute_exam_summary();
                    info!(%summary, "exam finished");
                    self.exam_summary = Some(summary);
                    self.events.emit(SessionEvent::ExamFinished(summary));
                    Some(summary)
                } else {
                    None
                }
            }
        };

        self.set_app_mode(AppMode::Practice);
        self.set_practice_state(PracticeState::Idle);
        match reason {
            AttemptEnd::Cancelled => self.set_question_state(QuestionState::NotStarted),
            _ => self.set_question_state(QuestionState::InAnswer),
        };
        info!(?reason, "attempt ended");
        self.events
            .emit(SessionEvent::KeysChanged(self.keyboard.pitches()));
        summary
    }

    /// Clear all attempt state. Keeps the selected scale.
    pub fn reset(&mut self) -> Vec<Pitch> {
        for state in self.key_states.values_mut() {
            state.reset();
        }
        self.keyboard.reset_all();
        if self.metronome.is_ticking() {
            self.metronome.stop();
        }
        self.sequence = 0;
        self.last_press_tick = None;
        self.set_question_state(QuestionState::NotStarted);
        self.set_practice_state(PracticeState::Idle);
        self.events.emit(SessionEvent::Reset);
        self.keyboard.pitches()
    }

    // ---- presses ----

    /// Record a key press at a wall-clock instant
    pub fn record_tap(&mut self, pitch: Pitch, at: Instant) -> TapOutcome {
        if !self.key_states.contains_key(&pitch) {
            debug!(pitch, "tap outside session range ignored");
            return TapOutcome::Ignored(IgnoreReason::OutOfRange);
        }
        let mut redisplay = match self.keyboard.record_press(pitch, at) {
            PressOutcome::Accepted { redisplay } => redisplay,
            PressOutcome::Debounced => return TapOutcome::Ignored(IgnoreReason::Debounced),
            PressOutcome::OutOfRange => return TapOutcome::Ignored(IgnoreReason::OutOfRange),
        };
        redisplay.push(pitch);

        if self.options.show_next_note && self.practice_state != PracticeState::PlayingScale {
            self.highlight_next_note(pitch);
        }

        let tick = self.metronome.tick_count();
        let tick_delta = if self.question_state == QuestionState::InQuestion {
            self.last_press_tick.map(|last| tick.saturating_sub(last))
        } else {
            None
        };
        self.last_press_tick = Some(tick);

        self.sequence += 1;
        let sequence = self.sequence;
        if let Some(state) = self.key_states.get_mut(&pitch) {
            state.press_tick = Some(tick);
            state.tick_delta = tick_delta;
            state.press_sequence = Some(sequence);
        }
        debug!(pitch, sequence, tick, ?tick_delta, "tap recorded");
        self.events.emit(SessionEvent::KeysChanged(redisplay.clone()));

        let mut attempt_ended = false;
        let mut exam = None;
        if pitch == self.final_pitch() && self.question_state == QuestionState::InQuestion {
            exam = self.end_attempt(AttemptEnd::Completed);
            attempt_ended = true;
        }

        TapOutcome::Accepted {
            sequence,
            tick_delta,
            redisplay,
            attempt_ended,
            exam,
        }
    }

    /// Record the finger the player used on a pitch
    pub fn set_user_finger(&mut self, pitch: Pitch, finger: Finger) -> Result<Vec<Pitch>, SessionError> {
        if finger > LITTLE_FINGER {
            return Err(SessionError::InvalidFinger(finger));
        }
        let Some(state) = self.key_states.get_mut(&pitch) else {
            debug!(pitch, "finger for pitch outside session range ignored");
            return Ok(Vec::new());
        };
        state.user_finger = Some(finger);
        self.events.emit(SessionEvent::KeysChanged(vec![pitch]));
        Ok(vec![pitch])
    }

    /// Finger the player used on this pitch in any octave
    pub fn users_finger_for(&self, pitch: Pitch) -> Option<Finger> {
        let octaves = (SCALE_SPAN + 2 * KEYBOARD_MARGIN) / 12 + 1;
        (0..=octaves)
            .flat_map(|o| [pitch + 12 * o, pitch - 12 * o])
            .find_map(|p| self.key_states.get(&p).and_then(|s| s.user_finger))
    }

    /// Whether the UI should ask which finger played this pitch
    pub fn finger_prompt_needed(&self, pitch: Pitch) -> bool {
        self.options.check_fingers
            && self.question_state != QuestionState::InAnswer
            && self.scale.required_finger_at(pitch).is_some()
            && self
                .key_states
                .get(&pitch)
                .is_some_and(|s| s.user_finger.is_none())
    }

    /// Pitch whose press ends the attempt
    fn final_pitch(&self) -> Pitch {
        match self.options.direction {
            Direction::Ascending => self.scale.end_pitch(),
            Direction::Descending => self.scale.start_pitch(),
        }
    }

    fn highlight_next_note(&mut self, pitch: Pitch) {
        let direction = self.options.direction;
        let step = direction.step();
        let target = (1..=NEXT_NOTE_SCAN)
            .map(|i| pitch + step * i)
            .find(|&p| self.scale.is_in_scale_for(p, direction) && self.key_states.contains_key(&p));
        for state in self.key_states.values_mut() {
            state.next_note_highlight = Some(state.pitch) == target;
        }
    }

    // ---- grading ----

    /// Whether a scale note further along the attempt was already pressed
    fn later_degree_pressed(&self, pitch: Pitch) -> bool {
        let direction = self.options.direction;
        let step = direction.step();
        (1..=SCALE_SPAN).map(|i| pitch + step * i).any(|p| {
            self.scale.is_in_scale_for(p, direction)
                && self.key_states.get(&p).is_some_and(|s| s.was_pressed())
        })
    }

    /// Grade a pitch from the current key state, ignoring exam masking
    pub fn grade(&self, pitch: Pitch) -> DisplayState {
        let Some(state) = self.key_states.get(&pitch) else {
            warn!(pitch, "status requested for pitch without key state");
            return DisplayState::Error;
        };
        if !self.scale.in_window(pitch) {
            return DisplayState::NoShow;
        }
        if state.next_note_highlight {
            return DisplayState::NextToPlay;
        }

        let in_scale = self.scale.is_in_scale_for(pitch, self.options.direction);
        if !state.was_pressed() && in_scale && self.later_degree_pressed(pitch) {
            return DisplayState::Missing;
        }
        if let (Some(required), Some(user)) =
            (self.scale.required_finger_at(pitch), state.user_finger)
        {
            if required != user {
                return DisplayState::WrongFinger;
            }
        }
        if state.was_pressed() {
            if !in_scale {
                return DisplayState::OutOfScale;
            }
            return self.options.timing.classify(state.tick_delta);
        }
        DisplayState::NoShow
    }

    /// Display status of a key. Caches the grade; exam mode hides it.
    pub fn status_of(&mut self, pitch: Pitch) -> DisplayState {
        let status = self.grade(pitch);
        if status == DisplayState::Error {
            return status;
        }
        if let Some(state) = self.key_states.get_mut(&pitch) {
            state.last_status = Some(status);
        }
        if self.app_mode == AppMode::Exam {
            return DisplayState::NoShow;
        }
        status
    }

    /// Display status of every key, low to high
    pub fn statuses(&mut self) -> Vec<(Pitch, DisplayState)> {
        self.keyboard
            .pitches()
            .into_iter()
            .map(|p| (p, self.status_of(p)))
            .collect()
    }

    /// Explanation for a key's current status
    pub fn explain(&self, pitch: Pitch) -> Option<String> {
        let status = self.grade(pitch);
        explain(
            status,
            &self.scale.name(),
            self.scale.required_finger_at(pitch),
            self.users_finger_for(pitch),
        )
    }

    fn compute_exam_summary(&mut self) -> ExamSummary {
        let direction = self.options.direction;
        let mut summary = ExamSummary::new(0, 0, 0);
        for pitch in self.scale.start_pitch()..=self.scale.end_pitch() {
            let status = self.grade(pitch);
            let Some(state) = self.key_states.get_mut(&pitch) else {
                continue;
            };
            state.last_status = Some(status);
            if self.scale.is_in_scale_for(pitch, direction) {
                summary.note_count += 1;
                if status == DisplayState::Correct {
                    summary.correct_count += 1;
                }
            } else if state.was_pressed() {
                summary.wrong_count += 1;
            }
        }
        summary
    }
}

fn build_keyboard(scale: &Scale, debounce: Duration) -> Keyboard {
    let count = (SCALE_SPAN + 2 * KEYBOARD_MARGIN) as usize;
    Keyboard::with_debounce(scale.start_pitch() - KEYBOARD_MARGIN, count, debounce)
}

fn build_key_states(scale: &Scale, keyboard: &Keyboard) -> BTreeMap<Pitch, KeyState> {
    keyboard
        .pitches()
        .into_iter()
        .map(|p| (p, KeyState::new(p, scale.degree_index_at(p))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Accidental, Mode, Note, ShapeKind};
    use crate::timing::ManualClock;

    fn c_major() -> Session<ManualClock> {
        Session::new(
            Key::new(Note::C, Mode::Major, Accidental::Sharp),
            ScaleShape::of(ShapeKind::Major),
            Hand::Right,
            SessionOptions::default(),
            ManualClock::new(60),
        )
    }

    fn later(t0: Instant, n: u64) -> Instant {
        t0 + Duration::from_millis(300 * n)
    }

    #[test]
    fn test_session_builds_keyboard_around_scale() {
        let session = c_major();
        assert_eq!(session.keyboard().first_pitch(), Some(57));
        assert_eq!(session.keyboard().last_pitch(), Some(87));
        assert_eq!(session.keyboard().len(), 31);
        assert_eq!(session.key_state(62).unwrap().scale_degree, Some(1));
        assert_eq!(session.key_state(61).unwrap().scale_degree, None);
        assert_eq!(session.key_state(57).unwrap().scale_degree, None);
    }

    #[test]
    fn test_tap_out_of_range_is_noop() {
        let mut session = c_major();
        let outcome = session.record_tap(20, Instant::now());
        assert_eq!(outcome, TapOutcome::Ignored(IgnoreReason::OutOfRange));
        assert!(!session.was_any_key_pressed());
    }

    #[test]
    fn test_sequence_is_shared_across_keys() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.record_tap(60, t0);
        session.record_tap(62, later(t0, 1));
        session.record_tap(60, later(t0, 2));
        assert_eq!(session.key_state(62).unwrap().press_sequence, Some(2));
        assert_eq!(session.key_state(60).unwrap().press_sequence, Some(3));
    }

    #[test]
    fn test_debounced_tap_does_not_count() {
        let mut session = c_major();
        let t0 = Instant::now();
        assert!(session.record_tap(60, t0).is_accepted());
        assert_eq!(
            session.record_tap(62, t0 + Duration::from_millis(100)),
            TapOutcome::Ignored(IgnoreReason::Debounced)
        );
        assert_eq!(session.key_state(62).unwrap().press_sequence, None);
    }

    #[test]
    fn test_tick_delta_only_in_question() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.record_tap(60, t0);
        session.record_tap(62, later(t0, 1));
        assert_eq!(session.key_state(62).unwrap().tick_delta, None);

        session.start_attempt();
        session.record_tap(60, later(t0, 2));
        assert_eq!(session.key_state(60).unwrap().tick_delta, None);
        session.metronome_mut().advance(8);
        session.record_tap(62, later(t0, 3));
        assert_eq!(session.key_state(62).unwrap().tick_delta, Some(8));
        assert_eq!(session.key_state(62).unwrap().press_tick, Some(8));
    }

    #[test]
    fn test_timing_window_classification() {
        let window = TimingWindow::default();
        assert_eq!(window.classify(None), DisplayState::Correct);
        assert_eq!(window.classify(Some(5)), DisplayState::TooEarly);
        assert_eq!(window.classify(Some(6)), DisplayState::Correct);
        assert_eq!(window.classify(Some(9)), DisplayState::Correct);
        assert_eq!(window.classify(Some(10)), DisplayState::TooLate);
    }

    #[test]
    fn test_out_of_scale_and_window_statuses() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.record_tap(61, t0);
        session.record_tap(58, later(t0, 1));
        assert_eq!(session.status_of(61), DisplayState::OutOfScale);
        // Below the window
        assert_eq!(session.status_of(58), DisplayState::NoShow);
        assert_eq!(session.status_of(20), DisplayState::Error);
    }

    #[test]
    fn test_missing_is_retroactive() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.record_tap(60, t0);
        assert_eq!(session.status_of(62), DisplayState::NoShow);
        session.record_tap(64, later(t0, 1));
        assert_eq!(session.status_of(62), DisplayState::Missing);
        // Out-of-scale gaps are never missing
        assert_eq!(session.status_of(61), DisplayState::NoShow);
    }

    #[test]
    fn test_missing_descending_looks_down() {
        let mut session = c_major();
        session.set_direction(Direction::Descending);
        let t0 = Instant::now();
        session.record_tap(84, t0);
        session.record_tap(79, later(t0, 1));
        assert_eq!(session.status_of(83), DisplayState::Missing);
        assert_eq!(session.status_of(77), DisplayState::NoShow);
    }

    #[test]
    fn test_wrong_finger_checked_before_timing() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.record_tap(65, t0);
        session.set_user_finger(65, 2).unwrap();
        assert_eq!(session.status_of(65), DisplayState::WrongFinger);
        session.set_user_finger(65, 0).unwrap();
        assert_eq!(session.status_of(65), DisplayState::Correct);
        // Finger on a non-required degree is not graded
        session.record_tap(67, later(t0, 1));
        session.set_user_finger(67, 4).unwrap();
        assert_eq!(session.status_of(67), DisplayState::Correct);
    }

    #[test]
    fn test_invalid_finger() {
        let mut session = c_major();
        assert_eq!(
            session.set_user_finger(60, 5),
            Err(SessionError::InvalidFinger(5))
        );
        assert_eq!(session.set_user_finger(10, 1), Ok(Vec::new()));
    }

    #[test]
    fn test_next_note_highlight() {
        let mut session = c_major();
        session.set_show_next_note(true);
        let t0 = Instant::now();
        session.record_tap(60, t0);
        assert_eq!(session.status_of(62), DisplayState::NextToPlay);
        session.record_tap(64, later(t0, 1));
        assert!(!session.key_state(62).unwrap().next_note_highlight);
        assert_eq!(session.status_of(65), DisplayState::NextToPlay);
        // Skipped degree behind the hint
        assert_eq!(session.status_of(62), DisplayState::Missing);
    }

    #[test]
    fn test_next_note_suppressed_during_playback() {
        let mut session = c_major();
        session.set_show_next_note(true);
        assert!(session.start_playback());
        assert!(!session.start_playback());
        session.record_tap(60, Instant::now());
        assert!(!session.key_state(62).unwrap().next_note_highlight);
        assert!(session.finish_playback());
    }

    #[test]
    fn test_exam_hides_feedback_but_caches() {
        let mut session = c_major();
        session.start_exam();
        session.record_tap(61, Instant::now());
        assert_eq!(session.status_of(61), DisplayState::NoShow);
        assert_eq!(
            session.key_state(61).unwrap().last_status,
            Some(DisplayState::OutOfScale)
        );
    }

    #[test]
    fn test_end_attempt_is_idempotent() {
        let mut session = c_major();
        assert_eq!(session.end_attempt(AttemptEnd::TimedOut), None);
        session.start_attempt();
        assert!(session.metronome().is_ticking());
        session.end_attempt(AttemptEnd::Cancelled);
        assert_eq!(session.question_state(), QuestionState::NotStarted);
        assert!(!session.metronome().is_ticking());
        assert_eq!(session.end_attempt(AttemptEnd::Completed), None);
    }

    #[test]
    fn test_timed_out_exam_is_graded() {
        let mut session = c_major();
        session.start_exam();
        let t0 = Instant::now();
        session.record_tap(60, t0);
        session.metronome_mut().advance(8);
        session.record_tap(62, later(t0, 1));
        let summary = session.end_attempt(AttemptEnd::TimedOut).unwrap();
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.note_count, 15);
        assert_eq!(session.app_mode(), AppMode::Practice);
        assert_eq!(session.question_state(), QuestionState::InAnswer);
        assert_eq!(session.exam_summary(), Some(summary));
    }

    #[test]
    fn test_reset_preserves_scale() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.start_attempt();
        session.record_tap(60, t0);
        session.set_user_finger(60, 0).unwrap();
        session.reset();
        assert!(!session.was_any_key_pressed());
        assert_eq!(session.key_state(60).unwrap().user_finger, None);
        assert_eq!(session.question_state(), QuestionState::NotStarted);
        assert_eq!(session.practice_state(), PracticeState::Idle);
        assert_eq!(session.scale().start_pitch(), 60);
    }

    #[test]
    fn test_select_scale_rebuilds() {
        let mut session = c_major();
        session.record_tap(60, Instant::now());
        let key = Key::new(Note::Gs, Mode::Major, Accidental::Flat);
        session.select_scale(key, ScaleShape::of(ShapeKind::Major));
        assert_eq!(session.scale().start_pitch(), 68);
        assert_eq!(session.keyboard().first_pitch(), Some(65));
        assert!(!session.was_any_key_pressed());
        assert_eq!(session.key_state(70).unwrap().scale_degree, Some(1));
    }

    #[test]
    fn test_set_hand_moves_keyboard() {
        let mut session = c_major();
        assert!(session.set_hand(Hand::Right).is_empty());
        session.set_hand(Hand::Left);
        assert_eq!(session.scale().start_pitch(), 36);
        assert_eq!(session.keyboard().first_pitch(), Some(33));
    }

    #[test]
    fn test_reselecting_current_scale_keeps_attempt() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.start_attempt();
        session.record_tap(60, t0);
        let key = session.scale().key();
        let shape = session.scale().shape();
        assert!(session.select_scale(key, shape).is_empty());
        assert_eq!(session.question_state(), QuestionState::InQuestion);
        assert!(session.was_any_key_pressed());
    }

    #[test]
    fn test_same_direction_keeps_attempt() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.start_attempt();
        session.record_tap(60, t0);
        session.record_tap(62, later(t0, 1));

        assert!(session.set_direction(Direction::Ascending).is_empty());
        assert_eq!(session.question_state(), QuestionState::InQuestion);
        assert!(session.was_any_key_pressed());
        assert_eq!(session.key_state(62).unwrap().press_sequence, Some(2));

        assert!(!session.set_direction(Direction::Descending).is_empty());
        assert_eq!(session.question_state(), QuestionState::NotStarted);
        assert!(!session.was_any_key_pressed());
    }

    #[test]
    fn test_same_finger_check_keeps_fingers() {
        let mut session = c_major();
        session.set_user_finger(60, 0).unwrap();
        assert!(session.set_check_fingers(false).is_empty());
        assert_eq!(session.key_state(60).unwrap().user_finger, Some(0));

        session.set_check_fingers(true);
        assert_eq!(session.key_state(60).unwrap().user_finger, None);
        session.set_user_finger(60, 0).unwrap();
        assert!(session.set_check_fingers(true).is_empty());
        assert_eq!(session.key_state(60).unwrap().user_finger, Some(0));
    }

    #[test]
    fn test_same_next_note_hint_keeps_attempt() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.start_attempt();
        session.record_tap(60, t0);
        let events = session.subscribe();

        assert!(session.set_show_next_note(false).is_empty());
        assert_eq!(session.question_state(), QuestionState::InQuestion);
        assert!(session.was_any_key_pressed());
        assert_eq!(events.try_iter().count(), 0);
    }

    #[test]
    fn test_apply_options() {
        let mut session = c_major();
        let t0 = Instant::now();
        session.start_attempt();
        session.record_tap(60, t0);
        assert!(session.apply_options(SessionOptions::default()).is_empty());
        assert!(session.was_any_key_pressed());

        let options = SessionOptions {
            direction: Direction::Descending,
            check_fingers: true,
            debounce: Duration::from_millis(50),
            ..SessionOptions::default()
        };
        assert_eq!(session.apply_options(options.clone()).len(), 31);
        assert_eq!(session.options(), &options);
        assert_eq!(session.question_state(), QuestionState::NotStarted);

        // The shorter debounce reached the rebuilt keyboard
        session.record_tap(60, t0);
        assert!(session.record_tap(62, t0 + Duration::from_millis(100)).is_accepted());
    }

    #[test]
    fn test_mode_transitions_idempotent() {
        let mut session = c_major();
        let events = session.subscribe();
        assert!(!session.set_app_mode(AppMode::Practice));
        assert!(session.set_app_mode(AppMode::Exam));
        assert!(!session.set_app_mode(AppMode::Exam));
        let received: Vec<SessionEvent> = events.try_iter().collect();
        assert_eq!(received, vec![SessionEvent::ModeChanged(AppMode::Exam)]);
    }

    #[test]
    fn test_finger_prompt_needed() {
        let mut session = c_major();
        assert!(!session.finger_prompt_needed(60));
        session.set_check_fingers(true);
        assert!(session.finger_prompt_needed(60));
        assert!(session.finger_prompt_needed(65));
        assert!(!session.finger_prompt_needed(62));
        session.set_user_finger(60, 0).unwrap();
        assert!(!session.finger_prompt_needed(60));
    }

    #[test]
    fn test_users_finger_searches_octaves() {
        let mut session = c_major();
        session.set_user_finger(77, 0).unwrap();
        assert_eq!(session.users_finger_for(65), Some(0));
        assert_eq!(session.users_finger_for(64), None);
    }

    #[test]
    fn test_explain_uses_scale_name() {
        let mut session = c_major();
        session.record_tap(61, Instant::now());
        let text = session.explain(61).unwrap();
        assert!(text.contains("C Major"));
        assert!(session.explain(62).is_none());
    }

    #[test]
    fn test_show_played_note() {
        let mut session = c_major();
        let changed = session.show_played_note(64);
        assert!(changed.contains(&64));
        assert_eq!(session.keyboard().last_pressed(), Some(64));
        assert!(session.show_played_note(200).is_empty());
    }
}
