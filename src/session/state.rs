// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-key grading state.

use std::fmt;

use crate::music::{finger_name, Finger, Pitch};

/// What the UI should show on a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    NoShow,
    OutOfScale,
    Missing,
    WrongFinger,
    TooEarly,
    TooLate,
    NextToPlay,
    Correct,
    /// Queried a pitch the session was not built for
    Error,
}

impl DisplayState {
    /// Whether the state marks a mistake
    pub fn is_mistake(self) -> bool {
        matches!(
            self,
            DisplayState::OutOfScale
                | DisplayState::Missing
                | DisplayState::WrongFinger
                | DisplayState::TooEarly
                | DisplayState::TooLate
        )
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DisplayState::NoShow => "-",
            DisplayState::OutOfScale => "out of scale",
            DisplayState::Missing => "missing",
            DisplayState::WrongFinger => "wrong finger",
            DisplayState::TooEarly => "too early",
            DisplayState::TooLate => "too late",
            DisplayState::NextToPlay => "next",
            DisplayState::Correct => "correct",
            DisplayState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Session bookkeeping for one keyboard pitch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyState {
    pub pitch: Pitch,
    /// Finger the player said they used
    pub user_finger: Option<Finger>,
    /// Scale-degree index, `None` when the pitch is not in the scale
    pub scale_degree: Option<usize>,
    /// Metronome tick count at the press
    pub press_tick: Option<u64>,
    /// Ticks since the previous press of the attempt
    pub tick_delta: Option<u64>,
    /// Order of the press within the attempt
    pub press_sequence: Option<u32>,
    pub next_note_highlight: bool,
    /// Status from the most recent grading pass
    pub last_status: Option<DisplayState>,
}

impl KeyState {
    /// Fresh state for a pitch
    pub fn new(pitch: Pitch, scale_degree: Option<usize>) -> Self {
        Self {
            pitch,
            user_finger: None,
            scale_degree,
            press_tick: None,
            tick_delta: None,
            press_sequence: None,
            next_note_highlight: false,
            last_status: None,
        }
    }

    /// Pressed during the current attempt
    pub fn was_pressed(&self) -> bool {
        self.press_sequence.is_some()
    }

    /// Clear everything an attempt writes
    pub fn reset(&mut self) {
        self.user_finger = None;
        self.press_tick = None;
        self.tick_delta = None;
        self.press_sequence = None;
        self.next_note_highlight = false;
        self.last_status = None;
    }
}

/// Human readable explanation of a mistake
pub fn explain(
    status: DisplayState,
    scale_name: &str,
    required: Option<Finger>,
    user: Option<Finger>,
) -> Option<String> {
    match status {
        DisplayState::OutOfScale => Some(format!(
            "This note you played is not in the {}",
            scale_name
        )),
        DisplayState::Missing => Some(format!(
            "You didn't play this note but it is required in the {}",
            scale_name
        )),
        DisplayState::TooEarly => Some("This note was played too early".to_string()),
        DisplayState::TooLate => Some("This note was played too late".to_string()),
        DisplayState::WrongFinger => {
            let required = required?;
            let mut text = format!(
                "This note should be played with the {}",
                finger_name(required)
            );
            if let Some(user) = user {
                text.push_str(&format!(". You played it with your {}", finger_name(user)));
            }
            Some(text)
        }
        _ => None,
    }
}
