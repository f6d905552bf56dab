// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keys, pitch classes, hands and playing direction.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ParseError;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        Note::ALL.iter().position(|&n| n == self).unwrap_or(0) as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse note from string (e.g., "C", "C#", "Db", "A♭")
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().replace('♯', "#").replace('♭', "b").to_uppercase();
        match s.as_str() {
            "C" | "B#" => Some(Note::C),
            "C#" | "CS" | "DB" => Some(Note::Cs),
            "D" => Some(Note::D),
            "D#" | "DS" | "EB" => Some(Note::Ds),
            "E" | "FB" => Some(Note::E),
            "F" | "E#" | "ES" => Some(Note::F),
            "F#" | "FS" | "GB" => Some(Note::Fs),
            "G" => Some(Note::G),
            "G#" | "GS" | "AB" => Some(Note::Gs),
            "A" => Some(Note::A),
            "A#" | "AS" | "BB" => Some(Note::As),
            "B" | "CB" => Some(Note::B),
            _ => None,
        }
    }

    /// Whether this pitch class sits on a white piano key
    pub fn is_natural(self) -> bool {
        matches!(
            self,
            Note::C | Note::D | Note::E | Note::F | Note::G | Note::A | Note::B
        )
    }

    /// Spell the note using the given accidental preference
    pub fn spelled(self, accidental: Accidental) -> &'static str {
        match (self, accidental) {
            (Note::C, _) => "C",
            (Note::Cs, Accidental::Sharp) => "C♯",
            (Note::Cs, Accidental::Flat) => "D♭",
            (Note::D, _) => "D",
            (Note::Ds, Accidental::Sharp) => "D♯",
            (Note::Ds, Accidental::Flat) => "E♭",
            (Note::E, _) => "E",
            (Note::F, _) => "F",
            (Note::Fs, Accidental::Sharp) => "F♯",
            (Note::Fs, Accidental::Flat) => "G♭",
            (Note::G, _) => "G",
            (Note::Gs, Accidental::Sharp) => "G♯",
            (Note::Gs, Accidental::Flat) => "A♭",
            (Note::A, _) => "A",
            (Note::As, Accidental::Sharp) => "A♯",
            (Note::As, Accidental::Flat) => "B♭",
            (Note::B, _) => "B",
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelled(Accidental::Sharp))
    }
}

/// Accidental preference used to spell black-key tonics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    Sharp,
    Flat,
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    /// Parse mode from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" | "maj" => Some(Mode::Major),
            "minor" | "min" => Some(Mode::Minor),
            _ => None,
        }
    }
}

/// A musical key. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    tonic: Note,
    mode: Mode,
    accidental: Accidental,
}

impl Key {
    /// Create a new key
    pub fn new(tonic: Note, mode: Mode, accidental: Accidental) -> Self {
        Self {
            tonic,
            mode,
            accidental,
        }
    }

    /// Parse a key from a tonic name and a mode name.
    ///
    /// A "b"/"♭" spelling prefers flats and "#"/"♯" prefers sharps. Natural
    /// tonics follow the usual key signature (F major and D, G, C, F minor
    /// are flat keys).
    pub fn parse(tonic_str: &str, mode_str: &str) -> Result<Self, ParseError> {
        let tonic =
            Note::from_str(tonic_str).ok_or_else(|| ParseError::UnknownNote(tonic_str.into()))?;
        let mode = Mode::from_str(mode_str).ok_or_else(|| ParseError::UnknownMode(mode_str.into()))?;

        let suffix: String = tonic_str.trim().chars().skip(1).collect();
        let accidental = if suffix.contains('b') || suffix.contains('♭') {
            Accidental::Flat
        } else if suffix.contains('#') || suffix.contains('♯') {
            Accidental::Sharp
        } else {
            match (mode, tonic) {
                (Mode::Major, Note::F) => Accidental::Flat,
                (Mode::Minor, Note::D | Note::G | Note::C | Note::F) => Accidental::Flat,
                _ => Accidental::Sharp,
            }
        };

        Ok(Key::new(tonic, mode, accidental))
    }

    /// All twelve major keys spelled with the given accidental
    pub fn all(accidental: Accidental) -> Vec<Key> {
        Note::ALL
            .iter()
            .map(|&tonic| Key::new(tonic, Mode::Major, accidental))
            .collect()
    }

    /// Get the tonic
    pub fn tonic(&self) -> Note {
        self.tonic
    }

    /// Get the mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get the accidental preference
    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    /// Tonic spelled with the key's accidental preference (e.g. "A♭")
    pub fn name(&self) -> &'static str {
        self.tonic.spelled(self.accidental)
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::new(Note::C, Mode::Major, Accidental::Sharp)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
        };
        write!(f, "{} {}", self.name(), mode)
    }
}

/// Which hand plays the scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    #[default]
    Right,
}

impl Hand {
    /// Parse hand from string
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match s.trim().to_lowercase().as_str() {
            "left" | "lh" | "l" => Ok(Hand::Left),
            "right" | "rh" | "r" => Ok(Hand::Right),
            _ => Err(ParseError::UnknownHand(s.into())),
        }
    }
}

/// Playing direction of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// Parse direction from string
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match s.trim().to_lowercase().as_str() {
            "ascending" | "up" => Ok(Direction::Ascending),
            "descending" | "down" => Ok(Direction::Descending),
            _ => Err(ParseError::UnknownDirection(s.into())),
        }
    }

    /// Semitone step in the direction of travel
    pub fn step(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}
