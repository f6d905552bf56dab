// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale shape catalog.
//!
//! A shape is a named interval pattern relative to the tonic. Shapes are
//! immutable and looked up from a fixed catalog; two shapes are equal when
//! their kinds are equal.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Direction, Mode, ParseError};

/// Shapes the trainer knows how to grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Major,
    HarmonicMinor,
    MelodicMinor,
    Chromatic,
    MajorArpeggio,
    MinorArpeggio,
}

impl ShapeKind {
    /// All shape kinds in catalog order
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Major,
        ShapeKind::HarmonicMinor,
        ShapeKind::MelodicMinor,
        ShapeKind::Chromatic,
        ShapeKind::MajorArpeggio,
        ShapeKind::MinorArpeggio,
    ];

    /// Parse shape kind from string
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace([' ', '-', '_'], "");
        match s.as_str() {
            "major" | "ionian" => Some(ShapeKind::Major),
            "harmonicminor" | "minor" => Some(ShapeKind::HarmonicMinor),
            "melodicminor" => Some(ShapeKind::MelodicMinor),
            "chromatic" => Some(ShapeKind::Chromatic),
            "majorarpeggio" | "arpeggio" => Some(ShapeKind::MajorArpeggio),
            "minorarpeggio" => Some(ShapeKind::MinorArpeggio),
            _ => None,
        }
    }

    /// Key mode a shape is usually practised in
    pub fn key_mode(self) -> Mode {
        match self {
            ShapeKind::HarmonicMinor | ShapeKind::MelodicMinor | ShapeKind::MinorArpeggio => {
                Mode::Minor
            }
            _ => Mode::Major,
        }
    }

    /// Get a human-readable name for this shape
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Major => "Major",
            ShapeKind::HarmonicMinor => "Harmonic Minor",
            ShapeKind::MelodicMinor => "Melodic Minor",
            ShapeKind::Chromatic => "Chromatic",
            ShapeKind::MajorArpeggio => "Major Arpeggio",
            ShapeKind::MinorArpeggio => "Minor Arpeggio",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const MAJOR: &[u8] = &[0, 2, 4, 5, 7, 9, 11];
const HARMONIC_MINOR: &[u8] = &[0, 2, 3, 5, 7, 8, 11];
const MELODIC_MINOR_UP: &[u8] = &[0, 2, 3, 5, 7, 9, 11];
const MELODIC_MINOR_DOWN: &[u8] = &[0, 2, 3, 5, 7, 8, 10];
const CHROMATIC: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
const MAJOR_ARPEGGIO: &[u8] = &[0, 4, 7];
const MINOR_ARPEGGIO: &[u8] = &[0, 3, 7];

/// An interval pattern with ascending and descending forms
#[derive(Debug, Clone, Copy, Eq)]
pub struct ScaleShape {
    kind: ShapeKind,
    ascending: &'static [u8],
    descending: &'static [u8],
}

impl PartialEq for ScaleShape {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl ScaleShape {
    /// Look up the catalog entry for a kind
    pub fn of(kind: ShapeKind) -> Self {
        let ascending = match kind {
            ShapeKind::Major => MAJOR,
            ShapeKind::HarmonicMinor => HARMONIC_MINOR,
            ShapeKind::MelodicMinor => MELODIC_MINOR_UP,
            ShapeKind::Chromatic => CHROMATIC,
            ShapeKind::MajorArpeggio => MAJOR_ARPEGGIO,
            ShapeKind::MinorArpeggio => MINOR_ARPEGGIO,
        };
        // Only melodic minor descends differently (natural minor form)
        let descending = match kind {
            ShapeKind::MelodicMinor => MELODIC_MINOR_DOWN,
            _ => ascending,
        };
        Self {
            kind,
            ascending,
            descending,
        }
    }

    /// Parse a shape from its catalog name
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        ShapeKind::from_str(s)
            .map(ScaleShape::of)
            .ok_or_else(|| ParseError::UnknownShape(s.into()))
    }

    /// The full catalog
    pub fn catalog() -> Vec<ScaleShape> {
        ShapeKind::ALL.iter().map(|&k| ScaleShape::of(k)).collect()
    }

    /// Get the kind
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Ascending intervals (semitones from tonic)
    pub fn ascending(&self) -> &'static [u8] {
        self.ascending
    }

    /// Descending intervals (semitones from tonic, listed low to high)
    pub fn descending(&self) -> &'static [u8] {
        self.descending
    }

    /// Intervals used when playing in the given direction
    pub fn intervals(&self, direction: Direction) -> &'static [u8] {
        match direction {
            Direction::Ascending => self.ascending,
            Direction::Descending => self.descending,
        }
    }

    /// Number of scale degrees per octave
    pub fn degree_count(&self) -> usize {
        self.ascending.len()
    }

    /// Arpeggios are too short to ever reach a finger break
    pub fn is_arpeggio(&self) -> bool {
        matches!(self.kind, ShapeKind::MajorArpeggio | ShapeKind::MinorArpeggio)
    }
}

impl Default for ScaleShape {
    fn default() -> Self {
        ScaleShape::of(ShapeKind::Major)
    }
}

impl fmt::Display for ScaleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}
