// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Concrete two-octave scale.
//!
//! Binds a key, a shape and a hand to a pitch range, and answers the
//! membership and fingering questions the grading session asks. A `Scale`
//! is immutable; selecting another key or shape builds a new one.

use std::fmt;

use super::fingering::{chromatic_finger, Finger, FingerPattern};
use super::{pitch_class, Direction, Hand, Key, Pitch, ScaleShape, ShapeKind};

/// Semitones covered by a scale attempt (two octaves)
pub const SCALE_SPAN: Pitch = 24;

/// Lowest pitch a right-hand tonic may start on (middle C)
const RIGHT_HAND_BASE: Pitch = 60;

/// Lowest pitch a left-hand tonic may start on (two octaves below middle C)
const LEFT_HAND_BASE: Pitch = 36;

/// A key + shape + hand placed on the keyboard
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    key: Key,
    shape: ScaleShape,
    hand: Hand,
    start_pitch: Pitch,
    pattern: FingerPattern,
    /// Finger per interval offset from the tonic
    fingers: [Option<Finger>; 12],
}

impl Scale {
    /// Build the scale and its fingering
    pub fn new(key: Key, shape: ScaleShape, hand: Hand) -> Self {
        let tonic_pc = key.tonic().pitch_class() as Pitch;
        let start_pitch = match hand {
            Hand::Right => RIGHT_HAND_BASE + tonic_pc,
            Hand::Left => LEFT_HAND_BASE + tonic_pc,
        };
        let pattern = FingerPattern::for_scale(key.tonic(), &shape, hand);
        let fingers = assign_fingers(&key, &shape, hand, &pattern);

        Self {
            key,
            shape,
            hand,
            start_pitch,
            pattern,
            fingers,
        }
    }

    /// Get the key
    pub fn key(&self) -> Key {
        self.key
    }

    /// Get the shape
    pub fn shape(&self) -> ScaleShape {
        self.shape
    }

    /// Get the hand
    pub fn hand(&self) -> Hand {
        self.hand
    }

    /// Display name, e.g. "A♭ Harmonic Minor"
    pub fn name(&self) -> String {
        format!("{} {}", self.key.name(), self.shape)
    }

    /// Lowest pitch of the attempt (the tonic)
    pub fn start_pitch(&self) -> Pitch {
        self.start_pitch
    }

    /// Highest pitch of the attempt (the tonic two octaves up)
    pub fn end_pitch(&self) -> Pitch {
        self.start_pitch + SCALE_SPAN
    }

    /// Number of semitones spanned by the attempt
    pub fn note_count(&self) -> Pitch {
        SCALE_SPAN
    }

    /// Whether a pitch lies inside the active two-octave window
    pub fn in_window(&self, pitch: Pitch) -> bool {
        pitch >= self.start_pitch && pitch <= self.end_pitch()
    }

    /// Walk position after which the fingering returns to the thumb
    pub fn break_degree_index(&self) -> Option<usize> {
        self.pattern.break_index
    }

    /// Finger on the tonic
    pub fn start_finger(&self) -> Finger {
        self.pattern.start_finger
    }

    /// Finger map indexed by interval offset from the tonic
    pub fn finger_assignment(&self) -> &[Option<Finger>; 12] {
        &self.fingers
    }

    fn offset_of(&self, pitch: Pitch) -> u8 {
        pitch_class(pitch - self.start_pitch)
    }

    /// Membership using the ascending form. Periodic in 12 semitones.
    pub fn is_in_scale(&self, pitch: Pitch) -> bool {
        self.is_in_scale_for(pitch, Direction::Ascending)
    }

    /// Membership using the interval set for the given direction
    pub fn is_in_scale_for(&self, pitch: Pitch, direction: Direction) -> bool {
        self.shape
            .intervals(direction)
            .contains(&self.offset_of(pitch))
    }

    /// Finger for an interval offset (0-11), `None` if not a scale degree
    pub fn finger_for_interval_offset(&self, offset: u8) -> Option<Finger> {
        self.fingers.get(offset as usize).copied().flatten()
    }

    /// Scale-degree index (position in one octave's interval list) of an
    /// in-range pitch
    pub fn degree_index_at(&self, pitch: Pitch) -> Option<usize> {
        if !self.in_window(pitch) {
            return None;
        }
        let offset = self.offset_of(pitch);
        self.shape
            .ascending()
            .iter()
            .position(|&o| o == offset)
            .or_else(|| self.shape.descending().iter().position(|&o| o == offset))
    }

    /// Position of a degree in the hand's fingering walk
    fn walk_position(&self, degree: usize) -> usize {
        let n = self.shape.degree_count();
        match self.hand {
            Hand::Right => degree,
            Hand::Left => (n - degree) % n,
        }
    }

    /// Finger the player has to choose explicitly at this pitch. Only the
    /// tonic and the degree right after the break require a choice; every
    /// other finger follows by continuity.
    pub fn required_finger_at(&self, pitch: Pitch) -> Option<Finger> {
        let degree = self.degree_index_at(pitch)?;
        let position = self.walk_position(degree);
        if self
            .pattern
            .is_required_position(position, self.shape.degree_count())
        {
            self.finger_for_interval_offset(self.offset_of(pitch))
        } else {
            None
        }
    }

    /// Finger for any in-range scale pitch, inferred by continuity
    pub fn finger_at(&self, pitch: Pitch) -> Option<Finger> {
        let degree = self.degree_index_at(pitch)?;
        if self.shape.kind() == ShapeKind::Chromatic {
            return self.finger_for_interval_offset(self.offset_of(pitch));
        }
        Some(self.pattern.finger_at_position(self.walk_position(degree)))
    }

    /// All scale pitches inside the window, low to high
    pub fn pitches(&self, direction: Direction) -> Vec<Pitch> {
        (self.start_pitch..=self.end_pitch())
            .filter(|&p| self.is_in_scale_for(p, direction))
            .collect()
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Walk the degrees in playing order and hand out fingers. Offsets that only
/// appear in the other direction's form take the finger of the degree they
/// replace.
fn assign_fingers(
    key: &Key,
    shape: &ScaleShape,
    hand: Hand,
    pattern: &FingerPattern,
) -> [Option<Finger>; 12] {
    let mut fingers = [None; 12];

    if shape.kind() == ShapeKind::Chromatic {
        let tonic_pc = key.tonic().pitch_class();
        for &offset in shape.ascending() {
            let pc = (tonic_pc + offset) % 12;
            fingers[offset as usize] = Some(chromatic_finger(pc, offset == 0));
        }
        return fingers;
    }

    let (walked, other) = match hand {
        Hand::Right => (shape.ascending(), shape.descending()),
        Hand::Left => (shape.descending(), shape.ascending()),
    };
    let walk: Vec<u8> = match hand {
        Hand::Right => walked.to_vec(),
        Hand::Left => std::iter::once(walked[0])
            .chain(walked[1..].iter().rev().copied())
            .collect(),
    };

    let mut finger = pattern.start_finger;
    for (position, &offset) in walk.iter().enumerate() {
        fingers[offset as usize] = Some(finger);
        finger = if pattern.break_index == Some(position) {
            super::fingering::THUMB
        } else {
            super::next_finger(finger)
        };
    }

    for (degree, &offset) in other.iter().enumerate() {
        if fingers[offset as usize].is_none() {
            fingers[offset as usize] = fingers[walked[degree] as usize];
        }
    }

    fingers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Accidental, Mode, Note};

    fn scale(tonic: Note, kind: ShapeKind, hand: Hand) -> Scale {
        Scale::new(
            Key::new(tonic, Mode::Major, Accidental::Flat),
            ScaleShape::of(kind),
            hand,
        )
    }

    #[test]
    fn test_start_pitch_by_hand() {
        assert_eq!(scale(Note::C, ShapeKind::Major, Hand::Right).start_pitch(), 60);
        assert_eq!(scale(Note::Gs, ShapeKind::Major, Hand::Right).start_pitch(), 68);
        assert_eq!(scale(Note::Gs, ShapeKind::Major, Hand::Left).start_pitch(), 44);
        assert_eq!(scale(Note::C, ShapeKind::Major, Hand::Right).end_pitch(), 84);
    }

    #[test]
    fn test_membership_is_periodic() {
        for kind in ShapeKind::ALL {
            let s = scale(Note::Ds, kind, Hand::Right);
            for p in 0..120 {
                assert_eq!(s.is_in_scale(p), s.is_in_scale(p + 12), "{} at {}", s, p);
            }
        }
    }

    #[test]
    fn test_c_major_membership() {
        let s = scale(Note::C, ShapeKind::Major, Hand::Right);
        assert!(s.is_in_scale(60));
        assert!(s.is_in_scale(62));
        assert!(!s.is_in_scale(61));
        assert_eq!(s.pitches(Direction::Ascending).len(), 15);
    }

    #[test]
    fn test_tonic_always_fingered() {
        for kind in ShapeKind::ALL {
            for hand in [Hand::Left, Hand::Right] {
                for tonic in Note::ALL {
                    let s = scale(tonic, kind, hand);
                    assert!(s.finger_assignment()[0].is_some(), "{} {:?}", s, hand);
                }
            }
        }
    }

    #[test]
    fn test_c_major_right_hand_fingers() {
        let s = scale(Note::C, ShapeKind::Major, Hand::Right);
        let fingers: Vec<Option<Finger>> = s
            .pitches(Direction::Ascending)
            .iter()
            .take(8)
            .map(|&p| s.finger_at(p))
            .collect();
        let expected: Vec<Option<Finger>> =
            [0, 1, 2, 0, 1, 2, 3, 0].iter().map(|&f| Some(f)).collect();
        assert_eq!(fingers, expected);
        assert_eq!(s.break_degree_index(), Some(2));
    }

    #[test]
    fn test_c_major_left_hand_fingers() {
        let s = scale(Note::C, ShapeKind::Major, Hand::Left);
        // C D E F G A B -> 1 4 3 2 1 3 2
        let by_offset: Vec<Option<Finger>> = [0u8, 2, 4, 5, 7, 9, 11]
            .iter()
            .map(|&o| s.finger_for_interval_offset(o))
            .collect();
        let expected: Vec<Option<Finger>> =
            [0, 3, 2, 1, 0, 2, 1].iter().map(|&f| Some(f)).collect();
        assert_eq!(by_offset, expected);
    }

    #[test]
    fn test_required_fingers_major() {
        let s = scale(Note::C, ShapeKind::Major, Hand::Right);
        let required: Vec<Pitch> = (60..72).filter(|&p| s.required_finger_at(p).is_some()).collect();
        // Tonic and the degree after the break (F)
        assert_eq!(required, vec![60, 65]);
        assert_eq!(s.required_finger_at(65), Some(0));
    }

    #[test]
    fn test_required_fingers_black_key_start() {
        let s = scale(Note::Gs, ShapeKind::Major, Hand::Right);
        assert_eq!(s.required_finger_at(68), Some(2));
        // Break after Eb, so F needs the thumb
        assert_eq!(s.required_finger_at(77), Some(0));
        assert_eq!(s.required_finger_at(72), None);
    }

    #[test]
    fn test_finger_at_matches_assignment() {
        for tonic in Note::ALL {
            for hand in [Hand::Left, Hand::Right] {
                for kind in [ShapeKind::Major, ShapeKind::HarmonicMinor, ShapeKind::MajorArpeggio] {
                    let s = scale(tonic, kind, hand);
                    for p in s.pitches(Direction::Ascending) {
                        let offset = pitch_class(p - s.start_pitch());
                        assert_eq!(s.finger_at(p), s.finger_for_interval_offset(offset));
                    }
                }
            }
        }
    }

    #[test]
    fn test_melodic_minor_descending_offsets_fingered() {
        let s = scale(Note::A, ShapeKind::MelodicMinor, Hand::Right);
        // F natural and G natural on the way down
        assert!(s.finger_for_interval_offset(8).is_some());
        assert!(s.finger_for_interval_offset(10).is_some());
        assert!(s.is_in_scale_for(s.start_pitch() + 8, Direction::Descending));
        assert!(!s.is_in_scale(s.start_pitch() + 8));
    }

    #[test]
    fn test_arpeggio_has_no_break() {
        let s = scale(Note::C, ShapeKind::MajorArpeggio, Hand::Right);
        assert_eq!(s.break_degree_index(), None);
        assert_eq!(s.required_finger_at(60), Some(0));
        assert_eq!(s.required_finger_at(64), None);
        assert_eq!(s.required_finger_at(67), None);
    }

    #[test]
    fn test_out_of_range_queries_return_none() {
        let s = scale(Note::C, ShapeKind::Major, Hand::Right);
        assert_eq!(s.required_finger_at(48), None);
        assert_eq!(s.finger_at(59), None);
        assert_eq!(s.degree_index_at(85), None);
        assert_eq!(s.finger_for_interval_offset(40), None);
    }

    #[test]
    fn test_scale_name() {
        let s = Scale::new(
            Key::new(Note::Gs, Mode::Minor, Accidental::Flat),
            ScaleShape::of(ShapeKind::HarmonicMinor),
            Hand::Right,
        );
        assert_eq!(s.name(), "A♭ Harmonic Minor");
    }
}
