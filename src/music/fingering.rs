// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Fingering rules.
//!
//! Fingers are numbered 0 (thumb) to 4 (little finger). A scale is fingered
//! by walking its degrees in playing order: upwards from the tonic for the
//! right hand, downwards from the tonic for the left hand. The walk starts
//! on a pattern-specific finger, advances through the 0..=3 cycle, and
//! returns to the thumb once right after the break position.

use super::{Hand, Note, ScaleShape, ShapeKind};

/// Finger number (0 = thumb .. 4 = little finger)
pub type Finger = u8;

pub const THUMB: Finger = 0;
pub const LITTLE_FINGER: Finger = 4;

/// Fingers that take part in the automatic crossing cycle
const CYCLE_LEN: Finger = 4;

/// Get the display name of a finger
pub fn finger_name(finger: Finger) -> &'static str {
    match finger {
        0 => "Thumb",
        1 => "2nd Finger",
        2 => "3rd Finger",
        3 => "4th Finger",
        4 => "5th Finger",
        _ => "Unknown Finger",
    }
}

/// Finger choices in the order a prompt lists them for the given hand
pub fn finger_choices(hand: Hand) -> Vec<(Finger, &'static str)> {
    let mut choices: Vec<(Finger, &'static str)> =
        (THUMB..=LITTLE_FINGER).map(|f| (f, finger_name(f))).collect();
    if hand == Hand::Left {
        choices.reverse();
    }
    choices
}

/// Next finger by continuity. The little finger never continues a run, so
/// the cycle is 0 -> 1 -> 2 -> 3 -> 0.
pub fn next_finger(finger: Finger) -> Finger {
    if finger >= CYCLE_LEN - 1 {
        THUMB
    } else {
        finger + 1
    }
}

/// Starting finger and break position for a fingering walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerPattern {
    /// Finger on the tonic
    pub start_finger: Finger,
    /// Walk position after which the next degree is played with the thumb
    pub break_index: Option<usize>,
}

impl FingerPattern {
    /// Thumb start with the crossing after the third degree
    pub const WHITE_KEY: FingerPattern = FingerPattern {
        start_finger: THUMB,
        break_index: Some(2),
    };

    /// Pick the pattern for a tonic, shape and hand
    pub fn for_scale(tonic: Note, shape: &ScaleShape, hand: Hand) -> Self {
        if shape.is_arpeggio() {
            return FingerPattern {
                start_finger: THUMB,
                break_index: None,
            };
        }
        if shape.kind() == ShapeKind::Chromatic {
            return FingerPattern {
                start_finger: chromatic_finger(tonic.pitch_class(), true),
                break_index: None,
            };
        }
        if tonic.is_natural() {
            return FingerPattern::WHITE_KEY;
        }
        black_key_pattern(tonic, hand)
    }

    /// Walk positions that need an explicit finger choice from the player
    pub fn is_required_position(&self, position: usize, degree_count: usize) -> bool {
        if position == 0 {
            return true;
        }
        match self.break_index {
            Some(b) => b + 1 < degree_count && position == b + 1,
            None => false,
        }
    }

    /// Finger at a walk position, inferred by continuity from the tonic
    pub fn finger_at_position(&self, position: usize) -> Finger {
        let mut finger = self.start_finger;
        for step in 0..position {
            finger = if self.break_index == Some(step) {
                THUMB
            } else {
                next_finger(finger)
            };
        }
        finger
    }
}

/// Black-key tonics follow standard piano pedagogy rather than a rule
fn black_key_pattern(tonic: Note, hand: Hand) -> FingerPattern {
    let (start_finger, break_index) = match (hand, tonic) {
        (Hand::Right, Note::Cs) => (1, 1),
        (Hand::Right, Note::Ds) => (2, 0),
        (Hand::Right, Note::Fs) => (1, 5),
        (Hand::Right, Note::Gs) => (2, 4),
        (Hand::Right, Note::As) => (3, 3),
        (Hand::Left, Note::Fs) => (3, 3),
        (Hand::Left, _) => (2, 0),
        _ => return FingerPattern::WHITE_KEY,
    };
    FingerPattern {
        start_finger,
        break_index: Some(break_index),
    }
}

/// Chromatic fingering by key colour: thumb on white keys, third finger on
/// black keys, second finger on the upper of two adjacent white keys.
pub fn chromatic_finger(pitch_class: u8, is_tonic: bool) -> Finger {
    const WHITE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
    let pc = pitch_class % 12;
    if !WHITE.contains(&pc) {
        return 2;
    }
    let below = (pc + 11) % 12;
    if WHITE.contains(&below) && !is_tonic {
        1
    } else {
        THUMB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_finger_cycle() {
        assert_eq!(next_finger(0), 1);
        assert_eq!(next_finger(2), 3);
        assert_eq!(next_finger(3), 0);
        assert_eq!(next_finger(4), 0);
    }

    #[test]
    fn test_finger_names_and_choices() {
        assert_eq!(finger_name(0), "Thumb");
        assert_eq!(finger_name(4), "5th Finger");

        let right = finger_choices(Hand::Right);
        assert_eq!(right[0], (0, "Thumb"));
        let left = finger_choices(Hand::Left);
        assert_eq!(left[0], (4, "5th Finger"));
        assert_eq!(left.len(), 5);
    }

    #[test]
    fn test_white_key_pattern_positions() {
        let pattern = FingerPattern::WHITE_KEY;
        let fingers: Vec<Finger> = (0..8).map(|p| pattern.finger_at_position(p)).collect();
        // C major right hand: 1 2 3 1 2 3 4 1
        assert_eq!(fingers, vec![0, 1, 2, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_black_key_patterns_return_to_start() {
        let major = ScaleShape::of(ShapeKind::Major);
        for hand in [Hand::Left, Hand::Right] {
            for tonic in [Note::Cs, Note::Ds, Note::Fs, Note::Gs, Note::As] {
                let pattern = FingerPattern::for_scale(tonic, &major, hand);
                assert_eq!(
                    pattern.finger_at_position(7),
                    pattern.start_finger,
                    "{:?} {:?} does not close the octave",
                    hand,
                    tonic
                );
            }
        }
    }

    #[test]
    fn test_a_flat_right_hand() {
        let shape = ScaleShape::of(ShapeKind::Major);
        let pattern = FingerPattern::for_scale(Note::Gs, &shape, Hand::Right);
        let fingers: Vec<Finger> = (0..7).map(|p| pattern.finger_at_position(p)).collect();
        // Ab Bb C Db Eb F G -> 3 4 1 2 3 1 2
        assert_eq!(fingers, vec![2, 3, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_required_positions() {
        let pattern = FingerPattern::WHITE_KEY;
        let required: Vec<usize> = (0..7)
            .filter(|&p| pattern.is_required_position(p, 7))
            .collect();
        assert_eq!(required, vec![0, 3]);

        let arpeggio = FingerPattern::for_scale(
            Note::C,
            &ScaleShape::of(ShapeKind::MajorArpeggio),
            Hand::Right,
        );
        assert_eq!(arpeggio.break_index, None);
        assert!(!arpeggio.is_required_position(1, 3));
    }

    #[test]
    fn test_chromatic_finger() {
        assert_eq!(chromatic_finger(0, true), 0);
        assert_eq!(chromatic_finger(1, false), 2);
        assert_eq!(chromatic_finger(5, false), 1);
        assert_eq!(chromatic_finger(0, false), 1);
    }
}
