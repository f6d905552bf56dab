// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Exam scoring.

use std::fmt;

/// Letter grade for an exam percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LetterGrade {
    F,
    CMinus,
    C,
    CPlus,
    BMinus,
    B,
    BPlus,
    AMinus,
    A,
    APlus,
}

impl LetterGrade {
    /// Grade breakpoints, best first
    const BREAKPOINTS: [(u32, LetterGrade); 9] = [
        (93, LetterGrade::APlus),
        (86, LetterGrade::A),
        (80, LetterGrade::AMinus),
        (73, LetterGrade::BPlus),
        (66, LetterGrade::B),
        (60, LetterGrade::BMinus),
        (53, LetterGrade::CPlus),
        (46, LetterGrade::C),
        (40, LetterGrade::CMinus),
    ];

    /// Grade for a percentage
    pub fn from_percent(percent: u32) -> Self {
        Self::BREAKPOINTS
            .iter()
            .find(|(min, _)| percent >= *min)
            .map(|&(_, grade)| grade)
            .unwrap_or(LetterGrade::F)
    }

    /// Letter as shown to the player
    pub fn as_str(self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::F => "F",
        }
    }

    /// Face shown next to the grade
    pub fn face(self) -> char {
        match self {
            LetterGrade::APlus | LetterGrade::A | LetterGrade::AMinus => '\u{1F60A}',
            LetterGrade::BPlus | LetterGrade::B | LetterGrade::BMinus => '\u{1F642}',
            LetterGrade::CPlus | LetterGrade::C | LetterGrade::CMinus => '\u{1F610}',
            LetterGrade::F => '\u{1F641}',
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tally computed once when an exam attempt ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamSummary {
    /// Scale notes graded correct
    pub correct_count: u32,
    /// Pressed notes that are not in the scale
    pub wrong_count: u32,
    /// Scale notes in the attempt window
    pub note_count: u32,
}

impl ExamSummary {
    /// Create a summary
    pub fn new(correct_count: u32, wrong_count: u32, note_count: u32) -> Self {
        Self {
            correct_count,
            wrong_count,
            note_count,
        }
    }

    /// Correct notes less wrong notes, never negative
    pub fn score(&self) -> u32 {
        self.correct_count.saturating_sub(self.wrong_count)
    }

    /// Score as a whole percentage of the scale notes
    pub fn percent(&self) -> u32 {
        if self.note_count == 0 {
            return 0;
        }
        self.score() * 100 / self.note_count
    }

    /// Letter grade
    pub fn grade(&self) -> LetterGrade {
        LetterGrade::from_percent(self.percent())
    }
}

impl fmt::Display for ExamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Grade {} {} ({}%, correct {}, wrong {}, of {})",
            self.grade(),
            self.grade().face(),
            self.percent(),
            self.correct_count,
            self.wrong_count,
            self.note_count
        )
    }
}
