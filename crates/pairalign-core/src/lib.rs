pub mod aligner;
pub mod alphabet;
pub mod paths;

mod align;
mod score;
mod trace;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    #[error("sequence byte {byte:#04x} at position {position} is not a letter")]
    InvalidSequence { byte: u8, position: usize },
    #[error("{0:?} is not a letter")]
    InvalidLetter(char),
    #[error("invalid {0} (not a number)")]
    InvalidScore(&'static str),
    #[error("gap scores are different")]
    GapScoresDiffer,
    #[error("using a substitution matrix")]
    UsingSubstitutionMatrix,
    #[error("using match/mismatch scores")]
    UsingMatchMismatch,
    #[error("using a gap score function")]
    UsingGapFunction,
    #[error("score for ({0}, {1}) specified more than once (substitution matrices are case-insensitive)")]
    DuplicatePair(char, char),
    #[error("gap function returned NaN for start {start}, length {length}")]
    GapFunction { start: usize, length: usize },
    #[error("number of optimal alignments is larger than {}", i64::MAX)]
    PathCountOverflow,
}

pub use aligner::{Aligner, Algorithm, GapFunction, GapScores, Mode};
pub use paths::PathGenerator;
