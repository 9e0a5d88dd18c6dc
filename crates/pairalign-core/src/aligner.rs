//! Scoring model and public alignment entry points.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::alphabet::{self, ALPHABET_SIZE};
use crate::paths::PathGenerator;
use crate::{align, score, AlignError};

/// Whether an alignment spans both entire sequences or only the best-scoring
/// pair of substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Global,
    Local,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Global => write!(f, "global"),
            Mode::Local => write!(f, "local"),
        }
    }
}

/// Recurrence family implied by the gap parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Linear gap costs (open == extend on every slot).
    NeedlemanWunschSmithWaterman,
    /// Affine gap costs, three DP states.
    Gotoh,
    /// Arbitrary gap-cost functions.
    WatermanSmithBeyer,
}

/// Gap cost callback: `(start index, gap length) -> score`.
///
/// The start index runs along the sequence that keeps its letters; the gap
/// length is 1-based. A NaN return aborts the alignment with
/// [`AlignError::GapFunction`].
pub type GapFunction = Rc<dyn Fn(usize, usize) -> f64>;

/// The twelve scalar gap parameters.
///
/// `target_*` scores apply to gaps in the target (the first sequence, spanned
/// by horizontal lattice edges); `query_*` to gaps in the query (vertical
/// edges). `left`/`right` variants apply to gaps hanging off the start or end
/// of the other sequence in global mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapScores {
    pub target_open: f64,
    pub target_extend: f64,
    pub target_left_open: f64,
    pub target_left_extend: f64,
    pub target_right_open: f64,
    pub target_right_extend: f64,
    pub query_open: f64,
    pub query_extend: f64,
    pub query_left_open: f64,
    pub query_left_extend: f64,
    pub query_right_open: f64,
    pub query_right_extend: f64,
}

impl Default for GapScores {
    fn default() -> Self {
        Self {
            target_open: 0.0,
            target_extend: 0.0,
            target_left_open: 0.0,
            target_left_extend: 0.0,
            target_right_open: 0.0,
            target_right_extend: 0.0,
            query_open: 0.0,
            query_extend: 0.0,
            query_left_open: 0.0,
            query_left_extend: 0.0,
            query_right_open: 0.0,
            query_right_extend: 0.0,
        }
    }
}

impl GapScores {
    fn slots(&self) -> [f64; 12] {
        [
            self.target_open,
            self.target_extend,
            self.target_left_open,
            self.target_left_extend,
            self.target_right_open,
            self.target_right_extend,
            self.query_open,
            self.query_extend,
            self.query_left_open,
            self.query_left_extend,
            self.query_right_open,
            self.query_right_extend,
        ]
    }
}

/// Pairwise sequence aligner.
///
/// Holds the full scoring model: mode, substitution scores, gap parameters
/// (scalars or cost functions) and the tie-breaking tolerance. The DP
/// recurrence is picked from the gap parameters on demand and cached until
/// the next parameter write.
#[derive(Clone)]
pub struct Aligner {
    pub(crate) mode: Mode,
    match_score: f64,
    mismatch_score: f64,
    pub(crate) epsilon: f64,
    pub(crate) gap: GapScores,
    pub(crate) target_gap_fn: Option<GapFunction>,
    pub(crate) query_gap_fn: Option<GapFunction>,
    pub(crate) substitution: [[f64; ALPHABET_SIZE]; ALPHABET_SIZE],
    letters: Option<[bool; ALPHABET_SIZE]>,
    algorithm: Cell<Option<Algorithm>>,
}

impl Default for Aligner {
    fn default() -> Self {
        let mut aligner = Self {
            mode: Mode::Global,
            match_score: 1.0,
            mismatch_score: 0.0,
            epsilon: 1e-6,
            gap: GapScores::default(),
            target_gap_fn: None,
            query_gap_fn: None,
            substitution: [[0.0; ALPHABET_SIZE]; ALPHABET_SIZE],
            letters: None,
            algorithm: Cell::new(None),
        };
        aligner.fill_shorthand();
        aligner
    }
}

impl Aligner {
    /// Create an aligner from a match/mismatch shorthand. The substitution
    /// diagonal is filled with `match_score` and the off-diagonals with
    /// `mismatch_score`; the wildcard letter `X` scores 0 against itself.
    pub fn new(match_score: f64, mismatch_score: f64) -> Result<Self, AlignError> {
        if match_score.is_nan() {
            return Err(AlignError::InvalidScore("match score"));
        }
        if mismatch_score.is_nan() {
            return Err(AlignError::InvalidScore("mismatch score"));
        }
        let mut aligner = Self::default();
        aligner.match_score = match_score;
        aligner.mismatch_score = mismatch_score;
        aligner.fill_shorthand();
        Ok(aligner)
    }

    fn fill_shorthand(&mut self) {
        for i in 0..ALPHABET_SIZE {
            self.substitution[i][i] = self.match_score;
            for j in 0..i {
                self.substitution[i][j] = self.mismatch_score;
                self.substitution[j][i] = self.mismatch_score;
            }
        }
        let x = ('X' as usize) - ('A' as usize);
        self.substitution[x][x] = 0.0;
    }

    fn invalidate(&mut self) {
        self.algorithm.set(None);
    }

    // ---------------------------------------------------------------
    // Mode, epsilon, match/mismatch
    // ---------------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.invalidate();
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<(), AlignError> {
        if epsilon.is_nan() {
            return Err(AlignError::InvalidScore("epsilon"));
        }
        self.epsilon = epsilon;
        self.invalidate();
        Ok(())
    }

    /// Match score of the shorthand model. Fails once a substitution matrix
    /// has been installed.
    pub fn match_score(&self) -> Result<f64, AlignError> {
        if self.letters.is_some() {
            return Err(AlignError::UsingSubstitutionMatrix);
        }
        Ok(self.match_score)
    }

    /// Set the match score, refilling the substitution diagonal and
    /// discarding any installed substitution matrix.
    pub fn set_match_score(&mut self, match_score: f64) -> Result<(), AlignError> {
        if match_score.is_nan() {
            return Err(AlignError::InvalidScore("match score"));
        }
        self.match_score = match_score;
        for i in 0..ALPHABET_SIZE {
            self.substitution[i][i] = match_score;
        }
        let x = ('X' as usize) - ('A' as usize);
        self.substitution[x][x] = 0.0;
        self.letters = None;
        self.invalidate();
        Ok(())
    }

    pub fn mismatch_score(&self) -> Result<f64, AlignError> {
        if self.letters.is_some() {
            return Err(AlignError::UsingSubstitutionMatrix);
        }
        Ok(self.mismatch_score)
    }

    /// Set the mismatch score, refilling the off-diagonals and discarding any
    /// installed substitution matrix. The wildcard letter `X` scores 0
    /// against every letter.
    pub fn set_mismatch_score(&mut self, mismatch_score: f64) -> Result<(), AlignError> {
        if mismatch_score.is_nan() {
            return Err(AlignError::InvalidScore("mismatch score"));
        }
        self.mismatch_score = mismatch_score;
        for i in 0..ALPHABET_SIZE {
            for j in 0..i {
                self.substitution[i][j] = mismatch_score;
                self.substitution[j][i] = mismatch_score;
            }
        }
        let x = ('X' as usize) - ('A' as usize);
        for j in 0..ALPHABET_SIZE {
            self.substitution[x][j] = 0.0;
            self.substitution[j][x] = 0.0;
        }
        self.letters = None;
        self.invalidate();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Substitution matrix
    // ---------------------------------------------------------------

    /// Install a letter-pair substitution mapping, replacing the
    /// match/mismatch shorthand.
    ///
    /// Pairs are case-insensitive; giving the same ordered pair twice is an
    /// error. The stored matrix is completed symmetrically, with 0 for pairs
    /// of in-use letters that appear in neither orientation.
    pub fn set_substitution_matrix<I>(&mut self, scores: I) -> Result<(), AlignError>
    where
        I: IntoIterator<Item = ((char, char), f64)>,
    {
        let mut matrix = [[0.0f64; ALPHABET_SIZE]; ALPHABET_SIZE];
        let mut given = [[false; ALPHABET_SIZE]; ALPHABET_SIZE];
        let mut letters = [false; ALPHABET_SIZE];
        for ((first, second), value) in scores {
            if value.is_nan() {
                return Err(AlignError::InvalidScore("substitution score"));
            }
            let i = alphabet::letter_index(first)?;
            let j = alphabet::letter_index(second)?;
            if given[i][j] {
                return Err(AlignError::DuplicatePair(
                    alphabet::index_letter(i),
                    alphabet::index_letter(j),
                ));
            }
            given[i][j] = true;
            matrix[i][j] = value;
            letters[i] = true;
            letters[j] = true;
        }
        for i in 0..ALPHABET_SIZE {
            for j in 0..ALPHABET_SIZE {
                if !letters[i] || !letters[j] {
                    continue;
                }
                self.substitution[i][j] = if given[i][j] {
                    matrix[i][j]
                } else if given[j][i] {
                    matrix[j][i]
                } else {
                    0.0
                };
            }
        }
        self.letters = Some(letters);
        self.invalidate();
        Ok(())
    }

    /// The installed substitution mapping over the in-use letters. Fails
    /// while the match/mismatch shorthand is active.
    pub fn substitution_matrix(&self) -> Result<BTreeMap<(char, char), f64>, AlignError> {
        let letters = self.letters.as_ref().ok_or(AlignError::UsingMatchMismatch)?;
        let mut matrix = BTreeMap::new();
        for i in 0..ALPHABET_SIZE {
            if !letters[i] {
                continue;
            }
            for j in 0..ALPHABET_SIZE {
                if !letters[j] {
                    continue;
                }
                matrix.insert(
                    (alphabet::index_letter(i), alphabet::index_letter(j)),
                    self.substitution[i][j],
                );
            }
        }
        Ok(matrix)
    }

    // ---------------------------------------------------------------
    // Gap parameters
    // ---------------------------------------------------------------

    pub fn gap_scores(&self) -> &GapScores {
        &self.gap
    }

    /// Replace all twelve gap scalars, dropping any gap-cost functions.
    pub fn set_gap_scores(&mut self, scores: GapScores) -> Result<(), AlignError> {
        if scores.slots().iter().any(|score| score.is_nan()) {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap = scores;
        self.target_gap_fn = None;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    fn common_value(&self, slots: &[f64]) -> Result<f64, AlignError> {
        if self.target_gap_fn.is_some() || self.query_gap_fn.is_some() {
            return Err(AlignError::UsingGapFunction);
        }
        let first = slots[0];
        if slots.iter().any(|&slot| slot != first) {
            return Err(AlignError::GapScoresDiffer);
        }
        Ok(first)
    }

    /// The single gap score shared by every slot, if they agree.
    pub fn gap_score(&self) -> Result<f64, AlignError> {
        self.common_value(&self.gap.slots())
    }

    /// Set every gap slot to one value, dropping any gap-cost functions.
    pub fn set_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap = GapScores {
            target_open: score,
            target_extend: score,
            target_left_open: score,
            target_left_extend: score,
            target_right_open: score,
            target_right_extend: score,
            query_open: score,
            query_extend: score,
            query_left_open: score,
            query_left_extend: score,
            query_right_open: score,
            query_right_extend: score,
        };
        self.target_gap_fn = None;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    /// The open score shared by the internal, left and right slots of both
    /// sequences, if they agree.
    pub fn open_gap_score(&self) -> Result<f64, AlignError> {
        self.common_value(&[
            self.gap.target_open,
            self.gap.target_left_open,
            self.gap.target_right_open,
            self.gap.query_open,
            self.gap.query_left_open,
            self.gap.query_right_open,
        ])
    }

    pub fn set_open_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap.target_open = score;
        self.gap.target_left_open = score;
        self.gap.target_right_open = score;
        self.gap.query_open = score;
        self.gap.query_left_open = score;
        self.gap.query_right_open = score;
        self.target_gap_fn = None;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    pub fn extend_gap_score(&self) -> Result<f64, AlignError> {
        self.common_value(&[
            self.gap.target_extend,
            self.gap.target_left_extend,
            self.gap.target_right_extend,
            self.gap.query_extend,
            self.gap.query_left_extend,
            self.gap.query_right_extend,
        ])
    }

    pub fn set_extend_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap.target_extend = score;
        self.gap.target_left_extend = score;
        self.gap.target_right_extend = score;
        self.gap.query_extend = score;
        self.gap.query_left_extend = score;
        self.gap.query_right_extend = score;
        self.target_gap_fn = None;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    /// The internal (non-edge) gap score of both sequences, if the covered
    /// slots agree.
    pub fn internal_gap_score(&self) -> Result<f64, AlignError> {
        self.common_value(&[
            self.gap.target_open,
            self.gap.target_extend,
            self.gap.query_open,
            self.gap.query_extend,
        ])
    }

    pub fn set_internal_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap.target_open = score;
        self.gap.target_extend = score;
        self.gap.query_open = score;
        self.gap.query_extend = score;
        self.target_gap_fn = None;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    /// The left/right edge gap score of both sequences, if the covered slots
    /// agree.
    pub fn end_gap_score(&self) -> Result<f64, AlignError> {
        self.common_value(&[
            self.gap.target_left_open,
            self.gap.target_left_extend,
            self.gap.target_right_open,
            self.gap.target_right_extend,
            self.gap.query_left_open,
            self.gap.query_left_extend,
            self.gap.query_right_open,
            self.gap.query_right_extend,
        ])
    }

    pub fn set_end_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap.target_left_open = score;
        self.gap.target_left_extend = score;
        self.gap.target_right_open = score;
        self.gap.target_right_extend = score;
        self.gap.query_left_open = score;
        self.gap.query_left_extend = score;
        self.gap.query_right_open = score;
        self.gap.query_right_extend = score;
        self.target_gap_fn = None;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    /// The gap score shared by all six target slots, if they agree.
    pub fn target_gap_score(&self) -> Result<f64, AlignError> {
        if self.target_gap_fn.is_some() {
            return Err(AlignError::UsingGapFunction);
        }
        let slots = [
            self.gap.target_open,
            self.gap.target_extend,
            self.gap.target_left_open,
            self.gap.target_left_extend,
            self.gap.target_right_open,
            self.gap.target_right_extend,
        ];
        let first = slots[0];
        if slots.iter().any(|&slot| slot != first) {
            return Err(AlignError::GapScoresDiffer);
        }
        Ok(first)
    }

    pub fn set_target_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap.target_open = score;
        self.gap.target_extend = score;
        self.gap.target_left_open = score;
        self.gap.target_left_extend = score;
        self.gap.target_right_open = score;
        self.gap.target_right_extend = score;
        self.target_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    /// The gap score shared by all six query slots, if they agree.
    pub fn query_gap_score(&self) -> Result<f64, AlignError> {
        if self.query_gap_fn.is_some() {
            return Err(AlignError::UsingGapFunction);
        }
        let slots = [
            self.gap.query_open,
            self.gap.query_extend,
            self.gap.query_left_open,
            self.gap.query_left_extend,
            self.gap.query_right_open,
            self.gap.query_right_extend,
        ];
        let first = slots[0];
        if slots.iter().any(|&slot| slot != first) {
            return Err(AlignError::GapScoresDiffer);
        }
        Ok(first)
    }

    pub fn set_query_gap_score(&mut self, score: f64) -> Result<(), AlignError> {
        if score.is_nan() {
            return Err(AlignError::InvalidScore("gap score"));
        }
        self.gap.query_open = score;
        self.gap.query_extend = score;
        self.gap.query_left_open = score;
        self.gap.query_left_extend = score;
        self.gap.query_right_open = score;
        self.gap.query_right_extend = score;
        self.query_gap_fn = None;
        self.invalidate();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Gap-cost functions
    // ---------------------------------------------------------------

    /// Install a gap-cost function for target gaps, replacing the affine
    /// scalars on that side.
    pub fn set_target_gap_function(&mut self, function: GapFunction) {
        self.target_gap_fn = Some(function);
        self.invalidate();
    }

    /// Install a gap-cost function for query gaps.
    pub fn set_query_gap_function(&mut self, function: GapFunction) {
        self.query_gap_fn = Some(function);
        self.invalidate();
    }

    /// Install one gap-cost function for both sides.
    pub fn set_gap_function(&mut self, function: GapFunction) {
        self.target_gap_fn = Some(function.clone());
        self.query_gap_fn = Some(function);
        self.invalidate();
    }

    /// Cost of a target gap of `length` starting at `start`, falling back to
    /// the affine scalars when no function is installed.
    pub(crate) fn target_gap_cost(&self, start: usize, length: usize) -> Result<f64, AlignError> {
        let value = match &self.target_gap_fn {
            Some(function) => function(start, length),
            None => self.gap.target_open + (length - 1) as f64 * self.gap.target_extend,
        };
        if value.is_nan() {
            return Err(AlignError::GapFunction { start, length });
        }
        Ok(value)
    }

    pub(crate) fn query_gap_cost(&self, start: usize, length: usize) -> Result<f64, AlignError> {
        let value = match &self.query_gap_fn {
            Some(function) => function(start, length),
            None => self.gap.query_open + (length - 1) as f64 * self.gap.query_extend,
        };
        if value.is_nan() {
            return Err(AlignError::GapFunction { start, length });
        }
        Ok(value)
    }

    // ---------------------------------------------------------------
    // Algorithm classification and dispatch
    // ---------------------------------------------------------------

    /// The recurrence family implied by the current gap parameters.
    pub fn algorithm(&self) -> Algorithm {
        if let Some(algorithm) = self.algorithm.get() {
            return algorithm;
        }
        let gap = &self.gap;
        let algorithm = if self.target_gap_fn.is_some() || self.query_gap_fn.is_some() {
            Algorithm::WatermanSmithBeyer
        } else if gap.target_open == gap.target_extend
            && gap.query_open == gap.query_extend
            && gap.target_left_open == gap.target_left_extend
            && gap.target_right_open == gap.target_right_extend
            && gap.query_left_open == gap.query_left_extend
            && gap.query_right_open == gap.query_right_extend
        {
            Algorithm::NeedlemanWunschSmithWaterman
        } else {
            Algorithm::Gotoh
        };
        self.algorithm.set(Some(algorithm));
        algorithm
    }

    /// Conventional name of the selected algorithm in the current mode.
    pub fn algorithm_name(&self) -> &'static str {
        match (self.algorithm(), self.mode) {
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Global) => "Needleman-Wunsch",
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Local) => "Smith-Waterman",
            (Algorithm::Gotoh, Mode::Global) => "Gotoh global alignment algorithm",
            (Algorithm::Gotoh, Mode::Local) => "Gotoh local alignment algorithm",
            (Algorithm::WatermanSmithBeyer, Mode::Global) => {
                "Waterman-Smith-Beyer global alignment algorithm"
            }
            (Algorithm::WatermanSmithBeyer, Mode::Local) => {
                "Waterman-Smith-Beyer local alignment algorithm"
            }
        }
    }

    /// Optimal alignment score of two sequences, without traceback.
    pub fn score(&self, target: &[u8], query: &[u8]) -> Result<f64, AlignError> {
        let a = alphabet::encode(target)?;
        let b = alphabet::encode(query)?;
        match (self.algorithm(), self.mode) {
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Global) => {
                Ok(score::needleman_wunsch(self, &a, &b))
            }
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Local) => {
                Ok(score::smith_waterman(self, &a, &b))
            }
            (Algorithm::Gotoh, Mode::Global) => Ok(score::gotoh_global(self, &a, &b)),
            (Algorithm::Gotoh, Mode::Local) => Ok(score::gotoh_local(self, &a, &b)),
            (Algorithm::WatermanSmithBeyer, Mode::Global) => {
                score::waterman_smith_beyer_global(self, &a, &b)
            }
            (Algorithm::WatermanSmithBeyer, Mode::Local) => {
                score::waterman_smith_beyer_local(self, &a, &b)
            }
        }
    }

    /// Optimal alignment score plus a lazy enumerator of every co-optimal
    /// alignment path.
    pub fn align(&self, target: &[u8], query: &[u8]) -> Result<(f64, PathGenerator), AlignError> {
        let a = alphabet::encode(target)?;
        let b = alphabet::encode(query)?;
        match (self.algorithm(), self.mode) {
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Global) => {
                Ok(align::needleman_wunsch(self, &a, &b))
            }
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Local) => {
                Ok(align::smith_waterman(self, &a, &b))
            }
            (Algorithm::Gotoh, Mode::Global) => Ok(align::gotoh_global(self, &a, &b)),
            (Algorithm::Gotoh, Mode::Local) => Ok(align::gotoh_local(self, &a, &b)),
            (Algorithm::WatermanSmithBeyer, Mode::Global) => {
                align::waterman_smith_beyer_global(self, &a, &b)
            }
            (Algorithm::WatermanSmithBeyer, Mode::Local) => {
                align::waterman_smith_beyer_local(self, &a, &b)
            }
        }
    }
}

impl fmt::Debug for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aligner")
            .field("mode", &self.mode)
            .field("match_score", &self.match_score)
            .field("mismatch_score", &self.mismatch_score)
            .field("epsilon", &self.epsilon)
            .field("gap", &self.gap)
            .field("target_gap_fn", &self.target_gap_fn.is_some())
            .field("query_gap_fn", &self.query_gap_fn.is_some())
            .field("substitution_matrix", &self.letters.is_some())
            .finish()
    }
}

impl fmt::Display for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pairwise sequence aligner with parameters")?;
        if self.letters.is_some() {
            writeln!(f, "  match/mismatch_score: <substitution matrix>")?;
        } else {
            writeln!(f, "  match_score: {:.6}", self.match_score)?;
            writeln!(f, "  mismatch_score: {:.6}", self.mismatch_score)?;
        }
        if self.target_gap_fn.is_some() {
            writeln!(f, "  target_gap_function: <function>")?;
        } else {
            writeln!(f, "  target_open_gap_score: {:.6}", self.gap.target_open)?;
            writeln!(f, "  target_extend_gap_score: {:.6}", self.gap.target_extend)?;
            writeln!(f, "  target_left_open_gap_score: {:.6}", self.gap.target_left_open)?;
            writeln!(
                f,
                "  target_left_extend_gap_score: {:.6}",
                self.gap.target_left_extend
            )?;
            writeln!(f, "  target_right_open_gap_score: {:.6}", self.gap.target_right_open)?;
            writeln!(
                f,
                "  target_right_extend_gap_score: {:.6}",
                self.gap.target_right_extend
            )?;
        }
        if self.query_gap_fn.is_some() {
            writeln!(f, "  query_gap_function: <function>")?;
        } else {
            writeln!(f, "  query_open_gap_score: {:.6}", self.gap.query_open)?;
            writeln!(f, "  query_extend_gap_score: {:.6}", self.gap.query_extend)?;
            writeln!(f, "  query_left_open_gap_score: {:.6}", self.gap.query_left_open)?;
            writeln!(f, "  query_left_extend_gap_score: {:.6}", self.gap.query_left_extend)?;
            writeln!(f, "  query_right_open_gap_score: {:.6}", self.gap.query_right_open)?;
            writeln!(
                f,
                "  query_right_extend_gap_score: {:.6}",
                self.gap.query_right_extend
            )?;
        }
        writeln!(f, "  mode: {}", self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification_is_linear() {
        let aligner = Aligner::default();
        assert_eq!(aligner.algorithm(), Algorithm::NeedlemanWunschSmithWaterman);
        assert_eq!(aligner.algorithm_name(), "Needleman-Wunsch");
    }

    #[test]
    fn test_affine_classification() {
        let mut aligner = Aligner::default();
        aligner.set_open_gap_score(-2.0).unwrap();
        aligner.set_extend_gap_score(-0.5).unwrap();
        assert_eq!(aligner.algorithm(), Algorithm::Gotoh);
        aligner.set_mode(Mode::Local);
        assert_eq!(aligner.algorithm_name(), "Gotoh local alignment algorithm");
    }

    #[test]
    fn test_gap_function_classification() {
        let mut aligner = Aligner::default();
        aligner.set_query_gap_function(Rc::new(|_, length| -(length as f64)));
        assert_eq!(aligner.algorithm(), Algorithm::WatermanSmithBeyer);
        // Writing a scalar on that side drops the function again.
        aligner.set_query_gap_score(-1.0).unwrap();
        assert_eq!(aligner.algorithm(), Algorithm::NeedlemanWunschSmithWaterman);
    }

    #[test]
    fn test_classification_invalidated_on_write() {
        let mut aligner = Aligner::default();
        assert_eq!(aligner.algorithm(), Algorithm::NeedlemanWunschSmithWaterman);
        let mut gap = *aligner.gap_scores();
        gap.query_open = -10.0;
        aligner.set_gap_scores(gap).unwrap();
        assert_eq!(aligner.algorithm(), Algorithm::Gotoh);
    }

    #[test]
    fn test_aggregate_getters_report_disagreement() {
        let mut aligner = Aligner::default();
        aligner.set_gap_score(-1.0).unwrap();
        assert_eq!(aligner.gap_score().unwrap(), -1.0);
        aligner.set_target_gap_score(-2.0).unwrap();
        assert_eq!(aligner.gap_score().unwrap_err(), AlignError::GapScoresDiffer);
        assert_eq!(aligner.target_gap_score().unwrap(), -2.0);
        assert_eq!(aligner.query_gap_score().unwrap(), -1.0);
    }

    #[test]
    fn test_gap_getters_fail_with_function_installed() {
        let mut aligner = Aligner::default();
        aligner.set_gap_function(Rc::new(|_, length| -2.0 * length as f64));
        assert_eq!(aligner.gap_score().unwrap_err(), AlignError::UsingGapFunction);
        assert_eq!(
            aligner.target_gap_score().unwrap_err(),
            AlignError::UsingGapFunction
        );
    }

    #[test]
    fn test_match_score_unavailable_with_matrix() {
        let mut aligner = Aligner::default();
        aligner
            .set_substitution_matrix([(('A', 'A'), 2.0), (('A', 'C'), -1.0), (('C', 'C'), 3.0)])
            .unwrap();
        assert_eq!(
            aligner.match_score().unwrap_err(),
            AlignError::UsingSubstitutionMatrix
        );
        // Setting the shorthand again clears the matrix.
        aligner.set_match_score(1.0).unwrap();
        assert_eq!(aligner.match_score().unwrap(), 1.0);
    }

    #[test]
    fn test_substitution_matrix_symmetric_completion() {
        let mut aligner = Aligner::default();
        aligner
            .set_substitution_matrix([(('a', 'c'), -5.0), (('C', 'C'), 3.0)])
            .unwrap();
        let matrix = aligner.substitution_matrix().unwrap();
        assert_eq!(matrix[&('A', 'C')], -5.0);
        assert_eq!(matrix[&('C', 'A')], -5.0);
        // Unspecified pair of in-use letters completes to 0.
        assert_eq!(matrix[&('A', 'A')], 0.0);
    }

    #[test]
    fn test_substitution_matrix_duplicate_pair() {
        let mut aligner = Aligner::default();
        let err = aligner
            .set_substitution_matrix([(('A', 'c'), 1.0), (('a', 'C'), 2.0)])
            .unwrap_err();
        assert_eq!(err, AlignError::DuplicatePair('A', 'C'));
    }

    #[test]
    fn test_nan_scores_rejected() {
        let mut aligner = Aligner::default();
        assert_eq!(
            aligner.set_match_score(f64::NAN).unwrap_err(),
            AlignError::InvalidScore("match score")
        );
        assert_eq!(
            aligner.set_gap_score(f64::NAN).unwrap_err(),
            AlignError::InvalidScore("gap score")
        );
    }

    #[test]
    fn test_wildcard_x_scores_zero() {
        let aligner = Aligner::new(5.0, -4.0).unwrap();
        let x = ('X' as usize) - ('A' as usize);
        assert_eq!(aligner.substitution[x][x], 0.0);
        assert_eq!(aligner.substitution[0][0], 5.0);
    }

    #[test]
    fn test_display_lists_parameters() {
        let aligner = Aligner::default();
        let text = aligner.to_string();
        assert!(text.starts_with("Pairwise sequence aligner with parameters"));
        assert!(text.contains("match_score: 1.000000"));
        assert!(text.contains("mode: global"));
    }

    #[test]
    fn test_gap_scores_serde_round_trip() {
        let mut gap = GapScores::default();
        gap.target_open = -10.0;
        gap.query_extend = -0.5;
        let json = serde_json::to_string(&gap).unwrap();
        let back: GapScores = serde_json::from_str(&json).unwrap();
        assert_eq!(back, gap);
        let mode: Mode = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(mode, Mode::Local);
    }
}
