//! Lazy, restartable enumeration of all co-optimal alignment paths.
//!
//! A [`PathGenerator`] owns the trace matrices filled by `Aligner::align` and
//! walks them on demand. Iteration yields each path as a run-length
//! compressed list of `(i, j)` lattice vertices; [`PathGenerator::len`]
//! counts all paths without enumerating them. Enumeration order is
//! deterministic: horizontal before vertical before diagonal predecessors,
//! and M before Ix before Iy for the three-state algorithms.

use crate::aligner::{Algorithm, Mode};
use crate::trace::{
    GapMatrices, GotohGaps, TraceMatrix, WsbGaps, DIAGONAL, DONE, ENDPOINT, HORIZONTAL, IX_MATRIX,
    IY_MATRIX, M_MATRIX, NONE, STARTPOINT, VERTICAL,
};
use crate::AlignError;

/// Sentinel for a path count past `i64::MAX`.
const COUNT_OVERFLOW: i64 = -1;

/// Saturating-to-sentinel addition for path counting.
fn safe_add(term: i64, sum: i64) -> i64 {
    if term == COUNT_OVERFLOW || sum == COUNT_OVERFLOW {
        return COUNT_OVERFLOW;
    }
    sum.checked_add(term).unwrap_or(COUNT_OVERFLOW)
}

/// Collect the path starting at `(i, j)` by following the stored `path`
/// edges, merging consecutive collinear vertices.
fn create_path(m: &TraceMatrix, mut i: usize, mut j: usize) -> Vec<(usize, usize)> {
    let mut points = Vec::new();
    let mut direction = 0u8;
    loop {
        let path = m.path(i, j);
        if path != direction {
            points.push((i, j));
            direction = path;
        }
        match path {
            HORIZONTAL => j += 1,
            VERTICAL => i += 1,
            DIAGONAL => {
                i += 1;
                j += 1;
            }
            _ => break,
        }
    }
    if points.is_empty() {
        // Zero-length alignment: keep the anchor vertex.
        points.push((i, j));
    }
    points
}

/// Stateful enumerator of every co-optimal alignment path.
///
/// `M[0][0].path` doubles as the status flag: 0 between paths, `DONE` once
/// exhausted, `NONE` when a local problem has no non-zero path. The generator
/// mutates the `path` fields while it walks, so it cannot be shared.
pub struct PathGenerator {
    pub(crate) m: TraceMatrix,
    pub(crate) gaps: GapMatrices,
    n_a: usize,
    n_b: usize,
    i_a: usize,
    i_b: usize,
    mode: Mode,
    algorithm: Algorithm,
    length: i64,
}

impl PathGenerator {
    /// Trace lattice for the linear-gap algorithm, edges pre-seeded.
    pub(crate) fn new_linear(n_a: usize, n_b: usize, mode: Mode) -> Self {
        let mut m = TraceMatrix::new(n_a, n_b);
        match mode {
            Mode::Global => {
                for i in 1..=n_a {
                    m.set_trace(i, 0, VERTICAL);
                }
                for j in 1..=n_b {
                    m.set_trace(0, j, HORIZONTAL);
                }
            }
            Mode::Local => {
                for i in 0..=n_a {
                    m.set_trace(i, 0, STARTPOINT);
                }
                for j in 1..=n_b {
                    m.set_trace(0, j, STARTPOINT);
                }
            }
        }
        Self {
            m,
            gaps: GapMatrices::None,
            n_a,
            n_b,
            i_a: 0,
            i_b: 0,
            mode,
            algorithm: Algorithm::NeedlemanWunschSmithWaterman,
            length: 0,
        }
    }

    /// Trace lattice plus Gotoh gap matrices, edges pre-seeded.
    pub(crate) fn new_gotoh(n_a: usize, n_b: usize, mode: Mode) -> Self {
        let mut m = TraceMatrix::new(n_a, n_b);
        let mut gaps = GotohGaps::new(n_a, n_b);
        match mode {
            Mode::Global => {
                for i in 1..=n_a {
                    gaps.set_ix(i, 0, IX_MATRIX);
                }
                if n_a >= 1 {
                    gaps.set_ix(1, 0, M_MATRIX);
                }
                for j in 1..=n_b {
                    gaps.set_iy(0, j, IY_MATRIX);
                }
                if n_b >= 1 {
                    gaps.set_iy(0, 1, M_MATRIX);
                }
            }
            Mode::Local => {
                for i in 0..=n_a {
                    m.set_trace(i, 0, STARTPOINT);
                }
                for j in 1..=n_b {
                    m.set_trace(0, j, STARTPOINT);
                }
            }
        }
        Self {
            m,
            gaps: GapMatrices::Gotoh(gaps),
            n_a,
            n_b,
            i_a: 0,
            i_b: 0,
            mode,
            algorithm: Algorithm::Gotoh,
            length: 0,
        }
    }

    /// Trace lattice plus Waterman-Smith-Beyer gap-length lists; the global
    /// edges hold their single full-length gap.
    pub(crate) fn new_waterman_smith_beyer(n_a: usize, n_b: usize, mode: Mode) -> Self {
        let mut m = TraceMatrix::new(n_a, n_b);
        let mut gaps = WsbGaps::new(n_a, n_b);
        match mode {
            Mode::Global => {
                for i in 1..=n_a {
                    gaps.cell_mut(i, 0).m_ix.push(i);
                }
                for j in 1..=n_b {
                    gaps.cell_mut(0, j).m_iy.push(j);
                }
            }
            Mode::Local => {
                for i in 0..=n_a {
                    m.set_trace(i, 0, STARTPOINT);
                }
                for j in 1..=n_b {
                    m.set_trace(0, j, STARTPOINT);
                }
            }
        }
        Self {
            m,
            gaps: GapMatrices::WatermanSmithBeyer(gaps),
            n_a,
            n_b,
            i_a: 0,
            i_b: 0,
            mode,
            algorithm: Algorithm::WatermanSmithBeyer,
            length: 0,
        }
    }

    /// Split borrow for the fill kernels.
    pub(crate) fn matrices_mut(&mut self) -> (&mut TraceMatrix, &mut GapMatrices) {
        (&mut self.m, &mut self.gaps)
    }

    /// Restore the pre-enumeration state, preserving ordering on the next
    /// full iteration.
    pub fn reset(&mut self) {
        if self.mode == Mode::Local {
            self.i_a = 0;
            self.i_b = 0;
        }
        match self.algorithm {
            Algorithm::NeedlemanWunschSmithWaterman | Algorithm::Gotoh => {
                if self.m.path(0, 0) != NONE {
                    self.m.set_path(0, 0, 0);
                }
            }
            Algorithm::WatermanSmithBeyer => self.m.set_path(0, 0, 0),
        }
    }

    /// The exact number of co-optimal paths, computed without enumeration
    /// and cached. Fails once the count exceeds `i64::MAX`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&mut self) -> Result<i64, AlignError> {
        if self.length == 0 {
            self.length = match (self.algorithm, self.mode) {
                (Algorithm::NeedlemanWunschSmithWaterman, Mode::Global) => {
                    self.length_needleman_wunsch()
                }
                (Algorithm::NeedlemanWunschSmithWaterman, Mode::Local) => {
                    self.length_smith_waterman()
                }
                (Algorithm::Gotoh, Mode::Global) => self.length_gotoh_global(),
                (Algorithm::Gotoh, Mode::Local) => self.length_gotoh_local(),
                (Algorithm::WatermanSmithBeyer, Mode::Global) => {
                    self.length_waterman_smith_beyer_global()
                }
                (Algorithm::WatermanSmithBeyer, Mode::Local) => {
                    self.length_waterman_smith_beyer_local()
                }
            };
        }
        if self.length == COUNT_OVERFLOW {
            return Err(AlignError::PathCountOverflow);
        }
        Ok(self.length)
    }

    // ---------------------------------------------------------------
    // Counting
    // ---------------------------------------------------------------

    fn length_needleman_wunsch(&self) -> i64 {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &self.m;
        let mut counts = vec![0i64; n_b + 1];
        counts[0] = 1;
        for j in 1..=n_b {
            let trace = m.trace(0, j);
            let mut count = 0;
            if trace & HORIZONTAL != 0 {
                count = safe_add(counts[j - 1], count);
            }
            counts[j] = count;
        }
        for i in 1..=n_a {
            let trace = m.trace(i, 0);
            let mut count = 0;
            if trace & VERTICAL != 0 {
                count = safe_add(counts[0], count);
            }
            let mut temp = counts[0];
            counts[0] = count;
            for j in 1..=n_b {
                let trace = m.trace(i, j);
                let mut count = 0;
                if trace & HORIZONTAL != 0 {
                    count = safe_add(counts[j - 1], count);
                }
                if trace & VERTICAL != 0 {
                    count = safe_add(counts[j], count);
                }
                if trace & DIAGONAL != 0 {
                    count = safe_add(temp, count);
                }
                temp = counts[j];
                counts[j] = count;
            }
        }
        counts[n_b]
    }

    fn length_smith_waterman(&self) -> i64 {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &self.m;
        let mut counts = vec![1i64; n_b + 1];
        let mut total = 0i64;
        for i in 1..=n_a {
            let mut temp = counts[0];
            counts[0] = 1;
            for j in 1..=n_b {
                let trace = m.trace(i, j);
                let mut count = 0;
                if trace & DIAGONAL != 0 {
                    count = safe_add(temp, count);
                }
                // Only alignments ending in a match column count here.
                if trace & ENDPOINT != 0 {
                    total = safe_add(count, total);
                }
                if trace & HORIZONTAL != 0 {
                    count = safe_add(counts[j - 1], count);
                }
                if trace & VERTICAL != 0 {
                    count = safe_add(counts[j], count);
                }
                temp = counts[j];
                if count == 0 && trace & STARTPOINT != 0 {
                    count = 1;
                }
                counts[j] = count;
            }
        }
        total
    }

    fn length_gotoh_global(&self) -> i64 {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &self.m;
        let GapMatrices::Gotoh(gaps) = &self.gaps else {
            unreachable!("Gotoh generator without Gotoh gap matrices");
        };
        let mut m_counts = vec![0i64; n_b + 1];
        let mut ix_counts = vec![0i64; n_b + 1];
        let mut iy_counts = vec![0i64; n_b + 1];
        m_counts[0] = 1;
        for j in 1..=n_b {
            iy_counts[j] = 1;
        }
        for i in 1..=n_a {
            let mut m_temp = m_counts[0];
            m_counts[0] = 0;
            let mut ix_temp = ix_counts[0];
            ix_counts[0] = 1;
            let mut iy_temp = iy_counts[0];
            iy_counts[0] = 0;
            for j in 1..=n_b {
                let trace = m.trace(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_temp, count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_temp, count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_temp, count);
                }
                m_temp = m_counts[j];
                m_counts[j] = count;
                let trace = gaps.ix(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_temp, count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_counts[j], count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_counts[j], count);
                }
                ix_temp = ix_counts[j];
                ix_counts[j] = count;
                let trace = gaps.iy(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_counts[j - 1], count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_counts[j - 1], count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_counts[j - 1], count);
                }
                iy_temp = iy_counts[j];
                iy_counts[j] = count;
            }
        }
        let mut count = 0;
        if self.m.trace(n_a, n_b) != 0 {
            count = safe_add(m_counts[n_b], count);
        }
        if gaps.ix(n_a, n_b) != 0 {
            count = safe_add(ix_counts[n_b], count);
        }
        if gaps.iy(n_a, n_b) != 0 {
            count = safe_add(iy_counts[n_b], count);
        }
        count
    }

    fn length_gotoh_local(&self) -> i64 {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &self.m;
        let GapMatrices::Gotoh(gaps) = &self.gaps else {
            unreachable!("Gotoh generator without Gotoh gap matrices");
        };
        let mut m_counts = vec![1i64; n_b + 1];
        let mut ix_counts = vec![0i64; n_b + 1];
        let mut iy_counts = vec![0i64; n_b + 1];
        let mut total = 0i64;
        for i in 1..=n_a {
            let mut m_temp = m_counts[0];
            m_counts[0] = 1;
            let mut ix_temp = ix_counts[0];
            ix_counts[0] = 0;
            let mut iy_temp = iy_counts[0];
            iy_counts[0] = 0;
            for j in 1..=n_b {
                let trace = m.trace(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_temp, count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_temp, count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_temp, count);
                }
                if count == 0 && trace & STARTPOINT != 0 {
                    count = 1;
                }
                m_temp = m_counts[j];
                m_counts[j] = count;
                if trace & ENDPOINT != 0 {
                    total = safe_add(count, total);
                }
                let trace = gaps.ix(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_temp, count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_counts[j], count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_counts[j], count);
                }
                ix_temp = ix_counts[j];
                ix_counts[j] = count;
                let trace = gaps.iy(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_counts[j - 1], count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_counts[j - 1], count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_counts[j - 1], count);
                }
                iy_temp = iy_counts[j];
                iy_counts[j] = count;
            }
        }
        total
    }

    fn length_waterman_smith_beyer_global(&self) -> i64 {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &self.m;
        let GapMatrices::WatermanSmithBeyer(gaps) = &self.gaps else {
            unreachable!("Waterman-Smith-Beyer generator without gap lists");
        };
        let cols = n_b + 1;
        let index = |i: usize, j: usize| i * cols + j;
        let mut m_count = vec![0i64; (n_a + 1) * cols];
        let mut ix_count = vec![0i64; (n_a + 1) * cols];
        let mut iy_count = vec![0i64; (n_a + 1) * cols];
        for i in 0..=n_a {
            for j in 0..=n_b {
                let trace = m.trace(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_count[index(i - 1, j - 1)], count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_count[index(i - 1, j - 1)], count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_count[index(i - 1, j - 1)], count);
                }
                if count == 0 {
                    count = 1;
                }
                m_count[index(i, j)] = count;
                let cell = gaps.cell(i, j);
                let mut count = 0;
                for &gap in &cell.m_ix {
                    count = safe_add(m_count[index(i - gap, j)], count);
                }
                for &gap in &cell.iy_ix {
                    count = safe_add(iy_count[index(i - gap, j)], count);
                }
                ix_count[index(i, j)] = count;
                let mut count = 0;
                for &gap in &cell.m_iy {
                    count = safe_add(m_count[index(i, j - gap)], count);
                }
                for &gap in &cell.ix_iy {
                    count = safe_add(ix_count[index(i, j - gap)], count);
                }
                iy_count[index(i, j)] = count;
            }
        }
        let mut count = 0;
        if m.trace(n_a, n_b) != 0 {
            count = safe_add(m_count[index(n_a, n_b)], count);
        }
        let corner = gaps.cell(n_a, n_b);
        if !corner.m_ix.is_empty() || !corner.iy_ix.is_empty() {
            count = safe_add(ix_count[index(n_a, n_b)], count);
        }
        if !corner.m_iy.is_empty() || !corner.ix_iy.is_empty() {
            count = safe_add(iy_count[index(n_a, n_b)], count);
        }
        count
    }

    fn length_waterman_smith_beyer_local(&self) -> i64 {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &self.m;
        let GapMatrices::WatermanSmithBeyer(gaps) = &self.gaps else {
            unreachable!("Waterman-Smith-Beyer generator without gap lists");
        };
        let cols = n_b + 1;
        let index = |i: usize, j: usize| i * cols + j;
        let mut m_count = vec![0i64; (n_a + 1) * cols];
        let mut ix_count = vec![0i64; (n_a + 1) * cols];
        let mut iy_count = vec![0i64; (n_a + 1) * cols];
        let mut total = 0i64;
        for i in 0..=n_a {
            for j in 0..=n_b {
                let trace = m.trace(i, j);
                let mut count = 0;
                if trace & M_MATRIX != 0 {
                    count = safe_add(m_count[index(i - 1, j - 1)], count);
                }
                if trace & IX_MATRIX != 0 {
                    count = safe_add(ix_count[index(i - 1, j - 1)], count);
                }
                if trace & IY_MATRIX != 0 {
                    count = safe_add(iy_count[index(i - 1, j - 1)], count);
                }
                if count == 0 && trace & STARTPOINT != 0 {
                    count = 1;
                }
                m_count[index(i, j)] = count;
                if trace & ENDPOINT != 0 {
                    total = safe_add(count, total);
                }
                let cell = gaps.cell(i, j);
                let mut count = 0;
                for &gap in &cell.m_ix {
                    count = safe_add(m_count[index(i - gap, j)], count);
                }
                for &gap in &cell.iy_ix {
                    count = safe_add(iy_count[index(i - gap, j)], count);
                }
                ix_count[index(i, j)] = count;
                let mut count = 0;
                for &gap in &cell.m_iy {
                    count = safe_add(m_count[index(i, j - gap)], count);
                }
                for &gap in &cell.ix_iy {
                    count = safe_add(ix_count[index(i, j - gap)], count);
                }
                iy_count[index(i, j)] = count;
            }
        }
        total
    }

    // ---------------------------------------------------------------
    // Enumeration
    // ---------------------------------------------------------------

    fn next_needleman_wunsch(&mut self) -> Option<Vec<(usize, usize)>> {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let m = &mut self.m;
        let mut i = 0usize;
        let mut j = 0usize;
        let mut path = m.path(0, 0);
        if path == DONE {
            return None;
        }
        if path == 0 {
            if n_a == 0 && n_b == 0 {
                // A pair of empty sequences has exactly one, empty, path.
                m.set_path(0, 0, DONE);
                return Some(vec![(0, 0)]);
            }
            i = n_a;
            j = n_b;
        } else {
            // Walk forward looking for the deepest cell with an alternative
            // predecessor; restart the traceback from there.
            loop {
                match path {
                    HORIZONTAL => {
                        j += 1;
                        let trace = m.trace(i, j);
                        if trace & VERTICAL != 0 {
                            i -= 1;
                            m.set_path(i, j, VERTICAL);
                            break;
                        }
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            m.set_path(i, j, DIAGONAL);
                            break;
                        }
                    }
                    VERTICAL => {
                        i += 1;
                        let trace = m.trace(i, j);
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            m.set_path(i, j, DIAGONAL);
                            break;
                        }
                    }
                    _ => {
                        i += 1;
                        j += 1;
                    }
                }
                path = m.path(i, j);
                if path == 0 {
                    // Reached the end without finding an alternative.
                    m.set_path(0, 0, DONE);
                    return None;
                }
            }
        }
        // Follow the traceback to the origin.
        loop {
            let trace = m.trace(i, j);
            if trace & HORIZONTAL != 0 {
                j -= 1;
                m.set_path(i, j, HORIZONTAL);
            } else if trace & VERTICAL != 0 {
                i -= 1;
                m.set_path(i, j, VERTICAL);
            } else if trace & DIAGONAL != 0 {
                i -= 1;
                j -= 1;
                m.set_path(i, j, DIAGONAL);
            } else {
                break;
            }
        }
        Some(create_path(m, 0, 0))
    }

    fn next_smith_waterman(&mut self) -> Option<Vec<(usize, usize)>> {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let status = self.m.path(0, 0);
        if status == DONE || status == NONE {
            return None;
        }
        let m = &mut self.m;
        let mut i = self.i_a;
        let mut j = self.i_b;
        let mut path = m.path(i, j);
        if path != 0 {
            loop {
                match path {
                    HORIZONTAL => {
                        j += 1;
                        let trace = m.trace(i, j);
                        if trace & VERTICAL != 0 {
                            i -= 1;
                            m.set_path(i, j, VERTICAL);
                            break;
                        }
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            m.set_path(i, j, DIAGONAL);
                            break;
                        }
                    }
                    VERTICAL => {
                        i += 1;
                        let trace = m.trace(i, j);
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            m.set_path(i, j, DIAGONAL);
                            break;
                        }
                    }
                    _ => {
                        i += 1;
                        j += 1;
                    }
                }
                path = m.path(i, j);
                if path == 0 {
                    break;
                }
            }
        }
        let mut trace;
        if path != 0 {
            trace = m.trace(i, j);
        } else {
            // Scan row-major for the next end point; paths may only end in
            // the match state.
            loop {
                if j < n_b {
                    j += 1;
                } else if i < n_a {
                    i += 1;
                    j = 0;
                } else {
                    m.set_path(0, 0, DONE);
                    return None;
                }
                trace = m.trace(i, j);
                if trace & ENDPOINT != 0 {
                    trace &= DIAGONAL;
                    break;
                }
            }
            m.set_path(i, j, 0);
        }
        loop {
            if trace & HORIZONTAL != 0 {
                j -= 1;
                m.set_path(i, j, HORIZONTAL);
            } else if trace & VERTICAL != 0 {
                i -= 1;
                m.set_path(i, j, VERTICAL);
            } else if trace & DIAGONAL != 0 {
                i -= 1;
                j -= 1;
                m.set_path(i, j, DIAGONAL);
            } else if trace & STARTPOINT != 0 {
                self.i_a = i;
                self.i_b = j;
                return Some(create_path(m, i, j));
            } else {
                unreachable!("inconsistent Smith-Waterman trace at ({i}, {j})");
            }
            trace = m.trace(i, j);
        }
    }

    fn next_gotoh_global(&mut self) -> Option<Vec<(usize, usize)>> {
        let n_a = self.n_a as isize;
        let n_b = self.n_b as isize;
        let PathGenerator { m, gaps, .. } = self;
        let GapMatrices::Gotoh(gaps) = &*gaps else {
            unreachable!("Gotoh generator without Gotoh gap matrices");
        };
        let mut i = 0isize;
        let mut j = 0isize;
        let mut m_state = M_MATRIX;
        let mut path = m.path(0, 0);
        let mut trace;
        if path == DONE {
            return None;
        }
        if path == 0 {
            i = n_a;
            j = n_b;
        } else {
            loop {
                path = m.path(i as usize, j as usize);
                if path == 0 {
                    m_state = match m_state {
                        M_MATRIX => IX_MATRIX,
                        IX_MATRIX => IY_MATRIX,
                        _ => 0,
                    };
                    break;
                }
                trace = match path {
                    HORIZONTAL => {
                        j += 1;
                        gaps.iy(i as usize, j as usize)
                    }
                    VERTICAL => {
                        i += 1;
                        gaps.ix(i as usize, j as usize)
                    }
                    _ => {
                        i += 1;
                        j += 1;
                        m.trace(i as usize, j as usize)
                    }
                };
                // Alternatives are probed in M, Ix, Iy order, continuing
                // from the matrix the previous path came through.
                let next_state = if m_state == M_MATRIX && trace & IX_MATRIX != 0 {
                    Some(IX_MATRIX)
                } else if m_state <= IX_MATRIX && trace & IY_MATRIX != 0 {
                    Some(IY_MATRIX)
                } else {
                    None
                };
                match next_state {
                    Some(state) => {
                        m_state = state;
                        match path {
                            HORIZONTAL => j -= 1,
                            VERTICAL => i -= 1,
                            _ => {
                                i -= 1;
                                j -= 1;
                            }
                        }
                        m.set_path(i as usize, j as usize, path);
                        break;
                    }
                    None => {
                        m_state = match path {
                            HORIZONTAL => IY_MATRIX,
                            VERTICAL => IX_MATRIX,
                            _ => M_MATRIX,
                        };
                    }
                }
            }
        }
        if path == 0 {
            // Pick the next end-state at the lattice corner.
            if m_state == M_MATRIX && m.trace(n_a as usize, n_b as usize) != 0 {
                // End in M.
            } else if m_state != 0
                && m_state <= IX_MATRIX
                && gaps.ix(n_a as usize, n_b as usize) != 0
            {
                m_state = IX_MATRIX;
            } else if m_state != 0
                && m_state <= IY_MATRIX
                && gaps.iy(n_a as usize, n_b as usize) != 0
            {
                m_state = IY_MATRIX;
            } else {
                m.set_path(0, 0, DONE);
                return None;
            }
            i = n_a;
            j = n_b;
        }
        match m_state {
            M_MATRIX => {
                trace = m.trace(i as usize, j as usize);
                path = DIAGONAL;
                i -= 1;
                j -= 1;
            }
            IX_MATRIX => {
                trace = gaps.ix(i as usize, j as usize);
                path = VERTICAL;
                i -= 1;
            }
            _ => {
                trace = gaps.iy(i as usize, j as usize);
                path = HORIZONTAL;
                j -= 1;
            }
        }
        loop {
            if trace & M_MATRIX != 0 {
                let next_trace = m.trace(i as usize, j as usize);
                m.set_path(i as usize, j as usize, path);
                trace = next_trace;
                path = DIAGONAL;
                i -= 1;
                j -= 1;
            } else if trace & IX_MATRIX != 0 {
                m.set_path(i as usize, j as usize, path);
                trace = gaps.ix(i as usize, j as usize);
                path = VERTICAL;
                i -= 1;
            } else if trace & IY_MATRIX != 0 {
                m.set_path(i as usize, j as usize, path);
                trace = gaps.iy(i as usize, j as usize);
                path = HORIZONTAL;
                j -= 1;
            } else {
                break;
            }
        }
        Some(create_path(m, 0, 0))
    }

    fn next_gotoh_local(&mut self) -> Option<Vec<(usize, usize)>> {
        let (n_a, n_b) = (self.n_a, self.n_b);
        if self.m.path(0, 0) == DONE {
            return None;
        }
        let mut i_a = self.i_a;
        let mut i_b = self.i_b;
        let PathGenerator { m, gaps, .. } = self;
        let GapMatrices::Gotoh(gaps) = &*gaps else {
            unreachable!("Gotoh generator without Gotoh gap matrices");
        };
        let mut m_state = M_MATRIX;
        let mut i = i_a;
        let mut j = i_b;
        let mut path = m.path(i_a, i_b);
        if path != 0 {
            loop {
                path = m.path(i, j);
                if path == 0 {
                    m_state = M_MATRIX;
                    i_a = i;
                    i_b = j;
                    break;
                }
                let trace = match path {
                    HORIZONTAL => {
                        j += 1;
                        gaps.iy(i, j)
                    }
                    VERTICAL => {
                        i += 1;
                        gaps.ix(i, j)
                    }
                    _ => {
                        i += 1;
                        j += 1;
                        m.trace(i, j)
                    }
                };
                let next_state = if m_state == M_MATRIX && trace & IX_MATRIX != 0 {
                    Some(IX_MATRIX)
                } else if m_state <= IX_MATRIX && trace & IY_MATRIX != 0 {
                    Some(IY_MATRIX)
                } else {
                    None
                };
                match next_state {
                    Some(state) => {
                        m_state = state;
                        match path {
                            HORIZONTAL => j -= 1,
                            VERTICAL => i -= 1,
                            _ => {
                                i -= 1;
                                j -= 1;
                            }
                        }
                        m.set_path(i, j, path);
                        break;
                    }
                    None => {
                        m_state = match path {
                            HORIZONTAL => IY_MATRIX,
                            VERTICAL => IX_MATRIX,
                            _ => M_MATRIX,
                        };
                    }
                }
            }
        }
        if path == 0 {
            // Find the next end point, row-major.
            loop {
                if i_b < n_b {
                    i_b += 1;
                } else if i_a < n_a {
                    i_a += 1;
                    i_b = 0;
                } else {
                    m.set_path(0, 0, DONE);
                    return None;
                }
                if m.trace(i_a, i_b) & ENDPOINT != 0 {
                    m.set_path(i_a, i_b, 0);
                    break;
                }
            }
            m_state = M_MATRIX;
            i = i_a;
            j = i_b;
        }
        loop {
            let trace = match m_state {
                M_MATRIX => m.trace(i, j),
                IX_MATRIX => gaps.ix(i, j),
                _ => gaps.iy(i, j),
            };
            if trace == STARTPOINT {
                self.i_a = i;
                self.i_b = j;
                return Some(create_path(m, i, j));
            }
            let next_state = if trace & M_MATRIX != 0 {
                M_MATRIX
            } else if trace & IX_MATRIX != 0 {
                IX_MATRIX
            } else if trace & IY_MATRIX != 0 {
                IY_MATRIX
            } else {
                unreachable!("inconsistent Gotoh trace at ({i}, {j})");
            };
            let step = match m_state {
                M_MATRIX => {
                    i -= 1;
                    j -= 1;
                    DIAGONAL
                }
                IX_MATRIX => {
                    i -= 1;
                    VERTICAL
                }
                _ => {
                    j -= 1;
                    HORIZONTAL
                }
            };
            m_state = next_state;
            m.set_path(i, j, step);
        }
    }

    fn next_waterman_smith_beyer_global(&mut self) -> Option<Vec<(usize, usize)>> {
        let (n_a, n_b) = (self.n_a, self.n_b);
        let PathGenerator { m, gaps, .. } = self;
        let GapMatrices::WatermanSmithBeyer(gaps) = &*gaps else {
            unreachable!("Waterman-Smith-Beyer generator without gap lists");
        };
        let mut i = 0usize;
        let mut j = 0usize;
        let mut m_state = M_MATRIX;
        let mut path = m.path(0, 0);
        if path == DONE {
            return None;
        }
        if path != 0 {
            'prune: loop {
                if path == 0 {
                    m_state <<= 1;
                    break 'prune;
                }
                // Identify the current segment: a full gap run or one
                // diagonal step.
                let (seg_a, seg_b) = match path {
                    HORIZONTAL => {
                        let mut end = j;
                        while m.path(i, end) == HORIZONTAL {
                            end += 1;
                        }
                        (i, end)
                    }
                    VERTICAL => {
                        let mut end = i;
                        while m.path(end, j) == VERTICAL {
                            end += 1;
                        }
                        (end, j)
                    }
                    _ => (i + 1, j + 1),
                };
                if i == seg_a {
                    // Horizontal gap of length seg_b - j ending at (i, seg_b).
                    let cell = gaps.cell(seg_a, seg_b);
                    if m_state == M_MATRIX {
                        let gap = seg_b - j;
                        let next = cell
                            .m_iy
                            .iter()
                            .position(|&g| g == gap)
                            .and_then(|p| cell.m_iy.get(p + 1))
                            .copied();
                        if let Some(gap) = next {
                            j = seg_b - gap;
                            let mut end = seg_b;
                            while j < end {
                                end -= 1;
                                m.set_path(i, end, HORIZONTAL);
                            }
                            break 'prune;
                        }
                    }
                    let from = if m_state == IX_MATRIX {
                        let gap = seg_b - j;
                        cell.ix_iy
                            .iter()
                            .position(|&g| g == gap)
                            .map_or(cell.ix_iy.len(), |p| p + 1)
                    } else {
                        0
                    };
                    if let Some(&gap) = cell.ix_iy.get(from) {
                        m_state = IX_MATRIX;
                        j = seg_b - gap;
                        let mut end = seg_b;
                        while j < end {
                            end -= 1;
                            m.set_path(i, end, HORIZONTAL);
                        }
                        break 'prune;
                    }
                    m_state = IY_MATRIX;
                    j = seg_b;
                } else if j == seg_b {
                    // Vertical gap of length seg_a - i ending at (seg_a, j).
                    let cell = gaps.cell(seg_a, seg_b);
                    if m_state == M_MATRIX {
                        let gap = seg_a - i;
                        let next = cell
                            .m_ix
                            .iter()
                            .position(|&g| g == gap)
                            .and_then(|p| cell.m_ix.get(p + 1))
                            .copied();
                        if let Some(gap) = next {
                            i = seg_a - gap;
                            let mut end = seg_a;
                            while i < end {
                                end -= 1;
                                m.set_path(end, j, VERTICAL);
                            }
                            break 'prune;
                        }
                    }
                    let from = if m_state == IY_MATRIX {
                        let gap = seg_a - i;
                        cell.iy_ix
                            .iter()
                            .position(|&g| g == gap)
                            .map_or(cell.iy_ix.len(), |p| p + 1)
                    } else {
                        0
                    };
                    if let Some(&gap) = cell.iy_ix.get(from) {
                        m_state = IY_MATRIX;
                        i = seg_a - gap;
                        let mut end = seg_a;
                        while i < end {
                            end -= 1;
                            m.set_path(end, j, VERTICAL);
                        }
                        break 'prune;
                    }
                    m_state = IX_MATRIX;
                    i = seg_a;
                } else {
                    // Diagonal step into (seg_a, seg_b).
                    i = seg_a - 1;
                    j = seg_b - 1;
                    let trace = m.trace(seg_a, seg_b);
                    let next_state = if m_state == M_MATRIX && trace & IX_MATRIX != 0 {
                        Some(IX_MATRIX)
                    } else if m_state <= IX_MATRIX && trace & IY_MATRIX != 0 {
                        Some(IY_MATRIX)
                    } else {
                        None
                    };
                    match next_state {
                        Some(state) => {
                            m_state = state;
                            m.set_path(i, j, DIAGONAL);
                            break 'prune;
                        }
                        None => {
                            m_state = M_MATRIX;
                            i = seg_a;
                            j = seg_b;
                            path = m.path(i, j);
                            continue 'prune;
                        }
                    }
                }
                path = m.path(i, j);
            }
        }
        if path == 0 {
            let corner = gaps.cell(n_a, n_b);
            if m_state == M_MATRIX && m.trace(n_a, n_b) != 0 {
                // End in M.
            } else if m_state != 0
                && m_state <= IX_MATRIX
                && (!corner.m_ix.is_empty() || !corner.iy_ix.is_empty())
            {
                m_state = IX_MATRIX;
            } else if m_state != 0
                && m_state <= IY_MATRIX
                && (!corner.m_iy.is_empty() || !corner.ix_iy.is_empty())
            {
                m_state = IY_MATRIX;
            } else {
                m.set_path(0, 0, DONE);
                return None;
            }
            i = n_a;
            j = n_b;
        }
        // Follow the traceback until we reach the origin.
        loop {
            match m_state {
                M_MATRIX => {
                    let trace = m.trace(i, j);
                    if trace & M_MATRIX != 0 {
                        m_state = M_MATRIX;
                    } else if trace & IX_MATRIX != 0 {
                        m_state = IX_MATRIX;
                    } else if trace & IY_MATRIX != 0 {
                        m_state = IY_MATRIX;
                    } else {
                        return Some(create_path(m, i, j));
                    }
                    i -= 1;
                    j -= 1;
                    m.set_path(i, j, DIAGONAL);
                }
                IX_MATRIX => {
                    let cell = gaps.cell(i, j);
                    let gap;
                    if let Some(&first) = cell.m_ix.first() {
                        gap = first;
                        m_state = M_MATRIX;
                    } else {
                        gap = cell.iy_ix.first().copied().unwrap_or(0);
                        m_state = IY_MATRIX;
                    }
                    let landing = i - gap;
                    while i > landing {
                        i -= 1;
                        m.set_path(i, j, VERTICAL);
                    }
                    m.set_path(i, j, VERTICAL);
                }
                _ => {
                    let cell = gaps.cell(i, j);
                    let gap;
                    if let Some(&first) = cell.m_iy.first() {
                        gap = first;
                        m_state = M_MATRIX;
                    } else {
                        gap = cell.ix_iy.first().copied().unwrap_or(0);
                        m_state = IX_MATRIX;
                    }
                    let landing = j - gap;
                    while j > landing {
                        j -= 1;
                        m.set_path(i, j, HORIZONTAL);
                    }
                    m.set_path(i, j, HORIZONTAL);
                }
            }
        }
    }

    fn next_waterman_smith_beyer_local(&mut self) -> Option<Vec<(usize, usize)>> {
        let (n_a, n_b) = (self.n_a, self.n_b);
        if self.m.path(0, 0) == DONE {
            return None;
        }
        let mut i_a = self.i_a;
        let mut i_b = self.i_b;
        let PathGenerator { m, gaps, .. } = self;
        let GapMatrices::WatermanSmithBeyer(gaps) = &*gaps else {
            unreachable!("Waterman-Smith-Beyer generator without gap lists");
        };
        let mut m_state = 0u8;
        let mut i = i_a;
        let mut j = i_b;
        if m.path(i_a, i_b) != 0 {
            m_state = M_MATRIX;
            'prune: loop {
                let path = m.path(i, j);
                let (seg_a, seg_b) = match path {
                    HORIZONTAL => {
                        let mut end = j;
                        while m.path(i, end) == HORIZONTAL {
                            end += 1;
                        }
                        (i, end)
                    }
                    VERTICAL => {
                        let mut end = i;
                        while m.path(end, j) == VERTICAL {
                            end += 1;
                        }
                        (end, j)
                    }
                    DIAGONAL => (i + 1, j + 1),
                    _ => {
                        // End of the previous path; scan for a fresh end
                        // point from here.
                        m_state = 0;
                        i_a = i;
                        i_b = j;
                        break 'prune;
                    }
                };
                if i == seg_a {
                    let cell = gaps.cell(seg_a, seg_b);
                    if m_state == M_MATRIX {
                        let gap = seg_b - j;
                        let next = cell
                            .m_iy
                            .iter()
                            .position(|&g| g == gap)
                            .and_then(|p| cell.m_iy.get(p + 1))
                            .copied();
                        if let Some(gap) = next {
                            j = seg_b - gap;
                            let mut end = seg_b;
                            while j < end {
                                end -= 1;
                                m.set_path(i, end, HORIZONTAL);
                            }
                            break 'prune;
                        }
                    }
                    let from = if m_state == IX_MATRIX {
                        let gap = seg_b - j;
                        cell.ix_iy
                            .iter()
                            .position(|&g| g == gap)
                            .map_or(cell.ix_iy.len(), |p| p + 1)
                    } else {
                        0
                    };
                    if let Some(&gap) = cell.ix_iy.get(from) {
                        m_state = IX_MATRIX;
                        j = seg_b - gap;
                        m.set_path(i, j, HORIZONTAL);
                        let mut end = seg_b;
                        while end > j {
                            end -= 1;
                            m.set_path(i, end, HORIZONTAL);
                        }
                        break 'prune;
                    }
                    m_state = IY_MATRIX;
                    j = seg_b;
                } else if j == seg_b {
                    let cell = gaps.cell(seg_a, seg_b);
                    if m_state == M_MATRIX {
                        let gap = seg_a - i;
                        let next = cell
                            .m_ix
                            .iter()
                            .position(|&g| g == gap)
                            .and_then(|p| cell.m_ix.get(p + 1))
                            .copied();
                        if let Some(gap) = next {
                            i = seg_a - gap;
                            let mut end = seg_a;
                            while i < end {
                                end -= 1;
                                m.set_path(end, j, VERTICAL);
                            }
                            break 'prune;
                        }
                    }
                    let from = if m_state == IY_MATRIX {
                        let gap = seg_a - i;
                        cell.iy_ix
                            .iter()
                            .position(|&g| g == gap)
                            .map_or(cell.iy_ix.len(), |p| p + 1)
                    } else {
                        0
                    };
                    if let Some(&gap) = cell.iy_ix.get(from) {
                        m_state = IY_MATRIX;
                        i = seg_a - gap;
                        m.set_path(i, j, VERTICAL);
                        let mut end = seg_a;
                        while end > i {
                            end -= 1;
                            m.set_path(end, j, VERTICAL);
                        }
                        break 'prune;
                    }
                    m_state = IX_MATRIX;
                    i = seg_a;
                } else {
                    i = seg_a - 1;
                    j = seg_b - 1;
                    let trace = m.trace(seg_a, seg_b);
                    let next_state = if m_state == M_MATRIX && trace & IX_MATRIX != 0 {
                        Some(IX_MATRIX)
                    } else if m_state <= IX_MATRIX && trace & IY_MATRIX != 0 {
                        Some(IY_MATRIX)
                    } else {
                        None
                    };
                    match next_state {
                        Some(state) => {
                            m_state = state;
                            m.set_path(i, j, DIAGONAL);
                            break 'prune;
                        }
                        None => {
                            m_state = M_MATRIX;
                            i = seg_a;
                            j = seg_b;
                        }
                    }
                }
            }
        }
        if m_state == 0 {
            loop {
                if i_b < n_b {
                    i_b += 1;
                } else if i_a < n_a {
                    i_a += 1;
                    i_b = 0;
                } else {
                    m.set_path(0, 0, DONE);
                    return None;
                }
                if m.trace(i_a, i_b) & ENDPOINT != 0 {
                    break;
                }
            }
            m.set_path(i_a, i_b, 0);
            m_state = M_MATRIX;
            i = i_a;
            j = i_b;
        }
        loop {
            match m_state {
                IX_MATRIX => {
                    let cell = gaps.cell(i, j);
                    let gap;
                    if let Some(&first) = cell.m_ix.first() {
                        gap = first;
                        m_state = M_MATRIX;
                    } else {
                        gap = cell.iy_ix.first().copied().unwrap_or(0);
                        m_state = IY_MATRIX;
                    }
                    let landing = i - gap;
                    while i > landing {
                        i -= 1;
                        m.set_path(i, j, VERTICAL);
                    }
                }
                IY_MATRIX => {
                    let cell = gaps.cell(i, j);
                    let gap;
                    if let Some(&first) = cell.m_iy.first() {
                        gap = first;
                        m_state = M_MATRIX;
                    } else {
                        gap = cell.ix_iy.first().copied().unwrap_or(0);
                        m_state = IX_MATRIX;
                    }
                    let landing = j - gap;
                    while j > landing {
                        j -= 1;
                        m.set_path(i, j, HORIZONTAL);
                    }
                }
                _ => {
                    let trace = m.trace(i, j);
                    if trace & M_MATRIX != 0 {
                        m_state = M_MATRIX;
                    } else if trace & IX_MATRIX != 0 {
                        m_state = IX_MATRIX;
                    } else if trace & IY_MATRIX != 0 {
                        m_state = IY_MATRIX;
                    } else if trace == STARTPOINT {
                        self.i_a = i;
                        self.i_b = j;
                        return Some(create_path(m, i, j));
                    } else {
                        unreachable!("inconsistent Waterman-Smith-Beyer trace at ({i}, {j})");
                    }
                    i -= 1;
                    j -= 1;
                    m.set_path(i, j, DIAGONAL);
                }
            }
        }
    }
}

impl Iterator for PathGenerator {
    type Item = Vec<(usize, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.algorithm, self.mode) {
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Global) => {
                self.next_needleman_wunsch()
            }
            (Algorithm::NeedlemanWunschSmithWaterman, Mode::Local) => self.next_smith_waterman(),
            (Algorithm::Gotoh, Mode::Global) => self.next_gotoh_global(),
            (Algorithm::Gotoh, Mode::Local) => self.next_gotoh_local(),
            (Algorithm::WatermanSmithBeyer, Mode::Global) => {
                self.next_waterman_smith_beyer_global()
            }
            (Algorithm::WatermanSmithBeyer, Mode::Local) => {
                self.next_waterman_smith_beyer_local()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_add_saturates_to_sentinel() {
        assert_eq!(safe_add(2, 3), 5);
        assert_eq!(safe_add(1, i64::MAX), COUNT_OVERFLOW);
        assert_eq!(safe_add(COUNT_OVERFLOW, 1), COUNT_OVERFLOW);
        assert_eq!(safe_add(1, COUNT_OVERFLOW), COUNT_OVERFLOW);
    }

    #[test]
    fn test_create_path_merges_collinear_runs() {
        let mut m = TraceMatrix::new(3, 2);
        m.set_path(0, 0, DIAGONAL);
        m.set_path(1, 1, VERTICAL);
        m.set_path(2, 1, VERTICAL);
        m.set_path(3, 1, HORIZONTAL);
        m.set_path(3, 2, 0);
        assert_eq!(
            create_path(&m, 0, 0),
            vec![(0, 0), (1, 1), (3, 1), (3, 2)]
        );
    }

    #[test]
    fn test_create_path_zero_length() {
        let m = TraceMatrix::new(0, 0);
        assert_eq!(create_path(&m, 0, 0), vec![(0, 0)]);
    }
}
