//! Trace-filling DP kernels and the local-mode traceback pruner.
//!
//! These kernels mirror the score-only ones but keep every co-optimal
//! predecessor per cell: a candidate strictly better than the running best
//! (beyond epsilon) replaces the trace, one within epsilon is OR-ed in.
//! Local kernels additionally maintain ENDPOINT marks for the running
//! maximum and STARTPOINT marks for clamped cells, then prune traces that
//! cannot be reached from any start point.

use crate::aligner::{Aligner, Mode};
use crate::paths::PathGenerator;
use crate::score::{max3, NEG_MAX};
use crate::trace::{
    GapMatrices, TraceMatrix, WsbGapCell, DIAGONAL, DONE, ENDPOINT, HORIZONTAL, IX_MATRIX,
    IY_MATRIX, M_MATRIX, NONE, STARTPOINT, VERTICAL,
};
use crate::AlignError;

/// Fold one candidate into the running (score, trace) pair.
#[inline]
fn select(score: &mut f64, trace: &mut u8, candidate: f64, bit: u8, epsilon: f64) {
    if candidate > *score + epsilon {
        *score = candidate;
        *trace = bit;
    } else if candidate > *score - epsilon {
        *trace |= bit;
    }
}

/// Fold one gap length into the running Waterman-Smith-Beyer gap lists.
/// A strictly better candidate resets both lists.
#[inline]
fn select_gap(
    score: &mut f64,
    gap: usize,
    candidate_m: f64,
    candidate_xy: f64,
    epsilon: f64,
    list_m: &mut Vec<usize>,
    list_xy: &mut Vec<usize>,
) {
    if candidate_m > *score - epsilon {
        if candidate_m > *score + epsilon {
            *score = candidate_m;
            list_m.clear();
            list_xy.clear();
        }
        list_m.push(gap);
    }
    if candidate_xy > *score - epsilon {
        if candidate_xy > *score + epsilon {
            *score = candidate_xy;
            list_m.clear();
            list_xy.clear();
        }
        list_xy.push(gap);
    }
}

/// Clear ENDPOINT marks from the cursor up to (but not including) `(i, j)`,
/// row-major, then park the cursor there. The cursor resumes where the last
/// strict improvement left it.
fn clear_endpoints(
    m: &mut TraceMatrix,
    cursor: &mut (usize, usize),
    i: usize,
    j: usize,
    n_b: usize,
) {
    let (mut im, mut jm) = *cursor;
    while im < i {
        while jm <= n_b {
            m.clear_trace(im, jm, ENDPOINT);
            jm += 1;
        }
        im += 1;
        jm = 0;
    }
    while jm < j {
        m.clear_trace(im, jm, ENDPOINT);
        jm += 1;
    }
    *cursor = (i, j);
}

/// Needleman-Wunsch with traceback, global.
pub(crate) fn needleman_wunsch(al: &Aligner, a: &[u8], b: &[u8]) -> (f64, PathGenerator) {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;
    let epsilon = al.epsilon;
    let mut paths = PathGenerator::new_linear(n_a, n_b, Mode::Global);
    let (m, _) = paths.matrices_mut();

    let mut scores = vec![0.0f64; n_b + 1];
    for (j, slot) in scores.iter_mut().enumerate() {
        *slot = j as f64 * g.target_left_extend;
    }
    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        let hgap = if i == n_a { g.target_right_extend } else { g.target_extend };
        let mut temp = scores[0];
        scores[0] = i as f64 * g.query_left_extend;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let vgap = if j == n_b { g.query_right_extend } else { g.query_extend };
            let mut score = temp + al.substitution[k_a][k_b];
            let mut trace = DIAGONAL;
            select(&mut score, &mut trace, scores[j - 1] + hgap, HORIZONTAL, epsilon);
            select(&mut score, &mut trace, scores[j] + vgap, VERTICAL, epsilon);
            temp = scores[j];
            scores[j] = score;
            m.set_trace(i, j, trace);
        }
    }
    m.set_path(n_a, n_b, 0);
    (scores[n_b], paths)
}

/// Smith-Waterman with traceback, local. Last-row/column cells only admit
/// the diagonal candidate.
pub(crate) fn smith_waterman(al: &Aligner, a: &[u8], b: &[u8]) -> (f64, PathGenerator) {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;
    let epsilon = al.epsilon;
    let mut paths = PathGenerator::new_linear(n_a, n_b, Mode::Local);
    let (m, _) = paths.matrices_mut();

    let mut maximum = 0.0f64;
    let mut cursor = (n_a, n_b);
    let mut scores = vec![0.0f64; n_b + 1];
    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        let mut temp = 0.0f64;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let mut score = temp + al.substitution[k_a][k_b];
            let mut trace = DIAGONAL;
            let interior = i < n_a && j < n_b;
            if interior {
                select(&mut score, &mut trace, scores[j - 1] + g.target_extend, HORIZONTAL, epsilon);
                select(&mut score, &mut trace, scores[j] + g.query_extend, VERTICAL, epsilon);
            }
            if score < epsilon {
                score = 0.0;
                if interior {
                    trace = STARTPOINT;
                }
            } else if trace & DIAGONAL != 0 && score > maximum - epsilon {
                if score > maximum + epsilon {
                    clear_endpoints(m, &mut cursor, i, j, n_b);
                }
                trace |= ENDPOINT;
            }
            m.set_trace(i, j, trace);
            if score > maximum {
                maximum = score;
            }
            temp = scores[j];
            scores[j] = score;
        }
    }

    // Zero-score extensions past an ENDPOINT are not allowed; drop traces
    // into unreachable cells, using `path` as the reachability mark.
    for j in 0..=n_b {
        m.set_path(0, j, 1);
    }
    for i in 1..=n_a {
        m.set_path(i, 0, 1);
        for j in 1..=n_b {
            let mut trace = m.trace(i, j);
            if m.path(i - 1, j - 1) == 0 {
                trace &= !DIAGONAL;
            }
            if m.path(i, j - 1) == 0 {
                trace &= !HORIZONTAL;
            }
            if m.path(i - 1, j) == 0 {
                trace &= !VERTICAL;
            }
            if trace & (STARTPOINT | HORIZONTAL | VERTICAL | DIAGONAL) != 0 {
                if trace & ENDPOINT != 0 {
                    m.set_path(i, j, 0);
                } else {
                    m.set_path(i, j, 1);
                }
            } else {
                m.set_path(i, j, 0);
                trace = 0;
            }
            m.set_trace(i, j, trace);
        }
    }
    if maximum == 0.0 {
        m.set_path(0, 0, NONE);
    } else {
        m.set_path(0, 0, 0);
    }
    (maximum, paths)
}

/// Gotoh with traceback, global.
pub(crate) fn gotoh_global(al: &Aligner, a: &[u8], b: &[u8]) -> (f64, PathGenerator) {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;
    let epsilon = al.epsilon;
    let mut paths = PathGenerator::new_gotoh(n_a, n_b, Mode::Global);
    let (m, gaps) = paths.matrices_mut();
    let GapMatrices::Gotoh(gaps) = gaps else {
        unreachable!("Gotoh generator without Gotoh gap matrices");
    };

    let mut m_scores = vec![NEG_MAX; n_b + 1];
    let mut ix_scores = vec![NEG_MAX; n_b + 1];
    let mut iy_scores = vec![NEG_MAX; n_b + 1];
    m_scores[0] = 0.0;
    for j in 1..=n_b {
        iy_scores[j] = g.target_left_open + g.target_left_extend * (j - 1) as f64;
    }
    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        let (open_a, extend_a) = if i == n_a {
            (g.target_right_open, g.target_right_extend)
        } else {
            (g.target_open, g.target_extend)
        };
        let mut m_temp = m_scores[0];
        let mut ix_temp = ix_scores[0];
        let mut iy_temp = iy_scores[0];
        m_scores[0] = NEG_MAX;
        ix_scores[0] = g.query_left_open + g.query_left_extend * (i - 1) as f64;
        iy_scores[0] = NEG_MAX;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let (open_b, extend_b) = if j == n_b {
                (g.query_right_open, g.query_right_extend)
            } else {
                (g.query_open, g.query_extend)
            };
            let mut score = m_temp;
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_temp, IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_temp, IY_MATRIX, epsilon);
            m.set_trace(i, j, trace);
            m_temp = m_scores[j];
            m_scores[j] = score + al.substitution[k_a][k_b];

            let mut score = m_temp + open_b;
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_scores[j] + extend_b, IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_scores[j] + open_b, IY_MATRIX, epsilon);
            gaps.set_ix(i, j, trace);
            ix_temp = ix_scores[j];
            ix_scores[j] = score;

            let mut score = m_scores[j - 1] + open_a;
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_scores[j - 1] + open_a, IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_scores[j - 1] + extend_a, IY_MATRIX, epsilon);
            gaps.set_iy(i, j, trace);
            iy_temp = iy_scores[j];
            iy_scores[j] = score;
        }
    }
    m.set_path(n_a, n_b, 0);

    // Only the end states within epsilon of the optimum may seed a path.
    let score = max3(m_scores[n_b], ix_scores[n_b], iy_scores[n_b]);
    if m_scores[n_b] < score - epsilon {
        m.set_trace(n_a, n_b, 0);
    }
    if ix_scores[n_b] < score - epsilon {
        gaps.set_ix(n_a, n_b, 0);
    }
    if iy_scores[n_b] < score - epsilon {
        gaps.set_iy(n_a, n_b, 0);
    }
    (score, paths)
}

/// Gotoh with traceback, local. The rightmost column and bottom row have
/// their gap states zeroed, so no alignment there ends in a gap.
pub(crate) fn gotoh_local(al: &Aligner, a: &[u8], b: &[u8]) -> (f64, PathGenerator) {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;
    let epsilon = al.epsilon;
    let mut paths = PathGenerator::new_gotoh(n_a, n_b, Mode::Local);
    let (m, gaps) = paths.matrices_mut();
    let GapMatrices::Gotoh(gaps) = gaps else {
        unreachable!("Gotoh generator without Gotoh gap matrices");
    };

    let mut maximum = 0.0f64;
    let mut cursor = (n_a, n_b);
    if n_a > 0 && n_b > 0 {
        let mut m_scores = vec![0.0f64; n_b + 1];
        let mut ix_scores = vec![NEG_MAX; n_b + 1];
        let mut iy_scores = vec![NEG_MAX; n_b + 1];
        for i in 1..n_a {
            let k_a = a[i - 1] as usize;
            let mut m_temp = m_scores[0];
            let mut ix_temp = ix_scores[0];
            let mut iy_temp = iy_scores[0];
            m_scores[0] = 0.0;
            ix_scores[0] = NEG_MAX;
            iy_scores[0] = NEG_MAX;
            for j in 1..n_b {
                let k_b = b[j - 1] as usize;
                let mut score = m_temp;
                let mut trace = M_MATRIX;
                select(&mut score, &mut trace, ix_temp, IX_MATRIX, epsilon);
                select(&mut score, &mut trace, iy_temp, IY_MATRIX, epsilon);
                score += al.substitution[k_a][k_b];
                if score < epsilon {
                    score = 0.0;
                    trace = STARTPOINT;
                } else if score > maximum - epsilon {
                    if score > maximum + epsilon {
                        maximum = score;
                        clear_endpoints(m, &mut cursor, i, j, n_b);
                    }
                    trace |= ENDPOINT;
                }
                m.set_trace(i, j, trace);
                m_temp = m_scores[j];
                m_scores[j] = score;

                let mut score = m_temp + g.query_open;
                let mut trace = M_MATRIX;
                select(&mut score, &mut trace, ix_scores[j] + g.query_extend, IX_MATRIX, epsilon);
                select(&mut score, &mut trace, iy_scores[j] + g.query_open, IY_MATRIX, epsilon);
                if score < epsilon {
                    score = NEG_MAX;
                    trace = 0;
                }
                gaps.set_ix(i, j, trace);
                ix_temp = ix_scores[j];
                ix_scores[j] = score;

                let mut score = m_scores[j - 1] + g.target_open;
                let mut trace = M_MATRIX;
                select(&mut score, &mut trace, ix_scores[j - 1] + g.target_open, IX_MATRIX, epsilon);
                select(&mut score, &mut trace, iy_scores[j - 1] + g.target_extend, IY_MATRIX, epsilon);
                if score < epsilon {
                    score = NEG_MAX;
                    trace = 0;
                }
                gaps.set_iy(i, j, trace);
                iy_temp = iy_scores[j];
                iy_scores[j] = score;
            }
            let k_b = b[n_b - 1] as usize;
            let mut score = m_temp;
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_temp, IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_temp, IY_MATRIX, epsilon);
            score += al.substitution[k_a][k_b];
            if score < epsilon {
                score = 0.0;
                trace = STARTPOINT;
            } else if score > maximum - epsilon {
                if score > maximum + epsilon {
                    maximum = score;
                    clear_endpoints(m, &mut cursor, i, n_b, n_b);
                }
                trace |= ENDPOINT;
            }
            m.set_trace(i, n_b, trace);
            m_scores[n_b] = score;
            ix_scores[n_b] = 0.0;
            gaps.set_ix(i, n_b, 0);
            iy_scores[n_b] = 0.0;
            gaps.set_iy(i, n_b, 0);
        }

        let k_a = a[n_a - 1] as usize;
        let mut m_temp = m_scores[0];
        m_scores[0] = 0.0;
        m.set_trace(n_a, 0, 0);
        let mut ix_temp = ix_scores[0];
        ix_scores[0] = NEG_MAX;
        gaps.set_ix(n_a, 0, 0);
        gaps.set_iy(n_a, 0, 0);
        let mut iy_temp = iy_scores[0];
        iy_scores[0] = NEG_MAX;
        for j in 1..n_b {
            let k_b = b[j - 1] as usize;
            let mut score = m_temp;
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_temp, IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_temp, IY_MATRIX, epsilon);
            score += al.substitution[k_a][k_b];
            if score < epsilon {
                score = 0.0;
                trace = STARTPOINT;
            } else if score > maximum - epsilon {
                if score > maximum + epsilon {
                    maximum = score;
                    clear_endpoints(m, &mut cursor, n_a, j, n_b);
                }
                trace |= ENDPOINT;
            }
            m.set_trace(n_a, j, trace);
            m_temp = m_scores[j];
            m_scores[j] = score;
            ix_temp = ix_scores[j];
            iy_temp = iy_scores[j];
            ix_scores[j] = 0.0;
            gaps.set_ix(n_a, j, 0);
            iy_scores[j] = 0.0;
            gaps.set_iy(n_a, j, 0);
        }
        let k_b = b[n_b - 1] as usize;
        let mut score = m_temp;
        let mut trace = M_MATRIX;
        select(&mut score, &mut trace, ix_temp, IX_MATRIX, epsilon);
        select(&mut score, &mut trace, iy_temp, IY_MATRIX, epsilon);
        score += al.substitution[k_a][k_b];
        if score < epsilon {
            trace = STARTPOINT;
        } else if score > maximum - epsilon {
            if score > maximum + epsilon {
                maximum = score;
                clear_endpoints(m, &mut cursor, n_a, n_b, n_b);
            }
            trace |= ENDPOINT;
        }
        m.set_trace(n_a, n_b, trace);
        gaps.set_ix(n_a, n_b, 0);
        gaps.set_iy(n_a, n_b, 0);
    }

    // Reachability pruning, per state matrix.
    for j in 0..=n_b {
        m.set_path(0, j, M_MATRIX);
    }
    for i in 1..=n_a {
        m.set_path(i, 0, M_MATRIX);
        for j in 1..=n_b {
            let mut trace = m.trace(i, j);
            let diagonal = m.path(i - 1, j - 1);
            if diagonal & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if diagonal & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if diagonal & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace & (STARTPOINT | M_MATRIX | IX_MATRIX | IY_MATRIX) != 0 {
                if trace & ENDPOINT != 0 {
                    m.set_path(i, j, 0);
                } else {
                    m.mark_path(i, j, M_MATRIX);
                }
            } else {
                m.unmark_path(i, j, M_MATRIX);
                trace = 0;
            }
            m.set_trace(i, j, trace);

            let mut trace = gaps.ix(i, j);
            let above = m.path(i - 1, j);
            if above & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if above & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if above & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace != 0 {
                m.mark_path(i, j, IX_MATRIX);
            } else {
                m.unmark_path(i, j, IX_MATRIX);
            }
            gaps.set_ix(i, j, trace);

            let mut trace = gaps.iy(i, j);
            let left = m.path(i, j - 1);
            if left & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if left & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if left & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace != 0 {
                m.mark_path(i, j, IY_MATRIX);
            } else {
                m.unmark_path(i, j, IY_MATRIX);
            }
            gaps.set_iy(i, j, trace);
        }
    }

    if maximum == 0.0 {
        m.set_path(0, 0, DONE);
    } else {
        m.set_path(0, 0, 0);
    }
    (maximum, paths)
}

/// Waterman-Smith-Beyer with traceback, global.
pub(crate) fn waterman_smith_beyer_global(
    al: &Aligner,
    a: &[u8],
    b: &[u8],
) -> Result<(f64, PathGenerator), AlignError> {
    let n_a = a.len();
    let n_b = b.len();
    let epsilon = al.epsilon;
    let mut paths = PathGenerator::new_waterman_smith_beyer(n_a, n_b, Mode::Global);
    let (m, gaps) = paths.matrices_mut();
    let GapMatrices::WatermanSmithBeyer(gaps) = gaps else {
        unreachable!("Waterman-Smith-Beyer generator without gap lists");
    };
    let cols = n_b + 1;
    let index = |i: usize, j: usize| i * cols + j;

    let mut m_scores = vec![NEG_MAX; (n_a + 1) * cols];
    let mut ix_scores = vec![NEG_MAX; (n_a + 1) * cols];
    let mut iy_scores = vec![NEG_MAX; (n_a + 1) * cols];
    m_scores[index(0, 0)] = 0.0;
    for i in 1..=n_a {
        ix_scores[index(i, 0)] = al.query_gap_cost(0, i)?;
    }
    for j in 1..=n_b {
        iy_scores[index(0, j)] = al.target_gap_cost(0, j)?;
    }

    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let mut score = m_scores[index(i - 1, j - 1)];
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_scores[index(i - 1, j - 1)], IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_scores[index(i - 1, j - 1)], IY_MATRIX, epsilon);
            m_scores[index(i, j)] = score + al.substitution[k_a][k_b];
            m.set_trace(i, j, trace);

            let mut m_list = Vec::new();
            let mut xy_list = Vec::new();
            let mut score = NEG_MAX;
            for gap in 1..=i {
                let gap_score = al.query_gap_cost(j, gap)?;
                select_gap(
                    &mut score,
                    gap,
                    m_scores[index(i - gap, j)] + gap_score,
                    iy_scores[index(i - gap, j)] + gap_score,
                    epsilon,
                    &mut m_list,
                    &mut xy_list,
                );
            }
            ix_scores[index(i, j)] = score;
            let cell = gaps.cell_mut(i, j);
            cell.m_ix = m_list;
            cell.iy_ix = xy_list;

            let mut m_list = Vec::new();
            let mut xy_list = Vec::new();
            let mut score = NEG_MAX;
            for gap in 1..=j {
                let gap_score = al.target_gap_cost(i, gap)?;
                select_gap(
                    &mut score,
                    gap,
                    m_scores[index(i, j - gap)] + gap_score,
                    ix_scores[index(i, j - gap)] + gap_score,
                    epsilon,
                    &mut m_list,
                    &mut xy_list,
                );
            }
            iy_scores[index(i, j)] = score;
            let cell = gaps.cell_mut(i, j);
            cell.m_iy = m_list;
            cell.ix_iy = xy_list;
        }
    }

    let score = max3(
        m_scores[index(n_a, n_b)],
        ix_scores[index(n_a, n_b)],
        iy_scores[index(n_a, n_b)],
    );
    m.set_path(n_a, n_b, 0);
    if m_scores[index(n_a, n_b)] < score - epsilon {
        m.set_trace(n_a, n_b, 0);
    }
    if ix_scores[index(n_a, n_b)] < score - epsilon {
        let cell = gaps.cell_mut(n_a, n_b);
        cell.m_ix.clear();
        cell.iy_ix.clear();
    }
    if iy_scores[index(n_a, n_b)] < score - epsilon {
        let cell = gaps.cell_mut(n_a, n_b);
        cell.m_iy.clear();
        cell.ix_iy.clear();
    }
    Ok((score, paths))
}

/// Waterman-Smith-Beyer with traceback, local. Gap states are skipped on
/// the last row/column; sub-epsilon gap states lose their lists.
pub(crate) fn waterman_smith_beyer_local(
    al: &Aligner,
    a: &[u8],
    b: &[u8],
) -> Result<(f64, PathGenerator), AlignError> {
    let n_a = a.len();
    let n_b = b.len();
    let epsilon = al.epsilon;
    let mut paths = PathGenerator::new_waterman_smith_beyer(n_a, n_b, Mode::Local);
    let (m, gaps) = paths.matrices_mut();
    let GapMatrices::WatermanSmithBeyer(gaps) = gaps else {
        unreachable!("Waterman-Smith-Beyer generator without gap lists");
    };
    let cols = n_b + 1;
    let index = |i: usize, j: usize| i * cols + j;

    let mut maximum = 0.0f64;
    let mut cursor = (n_a, n_b);
    let mut m_scores = vec![NEG_MAX; (n_a + 1) * cols];
    let mut ix_scores = vec![NEG_MAX; (n_a + 1) * cols];
    let mut iy_scores = vec![NEG_MAX; (n_a + 1) * cols];
    for i in 0..=n_a {
        m_scores[index(i, 0)] = 0.0;
    }
    for j in 1..=n_b {
        m_scores[index(0, j)] = 0.0;
    }

    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let mut score = m_scores[index(i - 1, j - 1)];
            let mut trace = M_MATRIX;
            select(&mut score, &mut trace, ix_scores[index(i - 1, j - 1)], IX_MATRIX, epsilon);
            select(&mut score, &mut trace, iy_scores[index(i - 1, j - 1)], IY_MATRIX, epsilon);
            score += al.substitution[k_a][k_b];
            if score < epsilon {
                score = 0.0;
                trace = STARTPOINT;
            } else if score > maximum - epsilon {
                if score > maximum + epsilon {
                    maximum = score;
                    clear_endpoints(m, &mut cursor, i, j, n_b);
                }
                trace |= ENDPOINT;
            }
            m_scores[index(i, j)] = score;
            m.set_trace(i, j, trace);
            if i == n_a || j == n_b {
                ix_scores[index(i, j)] = score;
                iy_scores[index(i, j)] = score;
                continue;
            }

            let mut m_list = Vec::new();
            let mut xy_list = Vec::new();
            let mut score = NEG_MAX;
            for gap in 1..=i {
                let gap_score = al.query_gap_cost(j, gap)?;
                select_gap(
                    &mut score,
                    gap,
                    m_scores[index(i - gap, j)] + gap_score,
                    iy_scores[index(i - gap, j)] + gap_score,
                    epsilon,
                    &mut m_list,
                    &mut xy_list,
                );
            }
            if score < epsilon {
                score = NEG_MAX;
                m_list.clear();
                xy_list.clear();
            } else if score > maximum {
                maximum = score;
            }
            ix_scores[index(i, j)] = score;
            let cell = gaps.cell_mut(i, j);
            cell.m_ix = m_list;
            cell.iy_ix = xy_list;

            let mut m_list = Vec::new();
            let mut xy_list = Vec::new();
            let mut score = NEG_MAX;
            for gap in 1..=j {
                let gap_score = al.target_gap_cost(i, gap)?;
                select_gap(
                    &mut score,
                    gap,
                    m_scores[index(i, j - gap)] + gap_score,
                    ix_scores[index(i, j - gap)] + gap_score,
                    epsilon,
                    &mut m_list,
                    &mut xy_list,
                );
            }
            if score < epsilon {
                score = NEG_MAX;
                m_list.clear();
                xy_list.clear();
            } else if score > maximum {
                maximum = score;
            }
            iy_scores[index(i, j)] = score;
            let cell = gaps.cell_mut(i, j);
            cell.m_iy = m_list;
            cell.ix_iy = xy_list;
        }
    }

    // Reachability pruning; gap lists are compacted in place.
    for j in 0..=n_b {
        m.set_path(0, j, M_MATRIX);
    }
    for i in 1..=n_a {
        m.set_path(i, 0, M_MATRIX);
        for j in 1..=n_b {
            let mut trace = m.trace(i, j);
            let diagonal = m.path(i - 1, j - 1);
            if diagonal & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if diagonal & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if diagonal & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace & (STARTPOINT | M_MATRIX | IX_MATRIX | IY_MATRIX) != 0 {
                if trace & ENDPOINT != 0 {
                    m.set_path(i, j, 0);
                } else {
                    m.mark_path(i, j, M_MATRIX);
                }
            } else {
                m.unmark_path(i, j, M_MATRIX);
                trace = 0;
            }
            m.set_trace(i, j, trace);
            if i == n_a || j == n_b {
                continue;
            }
            let cell: &mut WsbGapCell = gaps.cell_mut(i, j);
            cell.m_ix.retain(|&gap| m.path(i - gap, j) & M_MATRIX != 0);
            cell.iy_ix.retain(|&gap| m.path(i - gap, j) & IY_MATRIX != 0);
            if cell.m_ix.is_empty() && cell.iy_ix.is_empty() {
                m.unmark_path(i, j, IX_MATRIX);
            } else {
                m.mark_path(i, j, IX_MATRIX);
            }
            let cell = gaps.cell_mut(i, j);
            cell.m_iy.retain(|&gap| m.path(i, j - gap) & M_MATRIX != 0);
            cell.ix_iy.retain(|&gap| m.path(i, j - gap) & IX_MATRIX != 0);
            if cell.m_iy.is_empty() && cell.ix_iy.is_empty() {
                m.unmark_path(i, j, IY_MATRIX);
            } else {
                m.mark_path(i, j, IY_MATRIX);
            }
        }
    }

    if maximum == 0.0 {
        m.set_path(0, 0, DONE);
    } else {
        m.set_path(0, 0, 0);
    }
    Ok((maximum, paths))
}
