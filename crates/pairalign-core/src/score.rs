//! Score-only DP kernels. One row buffer per state matrix; no traceback.
//!
//! Sequences arrive already encoded as alphabet indices. `target` scores
//! apply to horizontal edges, `query` scores to vertical edges; the
//! `left`/`right` variants take over on the first and last row/column in
//! global mode.

use crate::aligner::Aligner;
use crate::AlignError;

/// Stand-in for negative infinity in the DP buffers.
pub(crate) const NEG_MAX: f64 = f64::MIN;

#[inline]
pub(crate) fn max3(first: f64, second: f64, third: f64) -> f64 {
    first.max(second).max(third)
}

/// Needleman-Wunsch, linear gaps, global.
pub(crate) fn needleman_wunsch(al: &Aligner, a: &[u8], b: &[u8]) -> f64 {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;

    let mut scores = vec![0.0f64; n_b + 1];
    for (j, slot) in scores.iter_mut().enumerate() {
        *slot = j as f64 * g.target_left_extend;
    }
    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        let hgap = if i == n_a { g.target_right_extend } else { g.target_extend };
        let mut temp = scores[0];
        scores[0] = if i == n_a {
            n_a as f64 * g.query_right_extend
        } else {
            i as f64 * g.query_left_extend
        };
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let vgap = if j == n_b { g.query_right_extend } else { g.query_extend };
            let score = max3(
                temp + al.substitution[k_a][k_b],
                scores[j] + vgap,
                scores[j - 1] + hgap,
            );
            temp = scores[j];
            scores[j] = score;
        }
    }
    scores[n_b]
}

/// Smith-Waterman, linear gaps, local. Cells on the last row/column only
/// consider the diagonal candidate, so no best alignment ends in a gap.
pub(crate) fn smith_waterman(al: &Aligner, a: &[u8], b: &[u8]) -> f64 {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;
    let mut maximum = 0.0f64;

    let mut scores = vec![0.0f64; n_b + 1];
    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        let mut temp = 0.0;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let mut score = temp + al.substitution[k_a][k_b];
            if i < n_a && j < n_b {
                score = score
                    .max(scores[j] + g.query_extend)
                    .max(scores[j - 1] + g.target_extend);
            }
            if score < 0.0 {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            temp = scores[j];
            scores[j] = score;
        }
    }
    maximum
}

/// Gotoh, affine gaps, global. Three rolling state rows M, Ix, Iy.
pub(crate) fn gotoh_global(al: &Aligner, a: &[u8], b: &[u8]) -> f64 {
    let n_a = a.len();
    let n_b = b.len();
    let g = &al.gap;

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
            let score = max3(m_temp, ix_temp, iy_temp);
            m_temp = m_scores[j];
            m_scores[j] = score + al.substitution[k_a][k_b];
            let score = max3(
                m_temp + open_b,
                ix_scores[j] + extend_b,
                iy_scores[j] + open_b,
            );
            ix_temp = ix_scores[j];
            ix_scores[j] = score;
            let score = max3(
                m_scores[j - 1] + open_a,
                ix_scores[j - 1] + open_a,
                iy_scores[j - 1] + extend_a,
            );
            iy_temp = iy_scores[j];
            iy_scores[j] = score;
        }
    }
    max3(m_scores[n_b], ix_scores[n_b], iy_scores[n_b])
}

/// Gotoh, affine gaps, local. Gap states on the last row/column are reset to
/// zero, so no best alignment ends in a gap there.
pub(crate) fn gotoh_local(al: &Aligner, a: &[u8], b: &[u8]) -> f64 {
    let n_a = a.len();
    let n_b = b.len();
    if n_a == 0 || n_b == 0 {
        return 0.0;
    }
    let g = &al.gap;
    let mut maximum = 0.0f64;

    let mut m_scores = vec![NEG_MAX; n_b + 1];
    let mut ix_scores = vec![NEG_MAX; n_b + 1];
    let mut iy_scores = vec![NEG_MAX; n_b + 1];
    m_scores[0] = 0.0;
    for j in 1..=n_b {
        iy_scores[j] = 0.0;
    }

    for i in 1..n_a {
        let k_a = a[i - 1] as usize;
        let mut m_temp = m_scores[0];
        let mut ix_temp = ix_scores[0];
        let mut iy_temp = iy_scores[0];
        m_scores[0] = NEG_MAX;
        ix_scores[0] = 0.0;
        iy_scores[0] = NEG_MAX;
        for j in 1..n_b {
            let k_b = b[j - 1] as usize;
            let mut score = max3(m_temp, ix_temp, iy_temp) + al.substitution[k_a][k_b];
            if score < 0.0 {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            m_temp = m_scores[j];
            m_scores[j] = score;
            let mut score = max3(
                m_temp + g.query_open,
                ix_scores[j] + g.query_extend,
                iy_scores[j] + g.query_open,
            );
            if score < 0.0 {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            ix_temp = ix_scores[j];
            ix_scores[j] = score;
            let mut score = max3(
                m_scores[j - 1] + g.target_open,
                ix_scores[j - 1] + g.target_open,
                iy_scores[j - 1] + g.target_extend,
            );
            if score < 0.0 {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            iy_temp = iy_scores[j];
            iy_scores[j] = score;
        }
        let k_b = b[n_b - 1] as usize;
        ix_scores[n_b] = 0.0;
        iy_scores[n_b] = 0.0;
        let mut score = max3(m_temp, ix_temp, iy_temp) + al.substitution[k_a][k_b];
        if score < 0.0 {
            score = 0.0;
        } else if score > maximum {
            maximum = score;
        }
        m_scores[n_b] = score;
    }

    let k_a = a[n_a - 1] as usize;
    let mut m_temp = m_scores[0];
    let mut ix_temp = ix_scores[0];
    let mut iy_temp = iy_scores[0];
    m_scores[0] = NEG_MAX;
    ix_scores[0] = 0.0;
    iy_scores[0] = NEG_MAX;
    for j in 1..n_b {
        let k_b = b[j - 1] as usize;
        let mut score = max3(m_temp, ix_temp, iy_temp) + al.substitution[k_a][k_b];
        if score < 0.0 {
            score = 0.0;
        } else if score > maximum {
            maximum = score;
        }
        m_temp = m_scores[j];
        m_scores[j] = score;
        ix_temp = ix_scores[j];
        iy_temp = iy_scores[j];
        ix_scores[j] = 0.0;
        iy_scores[j] = 0.0;
    }
    let k_b = b[n_b - 1] as usize;
    let score = max3(m_temp, ix_temp, iy_temp) + al.substitution[k_a][k_b];
    if score > maximum {
        maximum = score;
    }
    maximum
}

/// Waterman-Smith-Beyer, arbitrary gap costs, global. Full matrices; the gap
/// length loops make this O(nA * nB * (nA + nB)).
pub(crate) fn waterman_smith_beyer_global(
    al: &Aligner,
    a: &[u8],
    b: &[u8],
) -> Result<f64, AlignError> {
    let n_a = a.len();
    let n_b = b.len();
    let cols = n_b + 1;
    let index = |i: usize, j: usize| i * cols + j;

    let mut m = vec![NEG_MAX; (n_a + 1) * cols];
    let mut ix = vec![NEG_MAX; (n_a + 1) * cols];
    let mut iy = vec![NEG_MAX; (n_a + 1) * cols];
    m[index(0, 0)] = 0.0;
    for i in 1..=n_a {
        ix[index(i, 0)] = al.query_gap_cost(0, i)?;
    }
    for j in 1..=n_b {
        iy[index(0, j)] = al.target_gap_cost(0, j)?;
    }

    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            m[index(i, j)] = max3(
                m[index(i - 1, j - 1)],
                ix[index(i - 1, j - 1)],
                iy[index(i - 1, j - 1)],
            ) + al.substitution[k_a][k_b];
            let mut score = NEG_MAX;
            for gap in 1..=i {
                let gap_score = al.query_gap_cost(j, gap)?;
                score = score
                    .max(m[index(i - gap, j)] + gap_score)
                    .max(iy[index(i - gap, j)] + gap_score);
            }
            ix[index(i, j)] = score;
            let mut score = NEG_MAX;
            for gap in 1..=j {
                let gap_score = al.target_gap_cost(i, gap)?;
                score = score
                    .max(m[index(i, j - gap)] + gap_score)
                    .max(ix[index(i, j - gap)] + gap_score);
            }
            iy[index(i, j)] = score;
        }
    }
    Ok(max3(
        m[index(n_a, n_b)],
        ix[index(n_a, n_b)],
        iy[index(n_a, n_b)],
    ))
}

/// Waterman-Smith-Beyer, arbitrary gap costs, local. Gap states on the last
/// row/column are zeroed; the final corner joins the running maximum only
/// through the match state.
pub(crate) fn waterman_smith_beyer_local(
    al: &Aligner,
    a: &[u8],
    b: &[u8],
) -> Result<f64, AlignError> {
    let n_a = a.len();
    let n_b = b.len();
    let cols = n_b + 1;
    let index = |i: usize, j: usize| i * cols + j;
    let mut maximum = 0.0f64;

    let mut m = vec![NEG_MAX; (n_a + 1) * cols];
    let mut ix = vec![NEG_MAX; (n_a + 1) * cols];
    let mut iy = vec![NEG_MAX; (n_a + 1) * cols];
    m[index(0, 0)] = 0.0;
    for i in 1..=n_a {
        ix[index(i, 0)] = 0.0;
    }
    for j in 1..=n_b {
        iy[index(0, j)] = 0.0;
    }

    for i in 1..=n_a {
        let k_a = a[i - 1] as usize;
        for j in 1..=n_b {
            let k_b = b[j - 1] as usize;
            let mut score = max3(
                m[index(i - 1, j - 1)],
                ix[index(i - 1, j - 1)],
                iy[index(i - 1, j - 1)],
            ) + al.substitution[k_a][k_b];
            if score < 0.0 {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            m[index(i, j)] = score;
            if i == n_a || j == n_b {
                ix[index(i, j)] = 0.0;
                iy[index(i, j)] = 0.0;
                continue;
            }
            let mut score = 0.0f64;
            for gap in 1..=i {
                let gap_score = al.query_gap_cost(j, gap)?;
                score = score
                    .max(m[index(i - gap, j)] + gap_score)
                    .max(iy[index(i - gap, j)] + gap_score);
            }
            if score > maximum {
                maximum = score;
            }
            ix[index(i, j)] = score;
            let mut score = 0.0f64;
            for gap in 1..=j {
                let gap_score = al.target_gap_cost(i, gap)?;
                score = score
                    .max(m[index(i, j - gap)] + gap_score)
                    .max(ix[index(i, j - gap)] + gap_score);
            }
            if score > maximum {
                maximum = score;
            }
            iy[index(i, j)] = score;
        }
    }
    let score = max3(
        m[index(n_a, n_b)],
        ix[index(n_a, n_b)],
        iy[index(n_a, n_b)],
    );
    if score > maximum {
        maximum = score;
    }
    Ok(maximum)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::aligner::{Aligner, Mode};

    fn encoded(seq: &[u8]) -> Vec<u8> {
        crate::alphabet::encode(seq).unwrap()
    }

    #[test]
    fn test_needleman_wunsch_identity() {
        let aligner = Aligner::default();
        let a = encoded(b"ACGT");
        assert_eq!(super::needleman_wunsch(&aligner, &a, &a), 4.0);
    }

    #[test]
    fn test_needleman_wunsch_prefers_matches_over_free_gaps() {
        let mut aligner = Aligner::new(1.0, -1.0).unwrap();
        aligner.set_gap_score(-1.0).unwrap();
        let a = encoded(b"AAA");
        let b = encoded(b"AA");
        assert_eq!(super::needleman_wunsch(&aligner, &a, &b), 1.0);
    }

    #[test]
    fn test_needleman_wunsch_empty_inputs() {
        let aligner = Aligner::default();
        assert_eq!(super::needleman_wunsch(&aligner, &[], &[]), 0.0);
    }

    #[test]
    fn test_smith_waterman_embedded_match() {
        let mut aligner = Aligner::default();
        aligner.set_mode(Mode::Local);
        aligner.set_gap_score(-1.0).unwrap();
        let a = encoded(b"XXACGTXX");
        let b = encoded(b"ACGT");
        assert_eq!(super::smith_waterman(&aligner, &a, &b), 4.0);
    }

    #[test]
    fn test_smith_waterman_unrelated_is_zero() {
        let mut aligner = Aligner::new(1.0, -2.0).unwrap();
        aligner.set_mode(Mode::Local);
        aligner.set_gap_score(-2.0).unwrap();
        let a = encoded(b"AAAA");
        let b = encoded(b"CCCC");
        assert_eq!(super::smith_waterman(&aligner, &a, &b), 0.0);
    }

    #[test]
    fn test_gotoh_global_single_gap_opens_once() {
        let mut aligner = Aligner::new(1.0, 0.0).unwrap();
        aligner.set_open_gap_score(-2.0).unwrap();
        aligner.set_extend_gap_score(-0.5).unwrap();
        let a = encoded(b"ACCT");
        let b = encoded(b"ACT");
        // Three matches plus one length-1 gap opened at -2.
        assert_eq!(super::gotoh_global(&aligner, &a, &b), 1.0);
    }

    #[test]
    fn test_gotoh_local_matches_smith_waterman_shape() {
        let mut aligner = Aligner::new(3.0, -1.0).unwrap();
        aligner.set_mode(Mode::Local);
        aligner.set_open_gap_score(-3.0).unwrap();
        aligner.set_extend_gap_score(-1.0).unwrap();
        let a = encoded(b"CCAGG");
        let b = encoded(b"AGG");
        assert_eq!(super::gotoh_local(&aligner, &a, &b), 9.0);
    }

    #[test]
    fn test_wsb_global_affine_function_matches_gotoh() {
        let mut gotoh = Aligner::new(1.0, 0.0).unwrap();
        gotoh.set_open_gap_score(-2.0).unwrap();
        gotoh.set_extend_gap_score(-0.5).unwrap();
        let mut wsb = Aligner::new(1.0, 0.0).unwrap();
        wsb.set_gap_function(Rc::new(|_, length| -2.0 - 0.5 * (length - 1) as f64));
        let a = encoded(b"ACCT");
        let b = encoded(b"ACT");
        let expected = super::gotoh_global(&gotoh, &a, &b);
        let got = super::waterman_smith_beyer_global(&wsb, &a, &b).unwrap();
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wsb_global_convex_cost_splits_gaps() {
        let mut aligner = Aligner::new(1.0, 0.0).unwrap();
        aligner.set_gap_function(Rc::new(|_, length| -((length * length) as f64)));
        let a = encoded(b"AAAA");
        let b = encoded(b"AA");
        // Two isolated length-1 gaps at -1 each beat one length-2 gap at -4.
        let got = super::waterman_smith_beyer_global(&aligner, &a, &b).unwrap();
        assert!((got - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_wsb_local_zeroes_marginal_gap_states() {
        let mut aligner = Aligner::new(1.0, -2.0).unwrap();
        aligner.set_mode(Mode::Local);
        aligner.set_gap_function(Rc::new(|_, length| -1.0 - length as f64));
        let a = encoded(b"XXAAXX");
        let b = encoded(b"AA");
        assert_eq!(
            super::waterman_smith_beyer_local(&aligner, &a, &b).unwrap(),
            2.0
        );
    }

    #[test]
    fn test_wsb_gap_function_nan_is_an_error() {
        let mut aligner = Aligner::default();
        aligner.set_gap_function(Rc::new(|_, _| f64::NAN));
        let a = encoded(b"AC");
        let b = encoded(b"AC");
        assert!(super::waterman_smith_beyer_global(&aligner, &a, &b).is_err());
    }
}
