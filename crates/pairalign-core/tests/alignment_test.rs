use std::collections::HashSet;
use std::rc::Rc;

use pairalign_core::{AlignError, Aligner, Mode};
use pretty_assertions::assert_eq;

// -----------------------------------------------------------------
// 1. Identical sequences, linear gaps
// -----------------------------------------------------------------

#[test]
fn test_identical_sequences_single_diagonal_path() {
    let aligner = Aligner::default();
    let (score, mut paths) = aligner.align(b"ACGT", b"ACGT").unwrap();
    assert_eq!(score, 4.0);
    assert_eq!(paths.len().unwrap(), 1);
    let all: Vec<_> = paths.by_ref().collect();
    assert_eq!(all, vec![vec![(0, 0), (4, 4)]]);
    assert_eq!(aligner.score(b"ACGT", b"ACGT").unwrap(), 4.0);
}

// -----------------------------------------------------------------
// 2. Local alignment of an embedded match
// -----------------------------------------------------------------

#[test]
fn test_local_embedded_match() {
    let mut aligner = Aligner::default();
    aligner.set_mode(Mode::Local);
    aligner.set_gap_score(-1.0).unwrap();
    let (score, mut paths) = aligner.align(b"XXACGTXX", b"ACGT").unwrap();
    assert_eq!(score, 4.0);
    assert_eq!(paths.len().unwrap(), 1);
    let all: Vec<_> = paths.by_ref().collect();
    assert_eq!(all, vec![vec![(2, 0), (6, 4)]]);
    assert_eq!(aligner.score(b"XXACGTXX", b"ACGT").unwrap(), 4.0);
}

// -----------------------------------------------------------------
// 3. Three co-optimal deletions, deterministic order
// -----------------------------------------------------------------

#[test]
fn test_three_coptimal_deletions_enumerate_in_order() {
    let mut aligner = Aligner::new(1.0, -1.0).unwrap();
    aligner.set_gap_score(-1.0).unwrap();
    let (score, mut paths) = aligner.align(b"AAA", b"AA").unwrap();
    assert_eq!(score, 1.0);
    assert_eq!(paths.len().unwrap(), 3);
    let all: Vec<_> = paths.by_ref().collect();
    // Horizontal alternatives are probed before vertical before diagonal,
    // so the deletion walks from the tail to the head of the target.
    assert_eq!(
        all,
        vec![
            vec![(0, 0), (2, 2), (3, 2)],
            vec![(0, 0), (1, 1), (2, 1), (3, 2)],
            vec![(0, 0), (1, 0), (3, 2)],
        ]
    );
}

// -----------------------------------------------------------------
// 4. Affine gaps: ambiguous gap position
// -----------------------------------------------------------------

#[test]
fn test_gotoh_gap_position_ambiguity() {
    let mut aligner = Aligner::new(1.0, 0.0).unwrap();
    aligner.set_open_gap_score(-2.0).unwrap();
    aligner.set_extend_gap_score(-0.5).unwrap();
    let (score, mut paths) = aligner.align(b"ACCT", b"ACT").unwrap();
    // Three matches plus one gap opened at -2.
    assert_eq!(score, 1.0);
    assert_eq!(paths.len().unwrap(), 2);
    let all: HashSet<_> = paths.by_ref().collect();
    let expected: HashSet<_> = [
        vec![(0, 0), (1, 1), (2, 1), (4, 3)],
        vec![(0, 0), (2, 2), (3, 2), (4, 3)],
    ]
    .into_iter()
    .collect();
    assert_eq!(all, expected);
}

// -----------------------------------------------------------------
// 5. Arbitrary gap costs: a convex cost splits the gap
// -----------------------------------------------------------------

#[test]
fn test_wsb_convex_gap_cost_splits_gaps() {
    let mut aligner = Aligner::new(1.0, 0.0).unwrap();
    aligner.set_gap_function(Rc::new(|_, length| -((length * length) as f64)));
    let (score, mut paths) = aligner.align(b"AAAA", b"AA").unwrap();
    // Two isolated length-1 gaps (-1 each) beat one length-2 gap (-4).
    assert_eq!(score, 0.0);
    assert_eq!(paths.len().unwrap(), 3);
    let all: Vec<_> = paths.by_ref().collect();
    assert_eq!(all.len(), 3);
    let unique: HashSet<_> = all.into_iter().collect();
    assert_eq!(unique.len(), 3);
}

// -----------------------------------------------------------------
// 6. Path-count overflow
// -----------------------------------------------------------------

#[test]
fn test_path_count_overflow() {
    let aligner = Aligner::new(0.0, 0.0).unwrap();
    let sequence = vec![b'A'; 40];
    let (score, mut paths) = aligner.align(&sequence, &sequence).unwrap();
    assert_eq!(score, 0.0);
    assert_eq!(paths.len().unwrap_err(), AlignError::PathCountOverflow);
    // The failure is cached, not recomputed into a bogus value.
    assert_eq!(paths.len().unwrap_err(), AlignError::PathCountOverflow);
}

// -----------------------------------------------------------------
// Epsilon tie-breaking
// -----------------------------------------------------------------

#[test]
fn test_epsilon_controls_tie_breaking() {
    // With epsilon 0.1, a gap detour scoring 0.96 ties the diagonal at 1.0.
    let mut aligner = Aligner::default();
    aligner.set_epsilon(0.1).unwrap();
    aligner.set_gap_score(0.48).unwrap();
    let (_, mut paths) = aligner.align(b"A", b"A").unwrap();
    assert_eq!(paths.len().unwrap(), 3);

    // A detour scoring 0.80 no longer ties.
    let mut aligner = Aligner::default();
    aligner.set_epsilon(0.1).unwrap();
    aligner.set_gap_score(0.40).unwrap();
    let (_, mut paths) = aligner.align(b"A", b"A").unwrap();
    assert_eq!(paths.len().unwrap(), 1);
}

// -----------------------------------------------------------------
// Boundary cases
// -----------------------------------------------------------------

#[test]
fn test_empty_sequences_yield_single_empty_path() {
    let aligner = Aligner::default();
    let (score, mut paths) = aligner.align(b"", b"").unwrap();
    assert_eq!(score, 0.0);
    assert_eq!(paths.len().unwrap(), 1);
    let all: Vec<_> = paths.by_ref().collect();
    assert_eq!(all, vec![vec![(0, 0)]]);
    assert!(paths.next().is_none());
}

#[test]
fn test_one_empty_sequence_is_a_single_gap() {
    let mut aligner = Aligner::default();
    aligner.set_gap_score(-1.0).unwrap();
    let (score, mut paths) = aligner.align(b"AC", b"").unwrap();
    assert_eq!(score, -2.0);
    let all: Vec<_> = paths.by_ref().collect();
    assert_eq!(all, vec![vec![(0, 0), (2, 0)]]);
}

#[test]
fn test_single_character_match() {
    let aligner = Aligner::new(2.5, -1.0).unwrap();
    assert_eq!(aligner.score(b"G", b"G").unwrap(), 2.5);
    assert_eq!(aligner.score(b"G", b"g").unwrap(), 2.5);
}

#[test]
fn test_invalid_input_byte_is_rejected() {
    let aligner = Aligner::default();
    let err = aligner.score(b"AC-GT", b"ACGT").unwrap_err();
    assert_eq!(
        err,
        AlignError::InvalidSequence {
            byte: b'-',
            position: 2
        }
    );
    assert!(aligner.align(b"ACGT", b"AC GT").is_err());
}

// -----------------------------------------------------------------
// Universal properties
// -----------------------------------------------------------------

#[test]
fn test_score_matches_align_score_across_algorithms() {
    // Linear, local.
    let mut sw = Aligner::new(3.0, -2.0).unwrap();
    sw.set_mode(Mode::Local);
    sw.set_gap_score(-2.0).unwrap();
    // Affine, global.
    let mut gotoh = Aligner::new(2.0, -1.0).unwrap();
    gotoh.set_open_gap_score(-4.0).unwrap();
    gotoh.set_extend_gap_score(-0.5).unwrap();
    // Affine, local.
    let mut gotoh_local = Aligner::new(3.0, -1.0).unwrap();
    gotoh_local.set_mode(Mode::Local);
    gotoh_local.set_open_gap_score(-3.0).unwrap();
    gotoh_local.set_extend_gap_score(-1.0).unwrap();
    // Gap function, global and local.
    let mut wsb = Aligner::new(1.0, 0.0).unwrap();
    wsb.set_gap_function(Rc::new(|_, length| -((length * length) as f64)));
    let mut wsb_local = Aligner::new(1.0, -2.0).unwrap();
    wsb_local.set_mode(Mode::Local);
    wsb_local.set_gap_function(Rc::new(|_, length| -1.0 - length as f64));

    let cases: [(&Aligner, &[u8], &[u8]); 5] = [
        (&sw, b"GGTTGACTA", b"TGTTA"),
        (&gotoh, b"ACCTGGA", b"ACGA"),
        (&gotoh_local, b"CCAGG", b"AGG"),
        (&wsb, b"AAAA", b"AA"),
        (&wsb_local, b"XXAAXX", b"AA"),
    ];
    for (aligner, target, query) in cases {
        let score = aligner.score(target, query).unwrap();
        let (align_score, _) = aligner.align(target, query).unwrap();
        assert!(
            (score - align_score).abs() < 1e-9,
            "score {score} != align score {align_score}"
        );
    }
}

#[test]
fn test_enumeration_is_complete_and_unique() {
    let mut aligner = Aligner::new(1.0, -1.0).unwrap();
    aligner.set_gap_score(-1.0).unwrap();
    let (_, mut paths) = aligner.align(b"GATTACA", b"GCATGCT").unwrap();
    let expected = paths.len().unwrap();
    let all: Vec<_> = paths.by_ref().collect();
    assert_eq!(all.len() as i64, expected);
    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(unique.len(), all.len());
}

#[test]
fn test_enumeration_is_deterministic() {
    let build = || {
        let mut aligner = Aligner::new(1.0, -1.0).unwrap();
        aligner.set_gap_score(-1.0).unwrap();
        aligner.align(b"TTACGG", b"TACG").unwrap()
    };
    let (score_a, mut first) = build();
    let (score_b, mut second) = build();
    assert_eq!(score_a, score_b);
    let all_a: Vec<_> = first.by_ref().collect();
    let all_b: Vec<_> = second.by_ref().collect();
    assert_eq!(all_a, all_b);
}

#[test]
fn test_reset_replays_identical_paths() {
    let mut aligner = Aligner::new(1.0, -1.0).unwrap();
    aligner.set_gap_score(-1.0).unwrap();
    let (_, mut paths) = aligner.align(b"AAA", b"AA").unwrap();
    let first: Vec<_> = paths.by_ref().collect();
    assert!(paths.next().is_none());
    paths.reset();
    let second: Vec<_> = paths.by_ref().collect();
    assert_eq!(first, second);
}

#[test]
fn test_local_reset_replays_identical_paths() {
    let mut aligner = Aligner::new(1.0, 0.0).unwrap();
    aligner.set_mode(Mode::Local);
    aligner.set_gap_score(-1.0).unwrap();
    let (_, mut paths) = aligner.align(b"XXACGTXX", b"ACGT").unwrap();
    let first: Vec<_> = paths.by_ref().collect();
    paths.reset();
    let second: Vec<_> = paths.by_ref().collect();
    assert_eq!(first, second);
}

#[test]
fn test_wsb_with_affine_cost_matches_gotoh_paths() {
    let mut gotoh = Aligner::new(1.0, 0.0).unwrap();
    gotoh.set_open_gap_score(-2.0).unwrap();
    gotoh.set_extend_gap_score(-0.5).unwrap();
    let (gotoh_score, mut gotoh_paths) = gotoh.align(b"ACCT", b"ACT").unwrap();

    let mut wsb = Aligner::new(1.0, 0.0).unwrap();
    wsb.set_gap_function(Rc::new(|_, length| -2.0 - 0.5 * (length - 1) as f64));
    let (wsb_score, mut wsb_paths) = wsb.align(b"ACCT", b"ACT").unwrap();

    assert!((gotoh_score - wsb_score).abs() < 1e-9);
    let gotoh_set: HashSet<_> = gotoh_paths.by_ref().collect();
    let wsb_set: HashSet<_> = wsb_paths.by_ref().collect();
    assert_eq!(gotoh_set, wsb_set);
}

#[test]
fn test_wsb_with_linear_cost_matches_linear_paths() {
    let mut linear = Aligner::new(1.0, -1.0).unwrap();
    linear.set_gap_score(-1.0).unwrap();
    let (linear_score, mut linear_paths) = linear.align(b"AAA", b"AA").unwrap();

    let mut wsb = Aligner::new(1.0, -1.0).unwrap();
    wsb.set_gap_function(Rc::new(|_, length| -(length as f64)));
    let (wsb_score, mut wsb_paths) = wsb.align(b"AAA", b"AA").unwrap();

    assert!((linear_score - wsb_score).abs() < 1e-9);
    let linear_set: HashSet<_> = linear_paths.by_ref().collect();
    let wsb_set: HashSet<_> = wsb_paths.by_ref().collect();
    assert_eq!(linear_set, wsb_set);
}

#[test]
fn test_score_symmetry_with_mirrored_parameters() {
    let mut aligner = Aligner::new(2.0, -1.0).unwrap();
    aligner.set_gap_score(-0.5).unwrap();
    assert_eq!(
        aligner.score(b"ACGTT", b"AGT").unwrap(),
        aligner.score(b"AGT", b"ACGTT").unwrap()
    );
}

#[test]
fn test_gotoh_local_path_rescores_to_reported_score() {
    let mut aligner = Aligner::new(3.0, -1.0).unwrap();
    aligner.set_mode(Mode::Local);
    aligner.set_open_gap_score(-3.0).unwrap();
    aligner.set_extend_gap_score(-1.0).unwrap();
    let (score, mut paths) = aligner.align(b"CCAGG", b"AGG").unwrap();
    assert_eq!(score, 9.0);
    let all: Vec<_> = paths.by_ref().collect();
    // One diagonal run of three matches at 3 each.
    assert_eq!(all, vec![vec![(2, 0), (5, 3)]]);
}

#[test]
fn test_gotoh_local_tied_maxima_scan_row_major() {
    let mut aligner = Aligner::new(2.0, -1.0).unwrap();
    aligner.set_mode(Mode::Local);
    aligner.set_open_gap_score(-2.0).unwrap();
    aligner.set_extend_gap_score(-1.0).unwrap();
    let (score, mut paths) = aligner.align(b"CCC", b"C").unwrap();
    assert_eq!(score, 2.0);
    assert_eq!(paths.len().unwrap(), 3);
    let all: Vec<_> = paths.by_ref().collect();
    // One single-match alignment per target position, visited row-major.
    assert_eq!(
        all,
        vec![
            vec![(0, 0), (1, 1)],
            vec![(1, 0), (2, 1)],
            vec![(2, 0), (3, 1)],
        ]
    );
}

#[test]
fn test_substitution_matrix_alignment() {
    let mut aligner = Aligner::default();
    aligner
        .set_substitution_matrix([(('A', 'A'), 2.0), (('G', 'G'), 2.0), (('A', 'G'), -3.0)])
        .unwrap();
    aligner.set_gap_score(-5.0).unwrap();
    assert_eq!(aligner.score(b"AG", b"AG").unwrap(), 4.0);
    // (G, A) falls back to the symmetric (A, G) entry.
    assert_eq!(aligner.score(b"AG", b"GA").unwrap(), -6.0);
}
