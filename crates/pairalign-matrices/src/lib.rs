//! Named substitution matrices for the pairwise aligner.
//!
//! Each matrix is exposed as an upper-triangle list of letter-pair scores,
//! ready to feed into `Aligner::set_substitution_matrix`, which completes
//! the symmetric half.

/// The 20 standard amino acids in BLOSUM row order.
pub const AMINO_ACIDS: [char; 20] = [
    'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S', 'T', 'W',
    'Y', 'V',
];

/// The DNA letters covered by [`nuc44`].
pub const NUCLEOTIDES: [char; 5] = ['A', 'C', 'G', 'T', 'N'];

#[rustfmt::skip]
const BLOSUM62: [[i8; 20]; 20] = [
    //A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V
    [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0], // A
    [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3], // R
    [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3], // N
    [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3], // D
    [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1], // C
    [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2], // Q
    [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2], // E
    [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3], // G
    [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3], // H
    [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3], // I
    [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1], // L
    [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2], // K
    [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1], // M
    [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1], // F
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2], // P
    [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2], // S
    [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0], // T
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3], // W
    [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1], // Y
    [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4], // V
];

fn upper_triangle(letters: &[char], matrix: &[&[i8]]) -> Vec<((char, char), f64)> {
    let mut scores = Vec::with_capacity(letters.len() * (letters.len() + 1) / 2);
    for (i, &first) in letters.iter().enumerate() {
        for (j, &second) in letters.iter().enumerate().skip(i) {
            scores.push(((first, second), matrix[i][j] as f64));
        }
    }
    scores
}

/// The BLOSUM62 protein substitution matrix over the 20 standard amino
/// acids.
pub fn blosum62() -> Vec<((char, char), f64)> {
    let rows: Vec<&[i8]> = BLOSUM62.iter().map(|row| row.as_slice()).collect();
    upper_triangle(&AMINO_ACIDS, &rows)
}

/// The NUC.4.4 (EDNAFULL) core: +5 for a nucleotide match, -4 for a
/// mismatch, -2 for anything involving `N`.
pub fn nuc44() -> Vec<((char, char), f64)> {
    let mut scores = Vec::new();
    for (i, &first) in NUCLEOTIDES.iter().enumerate() {
        for &second in NUCLEOTIDES.iter().skip(i) {
            let score = if first == 'N' || second == 'N' {
                -2.0
            } else if first == second {
                5.0
            } else {
                -4.0
            };
            scores.push(((first, second), score));
        }
    }
    scores
}

/// Names accepted by [`by_name`].
pub fn names() -> &'static [&'static str] {
    &["BLOSUM62", "NUC.4.4"]
}

/// Look a matrix up by its conventional name (case-insensitive).
pub fn by_name(name: &str) -> Option<Vec<((char, char), f64)>> {
    match name.to_ascii_uppercase().as_str() {
        "BLOSUM62" => Some(blosum62()),
        "NUC.4.4" | "EDNAFULL" => Some(nuc44()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(scores: &[((char, char), f64)], first: char, second: char) -> Option<f64> {
        scores
            .iter()
            .find(|((a, b), _)| (*a, *b) == (first, second) || (*a, *b) == (second, first))
            .map(|(_, score)| *score)
    }

    #[test]
    fn test_blosum62_spot_values() {
        let scores = blosum62();
        assert_eq!(score_of(&scores, 'W', 'W'), Some(11.0));
        assert_eq!(score_of(&scores, 'C', 'C'), Some(9.0));
        assert_eq!(score_of(&scores, 'A', 'A'), Some(4.0));
        assert_eq!(score_of(&scores, 'W', 'F'), Some(1.0));
        assert_eq!(score_of(&scores, 'I', 'V'), Some(3.0));
        assert_eq!(score_of(&scores, 'H', 'Y'), Some(2.0));
        assert_eq!(score_of(&scores, 'G', 'I'), Some(-4.0));
    }

    #[test]
    fn test_blosum62_source_table_is_symmetric() {
        for i in 0..20 {
            for j in 0..20 {
                assert_eq!(
                    BLOSUM62[i][j], BLOSUM62[j][i],
                    "asymmetry at ({}, {})",
                    AMINO_ACIDS[i], AMINO_ACIDS[j]
                );
            }
        }
    }

    #[test]
    fn test_blosum62_covers_upper_triangle_once() {
        let scores = blosum62();
        assert_eq!(scores.len(), 20 * 21 / 2);
    }

    #[test]
    fn test_nuc44_scores() {
        let scores = nuc44();
        assert_eq!(score_of(&scores, 'A', 'A'), Some(5.0));
        assert_eq!(score_of(&scores, 'A', 'T'), Some(-4.0));
        assert_eq!(score_of(&scores, 'N', 'G'), Some(-2.0));
        assert_eq!(score_of(&scores, 'N', 'N'), Some(-2.0));
    }

    #[test]
    fn test_by_name() {
        assert!(by_name("blosum62").is_some());
        assert!(by_name("EDNAFULL").is_some());
        assert!(by_name("BLOSUM999").is_none());
        assert_eq!(names().len(), 2);
    }

    #[test]
    fn test_installs_into_aligner_symmetrically() {
        let mut aligner = pairalign_core::Aligner::default();
        aligner.set_substitution_matrix(blosum62()).unwrap();
        let matrix = aligner.substitution_matrix().unwrap();
        assert_eq!(matrix[&('R', 'K')], 2.0);
        assert_eq!(matrix[&('K', 'R')], 2.0);
        // Peptide scoring uses the installed values.
        assert_eq!(aligner.score(b"WW", b"WW").unwrap(), 22.0);
    }
}
