use crate::inverted_index::InvertedIndex;

/// Query tokens shorter than this are never fuzzily expanded.
pub const MIN_FUZZY_CHARS: usize = 3;

/// Maximum edit distance for fuzzy expansion and corrections.
pub const MAX_EDITS: usize = 1;

/// Whether `a` and `b` are within `max` single-character edits.
///
/// The length difference is a lower bound on the distance, so strings that
/// differ too much in length are rejected without running the DP. A row
/// whose minimum already exceeds `max` ends the computation early.
pub fn within_distance(a: &str, b: &str, max: usize) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return false;
    }

    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ac) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        let mut row_min = row[0];

        for (j, bc) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ac != bc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
            row_min = row_min.min(row[j + 1]);
        }

        if row_min > max {
            return false;
        }
    }

    row[b.len()] <= max
}

/// Index terms within [`MAX_EDITS`] of `term`, excluding `term` itself.
///
/// Results are sorted so callers see a stable order.
pub fn neighbors<'a>(term: &str, index: &'a InvertedIndex) -> Vec<&'a str> {
    if term.chars().count() < MIN_FUZZY_CHARS {
        return Vec::new();
    }

    let mut found: Vec<&str> = index
        .terms()
        .filter(|candidate| *candidate != term)
        .filter(|candidate| within_distance(term, candidate, MAX_EDITS))
        .collect();
    found.sort_unstable();
    found
}
