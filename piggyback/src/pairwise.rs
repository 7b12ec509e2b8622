//! Pairwise co-occurrence keys over a row's slot values.
//!
//! For every unordered pair of output columns (from, to) with from < to, each row
//! contributes one combined key to that pair's distinct set. Pair sets live in a flat
//! array of length n·(n-1)/2 addressed by [`pair_index`]. This is the dominant per-row
//! cost of collection: O(n^2) string operations per row for output arity n.

use itertools::Itertools;

use crate::stat::PairStatistic;

/// Separator placed between the two halves of a combined key. Without it, variable-length
/// values alias: ("1","23") and ("12","3") would produce the same key.
pub const PAIR_KEY_DELIMITER: char = '\u{1f}';

/// Number of unordered column pairs for output arity `n`.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Flat offset of the pair (from, to) in a triangular layout, 0-based, from < to < n.
///
/// Row `from` starts after the sum of all shorter rows, i.e. at
/// `sum_{k=1}^{from} (n - k)`, and (from, to) sits `to - from - 1` entries into it.
pub fn pair_index(from: usize, to: usize, n: usize) -> usize {
    debug_assert!(from < to && to < n);
    from * n - from * (from + 1) / 2 + (to - from - 1)
}

/// Insert this row's combined key into every pair's distinct set. `delimit` selects the
/// key construction policy: delimited keys are unambiguous, undelimited keys reproduce
/// the legacy behavior including its aliasing.
pub fn build_pairs(slots: &[String], pairs: &mut [PairStatistic], delimit: bool) {
    let n = slots.len();
    debug_assert_eq!(pair_count(n), pairs.len());

    for (from, to) in (0..n).tuple_combinations() {
        let mut key =
            String::with_capacity(slots[from].len() + slots[to].len() + delimit as usize);
        key.push_str(&slots[from]);
        if delimit {
            key.push(PAIR_KEY_DELIMITER);
        }
        key.push_str(&slots[to]);
        pairs[pair_index(from, to, n)].insert(key);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use itertools::Itertools;

    use super::*;

    fn slots(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_pair_index_is_a_bijection() {
        for n in 2..=6 {
            let indexes: HashSet<usize> = (0..n)
                .tuple_combinations()
                .map(|(from, to)| pair_index(from, to, n))
                .collect();

            assert_eq!(pair_count(n), indexes.len());
            assert!(indexes.iter().all(|index| *index < pair_count(n)));
        }
    }

    #[test]
    fn test_pair_index_layout_for_arity_four() {
        // (0,1) (0,2) (0,3) (1,2) (1,3) (2,3)
        let order: Vec<usize> = (0..4)
            .tuple_combinations()
            .map(|(from, to)| pair_index(from, to, 4))
            .collect();
        assert_eq!(vec![0, 1, 2, 3, 4, 5], order);
    }

    #[test]
    fn test_delimited_keys_distinguish_aliasing_rows() {
        let mut pairs = vec![PairStatistic::default()];

        build_pairs(&slots(&["a", "b"]), &mut pairs, true);
        build_pairs(&slots(&["ab", ""]), &mut pairs, true);

        assert_eq!(2, pairs[0].distinct_count());
        assert!(pairs[0].contains("a\u{1f}b"));
        assert!(pairs[0].contains("ab\u{1f}"));
    }

    #[test]
    fn test_undelimited_keys_alias() {
        let mut pairs = vec![PairStatistic::default()];

        build_pairs(&slots(&["a", "b"]), &mut pairs, false);
        build_pairs(&slots(&["ab", ""]), &mut pairs, false);

        assert_eq!(1, pairs[0].distinct_count());
        assert!(pairs[0].contains("ab"));
    }

    #[test]
    fn test_every_pair_receives_one_key_per_row() {
        let mut pairs = vec![PairStatistic::default(); pair_count(3)];

        build_pairs(&slots(&["1", "x", "2"]), &mut pairs, true);

        for pair in &pairs {
            assert_eq!(1, pair.distinct_count());
        }
        assert!(pairs[pair_index(0, 2, 3)].contains("1\u{1f}2"));
    }
}
