//! Stable adaptive merge sort.
//!
//! Runs at or below [`SortOptions::insertion_threshold`] are insertion-sorted in place; longer runs
//! are split, sorted recursively and merged through a scratch buffer holding only the left half.
//! Merging is skipped when the two halves are already in order, so presorted input costs one
//! comparison per split.
//!
//! The sort works on `Copy` elements so the same code sorts raw `i64`/`f64` buffers and `usize`
//! row permutations without boxing.

use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOptions {
    pub insertion_threshold: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            insertion_threshold: 32,
        }
    }
}

pub fn sort_by<T, F>(data: &mut [T], cmp: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    sort_by_with(data, SortOptions::default(), cmp);
}

pub fn sort_by_with<T, F>(data: &mut [T], options: SortOptions, mut cmp: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    if data.len() < 2 {
        return;
    }
    let threshold = options.insertion_threshold.max(1);
    let mut scratch = Vec::with_capacity(data.len() / 2 + 1);
    merge_sort(data, &mut scratch, threshold, &mut cmp);
}

pub fn sort_i64(data: &mut [i64]) {
    sort_by(data, |a, b| a.cmp(b));
}

/// NaN sorts after every other value, `-0.0` before `0.0`.
pub fn sort_f64(data: &mut [f64]) {
    sort_by(data, |a, b| a.total_cmp(b));
}

/// Sort a row permutation by a comparator over row positions.
pub fn sort_positions<F>(positions: &mut [usize], cmp: F)
where
    F: FnMut(usize, usize) -> Ordering,
{
    let mut cmp = cmp;
    sort_by(positions, |a, b| cmp(*a, *b));
}

/// The permutation `0..len` sorted by `cmp`.
pub fn sorted_positions<F>(len: usize, cmp: F) -> Vec<usize>
where
    F: FnMut(usize, usize) -> Ordering,
{
    let mut positions: Vec<usize> = (0..len).collect();
    sort_positions(&mut positions, cmp);
    positions
}

fn merge_sort<T, F>(data: &mut [T], scratch: &mut Vec<T>, threshold: usize, cmp: &mut F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    let len = data.len();
    if len <= threshold {
        insertion_sort(data, cmp);
        return;
    }

    let mid = len / 2;
    merge_sort(&mut data[..mid], scratch, threshold, cmp);
    merge_sort(&mut data[mid..], scratch, threshold, cmp);

    if cmp(&data[mid - 1], &data[mid]) != Ordering::Greater {
        return;
    }

    scratch.clear();
    scratch.extend_from_slice(&data[..mid]);
    let (mut i, mut j, mut out) = (0, mid, 0);
    while i < scratch.len() && j < len {
        // Ties take from the left run to keep the sort stable.
        if cmp(&data[j], &scratch[i]) == Ordering::Less {
            data[out] = data[j];
            j += 1;
        } else {
            data[out] = scratch[i];
            i += 1;
        }
        out += 1;
    }
    while i < scratch.len() {
        data[out] = scratch[i];
        i += 1;
        out += 1;
    }
}

fn insertion_sort<T, F>(data: &mut [T], cmp: &mut F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..data.len() {
        let current = data[i];
        let mut j = i;
        while j > 0 && cmp(&data[j - 1], &current) == Ordering::Greater {
            data[j] = data[j - 1];
            j -= 1;
        }
        data[j] = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_comparator_across_merge_threshold() {
        let mut data: Vec<i64> = (0..100).collect();
        sort_by(&mut data, |a, b| b.cmp(a));
        let expected: Vec<i64> = (0..100).rev().collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn stable_for_equal_keys() {
        let mut pairs: Vec<(u8, usize)> = (0..200).map(|i| ((i % 3) as u8, i)).collect();
        sort_by_with(&mut pairs, SortOptions { insertion_threshold: 4 }, |a, b| {
            a.0.cmp(&b.0)
        });
        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                assert!(window[0].1 < window[1].1);
            }
        }
    }

    #[test]
    fn floats_sort_nan_last() {
        let mut data = vec![2.0, f64::NAN, -1.0, 0.5];
        sort_f64(&mut data);
        assert_eq!(&data[..3], &[-1.0, 0.5, 2.0]);
        assert!(data[3].is_nan());
    }

    #[test]
    fn positions_follow_keys() {
        let keys = [30, 10, 20];
        assert_eq!(sorted_positions(3, |a, b| keys[a].cmp(&keys[b])), vec![1, 2, 0]);
    }
}
