use proptest::prelude::*;
use tabula_columnar::sort::{sort_by_with, sorted_positions};
use tabula_columnar::{Column, SortOptions};

proptest! {
    #[test]
    fn sorts_like_the_standard_stable_sort(
        values in proptest::collection::vec(any::<i32>(), 0..300),
        threshold in 1usize..40,
    ) {
        let mut ours: Vec<(i32, usize)> = values.iter().copied().zip(0..).collect();
        let mut reference = ours.clone();
        sort_by_with(&mut ours, SortOptions { insertion_threshold: threshold }, |a, b| a.0.cmp(&b.0));
        reference.sort_by(|a, b| a.0.cmp(&b.0));
        prop_assert_eq!(ours, reference);
    }

    #[test]
    fn constant_key_leaves_order_unchanged(len in 0usize..200) {
        let positions = sorted_positions(len, |_, _| std::cmp::Ordering::Equal);
        prop_assert_eq!(positions, (0..len).collect::<Vec<_>>());
    }

    #[test]
    fn primitive_column_sort_matches_boxed_order(values in proptest::collection::vec(-1.0e9f64..1.0e9, 0..100)) {
        let column = Column::from_f64s(values);
        let sorted = column.sort();
        let boxed = column.to_object().sort();
        prop_assert_eq!(sorted.to_values(), boxed.to_values());
    }
}
