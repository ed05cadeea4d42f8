use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tabula_columnar::ColumnError;
use tabula_frame::{Column, Exp, FrameError, Table, Value, ValueType};

#[test]
fn dense_rank_of_presorted_keys() {
    let t = Table::new(["k"], vec![Column::from_i64s(vec![1, 1, 3, 3, 3, 5])]).unwrap();
    let by_k = [Exp::int64("k").asc()];
    assert_eq!(
        t.dense_rank(&by_k).unwrap().as_i64s(),
        Some(&[1, 1, 2, 2, 2, 3][..])
    );
    assert_eq!(
        t.rank(&by_k).unwrap().as_i64s(),
        Some(&[1, 1, 3, 3, 3, 6][..])
    );
}

#[test]
fn ranks_are_aligned_to_source_rows() {
    let t = Table::new(["k"], vec![Column::from_f64s(vec![2.5, 0.5, 2.5, 1.0])]).unwrap();
    let by_k = [Exp::float64("k").asc()];
    assert_eq!(t.rank(&by_k).unwrap().as_i64s(), Some(&[3, 1, 3, 2][..]));
    assert_eq!(t.row_number_by(&by_k).unwrap().as_i64s(), Some(&[3, 1, 4, 2][..]));
    assert_eq!(t.row_number().as_i64s(), Some(&[1, 2, 3, 4][..]));
}

#[test]
fn descending_multi_key_sort() {
    let t = Table::new(
        ["a", "b"],
        vec![
            Column::from_i64s(vec![1, 2, 1, 2]),
            Column::from_values(
                ValueType::Str,
                vec![
                    Value::from("p"),
                    Value::from("q"),
                    Value::from("r"),
                    Value::Null,
                ],
            ),
        ],
    )
    .unwrap();
    let out = t
        .sort(&[Exp::int64("a").desc(), Exp::text("b").asc()])
        .unwrap();
    assert_eq!(
        out.column("b").unwrap().to_values(),
        vec![Value::from("q"), Value::Null, Value::from("p"), Value::from("r")]
    );
    assert!(out.column("a").unwrap().is_primitive());
}

#[test]
fn sort_by_expression_and_row_comparator() {
    let t = Table::new(
        ["a", "b"],
        vec![Column::from_i64s(vec![3, 1, 2]), Column::from_i64s(vec![0, 5, 1])],
    )
    .unwrap();
    let by_sum = t.sort(&[Exp::int64("a").add(Exp::int64("b")).asc()]).unwrap();
    assert_eq!(by_sum.column("a").unwrap().as_i64s(), Some(&[3, 2, 1][..]));

    let by_rows = t
        .sort_by_rows(|x, y| {
            let key = |r: &tabula_frame::Row<'_>| r.get(1).unwrap_or(Value::Null);
            key(y).total_cmp(&key(x))
        })
        .unwrap();
    assert_eq!(by_rows.column("b").unwrap().as_i64s(), Some(&[5, 1, 0][..]));
    assert_eq!(t.sort_by_columns(&["a"]).unwrap().get(0, 0).unwrap(), Value::Int64(1));
}

#[test]
fn column_sort_matches_table_sort() {
    let column = Column::from_i64s(vec![5, -1, 3, 3, 0]);
    let t = Table::new(["c"], vec![column.clone()]).unwrap();
    assert_eq!(t.sort_index(&[Exp::int64("c").asc()]).unwrap(), column.sort_index());
    assert_eq!(t.sort(&[Exp::int64("c").asc()]).unwrap().column_at(0).unwrap(), &column.sort());
}

#[test]
fn aggregate_sort_keys_are_rejected() {
    let t = Table::new(["a"], vec![Column::from_i64s(vec![3, 1, 2])]).unwrap();
    let total = [Exp::int64("a").sum().asc()];
    assert!(matches!(
        t.sort(&total),
        Err(FrameError::Column(ColumnError::LengthMismatch { expected: 3, actual: 1, .. }))
    ));
    assert!(matches!(
        t.rank(&total),
        Err(FrameError::Column(ColumnError::LengthMismatch { .. }))
    ));
    let groups = t.group_by(&["a"]).unwrap();
    assert!(matches!(
        groups.sort(&total),
        Err(FrameError::Column(ColumnError::LengthMismatch { .. }))
    ));
}

proptest! {
    #[test]
    fn constant_key_sort_is_stable(values in prop::collection::vec(any::<i64>(), 0..64)) {
        let t = Table::new(
            ["k", "v"],
            vec![Column::from_i64s(vec![7; values.len()]), Column::from_i64s(values.clone())],
        )
        .unwrap();
        let sorted = t.sort(&[Exp::int64("k").asc()]).unwrap();
        prop_assert_eq!(sorted, t);
    }

    #[test]
    fn multi_key_sort_agrees_with_std(rows in prop::collection::vec((0i64..4, -50i64..50), 0..64)) {
        let (a, b): (Vec<i64>, Vec<i64>) = rows.iter().copied().unzip();
        let t = Table::new(["a", "b"], vec![Column::from_i64s(a), Column::from_i64s(b)]).unwrap();
        let index = t.sort_index(&[Exp::int64("a").asc(), Exp::int64("b").desc()]).unwrap();

        let mut expected: Vec<usize> = (0..rows.len()).collect();
        expected.sort_by(|&x, &y| rows[x].0.cmp(&rows[y].0).then(rows[y].1.cmp(&rows[x].1)));
        prop_assert_eq!(index, expected);
    }
}
