use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use tabula_columnar::ColumnError;
use tabula_frame::{Aggregator, Column, Exp, FrameError, Table, Value, ValueType};

fn text(values: &[&str]) -> Column {
    Column::from_values(
        ValueType::Str,
        values.iter().map(|v| Value::from(*v)).collect::<Vec<_>>(),
    )
}

fn sample() -> Table {
    Table::new(
        ["a", "b"],
        vec![
            Column::from_i64s(vec![1, 2, 1, 0, 1]),
            text(&["x", "y", "z", "a", "x"]),
        ],
    )
    .unwrap()
}

#[test]
fn groups_follow_first_seen_key_order() {
    let groups = sample().group_by(&["a"]).unwrap();
    assert_eq!(groups.len(), 3);
    let keys: Vec<Value> = groups.keys().iter().map(|k| k[0].clone()).collect();
    assert_eq!(keys, vec![Value::Int64(1), Value::Int64(2), Value::Int64(0)]);

    let ones = groups.group(&[Value::Int64(1)]).unwrap().unwrap();
    assert_eq!(
        ones.column("b").unwrap().to_values(),
        vec![Value::from("x"), Value::from("z"), Value::from("x")]
    );
}

#[test]
fn null_keys_are_dropped() {
    let t = Table::new(
        ["k", "v"],
        vec![
            Column::from_values(
                ValueType::Int64,
                vec![Value::Int64(1), Value::Null, Value::Int64(1)],
            ),
            Column::from_i64s(vec![10, 20, 30]),
        ],
    )
    .unwrap();
    let groups = t.group_by(&["k"]).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.to_table().unwrap().column("v").unwrap().as_i64s(), Some(&[10, 30][..]));

    let by_fn = t
        .group_by_fn(|row| match row.get_named("v") {
            Ok(Value::Int64(v)) if v > 10 => Value::Null,
            Ok(v) => v,
            Err(_) => Value::Null,
        })
        .unwrap();
    assert_eq!(by_fn.len(), 1);
}

#[test]
fn aggregates_with_colliding_labels() {
    let out = sample()
        .group_by(&["a"])
        .unwrap()
        .agg(&[
            Aggregator::first("b"),
            Aggregator::sum_i64("a"),
            Aggregator::median_f64("a"),
        ])
        .unwrap();
    assert_eq!(out.column_names(), &["b", "a", "a_"]);
    assert_eq!(
        out.to_rows(),
        vec![
            vec![Value::from("x"), Value::Int64(3), Value::from(1.0)],
            vec![Value::from("y"), Value::Int64(2), Value::from(2.0)],
            vec![Value::from("a"), Value::Int64(0), Value::from(0.0)],
        ]
    );
}

#[test]
fn concat_aggregator() {
    let out = sample()
        .group_by(&["a"])
        .unwrap()
        .agg(&[
            Aggregator::concat("b", ";"),
            Aggregator::concat_with("b", ",", "[", "]").named("wrapped"),
            Aggregator::count(),
        ])
        .unwrap();
    assert_eq!(
        out.column("b").unwrap().to_values(),
        vec![Value::from("x;z;x"), Value::from("y"), Value::from("a")]
    );
    assert_eq!(out.get(0, 1).unwrap(), Value::from("[x,z,x]"));
    assert_eq!(out.column("count").unwrap().as_i64s(), Some(&[3, 1, 1][..]));
}

#[test]
fn decimal_median_per_group() {
    let t = Table::new(
        ["g", "d"],
        vec![
            Column::from_i64s(vec![1, 1, 2, 2, 2]),
            Column::from_values(
                ValueType::Decimal,
                [1, 2, 1, 2, 3]
                    .iter()
                    .map(|v| Value::Decimal(Decimal::from(*v)))
                    .collect::<Vec<_>>(),
            ),
        ],
    )
    .unwrap();
    let out = t
        .group_by(&["g"])
        .unwrap()
        .agg(&[Aggregator::median_decimal("d")])
        .unwrap();
    assert_eq!(
        out.column("d").unwrap().to_values(),
        vec![
            Value::Decimal(Decimal::new(15, 1)),
            Value::Decimal(Decimal::from(2))
        ]
    );
}

#[test]
fn custom_and_typed_aggregators() {
    let t = Table::new(
        ["g", "f"],
        vec![
            Column::from_i64s(vec![0, 0, 1]),
            Column::from_f64s(vec![1.5, 2.5, 4.0]),
        ],
    )
    .unwrap();
    let out = t
        .group_by(&["g"])
        .unwrap()
        .agg(&[
            Aggregator::first("g"),
            Aggregator::sum_f64("f").named("total"),
            Aggregator::last("f").named("last"),
            Aggregator::min("f").named("min"),
            Aggregator::max("f").named("max"),
            Aggregator::avg("f").named("avg"),
            Aggregator::custom("spread", "f", ValueType::Float64, |c| {
                match (c.max(), c.min()) {
                    (Value::Float64(hi), Value::Float64(lo)) => Value::from(hi.0 - lo.0),
                    _ => Value::Null,
                }
            }),
        ])
        .unwrap();
    assert_eq!(out.column("g").unwrap().as_i64s(), Some(&[0, 1][..]));
    assert_eq!(out.column("total").unwrap().as_f64s(), Some(&[4.0, 4.0][..]));
    assert_eq!(out.column("last").unwrap().as_f64s(), Some(&[2.5, 4.0][..]));
    assert_eq!(out.column("min").unwrap().as_f64s(), Some(&[1.5, 4.0][..]));
    assert_eq!(out.column("max").unwrap().as_f64s(), Some(&[2.5, 4.0][..]));
    assert_eq!(out.column("avg").unwrap().as_f64s(), Some(&[2.0, 4.0][..]));
    assert_eq!(out.column("spread").unwrap().as_f64s(), Some(&[1.0, 0.0][..]));
}

#[test]
fn rank_follows_the_group_sort() {
    let groups = sample().group_by(&["a"]).unwrap();
    let unsorted = groups.rank().unwrap();
    assert_eq!(unsorted.as_i64s(), Some(&[1, 1, 1, 1, 1][..]));

    let sorted = groups.sort(&[Exp::text("b").asc()]).unwrap();
    assert_eq!(sorted.rank().unwrap().as_i64s(), Some(&[1, 1, 3, 1, 1][..]));
    assert_eq!(sorted.dense_rank().unwrap().as_i64s(), Some(&[1, 1, 2, 1, 1][..]));
    assert_eq!(sorted.row_number().unwrap().as_i64s(), Some(&[1, 1, 3, 1, 2][..]));
}

#[test]
fn ranks_of_ungrouped_rows_are_null() {
    let t = Table::new(
        ["k"],
        vec![Column::from_values(
            ValueType::Str,
            vec![Value::from("p"), Value::Null, Value::from("p")],
        )],
    )
    .unwrap();
    let numbers = t.group_by(&["k"]).unwrap().row_number().unwrap();
    assert_eq!(
        numbers.to_values(),
        vec![Value::Int64(1), Value::Null, Value::Int64(2)]
    );
}

#[test]
fn per_group_head_tail_and_sort() {
    let groups = sample().group_by(&["a"]).unwrap();
    let sorted = groups.sort(&[Exp::text("b").desc()]).unwrap();
    let top = sorted.head(1).to_table().unwrap();
    assert_eq!(
        top.column("b").unwrap().to_values(),
        vec![Value::from("z"), Value::from("y"), Value::from("a")]
    );
    let last = groups.tail(2).to_table().unwrap();
    assert_eq!(last.column("a").unwrap().as_i64s(), Some(&[1, 1, 2, 0][..]));
}

#[test]
fn group_by_expression() {
    let t = Table::new(["n"], vec![Column::from_i64s(vec![1, 2, 3, 4, 5])]).unwrap();
    let groups = t.group_by_exp(&Exp::int64("n").rem(2i64)).unwrap();
    assert_eq!(groups.keys(), &[vec![Value::Int64(1)], vec![Value::Int64(0)]]);
    let sums = groups.agg(&[Aggregator::sum_i64("n")]).unwrap();
    assert_eq!(sums.column("n").unwrap().as_i64s(), Some(&[9, 6][..]));
}

#[test]
fn whole_table_aggregation() {
    let out = sample()
        .agg(&[Aggregator::count(), Aggregator::max("b"), Aggregator::sum_decimal("a")])
        .unwrap();
    assert_eq!(
        out.to_rows(),
        vec![vec![Value::Int64(5), Value::from("z"), Value::Decimal(Decimal::from(5))]]
    );
}

#[test]
fn group_key_expression_must_match_height() {
    let t = Table::new(["n"], vec![Column::from_i64s(vec![1, 2, 3])]).unwrap();
    assert!(matches!(
        t.group_by_exp(&Exp::int64("n").sum()),
        Err(FrameError::Column(ColumnError::LengthMismatch { expected: 3, actual: 1, .. }))
    ));
}

#[test]
fn decimal_median_at_the_range_limit() {
    let t = Table::new(
        ["g", "d"],
        vec![
            Column::from_i64s(vec![1, 1]),
            Column::from_values(
                ValueType::Decimal,
                vec![Value::Decimal(Decimal::MAX), Value::Decimal(Decimal::MAX)],
            ),
        ],
    )
    .unwrap();
    let out = t
        .group_by(&["g"])
        .unwrap()
        .agg(&[Aggregator::median_decimal("d")])
        .unwrap();
    assert_eq!(out.get(0, 0).unwrap(), Value::Decimal(Decimal::MAX));
    assert_eq!(
        t.agg(&[Aggregator::median_decimal("d")]).unwrap().get(0, 0).unwrap(),
        Value::Decimal(Decimal::MAX)
    );
}
