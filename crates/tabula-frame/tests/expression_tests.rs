use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use tabula_columnar::ColumnError;
use tabula_frame::{Column, Exp, FrameError, Table, Value, ValueType};

fn ints(values: &[i64]) -> Column {
    Column::from_i64s(values.to_vec())
}

fn boxed(ty: ValueType, values: Vec<Value>) -> Column {
    Column::from_values(ty, values)
}

#[test]
fn primitive_integer_addition_stays_primitive() {
    let t = Table::new(["a", "b"], vec![ints(&[1, 3]), ints(&[2, 4])]).unwrap();
    let out = Exp::int64("a").add(Exp::int64("b")).eval(&t).unwrap();
    assert!(out.is_primitive());
    assert_eq!(out.as_i64s(), Some(&[3, 7][..]));
}

#[test]
fn row_folded_integer_addition_takes_the_boxed_path() {
    let t = Table::from_rows(
        ["a", "b"],
        vec![
            vec![Value::Int64(1), Value::Int64(2)],
            vec![Value::Int64(3), Value::Int64(4)],
        ],
    )
    .unwrap();
    let out = Exp::int64("a").add(Exp::int64("b")).eval(&t).unwrap();
    assert!(!out.is_primitive());
    assert_eq!(out.value_type(), ValueType::Int64);
    assert_eq!(out.to_values(), vec![Value::Int64(3), Value::Int64(7)]);
}

#[test]
fn mixed_operands_widen_to_the_higher_type() {
    let t = Table::new(
        ["i", "f", "d"],
        vec![
            boxed(ValueType::Int32, vec![Value::Int32(1), Value::Int32(2)]),
            Column::from_f64s(vec![0.5, 0.25]),
            boxed(
                ValueType::Decimal,
                vec![Value::Decimal(Decimal::new(15, 1)), Value::Null],
            ),
        ],
    )
    .unwrap();

    let float = Exp::int32("i").add(Exp::float64("f")).eval(&t).unwrap();
    assert_eq!(float.value_type(), ValueType::Float64);
    assert_eq!(float.to_values(), vec![Value::from(1.5), Value::from(2.25)]);

    let decimal = Exp::int32("i").mul(Exp::decimal("d")).eval(&t).unwrap();
    assert_eq!(decimal.value_type(), ValueType::Decimal);
    assert_eq!(
        decimal.to_values(),
        vec![Value::Decimal(Decimal::new(15, 1)), Value::Null]
    );
}

#[test]
fn untyped_references_resolve_from_the_evaluated_columns() {
    let t = Table::new(
        ["a", "b"],
        vec![ints(&[1, 2]), Column::from_f64s(vec![0.5, 0.5])],
    )
    .unwrap();
    let out = Exp::column("a").sub(Exp::column("b")).eval(&t).unwrap();
    assert!(out.is_primitive());
    assert_eq!(out.as_f64s(), Some(&[0.5, 1.5][..]));
}

#[test]
fn text_columns_are_parsed_when_read_as_numbers() {
    let t = Table::new(
        ["s"],
        vec![boxed(ValueType::Str, vec![Value::from("12"), Value::from(" 30 ")])],
    )
    .unwrap();
    let out = Exp::int64("s").add(1i64).eval(&t).unwrap();
    assert_eq!(out.to_values(), vec![Value::Int64(13), Value::Int64(31)]);

    let bad = Table::new(["s"], vec![boxed(ValueType::Str, vec![Value::from("x")])]).unwrap();
    let err = Exp::int64("s").add(1i64).eval(&bad).unwrap_err();
    assert!(matches!(
        err,
        FrameError::Column(ColumnError::Parse { target: ValueType::Int64, .. })
    ));
}

#[test]
fn incompatible_types_are_a_type_error() {
    let t = Table::new(
        ["s", "n"],
        vec![boxed(ValueType::Str, vec![Value::from("a")]), ints(&[1])],
    )
    .unwrap();
    let err = Exp::column("s").add(Exp::column("n")).eval(&t).unwrap_err();
    assert!(matches!(
        err,
        FrameError::ArithmeticType {
            op: "+",
            left: ValueType::Str,
            right: ValueType::Int64
        }
    ));
}

#[test]
fn integer_division_by_zero_fails() {
    let t = Table::new(["a", "b"], vec![ints(&[4, 1]), ints(&[2, 0])]).unwrap();
    let err = Exp::int64("a").div(Exp::int64("b")).eval(&t).unwrap_err();
    assert!(matches!(err, FrameError::Column(ColumnError::DivisionByZero)));
}

#[test]
fn comparisons_treat_nulls_as_false() {
    let t = Table::new(
        ["a"],
        vec![boxed(
            ValueType::Int64,
            vec![Value::Int64(1), Value::Null, Value::Int64(3)],
        )],
    )
    .unwrap();
    let gt = Exp::int64("a").gt(1i64).eval(&t).unwrap();
    assert_eq!(
        gt.to_values(),
        vec![Value::Bool(false), Value::Bool(false), Value::Bool(true)]
    );
    let ne = Exp::int64("a").ne(3i64).eval(&t).unwrap();
    assert_eq!(
        ne.to_values(),
        vec![Value::Bool(true), Value::Bool(false), Value::Bool(false)]
    );
}

#[test]
fn text_comparisons_use_natural_order() {
    let t = Table::new(
        ["s"],
        vec![boxed(
            ValueType::Str,
            vec![Value::from("apple"), Value::from("pear"), Value::Null],
        )],
    )
    .unwrap();
    let out = Exp::text("s").lt(Exp::scalar("banana")).eval(&t).unwrap();
    assert_eq!(
        out.to_values(),
        vec![Value::Bool(true), Value::Bool(false), Value::Bool(false)]
    );
}

#[test]
fn conditions_filter_rows() {
    let t = Table::new(["a", "b"], vec![ints(&[1, 2, 3, 4]), ints(&[9, 8, 7, 6])]).unwrap();
    let cond = Exp::int64("a")
        .gt(1i64)
        .and(Exp::int64("b").gt(6i64))
        .or(Exp::int64("a").eq(4i64));
    let out = t.filter_exp(&cond).unwrap();
    assert_eq!(out.column("a").unwrap().as_i64s(), Some(&[2, 3, 4][..]));

    let negated = t.filter_exp(&Exp::int64("a").le(2i64).not()).unwrap();
    assert_eq!(negated.column("a").unwrap().as_i64s(), Some(&[3, 4][..]));

    let err = t.filter_exp(&Exp::int64("a")).unwrap_err();
    assert!(matches!(
        err,
        FrameError::Column(ColumnError::TypeMismatch {
            expected: ValueType::Bool,
            ..
        })
    ));
}

#[test]
fn concat_propagates_nulls() {
    let t = Table::new(
        ["s", "n"],
        vec![
            boxed(ValueType::Str, vec![Value::from("a"), Value::Null]),
            ints(&[1, 2]),
        ],
    )
    .unwrap();
    let out = Exp::text("s")
        .concat(Exp::scalar("-"))
        .concat(Exp::column("n"))
        .eval(&t)
        .unwrap();
    assert_eq!(out.to_values(), vec![Value::from("a-1"), Value::Null]);
}

#[test]
fn null_checks() {
    let t = Table::new(
        ["a"],
        vec![boxed(ValueType::Int64, vec![Value::Null, Value::Int64(1)])],
    )
    .unwrap();
    let nulls = Exp::column("a").is_null().eval(&t).unwrap();
    assert_eq!(nulls.to_values(), vec![Value::Bool(true), Value::Bool(false)]);
    let present = t.filter_exp(&Exp::column("a").is_not_null()).unwrap();
    assert_eq!(present.height(), 1);
}

#[test]
fn decimal_cast_rounds_half_up() {
    let t = Table::new(
        ["d"],
        vec![boxed(
            ValueType::Decimal,
            vec![
                Value::Decimal(Decimal::new(125, 2)),
                Value::Decimal(Decimal::new(-125, 2)),
                Value::Decimal(Decimal::new(2, 0)),
            ],
        )],
    )
    .unwrap();
    let out = Exp::decimal("d").cast_decimal(1).eval(&t).unwrap();
    let rendered: Vec<String> = out.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["1.3", "-1.3", "2.0"]);
}

#[test]
fn aggregate_nodes_reduce_to_one_row() {
    let t = Table::new(
        ["a", "f"],
        vec![ints(&[4, 1, 3]), Column::from_f64s(vec![1.0, 2.0, 4.0])],
    )
    .unwrap();
    let sum = Exp::int64("a").sum().eval(&t).unwrap();
    assert_eq!(sum.to_values(), vec![Value::Int64(8)]);
    let min = Exp::int64("a").min().eval(&t).unwrap();
    assert_eq!(min.to_values(), vec![Value::Int64(1)]);
    let avg = Exp::float64("f").avg().eval(&t).unwrap();
    assert_eq!(avg.to_values(), vec![Value::from(7.0 / 3.0)]);
    let median = Exp::int64("a").median().eval(&t).unwrap();
    assert_eq!(median.to_values(), vec![Value::from(3.0)]);

    let empty = t.head(0);
    let median = Exp::float64("f").median().eval(&empty).unwrap();
    assert_eq!(median.to_values(), vec![Value::from(0.0)]);
    let count = Exp::column("a").count().eval(&empty).unwrap();
    assert_eq!(count.to_values(), vec![Value::Int64(0)]);
}

#[test]
fn float_median_of_even_length_is_the_mean() {
    let column = Column::from_f64s(vec![2.0, 1.0]);
    let out = Exp::column("x").median().eval_column(&column).unwrap();
    assert_eq!(out.to_values(), vec![Value::from(1.5)]);
}

#[test]
fn add_column_exp_uses_the_expression_name() {
    let t = Table::new(["a"], vec![ints(&[1, 2])]).unwrap();
    let out = t
        .add_column_exp(&Exp::int64("a").mul(10i64).named("a10"))
        .unwrap()
        .add_column_exp(&Exp::int64("a").add(1i64))
        .unwrap();
    assert_eq!(out.column_names(), &["a", "a10", "a + 1"]);
    assert_eq!(out.column("a10").unwrap().as_i64s(), Some(&[10, 20][..]));
}

#[test]
fn positional_references() {
    let t = Table::new(["a", "b"], vec![ints(&[1, 2]), ints(&[5, 5])]).unwrap();
    let out = Exp::int64_at(1).sub(Exp::int64_at(0)).eval(&t).unwrap();
    assert_eq!(out.as_i64s(), Some(&[4, 3][..]));
    assert_eq!(
        Exp::float32_at(0).add(Exp::int32_at(1)).value_type(),
        ValueType::Float32
    );
    assert_eq!(
        Exp::decimal_at(0).mul(Exp::float64_at(1)).value_type(),
        ValueType::Decimal
    );
    assert!(matches!(
        Exp::int64_at(7).eval(&t),
        Err(FrameError::UnknownPosition { position: 7, width: 2 })
    ));
}
