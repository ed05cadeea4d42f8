use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tabula_columnar::{Column, Value, ValueType};

fn object_ints(values: &[i64]) -> Column {
    Column::from_values(
        ValueType::Int64,
        values.iter().map(|v| Value::Int64(*v)).collect::<Vec<_>>(),
    )
}

#[test]
fn absent_positions_become_nulls() {
    let column = Column::from_f64s(vec![1.5, 2.5, 3.5]);
    let out = column.gather_opt(&[None, Some(2), None, Some(0)]).unwrap();

    assert!(!out.is_primitive());
    assert_eq!(out.value_type(), ValueType::Float64);
    assert_eq!(
        out.to_values(),
        vec![Value::Null, Value::from(3.5), Value::Null, Value::from(1.5)]
    );
}

#[test]
fn bool_columns_degrade_the_same_way() {
    let column = Column::from_bools([true, false]);
    let out = column.gather_opt(&[Some(1), None]).unwrap();
    assert_eq!(out.value_type(), ValueType::Bool);
    assert_eq!(out.to_values(), vec![Value::Bool(false), Value::Null]);
}

#[test]
fn mask_selection_checks_length() {
    let column = Column::from_i64s(vec![5, 6, 7]);
    let mask = column.locate(|v| v.as_i64().is_some_and(|x| x != 6));
    assert_eq!(column.select_mask(&mask).unwrap(), Column::from_i64s(vec![5, 7]));

    let short = Column::from_i64s(vec![1]).locate(|_| true);
    assert!(column.select_mask(&short).is_err());
}

proptest! {
    #[test]
    fn identity_gather_is_a_no_op(values in proptest::collection::vec(any::<i64>(), 0..64)) {
        let column = Column::from_i64s(values.clone());
        let identity: Vec<usize> = (0..values.len()).collect();
        prop_assert_eq!(column.gather(&identity).unwrap(), column.clone());

        let present: Vec<Option<usize>> = identity.iter().copied().map(Some).collect();
        prop_assert_eq!(column.gather_opt(&present).unwrap(), column);
    }

    #[test]
    fn primitive_and_object_representations_agree(
        values in proptest::collection::vec(-50i64..50, 0..64),
        other in proptest::collection::vec(-50i64..50, 0..16),
    ) {
        let primitive = Column::from_i64s(values.clone());
        let boxed = object_ints(&values);

        prop_assert_eq!(primitive.sort().to_values(), boxed.sort().to_values());
        prop_assert_eq!(primitive.sort_index(), boxed.sort_index());
        prop_assert_eq!(primitive.unique().to_values(), boxed.unique().to_values());

        let positive = |v: &Value| v.as_i64().is_some_and(|x| x > 0);
        prop_assert_eq!(
            primitive.select_by(positive).to_values(),
            boxed.select_by(positive).to_values()
        );

        let tail = Column::from_i64s(other.clone());
        prop_assert_eq!(
            primitive.concat(&[&tail]).to_values(),
            boxed.concat(&[&object_ints(&other)]).to_values()
        );
    }

    #[test]
    fn gather_with_absent_rows_keeps_present_values(
        values in proptest::collection::vec(any::<i64>(), 1..32),
        picks in proptest::collection::vec(proptest::option::of(0usize..32), 1..32),
    ) {
        let column = Column::from_i64s(values.clone());
        let picks: Vec<Option<usize>> = picks
            .into_iter()
            .map(|p| p.map(|p| p % values.len()))
            .collect();
        let out = column.gather_opt(&picks).unwrap();

        prop_assert_eq!(out.is_primitive(), picks.iter().all(Option::is_some));
        for (slot, pick) in picks.iter().enumerate() {
            let expected = pick.map_or(Value::Null, |p| Value::Int64(values[p]));
            prop_assert_eq!(out.value(slot), expected);
        }
    }
}
