use crate::accumulator::{Accumulator, UniqueAccumulator, ValueAccumulator};
use crate::bitmap::BitVec;
use crate::error::{ColumnError, ColumnResult};
use crate::kernels::{self, ArithOp, CmpOp};
use crate::sort;
use crate::types::{Value, ValueType};
use ordered_float::OrderedFloat;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// An immutable, fixed-length sequence of values of one nominal type.
///
/// The `Int64`, `Float64` and `Bool` variants store unboxed values and can never hold a null.
/// `Object` stores boxed [`Value`]s, may contain nulls, and carries the nominal type separately
/// (an object column of type `Int64` holds only `Value::Int64` or `Value::Null`).
///
/// Backing storage sits behind an `Arc`, so clones and derived tables share it.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Int64(Arc<[i64]>),
    Float64(Arc<[f64]>),
    Bool(Arc<BitVec>),
    Object {
        ty: ValueType,
        values: Arc<[Value]>,
    },
}

impl Column {
    pub fn from_i64s(values: impl Into<Arc<[i64]>>) -> Self {
        Column::Int64(values.into())
    }

    pub fn from_f64s(values: impl Into<Arc<[f64]>>) -> Self {
        Column::Float64(values.into())
    }

    pub fn from_bools(values: impl IntoIterator<Item = bool>) -> Self {
        Column::Bool(Arc::new(values.into_iter().collect()))
    }

    pub fn from_bits(bits: BitVec) -> Self {
        Column::Bool(Arc::new(bits))
    }

    /// An object column; values are stored as given, even when they would fit a primitive variant.
    pub fn from_values(ty: ValueType, values: impl Into<Arc<[Value]>>) -> Self {
        Column::Object {
            ty,
            values: values.into(),
        }
    }

    /// Build a column through a [`ValueAccumulator`], keeping primitive storage unless a null
    /// or a value of another type shows up.
    pub fn build(ty: ValueType, values: impl IntoIterator<Item = Value>) -> Self {
        let mut acc = ValueAccumulator::new(ty);
        for value in values {
            acc.push_value(value);
        }
        acc.to_column()
    }

    pub fn empty(ty: ValueType) -> Self {
        match ty {
            ValueType::Int64 => Column::Int64(Arc::from(Vec::new())),
            ValueType::Float64 => Column::Float64(Arc::from(Vec::new())),
            ValueType::Bool => Column::Bool(Arc::new(BitVec::new())),
            ty => Column::from_values(ty, Vec::new()),
        }
    }

    /// A column of `len` copies of `value`.
    pub fn repeat(ty: ValueType, value: &Value, len: usize) -> Self {
        Column::build(ty, std::iter::repeat(value.clone()).take(len))
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Object { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Column::Int64(_) => ValueType::Int64,
            Column::Float64(_) => ValueType::Float64,
            Column::Bool(_) => ValueType::Bool,
            Column::Object { ty, .. } => *ty,
        }
    }

    /// Whether values are stored unboxed; such columns contain no nulls.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Column::Object { .. })
    }

    pub fn as_i64s(&self) -> Option<&[i64]> {
        match self {
            Column::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64s(&self) -> Option<&[f64]> {
        match self {
            Column::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bits(&self) -> Option<&BitVec> {
        match self {
            Column::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_values(&self) -> Option<&[Value]> {
        match self {
            Column::Object { values, .. } => Some(values),
            _ => None,
        }
    }

    pub fn get(&self, index: usize) -> ColumnResult<Value> {
        self.check_position(index)?;
        Ok(self.value(index))
    }

    /// Boxed value at `index`. Panics when out of bounds, like slice indexing; use
    /// [`Column::get`] for a checked read.
    pub fn value(&self, index: usize) -> Value {
        match self {
            Column::Int64(v) => Value::Int64(v[index]),
            Column::Float64(v) => Value::Float64(OrderedFloat(v[index])),
            Column::Bool(v) => Value::Bool(v.get(index)),
            Column::Object { values, .. } => values[index].clone(),
        }
    }

    pub fn get_i64(&self, index: usize) -> ColumnResult<i64> {
        self.check_position(index)?;
        match self {
            Column::Int64(v) => Ok(v[index]),
            other => Err(other.not_a(ValueType::Int64)),
        }
    }

    pub fn get_f64(&self, index: usize) -> ColumnResult<f64> {
        self.check_position(index)?;
        match self {
            Column::Float64(v) => Ok(v[index]),
            other => Err(other.not_a(ValueType::Float64)),
        }
    }

    pub fn get_bool(&self, index: usize) -> ColumnResult<bool> {
        self.check_position(index)?;
        match self {
            Column::Bool(v) => Ok(v.get(index)),
            other => Err(other.not_a(ValueType::Bool)),
        }
    }

    pub fn is_null_at(&self, index: usize) -> bool {
        match self {
            Column::Object { values, .. } => values[index].is_null(),
            _ => false,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Object { values, .. } => values.iter().filter(|v| v.is_null()).count(),
            _ => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.value(i))
    }

    /// Copy out the values; the copy is independent of the column.
    pub fn to_values(&self) -> Vec<Value> {
        self.iter().collect()
    }

    /// The boxed representation of the same data.
    pub fn to_object(&self) -> Column {
        match self {
            Column::Object { .. } => self.clone(),
            _ => Column::from_values(self.value_type(), self.to_values()),
        }
    }

    fn check_position(&self, index: usize) -> ColumnResult<()> {
        let len = self.len();
        if index >= len {
            return Err(ColumnError::OutOfBounds { index, len });
        }
        Ok(())
    }

    fn not_a(&self, expected: ValueType) -> ColumnError {
        ColumnError::TypeMismatch {
            expected,
            actual: self.value_type().name().to_string(),
        }
    }

    /// Unchecked reindex; callers validate positions.
    fn take(&self, positions: &[usize]) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(positions.iter().map(|&p| v[p]).collect()),
            Column::Float64(v) => Column::Float64(positions.iter().map(|&p| v[p]).collect()),
            Column::Bool(v) => Column::from_bools(positions.iter().map(|&p| v.get(p))),
            Column::Object { ty, values } => Column::Object {
                ty: *ty,
                values: positions.iter().map(|&p| values[p].clone()).collect(),
            },
        }
    }

    /// Reindex by row positions; `output[i] = self[positions[i]]`.
    pub fn gather(&self, positions: &[usize]) -> ColumnResult<Column> {
        let len = self.len();
        if let Some(&index) = positions.iter().find(|&&p| p >= len) {
            return Err(ColumnError::OutOfBounds { index, len });
        }
        Ok(self.take(positions))
    }

    /// Reindex by row positions that may be absent.
    ///
    /// When every position is present the representation is preserved. Otherwise the result is
    /// an object column of the same nominal type with a null at each absent slot, since primitive
    /// storage has no way to express a missing value.
    pub fn gather_opt(&self, positions: &[Option<usize>]) -> ColumnResult<Column> {
        if positions.iter().all(Option::is_some) {
            let dense: Vec<usize> = positions.iter().flatten().copied().collect();
            return self.gather(&dense);
        }
        let len = self.len();
        if let Some(&index) = positions.iter().flatten().find(|&&p| p >= len) {
            return Err(ColumnError::OutOfBounds { index, len });
        }
        if self.is_primitive() {
            log::trace!(
                "gather with absent rows: {} column degrades to object storage",
                self.value_type()
            );
        }
        let values: Arc<[Value]> = positions
            .iter()
            .map(|p| match p {
                Some(p) => self.value(*p),
                None => Value::Null,
            })
            .collect();
        Ok(Column::Object {
            ty: self.value_type(),
            values,
        })
    }

    /// Keep the rows whose mask bit is set.
    pub fn select_mask(&self, mask: &BitVec) -> ColumnResult<Column> {
        kernels::check_len("select", self.len(), mask.len())?;
        let positions: Vec<usize> = mask.ones().collect();
        Ok(self.take(&positions))
    }

    pub fn select_by(&self, predicate: impl FnMut(&Value) -> bool) -> Column {
        self.take(&self.index(predicate))
    }

    /// Positions of the values matching `predicate`.
    pub fn index(&self, mut predicate: impl FnMut(&Value) -> bool) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter_map(|(i, v)| predicate(&v).then_some(i))
            .collect()
    }

    /// A mask with one bit per value, set where `predicate` matches.
    pub fn locate(&self, mut predicate: impl FnMut(&Value) -> bool) -> BitVec {
        self.iter().map(|v| predicate(&v)).collect()
    }

    /// Append `others` after this column. Columns that share one primitive variant stay
    /// primitive; anything else concatenates as objects.
    pub fn concat(&self, others: &[&Column]) -> Column {
        let all: Vec<&Column> = std::iter::once(self).chain(others.iter().copied()).collect();
        let total: usize = all.iter().map(|c| c.len()).sum();
        match self {
            Column::Int64(_) if all.iter().all(|c| c.as_i64s().is_some()) => {
                let mut out = Vec::with_capacity(total);
                for c in &all {
                    out.extend_from_slice(c.as_i64s().unwrap_or_default());
                }
                Column::from_i64s(out)
            }
            Column::Float64(_) if all.iter().all(|c| c.as_f64s().is_some()) => {
                let mut out = Vec::with_capacity(total);
                for c in &all {
                    out.extend_from_slice(c.as_f64s().unwrap_or_default());
                }
                Column::from_f64s(out)
            }
            Column::Bool(_) if all.iter().all(|c| c.as_bits().is_some()) => {
                Column::from_bools(all.iter().flat_map(|c| c.as_bits().into_iter().flat_map(BitVec::iter)))
            }
            _ => {
                let ty = if all.iter().all(|c| c.value_type() == self.value_type()) {
                    self.value_type()
                } else {
                    ValueType::Any
                };
                Column::from_values(ty, all.iter().flat_map(|c| c.iter()).collect::<Vec<_>>())
            }
        }
    }

    /// The first `n` values, or all of them when `n` exceeds the length.
    pub fn head(&self, n: usize) -> Column {
        let n = n.min(self.len());
        self.slice(0, n)
    }

    /// The last `n` values, or all of them when `n` exceeds the length.
    pub fn tail(&self, n: usize) -> Column {
        let len = self.len();
        let n = n.min(len);
        self.slice(len - n, len)
    }

    fn slice(&self, start: usize, end: usize) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(v[start..end].into()),
            Column::Float64(v) => Column::Float64(v[start..end].into()),
            Column::Bool(v) => Column::from_bools((start..end).map(|i| v.get(i))),
            Column::Object { ty, values } => Column::Object {
                ty: *ty,
                values: values[start..end].into(),
            },
        }
    }

    /// Distinct values in order of first occurrence.
    pub fn unique(&self) -> Column {
        match self {
            Column::Int64(v) => {
                let mut seen = HashSet::with_capacity(v.len());
                Column::Int64(v.iter().copied().filter(|x| seen.insert(*x)).collect())
            }
            Column::Float64(v) => {
                let mut seen = HashSet::with_capacity(v.len());
                Column::Float64(
                    v.iter()
                        .copied()
                        .filter(|x| seen.insert(OrderedFloat(*x)))
                        .collect(),
                )
            }
            Column::Bool(v) => {
                let mut out = Vec::with_capacity(2);
                for bit in v.iter() {
                    if !out.contains(&bit) {
                        out.push(bit);
                        if out.len() == 2 {
                            break;
                        }
                    }
                }
                Column::from_bools(out)
            }
            Column::Object { ty, values } => {
                let mut acc = UniqueAccumulator::new(*ty);
                for value in values.iter() {
                    acc.push_value(value.clone());
                }
                acc.to_column()
            }
        }
    }

    /// Natural ascending order with nulls last. Primitive columns are sorted directly on a copy
    /// of their raw buffer.
    pub fn sort(&self) -> Column {
        match self {
            Column::Int64(v) => {
                let mut data = v.to_vec();
                sort::sort_i64(&mut data);
                Column::from_i64s(data)
            }
            Column::Float64(v) => {
                let mut data = v.to_vec();
                sort::sort_f64(&mut data);
                Column::from_f64s(data)
            }
            Column::Bool(v) => {
                let ones = v.count_ones();
                let zeros = v.len() - ones;
                Column::from_bools((0..v.len()).map(|i| i >= zeros))
            }
            Column::Object { .. } => self.take(&self.sort_index()),
        }
    }

    pub fn sort_by(&self, cmp: impl FnMut(&Value, &Value) -> Ordering) -> Column {
        self.take(&self.sort_index_by(cmp))
    }

    /// The stable permutation that sorts this column in natural order.
    pub fn sort_index(&self) -> Vec<usize> {
        match self {
            Column::Int64(v) => sort::sorted_positions(v.len(), |a, b| v[a].cmp(&v[b])),
            Column::Float64(v) => sort::sorted_positions(v.len(), |a, b| v[a].total_cmp(&v[b])),
            Column::Bool(v) => sort::sorted_positions(v.len(), |a, b| v.get(a).cmp(&v.get(b))),
            Column::Object { values, .. } => {
                sort::sorted_positions(values.len(), |a, b| values[a].total_cmp(&values[b]))
            }
        }
    }

    pub fn sort_index_by(&self, mut cmp: impl FnMut(&Value, &Value) -> Ordering) -> Vec<usize> {
        let values = self.to_values();
        sort::sorted_positions(values.len(), |a, b| cmp(&values[a], &values[b]))
    }

    /// Convert every value to `ty`; see [`Value::cast`].
    ///
    /// Object columns stay object columns. Primitive columns stay primitive when `ty` has an
    /// unboxed variant.
    pub fn cast(&self, ty: ValueType) -> ColumnResult<Column> {
        match (self, ty) {
            (c, ty) if c.value_type() == ty => Ok(self.clone()),
            (Column::Int64(v), ValueType::Float64) => {
                Ok(Column::Float64(v.iter().map(|x| *x as f64).collect()))
            }
            (Column::Float64(v), ValueType::Int64) => {
                Ok(Column::Int64(v.iter().map(|x| *x as i64).collect()))
            }
            _ => {
                let values = self
                    .iter()
                    .map(|v| v.cast(ty))
                    .collect::<ColumnResult<Vec<_>>>()?;
                if self.is_primitive() {
                    Ok(Column::build(ty, values))
                } else {
                    Ok(Column::from_values(ty, values))
                }
            }
        }
    }

    /// Sum of the non-null values: `i64` for integer columns (wrapping), `f64` for floats, exact
    /// for decimals.
    pub fn sum(&self) -> ColumnResult<Value> {
        match self.numeric_kind("sum")? {
            NumericKind::Integer => Ok(Value::Int64(
                self.non_null()
                    .filter_map(|v| v.as_i64())
                    .fold(0i64, i64::wrapping_add),
            )),
            NumericKind::Float => Ok(Value::from(self.floats().sum::<f64>())),
            NumericKind::Decimal => {
                let mut total = Decimal::ZERO;
                for d in self.decimals() {
                    total = total
                        .checked_add(d)
                        .ok_or(ColumnError::Overflow { op: "sum" })?;
                }
                Ok(Value::Decimal(total))
            }
        }
    }

    /// Smallest non-null value in natural order; null for an empty or all-null column.
    pub fn min(&self) -> Value {
        match self {
            Column::Int64(v) => v.iter().min().map_or(Value::Null, |x| Value::Int64(*x)),
            Column::Float64(v) => v
                .iter()
                .copied()
                .min_by(f64::total_cmp)
                .map_or(Value::Null, Value::from),
            _ => self.non_null().min_by(Value::total_cmp).unwrap_or(Value::Null),
        }
    }

    pub fn max(&self) -> Value {
        match self {
            Column::Int64(v) => v.iter().max().map_or(Value::Null, |x| Value::Int64(*x)),
            Column::Float64(v) => v
                .iter()
                .copied()
                .max_by(f64::total_cmp)
                .map_or(Value::Null, Value::from),
            _ => self.non_null().max_by(Value::total_cmp).unwrap_or(Value::Null),
        }
    }

    /// Mean of the non-null values, null when there are none.
    pub fn avg(&self) -> ColumnResult<Value> {
        match self.numeric_kind("avg")? {
            NumericKind::Decimal => {
                let values: Vec<Decimal> = self.decimals().collect();
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let mut total = Decimal::ZERO;
                for d in &values {
                    total = total
                        .checked_add(*d)
                        .ok_or(ColumnError::Overflow { op: "avg" })?;
                }
                Ok(Value::Decimal(total / Decimal::from(values.len() as u64)))
            }
            _ => {
                let (sum, count) = self.floats().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
                if count == 0 {
                    return Ok(Value::Null);
                }
                Ok(Value::from(sum / count as f64))
            }
        }
    }

    /// Median of the non-null values.
    ///
    /// Integer and float columns produce `f64`; decimal columns produce a decimal where an
    /// even-length median is the half-up rounded mean of the two central values, at one digit
    /// past their scale. Empty input yields zero of the result type.
    pub fn median(&self) -> ColumnResult<Value> {
        match self.numeric_kind("median")? {
            NumericKind::Decimal => {
                let mut values: Vec<Decimal> = self.decimals().collect();
                sort::sort_by(&mut values, |a, b| a.cmp(b));
                Ok(Value::Decimal(median_decimal(&values)?))
            }
            _ => {
                let mut values: Vec<f64> = self.floats().collect();
                sort::sort_f64(&mut values);
                Ok(Value::from(median_f64(&values)))
            }
        }
    }

    fn numeric_kind(&self, op: &'static str) -> ColumnResult<NumericKind> {
        match self.value_type() {
            ValueType::Int32 | ValueType::Int64 => Ok(NumericKind::Integer),
            ValueType::Float32 | ValueType::Float64 => Ok(NumericKind::Float),
            ValueType::Decimal => Ok(NumericKind::Decimal),
            column_type => Err(ColumnError::Unsupported { op, column_type }),
        }
    }

    fn non_null(&self) -> impl Iterator<Item = Value> + '_ {
        self.iter().filter(|v| !v.is_null())
    }

    fn floats(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Column::Int64(v) => Box::new(v.iter().map(|x| *x as f64)),
            Column::Float64(v) => Box::new(v.iter().copied()),
            _ => Box::new(self.non_null().filter_map(|v| v.as_f64())),
        }
    }

    fn decimals(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.non_null().filter_map(|v| v.as_decimal())
    }

    /// Move values down by `offset` rows (up when negative). Vacated slots take `fill`, or null
    /// when no fill is given, which turns a primitive column into an object column.
    pub fn shift(&self, offset: isize, fill: Option<Value>) -> Column {
        let len = self.len();
        if offset == 0 || len == 0 {
            return self.clone();
        }
        let source = |i: usize| {
            let src = i as isize - offset;
            (0..len as isize).contains(&src).then_some(src as usize)
        };
        match fill {
            None => {
                let positions: Vec<Option<usize>> = (0..len).map(source).collect();
                // Positions come from 0..len, so the gather cannot fail.
                self.gather_opt(&positions).unwrap_or_else(|_| self.clone())
            }
            Some(fill) => Column::build(
                self.value_type(),
                (0..len).map(|i| source(i).map_or_else(|| fill.clone(), |p| self.value(p))),
            ),
        }
    }

    /// Replace the values whose mask bit is set. Rows past the end of a shorter mask are kept.
    pub fn replace(&self, mask: &BitVec, with: &Value) -> Column {
        self.replace_where(|i| i < mask.len() && mask.get(i), with)
    }

    /// Replace the values whose mask bit is unset, including rows past the end of the mask.
    pub fn replace_no_match(&self, mask: &BitVec, with: &Value) -> Column {
        self.replace_where(|i| i >= mask.len() || !mask.get(i), with)
    }

    fn replace_where(&self, hit: impl Fn(usize) -> bool, with: &Value) -> Column {
        match (self, with) {
            (Column::Int64(v), Value::Int64(w)) => Column::Int64(
                v.iter()
                    .enumerate()
                    .map(|(i, x)| if hit(i) { *w } else { *x })
                    .collect(),
            ),
            (Column::Float64(v), Value::Float64(w)) => Column::Float64(
                v.iter()
                    .enumerate()
                    .map(|(i, x)| if hit(i) { w.0 } else { *x })
                    .collect(),
            ),
            _ => Column::build(
                self.value_type(),
                self.iter()
                    .enumerate()
                    .map(|(i, v)| if hit(i) { with.clone() } else { v }),
            ),
        }
    }

    /// Replace nulls with `value`. Primitive columns have no nulls and are returned unchanged.
    pub fn fill_nulls(&self, value: &Value) -> Column {
        match self {
            Column::Object { ty, values } => Column::build(
                *ty,
                values
                    .iter()
                    .map(|v| if v.is_null() { value.clone() } else { v.clone() }),
            ),
            _ => self.clone(),
        }
    }

    /// Replace each null with the closest non-null value above it; leading nulls stay.
    pub fn fill_nulls_forward(&self) -> Column {
        match self {
            Column::Object { ty, values } => {
                let mut last = Value::Null;
                let filled: Vec<Value> = values
                    .iter()
                    .map(|v| {
                        if !v.is_null() {
                            last = v.clone();
                        }
                        last.clone()
                    })
                    .collect();
                Column::build(*ty, filled)
            }
            _ => self.clone(),
        }
    }

    /// Replace each null with the closest non-null value below it; trailing nulls stay.
    pub fn fill_nulls_backward(&self) -> Column {
        match self {
            Column::Object { ty, values } => {
                let mut next = Value::Null;
                let mut filled: Vec<Value> = values
                    .iter()
                    .rev()
                    .map(|v| {
                        if !v.is_null() {
                            next = v.clone();
                        }
                        next.clone()
                    })
                    .collect();
                filled.reverse();
                Column::build(*ty, filled)
            }
            _ => self.clone(),
        }
    }

    pub fn is_null(&self) -> Column {
        match self {
            Column::Object { values, .. } => Column::from_bools(values.iter().map(Value::is_null)),
            _ => Column::from_bits(BitVec::filled(self.len(), false)),
        }
    }

    pub fn is_not_null(&self) -> Column {
        match self {
            Column::Object { values, .. } => {
                Column::from_bools(values.iter().map(|v| !v.is_null()))
            }
            _ => Column::from_bits(BitVec::filled(self.len(), true)),
        }
    }

    /// Elementwise equality against any column. Same-variant primitive columns compare unboxed;
    /// everything else compares boxed values, so `Int64(1)` and `Int32(1)` are not equal.
    pub fn eq(&self, other: &Column) -> ColumnResult<Column> {
        self.equality(CmpOp::Eq, other)
    }

    pub fn ne(&self, other: &Column) -> ColumnResult<Column> {
        self.equality(CmpOp::Ne, other)
    }

    fn equality(&self, op: CmpOp, other: &Column) -> ColumnResult<Column> {
        if self.is_primitive() && other.is_primitive() && self.value_type() == other.value_type() {
            return self.compare(op, other);
        }
        kernels::check_len(op.symbol(), self.len(), other.len())?;
        let want = op == CmpOp::Eq;
        Ok(Column::from_bools(
            self.iter().zip(other.iter()).map(|(a, b)| (a == b) == want),
        ))
    }

    /// Elementwise arithmetic between two primitive columns of the same variant.
    pub fn arith(&self, op: ArithOp, other: &Column) -> ColumnResult<Column> {
        match (self, other) {
            (Column::Int64(a), Column::Int64(b)) => {
                Ok(Column::from_i64s(kernels::arith_i64(op, a, b)?))
            }
            (Column::Float64(a), Column::Float64(b)) => {
                Ok(Column::from_f64s(kernels::arith_f64(op, a, b)?))
            }
            _ => Err(self.primitive_mismatch(other)),
        }
    }

    /// Elementwise comparison between two primitive columns of the same variant.
    pub fn compare(&self, op: CmpOp, other: &Column) -> ColumnResult<Column> {
        let bits = match (self, other) {
            (Column::Int64(a), Column::Int64(b)) => kernels::compare_i64(op, a, b)?,
            (Column::Float64(a), Column::Float64(b)) => kernels::compare_f64(op, a, b)?,
            (Column::Bool(a), Column::Bool(b)) => kernels::compare_bool(op, a, b)?,
            _ => return Err(self.primitive_mismatch(other)),
        };
        Ok(Column::from_bits(bits))
    }

    fn primitive_mismatch(&self, other: &Column) -> ColumnError {
        let actual = if other.is_primitive() {
            other.value_type().name().to_string()
        } else {
            format!("boxed {}", other.value_type())
        };
        if self.is_primitive() {
            ColumnError::TypeMismatch {
                expected: self.value_type(),
                actual,
            }
        } else {
            ColumnError::Unsupported {
                op: "primitive elementwise operation",
                column_type: self.value_type(),
            }
        }
    }

    pub fn add(&self, other: &Column) -> ColumnResult<Column> {
        self.arith(ArithOp::Add, other)
    }

    pub fn sub(&self, other: &Column) -> ColumnResult<Column> {
        self.arith(ArithOp::Sub, other)
    }

    pub fn mul(&self, other: &Column) -> ColumnResult<Column> {
        self.arith(ArithOp::Mul, other)
    }

    pub fn div(&self, other: &Column) -> ColumnResult<Column> {
        self.arith(ArithOp::Div, other)
    }

    pub fn rem(&self, other: &Column) -> ColumnResult<Column> {
        self.arith(ArithOp::Rem, other)
    }

    pub fn lt(&self, other: &Column) -> ColumnResult<Column> {
        self.compare(CmpOp::Lt, other)
    }

    pub fn le(&self, other: &Column) -> ColumnResult<Column> {
        self.compare(CmpOp::Le, other)
    }

    pub fn gt(&self, other: &Column) -> ColumnResult<Column> {
        self.compare(CmpOp::Gt, other)
    }

    pub fn ge(&self, other: &Column) -> ColumnResult<Column> {
        self.compare(CmpOp::Ge, other)
    }

    /// Transform each value into an object column of type `ty`.
    pub fn map(&self, ty: ValueType, f: impl FnMut(Value) -> Value) -> Column {
        Column::from_values(ty, self.iter().map(f).collect::<Vec<_>>())
    }

    /// `n` values drawn without replacement, kept in their original relative order.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> ColumnResult<Column> {
        let positions = sample_positions(self.len(), n, rng)?;
        Ok(self.take(&positions))
    }
}

/// `n` distinct positions out of `0..len`, ascending.
pub fn sample_positions<R: Rng + ?Sized>(
    len: usize,
    n: usize,
    rng: &mut R,
) -> ColumnResult<Vec<usize>> {
    if n > len {
        return Err(ColumnError::SampleTooLarge {
            requested: n,
            available: len,
        });
    }
    let mut positions = rand::seq::index::sample(rng, len, n).into_vec();
    positions.sort_unstable();
    Ok(positions)
}

enum NumericKind {
    Integer,
    Float,
    Decimal,
}

fn median_f64(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Even-length means are `a + (b - a) / 2` with checked operations; when `b - a` overflows the
/// halves are summed instead.
fn median_decimal(sorted: &[Decimal]) -> ColumnResult<Decimal> {
    let n = sorted.len();
    match n {
        0 => return Ok(Decimal::ZERO),
        n if n % 2 == 1 => return Ok(sorted[n / 2]),
        _ => {}
    }
    let (a, b) = (sorted[n / 2 - 1], sorted[n / 2]);
    let two = Decimal::from(2);
    let mean = match b.checked_sub(a).and_then(|d| d.checked_div(two)) {
        Some(half) => a.checked_add(half),
        None => a
            .checked_div(two)
            .zip(b.checked_div(two))
            .and_then(|(x, y)| x.checked_add(y)),
    }
    .ok_or(ColumnError::Overflow { op: "median" })?;
    let scale = a.scale().max(b.scale()) + 1;
    Ok(mean.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
}
