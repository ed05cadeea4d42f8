//! Per-type arithmetic strategies.
//!
//! Each numeric [`ValueType`] maps to one static [`NumericFactory`]. Expression nodes look the
//! factory up once, from their resolved type, and hand it whole columns.

use super::AggFn;
use crate::error::{FrameError, FrameResult};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::marker::PhantomData;
use tabula_columnar::{ArithOp, CmpOp, Column, ColumnError, Value, ValueType};

/// Widening precedence: the operand type with the lower rank wins.
fn rank(ty: ValueType) -> Option<u8> {
    match ty {
        ValueType::Decimal => Some(0),
        ValueType::Float64 => Some(1),
        ValueType::Float32 => Some(2),
        ValueType::Int64 => Some(3),
        ValueType::Int32 => Some(4),
        _ => None,
    }
}

/// Common evaluation type of two numeric operands.
pub(crate) fn resolve(op: &'static str, left: ValueType, right: ValueType) -> FrameResult<ValueType> {
    match (rank(left), rank(right)) {
        (Some(l), Some(r)) => Ok(if l <= r { left } else { right }),
        _ => Err(FrameError::ArithmeticType { op, left, right }),
    }
}

pub(crate) trait NumericFactory: Sync {
    fn value_type(&self) -> ValueType;

    /// Convert a column to this factory's type; text is parsed.
    fn cast(&self, column: &Column) -> FrameResult<Column>;

    fn arith(&self, op: ArithOp, left: &Column, right: &Column) -> FrameResult<Column>;

    fn compare(&self, op: CmpOp, left: &Column, right: &Column) -> FrameResult<Column>;

    fn aggregate(&self, func: AggFn, column: &Column) -> FrameResult<Value>;
}

static INT32: Factory<i32> = Factory(PhantomData);
static INT64: Factory<i64> = Factory(PhantomData);
static FLOAT32: Factory<f32> = Factory(PhantomData);
static FLOAT64: Factory<f64> = Factory(PhantomData);
static DECIMAL: Factory<Decimal> = Factory(PhantomData);

pub(crate) fn factory(ty: ValueType) -> FrameResult<&'static dyn NumericFactory> {
    match ty {
        ValueType::Int32 => Ok(&INT32),
        ValueType::Int64 => Ok(&INT64),
        ValueType::Float32 => Ok(&FLOAT32),
        ValueType::Float64 => Ok(&FLOAT64),
        ValueType::Decimal => Ok(&DECIMAL),
        ty => Err(FrameError::NotNumeric { ty }),
    }
}

/// A numeric representation usable by the boxed evaluation path.
pub(crate) trait Numeric: Copy + 'static {
    const TYPE: ValueType;

    /// Read a value of this type; nulls read as `None`.
    fn unbox(value: &Value) -> FrameResult<Option<Self>>;

    fn boxed(self) -> Value;

    fn apply(op: ArithOp, a: Self, b: Self) -> FrameResult<Self>;

    fn order(a: Self, b: Self) -> Option<Ordering>;
}

fn unbox_as<T>(value: &Value, ty: ValueType, pick: fn(Value) -> Option<T>) -> FrameResult<Option<T>> {
    match value.cast(ty)? {
        Value::Null => Ok(None),
        other => Ok(pick(other)),
    }
}

impl Numeric for i32 {
    const TYPE: ValueType = ValueType::Int32;

    fn unbox(value: &Value) -> FrameResult<Option<Self>> {
        unbox_as(value, Self::TYPE, |v| match v {
            Value::Int32(x) => Some(x),
            _ => None,
        })
    }

    fn boxed(self) -> Value {
        Value::Int32(self)
    }

    fn apply(op: ArithOp, a: Self, b: Self) -> FrameResult<Self> {
        Ok(match op {
            ArithOp::Add => a.wrapping_add(b),
            ArithOp::Sub => a.wrapping_sub(b),
            ArithOp::Mul => a.wrapping_mul(b),
            ArithOp::Div if b == 0 => return Err(ColumnError::DivisionByZero.into()),
            ArithOp::Div => a.wrapping_div(b),
            ArithOp::Rem if b == 0 => return Err(ColumnError::DivisionByZero.into()),
            ArithOp::Rem => a.wrapping_rem(b),
        })
    }

    fn order(a: Self, b: Self) -> Option<Ordering> {
        Some(a.cmp(&b))
    }
}

impl Numeric for i64 {
    const TYPE: ValueType = ValueType::Int64;

    fn unbox(value: &Value) -> FrameResult<Option<Self>> {
        unbox_as(value, Self::TYPE, |v| v.as_i64())
    }

    fn boxed(self) -> Value {
        Value::Int64(self)
    }

    fn apply(op: ArithOp, a: Self, b: Self) -> FrameResult<Self> {
        Ok(match op {
            ArithOp::Add => a.wrapping_add(b),
            ArithOp::Sub => a.wrapping_sub(b),
            ArithOp::Mul => a.wrapping_mul(b),
            ArithOp::Div if b == 0 => return Err(ColumnError::DivisionByZero.into()),
            ArithOp::Div => a.wrapping_div(b),
            ArithOp::Rem if b == 0 => return Err(ColumnError::DivisionByZero.into()),
            ArithOp::Rem => a.wrapping_rem(b),
        })
    }

    fn order(a: Self, b: Self) -> Option<Ordering> {
        Some(a.cmp(&b))
    }
}

impl Numeric for f32 {
    const TYPE: ValueType = ValueType::Float32;

    fn unbox(value: &Value) -> FrameResult<Option<Self>> {
        unbox_as(value, Self::TYPE, |v| match v {
            Value::Float32(x) => Some(x.0),
            _ => None,
        })
    }

    fn boxed(self) -> Value {
        Value::from(self)
    }

    fn apply(op: ArithOp, a: Self, b: Self) -> FrameResult<Self> {
        Ok(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Rem => a % b,
        })
    }

    fn order(a: Self, b: Self) -> Option<Ordering> {
        a.partial_cmp(&b)
    }
}

impl Numeric for f64 {
    const TYPE: ValueType = ValueType::Float64;

    fn unbox(value: &Value) -> FrameResult<Option<Self>> {
        unbox_as(value, Self::TYPE, |v| v.as_f64())
    }

    fn boxed(self) -> Value {
        Value::from(self)
    }

    fn apply(op: ArithOp, a: Self, b: Self) -> FrameResult<Self> {
        Ok(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            ArithOp::Rem => a % b,
        })
    }

    fn order(a: Self, b: Self) -> Option<Ordering> {
        a.partial_cmp(&b)
    }
}

impl Numeric for Decimal {
    const TYPE: ValueType = ValueType::Decimal;

    fn unbox(value: &Value) -> FrameResult<Option<Self>> {
        unbox_as(value, Self::TYPE, |v| match v {
            Value::Decimal(d) => Some(d),
            _ => None,
        })
    }

    fn boxed(self) -> Value {
        Value::Decimal(self)
    }

    fn apply(op: ArithOp, a: Self, b: Self) -> FrameResult<Self> {
        if matches!(op, ArithOp::Div | ArithOp::Rem) && b.is_zero() {
            return Err(ColumnError::DivisionByZero.into());
        }
        let out = match op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div => a.checked_div(b),
            ArithOp::Rem => a.checked_rem(b),
        };
        out.ok_or_else(|| ColumnError::Overflow { op: op.symbol() }.into())
    }

    fn order(a: Self, b: Self) -> Option<Ordering> {
        Some(a.cmp(&b))
    }
}

pub(crate) struct Factory<T>(PhantomData<fn() -> T>);

impl<T: Numeric> Factory<T> {
    fn operands(&self, op: &'static str, left: &Column, right: &Column) -> FrameResult<(Column, Column)> {
        if left.len() != right.len() {
            return Err(ColumnError::LengthMismatch {
                op,
                expected: left.len(),
                actual: right.len(),
            }
            .into());
        }
        Ok((self.cast(left)?, self.cast(right)?))
    }
}

impl<T: Numeric> NumericFactory for Factory<T> {
    fn value_type(&self) -> ValueType {
        T::TYPE
    }

    fn cast(&self, column: &Column) -> FrameResult<Column> {
        if column.value_type() == T::TYPE {
            return Ok(column.clone());
        }
        Ok(column.cast(T::TYPE)?)
    }

    fn arith(&self, op: ArithOp, left: &Column, right: &Column) -> FrameResult<Column> {
        let (left, right) = self.operands(op.symbol(), left, right)?;
        // Both operands now have type T; primitive storage exists only for i64 and f64.
        if left.is_primitive() && right.is_primitive() {
            return Ok(left.arith(op, &right)?);
        }
        log::trace!("{} {} on boxed operands", T::TYPE, op.symbol());
        let values = left
            .iter()
            .zip(right.iter())
            .map(|(a, b)| -> FrameResult<Value> {
                match (T::unbox(&a)?, T::unbox(&b)?) {
                    (Some(a), Some(b)) => Ok(T::apply(op, a, b)?.boxed()),
                    _ => Ok(Value::Null),
                }
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Ok(Column::from_values(T::TYPE, values))
    }

    fn compare(&self, op: CmpOp, left: &Column, right: &Column) -> FrameResult<Column> {
        let (left, right) = self.operands(op.symbol(), left, right)?;
        if left.is_primitive() && right.is_primitive() {
            return Ok(left.compare(op, &right)?);
        }
        log::trace!("{} {} on boxed operands", T::TYPE, op.symbol());
        let bits = left
            .iter()
            .zip(right.iter())
            .map(|(a, b)| -> FrameResult<bool> {
                match (T::unbox(&a)?, T::unbox(&b)?) {
                    (Some(a), Some(b)) => Ok(match T::order(a, b) {
                        Some(ord) => op.matches(ord),
                        None => op == CmpOp::Ne,
                    }),
                    _ => Ok(false),
                }
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Ok(Column::from_bools(bits))
    }

    fn aggregate(&self, func: AggFn, column: &Column) -> FrameResult<Value> {
        let column = self.cast(column)?;
        Ok(match func {
            AggFn::Sum => column.sum()?,
            AggFn::Min => column.min(),
            AggFn::Max => column.max(),
            AggFn::Avg => column.avg()?,
            AggFn::Median => column.median()?,
            AggFn::Count => Value::Int64((column.len() - column.null_count()) as i64),
        })
    }
}
