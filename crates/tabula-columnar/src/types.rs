use crate::error::{ColumnError, ColumnResult};
use ordered_float::OrderedFloat;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Nominal element type of a column or expression.
///
/// `Any` is the type of heterogeneous object columns (e.g. a column of mixed values assembled
/// row by row) and of the null literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Str,
    Any,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::Int32
                | ValueType::Int64
                | ValueType::Float32
                | ValueType::Float64
                | ValueType::Decimal
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Float32 => "float32",
            ValueType::Float64 => "float64",
            ValueType::Decimal => "decimal",
            ValueType::Str => "string",
            ValueType::Any => "any",
        }
    }

    /// The value a null is read as when it is forced into this type, e.g. by a [`ValueHolder`].
    ///
    /// [`ValueHolder`]: crate::ValueHolder
    pub fn default_value(self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int32 => Value::Int32(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::Float32 => Value::Float32(OrderedFloat(0.0)),
            ValueType::Float64 => Value::Float64(OrderedFloat(0.0)),
            ValueType::Decimal => Value::Decimal(Decimal::ZERO),
            ValueType::Str | ValueType::Any => Value::Null,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single boxed cell value.
///
/// Floats are wrapped in [`OrderedFloat`] so values can be hashed and used as group or join keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(OrderedFloat<f32>),
    Float64(OrderedFloat<f64>),
    Decimal(Decimal),
    Str(Arc<str>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Nominal type of this value; nulls report `Any`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Any,
            Value::Bool(_) => ValueType::Bool,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Float32(_) => ValueType::Float32,
            Value::Float64(_) => ValueType::Float64,
            Value::Decimal(_) => ValueType::Decimal,
            Value::Str(_) => ValueType::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of integral values only; floats and decimals are not truncated here.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float32(v) => Some(f64::from(v.0)),
            Value::Float64(v) => Some(v.0),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int32(v) => Some(Decimal::from(*v)),
            Value::Int64(v) => Some(Decimal::from(*v)),
            Value::Float32(v) => Decimal::from_f32(v.0),
            Value::Float64(v) => Decimal::from_f64(v.0),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to `target`, parsing text where the target is numeric or boolean.
    ///
    /// Nulls stay null. Narrowing integer casts fail with [`ColumnError::Overflow`]; float to
    /// integer casts truncate toward zero.
    pub fn cast(&self, target: ValueType) -> ColumnResult<Value> {
        if self.is_null() || target == ValueType::Any || self.value_type() == target {
            return Ok(self.clone());
        }
        let mismatch = || ColumnError::TypeMismatch {
            expected: target,
            actual: self.value_type().name().to_string(),
        };
        let overflow = || ColumnError::Overflow { op: "cast" };

        if let Value::Str(text) = self {
            return parse_text(text, target);
        }

        match target {
            ValueType::Str => Ok(Value::Str(self.to_string().into())),
            ValueType::Bool => Err(mismatch()),
            ValueType::Int32 => {
                let wide = self.cast(ValueType::Int64)?;
                match wide {
                    Value::Int64(v) => i32::try_from(v).map(Value::Int32).map_err(|_| overflow()),
                    _ => Err(mismatch()),
                }
            }
            ValueType::Int64 => match self {
                Value::Int32(v) => Ok(Value::Int64(i64::from(*v))),
                Value::Float32(v) => Ok(Value::Int64(v.0 as i64)),
                Value::Float64(v) => Ok(Value::Int64(v.0 as i64)),
                Value::Decimal(d) => d.trunc().to_i64().map(Value::Int64).ok_or_else(overflow),
                _ => Err(mismatch()),
            },
            ValueType::Float32 => self
                .as_f64()
                .map(|v| Value::Float32(OrderedFloat(v as f32)))
                .ok_or_else(mismatch),
            ValueType::Float64 => self
                .as_f64()
                .map(|v| Value::Float64(OrderedFloat(v)))
                .ok_or_else(mismatch),
            ValueType::Decimal => match self {
                Value::Bool(_) => Err(mismatch()),
                other => other.as_decimal().map(Value::Decimal).ok_or_else(overflow),
            },
            ValueType::Any => Ok(self.clone()),
        }
    }

    /// Total order used by sorting: nulls sort after every non-null value, numbers compare
    /// across representations, and unrelated kinds order as bool < number < text.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float32(a), Value::Float32(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (a, b) if a.kind_rank() == 1 && b.kind_rank() == 1 => cmp_numbers(a, b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Str(_) => 2,
            Value::Null => 3,
            _ => 1,
        }
    }
}

fn cmp_numbers(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if matches!(a, Value::Decimal(_)) || matches!(b, Value::Decimal(_)) {
        if let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) {
            return x.cmp(&y);
        }
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    x.total_cmp(&y)
}

fn parse_text(text: &str, target: ValueType) -> ColumnResult<Value> {
    let trimmed = text.trim();
    let fail = || ColumnError::Parse {
        value: text.to_string(),
        target,
    };
    let value = match target {
        ValueType::Str | ValueType::Any => Value::Str(Arc::from(text)),
        ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(fail()),
        },
        ValueType::Int32 => Value::Int32(trimmed.parse().map_err(|_| fail())?),
        ValueType::Int64 => Value::Int64(trimmed.parse().map_err(|_| fail())?),
        ValueType::Float32 => Value::Float32(OrderedFloat(trimmed.parse().map_err(|_| fail())?)),
        ValueType::Float64 => Value::Float64(OrderedFloat(trimmed.parse().map_err(|_| fail())?)),
        ValueType::Decimal => Value::Decimal(
            trimmed
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map_err(|_| fail())?,
        ),
    };
    Ok(value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{}", v.0),
            Value::Float64(v) => write!(f, "{}", v.0),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(OrderedFloat(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(OrderedFloat(v))
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_parses_text() {
        assert_eq!(
            Value::from("42").cast(ValueType::Int64).unwrap(),
            Value::Int64(42)
        );
        assert_eq!(
            Value::from(" 1.25 ").cast(ValueType::Decimal).unwrap(),
            Value::Decimal(Decimal::new(125, 2))
        );
        let err = Value::from("abc").cast(ValueType::Int32).unwrap_err();
        assert!(matches!(err, ColumnError::Parse { target: ValueType::Int32, .. }));
    }

    #[test]
    fn cast_widens_and_narrows() {
        assert_eq!(Value::Int32(3).cast(ValueType::Float64).unwrap(), Value::from(3.0));
        assert_eq!(Value::from(2.9).cast(ValueType::Int64).unwrap(), Value::Int64(2));
        assert!(matches!(
            Value::Int64(i64::MAX).cast(ValueType::Int32),
            Err(ColumnError::Overflow { .. })
        ));
        assert_eq!(Value::Null.cast(ValueType::Int64).unwrap(), Value::Null);
    }

    #[test]
    fn total_cmp_puts_nulls_last_and_mixes_numbers() {
        assert_eq!(Value::Null.total_cmp(&Value::Int64(1)), Ordering::Greater);
        assert_eq!(Value::Int32(2).total_cmp(&Value::from(1.5)), Ordering::Greater);
        assert_eq!(
            Value::Int64(1).total_cmp(&Value::Decimal(Decimal::new(10, 1))),
            Ordering::Equal
        );
        assert_eq!(Value::Bool(true).total_cmp(&Value::from("a")), Ordering::Less);
    }
}
