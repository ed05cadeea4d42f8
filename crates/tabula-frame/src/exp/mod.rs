//! Typed expressions over tables.
//!
//! An [`Exp`] is a pure function from a table (or a single column) to a column. Every node has a
//! nominal [`ValueType`]; binary arithmetic resolves its evaluation type when the node is built,
//! and evaluation dispatches to the numeric factory for that type. The factory runs unboxed
//! kernels when both evaluated operands are primitive and falls back to a boxed loop otherwise.

mod condition;
pub(crate) mod numeric;

use crate::error::FrameResult;
use crate::sort::Sorter;
use crate::table::Table;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use tabula_columnar::{ArithOp, BitVec, CmpOp, Column, ColumnError, Value, ValueType};

/// Reductions available as expression nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggFn {
    Sum,
    Min,
    Max,
    Avg,
    Median,
    Count,
}

impl AggFn {
    fn name(self) -> &'static str {
        match self {
            AggFn::Sum => "sum",
            AggFn::Min => "min",
            AggFn::Max => "max",
            AggFn::Avg => "avg",
            AggFn::Median => "median",
            AggFn::Count => "count",
        }
    }

    /// Result type of this reduction over an input of type `ty`.
    pub fn result_type(self, ty: ValueType) -> ValueType {
        match (self, ty) {
            (AggFn::Count, _) => ValueType::Int64,
            (AggFn::Min | AggFn::Max, ty) => ty,
            (AggFn::Sum, ValueType::Int32 | ValueType::Int64) => ValueType::Int64,
            (_, ValueType::Decimal) => ValueType::Decimal,
            (_, ty) if ty.is_numeric() => ValueType::Float64,
            _ => ValueType::Any,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Exp {
    Column {
        name: String,
        ty: ValueType,
    },
    Position {
        position: usize,
        ty: ValueType,
    },
    Scalar(Value),
    Cast {
        ty: ValueType,
        inner: Box<Exp>,
    },
    CastDecimal {
        scale: u32,
        inner: Box<Exp>,
    },
    /// `ty` is the resolved evaluation type, or `None` when an operand is untyped and the type
    /// is resolved from the evaluated columns instead.
    Arithmetic {
        op: ArithOp,
        ty: Option<ValueType>,
        left: Box<Exp>,
        right: Box<Exp>,
    },
    Compare {
        op: CmpOp,
        left: Box<Exp>,
        right: Box<Exp>,
    },
    Concat(Vec<Exp>),
    And(Vec<Exp>),
    Or(Vec<Exp>),
    Not(Box<Exp>),
    IsNull(Box<Exp>),
    IsNotNull(Box<Exp>),
    Aggregate {
        func: AggFn,
        inner: Box<Exp>,
    },
    Named {
        name: String,
        inner: Box<Exp>,
    },
}

/// What column references resolve against.
#[derive(Clone, Copy)]
pub(crate) enum Source<'a> {
    Table(&'a Table),
    /// Every reference, by name or position, resolves to this column.
    Column(&'a Column),
}

impl<'a> Source<'a> {
    fn height(&self) -> usize {
        match self {
            Source::Table(t) => t.height(),
            Source::Column(c) => c.len(),
        }
    }

    fn by_name(&self, name: &str) -> FrameResult<&'a Column> {
        match self {
            Source::Table(t) => t.column(name),
            Source::Column(c) => Ok(c),
        }
    }

    fn by_position(&self, position: usize) -> FrameResult<&'a Column> {
        match self {
            Source::Table(t) => t.column_at(position),
            Source::Column(c) => Ok(c),
        }
    }
}

impl Exp {
    /// Untyped column reference; the evaluation type comes from the column itself.
    pub fn column(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Any)
    }

    pub fn int32(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Int32)
    }

    pub fn int64(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Int64)
    }

    pub fn float32(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Float32)
    }

    pub fn float64(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Float64)
    }

    pub fn decimal(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Decimal)
    }

    pub fn boolean(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Bool)
    }

    pub fn text(name: impl Into<String>) -> Exp {
        Exp::typed(name, ValueType::Str)
    }

    /// Column reference that reads the column as `ty`, casting when the stored type differs.
    pub fn typed(name: impl Into<String>, ty: ValueType) -> Exp {
        Exp::Column {
            name: name.into(),
            ty,
        }
    }

    pub fn column_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Any)
    }

    pub fn int32_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Int32)
    }

    pub fn int64_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Int64)
    }

    pub fn float32_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Float32)
    }

    pub fn float64_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Float64)
    }

    pub fn decimal_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Decimal)
    }

    pub fn boolean_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Bool)
    }

    pub fn text_at(position: usize) -> Exp {
        Exp::typed_at(position, ValueType::Str)
    }

    pub fn typed_at(position: usize, ty: ValueType) -> Exp {
        Exp::Position { position, ty }
    }

    pub fn scalar(value: impl Into<Value>) -> Exp {
        Exp::Scalar(value.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Exp::Column { ty, .. } | Exp::Position { ty, .. } | Exp::Cast { ty, .. } => *ty,
            Exp::Scalar(v) => v.value_type(),
            Exp::CastDecimal { .. } => ValueType::Decimal,
            Exp::Arithmetic { ty, .. } => ty.unwrap_or(ValueType::Any),
            Exp::Compare { .. }
            | Exp::And(_)
            | Exp::Or(_)
            | Exp::Not(_)
            | Exp::IsNull(_)
            | Exp::IsNotNull(_) => ValueType::Bool,
            Exp::Concat(_) => ValueType::Str,
            Exp::Aggregate { func, inner } => func.result_type(inner.value_type()),
            Exp::Named { inner, .. } => inner.value_type(),
        }
    }

    /// Output label used when the expression becomes a table column.
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn named(self, name: impl Into<String>) -> Exp {
        Exp::Named {
            name: name.into(),
            inner: Box::new(self),
        }
    }

    pub fn cast(self, ty: ValueType) -> Exp {
        Exp::Cast {
            ty,
            inner: Box::new(self),
        }
    }

    /// Cast to decimal with exactly `scale` fractional digits, rounding half-up.
    pub fn cast_decimal(self, scale: u32) -> Exp {
        Exp::CastDecimal {
            scale,
            inner: Box::new(self),
        }
    }

    fn arithmetic(op: ArithOp, left: Exp, right: Exp) -> Exp {
        let ty = numeric::resolve(op.symbol(), left.value_type(), right.value_type()).ok();
        Exp::Arithmetic {
            op,
            ty,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn add(self, other: impl Into<Exp>) -> Exp {
        Exp::arithmetic(ArithOp::Add, self, other.into())
    }

    pub fn sub(self, other: impl Into<Exp>) -> Exp {
        Exp::arithmetic(ArithOp::Sub, self, other.into())
    }

    pub fn mul(self, other: impl Into<Exp>) -> Exp {
        Exp::arithmetic(ArithOp::Mul, self, other.into())
    }

    pub fn div(self, other: impl Into<Exp>) -> Exp {
        Exp::arithmetic(ArithOp::Div, self, other.into())
    }

    pub fn rem(self, other: impl Into<Exp>) -> Exp {
        Exp::arithmetic(ArithOp::Rem, self, other.into())
    }

    fn comparison(op: CmpOp, left: Exp, right: Exp) -> Exp {
        Exp::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn lt(self, other: impl Into<Exp>) -> Exp {
        Exp::comparison(CmpOp::Lt, self, other.into())
    }

    pub fn le(self, other: impl Into<Exp>) -> Exp {
        Exp::comparison(CmpOp::Le, self, other.into())
    }

    pub fn gt(self, other: impl Into<Exp>) -> Exp {
        Exp::comparison(CmpOp::Gt, self, other.into())
    }

    pub fn ge(self, other: impl Into<Exp>) -> Exp {
        Exp::comparison(CmpOp::Ge, self, other.into())
    }

    pub fn eq(self, other: impl Into<Exp>) -> Exp {
        Exp::comparison(CmpOp::Eq, self, other.into())
    }

    pub fn ne(self, other: impl Into<Exp>) -> Exp {
        Exp::comparison(CmpOp::Ne, self, other.into())
    }

    /// String concatenation; a null in any part makes the row null.
    pub fn concat(self, other: impl Into<Exp>) -> Exp {
        let mut parts = match self {
            Exp::Concat(parts) => parts,
            other => vec![other],
        };
        parts.push(other.into());
        Exp::Concat(parts)
    }

    /// Conjunction. Nested conjunctions are merged into one operand list.
    pub fn and(self, other: impl Into<Exp>) -> Exp {
        let mut parts = Vec::new();
        for exp in [self, other.into()] {
            match exp {
                Exp::And(inner) => parts.extend(inner),
                exp => parts.push(exp),
            }
        }
        Exp::And(parts)
    }

    /// Disjunction. Nested disjunctions are merged into one operand list.
    pub fn or(self, other: impl Into<Exp>) -> Exp {
        let mut parts = Vec::new();
        for exp in [self, other.into()] {
            match exp {
                Exp::Or(inner) => parts.extend(inner),
                exp => parts.push(exp),
            }
        }
        Exp::Or(parts)
    }

    pub fn not(self) -> Exp {
        Exp::Not(Box::new(self))
    }

    pub fn is_null(self) -> Exp {
        Exp::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Exp {
        Exp::IsNotNull(Box::new(self))
    }

    fn aggregate(self, func: AggFn) -> Exp {
        Exp::Aggregate {
            func,
            inner: Box::new(self),
        }
    }

    pub fn sum(self) -> Exp {
        self.aggregate(AggFn::Sum)
    }

    pub fn min(self) -> Exp {
        self.aggregate(AggFn::Min)
    }

    pub fn max(self) -> Exp {
        self.aggregate(AggFn::Max)
    }

    pub fn avg(self) -> Exp {
        self.aggregate(AggFn::Avg)
    }

    pub fn median(self) -> Exp {
        self.aggregate(AggFn::Median)
    }

    pub fn count(self) -> Exp {
        self.aggregate(AggFn::Count)
    }

    pub fn asc(self) -> Sorter {
        Sorter::new(self, true)
    }

    pub fn desc(self) -> Sorter {
        Sorter::new(self, false)
    }

    pub fn eval(&self, table: &Table) -> FrameResult<Column> {
        self.evaluate(Source::Table(table))
    }

    /// Evaluate against a single column; every column reference reads `column`.
    pub fn eval_column(&self, column: &Column) -> FrameResult<Column> {
        self.evaluate(Source::Column(column))
    }

    /// Evaluate a boolean expression into a row mask; nulls count as false.
    pub fn eval_mask(&self, table: &Table) -> FrameResult<BitVec> {
        condition::mask(self, Source::Table(table))
    }

    pub(crate) fn evaluate(&self, source: Source<'_>) -> FrameResult<Column> {
        match self {
            Exp::Column { name, ty } => retyped(source.by_name(name)?, *ty),
            Exp::Position { position, ty } => retyped(source.by_position(*position)?, *ty),
            Exp::Scalar(value) => Ok(Column::repeat(value.value_type(), value, source.height())),
            Exp::Cast { ty, inner } => cast_column(&inner.evaluate(source)?, *ty),
            Exp::CastDecimal { scale, inner } => {
                let column = cast_column(&inner.evaluate(source)?, ValueType::Decimal)?;
                Ok(column.map(ValueType::Decimal, |v| match v {
                    Value::Decimal(d) => {
                        let mut rounded = d.round_dp_with_strategy(
                            *scale,
                            RoundingStrategy::MidpointAwayFromZero,
                        );
                        rounded.rescale(*scale);
                        Value::Decimal(rounded)
                    }
                    other => other,
                }))
            }
            Exp::Arithmetic {
                op,
                ty,
                left,
                right,
            } => {
                let (ty, l, r) = match ty {
                    Some(ty) => (*ty, operand(left, *ty, source)?, operand(right, *ty, source)?),
                    None => {
                        let l = left.evaluate(source)?;
                        let r = right.evaluate(source)?;
                        let ty = numeric::resolve(op.symbol(), l.value_type(), r.value_type())?;
                        (ty, l, r)
                    }
                };
                numeric::factory(ty)?.arith(*op, &l, &r)
            }
            Exp::Compare { op, left, right } => condition::compare(*op, left, right, source),
            Exp::Concat(parts) => concat(parts, source),
            Exp::And(_) | Exp::Or(_) | Exp::Not(_) => {
                Ok(Column::from_bits(condition::mask(self, source)?))
            }
            Exp::IsNull(inner) => Ok(inner.evaluate(source)?.is_null()),
            Exp::IsNotNull(inner) => Ok(inner.evaluate(source)?.is_not_null()),
            Exp::Aggregate { func, inner } => aggregate(*func, &inner.evaluate(source)?),
            Exp::Named { inner, .. } => inner.evaluate(source),
        }
    }
}

/// Evaluate an arithmetic operand already converted to `ty`. Literals are converted before they
/// are repeated, so a literal never forces the boxed path.
pub(crate) fn operand(exp: &Exp, ty: ValueType, source: Source<'_>) -> FrameResult<Column> {
    match exp {
        Exp::Scalar(value) => Ok(Column::repeat(ty, &value.cast(ty)?, source.height())),
        other => other.evaluate(source),
    }
}

fn retyped(column: &Column, ty: ValueType) -> FrameResult<Column> {
    if ty == ValueType::Any || column.value_type() == ty {
        return Ok(column.clone());
    }
    cast_column(column, ty)
}

fn cast_column(column: &Column, ty: ValueType) -> FrameResult<Column> {
    if ty.is_numeric() {
        return numeric::factory(ty)?.cast(column);
    }
    Ok(column.cast(ty)?)
}

fn concat(parts: &[Exp], source: Source<'_>) -> FrameResult<Column> {
    let height = source.height();
    let columns = parts
        .iter()
        .map(|p| p.evaluate(source))
        .collect::<FrameResult<Vec<_>>>()?;
    for column in &columns {
        if column.len() != height {
            return Err(ColumnError::LengthMismatch {
                op: "concat",
                expected: height,
                actual: column.len(),
            }
            .into());
        }
    }
    let values: Vec<Value> = (0..height)
        .map(|i| {
            let mut text = String::new();
            for column in &columns {
                match column.value(i) {
                    Value::Null => return Value::Null,
                    v => text.push_str(&v.to_string()),
                }
            }
            Value::from(text)
        })
        .collect();
    Ok(Column::from_values(ValueType::Str, values))
}

fn aggregate(func: AggFn, column: &Column) -> FrameResult<Column> {
    let ty = column.value_type();
    let value = match func {
        AggFn::Count => Value::Int64((column.len() - column.null_count()) as i64),
        AggFn::Min if !ty.is_numeric() => column.min(),
        AggFn::Max if !ty.is_numeric() => column.max(),
        func => numeric::factory(ty)?.aggregate(func, column)?,
    };
    Ok(Column::build(func.result_type(ty), [value]))
}

impl From<Value> for Exp {
    fn from(value: Value) -> Self {
        Exp::Scalar(value)
    }
}

impl From<i64> for Exp {
    fn from(value: i64) -> Self {
        Exp::Scalar(Value::Int64(value))
    }
}

impl From<f64> for Exp {
    fn from(value: f64) -> Self {
        Exp::Scalar(Value::from(value))
    }
}

impl From<bool> for Exp {
    fn from(value: bool) -> Self {
        Exp::Scalar(Value::Bool(value))
    }
}

impl From<Decimal> for Exp {
    fn from(value: Decimal) -> Self {
        Exp::Scalar(Value::Decimal(value))
    }
}

/// A bare string is a column reference, not a text literal; use [`Exp::scalar`] for literals.
impl From<&str> for Exp {
    fn from(name: &str) -> Self {
        Exp::column(name)
    }
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[Exp], sep: &str| -> fmt::Result {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{part}")?;
            }
            Ok(())
        };
        match self {
            Exp::Column { name, .. } | Exp::Named { name, .. } => f.write_str(name),
            Exp::Position { position, .. } => write!(f, "${position}"),
            Exp::Scalar(Value::Str(s)) => write!(f, "'{s}'"),
            Exp::Scalar(v) => write!(f, "{v}"),
            Exp::Cast { ty, inner } => write!(f, "cast({inner} as {ty})"),
            Exp::CastDecimal { scale, inner } => write!(f, "cast({inner} as decimal({scale}))"),
            Exp::Arithmetic {
                op, left, right, ..
            } => write!(f, "{left} {} {right}", op.symbol()),
            Exp::Compare { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Exp::Concat(parts) => {
                f.write_str("concat(")?;
                join(f, parts, ", ")?;
                f.write_str(")")
            }
            Exp::And(parts) => join(f, parts, " and "),
            Exp::Or(parts) => join(f, parts, " or "),
            Exp::Not(inner) => write!(f, "not {inner}"),
            Exp::IsNull(inner) => write!(f, "{inner} is null"),
            Exp::IsNotNull(inner) => write!(f, "{inner} is not null"),
            Exp::Aggregate { func, inner } => write!(f, "{}({inner})", func.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_flattens_nested_conjunctions() {
        let left = Exp::int64("a").gt(1i64).and(Exp::int64("b").gt(2i64));
        let right = Exp::int64("c").lt(3i64).and(Exp::int64("d").lt(4i64));
        match left.and(right) {
            Exp::And(parts) => assert_eq!(parts.len(), 4),
            other => panic!("expected a flat conjunction, got {other}"),
        }
    }

    #[test]
    fn arithmetic_type_is_resolved_at_construction() {
        assert_eq!(Exp::int32("a").add(Exp::int64("b")).value_type(), ValueType::Int64);
        assert_eq!(Exp::int64("a").mul(Exp::float32("b")).value_type(), ValueType::Float32);
        assert_eq!(Exp::float64("a").sub(Exp::decimal("b")).value_type(), ValueType::Decimal);
        assert_eq!(Exp::text("a").add(Exp::int64("b")).value_type(), ValueType::Any);
        assert_eq!(Exp::int32("a").sum().value_type(), ValueType::Int64);
        assert_eq!(Exp::int32("a").median().value_type(), ValueType::Float64);
    }

    #[test]
    fn names_render_the_tree() {
        let exp = Exp::int64("a").add(Exp::int64("b")).gt(3i64);
        assert_eq!(exp.name(), "a + b > 3");
        assert_eq!(Exp::float64("x").sum().named("total").name(), "total");
        assert_eq!(Exp::text("s").concat(Exp::scalar("!")).name(), "concat(s, '!')");
    }
}
