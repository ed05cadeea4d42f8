use super::{numeric, operand, Exp, Source};
use crate::error::{FrameError, FrameResult};
use tabula_columnar::{BitVec, CmpOp, Column, ColumnError, Value, ValueType};

/// Evaluate a comparison node into a boolean column. Null operands compare false.
pub(super) fn compare(op: CmpOp, left: &Exp, right: &Exp, source: Source<'_>) -> FrameResult<Column> {
    if let Ok(ty) = numeric::resolve(op.symbol(), left.value_type(), right.value_type()) {
        let l = operand(left, ty, source)?;
        let r = operand(right, ty, source)?;
        return numeric::factory(ty)?.compare(op, &l, &r);
    }

    let l = left.evaluate(source)?;
    let r = right.evaluate(source)?;
    let (lt, rt) = (l.value_type(), r.value_type());
    if let Ok(ty) = numeric::resolve(op.symbol(), lt, rt) {
        return numeric::factory(ty)?.compare(op, &l, &r);
    }
    if lt == rt {
        if l.is_primitive() && r.is_primitive() {
            return Ok(l.compare(op, &r)?);
        }
        return boxed(op, &l, &r);
    }
    match op {
        CmpOp::Eq => Ok(l.eq(&r)?),
        CmpOp::Ne => Ok(l.ne(&r)?),
        _ => Err(FrameError::ArithmeticType {
            op: op.symbol(),
            left: lt,
            right: rt,
        }),
    }
}

fn boxed(op: CmpOp, left: &Column, right: &Column) -> FrameResult<Column> {
    if left.len() != right.len() {
        return Err(ColumnError::LengthMismatch {
            op: op.symbol(),
            expected: left.len(),
            actual: right.len(),
        }
        .into());
    }
    log::trace!("boxed {} comparison of {}", op.symbol(), left.value_type());
    Ok(Column::from_bools(left.iter().zip(right.iter()).map(
        |(a, b)| match (&a, &b) {
            (Value::Null, _) | (_, Value::Null) => false,
            _ => op.matches(a.total_cmp(&b)),
        },
    )))
}

/// Evaluate a boolean expression into a row mask.
pub(super) fn mask(exp: &Exp, source: Source<'_>) -> FrameResult<BitVec> {
    let height = source.height();
    match exp {
        Exp::And(parts) => combine(parts, source, BitVec::filled(height, true), "and", BitVec::and_inplace),
        Exp::Or(parts) => combine(parts, source, BitVec::filled(height, false), "or", BitVec::or_inplace),
        Exp::Not(inner) => {
            let mut bits = mask(inner, source)?;
            bits.not_inplace();
            Ok(bits)
        }
        other => to_mask(&other.evaluate(source)?),
    }
}

fn combine(
    parts: &[Exp],
    source: Source<'_>,
    mut acc: BitVec,
    op: &'static str,
    apply: fn(&mut BitVec, &BitVec),
) -> FrameResult<BitVec> {
    for part in parts {
        let bits = mask(part, source)?;
        if bits.len() != acc.len() {
            return Err(ColumnError::LengthMismatch {
                op,
                expected: acc.len(),
                actual: bits.len(),
            }
            .into());
        }
        apply(&mut acc, &bits);
    }
    Ok(acc)
}

fn to_mask(column: &Column) -> FrameResult<BitVec> {
    if let Some(bits) = column.as_bits() {
        return Ok(bits.clone());
    }
    match column.value_type() {
        ValueType::Bool | ValueType::Any => column
            .iter()
            .map(|v| match v {
                Value::Bool(b) => Ok(b),
                Value::Null => Ok(false),
                other => Err(FrameError::from(ColumnError::TypeMismatch {
                    expected: ValueType::Bool,
                    actual: other.value_type().name().to_string(),
                })),
            })
            .collect(),
        ty => Err(ColumnError::TypeMismatch {
            expected: ValueType::Bool,
            actual: ty.name().to_string(),
        }
        .into()),
    }
}
