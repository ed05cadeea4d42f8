//! Elementwise loops over raw primitive buffers.
//!
//! Every kernel checks operand lengths up front and then runs a tight loop over the slices; no
//! value is boxed into a [`Value`](crate::Value) on the way.

use crate::bitmap::BitVec;
use crate::error::{ColumnError, ColumnResult};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
        }
    }

    /// Whether an operand ordering satisfies this comparison.
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
        }
    }
}

pub(crate) fn check_len(op: &'static str, expected: usize, actual: usize) -> ColumnResult<()> {
    if expected != actual {
        return Err(ColumnError::LengthMismatch {
            op,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Integer arithmetic wraps on overflow; division and remainder by zero are errors.
pub(crate) fn arith_i64(op: ArithOp, left: &[i64], right: &[i64]) -> ColumnResult<Vec<i64>> {
    check_len(op.symbol(), left.len(), right.len())?;
    let pairs = left.iter().zip(right);
    let out = match op {
        ArithOp::Add => pairs.map(|(a, b)| a.wrapping_add(*b)).collect(),
        ArithOp::Sub => pairs.map(|(a, b)| a.wrapping_sub(*b)).collect(),
        ArithOp::Mul => pairs.map(|(a, b)| a.wrapping_mul(*b)).collect(),
        ArithOp::Div => {
            if right.contains(&0) {
                return Err(ColumnError::DivisionByZero);
            }
            pairs.map(|(a, b)| a.wrapping_div(*b)).collect()
        }
        ArithOp::Rem => {
            if right.contains(&0) {
                return Err(ColumnError::DivisionByZero);
            }
            pairs.map(|(a, b)| a.wrapping_rem(*b)).collect()
        }
    };
    Ok(out)
}

/// IEEE semantics: division by zero yields infinities or NaN.
pub(crate) fn arith_f64(op: ArithOp, left: &[f64], right: &[f64]) -> ColumnResult<Vec<f64>> {
    check_len(op.symbol(), left.len(), right.len())?;
    let pairs = left.iter().zip(right);
    let out = match op {
        ArithOp::Add => pairs.map(|(a, b)| a + b).collect(),
        ArithOp::Sub => pairs.map(|(a, b)| a - b).collect(),
        ArithOp::Mul => pairs.map(|(a, b)| a * b).collect(),
        ArithOp::Div => pairs.map(|(a, b)| a / b).collect(),
        ArithOp::Rem => pairs.map(|(a, b)| a % b).collect(),
    };
    Ok(out)
}

pub(crate) fn compare_i64(op: CmpOp, left: &[i64], right: &[i64]) -> ColumnResult<BitVec> {
    check_len(op.symbol(), left.len(), right.len())?;
    Ok(left
        .iter()
        .zip(right)
        .map(|(a, b)| op.matches(a.cmp(b)))
        .collect())
}

/// Uses IEEE partial ordering, so any comparison against NaN is false except `!=`.
pub(crate) fn compare_f64(op: CmpOp, left: &[f64], right: &[f64]) -> ColumnResult<BitVec> {
    check_len(op.symbol(), left.len(), right.len())?;
    Ok(left
        .iter()
        .zip(right)
        .map(|(a, b)| match a.partial_cmp(b) {
            Some(ord) => op.matches(ord),
            None => op == CmpOp::Ne,
        })
        .collect())
}

pub(crate) fn compare_bool(op: CmpOp, left: &BitVec, right: &BitVec) -> ColumnResult<BitVec> {
    check_len(op.symbol(), left.len(), right.len())?;
    Ok(left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| op.matches(a.cmp(&b)))
        .collect())
}
