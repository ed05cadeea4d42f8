use crate::accumulator::{
    Accumulator, BoolAccumulator, Float64Accumulator, Int64Accumulator, ValueAccumulator,
    ValueHolder,
};
use crate::error::{ColumnError, ColumnResult};
use crate::types::{Value, ValueType};

/// Converts one raw text field into a typed value and hands it to an accumulator.
///
/// This is the whole surface a text loader needs: pick a converter per column, ask it for a
/// matching accumulator, then feed every field through [`ValueConverter::convert_and_store`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueConverter {
    target: ValueType,
    nullable: bool,
}

impl ValueConverter {
    pub fn new(target: ValueType) -> Self {
        Self {
            target,
            nullable: false,
        }
    }

    /// Read empty fields as null instead of rejecting them.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn int64() -> Self {
        Self::new(ValueType::Int64)
    }

    pub fn float64() -> Self {
        Self::new(ValueType::Float64)
    }

    pub fn boolean() -> Self {
        Self::new(ValueType::Bool)
    }

    pub fn decimal() -> Self {
        Self::new(ValueType::Decimal)
    }

    pub fn text() -> Self {
        Self::new(ValueType::Str)
    }

    pub fn target(&self) -> ValueType {
        self.target
    }

    pub fn convert(&self, raw: &str) -> ColumnResult<Value> {
        if raw.is_empty() {
            return match (self.nullable, self.target) {
                (true, _) => Ok(Value::Null),
                (false, ValueType::Str) => Ok(Value::from("")),
                (false, target) => Err(ColumnError::Parse {
                    value: String::new(),
                    target,
                }),
            };
        }
        Value::from(raw).cast(self.target)
    }

    pub fn convert_and_store(&self, raw: &str, acc: &mut dyn Accumulator) -> ColumnResult<()> {
        acc.push(self.convert(raw)?)
    }

    pub fn convert_into(&self, raw: &str, holder: &mut ValueHolder) -> ColumnResult<()> {
        holder.set(self.convert(raw)?);
        Ok(())
    }

    /// An accumulator that can take every value this converter produces. Non-nullable
    /// primitive targets get unboxed storage.
    pub fn accumulator(&self, capacity: usize) -> Box<dyn Accumulator> {
        match (self.target, self.nullable) {
            (ValueType::Int64, false) => Box::new(Int64Accumulator::with_capacity(capacity)),
            (ValueType::Float64, false) => Box::new(Float64Accumulator::with_capacity(capacity)),
            (ValueType::Bool, false) => Box::new(BoolAccumulator::with_capacity(capacity)),
            (target, _) => Box::new(ValueAccumulator::with_capacity(target, capacity)),
        }
    }
}
