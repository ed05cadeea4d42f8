//! Append-only builders that turn a stream of values into an immutable [`Column`].
//!
//! Loaders keep one accumulator per output column and push converted fields into it. The typed
//! accumulators take raw primitives (`push_i64`, ...) so bulk loads never box; the boxed
//! [`Accumulator::push`] path is there for generic callers.

use crate::bitmap::BitVec;
use crate::column::Column;
use crate::error::{ColumnError, ColumnResult};
use crate::types::{Value, ValueType};
use std::collections::HashSet;

pub trait Accumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()>;

    /// Overwrite an already pushed position.
    fn set(&mut self, pos: usize, value: Value) -> ColumnResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the accumulated values into a column, leaving the accumulator empty.
    fn to_column(&mut self) -> Column;
}

fn check_pos(pos: usize, len: usize) -> ColumnResult<()> {
    if pos >= len {
        return Err(ColumnError::OutOfBounds { index: pos, len });
    }
    Ok(())
}

fn rejected(expected: ValueType, value: &Value) -> ColumnError {
    let actual = if value.is_null() {
        "null".to_string()
    } else {
        value.value_type().name().to_string()
    };
    ColumnError::TypeMismatch { expected, actual }
}

#[derive(Debug, Default)]
pub struct Int64Accumulator {
    data: Vec<i64>,
}

impl Int64Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn push_i64(&mut self, value: i64) {
        self.data.push(value);
    }

    pub fn set_i64(&mut self, pos: usize, value: i64) -> ColumnResult<()> {
        check_pos(pos, self.data.len())?;
        self.data[pos] = value;
        Ok(())
    }

    fn unbox(value: &Value) -> ColumnResult<i64> {
        value.as_i64().ok_or_else(|| rejected(ValueType::Int64, value))
    }
}

impl Accumulator for Int64Accumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()> {
        self.push_i64(Self::unbox(&value)?);
        Ok(())
    }

    fn set(&mut self, pos: usize, value: Value) -> ColumnResult<()> {
        self.set_i64(pos, Self::unbox(&value)?)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn to_column(&mut self) -> Column {
        Column::from_i64s(std::mem::take(&mut self.data))
    }
}

#[derive(Debug, Default)]
pub struct Float64Accumulator {
    data: Vec<f64>,
}

impl Float64Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn push_f64(&mut self, value: f64) {
        self.data.push(value);
    }

    pub fn set_f64(&mut self, pos: usize, value: f64) -> ColumnResult<()> {
        check_pos(pos, self.data.len())?;
        self.data[pos] = value;
        Ok(())
    }

    fn unbox(value: &Value) -> ColumnResult<f64> {
        match value {
            Value::Decimal(_) => Err(rejected(ValueType::Float64, value)),
            other => other
                .as_f64()
                .ok_or_else(|| rejected(ValueType::Float64, value)),
        }
    }
}

impl Accumulator for Float64Accumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()> {
        self.push_f64(Self::unbox(&value)?);
        Ok(())
    }

    fn set(&mut self, pos: usize, value: Value) -> ColumnResult<()> {
        self.set_f64(pos, Self::unbox(&value)?)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn to_column(&mut self) -> Column {
        Column::from_f64s(std::mem::take(&mut self.data))
    }
}

#[derive(Debug, Default)]
pub struct BoolAccumulator {
    bits: BitVec,
}

impl BoolAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity),
        }
    }

    pub fn push_bool(&mut self, value: bool) {
        self.bits.push(value);
    }

    pub fn set_bool(&mut self, pos: usize, value: bool) -> ColumnResult<()> {
        check_pos(pos, self.bits.len())?;
        self.bits.set(pos, value);
        Ok(())
    }
}

impl Accumulator for BoolAccumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()> {
        let v = value
            .as_bool()
            .ok_or_else(|| rejected(ValueType::Bool, &value))?;
        self.push_bool(v);
        Ok(())
    }

    fn set(&mut self, pos: usize, value: Value) -> ColumnResult<()> {
        let v = value
            .as_bool()
            .ok_or_else(|| rejected(ValueType::Bool, &value))?;
        self.set_bool(pos, v)
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn to_column(&mut self) -> Column {
        Column::from_bits(std::mem::take(&mut self.bits))
    }
}

/// Boxed storage; accepts any value including null.
#[derive(Debug)]
pub struct ObjectAccumulator {
    ty: ValueType,
    values: Vec<Value>,
}

impl ObjectAccumulator {
    pub fn new(ty: ValueType) -> Self {
        Self::with_capacity(ty, 0)
    }

    pub fn with_capacity(ty: ValueType, capacity: usize) -> Self {
        Self {
            ty,
            values: Vec::with_capacity(capacity),
        }
    }
}

impl Accumulator for ObjectAccumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()> {
        self.values.push(value);
        Ok(())
    }

    fn set(&mut self, pos: usize, value: Value) -> ColumnResult<()> {
        check_pos(pos, self.values.len())?;
        self.values[pos] = value;
        Ok(())
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn to_column(&mut self) -> Column {
        Column::from_values(self.ty, std::mem::take(&mut self.values))
    }
}

#[derive(Debug)]
enum Storage {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(BitVec),
    Object(Vec<Value>),
}

impl Storage {
    fn for_type(ty: ValueType, capacity: usize) -> Self {
        match ty {
            ValueType::Int64 => Storage::Int64(Vec::with_capacity(capacity)),
            ValueType::Float64 => Storage::Float64(Vec::with_capacity(capacity)),
            ValueType::Bool => Storage::Bool(BitVec::with_capacity(capacity)),
            _ => Storage::Object(Vec::with_capacity(capacity)),
        }
    }

    fn len(&self) -> usize {
        match self {
            Storage::Int64(v) => v.len(),
            Storage::Float64(v) => v.len(),
            Storage::Bool(v) => v.len(),
            Storage::Object(v) => v.len(),
        }
    }

    /// Store into primitive slots; returns `false` when the value does not fit them.
    fn try_store(&mut self, pos: Option<usize>, value: &Value) -> bool {
        match (self, value) {
            (Storage::Int64(v), Value::Int64(x)) => put(v, pos, *x),
            (Storage::Float64(v), Value::Float64(x)) => put(v, pos, x.0),
            (Storage::Bool(v), Value::Bool(x)) => {
                match pos {
                    Some(p) => v.set(p, *x),
                    None => v.push(*x),
                }
                true
            }
            (Storage::Object(v), value) => put(v, pos, value.clone()),
            _ => false,
        }
    }

    fn boxed(self) -> Vec<Value> {
        match self {
            Storage::Int64(v) => v.into_iter().map(Value::Int64).collect(),
            Storage::Float64(v) => v.into_iter().map(Value::from).collect(),
            Storage::Bool(v) => v.iter().map(Value::Bool).collect(),
            Storage::Object(v) => v,
        }
    }
}

fn put<T>(data: &mut Vec<T>, pos: Option<usize>, value: T) -> bool {
    match pos {
        Some(p) => data[p] = value,
        None => data.push(value),
    }
    true
}

/// An accumulator that starts on primitive storage picked from its nominal type and switches to
/// boxed storage the first time a null, or a value of a different type, arrives.
///
/// A null keeps the nominal type; a foreign value widens it to [`ValueType::Any`].
#[derive(Debug)]
pub struct ValueAccumulator {
    initial: ValueType,
    ty: ValueType,
    storage: Storage,
}

impl ValueAccumulator {
    pub fn new(ty: ValueType) -> Self {
        Self::with_capacity(ty, 0)
    }

    pub fn with_capacity(ty: ValueType, capacity: usize) -> Self {
        Self {
            initial: ty,
            ty,
            storage: Storage::for_type(ty, capacity),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Infallible form of [`Accumulator::push`].
    pub fn push_value(&mut self, value: Value) {
        self.store(None, value);
    }

    fn store(&mut self, pos: Option<usize>, value: Value) {
        if !value.is_null() && self.ty != ValueType::Any && value.value_type() != self.ty {
            self.ty = ValueType::Any;
        }
        if self.storage.try_store(pos, &value) {
            return;
        }
        let storage = std::mem::replace(&mut self.storage, Storage::Object(Vec::new()));
        self.storage = Storage::Object(storage.boxed());
        self.storage.try_store(pos, &value);
    }
}

impl Accumulator for ValueAccumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()> {
        self.push_value(value);
        Ok(())
    }

    fn set(&mut self, pos: usize, value: Value) -> ColumnResult<()> {
        check_pos(pos, self.storage.len())?;
        self.store(Some(pos), value);
        Ok(())
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn to_column(&mut self) -> Column {
        let storage = std::mem::replace(&mut self.storage, Storage::for_type(self.initial, 0));
        let ty = std::mem::replace(&mut self.ty, self.initial);
        match storage {
            Storage::Int64(v) => Column::from_i64s(v),
            Storage::Float64(v) => Column::from_f64s(v),
            Storage::Bool(v) => Column::from_bits(v),
            Storage::Object(v) => Column::from_values(ty, v),
        }
    }
}

/// Drops repeated values, keeping the order in which distinct values first arrive.
#[derive(Debug)]
pub struct UniqueAccumulator {
    seen: HashSet<Value>,
    inner: ValueAccumulator,
}

impl UniqueAccumulator {
    pub fn new(ty: ValueType) -> Self {
        Self {
            seen: HashSet::new(),
            inner: ValueAccumulator::new(ty),
        }
    }

    pub fn push_value(&mut self, value: Value) {
        if self.seen.insert(value.clone()) {
            self.inner.push_value(value);
        }
    }
}

impl Accumulator for UniqueAccumulator {
    fn push(&mut self, value: Value) -> ColumnResult<()> {
        self.push_value(value);
        Ok(())
    }

    fn set(&mut self, _pos: usize, _value: Value) -> ColumnResult<()> {
        Err(ColumnError::Unsupported {
            op: "set on a unique accumulator",
            column_type: self.inner.value_type(),
        })
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn to_column(&mut self) -> Column {
        self.seen.clear();
        self.inner.to_column()
    }
}

/// Holds the last converted value of one field. A null is read as the type's default
/// (`0`, `false`, ...), so holders feeding primitive accumulators never push a null.
#[derive(Clone, Debug)]
pub struct ValueHolder {
    ty: ValueType,
    value: Value,
}

impl ValueHolder {
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty,
            value: ty.default_value(),
        }
    }

    pub fn set(&mut self, value: Value) {
        self.value = if value.is_null() {
            self.ty.default_value()
        } else {
            value
        };
    }

    pub fn get(&self) -> &Value {
        &self.value
    }

    pub fn store(&self, acc: &mut dyn Accumulator) -> ColumnResult<()> {
        acc.push(self.value.clone())
    }

    pub fn store_at(&self, acc: &mut dyn Accumulator, pos: usize) -> ColumnResult<()> {
        acc.set(pos, self.value.clone())
    }
}
