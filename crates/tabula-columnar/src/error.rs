use crate::types::ValueType;

pub type ColumnResult<T> = Result<T, ColumnError>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ColumnError {
    #[error("{op}: length mismatch, expected {expected} values, got {actual}")]
    LengthMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("position {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: ValueType, actual: String },

    #[error("cannot parse {value:?} as {target}")]
    Parse { value: String, target: ValueType },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow in {op}")]
    Overflow { op: &'static str },

    #[error("{op} is not supported for {column_type} columns")]
    Unsupported {
        op: &'static str,
        column_type: ValueType,
    },

    #[error("cannot sample {requested} rows out of {available}")]
    SampleTooLarge { requested: usize, available: usize },
}
