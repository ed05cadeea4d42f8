use tabula_columnar::{ColumnError, ValueType};

pub type FrameResult<T> = Result<T, FrameError>;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Column(#[from] ColumnError),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column position {position} out of range for width {width}")]
    UnknownPosition { position: usize, width: usize },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column {column} has {actual} rows, expected {expected}")]
    HeightMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} columns, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("no arithmetic type for {left} {op} {right}")]
    ArithmeticType {
        op: &'static str,
        left: ValueType,
        right: ValueType,
    },

    #[error("{ty} is not a numeric type")]
    NotNumeric { ty: ValueType },

    #[error("hash join requires column equality pairs, got a row predicate")]
    HashJoinPredicate,
}
