//! Column reductions applied per group, or to a whole table.

use crate::error::FrameResult;
use crate::exp::{AggFn, Exp};
use crate::index::ColumnIndex;
use crate::table::Table;
use std::fmt;
use std::sync::Arc;
use tabula_columnar::{Column, Value, ValueType};

type CustomFn = Arc<dyn Fn(&Column) -> Value + Send + Sync>;

#[derive(Clone)]
enum Reduction {
    First,
    Last,
    Count,
    /// A numeric reduction over the source converted to `ty` first.
    Numeric { func: AggFn, ty: ValueType },
    Min,
    Max,
    Avg,
    Concat {
        separator: String,
        prefix: String,
        suffix: String,
    },
    Custom { ty: ValueType, f: CustomFn },
}

/// Reduces one source expression to a single value per group.
#[derive(Clone)]
pub struct Aggregator {
    source: Exp,
    reduction: Reduction,
    name: Option<String>,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("source", &self.source)
            .field("label", &self.label())
            .finish()
    }
}

impl Aggregator {
    fn new(source: impl Into<Exp>, reduction: Reduction) -> Self {
        Self {
            source: source.into(),
            reduction,
            name: None,
        }
    }

    pub fn first(source: impl Into<Exp>) -> Self {
        Self::new(source, Reduction::First)
    }

    pub fn last(source: impl Into<Exp>) -> Self {
        Self::new(source, Reduction::Last)
    }

    /// Number of rows in the group, nulls included.
    pub fn count() -> Self {
        Self::new(Exp::scalar(Value::Null), Reduction::Count).named("count")
    }

    pub fn sum_i64(source: impl Into<Exp>) -> Self {
        Self::numeric(source, AggFn::Sum, ValueType::Int64)
    }

    pub fn sum_f64(source: impl Into<Exp>) -> Self {
        Self::numeric(source, AggFn::Sum, ValueType::Float64)
    }

    pub fn sum_decimal(source: impl Into<Exp>) -> Self {
        Self::numeric(source, AggFn::Sum, ValueType::Decimal)
    }

    pub fn median_f64(source: impl Into<Exp>) -> Self {
        Self::numeric(source, AggFn::Median, ValueType::Float64)
    }

    /// Decimal median; the mean of the two middle values is rounded half-up.
    pub fn median_decimal(source: impl Into<Exp>) -> Self {
        Self::numeric(source, AggFn::Median, ValueType::Decimal)
    }

    fn numeric(source: impl Into<Exp>, func: AggFn, ty: ValueType) -> Self {
        Self::new(source, Reduction::Numeric { func, ty })
    }

    pub fn min(source: impl Into<Exp>) -> Self {
        Self::new(source, Reduction::Min)
    }

    pub fn max(source: impl Into<Exp>) -> Self {
        Self::new(source, Reduction::Max)
    }

    pub fn avg(source: impl Into<Exp>) -> Self {
        Self::new(source, Reduction::Avg)
    }

    /// Non-null values rendered as text and joined with `separator`.
    pub fn concat(source: impl Into<Exp>, separator: impl Into<String>) -> Self {
        Self::concat_with(source, separator, "", "")
    }

    pub fn concat_with(
        source: impl Into<Exp>,
        separator: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self::new(
            source,
            Reduction::Concat {
                separator: separator.into(),
                prefix: prefix.into(),
                suffix: suffix.into(),
            },
        )
    }

    /// An arbitrary reduction of the group's source column into a value of type `ty`.
    pub fn custom(
        name: impl Into<String>,
        source: impl Into<Exp>,
        ty: ValueType,
        f: impl Fn(&Column) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(source, Reduction::Custom { ty, f: Arc::new(f) }).named(name)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Output column label.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.source.name())
    }

    fn output_type(&self, source: ValueType) -> ValueType {
        match &self.reduction {
            Reduction::First | Reduction::Last | Reduction::Min | Reduction::Max => source,
            Reduction::Count => ValueType::Int64,
            Reduction::Numeric { func, ty } => func.result_type(*ty),
            Reduction::Avg => AggFn::Avg.result_type(source),
            Reduction::Concat { .. } => ValueType::Str,
            Reduction::Custom { ty, .. } => *ty,
        }
    }

    fn reduce(&self, column: &Column) -> FrameResult<Value> {
        Ok(match &self.reduction {
            Reduction::First => column.get(0).unwrap_or(Value::Null),
            Reduction::Last => match column.len() {
                0 => Value::Null,
                n => column.value(n - 1),
            },
            Reduction::Count => Value::Int64(column.len() as i64),
            Reduction::Numeric { func, ty } => {
                let column = column.cast(*ty)?;
                match func {
                    AggFn::Median => column.median()?,
                    _ => column.sum()?,
                }
            }
            Reduction::Min => column.min(),
            Reduction::Max => column.max(),
            Reduction::Avg => column.avg()?,
            Reduction::Concat {
                separator,
                prefix,
                suffix,
            } => {
                let parts: Vec<String> = column
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect();
                Value::from(format!("{prefix}{}{suffix}", parts.join(separator)))
            }
            Reduction::Custom { f, .. } => f(column),
        })
    }
}

/// One output row per group, one output column per aggregator. Colliding labels get `_`
/// appended until unique.
pub(crate) fn aggregate_groups(
    table: &Table,
    groups: &[Vec<usize>],
    aggregators: &[Aggregator],
) -> FrameResult<Table> {
    let mut index = ColumnIndex::default();
    let mut columns = Vec::with_capacity(aggregators.len());
    for aggregator in aggregators {
        index.push_unique(&aggregator.label(), "_");
        let source = aggregator.source.eval(table)?;
        let values = groups
            .iter()
            .map(|positions| -> FrameResult<Value> {
                aggregator.reduce(&source.gather(positions)?)
            })
            .collect::<FrameResult<Vec<_>>>()?;
        columns.push(Column::build(
            aggregator.output_type(source.value_type()),
            values,
        ));
    }
    Table::from_parts(index, columns)
}

impl Table {
    /// Reduce the whole table to a single row.
    pub fn agg(&self, aggregators: &[Aggregator]) -> FrameResult<Table> {
        let all: Vec<usize> = (0..self.height()).collect();
        aggregate_groups(self, &[all], aggregators)
    }
}
