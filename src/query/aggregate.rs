//! Aggregate functions for grouped queries.

use std::cmp::Ordering;
use std::fmt;

use crate::datum::{Constant, Type};
use crate::record::{RecordError, Schema};

use super::error::QueryError;

/// An aggregate over one source field.
///
/// Each aggregate contributes one output field to a group-by schema, named
/// after the function and its source (`countofocena`, `maxofocena`).
/// Accumulation follows a start → feed → finish lifecycle per group:
/// [`start`](AggregateFn::start) consumes the group's first row, so an
/// accumulator always holds at least one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateFn {
    /// Counts the rows of the group.
    Count {
        /// Source field (names the output; every row counts).
        field: String,
    },
    /// Keeps the largest value of the source field.
    Max {
        /// Source field.
        field: String,
    },
}

impl AggregateFn {
    /// Creates a count aggregate over `field`.
    pub fn count(field: impl Into<String>) -> Self {
        AggregateFn::Count {
            field: field.into(),
        }
    }

    /// Creates a max aggregate over `field`.
    pub fn max(field: impl Into<String>) -> Self {
        AggregateFn::Max {
            field: field.into(),
        }
    }

    /// Returns the field the aggregate reads.
    pub fn source_field(&self) -> &str {
        match self {
            AggregateFn::Count { field } | AggregateFn::Max { field } => field,
        }
    }

    /// Returns the name of the output field the aggregate produces.
    pub fn output_field(&self) -> String {
        match self {
            AggregateFn::Count { field } => format!("countof{}", field),
            AggregateFn::Max { field } => format!("maxof{}", field),
        }
    }

    /// Adds this aggregate's output field to `schema`, typed from the
    /// child's schema.
    pub fn add_output_field(
        &self,
        schema: &mut Schema,
        child: &Schema,
    ) -> Result<(), RecordError> {
        match self {
            AggregateFn::Count { .. } => schema.add_int_field(self.output_field()),
            AggregateFn::Max { field } => match child.field_type(field)? {
                Type::Integer => schema.add_int_field(self.output_field()),
                Type::Varchar => {
                    schema.add_string_field(self.output_field(), child.field_length(field)?)
                }
            },
        }
    }

    /// Starts accumulation with the group's first row's value.
    pub fn start(&self, first: Constant) -> AggregateState {
        match self {
            AggregateFn::Count { .. } => AggregateState::Count { count: 1 },
            AggregateFn::Max { .. } => AggregateState::Max { max: first },
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFn::Count { field } => write!(f, "count({})", field),
            AggregateFn::Max { field } => write!(f, "max({})", field),
        }
    }
}

/// Accumulation state for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateState {
    /// Running row count.
    Count {
        /// Rows seen so far.
        count: i32,
    },
    /// Largest value seen so far.
    Max {
        /// Current maximum.
        max: Constant,
    },
}

impl AggregateState {
    /// Feeds one more row's value.
    ///
    /// # Errors
    ///
    /// [`QueryError::Comparison`] if a max aggregate meets a value of a
    /// different type than its current maximum (impossible for values read
    /// from a single schema-typed field).
    pub fn feed(&mut self, val: Constant) -> Result<(), QueryError> {
        match self {
            AggregateState::Count { count } => {
                *count += 1;
                Ok(())
            }
            AggregateState::Max { max } => {
                if val.compare(max)? == Ordering::Greater {
                    *max = val;
                }
                Ok(())
            }
        }
    }

    /// Produces the aggregate's output value.
    pub fn finish(&self) -> Constant {
        match self {
            AggregateState::Count { count } => Constant::Int(*count),
            AggregateState::Max { max } => max.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_counts_rows() {
        let agg = AggregateFn::count("ocena");
        let mut state = agg.start(Constant::Int(10));
        state.feed(Constant::Int(10)).unwrap();
        state.feed(Constant::Int(7)).unwrap();
        assert_eq!(state.finish(), Constant::Int(3));
    }

    #[test]
    fn test_max_keeps_largest() {
        let agg = AggregateFn::max("ocena");
        let mut state = agg.start(Constant::Int(7));
        state.feed(Constant::Int(10)).unwrap();
        state.feed(Constant::Int(8)).unwrap();
        assert_eq!(state.finish(), Constant::Int(10));
    }

    #[test]
    fn test_max_over_strings() {
        let agg = AggregateFn::max("smername");
        let mut state = agg.start(Constant::from("ET"));
        state.feed(Constant::from("SI")).unwrap();
        assert_eq!(state.finish(), Constant::from("SI"));
    }

    #[test]
    fn test_max_type_mismatch_is_error() {
        let agg = AggregateFn::max("ocena");
        let mut state = agg.start(Constant::Int(7));
        assert!(state.feed(Constant::from("ten")).is_err());
    }

    #[test]
    fn test_output_field_names() {
        assert_eq!(AggregateFn::count("ocena").output_field(), "countofocena");
        assert_eq!(AggregateFn::max("ocena").output_field(), "maxofocena");
    }
}
