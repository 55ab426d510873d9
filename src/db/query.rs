//! Store-agnostic query language: equality, case-insensitive "contains",
//! set membership and OR-groups, one ordering column and a row limit.

use serde_json::Value;

use crate::models::enums::{SortDirection, Table};

/// A row as returned by the store: column name → JSON value.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match on the column's text form.
    Eq { column: String, value: String },
    /// Case-insensitive substring match.
    Contains { column: String, needle: String },
    /// Column value is one of `values`. An empty set matches nothing.
    In { column: String, values: Vec<String> },
    /// At least one alternative matches. An empty group matches nothing.
    AnyOf(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn contains(column: &str, needle: impl Into<String>) -> Self {
        Self::Contains {
            column: column.into(),
            needle: needle.into(),
        }
    }

    pub fn is_in(column: &str, values: Vec<String>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    /// Evaluate against an in-memory row with the same semantics the SQL
    /// adapter renders.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq { column, value } => cell_text(row, column).is_some_and(|v| v == *value),
            Self::Contains { column, needle } => cell_text(row, column)
                .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
            Self::In { column, values } => {
                cell_text(row, column).is_some_and(|v| values.iter().any(|x| *x == v))
            }
            Self::AnyOf(alternatives) => alternatives.iter().any(|f| f.matches(row)),
        }
    }
}

fn cell_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    /// All filters must hold.
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}
