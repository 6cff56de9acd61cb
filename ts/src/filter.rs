//! Index values and query filters

use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::ToSql;

/// Value stored in the index table for a single field
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl ToSql for IndexValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            IndexValue::String(s) => ToSqlOutput::Owned(Value::Text(s.clone())),
            IndexValue::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            IndexValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
        })
    }
}

/// Comparison operator for a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Substring match, only meaningful for string values
    Contains,
}

impl FilterOp {
    /// SQL fragment comparing the index value column against a bound parameter
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "i.value = ?",
            FilterOp::Ne => "i.value <> ?",
            FilterOp::Gt => "i.value > ?",
            FilterOp::Lt => "i.value < ?",
            FilterOp::Gte => "i.value >= ?",
            FilterOp::Lte => "i.value <= ?",
            FilterOp::Contains => "instr(i.value, ?) > 0",
        }
    }
}

/// A single condition on an indexed field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    /// Shorthand for an equality filter
    pub fn eq(field: impl Into<String>, value: IndexValue) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_eq_shorthand() {
        let filter = Filter::eq("accepted", IndexValue::Bool(true));
        assert_eq!(filter.field, "accepted");
        assert_eq!(filter.op, FilterOp::Eq);
        assert_eq!(filter.value, IndexValue::Bool(true));
    }

    #[test]
    fn test_bool_binds_as_integer() {
        let out = IndexValue::Bool(true).to_sql().unwrap();
        assert!(matches!(out, ToSqlOutput::Owned(Value::Integer(1))));
    }
}
