//! Where-clause predicates.

use crate::error::{QueryError, QueryResult};
use crate::query::Row;
use serde_json::Value;

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

impl Operator {
    /// Parses an operator from its query syntax.
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            _ => None,
        }
    }

    /// Returns the operator's query syntax.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
        }
    }
}

/// A single-field predicate: `field <op> value`.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: String,
    op: Operator,
    value: Value,
}

impl Predicate {
    /// Builds a predicate, validating the operator and the value type.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperator` for an unknown operator and
    /// `UnsupportedValue` for a value that is not a string, number, or
    /// boolean.
    pub fn new(field: impl Into<String>, op: &str, value: Value) -> QueryResult<Self> {
        let field = field.into();
        let op = Operator::parse(op).ok_or_else(|| QueryError::unsupported_operator(op))?;
        if !is_allowed_value(&value) {
            return Err(QueryError::unsupported_value(field));
        }
        Ok(Self { field, op, value })
    }

    /// Checks the predicate against a row.
    ///
    /// A row without the field matches nothing, and so does a comparison
    /// across mismatched types.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        match row.get(&self.field) {
            Some(actual) => compare(self.op, actual, &self.value),
            None => false,
        }
    }
}

/// Whether a value may be stored in a row or used in a predicate:
/// strings, 64-bit numbers, and booleans.
pub(crate) fn is_allowed_value(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn compare(op: Operator, left: &Value, right: &Value) -> bool {
    match (left, right) {
        // Integers coerce to floats so 30 and 30.0 compare equal.
        (Value::Number(l), Value::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => match op {
                Operator::Eq => l == r,
                Operator::Ne => l != r,
                Operator::Lt => l < r,
                Operator::Gt => l > r,
            },
            _ => false,
        },
        (Value::String(l), Value::String(r)) => match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::Lt => l < r,
            Operator::Gt => l > r,
        },
        (Value::Bool(l), Value::Bool(r)) => match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::Lt | Operator::Gt => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        let mut row = Row::new();
        row.insert("field".to_string(), value);
        row
    }

    fn pred(op: &str, value: Value) -> Predicate {
        Predicate::new("field", op, value).unwrap()
    }

    #[test]
    fn operator_parse() {
        assert_eq!(Operator::parse("="), Some(Operator::Eq));
        assert_eq!(Operator::parse("!="), Some(Operator::Ne));
        assert_eq!(Operator::parse("<"), Some(Operator::Lt));
        assert_eq!(Operator::parse(">"), Some(Operator::Gt));
        assert_eq!(Operator::parse(">="), None);
        assert_eq!(Operator::parse("like"), None);
    }

    #[test]
    fn numeric_comparisons_coerce_to_float() {
        assert!(pred("=", json!(30)).matches(&row(json!(30.0))));
        assert!(pred(">", json!(25)).matches(&row(json!(30))));
        assert!(pred("<", json!(25.5)).matches(&row(json!(25))));
        assert!(pred("!=", json!(1)).matches(&row(json!(2))));
        assert!(!pred(">", json!(30)).matches(&row(json!(30))));
    }

    #[test]
    fn string_comparisons_are_lexicographic() {
        assert!(pred("=", json!("alice")).matches(&row(json!("alice"))));
        assert!(pred("<", json!("bob")).matches(&row(json!("alice"))));
        assert!(pred(">", json!("alice")).matches(&row(json!("bob"))));
        assert!(!pred("=", json!("alice")).matches(&row(json!("bob"))));
    }

    #[test]
    fn bool_ordering_never_matches() {
        assert!(pred("=", json!(true)).matches(&row(json!(true))));
        assert!(pred("!=", json!(true)).matches(&row(json!(false))));
        assert!(!pred("<", json!(false)).matches(&row(json!(true))));
        assert!(!pred(">", json!(false)).matches(&row(json!(true))));
    }

    #[test]
    fn mismatched_types_never_match() {
        assert!(!pred("=", json!("30")).matches(&row(json!(30))));
        assert!(!pred("=", json!(true)).matches(&row(json!(1))));
        assert!(!pred("!=", json!("x")).matches(&row(json!(false))));
    }

    #[test]
    fn missing_field_never_matches() {
        let predicate = Predicate::new("absent", "=", json!(1)).unwrap();
        assert!(!predicate.matches(&row(json!(1))));
    }

    #[test]
    fn invalid_operator_is_rejected() {
        let result = Predicate::new("f", ">=", json!(1));
        assert!(matches!(result, Err(QueryError::UnsupportedOperator { .. })));
    }

    #[test]
    fn invalid_value_is_rejected() {
        let result = Predicate::new("f", "=", json!([1, 2]));
        assert!(matches!(result, Err(QueryError::UnsupportedValue { .. })));
        let result = Predicate::new("f", "=", Value::Null);
        assert!(matches!(result, Err(QueryError::UnsupportedValue { .. })));
    }
}
