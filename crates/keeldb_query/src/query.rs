//! The query builders: insert, select, delete.

use crate::error::{QueryError, QueryResult};
use crate::predicate::{is_allowed_value, Predicate};
use keeldb_core::Engine;
use serde_json::Value;
use std::sync::Arc;

/// A decoded row: a JSON object including its `"id"` field.
pub type Row = serde_json::Map<String, Value>;

/// The query-facing database handle.
///
/// Wraps an [`Engine`] and maps tables and rows onto its flat key space:
/// row `id` of table `t` lives at key `t:<id>`, and the auto-increment
/// counter for `t` at `__Meta__:t:next_id`.
#[derive(Debug, Clone)]
pub struct Db {
    engine: Arc<Engine>,
}

impl Db {
    /// Creates a query handle over an engine.
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Starts an insert query.
    #[must_use]
    pub fn insert(&self) -> InsertQuery<'_> {
        InsertQuery {
            db: self,
            table: String::new(),
            values: Row::new(),
        }
    }

    /// Starts a select query.
    #[must_use]
    pub fn select(&self) -> SelectQuery<'_> {
        SelectQuery {
            db: self,
            table: String::new(),
            predicate: None,
            deferred_error: None,
        }
    }

    /// Starts a delete query.
    #[must_use]
    pub fn delete(&self) -> DeleteQuery<'_> {
        DeleteQuery {
            db: self,
            table: String::new(),
            predicate: None,
            deferred_error: None,
        }
    }

    /// Allocates the next auto-increment id for a table.
    ///
    /// The counter key holds the id the *next* insert will get; a missing
    /// counter means the table has never auto-allocated, so the first id
    /// is 1 and the stored counter becomes 2.
    fn next_id(&self, table: &str) -> QueryResult<i64> {
        let meta_key = format!("__Meta__:{table}:next_id");

        match self.engine.get(meta_key.as_bytes())? {
            None => {
                self.engine
                    .put(meta_key.as_bytes(), &serde_json::to_vec(&2_i64)?)?;
                Ok(1)
            }
            Some(raw) => {
                let next: i64 = serde_json::from_slice(&raw)?;
                self.engine
                    .put(meta_key.as_bytes(), &serde_json::to_vec(&(next + 1))?)?;
                Ok(next)
            }
        }
    }
}

/// An insert under construction.
#[derive(Debug)]
pub struct InsertQuery<'a> {
    db: &'a Db,
    table: String,
    values: Row,
}

impl InsertQuery<'_> {
    /// Sets the target table.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = name.into();
        self
    }

    /// Sets the full value map at once.
    #[must_use]
    pub fn values(mut self, values: Row) -> Self {
        self.values = values;
        self
    }

    /// Sets a single field.
    #[must_use]
    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Executes the insert.
    ///
    /// # Errors
    ///
    /// As [`InsertQuery::exec_returning_id`].
    pub fn exec(self) -> QueryResult<()> {
        self.exec_returning_id().map(|_| ())
    }

    /// Executes the insert and returns the row id.
    ///
    /// An explicit integer `"id"` value is used as-is; otherwise one is
    /// allocated from the table's auto-increment counter.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTable` or `EmptyValues` for an incomplete query,
    /// `UnsupportedValue` for a field that is not a string, number, or
    /// boolean (or an id that is not an integer), and any engine or JSON
    /// failure.
    pub fn exec_returning_id(mut self) -> QueryResult<i64> {
        if self.table.is_empty() {
            return Err(QueryError::EmptyTable);
        }
        if self.values.is_empty() {
            return Err(QueryError::EmptyValues);
        }

        for (field, value) in &self.values {
            if !is_allowed_value(value) {
                return Err(QueryError::unsupported_value(field));
            }
        }

        let id = match self.values.get("id") {
            Some(value) => {
                integer_id(value).ok_or_else(|| QueryError::unsupported_value("id"))?
            }
            None => {
                let id = self.db.next_id(&self.table)?;
                self.values.insert("id".to_string(), Value::from(id));
                id
            }
        };

        let key = format!("{}:{}", self.table, id);
        let data = serde_json::to_vec(&Value::Object(self.values))?;
        self.db.engine.put(key.as_bytes(), &data)?;

        Ok(id)
    }
}

/// A select under construction.
#[derive(Debug)]
pub struct SelectQuery<'a> {
    db: &'a Db,
    table: String,
    predicate: Option<Predicate>,
    deferred_error: Option<QueryError>,
}

impl SelectQuery<'_> {
    /// Sets the table to read.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = name.into();
        self
    }

    /// Restricts the result to rows where `field <op> value`.
    ///
    /// An invalid operator or value type is recorded and surfaced when
    /// the query executes.
    #[must_use]
    pub fn where_clause(
        mut self,
        field: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Self {
        match Predicate::new(field, op, value.into()) {
            Ok(predicate) => self.predicate = Some(predicate),
            Err(e) => self.deferred_error = Some(e),
        }
        self
    }

    /// Executes the select, returning every matching row.
    ///
    /// Scans all keys with the `<table>:` prefix and filters in memory.
    /// Row order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTable` for a missing table name, a recorded
    /// where-clause error, or any engine/JSON failure.
    pub fn all(self) -> QueryResult<Vec<Row>> {
        if let Some(e) = self.deferred_error {
            return Err(e);
        }
        if self.table.is_empty() {
            return Err(QueryError::EmptyTable);
        }

        let prefix = format!("{}:", self.table);
        let raw = self.db.engine.scan_prefix(prefix.as_bytes())?;

        let mut out = Vec::with_capacity(raw.len());
        for (key, data) in raw {
            let row = decode_row(&key, &data)?;
            if self.predicate.as_ref().map_or(true, |p| p.matches(&row)) {
                out.push(row);
            }
        }

        Ok(out)
    }
}

/// A delete under construction.
#[derive(Debug)]
pub struct DeleteQuery<'a> {
    db: &'a Db,
    table: String,
    predicate: Option<Predicate>,
    deferred_error: Option<QueryError>,
}

impl DeleteQuery<'_> {
    /// Sets the table to delete from.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = name.into();
        self
    }

    /// Restricts the delete to rows where `field <op> value`.
    ///
    /// An invalid operator or value type is recorded and surfaced when
    /// the query executes.
    #[must_use]
    pub fn where_clause(
        mut self,
        field: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Self {
        match Predicate::new(field, op, value.into()) {
            Ok(predicate) => self.predicate = Some(predicate),
            Err(e) => self.deferred_error = Some(e),
        }
        self
    }

    /// Executes the delete, returning the number of rows removed.
    ///
    /// Without a predicate this removes every row in the table.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTable` for a missing table name, a recorded
    /// where-clause error, or any engine/JSON failure.
    pub fn exec(self) -> QueryResult<usize> {
        if let Some(e) = self.deferred_error {
            return Err(e);
        }
        if self.table.is_empty() {
            return Err(QueryError::EmptyTable);
        }

        let prefix = format!("{}:", self.table);
        let raw = self.db.engine.scan_prefix(prefix.as_bytes())?;

        let mut deleted = 0;
        for (key, data) in raw {
            let matched = match &self.predicate {
                None => true,
                Some(predicate) => predicate.matches(&decode_row(&key, &data)?),
            };
            if matched {
                self.db.engine.delete(&key)?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

fn decode_row(key: &[u8], data: &[u8]) -> QueryResult<Row> {
    let value: Value = serde_json::from_slice(data)?;
    match value {
        Value::Object(row) => Ok(row),
        _ => Err(QueryError::InvalidRow {
            key: String::from_utf8_lossy(key).into_owned(),
        }),
    }
}

/// Extracts an integer id the way the row format stores it: integers
/// directly, floats truncated.
fn integer_id(value: &Value) -> Option<i64> {
    if !value.is_number() {
        return None;
    }
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}
