//! # KeelDB Query
//!
//! A thin relational-style façade over the KeelDB engine.
//!
//! Tables and rows are encoded into the engine's flat key space:
//!
//! - Row key: `<table>:<id>`, value: a JSON object whose fields include
//!   `"id"`
//! - Auto-increment metadata key: `__Meta__:<table>:next_id`, value: a
//!   JSON integer
//!
//! Queries are built fluently and executed against the engine:
//!
//! ```rust,ignore
//! use keeldb_query::Db;
//!
//! let db = Db::new(engine);
//!
//! let id = db.insert()
//!     .table("users")
//!     .value("name", "alice")
//!     .value("age", 30)
//!     .exec_returning_id()?;
//!
//! let adults = db.select()
//!     .table("users")
//!     .where_clause("age", ">", 17)
//!     .all()?;
//! ```
//!
//! Select scans every key with the `<table>:` prefix and filters in
//! memory; delete without a predicate removes every row in the table.
//! Field values are restricted to strings, 64-bit integers, floats, and
//! booleans. This crate knows nothing about HTTP; embedders map
//! [`QueryError`] to their own surface.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod predicate;
mod query;

pub use error::{QueryError, QueryResult};
pub use predicate::{Operator, Predicate};
pub use query::{Db, DeleteQuery, InsertQuery, Row, SelectQuery};
