//! Arbor – an embeddable fact store with a miniature logic-query language.
//!
//! Facts are *sentences*: paths such as `astrid.relationships.jordan.reputation!30`
//! asserted into a tree. Every separator says something about the token in
//! front of it:
//! * `.` – the token may hold any number of children (cardinality `Many`).
//! * `!` – the token holds exactly one child (cardinality `One`); inserting a
//!   new child replaces the old one.
//!
//! Tokens are typed on parsing: `?name` is a variable, then integers, then
//! floats, and anything else is a symbol.
//!
//! ## Modules
//! * [`datatype`] – The [`datatype::Value`] carried by nodes and tokens, and
//!   its comparators.
//! * [`sentence`] – Parsing, binding and prefix matching of sentences.
//! * [`construct`] – The node arena and the [`construct::Database`] owning
//!   it, including before-access listeners.
//! * [`unify`] – Unification of sentences against the tree and the join of
//!   the resulting binding rows.
//! * [`query`] – Clauses, their evaluation, and query results.
//! * [`settings`] – Settings for the startup runner.
//!
//! ## Queries
//! A query is an ordered list of clauses. A clause is either a sentence that
//! must hold, `not` followed by a sentence that must not hold, or a
//! comparison `eq|neq|lt|gt|lte|gte lhs rhs` between single tokens. Variables
//! are unified across clauses, so every surviving binding row is consistent
//! with all of them at once.
//!
//! ## Before-access listeners
//! A listener registered for a prefix runs the first time a query touches a
//! path starting with that prefix, at most once per query run. Listeners get
//! the database mutably, which lets them materialize derived facts lazily.
//!
//! ## Quick Start
//! ```
//! use arbor::{construct::Database, query::Query};
//! let mut db = Database::new();
//! db.insert("astrid.relationships.jordan.reputation!30").unwrap();
//! db.insert("astrid.relationships.britt.reputation!-10").unwrap();
//! let result = Query::new()
//!     .clause("astrid.relationships.?other.reputation!?r")
//!     .clause("gte ?r 10")
//!     .run(&mut db)
//!     .unwrap();
//! assert!(result.success);
//! assert_eq!(result.bindings.len(), 1);
//! ```
//!
//! ## Concurrency
//! Everything is synchronous and nothing locks. Callers serialize access to
//! a database themselves.

pub mod construct;
pub mod datatype;
pub mod error;
pub mod query;
pub mod sentence;
pub mod settings;
pub mod unify;

pub use error::{ArborError, Result};
