//! # mantis-query
//!
//! A dialect-aware SQL query construction engine: typed, fluent builders for
//! SELECT/INSERT/UPDATE/DELETE/MERGE that compile down to Postgres, MySQL,
//! SQLite, and (partially) Oracle and SQL Server, with parameters always
//! bound out of band.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         Builders (Select / Insert / Update / ...)       │
//! │    deferred state: select modes, conflicts, RETURNING   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [condition / expr]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Expr AST + ConditionBuilder                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [render]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Token / TokenStream (dialect-aware serializer)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Executor]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SQL + bound params                   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod autocolumn;
pub mod builder;
pub mod condition;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expr;
pub mod hooks;
pub mod pageable;
pub mod schema;
pub mod strategy;
pub mod token;
pub mod value;
pub mod window;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aggregate::Aggregate;
    pub use crate::builder::{Delete, Insert, Join, JoinType, Merge, OnConflict, Raw, RelationSpec, Select, Update};
    pub use crate::condition::ConditionBuilder;
    pub use crate::db::Db;
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::executor::{Executor, Feature, Row};
    pub use crate::expr::{col, func, lit, raw, star, table_col, Expr, ExprExt};
    pub use crate::pageable::Pageable;
    pub use crate::schema::{Field, TableSchema, TableSchemaProvider};
    pub use crate::token::{Token, TokenStream};
    pub use crate::value::Value;
}

pub use db::Db;
pub use dialect::Dialect;
pub use error::{QueryError, QueryResult};
pub use value::Value;
