//! The external driver facade.
//!
//! This crate never opens a connection or scans a row itself; it emits
//! `(String, Vec<Value>)` and hands off to whatever the caller implements
//! here. Statement builders' execution methods (`exec`, `scan`, `rows`,
//! `count`, `exists`, `scan_and_count`) take `&dyn Executor` and otherwise
//! do nothing the builder itself couldn't already do synchronously.

use std::collections::HashMap;

use crate::error::QueryResult;
use crate::value::Value;

/// A single scanned row, keyed by column name. Deliberately untyped: model
/// materialisation from a row is the caller's concern.
pub type Row = HashMap<String, Value>;

/// A feature this crate may ask the driver facade about beyond what the
/// active [`crate::dialect::SqlDialect`] already encodes statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    MultiTableUpdate,
    Returning,
    Merge,
}

/// Executes parameterised SQL produced by this crate's builders.
///
/// Implemented by the caller against their driver/connection pool; this
/// crate supplies only the SQL text and bound values.
pub trait Executor: Send + Sync {
    fn dialect(&self) -> crate::dialect::Dialect;

    fn supports(&self, feature: Feature) -> bool;

    /// `INSERT`/`UPDATE`/`DELETE`; returns rows affected.
    fn exec(&self, sql: &str, params: &[Value]) -> QueryResult<u64>;

    /// `SELECT`; returns every matching row.
    fn rows(&self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>>;

    /// `SELECT` expected to match at most one row.
    fn scan(&self, sql: &str, params: &[Value]) -> QueryResult<Option<Row>> {
        Ok(self.rows(sql, params)?.into_iter().next())
    }

    /// `SELECT COUNT(*) ...`.
    fn count(&self, sql: &str, params: &[Value]) -> QueryResult<i64>;

    /// `SELECT EXISTS(...)`.
    fn exists(&self, sql: &str, params: &[Value]) -> QueryResult<bool> {
        Ok(self.count(sql, params)? > 0)
    }

    /// Run a page query and its matching unpaginated count together.
    fn scan_and_count(
        &self,
        sql: &str,
        params: &[Value],
        count_sql: &str,
        count_params: &[Value],
    ) -> QueryResult<(Vec<Row>, i64)> {
        Ok((self.rows(sql, params)?, self.count(count_sql, count_params)?))
    }
}
