//! The `DialectDispatcher`: uniform execute-by-dialect / produce-by-dialect
//! mechanism described in SPEC_FULL.md §4.2.
//!
//! Every operator that needs per-dialect behaviour (aggregates, conflict
//! clauses, locking hints) builds one of these instead of special-casing
//! `match dialect` inline, so the dialect quirk lives next to the operator
//! it concerns and the serializer stays oblivious to dialect branching.

use crate::dialect::Dialect;
use crate::error::QueryError;

/// A mapping from dialect to a zero-argument producer, with an optional
/// fallback used when no dialect-specific arm was registered.
///
/// Used two ways: "execute-by-dialect" (R = `()`, side effects only inside
/// the closure) and "produce-by-dialect" (R = some expression/value type).
pub struct DialectDispatcher<R> {
    arms: [Option<Box<dyn FnOnce() -> R>>; 5],
    default: Option<Box<dyn FnOnce() -> R>>,
}

fn dialect_index(dialect: Dialect) -> usize {
    match dialect {
        Dialect::Postgres => 0,
        Dialect::MySql => 1,
        Dialect::Sqlite => 2,
        Dialect::Oracle => 3,
        Dialect::SqlServer => 4,
    }
}

impl<R> Default for DialectDispatcher<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> DialectDispatcher<R> {
    pub fn new() -> Self {
        Self {
            arms: [None, None, None, None, None],
            default: None,
        }
    }

    pub fn on(mut self, dialect: Dialect, f: impl FnOnce() -> R + 'static) -> Self {
        self.arms[dialect_index(dialect)] = Some(Box::new(f));
        self
    }

    pub fn postgres(self, f: impl FnOnce() -> R + 'static) -> Self {
        self.on(Dialect::Postgres, f)
    }

    pub fn mysql(self, f: impl FnOnce() -> R + 'static) -> Self {
        self.on(Dialect::MySql, f)
    }

    pub fn sqlite(self, f: impl FnOnce() -> R + 'static) -> Self {
        self.on(Dialect::Sqlite, f)
    }

    pub fn oracle(self, f: impl FnOnce() -> R + 'static) -> Self {
        self.on(Dialect::Oracle, f)
    }

    pub fn sqlserver(self, f: impl FnOnce() -> R + 'static) -> Self {
        self.on(Dialect::SqlServer, f)
    }

    pub fn default_arm(mut self, f: impl FnOnce() -> R + 'static) -> Self {
        self.default = Some(Box::new(f));
        self
    }

    /// Invoke the arm registered for `dialect`, falling back to the default
    /// arm. Fails with `DialectHandlerMissing` if neither is present.
    pub fn dispatch(mut self, dialect: Dialect) -> Result<R, QueryError> {
        let arm = self.arms[dialect_index(dialect)].take().or(self.default.take());
        arm.map(|f| f())
            .ok_or(QueryError::DialectHandlerMissing(dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_matching_arm() {
        let result = DialectDispatcher::new()
            .postgres(|| "pg")
            .mysql(|| "my")
            .default_arm(|| "default")
            .dispatch(Dialect::MySql)
            .unwrap();
        assert_eq!(result, "my");
    }

    #[test]
    fn falls_back_to_default() {
        let result = DialectDispatcher::new()
            .postgres(|| 1)
            .default_arm(|| 0)
            .dispatch(Dialect::Sqlite)
            .unwrap();
        assert_eq!(result, 0);
    }

    #[test]
    fn missing_handler_errors() {
        let result: Result<i32, _> = DialectDispatcher::new().postgres(|| 1).dispatch(Dialect::Sqlite);
        assert!(matches!(result, Err(QueryError::DialectHandlerMissing(Dialect::Sqlite))));
    }
}
