//! The DELETE statement builder.
//!
//! A plain `Delete` never issues `DELETE FROM`: when the `Db`'s auto-column
//! registry carries a soft-delete column, it's rendered as an `UPDATE`
//! setting that column to the current timestamp instead, reusing
//! [`super::update::Update`]. Only [`Delete::force_delete`] issues a real
//! `DELETE FROM`.

use crate::condition::ConditionBuilder;
use crate::db::Db;
use crate::dialect::SqlDialect;
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::expr::Expr;
use crate::token::{Token, TokenStream};
use crate::value::Value;

#[derive(Debug, Clone, Default)]
enum ReturningSpec {
    #[default]
    None,
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone)]
#[must_use]
pub struct Delete {
    db: Db,
    table: String,
    model_name: Option<String>,
    where_builder: ConditionBuilder,
    include_deleted: bool,
    force: bool,
    returning: ReturningSpec,
}

impl Delete {
    pub(crate) fn new(db: Db, table: String) -> Self {
        Self {
            db,
            table,
            model_name: None,
            where_builder: ConditionBuilder::new(),
            include_deleted: false,
            force: false,
            returning: ReturningSpec::None,
        }
    }

    pub fn model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn filter(mut self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        self.where_builder = f(self.where_builder);
        self
    }

    /// Also match rows already soft-deleted (only meaningful alongside
    /// [`Delete::force_delete`] to hard-delete previously soft-deleted rows).
    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Issue a real `DELETE FROM` regardless of a configured soft-delete
    /// column.
    pub fn force_delete(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = ReturningSpec::All;
        self
    }

    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = ReturningSpec::Columns(columns.into_iter().map(|c| c.into()).collect());
        self
    }

    fn soft_delete_predicate(&self) -> Option<Expr> {
        if self.include_deleted || self.force {
            return None;
        }
        self.db.auto_columns().soft_delete_column().map(|col| Expr::IsNull { expr: Box::new(crate::expr::col(col)), negated: false })
    }

    fn effective_where(&self) -> Option<Expr> {
        let user_where = self.where_builder.clone().build();
        match (user_where, self.soft_delete_predicate()) {
            (Some(w), Some(sd)) => Some(Expr::BinaryOp { left: Box::new(sd), op: crate::expr::BinaryOperator::And, right: Box::new(w) }),
            (Some(w), None) => Some(w),
            (None, Some(sd)) => Some(sd),
            (None, None) => None,
        }
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub fn to_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        if !self.force {
            if let Some(col) = self.db.auto_columns().soft_delete_column() {
                let mut update = self.db.update(self.table.clone()).set(col, self.db.clock().now());
                if let Some(name) = &self.model_name {
                    update = update.model(name.clone());
                }
                update = update.filter(|_| self.where_builder.clone());
                if self.include_deleted {
                    update = update.include_deleted();
                }
                update = match &self.returning {
                    ReturningSpec::None => update.returning_none(),
                    ReturningSpec::All => update.returning_all(),
                    ReturningSpec::Columns(cols) => update.returning(cols.clone()),
                };
                return update.to_sql();
            }
        }

        let dialect = self.db.dialect();
        let mut params = Vec::new();
        let mut ts = TokenStream::new();
        ts.push(Token::Delete).space().push(Token::From).space().push(Token::Ident(self.table.clone()));

        if let Some(w) = self.effective_where() {
            ts.space().push(Token::Where).space();
            ts.append(&w.render(dialect, &mut params)?);
        }

        match &self.returning {
            ReturningSpec::None => {}
            ReturningSpec::All => {
                if !dialect.supports_returning() {
                    return Err(QueryError::DialectUnsupportedOperation { operation: "RETURNING", dialect });
                }
                ts.space().push(Token::Returning).space().push(Token::Star);
            }
            ReturningSpec::Columns(cols) => {
                if !dialect.supports_returning() {
                    return Err(QueryError::DialectUnsupportedOperation { operation: "RETURNING", dialect });
                }
                ts.space().push(Token::Returning).space();
                for (i, c) in cols.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(c.clone()));
                }
            }
        }

        let sql = ts.serialize(dialect);
        tracing::debug!(param_count = params.len(), "delete rendered");
        Ok((sql, params))
    }

    pub fn exec(&self, executor: &dyn Executor) -> QueryResult<u64> {
        let (sql, params) = self.to_sql()?;
        executor.exec(&sql, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::hooks::Clock;

    struct FixedClock;
    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap()
        }
    }

    #[test]
    fn default_delete_is_soft_update() {
        let db = Db::new(Dialect::Postgres)
            .with_auto_columns(crate::autocolumn::AutoColumnRegistry::new().with_soft_delete("deleted_at"))
            .with_clock(FixedClock);
        let delete = db.delete("posts").filter(|c| c.equals("id", 1i64));
        let (sql, params) = delete.to_sql().unwrap();
        assert_eq!(sql, "UPDATE \"posts\" SET \"deleted_at\" = $1 WHERE \"deleted_at\" IS NULL AND \"id\" = $2");
        assert_eq!(params[1], Value::Int(1));
    }

    #[test]
    fn force_delete_issues_real_delete() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new().with_soft_delete("deleted_at"));
        let delete = db.delete("posts").filter(|c| c.equals("id", 1i64)).force_delete();
        let (sql, params) = delete.to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM \"posts\" WHERE \"id\" = $1");
        assert_eq!(params, vec![Value::Int(1)]);
    }

    #[test]
    fn delete_without_soft_delete_column_is_real_delete() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let delete = db.delete("t").filter(|c| c.equals("id", 1i64));
        let (sql, _) = delete.to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM \"t\" WHERE \"id\" = $1");
    }
}
