//! The UPDATE statement builder: `Set`/`SetExpr` assignments, `OmitZero`,
//! multi-table updates gated by dialect support, batched per-row updates via
//! `Bulk`, and auto-column/soft-delete integration.

use std::collections::BTreeMap;

use crate::autocolumn::HookContext;
use crate::condition::ConditionBuilder;
use crate::db::Db;
use crate::dialect::{Dialect, SqlDialect};
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::expr::{lit, Expr};
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
struct MultiTableFrom {
    table: String,
    alias: String,
    on: Expr,
}

/// Pending `.bulk()` rows: shared PK column list plus one row per statement.
type BulkRows = (Vec<String>, Vec<BTreeMap<String, Value>>);

#[derive(Debug, Clone)]
#[must_use]
pub struct Update {
    db: Db,
    table: String,
    model_name: Option<String>,
    assignments: Vec<(String, Expr, bool)>, // (column, expr, omit_if_zero_value)
    where_builder: ConditionBuilder,
    returning: ReturningSpec,
    returning_explicit: bool,
    include_deleted: bool,
    from: Option<MultiTableFrom>,
    bulk: Option<BulkRows>,
}

impl Update {
    pub(crate) fn new(db: Db, table: String) -> Self {
        Self {
            db,
            table,
            model_name: None,
            assignments: Vec::new(),
            where_builder: ConditionBuilder::new(),
            returning: ReturningSpec::None,
            returning_explicit: false,
            include_deleted: false,
            from: None,
            bulk: None,
        }
    }

    pub fn model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), lit(value.into()), false));
        self
    }

    /// As [`Update::set`], but skipped when `value` is Rust's "zero value"
    /// for its type (empty string, `0`, `false`, nil UUID, ...).
    pub fn set_omit_zero(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), lit(value.into()), true));
        self
    }

    pub fn set_expr(mut self, column: impl Into<String>, expr: Expr) -> Self {
        self.assignments.push((column.into(), expr, false));
        self
    }

    pub fn filter(mut self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        self.where_builder = f(self.where_builder);
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// `UPDATE t SET ... FROM other AS alias WHERE ... AND on` (Postgres) /
    /// `UPDATE t, other AS alias SET ... WHERE on AND ...` (MySQL). Errors
    /// for dialects where `supports_multi_table_update()` is false.
    pub fn from_join(mut self, table: impl Into<String>, alias: impl Into<String>, on: Expr) -> Self {
        self.from = Some(MultiTableFrom { table: table.into(), alias: alias.into(), on });
        self
    }

    pub fn returning_all(mut self) -> Self {
        self.returning = ReturningSpec::All;
        self.returning_explicit = true;
        self
    }

    pub fn returning(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.returning = ReturningSpec::Columns(columns.into_iter().map(|c| c.into()).collect());
        self.returning_explicit = true;
        self
    }

    pub fn returning_none(mut self) -> Self {
        self.returning = ReturningSpec::None;
        self.returning_explicit = true;
        self
    }

    /// One UPDATE per row, each matched by `pk_columns`. Rendered via
    /// [`Update::to_sql_batch`] instead of `to_sql`.
    pub fn bulk(mut self, pk_columns: impl IntoIterator<Item = impl Into<String>>, rows: Vec<BTreeMap<String, Value>>) -> Self {
        self.bulk = Some((pk_columns.into_iter().map(|c| c.into()).collect(), rows));
        self
    }

    fn schema(&self) -> Option<crate::schema::TableSchema> {
        let name = self.model_name.as_deref().unwrap_or(&self.table);
        self.db.schema_of(name).ok()
    }

    fn soft_delete_predicate(&self) -> Option<Expr> {
        if self.include_deleted {
            return None;
        }
        self.db.auto_columns().soft_delete_column().map(|col| Expr::IsNull { expr: Box::new(crate::expr::col(col)), negated: false })
    }

    fn effective_where(&self, extra: Option<Expr>) -> Option<Expr> {
        let user_where = self.where_builder.clone().build();
        let combined = match (user_where, self.soft_delete_predicate()) {
            (Some(w), Some(sd)) => Some(Expr::BinaryOp { left: Box::new(sd), op: crate::expr::BinaryOperator::And, right: Box::new(w) }),
            (Some(w), None) => Some(w),
            (None, Some(sd)) => Some(sd),
            (None, None) => None,
        };
        match (combined, extra) {
            (Some(a), Some(b)) => Some(Expr::BinaryOp { left: Box::new(a), op: crate::expr::BinaryOperator::And, right: Box::new(b) }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    fn resolved_assignments(&self) -> Vec<(String, Expr)> {
        let mut assignments: Vec<(String, Expr)> = self
            .assignments
            .iter()
            .filter(|(_, expr, omit_zero)| !(*omit_zero && matches!(expr, Expr::Literal(v) if v.is_zero())))
            .map(|(c, e, _)| (c.clone(), e.clone()))
            .collect();

        if let Some(schema) = self.schema() {
            let existing: std::collections::HashMap<String, Value> = self
                .assignments
                .iter()
                .filter_map(|(c, e, _)| match e {
                    Expr::Literal(v) => Some((c.clone(), v.clone())),
                    _ => None,
                })
                .collect();
            let ctx = HookContext {
                schema: &schema,
                operator: self.db.operator(),
                clock: self.db.clock(),
                id_generator: self.db.id_generator(),
                existing: &existing,
            };
            let mut hook_assignments = std::collections::HashMap::new();
            self.db.auto_columns().apply_update(&ctx, &mut hook_assignments);
            for (col, value) in hook_assignments {
                if !assignments.iter().any(|(c, _)| c == &col) {
                    assignments.push((col, lit(value)));
                }
            }
        }
        assignments
    }

    fn render_one(&self, dialect: Dialect, params: &mut Vec<Value>, extra_where: Option<Expr>) -> QueryResult<TokenStream> {
        let assignments = self.resolved_assignments();
        if assignments.is_empty() {
            return Err(QueryError::InvariantViolated("update has no assignments".into()));
        }

        let mut ts = TokenStream::new();
        ts.push(Token::Update).space();

        if let Some(from) = &self.from {
            if !dialect.supports_multi_table_update() {
                return Err(QueryError::DialectUnsupportedOperation { operation: "multi-table UPDATE", dialect });
            }
            match dialect {
                Dialect::MySql => {
                    ts.push(Token::Ident(self.table.clone())).comma().space();
                    ts.push(Token::Ident(from.table.clone())).space().push(Token::As).space().push(Token::Ident(from.alias.clone()));
                }
                _ => {
                    ts.push(Token::Ident(self.table.clone()));
                }
            }
        } else {
            ts.push(Token::Ident(self.table.clone()));
        }

        ts.space().push(Token::Set).space();
        for (i, (col, expr)) in assignments.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident(col.clone())).space().push(Token::Eq).space();
            ts.append(&expr.render(dialect, params)?);
        }

        if let Some(from) = &self.from {
            if dialect != Dialect::MySql {
                ts.space().push(Token::From).space();
                ts.push(Token::Ident(from.table.clone())).space().push(Token::As).space().push(Token::Ident(from.alias.clone()));
            }
        }

        let on_clause = self.from.as_ref().map(|f| f.on.clone());
        let where_expr = match (on_clause, extra_where, self.effective_where(None)) {
            (Some(on), Some(extra), Some(w)) => Some(Expr::BinaryOp {
                left: Box::new(Expr::BinaryOp { left: Box::new(on), op: crate::expr::BinaryOperator::And, right: Box::new(extra) }),
                op: crate::expr::BinaryOperator::And,
                right: Box::new(w),
            }),
            (Some(on), Some(extra), None) => Some(Expr::BinaryOp { left: Box::new(on), op: crate::expr::BinaryOperator::And, right: Box::new(extra) }),
            (Some(on), None, Some(w)) => Some(Expr::BinaryOp { left: Box::new(on), op: crate::expr::BinaryOperator::And, right: Box::new(w) }),
            (Some(on), None, None) => Some(on),
            (None, Some(extra), Some(w)) => Some(Expr::BinaryOp { left: Box::new(extra), op: crate::expr::BinaryOperator::And, right: Box::new(w) }),
            (None, Some(extra), None) => Some(extra),
            (None, None, Some(w)) => Some(w),
            (None, None, None) => None,
        };

        if let Some(w) = where_expr {
            ts.space().push(Token::Where).space();
            ts.append(&w.render(dialect, params)?);
        }

        let auto_returning =
            !self.returning_explicit && self.model_name.is_some() && !self.assignments.is_empty() && dialect.supports_returning();
        match (&self.returning, auto_returning) {
            (ReturningSpec::None, false) => {}
            (ReturningSpec::None, true) => {
                ts.space().push(Token::Returning).space();
                for (i, (col, _, _)) in self.assignments.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(col.clone()));
                }
            }
            (ReturningSpec::All, _) => {
                if !dialect.supports_returning() {
                    return Err(QueryError::DialectUnsupportedOperation { operation: "RETURNING", dialect });
                }
                ts.space().push(Token::Returning).space().push(Token::Star);
            }
            (ReturningSpec::Columns(cols), _) => {
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

        Ok(ts)
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub fn to_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        if self.bulk.is_some() {
            return Err(QueryError::InvariantViolated("bulk update must be rendered via to_sql_batch".into()));
        }
        let dialect = self.db.dialect();
        let mut params = Vec::new();
        let ts = self.render_one(dialect, &mut params, None)?;
        Ok((ts.serialize(dialect), params))
    }

    /// One `(sql, params)` pair per bulk row, each `WHERE pk = ...`.
    pub fn to_sql_batch(&self) -> QueryResult<Vec<(String, Vec<Value>)>> {
        let (pk_columns, rows) = self
            .bulk
            .as_ref()
            .ok_or_else(|| QueryError::InvariantViolated("to_sql_batch requires bulk() to have been called".into()))?;
        let dialect = self.db.dialect();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let pk_values: Vec<Value> = pk_columns.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Null)).collect();
            let mut statement = self.clone();
            statement.assignments = row
                .iter()
                .filter(|(c, _)| !pk_columns.contains(c))
                .map(|(c, v)| (c.clone(), lit(v.clone()), false))
                .collect();
            statement.bulk = None;
            let extra_where = ConditionBuilder::new().pk_equals(pk_columns, pk_values).build();
            let mut params = Vec::new();
            let ts = statement.render_one(dialect, &mut params, extra_where)?;
            out.push((ts.serialize(dialect), params));
        }
        Ok(out)
    }

    pub fn exec(&self, executor: &dyn Executor) -> QueryResult<u64> {
        let (sql, params) = self.to_sql()?;
        executor.exec(&sql, &params)
    }

    pub fn exec_batch(&self, executor: &dyn Executor) -> QueryResult<u64> {
        let mut total = 0;
        for (sql, params) in self.to_sql_batch()? {
            total += executor.exec(&sql, &params)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn basic_update_with_soft_delete_filter() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new().with_soft_delete("deleted_at"));
        let update = db.update("posts").set("title", "new").filter(|c| c.equals("id", 1i64));
        let (sql, params) = update.to_sql().unwrap();
        assert_eq!(sql, "UPDATE \"posts\" SET \"title\" = $1 WHERE \"deleted_at\" IS NULL AND \"id\" = $2");
        assert_eq!(params, vec![Value::Text("new".into()), Value::Int(1)]);
    }

    #[test]
    fn omit_zero_skips_zero_valued_assignment() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let update = db.update("t").set("a", 5i64).set_omit_zero("b", 0i64).filter(|c| c.equals("id", 1i64));
        let (sql, _) = update.to_sql().unwrap();
        assert_eq!(sql, "UPDATE \"t\" SET \"a\" = $1 WHERE \"id\" = $2");
    }

    #[test]
    fn bulk_update_renders_one_statement_per_row() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let rows = vec![
            BTreeMap::from([("id".to_string(), Value::Int(1)), ("name".to_string(), Value::Text("a".into()))]),
            BTreeMap::from([("id".to_string(), Value::Int(2)), ("name".to_string(), Value::Text("b".into()))]),
        ];
        let update = db.update("t").bulk(["id"], rows);
        let statements = update.to_sql_batch().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].0, "UPDATE \"t\" SET \"name\" = $1 WHERE \"id\" = $2");
    }

    #[test]
    fn auto_returning_lists_only_set_columns_not_star() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let update = db.update("posts").model("Post").set("title", "new").set("body", "text").filter(|c| c.equals("id", 1i64));
        let (sql, _) = update.to_sql().unwrap();
        assert_eq!(
            sql,
            "UPDATE \"posts\" SET \"title\" = $1, \"body\" = $2 WHERE \"id\" = $3 RETURNING \"title\", \"body\""
        );
    }

    #[test]
    fn auto_returning_does_not_fire_for_hook_only_assignments() {
        let schema = crate::schema::TableSchema::new(
            "posts",
            "Post",
            vec![crate::schema::Field::new("id").pk(), crate::schema::Field::new("updated_at")],
        );
        let provider = crate::schema::StaticSchemaProvider::new().register(schema);
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::with_defaults()).with_schema_provider(provider);
        let update = db.update("posts").model("Post").filter(|c| c.equals("id", 1i64));
        let (sql, _) = update.to_sql().unwrap();
        assert!(sql.contains("\"updated_at\" ="), "hook should still populate updated_at");
        assert!(!sql.contains("RETURNING"), "no explicit Set call was made, so RETURNING must not auto-fire");
    }
}
