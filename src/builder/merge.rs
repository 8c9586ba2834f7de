//! The MERGE statement builder (`WHEN MATCHED`/`WHEN NOT MATCHED` upsert),
//! gated by `dialect.supports_merge()`.

use crate::condition::ConditionBuilder;
use crate::db::Db;
use crate::dialect::{Dialect, SqlDialect};
use crate::error::{QueryError, QueryResult};
use crate::executor::Executor;
use crate::expr::Expr;
use crate::token::{Token, TokenStream};
use crate::value::Value;

use super::select::Select;

#[derive(Debug, Clone)]
enum MergeSource {
    Table { name: String, alias: String },
    Expr { expr: Expr, alias: String },
    Subquery { select: Box<Select>, alias: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhenKind {
    Matched,
    NotMatchedByTarget,
    NotMatchedBySource,
}

#[derive(Debug, Clone)]
enum ThenAction {
    Insert { columns: Vec<String>, values: Vec<Expr> },
    Update { assignments: Vec<(String, Expr)> },
    Delete,
    DoNothing,
}

#[derive(Debug, Clone)]
struct WhenClause {
    kind: WhenKind,
    condition: Option<Expr>,
    action: ThenAction,
}

#[derive(Debug, Clone)]
#[must_use]
pub struct Merge {
    db: Db,
    table: String,
    target_alias: Option<String>,
    source: Option<MergeSource>,
    on: Option<Expr>,
    whens: Vec<WhenClause>,
}

impl Merge {
    pub(crate) fn new(db: Db, table: String) -> Self {
        Self { db, table, target_alias: None, source: None, on: None, whens: Vec::new() }
    }

    pub fn target_alias(mut self, alias: impl Into<String>) -> Self {
        self.target_alias = Some(alias.into());
        self
    }

    pub fn using_table(mut self, name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.source = Some(MergeSource::Table { name: name.into(), alias: alias.into() });
        self
    }

    pub fn using_expr(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.source = Some(MergeSource::Expr { expr, alias: alias.into() });
        self
    }

    pub fn using_subquery(mut self, select: Select, alias: impl Into<String>) -> Self {
        self.source = Some(MergeSource::Subquery { select: Box::new(select), alias: alias.into() });
        self
    }

    pub fn on(mut self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        self.on = f(ConditionBuilder::new()).build();
        self
    }

    pub fn when_matched_update(mut self, condition: Option<Expr>, assignments: Vec<(String, Expr)>) -> Self {
        self.whens.push(WhenClause { kind: WhenKind::Matched, condition, action: ThenAction::Update { assignments } });
        self
    }

    pub fn when_matched_delete(mut self, condition: Option<Expr>) -> Self {
        self.whens.push(WhenClause { kind: WhenKind::Matched, condition, action: ThenAction::Delete });
        self
    }

    pub fn when_not_matched_insert(mut self, condition: Option<Expr>, columns: Vec<String>, values: Vec<Expr>) -> Self {
        self.whens.push(WhenClause { kind: WhenKind::NotMatchedByTarget, condition, action: ThenAction::Insert { columns, values } });
        self
    }

    pub fn when_not_matched_do_nothing(mut self, condition: Option<Expr>) -> Self {
        self.whens.push(WhenClause { kind: WhenKind::NotMatchedByTarget, condition, action: ThenAction::DoNothing });
        self
    }

    /// SQL Server-only branch; errors on dialects without `NOT MATCHED BY
    /// SOURCE` (Postgres, Oracle).
    pub fn when_not_matched_by_source_update(mut self, condition: Option<Expr>, assignments: Vec<(String, Expr)>) -> Self {
        self.whens.push(WhenClause { kind: WhenKind::NotMatchedBySource, condition, action: ThenAction::Update { assignments } });
        self
    }

    pub fn when_not_matched_by_source_delete(mut self, condition: Option<Expr>) -> Self {
        self.whens.push(WhenClause { kind: WhenKind::NotMatchedBySource, condition, action: ThenAction::Delete });
        self
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub fn to_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        let dialect = self.db.dialect();
        if !dialect.supports_merge() {
            return Err(QueryError::DialectUnsupportedOperation { operation: "MERGE", dialect });
        }
        let source = self.source.as_ref().ok_or_else(|| QueryError::InvariantViolated("merge requires a USING source".into()))?;
        let on = self.on.clone().ok_or_else(|| QueryError::InvariantViolated("merge requires an ON condition".into()))?;
        if self.whens.is_empty() {
            return Err(QueryError::InvariantViolated("merge requires at least one WHEN clause".into()));
        }
        if dialect != Dialect::SqlServer && self.whens.iter().any(|w| w.kind == WhenKind::NotMatchedBySource) {
            return Err(QueryError::DialectUnsupportedOperation { operation: "WHEN NOT MATCHED BY SOURCE", dialect });
        }

        let mut params = Vec::new();
        let mut ts = TokenStream::new();
        ts.push(Token::Merge).space().push(Token::Into).space().push(Token::Ident(self.table.clone()));
        if let Some(alias) = &self.target_alias {
            ts.space().push(Token::As).space().push(Token::Ident(alias.clone()));
        }
        ts.space().push(Token::Using).space();
        match source {
            MergeSource::Table { name, alias } => {
                ts.push(Token::Ident(name.clone())).space().push(Token::As).space().push(Token::Ident(alias.clone()));
            }
            MergeSource::Expr { expr, alias } => {
                ts.append(&expr.render(dialect, &mut params)?);
                ts.space().push(Token::As).space().push(Token::Ident(alias.clone()));
            }
            MergeSource::Subquery { select, alias } => {
                ts.lparen();
                ts.append(&select.render_tokens(dialect, &mut params)?);
                ts.rparen().space().push(Token::As).space().push(Token::Ident(alias.clone()));
            }
        }
        ts.space().push(Token::On).space().lparen();
        ts.append(&on.render(dialect, &mut params)?);
        ts.rparen();

        for when in &self.whens {
            ts.space().push(Token::When).space();
            match when.kind {
                WhenKind::Matched => {
                    ts.push(Token::Matched);
                }
                WhenKind::NotMatchedByTarget => {
                    ts.push(Token::Not).space().push(Token::Matched);
                }
                WhenKind::NotMatchedBySource => {
                    ts.push(Token::Not).space().push(Token::Matched).space().push(Token::Raw("BY SOURCE".into()));
                }
            }
            if let Some(cond) = &when.condition {
                ts.space().push(Token::And).space();
                ts.append(&cond.render(dialect, &mut params)?);
            }
            ts.space().push(Token::Then).space();
            match &when.action {
                ThenAction::Insert { columns, values } => {
                    ts.push(Token::Insert).space().lparen();
                    for (i, c) in columns.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.push(Token::Ident(c.clone()));
                    }
                    ts.rparen().space().push(Token::Values).space().lparen();
                    for (i, v) in values.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.append(&v.render(dialect, &mut params)?);
                    }
                    ts.rparen();
                }
                ThenAction::Update { assignments } => {
                    ts.push(Token::Update).space().push(Token::Set).space();
                    for (i, (col, expr)) in assignments.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.push(Token::Ident(col.clone())).space().push(Token::Eq).space();
                        ts.append(&expr.render(dialect, &mut params)?);
                    }
                }
                ThenAction::Delete => {
                    ts.push(Token::Delete);
                }
                ThenAction::DoNothing => {
                    ts.push(Token::Nothing);
                }
            }
        }

        let sql = ts.serialize(dialect);
        tracing::debug!(param_count = params.len(), "merge rendered");
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
    use crate::expr::{col, lit, table_col};

    #[test]
    fn upsert_matched_update_not_matched_insert() {
        let db = Db::new(Dialect::Postgres);
        let merge = db
            .merge("accounts")
            .target_alias("t")
            .using_table("staging", "s")
            .on(|c| c.equals_expr("id", table_col("s", "id")))
            .when_matched_update(None, vec![("balance".into(), table_col("s", "balance"))])
            .when_not_matched_insert(None, vec!["id".into(), "balance".into()], vec![table_col("s", "id"), table_col("s", "balance")]);
        let (sql, _) = merge.to_sql().unwrap();
        assert_eq!(
            sql,
            "MERGE INTO \"accounts\" AS \"t\" USING \"staging\" AS \"s\" ON (\"id\" = \"s\".\"id\") WHEN MATCHED THEN UPDATE SET \"balance\" = \"s\".\"balance\" WHEN NOT MATCHED THEN INSERT (\"id\", \"balance\") VALUES (\"s\".\"id\", \"s\".\"balance\")"
        );
    }

    #[test]
    fn not_matched_by_source_rejected_outside_sqlserver() {
        let db = Db::new(Dialect::Postgres);
        let merge = db
            .merge("t")
            .using_table("s", "s")
            .on(|c| c.equals_expr("id", col("id")))
            .when_not_matched_by_source_delete(None);
        let err = merge.to_sql().unwrap_err();
        assert!(matches!(err, QueryError::DialectUnsupportedOperation { .. }));
        let _ = lit(1i64);
    }
}
