//! `ON CONFLICT` / `ON DUPLICATE KEY UPDATE` two-stage builder.

use crate::condition::ConditionBuilder;
use crate::dialect::Dialect;
use crate::expr::Expr;
use crate::token::{Token, TokenStream};
use crate::value::Value;

/// The conflict target: either an explicit column list (with an optional
/// partial-index predicate) or a named constraint.
#[derive(Debug, Clone, Default)]
pub enum ConflictTarget {
    #[default]
    None,
    Columns(Vec<String>, Option<Expr>),
    Constraint(String),
}

#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate { assignments: Vec<(String, Expr)>, predicate: Option<Expr> },
}

/// Built via [`OnConflict::do_nothing`] / [`OnConflict::do_update`].
#[derive(Debug, Clone)]
#[must_use]
pub struct OnConflict {
    pub target: ConflictTarget,
    pub action: ConflictAction,
}

impl OnConflict {
    pub fn target_columns(columns: impl IntoIterator<Item = impl Into<String>>) -> ConflictBuilder {
        ConflictBuilder { target: ConflictTarget::Columns(columns.into_iter().map(|c| c.into()).collect(), None) }
    }

    /// A conflict target matching a Postgres partial unique index: the
    /// column list plus the index's own predicate.
    pub fn target_columns_where(
        columns: impl IntoIterator<Item = impl Into<String>>,
        predicate: impl FnOnce(ConditionBuilder) -> ConditionBuilder,
    ) -> ConflictBuilder {
        let predicate = predicate(ConditionBuilder::new()).build();
        ConflictBuilder { target: ConflictTarget::Columns(columns.into_iter().map(|c| c.into()).collect(), predicate) }
    }

    pub fn target_constraint(name: impl Into<String>) -> ConflictBuilder {
        ConflictBuilder { target: ConflictTarget::Constraint(name.into()) }
    }

    pub fn no_target() -> ConflictBuilder {
        ConflictBuilder { target: ConflictTarget::None }
    }
}

#[must_use]
pub struct ConflictBuilder {
    target: ConflictTarget,
}

impl ConflictBuilder {
    pub fn do_nothing(self) -> OnConflict {
        OnConflict { target: self.target, action: ConflictAction::DoNothing }
    }

    pub fn do_update(self, f: impl FnOnce(DoUpdateBuilder) -> DoUpdateBuilder) -> OnConflict {
        let built = f(DoUpdateBuilder::default());
        OnConflict {
            target: self.target,
            action: ConflictAction::DoUpdate { assignments: built.assignments, predicate: built.predicate },
        }
    }
}

#[derive(Default)]
#[must_use]
pub struct DoUpdateBuilder {
    assignments: Vec<(String, Expr)>,
    predicate: Option<Expr>,
}

impl DoUpdateBuilder {
    /// Set `column` from the attempted row's own value (`EXCLUDED.column`
    /// on Postgres/SQLite, `column` itself under MySQL's
    /// `ON DUPLICATE KEY UPDATE`).
    pub fn set_excluded(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.assignments.push((column.clone(), Expr::Column { qualifier: Some("excluded".into()), name: column }));
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), crate::expr::lit(value.into())));
        self
    }

    pub fn set_expr(mut self, column: impl Into<String>, expr: Expr) -> Self {
        self.assignments.push((column.into(), expr));
        self
    }

    pub fn predicate(mut self, cond: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        self.predicate = cond(ConditionBuilder::new()).build();
        self
    }
}

impl OnConflict {
    /// Render `ON CONFLICT ...` (Postgres/SQLite) or `ON DUPLICATE KEY
    /// UPDATE ...` / `INSERT IGNORE` hint (MySQL). Falls back to `DO
    /// NOTHING` with a warning when a target is required but missing
    /// (Postgres `DO UPDATE` with no conflict target would otherwise be a
    /// syntax error).
    ///
    /// Dispatched per dialect through `DialectDispatcher`: each arm renders
    /// into its own parameter buffer (the dispatcher's closures can't borrow
    /// the caller's `&mut Vec<Value>`), and the chosen arm's params are
    /// folded into `params` afterwards.
    pub fn render(&self, dialect: Dialect, params: &mut Vec<Value>) -> crate::error::QueryResult<TokenStream> {
        let target = self.target.clone();
        let action = self.action.clone();
        let standard = {
            let target = target.clone();
            let action = action.clone();
            move || Self::render_standard(dialect, &target, &action)
        };
        let (ts, extra_params) = crate::strategy::DialectDispatcher::new()
            .postgres(standard.clone())
            .sqlite(standard)
            .mysql(move || Self::render_mysql(dialect, &action))
            .default_arm(move || Err(crate::error::QueryError::DialectUnsupportedOperation { operation: "ON CONFLICT", dialect }))
            .dispatch(dialect)??;
        params.extend(extra_params);
        Ok(ts)
    }

    fn render_standard(dialect: Dialect, target: &ConflictTarget, action: &ConflictAction) -> crate::error::QueryResult<(TokenStream, Vec<Value>)> {
        let mut params = Vec::new();
        let mut ts = TokenStream::new();
        ts.push(Token::On).space().push(Token::Conflict).space();
        match target {
            ConflictTarget::Columns(cols, predicate) => {
                ts.lparen();
                for (i, c) in cols.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(c.clone()));
                }
                ts.rparen().space();
                if let Some(pred) = predicate {
                    ts.push(Token::Where).space();
                    ts.append(&pred.render(dialect, &mut params)?);
                    ts.space();
                }
            }
            ConflictTarget::Constraint(name) => {
                ts.push(Token::Raw("ON CONSTRAINT".into())).space().push(Token::Ident(name.clone())).space();
            }
            ConflictTarget::None => {}
        }
        ts.push(Token::Do).space();
        match action {
            ConflictAction::DoNothing => {
                ts.push(Token::Nothing);
            }
            ConflictAction::DoUpdate { assignments, predicate } => {
                if matches!(target, ConflictTarget::None) {
                    tracing::warn!("ON CONFLICT DO UPDATE requested with no conflict target; falling back to DO NOTHING");
                    let mut ts = TokenStream::new();
                    ts.push(Token::On).space().push(Token::Conflict).space().push(Token::Do).space().push(Token::Nothing);
                    return Ok((ts, Vec::new()));
                }
                ts.push(Token::Update).space().push(Token::Set).space();
                for (i, (col, expr)) in assignments.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(col.clone())).space().push(Token::Eq).space();
                    ts.append(&expr.render(dialect, &mut params)?);
                }
                if let Some(pred) = predicate {
                    ts.space().push(Token::Where).space();
                    ts.append(&pred.render(dialect, &mut params)?);
                }
            }
        }
        Ok((ts, params))
    }

    fn render_mysql(dialect: Dialect, action: &ConflictAction) -> crate::error::QueryResult<(TokenStream, Vec<Value>)> {
        let mut params = Vec::new();
        let mut ts = TokenStream::new();
        match action {
            ConflictAction::DoNothing => {
                ts.push(Token::Raw("/* INSERT IGNORE */".into()));
            }
            ConflictAction::DoUpdate { assignments, .. } => {
                ts.push(Token::Raw("ON DUPLICATE KEY UPDATE".into())).space();
                for (i, (col, expr)) in assignments.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(col.clone())).space().push(Token::Eq).space();
                    match expr {
                        Expr::Column { qualifier: Some(q), name } if q == "excluded" => {
                            ts.push(Token::FunctionName("VALUES".into())).lparen().push(Token::Ident(name.clone())).rparen();
                        }
                        other => {
                            ts.append(&other.render(dialect, &mut params)?);
                        }
                    }
                }
            }
        }
        Ok((ts, params))
    }

    /// MySQL renders do-nothing conflicts as an `INSERT IGNORE` hint instead
    /// of a trailing clause; the INSERT builder checks this to pick the
    /// right keyword up front.
    pub fn is_mysql_insert_ignore(&self, dialect: Dialect) -> bool {
        dialect == Dialect::MySql && matches!(self.action, ConflictAction::DoNothing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_index_predicate_renders_between_target_and_do() {
        let on_conflict = OnConflict::target_columns_where(["email"], |c| c.is_null("deleted_at")).do_update(|u| u.set("name", "updated"));
        let mut params = Vec::new();
        let ts = on_conflict.render(Dialect::Postgres, &mut params).unwrap();
        assert_eq!(
            ts.serialize(Dialect::Postgres),
            "ON CONFLICT (\"email\") WHERE \"deleted_at\" IS NULL DO UPDATE SET \"name\" = $1"
        );
    }
}
