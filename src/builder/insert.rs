//! The INSERT statement builder: row/sub-select value sources, per-column
//! overrides, conflict handling, and RETURNING.

use std::collections::{BTreeMap, BTreeSet};

use crate::autocolumn::HookContext;
use crate::db::Db;
use crate::dialect::SqlDialect;
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, Row};
use crate::expr::{lit, Expr};
use crate::token::{Token, TokenStream};
use crate::value::Value;

use super::conflict::OnConflict;
use super::select::Select;

#[derive(Debug, Clone, Default)]
enum ColumnMode {
    #[default]
    All,
    Select(Vec<String>),
    Exclude(Vec<String>),
}

#[derive(Debug, Clone, Default)]
enum ReturningSpec {
    #[default]
    None,
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, Default)]
enum ValueSource {
    #[default]
    Empty,
    Rows(Vec<BTreeMap<String, Value>>),
    FromSelect(Box<Select>, Vec<String>),
}

#[derive(Debug, Clone)]
#[must_use]
pub struct Insert {
    db: Db,
    table: String,
    model_name: Option<String>,
    source: ValueSource,
    column_mode: ColumnMode,
    overrides: Vec<(String, Expr)>,
    on_conflict: Option<OnConflict>,
    returning: ReturningSpec,
}

impl Insert {
    pub(crate) fn new(db: Db, table: String) -> Self {
        Self {
            db,
            table,
            model_name: None,
            source: ValueSource::Empty,
            column_mode: ColumnMode::default(),
            overrides: Vec::new(),
            on_conflict: None,
            returning: ReturningSpec::None,
        }
    }

    pub fn model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Insert a single row. Column values are whatever the caller materialised
    /// from their model; this crate never reflects over struct fields.
    pub fn row(mut self, values: BTreeMap<String, Value>) -> Self {
        match &mut self.source {
            ValueSource::Rows(rows) => rows.push(values),
            _ => self.source = ValueSource::Rows(vec![values]),
        }
        self
    }

    pub fn rows(mut self, values: Vec<BTreeMap<String, Value>>) -> Self {
        self.source = ValueSource::Rows(values);
        self
    }

    /// `INSERT INTO table (columns) SELECT ...`.
    pub fn from_select(mut self, columns: impl IntoIterator<Item = impl Into<String>>, select: Select) -> Self {
        self.source = ValueSource::FromSelect(Box::new(select), columns.into_iter().map(|c| c.into()).collect());
        self
    }

    pub fn select_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.column_mode = ColumnMode::Select(columns.into_iter().map(|c| c.into()).collect());
        self
    }

    pub fn exclude_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.column_mode = ColumnMode::Exclude(columns.into_iter().map(|c| c.into()).collect());
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((column.into(), lit(value.into())));
        self
    }

    pub fn set_expr(mut self, column: impl Into<String>, expr: Expr) -> Self {
        self.overrides.push((column.into(), expr));
        self
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
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

    pub fn returning_none(mut self) -> Self {
        self.returning = ReturningSpec::None;
        self
    }

    fn apply_column_mode(&self, columns: BTreeSet<String>) -> Vec<String> {
        match &self.column_mode {
            ColumnMode::All => columns.into_iter().collect(),
            ColumnMode::Select(cols) => cols.clone(),
            ColumnMode::Exclude(excluded) => columns.into_iter().filter(|c| !excluded.contains(c)).collect(),
        }
    }

    fn fire_auto_columns(&self, rows: &mut [BTreeMap<String, Value>]) {
        let name = self.model_name.as_deref().unwrap_or(&self.table);
        let Ok(schema) = self.db.schema_of(name) else {
            return;
        };
        for row in rows.iter_mut() {
            let existing: std::collections::HashMap<String, Value> =
                row.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let ctx = HookContext {
                schema: &schema,
                operator: self.db.operator(),
                clock: self.db.clock(),
                id_generator: self.db.id_generator(),
                existing: &existing,
            };
            let mut assignments = std::collections::HashMap::new();
            self.db.auto_columns().apply_insert(&ctx, &mut assignments);
            for (col, value) in assignments {
                row.entry(col).or_insert(value);
            }
        }
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub fn to_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        let dialect = self.db.dialect();
        let mut params = Vec::new();
        let mut ts = TokenStream::new();

        ts.push(Token::Insert).space();
        let mysql_ignore = self.on_conflict.as_ref().is_some_and(|c| c.is_mysql_insert_ignore(dialect));
        if mysql_ignore {
            ts.push(Token::Raw("IGNORE".into())).space();
        }
        ts.push(Token::Into).space().push(Token::Ident(self.table.clone()));

        match &self.source {
            ValueSource::Empty => {
                return Err(QueryError::InvariantViolated("insert has no row or select source".into()));
            }
            ValueSource::Rows(rows) => {
                let mut rows = rows.clone();
                self.fire_auto_columns(&mut rows);

                let mut columns: BTreeSet<String> = BTreeSet::new();
                for row in &rows {
                    columns.extend(row.keys().cloned());
                }
                for (col, _) in &self.overrides {
                    columns.insert(col.clone());
                }
                let columns = self.apply_column_mode(columns);
                if columns.is_empty() {
                    return Err(QueryError::InvariantViolated("insert has no columns to set".into()));
                }

                ts.space().lparen();
                for (i, c) in columns.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(c.clone()));
                }
                ts.rparen().space().push(Token::Values).space();

                for (ri, row) in rows.iter().enumerate() {
                    if ri > 0 {
                        ts.comma().space();
                    }
                    ts.lparen();
                    for (ci, col) in columns.iter().enumerate() {
                        if ci > 0 {
                            ts.comma().space();
                        }
                        if let Some((_, expr)) = self.overrides.iter().find(|(c, _)| c == col) {
                            ts.append(&expr.render(dialect, &mut params)?);
                        } else {
                            let value = row.get(col).cloned().unwrap_or(Value::Null);
                            ts.append(&lit(value).render(dialect, &mut params)?);
                        }
                    }
                    ts.rparen();
                }
            }
            ValueSource::FromSelect(select, columns) => {
                let columns = self.apply_column_mode(columns.iter().cloned().collect());
                ts.space().lparen();
                for (i, c) in columns.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(c.clone()));
                }
                ts.rparen().space();
                ts.append(&select.render_tokens(dialect, &mut params)?);
            }
        }

        if let Some(on_conflict) = &self.on_conflict {
            if !mysql_ignore {
                ts.space();
                ts.append(&on_conflict.render(dialect, &mut params)?);
            }
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
        tracing::debug!(param_count = params.len(), "insert rendered");
        Ok((sql, params))
    }

    pub fn exec(&self, executor: &dyn Executor) -> QueryResult<u64> {
        let (sql, params) = self.to_sql()?;
        executor.exec(&sql, &params)
    }

    pub fn returning_rows(&self, executor: &dyn Executor) -> QueryResult<Vec<Row>> {
        let (sql, params) = self.to_sql()?;
        executor.rows(&sql, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn row(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn single_row_insert_with_returning() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let insert = db
            .insert("users")
            .row(row(&[("name", Value::Text("alice".into())), ("age", Value::Int(30))]))
            .returning(["id"]);
        let (sql, params) = insert.to_sql().unwrap();
        assert_eq!(sql, "INSERT INTO \"users\" (\"age\", \"name\") VALUES ($1, $2) RETURNING \"id\"");
        assert_eq!(params, vec![Value::Int(30), Value::Text("alice".into())]);
    }

    #[test]
    fn on_conflict_do_nothing_mysql_uses_insert_ignore() {
        let db = Db::new(Dialect::MySql).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let insert = db
            .insert("users")
            .row(row(&[("email", Value::Text("a@b.com".into()))]))
            .on_conflict(super::super::conflict::OnConflict::target_columns(["email"]).do_nothing());
        let (sql, _) = insert.to_sql().unwrap();
        assert_eq!(sql, "INSERT IGNORE INTO `users` (`email`) VALUES (?)");
    }

    #[test]
    fn multi_row_insert_shares_column_list() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::new());
        let insert = db.insert("t").rows(vec![
            row(&[("a", Value::Int(1)), ("b", Value::Int(2))]),
            row(&[("a", Value::Int(3)), ("b", Value::Int(4))]),
        ]);
        let (sql, params) = insert.to_sql().unwrap();
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, $2), ($3, $4)");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]);
    }
}
