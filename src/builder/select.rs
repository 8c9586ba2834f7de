//! The SELECT statement builder: deferred column-selection modes, joins,
//! set operations, row locking, and pagination.

use crate::condition::ConditionBuilder;
use crate::db::Db;
use crate::dialect::{Dialect, SqlDialect};
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, Row};
use crate::expr::{render_order_by, Expr, OrderItem};
use crate::pageable::Pageable;
use crate::token::{Token, TokenStream};
use crate::value::Value;

use super::join::{Join, JoinSource, JoinType, RelationSpec};

/// A `join_relations` spec resolved against a schema: the join itself plus
/// any auto-aliased columns it contributes to the projection.
type ResolvedRelation = (Join, Vec<(Expr, Option<String>)>);

/// The mutually-exclusive base column-selection mode (§4.6). Calling any of
/// these clears the others; the last call wins. `select_expr` accumulates
/// separately and is orthogonal to this mode.
#[derive(Debug, Clone)]
enum BaseMode {
    Default,
    All,
    ModelColumns,
    ModelPrimaryKeys,
    Explicit(Vec<(String, Option<String>)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Distinct {
    None,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOp {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockStrength {
    ForUpdate,
    ForShare,
}

#[derive(Debug, Clone)]
struct Locking {
    strength: LockStrength,
    nowait: bool,
    skip_locked: bool,
    of: Vec<String>,
}

/// A CTE's body: a sub-select, or a literal `VALUES` row set.
#[derive(Debug, Clone)]
enum CteSource {
    Select(Box<Select>),
    Values { columns: Vec<String>, rows: Vec<Vec<Value>> },
}

#[derive(Debug, Clone)]
struct Cte {
    name: String,
    source: CteSource,
    recursive: bool,
}

#[derive(Debug, Clone)]
pub struct Select {
    db: Db,
    table: String,
    alias: Option<String>,
    model_name: Option<String>,
    ctes: Vec<Cte>,
    base_mode: BaseMode,
    distinct_on: Vec<Expr>,
    distinct: Distinct,
    select_exprs: Vec<(Expr, Option<String>)>,
    joins: Vec<Join>,
    relations: Vec<RelationSpec>,
    where_builder: ConditionBuilder,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderItem>,
    limit: Option<u64>,
    offset: Option<u64>,
    set_ops: Vec<(SetOp, Select)>,
    locking: Option<Locking>,
    include_deleted: bool,
}

impl Select {
    pub(crate) fn new(db: Db, table: String) -> Self {
        Self {
            db,
            table,
            alias: None,
            model_name: None,
            ctes: Vec::new(),
            base_mode: BaseMode::Default,
            distinct_on: Vec::new(),
            distinct: Distinct::None,
            select_exprs: Vec::new(),
            joins: Vec::new(),
            relations: Vec::new(),
            where_builder: ConditionBuilder::new(),
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_ops: Vec::new(),
            locking: None,
            include_deleted: false,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Bind this statement to a model schema (via the `Db`'s
    /// `TableSchemaProvider`), enabling `select_model_columns` /
    /// `select_model_primary_keys`.
    pub fn model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    fn schema(&self) -> QueryResult<crate::schema::TableSchema> {
        let name = self.model_name.as_deref().unwrap_or(&self.table);
        self.db.schema_of(name)
    }

    // === Deferred column selection ===

    pub fn select_all(mut self) -> Self {
        self.base_mode = BaseMode::All;
        self
    }

    pub fn select(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.base_mode = BaseMode::Explicit(columns.into_iter().map(|c| (c.into(), None)).collect());
        self
    }

    pub fn select_as(mut self, column: impl Into<String>, alias: impl Into<String>) -> Self {
        let entry = (column.into(), Some(alias.into()));
        match &mut self.base_mode {
            BaseMode::Explicit(cols) => cols.push(entry),
            _ => self.base_mode = BaseMode::Explicit(vec![entry]),
        }
        self
    }

    pub fn select_expr(mut self, expr: Expr, alias: Option<String>) -> Self {
        self.select_exprs.push((expr, alias));
        self
    }

    pub fn select_model_columns(mut self) -> Self {
        self.base_mode = BaseMode::ModelColumns;
        self
    }

    pub fn select_model_primary_keys(mut self) -> Self {
        self.base_mode = BaseMode::ModelPrimaryKeys;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = Distinct::All;
        self
    }

    pub fn distinct_on(mut self, exprs: Vec<Expr>) -> Self {
        self.distinct_on = exprs;
        self
    }

    // === Joins ===

    fn push_join(mut self, join_type: JoinType, source: JoinSource, on: Option<Expr>) -> Self {
        self.joins.push(Join { join_type, source, on });
        self
    }

    pub fn join_table(self, join_type: JoinType, table: impl Into<String>, alias: Option<String>, on: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        let on = on(ConditionBuilder::new()).build();
        self.push_join(join_type, JoinSource::Table { name: table.into(), alias }, on)
    }

    pub fn join_expr(self, join_type: JoinType, expr: Expr, alias: Option<String>, on: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        let on = on(ConditionBuilder::new()).build();
        self.push_join(join_type, JoinSource::Expr { expr, alias }, on)
    }

    pub fn join_subquery(self, join_type: JoinType, subquery: Select, alias: impl Into<String>, on: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        let on = on(ConditionBuilder::new()).build();
        self.push_join(join_type, JoinSource::Subquery { select: Box::new(subquery), alias: alias.into() }, on)
    }

    pub fn cross_join_table(self, table: impl Into<String>, alias: Option<String>) -> Self {
        self.push_join(JoinType::Cross, JoinSource::Table { name: table.into(), alias }, None)
    }

    /// Join by model: table/alias are resolved from the registered schema.
    pub fn join_model(self, join_type: JoinType, model_name: impl Into<String>, alias: Option<String>, on: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        let on = on(ConditionBuilder::new()).build();
        self.push_join(join_type, JoinSource::Model { model_name: model_name.into(), alias }, on)
    }

    /// Higher-level relation joins: foreign/referenced columns and join type
    /// default from the model's schema (`{model-name}_{pk}`, LEFT) when left
    /// unspecified on the spec. Columns named in `select_columns` are added
    /// to the projection as `{model}_{col}`.
    pub fn join_relations(mut self, specs: Vec<RelationSpec>) -> Self {
        self.relations.extend(specs);
        self
    }

    fn resolve_relations(&self) -> QueryResult<Vec<ResolvedRelation>> {
        self.relations
            .iter()
            .map(|spec| {
                let schema = self.db.schema_of(&spec.model_name)?;
                let alias = spec.alias.clone().unwrap_or_else(|| schema.alias.clone());
                let pk = schema
                    .pk_names()
                    .into_iter()
                    .next()
                    .ok_or_else(|| QueryError::InvariantViolated(format!("model {} has no primary key", spec.model_name)))?;
                let foreign_column = spec.foreign_column.clone().unwrap_or_else(|| format!("{}_{}", spec.model_name.to_lowercase(), pk));
                let referenced_column = spec.referenced_column.clone().unwrap_or(pk);

                let fk_eq = Expr::BinaryOp {
                    left: Box::new(crate::expr::col(&foreign_column)),
                    op: crate::expr::BinaryOperator::Eq,
                    right: Box::new(crate::expr::table_col(&alias, &referenced_column)),
                };
                let on = match &spec.extra_on {
                    Some(extra) => Expr::BinaryOp { left: Box::new(fk_eq), op: crate::expr::BinaryOperator::And, right: Box::new(extra.clone()) },
                    None => fk_eq,
                };

                let join = Join {
                    join_type: spec.join_type,
                    source: JoinSource::Model { model_name: spec.model_name.clone(), alias: Some(alias.clone()) },
                    on: Some(on),
                };
                let extra_columns = spec
                    .select_columns
                    .iter()
                    .map(|c| (crate::expr::table_col(&alias, c), Some(format!("{}_{}", spec.model_name, c))))
                    .collect();
                Ok((join, extra_columns))
            })
            .collect()
    }

    // === WHERE / GROUP BY / HAVING ===

    pub fn filter(mut self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        self.where_builder = f(self.where_builder);
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        self.having = f(ConditionBuilder::new()).build();
        self
    }

    // === ORDER / LIMIT / OFFSET / pagination ===

    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn paginate(mut self, pageable: Pageable) -> Self {
        let (offset, limit) = pageable.offset_limit();
        self.offset = Some(offset);
        self.limit = Some(limit);
        for item in pageable.sort {
            self.order_by.push(item);
        }
        self
    }

    // === Set operations ===

    fn set_op(mut self, op: SetOp, other: Select) -> Self {
        self.set_ops.push((op, other));
        self
    }

    pub fn union(self, other: Select) -> Self {
        self.set_op(SetOp::Union, other)
    }
    pub fn union_all(self, other: Select) -> Self {
        self.set_op(SetOp::UnionAll, other)
    }
    pub fn intersect(self, other: Select) -> Self {
        self.set_op(SetOp::Intersect, other)
    }
    pub fn intersect_all(self, other: Select) -> Self {
        self.set_op(SetOp::IntersectAll, other)
    }
    pub fn except(self, other: Select) -> Self {
        self.set_op(SetOp::Except, other)
    }
    pub fn except_all(self, other: Select) -> Self {
        self.set_op(SetOp::ExceptAll, other)
    }

    // === Locking ===

    pub fn for_update(mut self) -> Self {
        self.locking = Some(Locking { strength: LockStrength::ForUpdate, nowait: false, skip_locked: false, of: Vec::new() });
        self
    }

    pub fn for_share(mut self) -> Self {
        self.locking = Some(Locking { strength: LockStrength::ForShare, nowait: false, skip_locked: false, of: Vec::new() });
        self
    }

    pub fn nowait(mut self) -> Self {
        if let Some(l) = &mut self.locking {
            l.nowait = true;
        }
        self
    }

    pub fn skip_locked(mut self) -> Self {
        if let Some(l) = &mut self.locking {
            l.skip_locked = true;
        }
        self
    }

    pub fn lock_of(mut self, tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        if let Some(l) = &mut self.locking {
            l.of = tables.into_iter().map(|t| t.into()).collect();
        }
        self
    }

    // === Soft delete ===

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    // === CTEs ===

    pub fn with(mut self, name: impl Into<String>, select: Select, recursive: bool) -> Self {
        self.ctes.push(Cte { name: name.into(), source: CteSource::Select(Box::new(select)), recursive });
        self
    }

    /// A `VALUES`-backed CTE: `name(columns…) AS (VALUES (row), (row), …)`.
    pub fn with_values(mut self, name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        self.ctes.push(Cte { name: name.into(), source: CteSource::Values { columns, rows }, recursive: false });
        self
    }

    fn soft_delete_predicate(&self) -> Option<Expr> {
        if self.include_deleted {
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

    pub(crate) fn render_tokens(&self, dialect: Dialect, params: &mut Vec<Value>) -> QueryResult<TokenStream> {
        let mut ts = TokenStream::new();

        if !self.ctes.is_empty() {
            ts.push(Token::With).space();
            if self.ctes.iter().any(|c| c.recursive) && dialect.emit_recursive_keyword() {
                ts.push(Token::Recursive).space();
            }
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.push(Token::Ident(cte.name.clone()));
                if let CteSource::Values { columns, .. } = &cte.source {
                    ts.lparen();
                    for (j, col) in columns.iter().enumerate() {
                        if j > 0 {
                            ts.comma().space();
                        }
                        ts.push(Token::Ident(col.clone()));
                    }
                    ts.rparen();
                }
                ts.space().push(Token::As).space().lparen();
                match &cte.source {
                    CteSource::Select(select) => {
                        ts.append(&select.render_tokens(dialect, params)?);
                    }
                    CteSource::Values { rows, .. } => {
                        ts.push(Token::Values).space();
                        for (j, row) in rows.iter().enumerate() {
                            if j > 0 {
                                ts.comma().space();
                            }
                            ts.lparen();
                            for (k, value) in row.iter().enumerate() {
                                if k > 0 {
                                    ts.comma().space();
                                }
                                ts.append(&crate::expr::lit(value.clone()).render(dialect, params)?);
                            }
                            ts.rparen();
                        }
                    }
                }
                ts.rparen();
            }
            ts.space();
        }

        ts.push(Token::Select).space();
        match self.distinct {
            Distinct::All if !self.distinct_on.is_empty() => {
                if !dialect.supports_distinct_on() {
                    return Err(QueryError::DialectUnsupportedOperation { operation: "DISTINCT ON", dialect });
                }
                ts.push(Token::DistinctOn).space().lparen();
                for (i, e) in self.distinct_on.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&e.render(dialect, params)?);
                }
                ts.rparen().space();
            }
            Distinct::All => {
                ts.push(Token::Distinct).space();
            }
            Distinct::None if !self.distinct_on.is_empty() => {
                if !dialect.supports_distinct_on() {
                    return Err(QueryError::DialectUnsupportedOperation { operation: "DISTINCT ON", dialect });
                }
                ts.push(Token::DistinctOn).space().lparen();
                for (i, e) in self.distinct_on.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&e.render(dialect, params)?);
                }
                ts.rparen().space();
            }
            Distinct::None => {}
        }

        let resolved_relations = self.resolve_relations()?;
        let relation_columns: Vec<(Expr, Option<String>)> = resolved_relations.iter().flat_map(|(_, cols)| cols.clone()).collect();

        ts.append(&self.render_select_list(dialect, params, &relation_columns)?);
        ts.space().push(Token::From).space().push(Token::Ident(self.table.clone()));
        if let Some(alias) = &self.alias {
            ts.space().push(Token::As).space().push(Token::Ident(alias.clone()));
        }

        let all_joins = self.joins.iter().chain(resolved_relations.iter().map(|(j, _)| j));
        for join in all_joins {
            ts.space();
            for t in join.join_type.tokens() {
                ts.push(t);
            }
            ts.space();
            match &join.source {
                JoinSource::Table { name, alias } => {
                    ts.push(Token::Ident(name.clone()));
                    if let Some(a) = alias {
                        ts.space().push(Token::As).space().push(Token::Ident(a.clone()));
                    }
                }
                JoinSource::Expr { expr, alias } => {
                    ts.append(&expr.render(dialect, params)?);
                    if let Some(a) = alias {
                        ts.space().push(Token::As).space().push(Token::Ident(a.clone()));
                    }
                }
                JoinSource::Subquery { select, alias } => {
                    ts.lparen();
                    ts.append(&select.render_tokens(dialect, params)?);
                    ts.rparen().space().push(Token::As).space().push(Token::Ident(alias.clone()));
                }
                JoinSource::Model { model_name, alias } => {
                    let schema = self.db.schema_of(model_name)?;
                    let resolved_alias = alias.clone().unwrap_or_else(|| schema.alias.clone());
                    ts.push(Token::Ident(schema.name.clone()));
                    ts.space().push(Token::As).space().push(Token::Ident(resolved_alias));
                }
            }
            if let Some(on) = &join.on {
                ts.space().push(Token::On).space();
                ts.append(&on.render(dialect, params)?);
            }
        }

        if let Some(where_expr) = self.effective_where() {
            ts.space().push(Token::Where).space();
            ts.append(&where_expr.render(dialect, params)?);
        }

        if !self.group_by.is_empty() {
            ts.space().push(Token::GroupBy).space();
            for (i, e) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&e.render(dialect, params)?);
            }
        }

        if let Some(having) = &self.having {
            ts.space().push(Token::Having).space();
            ts.append(&having.render(dialect, params)?);
        }

        for (op, other) in &self.set_ops {
            ts.space();
            ts.push(match op {
                SetOp::Union => Token::Union,
                SetOp::UnionAll => Token::Union,
                SetOp::Intersect => Token::Intersect,
                SetOp::IntersectAll => Token::Intersect,
                SetOp::Except => Token::Except,
                SetOp::ExceptAll => Token::Except,
            });
            if matches!(op, SetOp::UnionAll | SetOp::IntersectAll | SetOp::ExceptAll) {
                ts.space().push(Token::All);
            }
            ts.space();
            ts.append(&other.render_tokens(dialect, params)?);
        }

        if !self.order_by.is_empty() {
            ts.space();
            ts.append(&render_order_by(&self.order_by, dialect, params)?);
        }

        if self.limit.is_some() || self.offset.is_some() {
            if dialect.requires_order_by_for_offset() && self.order_by.is_empty() {
                return Err(QueryError::OrderMissingColumnOrExpression);
            }
            ts.space();
            ts.append(&dialect.emit_limit_offset(self.limit, self.offset));
        }

        if let Some(locking) = &self.locking {
            if !dialect.supports_row_locking() {
                return Err(QueryError::DialectUnsupportedOperation { operation: "row locking", dialect });
            }
            ts.space();
            ts.push(match locking.strength {
                LockStrength::ForUpdate => Token::ForUpdate,
                LockStrength::ForShare => Token::ForShare,
            });
            if !locking.of.is_empty() {
                ts.space().push(Token::Of).space();
                for (i, t) in locking.of.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.push(Token::Ident(t.clone()));
                }
            }
            if locking.nowait {
                ts.space().push(Token::NoWait);
            } else if locking.skip_locked {
                if !dialect.supports_skip_locked() {
                    return Err(QueryError::DialectUnsupportedOperation { operation: "SKIP LOCKED", dialect });
                }
                ts.space().push(Token::SkipLocked);
            }
        }

        Ok(ts)
    }

    fn render_select_list(&self, dialect: Dialect, params: &mut Vec<Value>, relation_columns: &[(Expr, Option<String>)]) -> QueryResult<TokenStream> {
        let mut parts = Vec::new();
        match &self.base_mode {
            BaseMode::Default | BaseMode::All => {
                let mut t = TokenStream::new();
                t.push(Token::Star);
                parts.push(t);
            }
            BaseMode::ModelColumns => {
                for col in self.schema()?.column_names() {
                    let mut t = TokenStream::new();
                    t.push(Token::Ident(col));
                    parts.push(t);
                }
            }
            BaseMode::ModelPrimaryKeys => {
                for col in self.schema()?.pk_names() {
                    let mut t = TokenStream::new();
                    t.push(Token::Ident(col));
                    parts.push(t);
                }
            }
            BaseMode::Explicit(cols) => {
                for (name, alias) in cols {
                    let mut t = TokenStream::new();
                    t.push(Token::Ident(name.clone()));
                    if let Some(a) = alias {
                        t.space().push(Token::As).space().push(Token::Ident(a.clone()));
                    }
                    parts.push(t);
                }
            }
        }
        for (expr, alias) in self.select_exprs.iter().chain(relation_columns) {
            let mut t = expr.render(dialect, params)?;
            if let Some(a) = alias {
                t.space().push(Token::As).space().push(Token::Ident(a.clone()));
            }
            parts.push(t);
        }
        Ok(TokenStream::join_comma(parts))
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub fn to_sql(&self) -> QueryResult<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let dialect = self.db.dialect();
        let ts = self.render_tokens(dialect, &mut params)?;
        let sql = ts.serialize(dialect);
        tracing::debug!(param_count = params.len(), "select rendered");
        Ok((sql, params))
    }

    pub fn rows(&self, executor: &dyn Executor) -> QueryResult<Vec<Row>> {
        let (sql, params) = self.to_sql()?;
        executor.rows(&sql, &params)
    }

    pub fn scan(&self, executor: &dyn Executor) -> QueryResult<Option<Row>> {
        let (sql, params) = self.to_sql()?;
        executor.scan(&sql, &params)
    }

    pub fn count(&self, executor: &dyn Executor) -> QueryResult<i64> {
        let mut count_select = self.clone();
        count_select.base_mode = BaseMode::Default;
        count_select.select_exprs = vec![(crate::aggregate::count_star().into_expr(self.db.dialect())?, None)];
        count_select.order_by.clear();
        count_select.limit = None;
        count_select.offset = None;
        let (sql, params) = count_select.to_sql()?;
        executor.count(&sql, &params)
    }

    pub fn exists(&self, executor: &dyn Executor) -> QueryResult<bool> {
        let (sql, params) = self.to_sql()?;
        let wrapped = format!("SELECT EXISTS({})", sql);
        executor.exists(&wrapped, &params)
    }

    pub fn scan_and_count(&self, executor: &dyn Executor) -> QueryResult<(Vec<Row>, i64)> {
        let (sql, params) = self.to_sql()?;
        let mut count_select = self.clone();
        count_select.base_mode = BaseMode::Default;
        count_select.select_exprs = vec![(crate::aggregate::count_star().into_expr(self.db.dialect())?, None)];
        count_select.order_by.clear();
        count_select.limit = None;
        count_select.offset = None;
        let (count_sql, count_params) = count_select.to_sql()?;
        executor.scan_and_count(&sql, &params, &count_sql, &count_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn db() -> Db {
        Db::new(Dialect::Postgres)
    }

    #[test]
    fn select_mode_exclusivity_and_expr_additivity() {
        let schema = crate::schema::TableSchema::new(
            "users",
            "users",
            vec![crate::schema::Field::new("id").pk(), crate::schema::Field::new("name"), crate::schema::Field::new("email")],
        );
        let provider = crate::schema::StaticSchemaProvider::new().register(schema);
        let db = db().with_schema_provider(provider);
        let select = db
            .select("users")
            .select_all()
            .select_expr(crate::window::row_number().build(), Some("rn".into()))
            .select_model_columns();
        let (sql, _) = select.to_sql().unwrap();
        assert_eq!(sql, "SELECT \"id\", \"name\", \"email\", ROW_NUMBER() OVER () AS \"rn\" FROM \"users\"");
    }

    #[test]
    fn select_all_idempotent() {
        let db = db();
        let once = db.select("t").select_all();
        let thrice = db.select("t").select_all().select_all().select_all();
        assert_eq!(once.to_sql().unwrap(), thrice.to_sql().unwrap());
    }

    #[test]
    fn soft_delete_default_predicate() {
        let db = Db::new(Dialect::Postgres).with_auto_columns(crate::autocolumn::AutoColumnRegistry::with_defaults().with_soft_delete("deleted_at"));
        let (sql, _) = db.select("posts").to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM \"posts\" WHERE \"deleted_at\" IS NULL");
        let (sql, _) = db.select("posts").include_deleted().to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM \"posts\"");
    }

    #[test]
    fn empty_in_returns_constant_false() {
        let db = db();
        let (sql, params) = db.select("t").filter(|c| c.in_list("age", Vec::<i64>::new())).to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM \"t\" WHERE 1 = 0");
        assert!(params.is_empty());
    }

    fn users_and_posts_db() -> Db {
        let users = crate::schema::TableSchema::new("users", "User", vec![crate::schema::Field::new("id").pk(), crate::schema::Field::new("name")]);
        let provider = crate::schema::StaticSchemaProvider::new().register(users);
        db().with_schema_provider(provider)
    }

    #[test]
    fn join_model_resolves_table_and_alias_from_schema() {
        let db = users_and_posts_db();
        let select = db.select("posts").join_model(JoinType::Left, "User", None, |c| c.equals_expr("user_id", crate::expr::table_col("users", "id")));
        let (sql, _) = select.to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM \"posts\" LEFT JOIN \"users\" AS \"users\" ON \"user_id\" = \"users\".\"id\"");
    }

    #[test]
    fn join_relations_defaults_foreign_column_and_join_type() {
        let db = users_and_posts_db();
        let select = db.select("posts").join_relations(vec![super::RelationSpec::new("User")]);
        let (sql, _) = select.to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM \"posts\" LEFT JOIN \"users\" AS \"users\" ON \"user_id\" = \"users\".\"id\"");
    }

    #[test]
    fn join_relations_selected_columns_are_auto_aliased() {
        let db = users_and_posts_db();
        let select = db
            .select("posts")
            .select(["id"])
            .join_relations(vec![super::RelationSpec::new("User").select_columns(vec!["name".to_string()])]);
        let (sql, _) = select.to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT \"id\", \"users\".\"name\" AS \"User_name\" FROM \"posts\" LEFT JOIN \"users\" AS \"users\" ON \"user_id\" = \"users\".\"id\""
        );
    }

    #[test]
    fn with_values_cte_renders_literal_rows() {
        let db = db();
        let select = db
            .select("t")
            .with_values("v".to_string(), vec!["a".to_string(), "b".to_string()], vec![vec![Value::Int(1), Value::Int(2)]]);
        let (sql, params) = select.to_sql().unwrap();
        assert_eq!(sql, "WITH \"v\"(\"a\", \"b\") AS (VALUES ($1, $2)) SELECT * FROM \"t\"");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }
}
