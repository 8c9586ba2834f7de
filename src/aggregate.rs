//! Aggregate functions: a common base plus composable capabilities
//! (`Distinctable`, `Orderable`, `NullHandling`, `Statistical`), each
//! rendering through a per-dialect [`DialectStrategy`].

use crate::dialect::{Dialect, SqlDialect};
use crate::error::{QueryError, QueryResult};
use crate::expr::{Expr, OrderItem};

fn dialect_index(dialect: Dialect) -> usize {
    match dialect {
        Dialect::Postgres => 0,
        Dialect::MySql => 1,
        Dialect::Sqlite => 2,
        Dialect::Oracle => 3,
        Dialect::SqlServer => 4,
    }
}

/// Whether NULLs participate in an ordered aggregate (`ARRAY_AGG`-family).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullMode {
    #[default]
    Respect,
    Ignore,
}

/// Population vs sample variant for `STDDEV`/`VARIANCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Statistical {
    #[default]
    Population,
    Sample,
}

/// Mutable render-time state an `args_transform` hook may rewrite.
#[derive(Debug, Clone)]
pub struct AggregateState {
    pub function_name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub order_by: Vec<OrderItem>,
    pub separator: Option<String>,
    pub nulls: NullMode,
    pub statistical: Statistical,
}

/// One dialect's rendering rules for an aggregate.
#[derive(Clone, Default)]
pub struct DialectConfig {
    pub function_name: Option<&'static str>,
    pub transform: Option<fn(&mut AggregateState)>,
    pub clear_distinct: bool,
    pub clear_order: bool,
    pub clear_nulls: bool,
}

impl DialectConfig {
    pub fn name(name: &'static str) -> Self {
        Self { function_name: Some(name), ..Default::default() }
    }

    pub fn transform(f: fn(&mut AggregateState)) -> Self {
        Self { transform: Some(f), ..Default::default() }
    }

    pub fn with_transform(mut self, f: fn(&mut AggregateState)) -> Self {
        self.transform = Some(f);
        self
    }

    pub fn clear_distinct(mut self) -> Self {
        self.clear_distinct = true;
        self
    }

    pub fn clear_order(mut self) -> Self {
        self.clear_order = true;
        self
    }

    pub fn clear_nulls(mut self) -> Self {
        self.clear_nulls = true;
        self
    }

    pub fn function_name(mut self, name: &'static str) -> Self {
        self.function_name = Some(name);
        self
    }
}

/// Up to five optional [`DialectConfig`] entries, one per dialect.
#[derive(Clone, Default)]
pub struct DialectStrategy {
    entries: [Option<DialectConfig>; 5],
}

impl DialectStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, dialect: Dialect, config: DialectConfig) -> Self {
        self.entries[dialect_index(dialect)] = Some(config);
        self
    }

    fn get(&self, dialect: Dialect) -> Option<&DialectConfig> {
        self.entries[dialect_index(dialect)].as_ref()
    }
}

/// Shared base of every concrete aggregate. Built by the constructors in
/// this module (`count()`, `sum()`, `string_agg()`, ...) and consumed by
/// [`Aggregate::into_expr`].
#[derive(Clone)]
#[must_use]
pub struct Aggregate {
    name: &'static str,
    args: Vec<Expr>,
    distinct: bool,
    filter: Option<Expr>,
    order_by: Vec<OrderItem>,
    separator: Option<String>,
    nulls: NullMode,
    statistical: Statistical,
    strategy: DialectStrategy,
    /// Native on Postgres/MySQL/SQLite with no strategy entry needed; a
    /// missing entry for dialects beyond those three still errors.
    native: bool,
}

impl Aggregate {
    fn new(name: &'static str, args: Vec<Expr>, strategy: DialectStrategy, native: bool) -> Self {
        Self {
            name,
            args,
            distinct: false,
            filter: None,
            order_by: Vec::new(),
            separator: None,
            nulls: NullMode::default(),
            statistical: Statistical::default(),
            strategy,
            native,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn filter(mut self, cond: Expr) -> Self {
        self.filter = Some(cond);
        self
    }

    pub fn order_by(mut self, item: OrderItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.separator = Some(sep.into());
        self
    }

    pub fn ignore_nulls(mut self) -> Self {
        self.nulls = NullMode::Ignore;
        self
    }

    pub fn respect_nulls(mut self) -> Self {
        self.nulls = NullMode::Respect;
        self
    }

    pub fn population(mut self) -> Self {
        self.statistical = Statistical::Population;
        self
    }

    pub fn sample(mut self) -> Self {
        self.statistical = Statistical::Sample;
        self
    }

    /// Apply the dialect strategy and render to an [`Expr`] embeddable in a
    /// select list or `HAVING` clause.
    pub fn into_expr(self, dialect: Dialect) -> QueryResult<Expr> {
        if self.args.is_empty() && self.name != "COUNT" {
            return Err(QueryError::AggregateMissingArgs(self.name));
        }
        let mut state = AggregateState {
            function_name: self.name.to_string(),
            args: self.args,
            distinct: self.distinct,
            order_by: self.order_by,
            separator: self.separator.clone(),
            nulls: self.nulls,
            statistical: self.statistical,
        };
        match self.strategy.get(dialect) {
            Some(config) => {
                if let Some(name) = config.function_name {
                    state.function_name = name.to_string();
                }
                if let Some(transform) = config.transform {
                    transform(&mut state);
                }
                if config.clear_distinct {
                    state.distinct = false;
                }
                if config.clear_order {
                    state.order_by.clear();
                }
                if config.clear_nulls {
                    state.nulls = NullMode::Respect;
                }
            }
            None if !self.native => {
                return Err(QueryError::DialectUnsupportedOperation { operation: self.name, dialect });
            }
            None => {}
        }

        let mut args = state.args;
        if let Some(sep) = &state.separator {
            args.push(crate::expr::lit(sep.clone()));
        }

        let filter_supported = dialect.supports_aggregate_filter();
        let filter = self.filter;

        if let Some(cond) = filter.clone() {
            if !filter_supported {
                return Ok(rewrite_filter_as_case(&state.function_name, args, cond));
            }
        }

        Ok(Expr::AggregateCall {
            name: state.function_name,
            args,
            distinct: state.distinct,
            order_by: state.order_by,
            filter: filter.map(Box::new),
        })
    }
}

/// FILTER-clause portability fallback (§4.4): rewrite `FN(args) FILTER
/// (WHERE cond)` into a CASE-guarded call on dialects without `FILTER`.
fn rewrite_filter_as_case(function_name: &str, args: Vec<Expr>, cond: Expr) -> Expr {
    use crate::expr::CaseExpr;
    match function_name {
        "COUNT" => {
            let case = CaseExpr::searched().when(cond, Expr::Raw("1".into())).otherwise(Expr::Raw("0".into())).build();
            Expr::Function { name: "SUM".into(), args: vec![case], distinct: false }
        }
        "SUM" => {
            let arg = args.into_iter().next().unwrap_or(Expr::Raw("0".into()));
            let case = CaseExpr::searched().when(cond, arg).otherwise(Expr::Raw("0".into())).build();
            Expr::Function { name: "SUM".into(), args: vec![case], distinct: false }
        }
        other => {
            let arg = args.into_iter().next().unwrap_or(Expr::Raw("NULL".into()));
            let case = CaseExpr::searched().when(cond, arg).build();
            Expr::Function { name: other.to_string(), args: vec![case], distinct: false }
        }
    }
}

// === Constructors ===

pub fn count(arg: Expr) -> Aggregate {
    Aggregate::new("COUNT", vec![arg], DialectStrategy::new(), true)
}

pub fn count_star() -> Aggregate {
    Aggregate::new("COUNT", vec![crate::expr::star()], DialectStrategy::new(), true)
}

pub fn sum(arg: Expr) -> Aggregate {
    Aggregate::new("SUM", vec![arg], DialectStrategy::new(), true)
}

pub fn avg(arg: Expr) -> Aggregate {
    Aggregate::new("AVG", vec![arg], DialectStrategy::new(), true)
}

pub fn min(arg: Expr) -> Aggregate {
    Aggregate::new("MIN", vec![arg], DialectStrategy::new(), true)
}

pub fn max(arg: Expr) -> Aggregate {
    Aggregate::new("MAX", vec![arg], DialectStrategy::new(), true)
}

/// `STRING_AGG` (Postgres) / `GROUP_CONCAT` (MySQL, SQLite). SQLite forbids
/// a separator alongside `DISTINCT`; the transform drops it there.
pub fn string_agg(arg: Expr) -> Aggregate {
    fn sqlite_distinct_drops_separator(state: &mut AggregateState) {
        if state.distinct {
            state.separator = None;
        }
    }
    let strategy = DialectStrategy::new()
        .on(Dialect::MySql, DialectConfig::name("GROUP_CONCAT").clear_nulls())
        .on(Dialect::Sqlite, DialectConfig::name("GROUP_CONCAT").with_transform(sqlite_distinct_drops_separator));
    Aggregate::new("STRING_AGG", vec![arg], strategy, true)
}

/// `ARRAY_AGG` (Postgres) with `JSON_ARRAYAGG`/`JSON_GROUP_ARRAY` simulation
/// elsewhere. Ignore-nulls is realised as a `CASE WHEN x IS NOT NULL` guard
/// the caller composes on the argument before calling this constructor on
/// dialects that need it; here the transform only clears flags the
/// simulated function cannot honour.
pub fn array_agg(arg: Expr) -> Aggregate {
    fn simulate(state: &mut AggregateState) {
        state.distinct = false;
        state.order_by.clear();
        state.nulls = NullMode::Respect;
    }
    let strategy = DialectStrategy::new()
        .on(Dialect::MySql, DialectConfig::name("JSON_ARRAYAGG").with_transform(simulate))
        .on(Dialect::Sqlite, DialectConfig::name("JSON_GROUP_ARRAY").with_transform(simulate));
    Aggregate::new("ARRAY_AGG", vec![arg], strategy, true)
}

pub fn json_object_agg(key: Expr, value: Expr) -> Aggregate {
    let strategy = DialectStrategy::new()
        .on(Dialect::MySql, DialectConfig::name("JSON_OBJECTAGG"))
        .on(Dialect::Sqlite, DialectConfig::name("JSON_GROUP_OBJECT"));
    Aggregate::new("JSON_OBJECT_AGG", vec![key, value], strategy, true)
}

pub fn json_array_agg(arg: Expr) -> Aggregate {
    let strategy = DialectStrategy::new()
        .on(Dialect::MySql, DialectConfig::name("JSON_ARRAYAGG"))
        .on(Dialect::Sqlite, DialectConfig::name("JSON_GROUP_ARRAY"));
    Aggregate::new("JSON_ARRAY_AGG", vec![arg], strategy, true)
}

pub fn std_dev(arg: Expr) -> Aggregate {
    fn postgres_name(state: &mut AggregateState) {
        state.function_name = match state.statistical {
            Statistical::Population => "STDDEV_POP".into(),
            Statistical::Sample => "STDDEV_SAMP".into(),
        };
    }
    fn mysql_name(state: &mut AggregateState) {
        state.function_name = match state.statistical {
            Statistical::Population => "STDDEV".into(),
            Statistical::Sample => "STDDEV_SAMP".into(),
        };
    }
    let strategy = DialectStrategy::new()
        .on(Dialect::Postgres, DialectConfig::transform(postgres_name))
        .on(Dialect::MySql, DialectConfig::transform(mysql_name));
    Aggregate::new("STDDEV", vec![arg], strategy, false)
}

pub fn variance(arg: Expr) -> Aggregate {
    fn postgres_name(state: &mut AggregateState) {
        state.function_name = match state.statistical {
            Statistical::Population => "VAR_POP".into(),
            Statistical::Sample => "VAR_SAMP".into(),
        };
    }
    fn mysql_name(state: &mut AggregateState) {
        state.function_name = match state.statistical {
            Statistical::Population => "VARIANCE".into(),
            Statistical::Sample => "VAR_SAMP".into(),
        };
    }
    let strategy = DialectStrategy::new()
        .on(Dialect::Postgres, DialectConfig::transform(postgres_name))
        .on(Dialect::MySql, DialectConfig::transform(mysql_name));
    Aggregate::new("VARIANCE", vec![arg], strategy, false)
}

fn bitwise_simulation(op: &'static str) -> fn(&mut AggregateState) {
    // SQLite has no BIT_OR/BIT_AND; simulated below per call site.
    let _ = op;
    |state: &mut AggregateState| {
        let arg = state.args.first().cloned().unwrap_or(Expr::Raw("0".into()));
        let cond = Expr::BinaryOp {
            left: Box::new(arg),
            op: crate::expr::BinaryOperator::Ne,
            right: Box::new(Expr::Raw("0".into())),
        };
        let case = crate::expr::CaseExpr::searched()
            .when(cond, Expr::Raw("1".into()))
            .otherwise(Expr::Raw("0".into()))
            .build();
        state.args = vec![case];
    }
}

pub fn bit_or(arg: Expr) -> Aggregate {
    let strategy = DialectStrategy::new().on(
        Dialect::Sqlite,
        DialectConfig::name("MAX").with_transform(bitwise_simulation("BIT_OR")),
    );
    Aggregate::new("BIT_OR", vec![arg], strategy, true)
}

pub fn bit_and(arg: Expr) -> Aggregate {
    let strategy = DialectStrategy::new().on(
        Dialect::Sqlite,
        DialectConfig::name("MIN").with_transform(bitwise_simulation("BIT_AND")),
    );
    Aggregate::new("BIT_AND", vec![arg], strategy, true)
}

fn bool_simulation(state: &mut AggregateState) {
    let arg = state.args.first().cloned().unwrap_or(Expr::Raw("false".into()));
    let case = crate::expr::CaseExpr::searched()
        .when(arg, Expr::Raw("1".into()))
        .otherwise(Expr::Raw("0".into()))
        .build();
    state.args = vec![case];
}

pub fn bool_or(arg: Expr) -> Aggregate {
    let strategy = DialectStrategy::new()
        .on(Dialect::MySql, DialectConfig::name("MAX").with_transform(bool_simulation))
        .on(Dialect::Sqlite, DialectConfig::name("MAX").with_transform(bool_simulation));
    Aggregate::new("BOOL_OR", vec![arg], strategy, true)
}

pub fn bool_and(arg: Expr) -> Aggregate {
    let strategy = DialectStrategy::new()
        .on(Dialect::MySql, DialectConfig::name("MIN").with_transform(bool_simulation))
        .on(Dialect::Sqlite, DialectConfig::name("MIN").with_transform(bool_simulation));
    Aggregate::new("BOOL_AND", vec![arg], strategy, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionBuilder;
    use crate::value::Value;

    fn sql(agg: Aggregate, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let expr = agg.into_expr(dialect).unwrap();
        let ts = expr.render(dialect, &mut params).unwrap();
        (ts.serialize(dialect), params)
    }

    #[test]
    fn count_distinct_with_filter_postgres() {
        let agg = count(crate::expr::col("user_id"))
            .distinct()
            .filter(ConditionBuilder::new().equals("is_active", true).build().unwrap());
        let (s, params) = sql(agg, Dialect::Postgres);
        assert_eq!(s, "COUNT(DISTINCT \"user_id\") FILTER (WHERE \"is_active\" = $1)");
        assert_eq!(params, vec![Value::Bool(true)]);
    }

    #[test]
    fn count_distinct_with_filter_mysql_rewrite() {
        let agg = count(crate::expr::col("user_id"))
            .distinct()
            .filter(ConditionBuilder::new().equals("is_active", true).build().unwrap());
        let (s, params) = sql(agg, Dialect::MySql);
        assert_eq!(s, "SUM(CASE WHEN `is_active` = ? THEN 1 ELSE 0 END)");
        assert_eq!(params, vec![Value::Bool(true)]);
    }

    #[test]
    fn bit_or_sqlite_simulation() {
        let agg = bit_or(crate::expr::col("flags"));
        let (s, params) = sql(agg, Dialect::Sqlite);
        assert_eq!(s, "MAX(CASE WHEN \"flags\" != 0 THEN 1 ELSE 0 END)");
        assert!(params.is_empty());
    }

    #[test]
    fn string_agg_distinct_drops_separator_on_sqlite() {
        let agg = string_agg(crate::expr::col("name")).distinct().separator(", ");
        let (s, _) = sql(agg, Dialect::Sqlite);
        assert_eq!(s, "GROUP_CONCAT(DISTINCT \"name\")");
    }

    #[test]
    fn stddev_unsupported_on_sqlite() {
        let agg = std_dev(crate::expr::col("x"));
        let err = agg.into_expr(Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, QueryError::DialectUnsupportedOperation { dialect: Dialect::Sqlite, .. }));
    }
}
