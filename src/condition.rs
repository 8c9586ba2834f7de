//! The fluent condition builder: one WHERE/HAVING/ON/FILTER tree per clause.
//!
//! Chained calls extend the tree with AND; the `or_*` counterpart extends
//! with OR. Evaluation order matches call order: `a().b()` renders as
//! `(a) AND (b)`, never reordered for textual precedence.

use crate::builder::select::Select;
use crate::expr::{lit, BinaryOperator, Expr, ExprExt};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

/// A fluent predicate tree. Consuming (`mut self -> Self`) like the rest of
/// this crate's builders.
#[derive(Debug, Clone, Default)]
#[must_use = "a ConditionBuilder has no effect until attached to a statement"]
pub struct ConditionBuilder {
    root: Option<Expr>,
}

impl ConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the accumulated tree, if any predicate was added.
    pub fn build(self) -> Option<Expr> {
        self.root
    }

    fn push(mut self, connective: Connective, expr: Expr) -> Self {
        self.root = Some(match self.root.take() {
            None => expr,
            Some(root) => Expr::BinaryOp {
                left: Box::new(root),
                op: match connective {
                    Connective::And => BinaryOperator::And,
                    Connective::Or => BinaryOperator::Or,
                },
                right: Box::new(expr),
            },
        });
        self
    }

    // === Grouping ===

    /// Open a nested AND-connected group: `(...)`.
    pub fn group(self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        match f(ConditionBuilder::new()).build() {
            Some(inner) => self.push(Connective::And, inner.paren()),
            None => self,
        }
    }

    /// Open a nested OR-connected group: `(...)`.
    pub fn or_group(self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        match f(ConditionBuilder::new()).build() {
            Some(inner) => self.push(Connective::Or, inner.paren()),
            None => self,
        }
    }

    // === Apply / ApplyIf ===

    pub fn apply(self, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        f(self)
    }

    pub fn apply_if(self, cond: bool, f: impl FnOnce(ConditionBuilder) -> ConditionBuilder) -> Self {
        if cond {
            f(self)
        } else {
            self
        }
    }

    // === Raw expression hooks ===

    pub fn expr(self, e: Expr) -> Self {
        self.push(Connective::And, e)
    }

    pub fn or_expr(self, e: Expr) -> Self {
        self.push(Connective::Or, e)
    }

    // === Comparisons ===
    //
    // Each comparator takes an `Expr` right-hand side; callers compose the
    // column-to-column / sub-select / arbitrary-expression flavours by
    // passing `col(...)`, `Expr::Subquery(...)`, or any other `Expr`
    // themselves, and the value flavour via `lit(...)` (the `_val` shorthand
    // below does that for the common case).

    fn cmp(self, connective: Connective, col: &str, op: BinaryOperator, rhs: Expr) -> Self {
        self.push(
            connective,
            Expr::BinaryOp { left: Box::new(crate::expr::col(col)), op, right: Box::new(rhs) },
        )
    }

    pub fn equals_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::And, col, BinaryOperator::Eq, rhs)
    }
    pub fn or_equals_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::Or, col, BinaryOperator::Eq, rhs)
    }
    pub fn equals(self, col: &str, value: impl Into<Value>) -> Self {
        self.equals_expr(col, lit(value.into()))
    }
    pub fn or_equals(self, col: &str, value: impl Into<Value>) -> Self {
        self.or_equals_expr(col, lit(value.into()))
    }

    pub fn not_equals_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::And, col, BinaryOperator::Ne, rhs)
    }
    pub fn or_not_equals_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::Or, col, BinaryOperator::Ne, rhs)
    }
    pub fn not_equals(self, col: &str, value: impl Into<Value>) -> Self {
        self.not_equals_expr(col, lit(value.into()))
    }
    pub fn or_not_equals(self, col: &str, value: impl Into<Value>) -> Self {
        self.or_not_equals_expr(col, lit(value.into()))
    }

    pub fn less_than_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::And, col, BinaryOperator::Lt, rhs)
    }
    pub fn less_than(self, col: &str, value: impl Into<Value>) -> Self {
        self.less_than_expr(col, lit(value.into()))
    }
    pub fn or_less_than(self, col: &str, value: impl Into<Value>) -> Self {
        self.cmp(Connective::Or, col, BinaryOperator::Lt, lit(value.into()))
    }

    pub fn less_or_equal_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::And, col, BinaryOperator::Lte, rhs)
    }
    pub fn less_or_equal(self, col: &str, value: impl Into<Value>) -> Self {
        self.less_or_equal_expr(col, lit(value.into()))
    }

    pub fn greater_than_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::And, col, BinaryOperator::Gt, rhs)
    }
    pub fn greater_than(self, col: &str, value: impl Into<Value>) -> Self {
        self.greater_than_expr(col, lit(value.into()))
    }
    pub fn or_greater_than(self, col: &str, value: impl Into<Value>) -> Self {
        self.cmp(Connective::Or, col, BinaryOperator::Gt, lit(value.into()))
    }

    pub fn greater_or_equal_expr(self, col: &str, rhs: Expr) -> Self {
        self.cmp(Connective::And, col, BinaryOperator::Gte, rhs)
    }
    pub fn greater_or_equal(self, col: &str, value: impl Into<Value>) -> Self {
        self.greater_or_equal_expr(col, lit(value.into()))
    }

    // === Range ===

    pub fn between(self, col: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push(
            Connective::And,
            Expr::Between {
                expr: Box::new(crate::expr::col(col)),
                low: Box::new(lit(low.into())),
                high: Box::new(lit(high.into())),
                negated: false,
            },
        )
    }

    pub fn not_between(self, col: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push(
            Connective::And,
            Expr::Between {
                expr: Box::new(crate::expr::col(col)),
                low: Box::new(lit(low.into())),
                high: Box::new(lit(high.into())),
                negated: true,
            },
        )
    }

    // === Membership ===

    pub fn in_list(self, col: &str, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let values = values.into_iter().map(|v| lit(v.into())).collect();
        self.push(Connective::And, Expr::In { expr: Box::new(crate::expr::col(col)), values, negated: false })
    }

    pub fn not_in_list(self, col: &str, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let values = values.into_iter().map(|v| lit(v.into())).collect();
        self.push(Connective::And, Expr::In { expr: Box::new(crate::expr::col(col)), values, negated: true })
    }

    pub fn in_subquery(self, col: &str, subquery: Select) -> Self {
        self.push(
            Connective::And,
            Expr::InSubquery { expr: Box::new(crate::expr::col(col)), subquery: Box::new(subquery), negated: false },
        )
    }

    pub fn not_in_subquery(self, col: &str, subquery: Select) -> Self {
        self.push(
            Connective::And,
            Expr::InSubquery { expr: Box::new(crate::expr::col(col)), subquery: Box::new(subquery), negated: true },
        )
    }

    // === Null / truthiness ===

    pub fn is_null(self, col: &str) -> Self {
        self.push(Connective::And, Expr::IsNull { expr: Box::new(crate::expr::col(col)), negated: false })
    }

    pub fn is_not_null(self, col: &str) -> Self {
        self.push(Connective::And, Expr::IsNull { expr: Box::new(crate::expr::col(col)), negated: true })
    }

    pub fn is_true(self, col: &str) -> Self {
        self.push(Connective::And, Expr::IsBool { expr: Box::new(crate::expr::col(col)), value: true, negated: false })
    }

    pub fn is_false(self, col: &str) -> Self {
        self.push(Connective::And, Expr::IsBool { expr: Box::new(crate::expr::col(col)), value: false, negated: false })
    }

    // === Fuzzy string ===
    //
    // Pattern wrapping happens here; dialect-specific `ILIKE` vs
    // `LOWER(...) LIKE LOWER(...)` is decided at render time in expr.rs.

    fn like(self, connective: Connective, col: &str, pattern: String, case_insensitive: bool, negated: bool) -> Self {
        self.push(
            connective,
            Expr::Like {
                expr: Box::new(crate::expr::col(col)),
                pattern: Box::new(lit(Value::Text(pattern))),
                case_insensitive,
                negated,
            },
        )
    }

    pub fn contains(self, col: &str, needle: &str, case_insensitive: bool) -> Self {
        self.like(Connective::And, col, format!("%{}%", needle), case_insensitive, false)
    }
    pub fn or_contains(self, col: &str, needle: &str, case_insensitive: bool) -> Self {
        self.like(Connective::Or, col, format!("%{}%", needle), case_insensitive, false)
    }

    pub fn starts_with(self, col: &str, prefix: &str, case_insensitive: bool) -> Self {
        self.like(Connective::And, col, format!("{}%", prefix), case_insensitive, false)
    }
    pub fn or_starts_with(self, col: &str, prefix: &str, case_insensitive: bool) -> Self {
        self.like(Connective::Or, col, format!("{}%", prefix), case_insensitive, false)
    }

    pub fn ends_with(self, col: &str, suffix: &str, case_insensitive: bool) -> Self {
        self.like(Connective::And, col, format!("%{}", suffix), case_insensitive, false)
    }
    pub fn or_ends_with(self, col: &str, suffix: &str, case_insensitive: bool) -> Self {
        self.like(Connective::Or, col, format!("%{}", suffix), case_insensitive, false)
    }

    /// `contains_any`: a group of OR-connected `contains` predicates over one
    /// column and several needles.
    pub fn contains_any(self, col: &str, needles: &[&str], case_insensitive: bool) -> Self {
        self.group(|mut cb| {
            for (i, needle) in needles.iter().enumerate() {
                cb = if i == 0 {
                    cb.contains(col, needle, case_insensitive)
                } else {
                    cb.or_contains(col, needle, case_insensitive)
                };
            }
            cb
        })
    }

    // === Audit helpers ===

    pub fn created_by_equals_operator(self, operator: impl Into<Value>) -> Self {
        self.equals("created_by", operator)
    }

    pub fn updated_by_equals_operator(self, operator: impl Into<Value>) -> Self {
        self.equals("updated_by", operator)
    }

    pub fn created_after(self, ts: impl Into<Value>) -> Self {
        self.greater_than("created_at", ts)
    }

    pub fn updated_after(self, ts: impl Into<Value>) -> Self {
        self.greater_than("updated_at", ts)
    }

    // === Primary-key helpers ===

    /// `pk = value` (single-column) or `(pk1, pk2) = (v1, v2)` (composite).
    pub fn pk_equals(self, pk_columns: &[String], values: Vec<Value>) -> Self {
        if pk_columns.len() == 1 {
            return self.equals(&pk_columns[0], values.into_iter().next().unwrap_or(Value::Null));
        }
        let left = Expr::Exprs(pk_columns.iter().map(crate::expr::col).collect()).paren();
        let right = Expr::Exprs(values.into_iter().map(lit).collect()).paren();
        self.push(Connective::And, Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::Eq, right: Box::new(right) })
    }

    /// `(pk1, pk2) IN ((v1, v2), ...)` for composite keys, or a plain
    /// `pk IN (...)` for a single-column key.
    pub fn pk_in(self, pk_columns: &[String], rows: Vec<Vec<Value>>) -> Self {
        if pk_columns.len() == 1 {
            let values = rows.into_iter().filter_map(|mut r| r.pop());
            return self.in_list(&pk_columns[0], values);
        }
        let tuple = Expr::Exprs(pk_columns.iter().map(crate::expr::col).collect()).paren();
        let values: Vec<Expr> = rows
            .into_iter()
            .map(|row| Expr::Exprs(row.into_iter().map(lit).collect()).paren())
            .collect();
        self.push(Connective::And, Expr::In { expr: Box::new(tuple), values, negated: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn sql(cb: ConditionBuilder) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let expr = cb.build().unwrap();
        let ts = expr.render(Dialect::Postgres, &mut params).unwrap();
        (ts.serialize(Dialect::Postgres), params)
    }

    #[test]
    fn predicate_order_is_call_order() {
        let cb = ConditionBuilder::new().equals("x", 1i64).greater_than("y", 2i64);
        let (s, params) = sql(cb);
        assert_eq!(s, "\"x\" = $1 AND \"y\" > $2");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn empty_in_is_always_false() {
        let cb = ConditionBuilder::new().in_list("age", Vec::<i64>::new());
        let (s, params) = sql(cb);
        assert_eq!(s, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn or_group_parenthesised() {
        let cb = ConditionBuilder::new()
            .equals("a", 1i64)
            .or_group(|g| g.equals("b", 2i64).equals("c", 3i64));
        let (s, _) = sql(cb);
        assert_eq!(s, "\"a\" = $1 OR (\"b\" = $2 AND \"c\" = $3)");
    }

    #[test]
    fn composite_pk_in() {
        let cb = ConditionBuilder::new().pk_in(
            &["tenant_id".to_string(), "id".to_string()],
            vec![vec![Value::Int(1), Value::Text("a".into())], vec![Value::Int(1), Value::Text("b".into())]],
        );
        let (s, params) = sql(cb);
        assert_eq!(s, "(\"tenant_id\", \"id\") IN (($1, $2), ($3, $4))");
        assert_eq!(params, vec![Value::Int(1), Value::Text("a".into()), Value::Int(1), Value::Text("b".into())]);
    }

    #[test]
    fn contains_ignore_case_uses_ilike_on_postgres() {
        let cb = ConditionBuilder::new().contains("name", "cd", true);
        let (s, _) = sql(cb);
        assert_eq!(s, "\"name\" ILIKE $1");
    }

    #[test]
    fn contains_ignore_case_lowers_both_sides_without_ilike() {
        let expected = [(Dialect::MySql, "LOWER(`name`) LIKE LOWER(?)"), (Dialect::Sqlite, "LOWER(\"name\") LIKE LOWER(?)")];
        for (dialect, want) in expected {
            let expr = ConditionBuilder::new().contains("name", "cd", true).build().unwrap();
            let mut params = Vec::new();
            let ts = expr.render(dialect, &mut params).unwrap();
            assert_eq!(ts.serialize(dialect), want, "dialect: {:?}", dialect);
        }
    }
}
