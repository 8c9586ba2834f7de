//! The expression AST and its dialect-aware serializer.
//!
//! Every node exposes one operation, [`Expr::render`]: append dialect
//! formatted SQL tokens and bound parameters into a growing buffer. Nodes
//! compose freely and are immutable once constructed.

use crate::builder::select::Select;
use crate::dialect::{Dialect, SqlDialect};
use crate::error::QueryResult;
use crate::token::{Token, TokenStream};
use crate::value::Value;

/// A SQL expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column reference, optionally qualified (`alias.name`).
    Column { qualifier: Option<String>, name: String },

    /// `*` or `alias.*`.
    Star { qualifier: Option<String> },

    /// A bound parameter. Never inlined into SQL text.
    Literal(Value),

    BinaryOp { left: Box<Expr>, op: BinaryOperator, right: Box<Expr> },
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// `name(args...)`, optionally `DISTINCT`-qualified.
    Function { name: String, args: Vec<Expr>, distinct: bool },

    /// An aggregate call with an inline `ORDER BY` inside the argument list
    /// (`STRING_AGG(col, sep ORDER BY name)`), optionally `FILTER`-qualified.
    AggregateCall { name: String, args: Vec<Expr>, distinct: bool, order_by: Vec<OrderItem>, filter: Option<Box<Expr>> },

    /// Comma-joined group with no surrounding parentheses.
    Exprs(Vec<Expr>),

    /// Parenthesised wrapper.
    Paren(Box<Expr>),

    Case(CaseExpr),

    /// `(SELECT ...)` - owned sub-select, rendered parenthesised.
    Subquery(Box<Select>),

    In { expr: Box<Expr>, values: Vec<Expr>, negated: bool },
    InSubquery { expr: Box<Expr>, subquery: Box<Select>, negated: bool },
    Between { expr: Box<Expr>, low: Box<Expr>, high: Box<Expr>, negated: bool },
    IsNull { expr: Box<Expr>, negated: bool },

    /// `IS TRUE` / `IS FALSE`; rewritten to `= TRUE`/`= FALSE` on dialects
    /// that report `supports_is_true_false() == false`.
    IsBool { expr: Box<Expr>, value: bool, negated: bool },

    /// `LIKE`/`ILIKE` with fuzzy-match helpers composing the pattern.
    Like { expr: Box<Expr>, pattern: Box<Expr>, case_insensitive: bool, negated: bool },

    /// `EXISTS (SELECT ...)`.
    Exists { subquery: Box<Select>, negated: bool },

    /// A window function or an aggregate wrapped with an `OVER` clause.
    Window { function: Box<Expr>, spec: WindowSpec },

    /// Positional-`?` template. Identifier args are quoted inline; other
    /// args are parameterised.
    Fragment { template: String, args: Vec<FragmentArg> },

    /// Raw SQL passed through unescaped. Never build from user input.
    Raw(String),
}

#[derive(Debug, Clone)]
pub enum FragmentArg {
    Ident(String),
    Value(Value),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

/// CASE expression: simple (with a scrutinee) or searched (without).
#[derive(Debug, Clone, Default)]
pub struct CaseExpr {
    pub operand: Option<Box<Expr>>,
    pub branches: Vec<(Expr, Expr)>,
    pub else_branch: Option<Box<Expr>>,
}

impl CaseExpr {
    pub fn searched() -> Self {
        Self::default()
    }

    pub fn simple(operand: Expr) -> Self {
        Self {
            operand: Some(Box::new(operand)),
            ..Default::default()
        }
    }

    pub fn when(mut self, condition: Expr, then: Expr) -> Self {
        self.branches.push((condition, then));
        self
    }

    pub fn otherwise(mut self, value: Expr) -> Self {
        self.else_branch = Some(Box::new(value));
        self
    }

    pub fn build(self) -> Expr {
        Expr::Case(self)
    }
}

/// Sort direction for `ORDER BY` items and window `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// `NULLS FIRST`/`NULLS LAST`, ignored on dialects without explicit support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    #[default]
    Default,
    First,
    Last,
}

/// One `ORDER BY` item.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub expr: Expr,
    pub dir: SortDir,
    pub nulls: NullsOrder,
}

impl OrderItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, dir: SortDir::Asc, nulls: NullsOrder::Default }
    }

    pub fn asc(mut self) -> Self {
        self.dir = SortDir::Asc;
        self
    }

    pub fn desc(mut self) -> Self {
        self.dir = SortDir::Desc;
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullsOrder::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullsOrder::Last;
        self
    }

    fn render(&self, dialect: Dialect, params: &mut Vec<Value>) -> QueryResult<TokenStream> {
        let mut ts = self.expr.render(dialect, params)?;
        if self.dir == SortDir::Desc {
            ts.space().push(Token::Desc);
        } else {
            ts.space().push(Token::Asc);
        }
        if dialect.supports_nulls_ordering() {
            match self.nulls {
                NullsOrder::First => {
                    ts.space().push(Token::NullsFirst);
                }
                NullsOrder::Last => {
                    ts.space().push(Token::NullsLast);
                }
                NullsOrder::Default => {}
            }
        }
        Ok(ts)
    }
}

/// `ORDER BY item, item, ...`.
pub fn render_order_by(
    items: &[OrderItem],
    dialect: Dialect,
    params: &mut Vec<Value>,
) -> QueryResult<TokenStream> {
    let mut ts = TokenStream::new();
    ts.push(Token::OrderBy).space();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&item.render(dialect, params)?);
    }
    Ok(ts)
}

/// Frame type for window functions: `ROWS`, `RANGE`, or `GROUPS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFrameKind {
    Rows,
    Range,
    Groups,
}

/// A single frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

/// `ROWS/RANGE/GROUPS BETWEEN x AND y` (or a single-bound frame).
#[derive(Debug, Clone)]
pub struct WindowFrame {
    pub kind: WindowFrameKind,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl WindowFrame {
    pub fn new(kind: WindowFrameKind, start: FrameBound) -> Self {
        Self { kind, start, end: None }
    }

    pub fn between(kind: WindowFrameKind, start: FrameBound, end: FrameBound) -> Self {
        Self { kind, start, end: Some(end) }
    }

    fn render(&self, dialect: Dialect) -> QueryResult<TokenStream> {
        if self.kind == WindowFrameKind::Groups && !dialect.supports_groups_frame() {
            return Err(crate::error::QueryError::DialectUnsupportedOperation {
                operation: "GROUPS frame",
                dialect,
            });
        }
        let mut ts = TokenStream::new();
        ts.push(match self.kind {
            WindowFrameKind::Rows => Token::Rows,
            WindowFrameKind::Range => Token::Range,
            WindowFrameKind::Groups => Token::Groups,
        });
        ts.space();
        if let Some(end) = &self.end {
            ts.push(Token::Raw("BETWEEN".into())).space();
            ts.append(&render_bound(&self.start));
            ts.space().push(Token::And).space();
            ts.append(&render_bound(end));
        } else {
            ts.append(&render_bound(&self.start));
        }
        Ok(ts)
    }
}

fn render_bound(bound: &FrameBound) -> TokenStream {
    let mut ts = TokenStream::new();
    match bound {
        FrameBound::UnboundedPreceding => {
            ts.push(Token::Unbounded).space().push(Token::Preceding);
        }
        FrameBound::Preceding(n) => {
            ts.push(Token::Raw(n.to_string())).space().push(Token::Preceding);
        }
        FrameBound::CurrentRow => {
            ts.push(Token::CurrentRow);
        }
        FrameBound::Following(n) => {
            ts.push(Token::Raw(n.to_string())).space().push(Token::Following);
        }
        FrameBound::UnboundedFollowing => {
            ts.push(Token::Unbounded).space().push(Token::Following);
        }
    }
    ts
}

/// The `OVER (...)` specification attached to a window function.
#[derive(Debug, Clone, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderItem>,
    pub frame: Option<WindowFrame>,
}

impl WindowSpec {
    fn render(&self, dialect: Dialect, params: &mut Vec<Value>) -> QueryResult<TokenStream> {
        let mut ts = TokenStream::new();
        ts.lparen();
        let mut wrote = false;
        if !self.partition_by.is_empty() {
            ts.push(Token::PartitionBy).space();
            for (i, e) in self.partition_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&e.render(dialect, params)?);
            }
            wrote = true;
        }
        if !self.order_by.is_empty() {
            if wrote {
                ts.space();
            }
            ts.append(&render_order_by(&self.order_by, dialect, params)?);
            wrote = true;
        }
        if let Some(frame) = &self.frame {
            if wrote {
                ts.space();
            }
            ts.append(&frame.render(dialect)?);
        }
        ts.rparen();
        Ok(ts)
    }
}

fn binary_op_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
        BinaryOperator::Mod => Token::Mod,
        BinaryOperator::Concat => Token::Concat,
    }
}

impl Expr {
    pub fn render(&self, dialect: Dialect, params: &mut Vec<Value>) -> QueryResult<TokenStream> {
        let mut ts = TokenStream::new();
        match self {
            Expr::Column { qualifier, name } => {
                ts.push(Token::QualifiedIdent { qualifier: qualifier.clone(), name: name.clone() });
            }

            Expr::Star { qualifier } => {
                if let Some(q) = qualifier {
                    ts.push(Token::Ident(q.clone())).push(Token::Dot);
                }
                ts.push(Token::Star);
            }

            Expr::Literal(value) => {
                params.push(value.clone());
                ts.push(Token::Param(params.len()));
            }

            Expr::BinaryOp { left, op, right } => {
                if *op == BinaryOperator::Concat && !dialect.supports_concat_operator() {
                    ts.push(Token::FunctionName("CONCAT".into())).lparen();
                    ts.append(&left.render(dialect, params)?);
                    ts.comma().space();
                    ts.append(&right.render(dialect, params)?);
                    ts.rparen();
                } else {
                    ts.append(&left.render(dialect, params)?);
                    ts.space();
                    ts.push(binary_op_token(*op));
                    ts.space();
                    ts.append(&right.render(dialect, params)?);
                }
            }

            Expr::UnaryOp { op, expr } => {
                match op {
                    UnaryOperator::Not => {
                        ts.push(Token::Not).space();
                        ts.append(&expr.render(dialect, params)?);
                    }
                    UnaryOperator::Neg => {
                        ts.push(Token::Minus);
                        ts.append(&expr.render(dialect, params)?);
                    }
                }
            }

            Expr::Function { name, args, distinct } => {
                ts.push(Token::FunctionName(name.clone())).lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.render(dialect, params)?);
                }
                ts.rparen();
            }

            Expr::AggregateCall { name, args, distinct, order_by, filter } => {
                ts.push(Token::FunctionName(name.clone())).lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.render(dialect, params)?);
                }
                if !order_by.is_empty() {
                    ts.space();
                    ts.append(&render_order_by(order_by, dialect, params)?);
                }
                ts.rparen();
                if let Some(filter) = filter {
                    ts.space().push(Token::Filter).space().lparen().push(Token::Where).space();
                    ts.append(&filter.render(dialect, params)?);
                    ts.rparen();
                }
            }

            Expr::Exprs(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&item.render(dialect, params)?);
                }
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.render(dialect, params)?);
                ts.rparen();
            }

            Expr::Case(case) => {
                ts.push(Token::Case);
                if let Some(operand) = &case.operand {
                    ts.space();
                    ts.append(&operand.render(dialect, params)?);
                }
                for (cond, then) in &case.branches {
                    ts.space().push(Token::When).space();
                    ts.append(&cond.render(dialect, params)?);
                    ts.space().push(Token::Then).space();
                    ts.append(&then.render(dialect, params)?);
                }
                if let Some(else_branch) = &case.else_branch {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_branch.render(dialect, params)?);
                }
                ts.space().push(Token::End);
            }

            Expr::Subquery(select) => {
                ts.lparen();
                ts.append(&select.render_tokens(dialect, params)?);
                ts.rparen();
            }

            Expr::In { expr, values, negated } => {
                if values.is_empty() {
                    // Always-false (or always-true for NOT IN) predicate;
                    // never emit `IN ()`, which is invalid syntax.
                    ts.push(Token::Raw(if *negated { "1 = 1" } else { "1 = 0" }.into()));
                    return Ok(ts);
                }
                ts.append(&expr.render(dialect, params)?);
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space().lparen();
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&v.render(dialect, params)?);
                }
                ts.rparen();
            }

            Expr::InSubquery { expr, subquery, negated } => {
                ts.append(&expr.render(dialect, params)?);
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space().lparen();
                ts.append(&subquery.render_tokens(dialect, params)?);
                ts.rparen();
            }

            Expr::Between { expr, low, high, negated } => {
                ts.append(&expr.render(dialect, params)?);
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Between).space();
                ts.append(&low.render(dialect, params)?);
                ts.space().push(Token::And).space();
                ts.append(&high.render(dialect, params)?);
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.render(dialect, params)?);
                ts.space();
                ts.push(if *negated { Token::IsNotNull } else { Token::IsNull });
            }

            Expr::IsBool { expr, value, negated } => {
                if dialect.supports_is_true_false() {
                    ts.append(&expr.render(dialect, params)?);
                    ts.space().push(Token::Is).space();
                    if *negated {
                        ts.push(Token::Not).space();
                    }
                    ts.push(if *value { Token::True } else { Token::False });
                } else {
                    ts.append(&expr.render(dialect, params)?);
                    ts.space();
                    ts.push(if *negated { Token::Ne } else { Token::Eq });
                    ts.space();
                    ts.push(if *value { Token::True } else { Token::False });
                }
            }

            Expr::Like { expr, pattern, case_insensitive, negated } => {
                let use_ilike = *case_insensitive && dialect.supports_ilike();
                if use_ilike {
                    ts.append(&expr.render(dialect, params)?);
                    ts.space();
                    if *negated {
                        ts.push(Token::Not).space();
                    }
                    ts.push(Token::ILike).space();
                    ts.append(&pattern.render(dialect, params)?);
                } else if *case_insensitive {
                    // No ILIKE on this dialect: LOWER(col) LIKE LOWER(pattern).
                    let lowered_expr = func("LOWER", vec![(**expr).clone()]);
                    let lowered_pattern = func("LOWER", vec![(**pattern).clone()]);
                    ts.append(&lowered_expr.render(dialect, params)?);
                    ts.space();
                    if *negated {
                        ts.push(Token::Not).space();
                    }
                    ts.push(Token::Like).space();
                    ts.append(&lowered_pattern.render(dialect, params)?);
                } else {
                    ts.append(&expr.render(dialect, params)?);
                    ts.space();
                    if *negated {
                        ts.push(Token::Not).space();
                    }
                    ts.push(Token::Like).space();
                    ts.append(&pattern.render(dialect, params)?);
                }
            }

            Expr::Exists { subquery, negated } => {
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Exists).space().lparen();
                ts.append(&subquery.render_tokens(dialect, params)?);
                ts.rparen();
            }

            Expr::Window { function, spec } => {
                ts.append(&function.render(dialect, params)?);
                ts.space().push(Token::Over).space();
                ts.append(&spec.render(dialect, params)?);
            }

            Expr::Fragment { template, args } => {
                let mut arg_iter = args.iter();
                for ch in template.chars() {
                    if ch == '?' {
                        match arg_iter.next() {
                            Some(FragmentArg::Ident(name)) => {
                                ts.push(Token::Ident(name.clone()));
                            }
                            Some(FragmentArg::Value(value)) => {
                                params.push(value.clone());
                                ts.push(Token::Param(params.len()));
                            }
                            None => {
                                ts.push(Token::Raw("?".into()));
                            }
                        }
                    } else {
                        ts.push(Token::Raw(ch.to_string()));
                    }
                }
            }

            Expr::Raw(s) => {
                ts.push(Token::Raw(s.clone()));
            }
        }
        Ok(ts)
    }
}

// === Convenience constructors ===

pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column { qualifier: None, name: name.into() }
}

pub fn table_col(qualifier: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::Column { qualifier: Some(qualifier.into()), name: name.into() }
}

pub fn star() -> Expr {
    Expr::Star { qualifier: None }
}

pub fn table_star(qualifier: impl Into<String>) -> Expr {
    Expr::Star { qualifier: Some(qualifier.into()) }
}

pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

pub fn raw(sql: impl Into<String>) -> Expr {
    Expr::Raw(sql.into())
}

pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Function { name: name.into(), args, distinct: false }
}

pub trait ExprExt {
    fn eq(self, other: Expr) -> Expr;
    fn paren(self) -> Expr;
}

impl ExprExt for Expr {
    fn eq(self, other: Expr) -> Expr {
        Expr::BinaryOp { left: Box::new(self), op: BinaryOperator::Eq, right: Box::new(other) }
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn render(e: &Expr, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let ts = e.render(dialect, &mut params).unwrap();
        (ts.serialize(dialect), params)
    }

    #[test]
    fn literal_never_inlined() {
        let (sql, params) = render(&lit("alice"), Dialect::Postgres);
        assert_eq!(sql, "$1");
        assert_eq!(params, vec![Value::Text("alice".into())]);
        assert!(!sql.contains("alice"));
    }

    #[test]
    fn column_quoted_per_dialect() {
        let (sql, _) = render(&table_col("u", "id"), Dialect::MySql);
        assert_eq!(sql, "`u`.`id`");
    }

    #[test]
    fn empty_in_list_is_constant_false() {
        let e = Expr::In { expr: Box::new(col("age")), values: vec![], negated: false };
        let (sql, params) = render(&e, Dialect::Postgres);
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn concat_rewritten_on_mysql() {
        let e = Expr::BinaryOp {
            left: Box::new(col("a")),
            op: BinaryOperator::Concat,
            right: Box::new(col("b")),
        };
        let (sql, _) = render(&e, Dialect::MySql);
        assert_eq!(sql, "CONCAT(`a`, `b`)");
    }

    #[test]
    fn is_true_rewritten_where_unsupported() {
        let e = Expr::IsBool { expr: Box::new(col("active")), value: true, negated: false };
        let (pg, _) = render(&e, Dialect::Postgres);
        assert_eq!(pg, "\"active\" IS TRUE");
        let (mysql, _) = render(&e, Dialect::MySql);
        assert_eq!(mysql, "`active` = 1");
    }
}
