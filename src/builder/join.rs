//! JOIN clause types shared by the SELECT builder.

use crate::expr::Expr;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub(crate) fn tokens(self) -> Vec<Token> {
        match self {
            JoinType::Inner => vec![Token::Inner, Token::Space, Token::Join],
            JoinType::Left => vec![Token::Left, Token::Space, Token::Join],
            JoinType::Right => vec![Token::Right, Token::Space, Token::Join],
            JoinType::Full => vec![Token::Full, Token::Space, Token::Outer, Token::Space, Token::Join],
            JoinType::Cross => vec![Token::Cross, Token::Space, Token::Join],
        }
    }
}

/// What's being joined: a literal table name, a sub-select, an arbitrary
/// expression (e.g. a function call producing a row set), or a model whose
/// table/alias is resolved from the registered schema.
#[derive(Debug, Clone)]
pub enum JoinSource {
    Table { name: String, alias: Option<String> },
    Subquery { select: Box<super::select::Select>, alias: String },
    Expr { expr: Expr, alias: Option<String> },
    Model { model_name: String, alias: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: JoinType,
    pub source: JoinSource,
    /// `None` only valid for `Cross`.
    pub on: Option<Expr>,
}

/// A declarative relation descriptor for `Select::join_relations`: the
/// foreign/referenced columns and join type are inferred when left
/// unspecified, and `select_columns` are pulled in auto-aliased as
/// `{model}_{col}` to avoid collisions with the base table's own columns.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    pub(crate) model_name: String,
    pub(crate) alias: Option<String>,
    pub(crate) join_type: JoinType,
    pub(crate) foreign_column: Option<String>,
    pub(crate) referenced_column: Option<String>,
    pub(crate) select_columns: Vec<String>,
    pub(crate) extra_on: Option<Expr>,
}

impl RelationSpec {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            alias: None,
            join_type: JoinType::Left,
            foreign_column: None,
            referenced_column: None,
            select_columns: Vec::new(),
            extra_on: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn foreign_column(mut self, column: impl Into<String>) -> Self {
        self.foreign_column = Some(column.into());
        self
    }

    pub fn referenced_column(mut self, column: impl Into<String>) -> Self {
        self.referenced_column = Some(column.into());
        self
    }

    pub fn select_columns(mut self, columns: Vec<String>) -> Self {
        self.select_columns = columns;
        self
    }

    pub fn extra_on(mut self, expr: Expr) -> Self {
        self.extra_on = Some(expr);
        self
    }
}
