//! SQL tokens - the atomic units of statement output.
//!
//! Tokens are dialect-agnostic; they serialize to dialect-specific strings
//! through [`crate::dialect::SqlDialect`]. Adding a new variant here will
//! cause compile errors everywhere it needs to be handled (exhaustive match).

use crate::dialect::{Dialect, SqlDialect};

/// A single SQL token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Lateral,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    NullsFirst,
    NullsLast,
    Limit,
    Offset,
    Fetch,
    Next,
    Rows,
    Only,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Between,
    Like,
    ILike,
    IsNull,
    IsNotNull,
    Is,
    Distinct,
    DistinctOn,
    All,
    Union,
    Intersect,
    Except,
    With,
    Recursive,
    Null,
    True,
    False,
    Exists,

    // === Window keywords ===
    Over,
    PartitionBy,
    Range,
    Groups,
    Window,
    Unbounded,
    Preceding,
    Following,
    CurrentRow,
    Filter,

    // === DML keywords ===
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Returning,
    Using,
    Conflict,
    Do,
    Nothing,
    Merge,
    Matched,
    ForUpdate,
    ForShare,
    NoWait,
    SkipLocked,
    Of,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,

    // === Whitespace ===
    Space,

    // === Dynamic content ===
    Ident(String),
    QualifiedIdent { qualifier: Option<String>, name: String },
    /// A bound-parameter placeholder, carrying the 1-based ordinal of the
    /// value it refers to in the statement's parameter list.
    Param(usize),
    FunctionName(String),

    /// Raw SQL passed through without escaping.
    ///
    /// Never build this from user input; only from trusted static fragments.
    Raw(String),
}

impl Token {
    pub fn serialize(&self, dialect: Dialect) -> String {
        use Token::*;
        match self {
            Select => "SELECT".into(),
            From => "FROM".into(),
            Where => "WHERE".into(),
            And => "AND".into(),
            Or => "OR".into(),
            Not => "NOT".into(),
            As => "AS".into(),
            On => "ON".into(),
            Join => "JOIN".into(),
            Inner => "INNER".into(),
            Left => "LEFT".into(),
            Right => "RIGHT".into(),
            Full => "FULL".into(),
            Outer => "OUTER".into(),
            Cross => "CROSS".into(),
            Lateral => "LATERAL".into(),
            GroupBy => "GROUP BY".into(),
            Having => "HAVING".into(),
            OrderBy => "ORDER BY".into(),
            Asc => "ASC".into(),
            Desc => "DESC".into(),
            NullsFirst => "NULLS FIRST".into(),
            NullsLast => "NULLS LAST".into(),
            Limit => "LIMIT".into(),
            Offset => "OFFSET".into(),
            Fetch => "FETCH".into(),
            Next => "NEXT".into(),
            Rows => "ROWS".into(),
            Only => "ONLY".into(),
            Case => "CASE".into(),
            When => "WHEN".into(),
            Then => "THEN".into(),
            Else => "ELSE".into(),
            End => "END".into(),
            In => "IN".into(),
            Between => "BETWEEN".into(),
            Like => "LIKE".into(),
            ILike => "ILIKE".into(),
            IsNull => "IS NULL".into(),
            IsNotNull => "IS NOT NULL".into(),
            Is => "IS".into(),
            Distinct => "DISTINCT".into(),
            DistinctOn => "DISTINCT ON".into(),
            All => "ALL".into(),
            Union => "UNION".into(),
            Intersect => "INTERSECT".into(),
            Except => "EXCEPT".into(),
            With => "WITH".into(),
            Recursive => "RECURSIVE".into(),
            Null => "NULL".into(),
            True => dialect.format_bool(true).into(),
            False => dialect.format_bool(false).into(),
            Exists => "EXISTS".into(),

            Over => "OVER".into(),
            PartitionBy => "PARTITION BY".into(),
            Range => "RANGE".into(),
            Groups => "GROUPS".into(),
            Window => "WINDOW".into(),
            Unbounded => "UNBOUNDED".into(),
            Preceding => "PRECEDING".into(),
            Following => "FOLLOWING".into(),
            CurrentRow => "CURRENT ROW".into(),
            Filter => "FILTER".into(),

            Insert => "INSERT".into(),
            Into => "INTO".into(),
            Values => "VALUES".into(),
            Update => "UPDATE".into(),
            Set => "SET".into(),
            Delete => "DELETE".into(),
            Returning => "RETURNING".into(),
            Using => "USING".into(),
            Conflict => "CONFLICT".into(),
            Do => "DO".into(),
            Nothing => "NOTHING".into(),
            Merge => "MERGE".into(),
            Matched => "MATCHED".into(),
            ForUpdate => "FOR UPDATE".into(),
            ForShare => "FOR SHARE".into(),
            NoWait => "NOWAIT".into(),
            SkipLocked => "SKIP LOCKED".into(),
            Of => "OF".into(),

            Comma => ",".into(),
            Dot => ".".into(),
            Star => "*".into(),
            LParen => "(".into(),
            RParen => ")".into(),

            Eq => "=".into(),
            Ne => "!=".into(),
            Lt => "<".into(),
            Gt => ">".into(),
            Lte => "<=".into(),
            Gte => ">=".into(),
            Plus => "+".into(),
            Minus => "-".into(),
            Mul => "*".into(),
            Div => "/".into(),
            Mod => "%".into(),
            Concat => dialect.concat_operator().into(),

            Space => " ".into(),

            Ident(name) => dialect.quote_identifier(name),
            QualifiedIdent { qualifier, name } => match qualifier {
                Some(q) => format!("{}.{}", dialect.quote_identifier(q), dialect.quote_identifier(name)),
                None => dialect.quote_identifier(name),
            },
            Param(ordinal) => dialect.placeholder(*ordinal),
            FunctionName(name) => match dialect.remap_function(name) {
                Some(remapped) => remapped.to_string(),
                None => name.to_uppercase(),
            },

            Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that serializes to a SQL string for a given dialect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }

    /// Join a sequence of token streams with `, `.
    pub fn join_comma(streams: impl IntoIterator<Item = TokenStream>) -> TokenStream {
        let mut ts = TokenStream::new();
        for (i, part) in streams.into_iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&part);
        }
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_quoting_per_dialect() {
        assert_eq!(Token::Ident("users".into()).serialize(Dialect::Postgres), "\"users\"");
        assert_eq!(Token::Ident("users".into()).serialize(Dialect::MySql), "`users`");
        assert_eq!(Token::Ident("users".into()).serialize(Dialect::SqlServer), "[users]");
    }

    #[test]
    fn placeholder_per_dialect() {
        assert_eq!(Token::Param(1).serialize(Dialect::Postgres), "$1");
        assert_eq!(Token::Param(1).serialize(Dialect::MySql), "?");
        assert_eq!(Token::Param(2).serialize(Dialect::Sqlite), "?");
        assert_eq!(Token::Param(3).serialize(Dialect::Oracle), ":3");
    }

    #[test]
    fn token_stream_serialize() {
        let mut ts = TokenStream::new();
        ts.push(Token::Select)
            .space()
            .push(Token::Ident("name".into()))
            .space()
            .push(Token::From)
            .space()
            .push(Token::Ident("users".into()));
        assert_eq!(ts.serialize(Dialect::Postgres), "SELECT \"name\" FROM \"users\"");
    }
}
