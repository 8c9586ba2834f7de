//! SQL dialect definitions and formatting rules.
//!
//! Each dialect implements [`SqlDialect`] to answer quoting, placeholder, and
//! feature-support questions. Builders call these instead of special-casing
//! `match dialect { ... }` inline, so adding a dialect means adding one file
//! here, not editing the serializer.

pub mod helpers;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::token::TokenStream;

/// Per-dialect rendering rules.
///
/// Default method bodies follow ANSI SQL / PostgreSQL behaviour where the
/// dialects agree; a dialect overrides only what differs.
pub trait SqlDialect: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal. Only used for `Fragment` identifier-style
    /// embedding and diagnostics; bound values never go through this path.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Format a boolean literal (`TRUE`/`FALSE` vs `1`/`0`).
    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    /// Render the placeholder for the given 1-based parameter ordinal.
    fn placeholder(&self, ordinal: usize) -> String {
        format!("${}", ordinal)
    }

    /// Emit `LIMIT`/`OFFSET` or the dialect's equivalent.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// T-SQL's `OFFSET ... FETCH` requires an `ORDER BY` clause.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    fn concat_operator(&self) -> &'static str {
        "||"
    }

    fn supports_concat_operator(&self) -> bool {
        true
    }

    fn emit_recursive_keyword(&self) -> bool {
        true
    }

    fn supports_full_outer_join(&self) -> bool {
        true
    }

    fn supports_lateral(&self) -> bool {
        true
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    /// `IS TRUE` / `IS FALSE` predicates (PostgreSQL/SQLite). Dialects that
    /// return `false` get these rewritten to `= TRUE`/`= FALSE` equality.
    fn supports_is_true_false(&self) -> bool {
        true
    }

    fn supports_ilike(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_distinct_on(&self) -> bool {
        false
    }

    fn supports_aggregate_filter(&self) -> bool {
        false
    }

    fn supports_groups_frame(&self) -> bool {
        false
    }

    fn supports_named_windows(&self) -> bool {
        false
    }

    fn supports_merge(&self) -> bool {
        false
    }

    /// Whether `UPDATE ... FROM`/multi-table `UPDATE` assignments should be
    /// qualified with the target table's alias.
    fn supports_multi_table_update(&self) -> bool {
        false
    }

    fn supports_row_locking(&self) -> bool {
        true
    }

    fn supports_skip_locked(&self) -> bool {
        true
    }

    /// Remap a function name for this dialect (case-insensitive match on the
    /// logical name). `None` keeps the name as-is (upper-cased).
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    Oracle,
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::Oracle,
        Dialect::SqlServer,
    ];

    fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &PostgresDialect,
            Dialect::MySql => &MySqlDialect,
            Dialect::Sqlite => &SqliteDialect,
            Dialect::Oracle => &OracleDialect,
            Dialect::SqlServer => &SqlServerDialect,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

macro_rules! delegate {
    ($($name:ident($($arg:ident: $ty:ty),*) -> $ret:ty),* $(,)?) => {
        impl SqlDialect for Dialect {
            $(
                fn $name(&self, $($arg: $ty),*) -> $ret {
                    self.dialect().$name($($arg),*)
                }
            )*
        }
    };
}

delegate! {
    name() -> &'static str,
    quote_identifier(ident: &str) -> String,
    quote_string(s: &str) -> String,
    format_bool(b: bool) -> &'static str,
    placeholder(ordinal: usize) -> String,
    emit_limit_offset(limit: Option<u64>, offset: Option<u64>) -> TokenStream,
    requires_order_by_for_offset() -> bool,
    concat_operator() -> &'static str,
    supports_concat_operator() -> bool,
    emit_recursive_keyword() -> bool,
    supports_full_outer_join() -> bool,
    supports_lateral() -> bool,
    supports_nulls_ordering() -> bool,
    supports_is_true_false() -> bool,
    supports_ilike() -> bool,
    supports_returning() -> bool,
    supports_distinct_on() -> bool,
    supports_aggregate_filter() -> bool,
    supports_groups_frame() -> bool,
    supports_named_windows() -> bool,
    supports_merge() -> bool,
    supports_multi_table_update() -> bool,
    supports_row_locking() -> bool,
    supports_skip_locked() -> bool,
    remap_function(name: &str) -> Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_display() {
        assert_eq!(Dialect::Postgres.to_string(), "postgres");
        assert_eq!(Dialect::SqlServer.to_string(), "sqlserver");
    }

    #[test]
    fn quoting_differs_per_dialect() {
        assert_eq!(Dialect::Postgres.quote_identifier("x"), "\"x\"");
        assert_eq!(Dialect::MySql.quote_identifier("x"), "`x`");
        assert_eq!(Dialect::SqlServer.quote_identifier("x"), "[x]");
        assert_eq!(Dialect::Sqlite.quote_identifier("x"), "\"x\"");
    }
}
