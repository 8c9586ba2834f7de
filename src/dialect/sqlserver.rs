//! SQL Server (T-SQL) dialect.
//!
//! Partial, same caveat as [`super::oracle`]: only the documented subset of
//! features is implemented; everything else errors rather than guessing.

use super::helpers;
use super::SqlDialect;
use crate::token::TokenStream;

#[derive(Debug, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!("@p{}", ordinal)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_fetch(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn supports_is_true_false(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        // SQL Server uses OUTPUT, not RETURNING; not modelled as the same
        // clause, so the RETURNING path reports unsupported.
        false
    }

    fn supports_aggregate_filter(&self) -> bool {
        false
    }

    fn supports_merge(&self) -> bool {
        true
    }

    fn supports_multi_table_update(&self) -> bool {
        false
    }

    fn supports_skip_locked(&self) -> bool {
        false
    }
}
