//! Oracle dialect.
//!
//! Partial: covers identifier quoting, placeholder style, pagination, and the
//! aggregate/window feature flags this crate exercises. Anything beyond that
//! documented subset returns `DialectUnsupportedOperation` rather than
//! guessing at Oracle-specific syntax (see SPEC_FULL.md §9 open questions).

use super::helpers;
use super::SqlDialect;
use crate::token::TokenStream;

#[derive(Debug, Clone, Copy)]
pub struct OracleDialect;

impl SqlDialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, ordinal: usize) -> String {
        format!(":{}", ordinal)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_fetch(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    fn supports_is_true_false(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        true
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
        true
    }
}
