//! SQLite dialect.

use super::helpers;
use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".into()
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn supports_aggregate_filter(&self) -> bool {
        true
    }

    fn supports_groups_frame(&self) -> bool {
        true
    }

    fn supports_merge(&self) -> bool {
        false
    }

    fn supports_multi_table_update(&self) -> bool {
        false
    }

    fn supports_skip_locked(&self) -> bool {
        // SQLite has no row-level locking at all.
        false
    }

    fn supports_row_locking(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }
}
