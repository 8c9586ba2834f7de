//! MySQL dialect.

use super::helpers;
use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, _ordinal: usize) -> String {
        "?".into()
    }

    fn concat_operator(&self) -> &'static str {
        "||"
    }

    fn supports_concat_operator(&self) -> bool {
        // MySQL's `||` is logical OR unless PIPES_AS_CONCAT is set; always
        // use CONCAT() instead.
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn supports_is_true_false(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_multi_table_update(&self) -> bool {
        true
    }

    fn supports_skip_locked(&self) -> bool {
        true
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }
}
