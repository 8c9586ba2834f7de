//! Shared building blocks for `SqlDialect` implementations.

use crate::token::{Token, TokenStream};

// === Identifier quoting ===

pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// === Boolean formatting ===

pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// === Pagination ===

pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    if let Some(lim) = limit {
        ts.push(Token::Limit).space().push(Token::Raw(lim.to_string()));
    }
    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset).space().push(Token::Raw(off.to_string()));
    }
    ts
}

/// `OFFSET m ROWS FETCH NEXT n ROWS ONLY` - T-SQL style pagination.
pub fn emit_limit_offset_fetch(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    let off = offset.unwrap_or(0);
    ts.push(Token::Offset)
        .space()
        .push(Token::Raw(off.to_string()))
        .space()
        .push(Token::Rows);
    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .push(Token::Raw(lim.to_string()))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }
    ts
}

// === Function name remapping ===

pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "ARRAY_AGG" => Some("ARRAY_AGG"),
        "JSON_OBJECT_AGG" => Some("JSON_OBJECT_AGG"),
        "JSON_ARRAY_AGG" => Some("JSON_AGG"),
        _ => None,
    }
}

pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "STRING_AGG" => Some("GROUP_CONCAT"),
        "JSON_OBJECT_AGG" => Some("JSON_OBJECTAGG"),
        "JSON_ARRAY_AGG" => Some("JSON_ARRAYAGG"),
        "ARRAY_AGG" => Some("JSON_ARRAYAGG"),
        _ => None,
    }
}

pub fn remap_function_sqlite(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "STRING_AGG" => Some("GROUP_CONCAT"),
        "ARRAY_AGG" => Some("JSON_GROUP_ARRAY"),
        "JSON_OBJECT_AGG" => Some("JSON_GROUP_OBJECT"),
        "JSON_ARRAY_AGG" => Some("JSON_GROUP_ARRAY"),
        _ => None,
    }
}
