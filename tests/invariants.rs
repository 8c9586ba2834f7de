//! Universal invariants (identifier safety, parameter isolation, dialect
//! closure, select-mode behaviour, predicate order, empty-IN, conflict
//! fallback) exercised end to end through the public `Db` façade.

use relquery::prelude::*;

#[test]
fn identifier_never_appears_unquoted() {
    let db = Db::new(Dialect::Postgres);
    let (sql, _) = db.select("accounts; DROP TABLE accounts").to_sql().unwrap();
    assert!(sql.contains("\"accounts; DROP TABLE accounts\""));
}

#[test]
fn parameter_values_never_inlined_in_sql_text() {
    let db = Db::new(Dialect::Postgres);
    let select = db.select("users").filter(|c| c.equals("email", "attacker@example.com"));
    let (sql, params) = select.to_sql().unwrap();
    assert!(!sql.contains("attacker@example.com"));
    assert_eq!(params, vec![Value::Text("attacker@example.com".into())]);
}

#[test]
fn dialect_closure_merge_rejected_on_mysql_and_sqlite() {
    for dialect in [Dialect::MySql, Dialect::Sqlite] {
        let db = Db::new(dialect);
        let merge = db.merge("t").using_table("s", "s").on(|c| c.equals_expr("id", col("id"))).when_matched_delete(None);
        let err = merge.to_sql().unwrap_err();
        assert!(matches!(err, QueryError::DialectUnsupportedOperation { .. }));
    }
}

#[test]
fn select_all_is_idempotent_and_exprs_are_additive() {
    let db = Db::new(Dialect::Postgres);
    let a = db.select("users").select_all().select_all().to_sql().unwrap();
    let b = db.select("users").select_all().to_sql().unwrap();
    assert_eq!(a, b);

    let with_extra = db.select("users").select_all().select_expr(col("id"), Some("dup_id".to_string())).to_sql().unwrap();
    assert_eq!(with_extra.0, "SELECT *, \"id\" AS \"dup_id\" FROM \"users\"");
}

#[test]
fn select_mode_only_last_base_mode_wins() {
    let db = Db::new(Dialect::Postgres);
    let (sql, _) = db.select("users").select(["id"]).select_all().select(["name"]).to_sql().unwrap();
    assert_eq!(sql, "SELECT \"name\" FROM \"users\"");
}

#[test]
fn predicates_render_in_call_order() {
    let db = Db::new(Dialect::Postgres);
    let select = db.select("orders").filter(|c| c.equals("x", 1i64).greater_than("y", 2i64));
    let (sql, params) = select.to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM \"orders\" WHERE \"x\" = $1 AND \"y\" > $2");
    assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn empty_in_list_never_matches() {
    let db = Db::new(Dialect::Postgres);
    let select = db.select("orders").filter(|c| c.in_list("status", Vec::<Value>::new()));
    let (sql, params) = select.to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM \"orders\" WHERE 1 = 0");
    assert!(params.is_empty());
}

#[test]
fn conflict_do_update_without_target_falls_back_to_do_nothing() {
    let db = Db::new(Dialect::Postgres);
    let insert = db
        .insert("users")
        .row([("email".to_string(), Value::Text("a@b.com".into()))].into_iter().collect())
        .on_conflict(OnConflict::no_target().do_update(|u| u.set("name", "updated")));
    let (sql, _) = insert.to_sql().unwrap();
    assert!(sql.ends_with("ON CONFLICT DO NOTHING"));
}
