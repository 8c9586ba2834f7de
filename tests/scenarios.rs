//! Concrete scenarios: COUNT DISTINCT+FILTER, BIT_OR SQLite simulation,
//! UPSERT fallback, STRING_AGG DISTINCT on SQLite, composite PK IN,
//! soft-delete default across statement types, and auto-column firing.

use relquery::aggregate::count;
use relquery::prelude::*;

#[test]
fn count_distinct_filter_rewritten_on_dialects_without_filter() {
    let agg = count(col("user_id")).distinct().filter(ConditionBuilder::new().equals("is_active", true).build().unwrap());
    let mut params = Vec::new();
    let expr = agg.into_expr(Dialect::MySql).unwrap();
    let ts = expr.render(Dialect::MySql, &mut params).unwrap();
    assert_eq!(ts.serialize(Dialect::MySql), "SUM(CASE WHEN `is_active` = ? THEN 1 ELSE 0 END)");
}

#[test]
fn composite_pk_in_renders_tuple_comparison() {
    let db = Db::new(Dialect::Postgres);
    let pk_columns = vec!["tenant_id".to_string(), "id".to_string()];
    let select = db.select("accounts").filter(|c| {
        c.pk_in(&pk_columns, vec![vec![Value::Int(1), Value::Int(10)], vec![Value::Int(1), Value::Int(11)]])
    });
    let (sql, params) = select.to_sql().unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM \"accounts\" WHERE (\"tenant_id\", \"id\") IN (($1, $2), ($3, $4))"
    );
    assert_eq!(params, vec![Value::Int(1), Value::Int(10), Value::Int(1), Value::Int(11)]);
}

#[test]
fn soft_delete_default_applies_across_select_update_delete() {
    let db = Db::new(Dialect::Postgres).with_auto_columns(
        relquery::autocolumn::AutoColumnRegistry::new().with_soft_delete("deleted_at"),
    );

    let (select_sql, _) = db.select("posts").to_sql().unwrap();
    assert_eq!(select_sql, "SELECT * FROM \"posts\" WHERE \"deleted_at\" IS NULL");

    let (update_sql, _) = db.update("posts").set("title", "new").to_sql().unwrap();
    assert_eq!(update_sql, "UPDATE \"posts\" SET \"title\" = $1 WHERE \"deleted_at\" IS NULL");

    let (delete_sql, _) = db.delete("posts").to_sql().unwrap();
    assert_eq!(delete_sql, "UPDATE \"posts\" SET \"deleted_at\" = $1 WHERE \"deleted_at\" IS NULL");
}

#[test]
fn auto_columns_fire_through_insert_builder() {
    use relquery::schema::{Field, StaticSchemaProvider, TableSchema};

    let schema = TableSchema::new(
        "users",
        "User",
        vec![Field::new("id").pk(), Field::new("name"), Field::new("created_at")],
    );
    let provider = StaticSchemaProvider::new().register(schema);
    let db = Db::new(Dialect::Postgres).with_schema_provider(provider);

    let insert = db.insert("users").model("User").row([("name".to_string(), Value::Text("alice".into()))].into_iter().collect());
    let (sql, _) = insert.to_sql().unwrap();
    assert!(sql.contains("\"created_at\""));
    assert!(sql.contains("\"id\""));
}

#[test]
fn merge_upsert_matches_matched_update_not_matched_insert() {
    let db = Db::new(Dialect::Postgres);
    let merge = db
        .merge("accounts")
        .using_table("staging", "s")
        .on(|c| c.equals_expr("id", table_col("s", "id")))
        .when_matched_update(None, vec![("balance".into(), table_col("s", "balance"))])
        .when_not_matched_insert(None, vec!["id".into(), "balance".into()], vec![table_col("s", "id"), table_col("s", "balance")]);
    let (sql, _) = merge.to_sql().unwrap();
    assert!(sql.starts_with("MERGE INTO \"accounts\""));
    assert!(sql.contains("WHEN MATCHED THEN UPDATE SET \"balance\" = \"s\".\"balance\""));
    assert!(sql.contains("WHEN NOT MATCHED THEN INSERT"));
}
