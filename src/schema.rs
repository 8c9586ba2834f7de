//! Table schema: the caller-supplied description of a Rust model's backing
//! table. This crate never reflects over structs at runtime; callers hand in
//! a `TableSchema` (directly, or through a [`TableSchemaProvider`]) and the
//! builders read it as plain data.

use std::collections::HashMap;

/// One column of a table as seen by the query builder.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub is_pk: bool,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_pk: false }
    }

    pub fn pk(mut self) -> Self {
        self.is_pk = true;
        self
    }
}

/// The schema of a model's backing table: name, alias, column set, and the
/// primary-key subset (possibly composite).
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub alias: String,
    pub model_name: String,
    pub fields: Vec<Field>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, model_name: impl Into<String>, fields: Vec<Field>) -> Self {
        let name = name.into();
        Self { alias: name.clone(), name, model_name: model_name.into(), fields }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn pks(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.is_pk).collect()
    }

    pub fn pk_names(&self) -> Vec<String> {
        self.pks().into_iter().map(|f| f.name.clone()).collect()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field_map(&self) -> HashMap<&str, &Field> {
        self.fields.iter().map(|f| (f.name.as_str(), f)).collect()
    }
}

/// Supplies a [`TableSchema`] by model name. Model identity here is a plain
/// string rather than `TypeId` reflection: this crate has no access to the
/// caller's struct definitions, so the caller names its own models.
pub trait TableSchemaProvider: Send + Sync {
    fn table_of(&self, model_name: &str) -> Option<TableSchema>;
}

/// A provider backed by a static map, registered once at construction.
#[derive(Debug, Default, Clone)]
pub struct StaticSchemaProvider {
    tables: HashMap<String, TableSchema>,
}

impl StaticSchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, schema: TableSchema) -> Self {
        self.tables.insert(schema.model_name.clone(), schema);
        self
    }
}

impl TableSchemaProvider for StaticSchemaProvider {
    fn table_of(&self, model_name: &str) -> Option<TableSchema> {
        self.tables.get(model_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_pk_lookup() {
        let schema = TableSchema::new(
            "items",
            "Item",
            vec![Field::new("tenant_id").pk(), Field::new("id").pk(), Field::new("name")],
        );
        assert_eq!(schema.pk_names(), vec!["tenant_id", "id"]);
        assert!(schema.has_column("name"));
        assert!(!schema.has_column("missing"));
    }

    #[test]
    fn static_provider_roundtrip() {
        let schema = TableSchema::new("users", "User", vec![Field::new("id").pk()]);
        let provider = StaticSchemaProvider::new().register(schema);
        assert!(provider.table_of("User").is_some());
        assert!(provider.table_of("Other").is_none());
    }
}
