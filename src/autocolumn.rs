//! The auto-column registry: lifecycle hooks that populate well-known
//! columns (generated ids, timestamps, audit columns) at the exact
//! statement-type boundary, plus the soft-delete column convention.
//!
//! Instance-scoped per [`crate::db::Db`] handle, not process-global: two
//! `Db` values may carry independently configured registries.

use std::collections::HashMap;

use crate::hooks::{Clock, IdGenerator};
use crate::schema::TableSchema;
use crate::value::Value;

/// Everything a hook needs to decide what value (if any) to populate.
pub struct HookContext<'a> {
    pub schema: &'a TableSchema,
    pub operator: Option<&'a str>,
    pub clock: &'a dyn Clock,
    pub id_generator: &'a dyn IdGenerator,
    /// Columns already explicitly assigned by the caller before hooks run;
    /// a hook only fires for a column absent here or zero-valued.
    pub existing: &'a HashMap<String, Value>,
}

pub type Hook = fn(&HookContext) -> Option<Value>;

/// A `(column, on-insert?, on-update?)` triple. `insert_only` columns
/// (`id`, `created_at`, `created_by`) are excluded from UPDATE's SET list
/// even when an `on_update` hook is absent, per §4.7.
#[derive(Clone)]
pub struct AutoColumnDescriptor {
    pub column: String,
    pub on_insert: Option<Hook>,
    pub on_update: Option<Hook>,
    pub insert_only: bool,
}

impl AutoColumnDescriptor {
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into(), on_insert: None, on_update: None, insert_only: false }
    }

    pub fn on_insert(mut self, hook: Hook) -> Self {
        self.on_insert = Some(hook);
        self
    }

    pub fn on_update(mut self, hook: Hook) -> Self {
        self.on_update = Some(hook);
        self
    }

    pub fn insert_only(mut self) -> Self {
        self.insert_only = true;
        self
    }
}

fn hook_id(ctx: &HookContext) -> Option<Value> {
    let is_zero = ctx.existing.get("id").map(Value::is_zero).unwrap_or(true);
    if is_zero {
        Some(Value::Text(ctx.id_generator.generate()))
    } else {
        None
    }
}

fn hook_created_at(ctx: &HookContext) -> Option<Value> {
    Some(Value::Timestamp(ctx.clock.now()))
}

fn hook_updated_at(ctx: &HookContext) -> Option<Value> {
    Some(Value::Timestamp(ctx.clock.now()))
}

fn hook_created_by(ctx: &HookContext) -> Option<Value> {
    ctx.operator.map(|op| Value::Text(op.to_string()))
}

fn hook_updated_by(ctx: &HookContext) -> Option<Value> {
    ctx.operator.map(|op| Value::Text(op.to_string()))
}

/// An ordered, instance-scoped set of auto-column descriptors plus the
/// soft-delete column name, if any.
#[derive(Clone, Default)]
pub struct AutoColumnRegistry {
    descriptors: Vec<AutoColumnDescriptor>,
    soft_delete_column: Option<String>,
}

impl AutoColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in descriptors: `id`, `created_at`/`updated_at`,
    /// `created_by`/`updated_by`.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(AutoColumnDescriptor::new("id").on_insert(hook_id).insert_only())
            .register(AutoColumnDescriptor::new("created_at").on_insert(hook_created_at).insert_only())
            .register(AutoColumnDescriptor::new("updated_at").on_insert(hook_updated_at).on_update(hook_updated_at))
            .register(AutoColumnDescriptor::new("created_by").on_insert(hook_created_by).insert_only())
            .register(AutoColumnDescriptor::new("updated_by").on_insert(hook_updated_by).on_update(hook_updated_by))
    }

    pub fn register(mut self, descriptor: AutoColumnDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn with_soft_delete(mut self, column: impl Into<String>) -> Self {
        self.soft_delete_column = Some(column.into());
        self
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete_column.as_deref()
    }

    /// Fire every applicable `on_insert` hook, inserting into `assignments`
    /// any column the caller hasn't already set explicitly.
    pub fn apply_insert(&self, ctx: &HookContext, assignments: &mut HashMap<String, Value>) {
        for d in &self.descriptors {
            if !ctx.schema.has_column(&d.column) {
                continue;
            }
            if let Some(hook) = d.on_insert {
                if let Some(value) = hook(ctx) {
                    assignments.entry(d.column.clone()).or_insert(value);
                }
            }
        }
    }

    /// Fire every applicable `on_update` hook. Insert-only columns are never
    /// considered, even if the caller passed one explicitly in `assignments`
    /// — callers are expected to have filtered those out already.
    pub fn apply_update(&self, ctx: &HookContext, assignments: &mut HashMap<String, Value>) {
        for d in &self.descriptors {
            if d.insert_only || !ctx.schema.has_column(&d.column) {
                continue;
            }
            if let Some(hook) = d.on_update {
                if let Some(value) = hook(ctx) {
                    assignments.insert(d.column.clone(), value);
                }
            }
        }
    }

    /// Columns excluded from an UPDATE's auto-generated SET list.
    pub fn insert_only_columns(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().filter(|d| d.insert_only).map(|d| d.column.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{SystemClock, UuidGenerator};
    use crate::schema::{Field, TableSchema};

    #[test]
    fn id_populated_only_when_zero() {
        let registry = AutoColumnRegistry::with_defaults();
        let schema =
            TableSchema::new("users", "User", vec![Field::new("id").pk(), Field::new("name"), Field::new("created_at")]);
        let clock = SystemClock;
        let id_gen = UuidGenerator;
        let existing = HashMap::new();
        let ctx = HookContext { schema: &schema, operator: None, clock: &clock, id_generator: &id_gen, existing: &existing };
        let mut assignments = HashMap::new();
        registry.apply_insert(&ctx, &mut assignments);
        assert!(assignments.contains_key("id"));
        assert!(assignments.contains_key("created_at"));
        assert!(!assignments.contains_key("created_by"));
    }

    #[test]
    fn update_excludes_insert_only_columns() {
        let registry = AutoColumnRegistry::with_defaults();
        let schema = TableSchema::new("users", "User", vec![Field::new("id").pk(), Field::new("updated_at")]);
        let clock = SystemClock;
        let id_gen = UuidGenerator;
        let existing = HashMap::new();
        let ctx = HookContext { schema: &schema, operator: Some("alice"), clock: &clock, id_generator: &id_gen, existing: &existing };
        let mut assignments = HashMap::new();
        registry.apply_update(&ctx, &mut assignments);
        assert!(!assignments.contains_key("id"));
        assert!(assignments.contains_key("updated_at"));
    }
}
