//! The `Db` façade: the construction surface a caller uses to get
//! dialect-bound statement builders, and the home of everything that must
//! be instance-scoped rather than process-global (auto-column registry,
//! named-argument map, schema cache).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::autocolumn::{AutoColumnRegistry, HookContext};
use crate::builder::delete::Delete;
use crate::builder::insert::Insert;
use crate::builder::merge::Merge;
use crate::builder::raw::Raw;
use crate::builder::select::Select;
use crate::builder::update::Update;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::hooks::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::schema::{TableSchema, TableSchemaProvider};
use crate::value::Value;

struct DbInner {
    dialect: Dialect,
    schema_provider: Option<Arc<dyn TableSchemaProvider>>,
    auto_columns: Arc<AutoColumnRegistry>,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn IdGenerator>,
    named_args: HashMap<String, Value>,
    schema_cache: Arc<RwLock<HashMap<String, TableSchema>>>,
}

impl Clone for DbInner {
    fn clone(&self) -> Self {
        Self {
            dialect: self.dialect,
            schema_provider: self.schema_provider.clone(),
            auto_columns: self.auto_columns.clone(),
            clock: self.clock.clone(),
            id_generator: self.id_generator.clone(),
            named_args: self.named_args.clone(),
            schema_cache: self.schema_cache.clone(),
        }
    }
}

/// The entry point for building statements against one dialect.
///
/// Cheap to clone (everything but `named_args` is `Arc`-shared); cloning
/// shares the schema cache and auto-column registry across clones, which is
/// what lets `with_named_arg` be copy-on-write without re-fetching schema.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").field("dialect", &self.inner.dialect).finish_non_exhaustive()
    }
}

impl Db {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            inner: Arc::new(DbInner {
                dialect,
                schema_provider: None,
                auto_columns: Arc::new(AutoColumnRegistry::with_defaults()),
                clock: Arc::new(SystemClock),
                id_generator: Arc::new(UuidGenerator),
                named_args: HashMap::new(),
                schema_cache: Arc::new(RwLock::new(HashMap::new())),
            }),
        }
    }

    pub fn with_schema_provider(mut self, provider: impl TableSchemaProvider + 'static) -> Self {
        Arc::make_mut(&mut self.inner).schema_provider = Some(Arc::new(provider));
        self
    }

    pub fn with_auto_columns(mut self, registry: AutoColumnRegistry) -> Self {
        Arc::make_mut(&mut self.inner).auto_columns = Arc::new(registry);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        Arc::make_mut(&mut self.inner).clock = Arc::new(clock);
        self
    }

    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        Arc::make_mut(&mut self.inner).id_generator = Arc::new(id_generator);
        self
    }

    /// Copy-on-write: returns a new `Db` with one more named argument bound;
    /// `self` is untouched. The "current operator" binding (`operator`) and
    /// any other caller-supplied named value flow through this map.
    pub fn with_named_arg(&self, name: impl Into<String>, value: impl Into<Value>) -> Db {
        let mut inner = (*self.inner).clone();
        inner.named_args.insert(name.into(), value.into());
        Db { inner: Arc::new(inner) }
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    pub fn operator(&self) -> Option<&str> {
        self.named_arg("operator")
    }

    pub fn named_arg(&self, name: &str) -> Option<&str> {
        match self.inner.named_args.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn auto_columns(&self) -> &AutoColumnRegistry {
        &self.inner.auto_columns
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    pub fn id_generator(&self) -> &dyn IdGenerator {
        self.inner.id_generator.as_ref()
    }

    /// Look up (and cache) the schema for `model_name` via the registered
    /// [`TableSchemaProvider`].
    pub fn schema_of(&self, model_name: &str) -> QueryResult<TableSchema> {
        if let Some(schema) = self.inner.schema_cache.read().unwrap().get(model_name) {
            return Ok(schema.clone());
        }
        let provider = self
            .inner
            .schema_provider
            .as_ref()
            .ok_or_else(|| QueryError::InvariantViolated("no schema provider registered".into()))?;
        let schema = provider
            .table_of(model_name)
            .ok_or_else(|| QueryError::InvariantViolated(format!("no schema registered for model {model_name}")))?;
        self.inner.schema_cache.write().unwrap().insert(model_name.to_string(), schema.clone());
        Ok(schema)
    }

    pub fn hook_context<'a>(&'a self, schema: &'a TableSchema, existing: &'a HashMap<String, Value>) -> HookContext<'a> {
        HookContext { schema, operator: self.operator(), clock: self.clock(), id_generator: self.id_generator(), existing }
    }

    pub fn select(&self, table: impl Into<String>) -> Select {
        Select::new(self.clone(), table.into())
    }

    pub fn insert(&self, table: impl Into<String>) -> Insert {
        Insert::new(self.clone(), table.into())
    }

    pub fn update(&self, table: impl Into<String>) -> Update {
        Update::new(self.clone(), table.into())
    }

    pub fn delete(&self, table: impl Into<String>) -> Delete {
        Delete::new(self.clone(), table.into())
    }

    pub fn merge(&self, table: impl Into<String>) -> Merge {
        Merge::new(self.clone(), table.into())
    }

    pub fn raw(&self, template: impl Into<String>) -> Raw {
        Raw::new(self.dialect(), template.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_arg_is_copy_on_write() {
        let db = Db::new(Dialect::Postgres);
        let db2 = db.with_named_arg("operator", "alice");
        assert_eq!(db.operator(), None);
        assert_eq!(db2.operator(), Some("alice"));
    }
}
