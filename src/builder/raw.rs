//! Pass-through builder for literal SQL plus positional parameters. Used for
//! statements this crate has no typed builder for.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::executor::{Executor, Row};
use crate::value::Value;

#[derive(Debug, Clone)]
#[must_use]
pub struct Raw {
    dialect: Dialect,
    template: String,
    params: Vec<Value>,
}

impl Raw {
    pub(crate) fn new(dialect: Dialect, template: String) -> Self {
        Self { dialect, template, params: Vec::new() }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        (self.template.clone(), self.params.clone())
    }

    pub fn exec(&self, executor: &dyn Executor) -> QueryResult<u64> {
        executor.exec(&self.template, &self.params)
    }

    pub fn rows(&self, executor: &dyn Executor) -> QueryResult<Vec<Row>> {
        executor.rows(&self.template, &self.params)
    }

    pub fn scan(&self, executor: &dyn Executor) -> QueryResult<Option<Row>> {
        executor.scan(&self.template, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_are_passed_through_unaltered() {
        let raw = Raw::new(Dialect::Postgres, "SELECT * FROM users WHERE id = $1".into()).bind(7i64);
        let (sql, params) = raw.to_sql();
        assert_eq!(sql, "SELECT * FROM users WHERE id = $1");
        assert_eq!(params, vec![Value::Int(7)]);
    }
}
