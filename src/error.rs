//! Stable error taxonomy for the query builder.
//!
//! Builder methods never fail — they return the builder itself. Errors only
//! surface at serialization (`to_sql`) or at the external execution step, via
//! [`QueryError`].

use thiserror::Error;

use crate::dialect::Dialect;

pub type QueryResult<T> = Result<T, QueryError>;

/// Errors produced while composing or serializing a statement.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A sub-select was handed to an execution method directly instead of
    /// being embedded inside another statement.
    #[error("sub-query cannot be executed directly")]
    SubQueryExecutedDirectly,

    /// An aggregate function was rendered with no column/expression argument.
    #[error("aggregate {0} requires at least one argument")]
    AggregateMissingArgs(&'static str),

    /// The active dialect has no strategy entry for the requested operation.
    #[error("{operation} is not supported on dialect {dialect}")]
    DialectUnsupportedOperation {
        operation: &'static str,
        dialect: Dialect,
    },

    /// An aggregate function name has no known rendering on any dialect.
    #[error("unknown aggregate function: {0}")]
    AggregateUnsupportedFunction(String),

    /// A `DialectStrategy` was queried for a dialect it carries no config for.
    #[error("no dialect handler registered for {0}")]
    DialectHandlerMissing(Dialect),

    /// An ORDER BY item had neither a column name nor an expression.
    #[error("ORDER BY item is missing a column or expression")]
    OrderMissingColumnOrExpression,

    /// A model argument passed where a pointer-to-struct-like value was
    /// required was not one (the Rust analogue: not `&T` for a plain struct).
    #[error("model value must be a reference to a struct")]
    ModelMustBePointerToStruct,

    /// A primary key field had a type this crate does not know how to bind.
    #[error("primary key field has an unsupported type")]
    PrimaryKeyUnsupportedType,

    /// A condition this crate considers a programming error rather than a
    /// user-facing usage mistake (composite-PK misuse, malformed schema).
    #[error("invariant violated: {0}")]
    InvariantViolated(String),

    /// A duplicate-key violation translated from the driver.
    #[error("record already exists")]
    RecordAlreadyExists,

    /// A foreign-key violation translated from the driver.
    #[error("foreign key violation")]
    ForeignKeyViolation,

    /// A "no rows" condition translated from a scan.
    #[error("record not found")]
    RecordNotFound,

    /// Any other driver error, passed through verbatim.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Well-known driver error classes the three documented translations key off
/// of. The caller's [`crate::executor::Executor`] implementation maps its
/// driver's native errors into one of these before calling
/// [`translate_driver_error`], since this crate has no driver of its own to
/// inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    DuplicateKey,
    ForeignKeyViolation,
    NoRows,
    Other,
}

/// Translate a driver error into the stable taxonomy, logging a warning for
/// the three well-known cases per the spec's error-visibility policy.
pub fn translate_driver_error(
    kind: DriverErrorKind,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> QueryError {
    match kind {
        DriverErrorKind::DuplicateKey => {
            tracing::warn!(error = %source, "duplicate key violation translated to RecordAlreadyExists");
            QueryError::RecordAlreadyExists
        }
        DriverErrorKind::ForeignKeyViolation => {
            tracing::warn!(error = %source, "foreign key violation translated to ForeignKeyViolation");
            QueryError::ForeignKeyViolation
        }
        DriverErrorKind::NoRows => {
            tracing::warn!("no-rows scan result translated to RecordNotFound");
            QueryError::RecordNotFound
        }
        DriverErrorKind::Other => QueryError::Driver(source),
    }
}
