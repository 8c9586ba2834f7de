//! Statement builders: one fluent, consuming type per SQL statement kind.

pub mod conflict;
pub mod delete;
pub mod insert;
pub mod join;
pub mod merge;
pub mod raw;
pub mod select;
pub mod update;

pub use conflict::{ConflictAction, ConflictBuilder, ConflictTarget, DoUpdateBuilder, OnConflict};
pub use delete::Delete;
pub use insert::Insert;
pub use join::{Join, JoinSource, JoinType, RelationSpec};
pub use merge::Merge;
pub use raw::Raw;
pub use select::Select;
pub use update::Update;
