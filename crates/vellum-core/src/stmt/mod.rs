//! Statement builders.
//!
//! Each builder validates its clauses against the catalog and hands a
//! finished [`Statement`] to the execution boundary: canonical SQL text,
//! the declared parameter types, and the declared result column types.

mod create_table;
mod delete;
mod insert;
mod select;
mod update;

pub use create_table::CreateTable;
pub use delete::Delete;
pub use insert::Insert;
pub use select::{OrderDirection, Select};
pub use update::Update;

use crate::expr::ParameterList;
use crate::types::ColumnType;

/// A validated, rendered statement.
///
/// Immutable after construction; the renderer has already run, so the
/// text is fixed, and the parameter and result types are the contract
/// the execution boundary encodes and decodes against.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: ParameterList,
    result: Vec<ColumnType>,
}

impl Statement {
    pub(crate) const fn new(sql: String, params: ParameterList, result: Vec<ColumnType>) -> Self {
        Self {
            sql,
            params,
            result,
        }
    }

    /// Returns the canonical SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the declared parameter types.
    #[must_use]
    pub const fn params(&self) -> &ParameterList {
        &self.params
    }

    /// Returns the declared result column types.
    #[must_use]
    pub fn result_types(&self) -> &[ColumnType] {
        &self.result
    }
}
