//! Table catalog and name resolution.
//!
//! A [`Schema`] is an ordered, immutable set of [`Table`]s built once at
//! startup. Statement builders resolve identifiers against a [`Scope`],
//! the subset of tables visible to one statement.

use crate::error::{Error, Result};
use crate::types::ColumnType;

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// The column's type.
    pub ty: ColumnType,
}

impl Column {
    /// Creates a new column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A table definition: an ordered set of columns with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if the name is already defined.
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Result<Self> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(Error::DuplicateColumn {
                table: self.name.clone(),
                column: name,
            });
        }
        self.columns.push(Column::new(name, ty));
        Ok(self)
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns in definition order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] if no column has that name.
    pub fn get(&self, column: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .ok_or_else(|| Error::UnknownColumn {
                table: self.name.clone(),
                column: column.into(),
            })
    }
}

/// A catalog of tables with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Adds a table definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTable`] if the name is already defined.
    pub fn table(mut self, table: Table) -> Result<Self> {
        if self.tables.iter().any(|t| t.name == table.name) {
            return Err(Error::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(self)
    }

    /// Returns the tables in definition order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Looks up a table by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if no table has that name.
    pub fn get(&self, table: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .ok_or_else(|| Error::UnknownTable(table.into()))
    }

    /// Builds a scope over the named tables, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if any name does not resolve, or
    /// [`Error::DuplicateTable`] if a name is listed twice.
    pub fn scope(&self, tables: &[&str]) -> Result<Scope> {
        let mut resolved = Vec::with_capacity(tables.len());
        for name in tables {
            let table = self.get(name)?.clone();
            if resolved.iter().any(|t: &Table| t.name == table.name) {
                return Err(Error::DuplicateTable(table.name));
            }
            resolved.push(table);
        }
        Ok(Scope { tables: resolved })
    }
}

/// The set of tables visible to one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    tables: Vec<Table>,
}

impl Scope {
    /// Creates a scope with no tables, for statements whose expressions
    /// reference only literals and parameters (INSERT values, for one).
    #[must_use]
    pub const fn empty() -> Self {
        Self { tables: Vec::new() }
    }

    /// Returns the tables in scope, in order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Resolves a qualified `(table, column)` reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] or [`Error::UnknownColumn`] if the
    /// reference does not resolve within this scope.
    pub fn resolve(&self, table: &str, column: &str) -> Result<ColumnType> {
        let table = self
            .tables
            .iter()
            .find(|t| t.name() == table)
            .ok_or_else(|| Error::UnknownTable(table.into()))?;
        Ok(table.get(column)?.ty)
    }

    /// Resolves an unqualified column reference.
    ///
    /// Legal only when exactly one table in scope defines the column.
    /// Returns the owning table's name together with the column type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] if no table defines the column, or
    /// [`Error::AmbiguousColumn`] if more than one does.
    pub fn resolve_unqualified(&self, column: &str) -> Result<(&str, ColumnType)> {
        let mut found = None;
        for table in &self.tables {
            if let Some(col) = table.columns().iter().find(|c| c.name == column) {
                if found.is_some() {
                    return Err(Error::AmbiguousColumn(column.into()));
                }
                found = Some((table.name(), col.ty));
            }
        }
        found.ok_or_else(|| Error::UnknownColumn {
            table: String::from("<scope>"),
            column: column.into(),
        })
    }
}
