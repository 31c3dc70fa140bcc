//! CREATE TABLE statement builder.

use crate::error::{Error, Result};
use crate::expr::{Expr, ParameterList};
use crate::render;
use crate::schema::Table;
use crate::types::Presence;

use super::Statement;

/// A CREATE TABLE statement builder.
///
/// Renders the DDL for a [`Table`] definition. Every column declared with
/// `Presence::HasDefault` must be given a default expression whose scalar
/// type matches the column's.
#[derive(Debug, Clone)]
pub struct CreateTable {
    table: Table,
    defaults: Vec<(String, Expr)>,
}

impl CreateTable {
    /// Creates a builder for the given table definition.
    #[must_use]
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            defaults: Vec::new(),
        }
    }

    /// Provides the default expression for a `HasDefault` column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDefault`] if the column is `Required`,
    /// [`Error::TypeMismatch`] if the expression's scalar type or
    /// nullability does not fit the column, or a resolution error for an
    /// unknown or already-defaulted column.
    pub fn default_value(mut self, column: &str, expr: Expr) -> Result<Self> {
        let ty = self.table.get(column)?.ty;
        if self.defaults.iter().any(|(name, _)| name == column) {
            return Err(Error::DuplicateAssignment {
                table: self.table.name().into(),
                column: column.into(),
            });
        }
        if ty.presence != Presence::HasDefault {
            return Err(Error::NoDefault {
                table: self.table.name().into(),
                column: column.into(),
            });
        }
        if !expr.scalar().same_scalar(&ty.scalar) {
            return Err(Error::TypeMismatch {
                operator: format!("DEFAULT for {}.{column}", self.table.name()),
                expected: ty.scalar.to_string(),
                found: expr.ty().to_string(),
            });
        }
        if expr.is_nullable() && !ty.nullable {
            return Err(Error::TypeMismatch {
                operator: format!("DEFAULT for {}.{column}", self.table.name()),
                expected: String::from("non-nullable expression"),
                found: expr.ty().to_string(),
            });
        }
        self.defaults.push((column.into(), expr));
        Ok(self)
    }

    /// Renders the DDL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDefault`] if a `HasDefault` column was
    /// given no default expression.
    pub fn build(self) -> Result<Statement> {
        let mut defs = Vec::with_capacity(self.table.columns().len());
        for column in self.table.columns() {
            let mut def = format!("{} {}", column.name, column.ty.scalar.type_name());
            if !column.ty.nullable {
                def.push_str(" NOT NULL");
            }
            match column.ty.presence {
                Presence::Required => {}
                Presence::HasDefault => {
                    let expr = self
                        .defaults
                        .iter()
                        .find(|(name, _)| *name == column.name)
                        .map(|(_, expr)| expr)
                        .ok_or_else(|| Error::MissingDefault {
                            table: self.table.name().into(),
                            column: column.name.clone(),
                        })?;
                    def.push_str(" DEFAULT ");
                    def.push_str(&render::expr_sql(expr));
                }
            }
            defs.push(def);
        }

        let sql = format!("CREATE TABLE {} ({})", self.table.name(), defs.join(", "));
        Ok(Statement::new(sql, ParameterList::empty(), Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnType, ScalarType};

    fn table() -> Table {
        Table::new("events")
            .column("id", ColumnType::new(ScalarType::Int8))
            .unwrap()
            .column("kind", ColumnType::new(ScalarType::Varchar(40.try_into().unwrap())))
            .unwrap()
            .column("seen", ColumnType::new(ScalarType::Bool).with_default())
            .unwrap()
            .column("note", ColumnType::new(ScalarType::Varchar(100.try_into().unwrap())).nullable())
            .unwrap()
    }

    #[test]
    fn test_create_table_rendering() {
        let stmt = CreateTable::new(&table())
            .default_value("seen", Expr::bool(false))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "CREATE TABLE events (id int8 NOT NULL, kind varchar(40) NOT NULL, \
             seen bool NOT NULL DEFAULT FALSE, note varchar(100))"
        );
    }

    #[test]
    fn test_missing_default_is_rejected() {
        let err = CreateTable::new(&table()).build().unwrap_err();
        assert_eq!(
            err,
            Error::MissingDefault {
                table: String::from("events"),
                column: String::from("seen"),
            }
        );
    }

    #[test]
    fn test_default_for_required_column_is_rejected() {
        let err = CreateTable::new(&table())
            .default_value("kind", Expr::text("x"))
            .unwrap_err();
        assert!(matches!(err, Error::NoDefault { .. }));
    }

    #[test]
    fn test_default_type_is_checked() {
        let err = CreateTable::new(&table())
            .default_value("seen", Expr::int4(1))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
