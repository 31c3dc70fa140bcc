//! INSERT statement builder.

use crate::error::{Error, Result};
use crate::expr::{Expr, GroupTag, ParameterList};
use crate::render;
use crate::schema::{Schema, Table};
use crate::types::{ColumnType, Presence};

use super::Statement;

#[derive(Debug, Clone)]
enum Assignment {
    Value(Expr),
    Default,
}

/// An INSERT statement builder.
///
/// Every `Required` column must be assigned; `HasDefault` columns may be
/// omitted entirely or set to the DEFAULT keyword. Assigned expressions
/// must match the column's scalar type, and a nullable expression cannot
/// feed a non-nullable column.
#[derive(Debug, Clone)]
pub struct Insert {
    table: Table,
    params: ParameterList,
    assignments: Vec<(String, Assignment)>,
}

impl Insert {
    /// Creates an INSERT into the named table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if the table does not exist.
    pub fn new(schema: &Schema, table: &str) -> Result<Self> {
        Ok(Self {
            table: schema.get(table)?.clone(),
            params: ParameterList::empty(),
            assignments: Vec::new(),
        })
    }

    /// Declares the parameter list for this statement.
    #[must_use]
    pub fn params(mut self, params: ParameterList) -> Self {
        self.params = params;
        self
    }

    /// Assigns an expression to a column.
    ///
    /// # Errors
    ///
    /// Returns a resolution error for an unknown or already-assigned
    /// column, [`Error::TypeMismatch`] for a type or nullability
    /// violation, or [`Error::MixedGrouping`] for a grouped expression.
    pub fn set(mut self, column: &str, expr: Expr) -> Result<Self> {
        let ty = self.check_target(column)?;
        check_assignable(self.table.name(), column, &ty, &expr)?;
        self.assignments
            .push((column.into(), Assignment::Value(expr)));
        Ok(self)
    }

    /// Requests the column's default value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDefault`] if the column is `Required`, or a
    /// resolution error for an unknown or already-assigned column.
    pub fn set_default(mut self, column: &str) -> Result<Self> {
        let ty = self.check_target(column)?;
        if ty.presence != Presence::HasDefault {
            return Err(Error::NoDefault {
                table: self.table.name().into(),
                column: column.into(),
            });
        }
        self.assignments.push((column.into(), Assignment::Default));
        Ok(self)
    }

    fn check_target(&self, column: &str) -> Result<ColumnType> {
        let ty = self.table.get(column)?.ty;
        if self.assignments.iter().any(|(name, _)| name == column) {
            return Err(Error::DuplicateAssignment {
                table: self.table.name().into(),
                column: column.into(),
            });
        }
        Ok(ty)
    }

    /// Checks that all required columns are assigned and renders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredColumn`] naming the first omitted
    /// `Required` column.
    pub fn build(self) -> Result<Statement> {
        for column in self.table.columns() {
            if column.ty.presence == Presence::Required
                && !self.assignments.iter().any(|(name, _)| *name == column.name)
            {
                return Err(Error::MissingRequiredColumn {
                    table: self.table.name().into(),
                    column: column.name.clone(),
                });
            }
        }

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(self.table.name());
        sql.push_str(" (");
        let columns: Vec<&str> = self.assignments.iter().map(|(n, _)| n.as_str()).collect();
        sql.push_str(&columns.join(", "));
        sql.push_str(") VALUES (");
        let values: Vec<String> = self
            .assignments
            .iter()
            .map(|(_, a)| match a {
                Assignment::Value(expr) => render::expr_sql(expr),
                Assignment::Default => String::from("DEFAULT"),
            })
            .collect();
        sql.push_str(&values.join(", "));
        sql.push(')');

        Ok(Statement::new(sql, self.params, Vec::new()))
    }
}

pub(crate) fn check_assignable(
    table: &str,
    column: &str,
    ty: &ColumnType,
    expr: &Expr,
) -> Result<()> {
    if matches!(
        expr.group_tag(),
        GroupTag::Grouped | GroupTag::Aggregated
    ) {
        return Err(Error::MixedGrouping(format!("assignment to {table}.{column}")));
    }
    if !expr.scalar().same_scalar(&ty.scalar) {
        return Err(Error::TypeMismatch {
            operator: format!("assignment to {table}.{column}"),
            expected: ty.scalar.to_string(),
            found: expr.ty().to_string(),
        });
    }
    if expr.is_nullable() && !ty.nullable {
        return Err(Error::TypeMismatch {
            operator: format!("assignment to {table}.{column}"),
            expected: String::from("non-nullable expression"),
            found: expr.ty().to_string(),
        });
    }
    Ok(())
}
