//! UPDATE statement builder.

use crate::error::{Error, Result};
use crate::expr::{Expr, GroupTag, ParameterList};
use crate::render;
use crate::schema::{Schema, Table};

use super::insert::check_assignable;
use super::select::check_condition;
use super::Statement;

/// An UPDATE statement builder.
#[derive(Debug, Clone)]
pub struct Update {
    table: Table,
    params: ParameterList,
    sets: Vec<(String, Expr)>,
    filter: Option<Expr>,
}

impl Update {
    /// Creates an UPDATE against the named table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if the table does not exist.
    pub fn new(schema: &Schema, table: &str) -> Result<Self> {
        Ok(Self {
            table: schema.get(table)?.clone(),
            params: ParameterList::empty(),
            sets: Vec::new(),
            filter: None,
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
    /// column, or [`Error::TypeMismatch`] for a type or nullability
    /// violation.
    pub fn set(mut self, column: &str, expr: Expr) -> Result<Self> {
        let ty = self.table.get(column)?.ty;
        if self.sets.iter().any(|(name, _)| name == column) {
            return Err(Error::DuplicateAssignment {
                table: self.table.name().into(),
                column: column.into(),
            });
        }
        check_assignable(self.table.name(), column, &ty, &expr)?;
        self.sets.push((column.into(), expr));
        Ok(self)
    }

    /// Sets the WHERE condition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a nullable or non-bool
    /// condition, or [`Error::MixedGrouping`] for a grouped one.
    pub fn filter(mut self, condition: Expr) -> Result<Self> {
        check_condition("WHERE", &condition)?;
        if matches!(
            condition.group_tag(),
            GroupTag::Grouped | GroupTag::Aggregated
        ) {
            return Err(Error::MixedGrouping(String::from("WHERE")));
        }
        self.filter = Some(condition);
        Ok(self)
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if no column is assigned.
    pub fn build(self) -> Result<Statement> {
        if self.sets.is_empty() {
            return Err(Error::TypeMismatch {
                operator: String::from("UPDATE"),
                expected: String::from("at least one SET assignment"),
                found: String::from("none"),
            });
        }

        let mut sql = String::from("UPDATE ");
        sql.push_str(self.table.name());
        sql.push_str(" SET ");
        let sets: Vec<String> = self
            .sets
            .iter()
            .map(|(column, expr)| format!("{column} = {}", render::expr_sql(expr)))
            .collect();
        sql.push_str(&sets.join(", "));

        if let Some(ref filter) = self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&render::expr_sql(filter));
        }

        Ok(Statement::new(sql, self.params, Vec::new()))
    }
}
