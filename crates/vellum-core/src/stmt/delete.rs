//! DELETE statement builder.

use crate::error::{Error, Result};
use crate::expr::{Expr, GroupTag, ParameterList};
use crate::render;
use crate::schema::{Schema, Table};

use super::select::check_condition;
use super::Statement;

/// A DELETE statement builder.
#[derive(Debug, Clone)]
pub struct Delete {
    table: Table,
    params: ParameterList,
    filter: Option<Expr>,
}

impl Delete {
    /// Creates a DELETE against the named table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTable`] if the table does not exist.
    pub fn new(schema: &Schema, table: &str) -> Result<Self> {
        Ok(Self {
            table: schema.get(table)?.clone(),
            params: ParameterList::empty(),
            filter: None,
        })
    }

    /// Declares the parameter list for this statement.
    #[must_use]
    pub fn params(mut self, params: ParameterList) -> Self {
        self.params = params;
        self
    }

    /// Sets the WHERE condition. Without one, every row is deleted.
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
    #[must_use]
    pub fn build(self) -> Statement {
        let mut sql = String::from("DELETE FROM ");
        sql.push_str(self.table.name());
        if let Some(ref filter) = self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&render::expr_sql(filter));
        }
        Statement::new(sql, self.params, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprContext;
    use crate::types::{ColumnType, ScalarType};

    #[test]
    fn test_delete_with_filter() {
        let schema = Schema::new()
            .table(
                Table::new("sessions")
                    .column("token", ColumnType::new(ScalarType::Uuid))
                    .unwrap(),
            )
            .unwrap();
        let scope = schema.scope(&["sessions"]).unwrap();
        let params = ParameterList::new(vec![ColumnType::new(ScalarType::Uuid)]);
        let ctx = ExprContext::new(&scope, &params);

        let stmt = Delete::new(&schema, "sessions")
            .unwrap()
            .params(params.clone())
            .filter(
                ctx.column("token")
                    .unwrap()
                    .eq(ctx.parameter(1).unwrap())
                    .unwrap(),
            )
            .unwrap()
            .build();
        assert_eq!(
            stmt.sql(),
            "DELETE FROM sessions WHERE (sessions.token = $1)"
        );
    }

    #[test]
    fn test_delete_without_filter() {
        let schema = Schema::new()
            .table(Table::new("sessions"))
            .unwrap();
        let stmt = Delete::new(&schema, "sessions").unwrap().build();
        assert_eq!(stmt.sql(), "DELETE FROM sessions");
    }
}
