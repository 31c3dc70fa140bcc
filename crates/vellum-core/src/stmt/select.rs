//! SELECT statement builder.

use crate::error::{Error, Result};
use crate::expr::{ColumnRef, Expr, GroupTag, Grouping, Node, ParameterList};
use crate::render;
use crate::schema::{Schema, Scope};
use crate::types::ScalarType;

use super::Statement;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A SELECT statement builder.
///
/// The scope is fixed at creation; GROUP BY may be declared once, which
/// moves the statement into grouped mode. Projections and clauses are
/// validated as they are added, and grouping consistency across clauses is
/// checked by [`Select::build`].
#[derive(Debug, Clone)]
pub struct Select {
    scope: Scope,
    params: ParameterList,
    grouping: Grouping,
    projections: Vec<(String, Expr)>,
    filter: Option<Expr>,
    having: Option<Expr>,
    order_by: Vec<(Expr, OrderDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// Creates a SELECT over the named tables.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if a table is unknown or listed twice.
    pub fn new(schema: &Schema, tables: &[&str]) -> Result<Self> {
        Ok(Self {
            scope: schema.scope(tables)?,
            params: ParameterList::empty(),
            grouping: Grouping::Ungrouped,
            projections: Vec::new(),
            filter: None,
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    /// Returns the statement's scope, for building expression contexts.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Declares the parameter list for this statement.
    #[must_use]
    pub fn params(mut self, params: ParameterList) -> Self {
        self.params = params;
        self
    }

    /// Declares GROUP BY over the given keys, entering grouped mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyGrouped`] on a second call, or a
    /// resolution error if a key is unknown in scope.
    pub fn group_by(mut self, keys: &[(&str, &str)]) -> Result<Self> {
        if self.grouping.is_grouped() {
            return Err(Error::AlreadyGrouped);
        }
        let mut resolved = Vec::with_capacity(keys.len());
        for (table, column) in keys {
            self.scope.resolve(table, column)?;
            resolved.push(ColumnRef::new(*table, *column));
        }
        self.grouping = Grouping::Grouped(resolved);
        Ok(self)
    }

    /// Adds a named projection.
    #[must_use]
    pub fn column(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.projections.push((alias.into(), expr));
        self
    }

    /// Sets the WHERE condition. It must be a non-nullable bool built
    /// before grouping applies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a nullable or non-bool
    /// condition, or [`Error::MixedGrouping`] for a grouped or
    /// aggregated one.
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

    /// Sets the HAVING condition, evaluated after grouping. Per-row
    /// references are illegal here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a nullable or non-bool
    /// condition, or [`Error::MixedGrouping`] for a per-row one.
    pub fn having(mut self, condition: Expr) -> Result<Self> {
        check_condition("HAVING", &condition)?;
        if condition.group_tag() == GroupTag::Ungrouped {
            return Err(Error::MixedGrouping(String::from("HAVING")));
        }
        self.having = Some(condition);
        Ok(self)
    }

    /// Adds an ORDER BY entry.
    #[must_use]
    pub fn order_by(mut self, expr: Expr, direction: OrderDirection) -> Self {
        self.order_by.push((expr, direction));
        self
    }

    /// Sets the LIMIT clause.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the OFFSET clause.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Validates grouping consistency and renders the statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for an empty projection list,
    /// [`Error::MixedGrouping`] if projections, ORDER BY, or HAVING
    /// entries combine per-row and aggregated expressions illegally,
    /// [`Error::KeyWithoutGroupBy`] if a grouping-key reference appears
    /// without a GROUP BY declaration, or [`Error::NotAGroupKey`] if a
    /// bare column under GROUP BY is not one of the declared keys.
    pub fn build(self) -> Result<Statement> {
        if self.projections.is_empty() {
            return Err(Error::TypeMismatch {
                operator: String::from("SELECT"),
                expected: String::from("at least one projection"),
                found: String::from("none"),
            });
        }
        self.check_tags()?;

        let mut sql = String::from("SELECT ");
        let projections: Vec<String> = self
            .projections
            .iter()
            .map(|(alias, expr)| format!("{} AS {alias}", render::expr_sql(expr)))
            .collect();
        sql.push_str(&projections.join(", "));

        sql.push_str(" FROM ");
        let tables: Vec<&str> = self.scope.tables().iter().map(|t| t.name()).collect();
        sql.push_str(&tables.join(", "));

        if let Some(ref filter) = self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&render::expr_sql(filter));
        }

        if let Grouping::Grouped(ref keys) = self.grouping {
            sql.push_str(" GROUP BY ");
            let keys: Vec<String> = keys
                .iter()
                .map(|k| format!("{}.{}", k.table, k.column))
                .collect();
            sql.push_str(&keys.join(", "));
        }

        if let Some(ref having) = self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&render::expr_sql(having));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let orders: Vec<String> = self
                .order_by
                .iter()
                .map(|(expr, dir)| format!("{} {}", render::expr_sql(expr), dir.as_str()))
                .collect();
            sql.push_str(&orders.join(", "));
        }

        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        if let Some(n) = self.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        let result = self.projections.iter().map(|(_, e)| *e.ty()).collect();
        Ok(Statement::new(sql, self.params, result))
    }

    fn check_tags(&self) -> Result<()> {
        let exprs = self
            .projections
            .iter()
            .map(|(_, e)| e)
            .chain(self.order_by.iter().map(|(e, _)| e))
            .chain(self.having.iter());
        if let Grouping::Grouped(ref keys) = self.grouping {
            for expr in exprs {
                if expr.group_tag() == GroupTag::Ungrouped {
                    return Err(Error::MixedGrouping(String::from("SELECT")));
                }
                // The context that built the expression may have been
                // grouped on different keys than this statement.
                check_key_membership(&expr.node, keys)?;
            }
        } else {
            // Without GROUP BY a statement is either per-row or an
            // implicit whole-table aggregation, never both, and a
            // grouping-key reference has nothing to resolve against.
            let mut saw_per_row = false;
            let mut saw_aggregate = false;
            for expr in exprs {
                match expr.group_tag() {
                    GroupTag::Grouped => {
                        return Err(Error::KeyWithoutGroupBy(String::from("SELECT")));
                    }
                    GroupTag::Ungrouped => saw_per_row = true,
                    GroupTag::Aggregated => saw_aggregate = true,
                    GroupTag::Neutral => {}
                }
            }
            if saw_per_row && saw_aggregate {
                return Err(Error::MixedGrouping(String::from("SELECT")));
            }
        }
        Ok(())
    }
}

/// Requires every bare column reference outside an aggregate to be one
/// of the declared grouping keys.
fn check_key_membership(node: &Node, keys: &[ColumnRef]) -> Result<()> {
    match node {
        Node::Column(reference) => {
            if keys.contains(reference) {
                Ok(())
            } else {
                Err(Error::NotAGroupKey {
                    table: reference.table.clone(),
                    column: reference.column.clone(),
                })
            }
        }
        Node::Literal(_) | Node::Parameter(_) | Node::Aggregate { .. } => Ok(()),
        Node::Unary { operand, .. } => check_key_membership(operand, keys),
        Node::Binary { left, right, .. } => {
            check_key_membership(left, keys)?;
            check_key_membership(right, keys)
        }
        Node::Function { args, .. } => {
            args.iter().try_for_each(|arg| check_key_membership(arg, keys))
        }
        Node::Case { branches, else_ } => {
            for (when, then) in branches {
                check_key_membership(when, keys)?;
                check_key_membership(then, keys)?;
            }
            check_key_membership(else_, keys)
        }
        Node::Cast { expr, .. } | Node::IsNull { expr, .. } => check_key_membership(expr, keys),
    }
}

pub(crate) fn check_condition(clause: &str, condition: &Expr) -> Result<()> {
    if !condition.scalar().same_scalar(&ScalarType::Bool) || condition.is_nullable() {
        return Err(Error::TypeMismatch {
            operator: clause.into(),
            expected: String::from("non-nullable bool condition"),
            found: condition.ty().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{agg, ExprContext};
    use crate::schema::Table;
    use crate::types::ColumnType;

    fn schema() -> Schema {
        Schema::new()
            .table(
                Table::new("employees")
                    .column("dept", ColumnType::new(ScalarType::Varchar(32.try_into().unwrap())))
                    .unwrap()
                    .column("salary", ColumnType::new(ScalarType::Numeric))
                    .unwrap()
                    .column("active", ColumnType::new(ScalarType::Bool))
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_simple_select() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        let stmt = select
            .column("dept", ctx.column("dept").unwrap())
            .filter(ctx.column("active").unwrap())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            stmt.sql(),
            "SELECT employees.dept AS dept FROM employees WHERE employees.active"
        );
        assert_eq!(stmt.result_types().len(), 1);
    }

    #[test]
    fn test_grouped_select() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);
        let grouped = ctx.grouped(&[("employees", "dept")]).unwrap();

        let stmt = select
            .group_by(&[("employees", "dept")])
            .unwrap()
            .column("dept", grouped.column("dept").unwrap())
            .column("total", agg::sum(ctx.column("salary").unwrap()).unwrap())
            .having(
                agg::count_star()
                    .gt(Expr::int8(1))
                    .unwrap(),
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            stmt.sql(),
            "SELECT employees.dept AS dept, sum(employees.salary) AS total \
             FROM employees GROUP BY employees.dept HAVING (count(*) > 1)"
        );
    }

    #[test]
    fn test_per_row_projection_under_grouping_fails() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        // Built before grouping, so per-row.
        let salary = ctx.column("salary").unwrap();
        let err = select
            .group_by(&[("employees", "dept")])
            .unwrap()
            .column("salary", salary)
            .build()
            .unwrap_err();
        assert_eq!(err, Error::MixedGrouping(String::from("SELECT")));
    }

    #[test]
    fn test_where_rejects_nullable_condition() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        let nullable = ctx
            .column("active")
            .unwrap()
            .eq(Expr::null(ScalarType::Bool))
            .unwrap();
        assert!(select.filter(nullable).is_err());
    }

    #[test]
    fn test_order_limit_offset() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        let stmt = select
            .column("dept", ctx.column("dept").unwrap())
            .order_by(ctx.column("salary").unwrap(), OrderDirection::Desc)
            .limit(10)
            .offset(5)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT employees.dept AS dept FROM employees \
             ORDER BY employees.salary DESC LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn test_key_reference_without_group_by_fails() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);
        let grouped = ctx.grouped(&[("employees", "dept")]).unwrap();

        // The key reference came from a grouped context, but the
        // statement itself never declared GROUP BY.
        let err = select
            .column("dept", grouped.column("dept").unwrap())
            .column("headcount", agg::count_star())
            .build()
            .unwrap_err();
        assert_eq!(err, Error::KeyWithoutGroupBy(String::from("SELECT")));
    }

    #[test]
    fn test_per_row_projection_with_aggregate_having_fails() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        let err = select
            .column("salary", ctx.column("salary").unwrap())
            .having(agg::count_star().gt(Expr::int8(1)).unwrap())
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err, Error::MixedGrouping(String::from("SELECT")));
    }

    #[test]
    fn test_grouped_select_rejects_foreign_key_reference() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::empty();
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        // Keyed on `active` in the context, on `dept` in the statement.
        let grouped = ctx.grouped(&[("employees", "active")]).unwrap();
        let err = select
            .group_by(&[("employees", "dept")])
            .unwrap()
            .column("active", grouped.column("active").unwrap())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            Error::NotAGroupKey {
                table: String::from("employees"),
                column: String::from("active"),
            }
        );
    }

    #[test]
    fn test_group_by_declared_once() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let err = select
            .group_by(&[("employees", "dept")])
            .unwrap()
            .group_by(&[("employees", "active")])
            .unwrap_err();
        assert_eq!(err, Error::AlreadyGrouped);
    }

    #[test]
    fn test_parameter_in_filter() {
        let schema = schema();
        let select = Select::new(&schema, &["employees"]).unwrap();
        let params = ParameterList::new(vec![ColumnType::new(ScalarType::Numeric)]);
        let scope = schema.scope(&["employees"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        let stmt = select
            .params(params.clone())
            .column("dept", ctx.column("dept").unwrap())
            .filter(
                ctx.column("salary")
                    .unwrap()
                    .gt(ctx.parameter(1).unwrap())
                    .unwrap(),
            )
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql(),
            "SELECT employees.dept AS dept FROM employees WHERE (employees.salary > $1)"
        );
        assert_eq!(stmt.params().len(), 1);
    }
}
