//! Schema-validated expression algebra.
//!
//! Expressions are immutable trees built through validating constructors.
//! Every constructor checks operand types, grouping legality, and parameter
//! indices immediately; a successfully built [`Expr`] carries its result
//! [`ColumnType`] and the grouping mode it is legal in, and can always be
//! rendered. Rendering never validates.
//!
//! References and parameters are built through an [`ExprContext`], which
//! threads the scope, the active grouping mode, and the declared parameter
//! list through every lookup.

use std::num::NonZeroU32;

use crate::error::{Error, Result};
use crate::schema::Scope;
use crate::types::{ColumnType, Presence, ScalarType};

/// A resolved `(table, column)` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Owning table.
    pub table: String,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Creates a reference from table and column names.
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// The grouping mode of a statement scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Grouping {
    /// No GROUP BY: references are per-row.
    #[default]
    Ungrouped,
    /// GROUP BY over the given keys: plain references must be keys.
    Grouped(Vec<ColumnRef>),
}

impl Grouping {
    /// Returns true if this mode carries grouping keys.
    #[must_use]
    pub const fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped(_))
    }
}

/// The grouping mode an expression is legal in.
///
/// Literals and parameters are legal everywhere (`Neutral`); column
/// references built under an ungrouped scope are per-row (`Ungrouped`);
/// grouping-key references require the statement to declare GROUP BY
/// (`Grouped`); aggregate results (`Aggregated`) are legal under GROUP BY
/// or as a whole-table aggregation. Combining `Ungrouped` with either
/// grouped form is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupTag {
    /// Legal under any grouping mode.
    Neutral,
    /// Legal only in an ungrouped scope.
    Ungrouped,
    /// Contains a grouping-key reference.
    Grouped,
    /// Contains an aggregate but no grouping-key reference.
    Aggregated,
}

impl GroupTag {
    fn merge(self, other: Self, op: &str) -> Result<Self> {
        match (self, other) {
            (Self::Neutral, tag) | (tag, Self::Neutral) => Ok(tag),
            (Self::Ungrouped, Self::Ungrouped) => Ok(Self::Ungrouped),
            // A key reference dominates: the combination still needs the
            // statement to declare GROUP BY.
            (Self::Grouped, Self::Grouped | Self::Aggregated)
            | (Self::Aggregated, Self::Grouped) => Ok(Self::Grouped),
            (Self::Aggregated, Self::Aggregated) => Ok(Self::Aggregated),
            _ => Err(Error::MixedGrouping(op.into())),
        }
    }
}

/// The ordered list of declared parameter types, indexed from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList(Vec<ColumnType>);

impl ParameterList {
    /// Creates a parameter list from declared types.
    #[must_use]
    pub const fn new(types: Vec<ColumnType>) -> Self {
        Self(types)
    }

    /// Creates an empty parameter list.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no parameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the declared types in order.
    #[must_use]
    pub fn types(&self) -> &[ColumnType] {
        &self.0
    }

    /// Returns the declared type of parameter `index` (1-based).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterOutOfRange`] for index 0 or an index
    /// beyond the list.
    pub fn get(&self, index: usize) -> Result<ColumnType> {
        if index == 0 || index > self.0.len() {
            return Err(Error::ParameterOutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(self.0[index - 1])
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Arithmetic negation.
    Neg,
}

impl UnaryOp {
    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Neg => "-",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Equality.
    Eq,
    /// Inequality.
    NotEq,
    /// Less than.
    Lt,
    /// Less than or equal.
    LtEq,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    GtEq,
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
    /// Text concatenation.
    Concat,
}

impl BinaryOp {
    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    /// Row count.
    Count,
    /// Sum.
    Sum,
    /// Average.
    Avg,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
}

impl AggregateFn {
    /// Returns the SQL spelling of the function.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Boolean literal.
    Bool(bool),
    /// 2-byte integer literal.
    Int2(i16),
    /// 4-byte integer literal.
    Int4(i32),
    /// 8-byte integer literal.
    Int8(i64),
    /// 4-byte float literal.
    Float4(f32),
    /// 8-byte float literal.
    Float8(f64),
    /// Text literal.
    Text(String),
    /// Binary literal.
    Bytea(Vec<u8>),
    /// Typed NULL literal.
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Literal(Literal),
    Column(ColumnRef),
    Parameter(usize),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        left: Box<Node>,
        op: BinaryOp,
        right: Box<Node>,
    },
    Function {
        name: String,
        args: Vec<Node>,
    },
    Case {
        branches: Vec<(Node, Node)>,
        else_: Box<Node>,
    },
    Cast {
        expr: Box<Node>,
        ty: ScalarType,
    },
    IsNull {
        expr: Box<Node>,
        negated: bool,
    },
    Aggregate {
        func: AggregateFn,
        distinct: bool,
        /// `None` renders as `count(*)`.
        operand: Option<Box<Node>>,
    },
}

/// A validated scalar expression.
///
/// Carries its result type and the grouping mode it is legal in. Built
/// only through validating constructors, so rendering cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub(crate) node: Node,
    ty: ColumnType,
    tag: GroupTag,
}

fn result_ty(scalar: ScalarType, nullable: bool) -> ColumnType {
    // Presence only describes catalog columns; expression results are
    // always Required.
    ColumnType {
        scalar,
        nullable,
        presence: Presence::Required,
    }
}

fn numeric_join(l: ScalarType, r: ScalarType) -> ScalarType {
    use ScalarType::{Float4, Float8, Int4, Int8, Numeric};
    match (l, r) {
        (Float8, _) | (_, Float8) => Float8,
        (Float4, Float4) => Float4,
        (Float4, _) | (_, Float4) => Float8,
        (Numeric, _) | (_, Numeric) => Numeric,
        (Int8, _) | (_, Int8) => Int8,
        (Int4, _) | (_, Int4) => Int4,
        _ => ScalarType::Int2,
    }
}

impl Expr {
    fn new(node: Node, ty: ColumnType, tag: GroupTag) -> Self {
        Self { node, ty, tag }
    }

    fn literal(lit: Literal, scalar: ScalarType, nullable: bool) -> Self {
        Self::new(Node::Literal(lit), result_ty(scalar, nullable), GroupTag::Neutral)
    }

    /// Boolean literal.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::literal(Literal::Bool(value), ScalarType::Bool, false)
    }

    /// 2-byte integer literal.
    #[must_use]
    pub fn int2(value: i16) -> Self {
        Self::literal(Literal::Int2(value), ScalarType::Int2, false)
    }

    /// 4-byte integer literal.
    #[must_use]
    pub fn int4(value: i32) -> Self {
        Self::literal(Literal::Int4(value), ScalarType::Int4, false)
    }

    /// 8-byte integer literal.
    #[must_use]
    pub fn int8(value: i64) -> Self {
        Self::literal(Literal::Int8(value), ScalarType::Int8, false)
    }

    /// 4-byte float literal.
    #[must_use]
    pub fn float4(value: f32) -> Self {
        Self::literal(Literal::Float4(value), ScalarType::Float4, false)
    }

    /// 8-byte float literal.
    #[must_use]
    pub fn float8(value: f64) -> Self {
        Self::literal(Literal::Float8(value), ScalarType::Float8, false)
    }

    /// Text literal, typed as `varchar(n)` over its own length.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        let chars = u32::try_from(value.chars().count()).unwrap_or(u32::MAX);
        let bound = NonZeroU32::new(chars.max(1)).unwrap_or(NonZeroU32::MIN);
        Self::literal(Literal::Text(value), ScalarType::Varchar(bound), false)
    }

    /// Binary literal.
    #[must_use]
    pub fn bytea(value: Vec<u8>) -> Self {
        Self::literal(Literal::Bytea(value), ScalarType::Bytea, false)
    }

    /// Typed NULL literal. Its scalar type drives validation only; it
    /// always renders as `NULL`.
    #[must_use]
    pub fn null(scalar: ScalarType) -> Self {
        Self::literal(Literal::Null, scalar, true)
    }

    /// Returns the result type of this expression.
    #[must_use]
    pub const fn ty(&self) -> &ColumnType {
        &self.ty
    }

    /// Returns the result scalar type.
    #[must_use]
    pub const fn scalar(&self) -> &ScalarType {
        &self.ty.scalar
    }

    /// Returns true if the result may be NULL.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.ty.nullable
    }

    /// Returns the grouping mode this expression is legal in.
    #[must_use]
    pub const fn group_tag(&self) -> GroupTag {
        self.tag
    }

    fn numeric_binary(self, op: BinaryOp, right: Self) -> Result<Self> {
        if !self.scalar().is_numeric() || !right.scalar().is_numeric() {
            return Err(Error::TypeMismatch {
                operator: op.as_str().into(),
                expected: String::from("numeric operands"),
                found: format!("{} and {}", self.ty, right.ty),
            });
        }
        let tag = self.tag.merge(right.tag, op.as_str())?;
        let ty = result_ty(
            numeric_join(self.ty.scalar, right.ty.scalar),
            self.ty.nullable || right.ty.nullable,
        );
        Ok(Self::new(
            Node::Binary {
                left: Box::new(self.node),
                op,
                right: Box::new(right.node),
            },
            ty,
            tag,
        ))
    }

    fn comparison(self, op: BinaryOp, right: Self) -> Result<Self> {
        if !self.ty.scalar.same_scalar(&right.ty.scalar) {
            return Err(Error::TypeMismatch {
                operator: op.as_str().into(),
                expected: String::from("operands of the same scalar type"),
                found: format!("{} and {}", self.ty, right.ty),
            });
        }
        let tag = self.tag.merge(right.tag, op.as_str())?;
        let nullable = self.ty.nullable || right.ty.nullable;
        Ok(Self::new(
            Node::Binary {
                left: Box::new(self.node),
                op,
                right: Box::new(right.node),
            },
            result_ty(ScalarType::Bool, nullable),
            tag,
        ))
    }

    fn logical(self, op: BinaryOp, right: Self) -> Result<Self> {
        for side in [&self, &right] {
            if !side.ty.scalar.same_scalar(&ScalarType::Bool) {
                return Err(Error::TypeMismatch {
                    operator: op.as_str().into(),
                    expected: String::from("bool operands"),
                    found: side.ty.to_string(),
                });
            }
        }
        let tag = self.tag.merge(right.tag, op.as_str())?;
        let nullable = self.ty.nullable || right.ty.nullable;
        Ok(Self::new(
            Node::Binary {
                left: Box::new(self.node),
                op,
                right: Box::new(right.node),
            },
            result_ty(ScalarType::Bool, nullable),
            tag,
        ))
    }

    /// Addition. Operands must be numeric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-numeric operands.
    pub fn add(self, right: Self) -> Result<Self> {
        self.numeric_binary(BinaryOp::Add, right)
    }

    /// Subtraction. Operands must be numeric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-numeric operands.
    pub fn sub(self, right: Self) -> Result<Self> {
        self.numeric_binary(BinaryOp::Sub, right)
    }

    /// Multiplication. Operands must be numeric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-numeric operands.
    pub fn mul(self, right: Self) -> Result<Self> {
        self.numeric_binary(BinaryOp::Mul, right)
    }

    /// Division. Operands must be numeric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-numeric operands.
    pub fn div(self, right: Self) -> Result<Self> {
        self.numeric_binary(BinaryOp::Div, right)
    }

    /// Equality. Operands must share a scalar type; nullability is not
    /// part of the check, so comparing against a typed NULL is legal and
    /// yields a nullable bool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the scalar types differ.
    pub fn eq(self, right: Self) -> Result<Self> {
        self.comparison(BinaryOp::Eq, right)
    }

    /// Inequality.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the scalar types differ.
    pub fn not_eq(self, right: Self) -> Result<Self> {
        self.comparison(BinaryOp::NotEq, right)
    }

    /// Less than.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the scalar types differ.
    pub fn lt(self, right: Self) -> Result<Self> {
        self.comparison(BinaryOp::Lt, right)
    }

    /// Less than or equal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the scalar types differ.
    pub fn lt_eq(self, right: Self) -> Result<Self> {
        self.comparison(BinaryOp::LtEq, right)
    }

    /// Greater than.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the scalar types differ.
    pub fn gt(self, right: Self) -> Result<Self> {
        self.comparison(BinaryOp::Gt, right)
    }

    /// Greater than or equal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the scalar types differ.
    pub fn gt_eq(self, right: Self) -> Result<Self> {
        self.comparison(BinaryOp::GtEq, right)
    }

    /// Logical AND over bool operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-bool operands.
    pub fn and(self, right: Self) -> Result<Self> {
        self.logical(BinaryOp::And, right)
    }

    /// Logical OR over bool operands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-bool operands.
    pub fn or(self, right: Self) -> Result<Self> {
        self.logical(BinaryOp::Or, right)
    }

    /// Logical NOT. A NULL operand propagates to a NULL result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-bool operand.
    pub fn not(self) -> Result<Self> {
        if !self.ty.scalar.same_scalar(&ScalarType::Bool) {
            return Err(Error::TypeMismatch {
                operator: String::from("NOT"),
                expected: String::from("bool operand"),
                found: self.ty.to_string(),
            });
        }
        let ty = result_ty(ScalarType::Bool, self.ty.nullable);
        Ok(Self::new(
            Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.node),
            },
            ty,
            self.tag,
        ))
    }

    /// Arithmetic negation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-numeric operand.
    pub fn neg(self) -> Result<Self> {
        if !self.ty.scalar.is_numeric() {
            return Err(Error::TypeMismatch {
                operator: String::from("-"),
                expected: String::from("numeric operand"),
                found: self.ty.to_string(),
            });
        }
        let ty = self.ty;
        Ok(Self::new(
            Node::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.node),
            },
            ty,
            self.tag,
        ))
    }

    /// Text concatenation. The result is a `varchar` over the summed
    /// length bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for non-text operands.
    pub fn concat(self, right: Self) -> Result<Self> {
        let (l, r) = match (self.ty.scalar, right.ty.scalar) {
            (
                ScalarType::Char(l) | ScalarType::Varchar(l),
                ScalarType::Char(r) | ScalarType::Varchar(r),
            ) => (l, r),
            _ => {
                return Err(Error::TypeMismatch {
                    operator: String::from("||"),
                    expected: String::from("text operands"),
                    found: format!("{} and {}", self.ty, right.ty),
                })
            }
        };
        let bound = NonZeroU32::new(l.get().saturating_add(r.get())).unwrap_or(l);
        let tag = self.tag.merge(right.tag, "||")?;
        let nullable = self.ty.nullable || right.ty.nullable;
        Ok(Self::new(
            Node::Binary {
                left: Box::new(self.node),
                op: BinaryOp::Concat,
                right: Box::new(right.node),
            },
            result_ty(ScalarType::Varchar(bound), nullable),
            tag,
        ))
    }

    /// IS NULL test. A null-elimination construct: its result is a
    /// non-nullable bool.
    #[must_use]
    pub fn is_null(self) -> Self {
        let tag = self.tag;
        Self::new(
            Node::IsNull {
                expr: Box::new(self.node),
                negated: false,
            },
            result_ty(ScalarType::Bool, false),
            tag,
        )
    }

    /// IS NOT NULL test. Yields a non-nullable bool.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        let tag = self.tag;
        Self::new(
            Node::IsNull {
                expr: Box::new(self.node),
                negated: true,
            },
            result_ty(ScalarType::Bool, false),
            tag,
        )
    }

    /// Cast to another scalar type. Nullability is preserved.
    #[must_use]
    pub fn cast(self, scalar: ScalarType) -> Self {
        let nullable = self.ty.nullable;
        let tag = self.tag;
        Self::new(
            Node::Cast {
                expr: Box::new(self.node),
                ty: scalar,
            },
            result_ty(scalar, nullable),
            tag,
        )
    }

    /// An n-ary function call with a declared result scalar.
    ///
    /// This is the generic mechanism behind the checked wrappers in
    /// [`funcs`]; nullability propagates from the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MixedGrouping`] if the arguments mix grouped and
    /// per-row expressions.
    pub fn function(name: impl Into<String>, args: Vec<Self>, result: ScalarType) -> Result<Self> {
        let name = name.into();
        let mut tag = GroupTag::Neutral;
        let mut nullable = false;
        let mut nodes = Vec::with_capacity(args.len());
        for arg in args {
            tag = tag.merge(arg.tag, &name)?;
            nullable |= arg.ty.nullable;
            nodes.push(arg.node);
        }
        Ok(Self::new(
            Node::Function { name, args: nodes },
            result_ty(result, nullable),
            tag,
        ))
    }

    /// A CASE/WHEN chain with a mandatory ELSE. Branch order is
    /// preserved in the rendered text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if there are no branches, a
    /// condition is not bool, or a branch result differs from the ELSE
    /// scalar type.
    pub fn case_when(branches: Vec<(Self, Self)>, else_: Self) -> Result<Self> {
        if branches.is_empty() {
            return Err(Error::TypeMismatch {
                operator: String::from("CASE"),
                expected: String::from("at least one WHEN branch"),
                found: String::from("none"),
            });
        }
        let mut tag = else_.tag;
        let mut nullable = else_.ty.nullable;
        let scalar = else_.ty.scalar;
        let mut nodes = Vec::with_capacity(branches.len());
        for (cond, value) in branches {
            if !cond.ty.scalar.same_scalar(&ScalarType::Bool) {
                return Err(Error::TypeMismatch {
                    operator: String::from("CASE WHEN"),
                    expected: String::from("bool condition"),
                    found: cond.ty.to_string(),
                });
            }
            if !value.ty.scalar.same_scalar(&scalar) {
                return Err(Error::TypeMismatch {
                    operator: String::from("CASE THEN"),
                    expected: scalar.to_string(),
                    found: value.ty.to_string(),
                });
            }
            tag = tag.merge(cond.tag, "CASE")?;
            tag = tag.merge(value.tag, "CASE")?;
            nullable |= value.ty.nullable;
            nodes.push((cond.node, value.node));
        }
        Ok(Self::new(
            Node::Case {
                branches: nodes,
                else_: Box::new(else_.node),
            },
            result_ty(scalar, nullable),
            tag,
        ))
    }
}

/// Validating constructors for references and parameters.
///
/// Holds the scope, the active grouping mode, and the declared parameter
/// list of the statement under construction.
#[derive(Debug, Clone)]
pub struct ExprContext<'a> {
    scope: &'a Scope,
    params: &'a ParameterList,
    grouping: Grouping,
}

impl<'a> ExprContext<'a> {
    /// Creates an ungrouped context over a scope and parameter list.
    #[must_use]
    pub const fn new(scope: &'a Scope, params: &'a ParameterList) -> Self {
        Self {
            scope,
            params,
            grouping: Grouping::Ungrouped,
        }
    }

    /// Enters grouped mode over the given keys. Each key must resolve in
    /// the scope. This is the only transition; a grouped context cannot
    /// be regrouped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyGrouped`] when called on a grouped
    /// context, or a resolution error if a key is unknown.
    pub fn grouped(&self, keys: &[(&str, &str)]) -> Result<Self> {
        if self.grouping.is_grouped() {
            return Err(Error::AlreadyGrouped);
        }
        let mut resolved = Vec::with_capacity(keys.len());
        for (table, column) in keys {
            self.scope.resolve(table, column)?;
            resolved.push(ColumnRef::new(*table, *column));
        }
        Ok(Self {
            scope: self.scope,
            params: self.params,
            grouping: Grouping::Grouped(resolved),
        })
    }

    /// Returns the active grouping mode.
    #[must_use]
    pub const fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    fn reference(&self, reference: ColumnRef, ty: ColumnType) -> Result<Expr> {
        let tag = match &self.grouping {
            Grouping::Ungrouped => GroupTag::Ungrouped,
            Grouping::Grouped(keys) => {
                if keys.contains(&reference) {
                    GroupTag::Grouped
                } else {
                    return Err(Error::NotAGroupKey {
                        table: reference.table,
                        column: reference.column,
                    });
                }
            }
        };
        Ok(Expr::new(Node::Column(reference), ty, tag))
    }

    /// An unqualified column reference. Legal only when the column name
    /// is unique across the tables in scope; under grouped mode it must
    /// also be a grouping key.
    ///
    /// # Errors
    ///
    /// Returns a resolution error for unknown or ambiguous names, or
    /// [`Error::NotAGroupKey`] under grouped mode.
    pub fn column(&self, name: &str) -> Result<Expr> {
        let (table, ty) = self.scope.resolve_unqualified(name)?;
        self.reference(ColumnRef::new(table, name), ty)
    }

    /// A qualified `(table, column)` reference.
    ///
    /// # Errors
    ///
    /// Returns a resolution error for unknown names, or
    /// [`Error::NotAGroupKey`] under grouped mode.
    pub fn qualified(&self, table: &str, column: &str) -> Result<Expr> {
        let ty = self.scope.resolve(table, column)?;
        self.reference(ColumnRef::new(table, column), ty)
    }

    /// A parameter placeholder `$index` (1-based). Its type is the
    /// declared type at that position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterOutOfRange`] for index 0 or an index
    /// beyond the declared list.
    pub fn parameter(&self, index: usize) -> Result<Expr> {
        let ty = self.params.get(index)?;
        Ok(Expr::new(Node::Parameter(index), ty, GroupTag::Neutral))
    }
}

/// Checked wrappers over common built-in functions.
///
/// These cover a representative subset; [`Expr::function`] is the general
/// mechanism for the rest.
pub mod funcs {
    use super::{Error, Expr, Result, ScalarType};

    fn text_only(function: &str, expr: &Expr) -> Result<()> {
        if expr.scalar().is_text() {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                operator: function.into(),
                expected: String::from("text operand"),
                found: expr.ty().to_string(),
            })
        }
    }

    /// `lower(text)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-text operand.
    pub fn lower(expr: Expr) -> Result<Expr> {
        text_only("lower", &expr)?;
        let scalar = *expr.scalar();
        Expr::function("lower", vec![expr], scalar)
    }

    /// `upper(text)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-text operand.
    pub fn upper(expr: Expr) -> Result<Expr> {
        text_only("upper", &expr)?;
        let scalar = *expr.scalar();
        Expr::function("upper", vec![expr], scalar)
    }

    /// `char_length(text)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-text operand.
    pub fn char_length(expr: Expr) -> Result<Expr> {
        text_only("char_length", &expr)?;
        Expr::function("char_length", vec![expr], ScalarType::Int4)
    }

    /// `abs(numeric)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-numeric operand.
    pub fn abs(expr: Expr) -> Result<Expr> {
        if !expr.scalar().is_numeric() {
            return Err(Error::TypeMismatch {
                operator: String::from("abs"),
                expected: String::from("numeric operand"),
                found: expr.ty().to_string(),
            });
        }
        let scalar = *expr.scalar();
        Expr::function("abs", vec![expr], scalar)
    }

    /// `COALESCE(list..., fallback)`. The fallback must be non-nullable
    /// and every listed expression must share its scalar type; the result
    /// is non-nullable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a nullable fallback or a
    /// scalar-type mismatch.
    pub fn coalesce(list: Vec<Expr>, fallback: Expr) -> Result<Expr> {
        if fallback.is_nullable() {
            return Err(Error::TypeMismatch {
                operator: String::from("COALESCE"),
                expected: String::from("non-nullable fallback"),
                found: fallback.ty().to_string(),
            });
        }
        let scalar = *fallback.scalar();
        for expr in &list {
            if !expr.scalar().same_scalar(&scalar) {
                return Err(Error::TypeMismatch {
                    operator: String::from("COALESCE"),
                    expected: scalar.to_string(),
                    found: expr.ty().to_string(),
                });
            }
        }
        let mut args = list;
        args.push(fallback);
        let expr = Expr::function("COALESCE", args, scalar)?;
        // The fallback guarantees a non-NULL result.
        Ok(strip_nullability(expr))
    }

    /// `NULLIF(a, b)`: the structural inverse of COALESCE. Two
    /// non-nullable operands of one scalar type, a nullable result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for nullable operands or a
    /// scalar-type mismatch.
    pub fn nullif(a: Expr, b: Expr) -> Result<Expr> {
        for side in [&a, &b] {
            if side.is_nullable() {
                return Err(Error::TypeMismatch {
                    operator: String::from("NULLIF"),
                    expected: String::from("non-nullable operands"),
                    found: side.ty().to_string(),
                });
            }
        }
        if !a.scalar().same_scalar(b.scalar()) {
            return Err(Error::TypeMismatch {
                operator: String::from("NULLIF"),
                expected: a.scalar().to_string(),
                found: b.ty().to_string(),
            });
        }
        let scalar = *a.scalar();
        let expr = Expr::function("NULLIF", vec![a, b], scalar)?;
        Ok(add_nullability(expr))
    }

    fn strip_nullability(mut expr: Expr) -> Expr {
        expr.ty.nullable = false;
        expr
    }

    fn add_nullability(mut expr: Expr) -> Expr {
        expr.ty.nullable = true;
        expr
    }
}

/// Aggregate call constructors.
///
/// Aggregates accept only per-row (or neutral) operands and produce
/// grouped results; this is the only way a non-key column participates in
/// a grouped projection.
pub mod agg {
    use super::{
        result_ty, AggregateFn, Error, Expr, GroupTag, Node, Result, ScalarType,
    };

    fn aggregate(
        func: AggregateFn,
        distinct: bool,
        operand: Expr,
        scalar: ScalarType,
        nullable: bool,
    ) -> Result<Expr> {
        if matches!(
            operand.group_tag(),
            GroupTag::Grouped | GroupTag::Aggregated
        ) {
            return Err(Error::NestedAggregate(func.as_str().into()));
        }
        Ok(Expr {
            node: Node::Aggregate {
                func,
                distinct,
                operand: Some(Box::new(operand.node)),
            },
            ty: result_ty(scalar, nullable),
            tag: GroupTag::Aggregated,
        })
    }

    fn sum_result(scalar: ScalarType) -> ScalarType {
        match scalar {
            ScalarType::Int2 | ScalarType::Int4 => ScalarType::Int8,
            ScalarType::Float4 | ScalarType::Float8 => ScalarType::Float8,
            _ => ScalarType::Numeric,
        }
    }

    fn avg_result(scalar: ScalarType) -> ScalarType {
        match scalar {
            ScalarType::Float4 | ScalarType::Float8 => ScalarType::Float8,
            _ => ScalarType::Numeric,
        }
    }

    fn numeric_only(func: AggregateFn, operand: &Expr) -> Result<()> {
        if operand.scalar().is_numeric() {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                operator: func.as_str().into(),
                expected: String::from("numeric operand"),
                found: operand.ty().to_string(),
            })
        }
    }

    /// `count(*)`: row count, legal under any grouping mode.
    #[must_use]
    pub fn count_star() -> Expr {
        Expr {
            node: Node::Aggregate {
                func: AggregateFn::Count,
                distinct: false,
                operand: None,
            },
            ty: result_ty(ScalarType::Int8, false),
            tag: GroupTag::Aggregated,
        }
    }

    /// `count(expr)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NestedAggregate`] for a grouped operand.
    pub fn count(operand: Expr) -> Result<Expr> {
        aggregate(AggregateFn::Count, false, operand, ScalarType::Int8, false)
    }

    /// `count(DISTINCT expr)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NestedAggregate`] for a grouped operand.
    pub fn count_distinct(operand: Expr) -> Result<Expr> {
        aggregate(AggregateFn::Count, true, operand, ScalarType::Int8, false)
    }

    /// `sum(expr)` over a numeric operand. NULL over an empty set, so the
    /// result is nullable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-numeric operand or
    /// [`Error::NestedAggregate`] for a grouped one.
    pub fn sum(operand: Expr) -> Result<Expr> {
        numeric_only(AggregateFn::Sum, &operand)?;
        let scalar = sum_result(*operand.scalar());
        aggregate(AggregateFn::Sum, false, operand, scalar, true)
    }

    /// `sum(DISTINCT expr)`.
    ///
    /// # Errors
    ///
    /// Same as [`sum`].
    pub fn sum_distinct(operand: Expr) -> Result<Expr> {
        numeric_only(AggregateFn::Sum, &operand)?;
        let scalar = sum_result(*operand.scalar());
        aggregate(AggregateFn::Sum, true, operand, scalar, true)
    }

    /// `avg(expr)` over a numeric operand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] for a non-numeric operand or
    /// [`Error::NestedAggregate`] for a grouped one.
    pub fn avg(operand: Expr) -> Result<Expr> {
        numeric_only(AggregateFn::Avg, &operand)?;
        let scalar = avg_result(*operand.scalar());
        aggregate(AggregateFn::Avg, false, operand, scalar, true)
    }

    /// `min(expr)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NestedAggregate`] for a grouped operand.
    pub fn min(operand: Expr) -> Result<Expr> {
        let scalar = *operand.scalar();
        aggregate(AggregateFn::Min, false, operand, scalar, true)
    }

    /// `max(expr)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NestedAggregate`] for a grouped operand.
    pub fn max(operand: Expr) -> Result<Expr> {
        let scalar = *operand.scalar();
        aggregate(AggregateFn::Max, false, operand, scalar, true)
    }
}
