//! # vellum-core
//!
//! A schema-validated statement algebra for PostgreSQL.
//!
//! Statements are built programmatically against an immutable table
//! catalog. Every constructor validates immediately: column references
//! must resolve (and be unambiguous), operand types must fit the
//! operator's signature, grouped scopes only admit grouping keys and
//! aggregates, and parameter placeholders must fall inside the declared
//! list. A tree that constructs successfully always renders, and the
//! rendering is canonical.
//!
//! ```rust
//! use vellum_core::expr::{ExprContext, ParameterList};
//! use vellum_core::schema::{Schema, Table};
//! use vellum_core::stmt::Select;
//! use vellum_core::types::{ColumnType, ScalarType};
//!
//! # fn main() -> vellum_core::Result<()> {
//! let schema = Schema::new().table(
//!     Table::new("users")
//!         .column("id", ColumnType::new(ScalarType::Int8))?
//!         .column("active", ColumnType::new(ScalarType::Bool))?,
//! )?;
//!
//! let params = ParameterList::empty();
//! let scope = schema.scope(&["users"])?;
//! let ctx = ExprContext::new(&scope, &params);
//! let stmt = Select::new(&schema, &["users"])?
//!     .column("id", ctx.column("id")?)
//!     .filter(ctx.column("active")?)?
//!     .build()?;
//!
//! assert_eq!(stmt.sql(), "SELECT users.id AS id FROM users WHERE users.active");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod expr;
pub mod render;
pub mod schema;
pub mod stmt;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use expr::{Expr, ExprContext, Grouping, ParameterList};
pub use schema::{Column, Schema, Scope, Table};
pub use stmt::{CreateTable, Delete, Insert, Select, Statement, Update};
pub use types::{ColumnType, Presence, ScalarType};
