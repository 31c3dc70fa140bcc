#![allow(dead_code)]

use vellum_core::types::{ColumnType, ScalarType};
use vellum_core::{Result, Schema, Statement, Table};

/// A varchar column type with the given character limit.
pub fn varchar(limit: u32) -> ColumnType {
    ColumnType::new(ScalarType::Varchar(limit.try_into().expect("non-zero limit")))
}

/// A two-table catalog used across the integration tests.
///
/// `orders.id` and `customers.id` collide on purpose so unqualified
/// resolution has an ambiguous case to exercise.
pub fn catalog() -> Schema {
    let orders = Table::new("orders")
        .column("id", ColumnType::new(ScalarType::Int8))
        .unwrap()
        .column("customer_id", ColumnType::new(ScalarType::Int8))
        .unwrap()
        .column("total", ColumnType::new(ScalarType::Numeric))
        .unwrap()
        .column("status", varchar(16).with_default())
        .unwrap()
        .column("note", varchar(200).nullable())
        .unwrap();
    let customers = Table::new("customers")
        .column("id", ColumnType::new(ScalarType::Int8))
        .unwrap()
        .column("name", varchar(80))
        .unwrap();
    Schema::new()
        .table(orders)
        .unwrap()
        .table(customers)
        .unwrap()
}

/// Unwraps a build result with the error in the panic message.
pub fn sql_of(result: Result<Statement>) -> String {
    match result {
        Ok(stmt) => stmt.sql().to_owned(),
        Err(e) => panic!("statement failed to build: {e}"),
    }
}
