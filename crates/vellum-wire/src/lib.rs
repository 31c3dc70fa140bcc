//! Binary value codec for the PostgreSQL extended-query protocol.
//!
//! This crate converts between host values ([`PgValue`]) and the server's
//! binary transfer format, driven by the column types declared in
//! `vellum-core`. It covers the scalar payloads only; message framing
//! beyond the per-field length prefix belongs to the transport layer.
//!
//! ```
//! use vellum_core::types::{ColumnType, ScalarType};
//! use vellum_wire::{decode, encode, PgValue};
//!
//! let ty = ColumnType::new(ScalarType::Int4);
//! let bytes = encode(&PgValue::Int4(42), &ty)?;
//! assert_eq!(decode(&ty, bytes.as_deref())?, PgValue::Int4(42));
//! # Ok::<(), vellum_wire::WireError>(())
//! ```

pub mod codec;
pub mod error;
pub mod numeric;
pub mod oid;
pub mod value;

pub use codec::{decode, encode, read_field, write_field};
pub use error::{Result, WireError};
pub use numeric::{Numeric, Sign};
pub use oid::{type_oid, BINARY_FORMAT};
pub use value::PgValue;
