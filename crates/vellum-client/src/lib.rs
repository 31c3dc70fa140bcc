//! Statement execution over a pluggable PostgreSQL transport.
//!
//! This crate is the execution boundary of the vellum stack. It takes a
//! built [`Statement`](vellum_core::stmt::Statement), binds host values
//! to its declared parameter types, and hands a fully-encoded
//! extended-query payload to a caller-supplied [`Transport`]. Sockets,
//! TLS, authentication, and connection pooling all live behind that
//! trait, outside this crate.

pub mod connection;
pub mod transport;

pub use connection::{ClientError, Connection, Result, Row};
pub use transport::{RawRow, ServerError, Transport, WirePayload};
