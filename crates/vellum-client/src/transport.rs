//! The boundary between statement execution and protocol transport.
//!
//! This crate prepares fully-bound extended-query payloads and interprets
//! the raw rows that come back; carrying those payloads to a server is the
//! job of a [`Transport`] implementation supplied by the caller. That
//! split keeps connection management, TLS, and authentication out of this
//! crate entirely.

use thiserror::Error;

/// A bound statement ready for the extended-query protocol.
///
/// Everything a transport needs to issue Parse, Bind, and Execute is
/// present: canonical SQL with `$n` placeholders, the declared parameter
/// OIDs, the encoded parameter values, and the OIDs the result columns
/// are expected to carry. All formats are binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePayload {
    /// Canonical SQL text.
    pub sql: String,
    /// Catalog OIDs of the declared parameter types, in `$n` order.
    pub param_oids: Vec<u32>,
    /// Format code per parameter; always binary.
    pub param_formats: Vec<i16>,
    /// Encoded parameter values, `None` for SQL `NULL`.
    pub param_values: Vec<Option<Vec<u8>>>,
    /// Catalog OIDs of the expected result columns, in projection order.
    pub result_oids: Vec<u32>,
}

/// One result row as the transport received it, fields in projection
/// order and `None` for SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    pub fields: Vec<Option<Vec<u8>>>,
}

impl RawRow {
    #[must_use]
    pub fn new(fields: Vec<Option<Vec<u8>>>) -> Self {
        Self { fields }
    }
}

/// An error the server reported for a statement.
///
/// Passed through verbatim; this crate never rewrites or classifies
/// server-side failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("server error {code}: {message}")]
pub struct ServerError {
    /// The five-character SQLSTATE code.
    pub code: String,
    /// The server's primary message.
    pub message: String,
}

/// Carries payloads to a server and returns its rows.
///
/// Implementations own the socket, the protocol session, and recovery
/// from protocol-level failures. `execute` is expected to leave the
/// session ready for the next statement whether or not the server
/// reported an error.
pub trait Transport {
    /// Runs one bound statement and collects every data row.
    ///
    /// # Errors
    ///
    /// Returns the [`ServerError`] the server reported, if any.
    fn execute(&mut self, payload: &WirePayload) -> Result<Vec<RawRow>, ServerError>;

    /// Discards any session state left over from previous statements.
    fn reset(&mut self);
}
