//! Statement execution against a transport.

use thiserror::Error;
use tracing::debug;
use vellum_core::stmt::Statement;
use vellum_wire::{PgValue, WireError, BINARY_FORMAT};

use crate::transport::{RawRow, ServerError, Transport, WirePayload};

/// Errors surfaced while executing a statement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// A statement construction error forwarded from the builder layer.
    #[error(transparent)]
    Build(#[from] vellum_core::Error),

    /// A value failed to encode or a result field failed to decode.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The server reported an error; passed through verbatim.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The argument list does not match the statement's parameter list.
    #[error("statement declares {expected} parameters, {found} arguments given")]
    ParameterCount { expected: usize, found: usize },

    /// A result row did not have the declared number of columns.
    #[error("statement declares {expected} result columns, row has {found}")]
    ColumnCount { expected: usize, found: usize },

    /// A row accessor asked for a column position past the projection.
    #[error("column index {index} out of range for a row of {columns}")]
    ColumnOutOfRange { index: usize, columns: usize },
}

/// Convenience alias for execution results.
pub type Result<T> = std::result::Result<T, ClientError>;

/// One decoded result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<PgValue>,
}

impl Row {
    /// The value at a projection position, if the position exists.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PgValue> {
        self.values.get(index)
    }

    /// The value at a projection position.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ColumnOutOfRange`] for a position past the
    /// end of the row.
    pub fn try_get(&self, index: usize) -> Result<&PgValue> {
        self.values.get(index).ok_or(ClientError::ColumnOutOfRange {
            index,
            columns: self.values.len(),
        })
    }

    /// All values in projection order.
    #[must_use]
    pub fn values(&self) -> &[PgValue] {
        &self.values
    }

    /// Consumes the row, yielding its values.
    #[must_use]
    pub fn into_values(self) -> Vec<PgValue> {
        self.values
    }
}

/// Executes built statements over a [`Transport`].
///
/// The connection owns no socket of its own; it binds host values to a
/// [`Statement`]'s declared parameter types, hands the payload to the
/// transport, and decodes the raw rows against the statement's declared
/// result types.
pub struct Connection<T: Transport> {
    transport: T,
}

impl<T: Transport> Connection<T> {
    /// Wraps a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Gives the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Runs a statement with the given arguments and decodes every row.
    ///
    /// Arguments are matched positionally against the statement's declared
    /// parameter types; `args[0]` binds `$1`. Statements without a result
    /// set return an empty vector.
    ///
    /// # Errors
    ///
    /// Fails before touching the transport when the argument count is
    /// wrong or a value does not encode for its declared type. After the
    /// transport runs, fails on a verbatim [`ServerError`], a row with
    /// the wrong column count, or a field that does not decode.
    pub fn execute(&mut self, stmt: &Statement, args: &[PgValue]) -> Result<Vec<Row>> {
        let params = stmt.params().types();
        if args.len() != params.len() {
            return Err(ClientError::ParameterCount {
                expected: params.len(),
                found: args.len(),
            });
        }
        let mut param_values = Vec::with_capacity(args.len());
        for (value, ty) in args.iter().zip(params) {
            param_values.push(vellum_wire::encode(value, ty)?);
        }
        let payload = WirePayload {
            sql: stmt.sql().to_owned(),
            param_oids: params.iter().map(|ty| vellum_wire::type_oid(&ty.scalar)).collect(),
            param_formats: vec![BINARY_FORMAT; params.len()],
            param_values,
            result_oids: stmt
                .result_types()
                .iter()
                .map(|ty| vellum_wire::type_oid(&ty.scalar))
                .collect(),
        };

        debug!(sql = %payload.sql, params = args.len(), "Executing statement");
        let raw_rows = self.transport.execute(&payload)?;

        let mut rows = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            rows.push(self.decode_row(stmt, &raw)?);
        }
        debug!(rows = rows.len(), "Statement complete");
        Ok(rows)
    }

    /// Discards transport session state.
    pub fn reset(&mut self) {
        self.transport.reset();
    }

    fn decode_row(&self, stmt: &Statement, raw: &RawRow) -> Result<Row> {
        let result = stmt.result_types();
        if raw.fields.len() != result.len() {
            return Err(ClientError::ColumnCount {
                expected: result.len(),
                found: raw.fields.len(),
            });
        }
        let mut values = Vec::with_capacity(result.len());
        for (field, ty) in raw.fields.iter().zip(result) {
            values.push(vellum_wire::decode(ty, field.as_deref())?);
        }
        Ok(Row { values })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use vellum_core::expr::ExprContext;
    use vellum_core::stmt::Select;
    use vellum_core::types::{ColumnType, ScalarType};
    use vellum_core::{Schema, Table};
    use vellum_wire::codec;

    use super::*;

    /// Records the payload it was given and replays canned rows.
    struct FakeTransport {
        rows: Vec<RawRow>,
        error: Option<ServerError>,
        last_payload: Option<WirePayload>,
        resets: usize,
    }

    impl FakeTransport {
        fn returning(rows: Vec<RawRow>) -> Self {
            Self {
                rows,
                error: None,
                last_payload: None,
                resets: 0,
            }
        }

        fn failing(code: &str, message: &str) -> Self {
            Self {
                rows: Vec::new(),
                error: Some(ServerError {
                    code: code.into(),
                    message: message.into(),
                }),
                last_payload: None,
                resets: 0,
            }
        }
    }

    impl Transport for FakeTransport {
        fn execute(
            &mut self,
            payload: &WirePayload,
        ) -> std::result::Result<Vec<RawRow>, ServerError> {
            self.last_payload = Some(payload.clone());
            match self.error.take() {
                Some(err) => Err(err),
                None => Ok(self.rows.clone()),
            }
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn varchar(limit: u32) -> ColumnType {
        ColumnType::new(ScalarType::Varchar(NonZeroU32::new(limit).unwrap()))
    }

    fn people_schema() -> Schema {
        let table = Table::new("people")
            .column("name", varchar(50))
            .unwrap()
            .column("age", ColumnType::new(ScalarType::Int4))
            .unwrap();
        Schema::new().table(table).unwrap()
    }

    fn select_by_age(schema: &Schema) -> Statement {
        let params =
            vellum_core::ParameterList::new(vec![ColumnType::new(ScalarType::Int4)]);
        let scope = schema.scope(&["people"]).unwrap();
        let ctx = ExprContext::new(&scope, &params);

        let age = ctx.column("age").unwrap();
        let bound = ctx.parameter(1).unwrap();
        Select::new(schema, &["people"])
            .unwrap()
            .params(params.clone())
            .column("name", ctx.column("name").unwrap())
            .filter(age.eq(bound).unwrap())
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_execute_builds_binary_payload() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let schema = people_schema();
        let stmt = select_by_age(&schema);

        let name_ty = varchar(50);
        let row = RawRow::new(vec![codec::encode(&PgValue::from("Ada"), &name_ty).unwrap()]);
        let mut conn = Connection::new(FakeTransport::returning(vec![row]));

        let rows = conn.execute(&stmt, &[PgValue::Int4(30)]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&PgValue::from("Ada")));
        assert_eq!(rows[0].try_get(0).unwrap(), &PgValue::from("Ada"));
        assert_eq!(
            rows[0].try_get(1).unwrap_err(),
            ClientError::ColumnOutOfRange {
                index: 1,
                columns: 1
            }
        );

        let payload = conn.into_transport().last_payload.unwrap();
        assert_eq!(payload.sql, stmt.sql());
        assert_eq!(payload.param_oids, vec![23]);
        assert_eq!(payload.param_formats, vec![BINARY_FORMAT]);
        assert_eq!(payload.param_values, vec![Some(30_i32.to_be_bytes().to_vec())]);
        assert_eq!(payload.result_oids, vec![1043]);
    }

    #[test]
    fn test_argument_count_checked_before_transport() {
        let schema = people_schema();
        let stmt = select_by_age(&schema);
        let mut conn = Connection::new(FakeTransport::returning(Vec::new()));

        let err = conn.execute(&stmt, &[]).unwrap_err();
        assert_eq!(
            err,
            ClientError::ParameterCount {
                expected: 1,
                found: 0
            }
        );
        assert!(conn.into_transport().last_payload.is_none());
    }

    #[test]
    fn test_encode_failure_precedes_transport() {
        let schema = people_schema();
        let stmt = select_by_age(&schema);
        let mut conn = Connection::new(FakeTransport::returning(Vec::new()));

        let err = conn.execute(&stmt, &[PgValue::Int8(30)]).unwrap_err();
        assert!(matches!(err, ClientError::Wire(_)));
        assert!(conn.into_transport().last_payload.is_none());
    }

    #[test]
    fn test_server_error_passes_through_verbatim() {
        let schema = people_schema();
        let stmt = select_by_age(&schema);
        let mut conn = Connection::new(FakeTransport::failing("23505", "duplicate key"));

        let err = conn.execute(&stmt, &[PgValue::Int4(30)]).unwrap_err();
        let ClientError::Server(server) = err else {
            panic!("expected server error, got {err:?}");
        };
        assert_eq!(server.code, "23505");
        assert_eq!(server.message, "duplicate key");
        assert_eq!(server.to_string(), "server error 23505: duplicate key");
    }

    #[test]
    fn test_row_with_wrong_column_count_rejected() {
        let schema = people_schema();
        let stmt = select_by_age(&schema);
        let row = RawRow::new(vec![None, None]);
        let mut conn = Connection::new(FakeTransport::returning(vec![row]));

        let err = conn.execute(&stmt, &[PgValue::Int4(30)]).unwrap_err();
        assert_eq!(
            err,
            ClientError::ColumnCount {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_reset_reaches_transport() {
        let mut conn = Connection::new(FakeTransport::returning(Vec::new()));
        conn.reset();
        conn.reset();
        assert_eq!(conn.into_transport().resets, 2);
    }
}
