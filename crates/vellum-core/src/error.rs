//! Error types for statement construction.

/// Coarse classification of a construction error.
///
/// Every error raised while building a statement falls into one of these
/// classes. All of them indicate a programming error in statement
/// construction; none is retryable, and all fire before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An identifier did not resolve against the catalog, or a parameter
    /// index was out of range.
    SchemaResolution,
    /// Operand types were incompatible with an operator's signature.
    TypeMismatch,
    /// A reference was illegal under the active grouping mode.
    GroupingViolation,
}

/// Errors that can occur while constructing expressions and statements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The named table does not exist in the schema or scope.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// The named column does not exist in the given table.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table that was searched.
        table: String,
        /// Column that was not found.
        column: String,
    },

    /// An unqualified column name matched more than one table in scope.
    #[error("ambiguous column '{0}': present in more than one table in scope")]
    AmbiguousColumn(String),

    /// A table name was defined twice in one schema.
    #[error("duplicate table '{0}' in schema")]
    DuplicateTable(String),

    /// A column name was defined twice in one table.
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn {
        /// Table being defined.
        table: String,
        /// Offending column name.
        column: String,
    },

    /// A parameter placeholder index fell outside the declared list.
    #[error("parameter index {index} out of range (valid: 1..={len})")]
    ParameterOutOfRange {
        /// The index that was requested (1-based).
        index: usize,
        /// Length of the declared parameter list.
        len: usize,
    },

    /// An INSERT omitted a column with no default.
    #[error("missing required column '{column}' in INSERT into '{table}'")]
    MissingRequiredColumn {
        /// Target table.
        table: String,
        /// Column that must be assigned.
        column: String,
    },

    /// DEFAULT was requested for a column that has no default.
    #[error("column '{column}' in table '{table}' has no default")]
    NoDefault {
        /// Target table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// A column declared with a default was given none at definition time.
    #[error("column '{column}' in table '{table}' is declared with a default but none was provided")]
    MissingDefault {
        /// Target table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// A column was assigned twice in one statement.
    #[error("column '{column}' assigned more than once in statement against '{table}'")]
    DuplicateAssignment {
        /// Target table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// Operand types were incompatible with an operator or function.
    #[error("type mismatch for {operator}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The operator or function involved.
        operator: String,
        /// What its signature expects.
        expected: String,
        /// What was actually supplied.
        found: String,
    },

    /// A plain column reference under GROUP BY was not a grouping key.
    #[error("column '{table}.{column}' is not a grouping key")]
    NotAGroupKey {
        /// Table of the reference.
        table: String,
        /// Column of the reference.
        column: String,
    },

    /// An aggregate was applied to an operand that is itself grouped.
    #[error("aggregate '{0}' applied to a grouped operand")]
    NestedAggregate(String),

    /// Per-row and aggregated expressions were combined in one node.
    #[error("cannot combine a grouped expression with a per-row expression in {0}")]
    MixedGrouping(String),

    /// A grouping-key reference was used by a statement that never
    /// declared GROUP BY.
    #[error("grouping-key reference in {0} without a GROUP BY declaration")]
    KeyWithoutGroupBy(String),

    /// GROUP BY was declared twice for one statement.
    #[error("GROUP BY already declared for this statement")]
    AlreadyGrouped,
}

impl Error {
    /// Returns the coarse class this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTable(_)
            | Self::UnknownColumn { .. }
            | Self::AmbiguousColumn(_)
            | Self::DuplicateTable(_)
            | Self::DuplicateColumn { .. }
            | Self::ParameterOutOfRange { .. }
            | Self::MissingRequiredColumn { .. }
            | Self::NoDefault { .. }
            | Self::MissingDefault { .. }
            | Self::DuplicateAssignment { .. } => ErrorKind::SchemaResolution,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::NotAGroupKey { .. }
            | Self::NestedAggregate(_)
            | Self::MixedGrouping(_)
            | Self::KeyWithoutGroupBy(_)
            | Self::AlreadyGrouped => ErrorKind::GroupingViolation,
        }
    }
}

/// Result type for statement construction.
pub type Result<T> = std::result::Result<T, Error>;
