use thiserror::Error;

/// Top-level error type for the reconciler
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Type signature error: {0}")]
    Parse(#[from] ParseError),

    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Transaction plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors reported by the external ledger-query collaborator
///
/// These are propagated as-is: no retry, no transient/permanent split.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Malformed ledger response: {0}")]
    Malformed(String),
}

/// A type signature or type tag that does not match the expected shape.
///
/// Always recoverable: callers treat it as "type unknown".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty type signature")]
    Empty,

    #[error("Unexpected {found} at offset {offset}, expected {expected}")]
    Unexpected {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Expected {expected} type parameters, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("Nested type parameters are not supported in {0}")]
    NestedGeneric(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid type tag: {0}")]
    InvalidTypeTag(String),
}

/// Fixed-point conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unsupported decimals: {0}")]
    UnsupportedDecimals(u8),
}

/// Errors raised while building an unsigned transaction plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Deposit and payment coin types must differ: {0}")]
    SameCoinType(String),

    #[error("Escrow {0} no longer exists")]
    EscrowClosed(String),

    #[error("Escrow {object_id} is missing field {field}")]
    MissingField { object_id: String, field: &'static str },

    #[error("Missing object id for {0}")]
    MissingObjectId(&'static str),

    #[error(transparent)]
    Amount(#[from] AmountError),
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(format!("Error loading configuration: {:?}", error))
    }
}

impl From<rust_decimal::Error> for AmountError {
    fn from(error: rust_decimal::Error) -> Self {
        AmountError::InvalidAmount(format!("Decimal conversion error: {:?}", error))
    }
}

/// Result type alias for the reconciler
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for the unit converter
pub type AmountResult<T> = Result<T, AmountError>;
