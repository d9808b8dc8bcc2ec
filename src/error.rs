use std::time::Duration;

use thiserror::Error;

/// Content rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message content is empty")]
    EmptyContent,
}

/// Errors raised by the table store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is not initialized; call init() before issuing queries")]
    NotReady,

    #[error("schema error: {0}")]
    Schema(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("storage operation '{operation}' timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum KeyGenError {
    #[error("unsupported modulus size: {0} bits")]
    UnsupportedModulus(usize),

    #[error("key generation failed: {0}")]
    Primitive(String),

    #[error("key generation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum KeyImportError {
    #[error("missing PEM marker '{0}'")]
    MissingMarker(&'static str),

    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid key encoding: {0}")]
    Encoding(String),
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing failed: {0}")]
    Primitive(String),

    #[error("signing timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("signature is {actual} bytes, expected {expected} for this key")]
    SignatureLength { expected: usize, actual: usize },

    #[error("verification could not run: {0}")]
    Primitive(String),

    #[error("verification timed out after {0:?}")]
    Timeout(Duration),
}

/// Everything the chat session can hand back to its caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    KeyGen(#[from] KeyGenError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("no identity has been generated for this session")]
    NoIdentity,
}

impl SessionError {
    /// Schema corruption is the only failure the session cannot recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Store(StoreError::Schema(_)))
    }
}
