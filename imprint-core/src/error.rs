use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImprintError {
    /// Malformed or undecodable input content. Not retried.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// The encoded watermark payload does not fit into the content's
    /// coefficient budget.
    #[error("payload too large: {needed} bits needed, {available} available")]
    PayloadTooLarge { needed: usize, available: usize },

    /// The content hash is already bound to an active record.
    #[error("content already registered under identifier {identifier}")]
    AlreadyRegistered { identifier: String },

    /// The identifier is already present in the registry or index.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// No record exists for the given identifier.
    #[error("identifier not found: {0}")]
    NotFound(String),

    /// The requester is not the owner of the record.
    #[error("requester {requester} is not the owner of {identifier}")]
    Unauthorized {
        identifier: String,
        requester: String,
    },

    /// A fingerprint did not match the index's fixed dimensionality.
    #[error("fingerprint dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Storage failure surfaced after bounded retries.
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ImprintError>;
