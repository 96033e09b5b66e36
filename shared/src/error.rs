use thiserror::Error;

/// Everything that can stop an invocation before or while items are forwarded.
///
/// None of these reach the Lambda runtime; the handler logs them and completes normally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntrypointError {
    #[error("Missing {variable} environment variable")]
    Configuration { variable: String },

    #[error("Invalid {variable} environment variable: {reason}")]
    InvalidConfiguration { variable: String, reason: String },

    #[error("Database does not contain table {table_name}")]
    ResourceNotFound { table_name: String },

    #[error("SQS event does not contain records")]
    MalformedEvent,

    #[error("Failed to check for table {table_name}: {reason}")]
    TableCheck { table_name: String, reason: String },

    #[error("Failed to process items: {0}")]
    Processing(String),
}
