use thiserror::Error;

/// Errors shared by HomeStats bridges and consumers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Zenoh error: {0}")]
    Zenoh(#[from] zenoh::Error),

    #[error("JSON payload error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR encoding failed: {0}")]
    CborEncode(String),

    #[error("CBOR decoding failed: {0}")]
    CborDecode(String),

    #[error("Invalid sent timestamp '{text}': {source}")]
    Timestamp {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid key expression: {0}")]
    KeyExpr(String),
}

impl From<ciborium::ser::Error<std::io::Error>> for Error {
    fn from(e: ciborium::ser::Error<std::io::Error>) -> Self {
        Error::CborEncode(e.to_string())
    }
}

impl From<ciborium::de::Error<std::io::Error>> for Error {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        Error::CborDecode(e.to_string())
    }
}

/// Result type alias using the HomeStats [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
