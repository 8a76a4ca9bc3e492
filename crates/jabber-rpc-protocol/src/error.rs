//! Protocol error types.

use thiserror::Error;

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while writing an envelope.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Command name was empty.
    #[error("method name must not be empty")]
    EmptyMethodName,

    /// NaN and infinities have no XML-RPC representation.
    #[error("cannot encode non-finite double {0}")]
    NonFiniteDouble(f64),

    /// The XML writer failed.
    #[error("failed to write XML: {0}")]
    Write(String),
}

/// Errors that can occur while reading an envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Nothing but whitespace was received.
    #[error("empty response body")]
    Empty,

    /// Input ended before the root element was closed.
    #[error("truncated envelope: input ended inside <{open}>")]
    Truncated { open: String },

    /// Body is not valid UTF-8.
    #[error("response is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The XML itself could not be tokenized.
    #[error("XML syntax error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Well-formed XML that is not a valid XML-RPC envelope.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Elements nested deeper than [`crate::decode::MAX_DEPTH`].
    #[error("elements nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// A scalar whose text does not parse as its declared type.
    #[error("invalid {kind} value: {text:?}")]
    InvalidScalar { kind: &'static str, text: String },
}

impl DecodeError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub(crate) fn xml(position: impl TryInto<u64>, source: quick_xml::Error) -> Self {
        Self::Xml {
            position: position.try_into().unwrap_or(u64::MAX),
            source,
        }
    }
}
