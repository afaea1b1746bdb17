use eigenda_encoding_primitives::errors::EncodingError;
use thiserror::Error;

use crate::context::ContextError;

/// Errors returned by the encoder service.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EncoderError {
    /// The admission pool of the pipeline is full. The request was not queued.
    #[error("too many requests")]
    TooManyRequests,

    /// The request context was cancelled or expired before the reply was ready.
    #[error(transparent)]
    Cancelled(#[from] ContextError),

    /// The request is malformed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The pipeline is switched off by configuration.
    #[error("{0} pipeline is disabled")]
    Disabled(&'static str),

    /// Coding, proving or serialization failed.
    #[error("{stage} failed: {source}")]
    Encoding {
        stage: &'static str,
        #[source]
        source: EncodingError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EncoderError {
    pub(crate) fn encoding(source: EncodingError) -> Self {
        Self::Encoding {
            stage: "encoding",
            source,
        }
    }

    pub(crate) fn serialization(source: EncodingError) -> Self {
        Self::Encoding {
            stage: "serialization",
            source,
        }
    }
}
