use thiserror::Error;

/// Errors related to encoding, committing, proving and verifying blobs.
///
/// The `EncodingError` enum is shared by the prover, the verifier and the
/// wire formats so that callers only have to match on a single type.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EncodingError {
    /// Encoding params are zero, not a power of two, or too large for the SRS.
    #[error("invalid encoding params: {0}")]
    InvalidEncodingParams(String),

    /// Error indicating invalid field element bytes that exceed the field modulus.
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    /// The blob holds more symbols than the params can encode.
    #[error("data too large: {num_elements} symbols exceed {capacity} evaluations")]
    DataTooLarge { num_elements: usize, capacity: usize },

    /// Not enough distinct chunks were supplied to reconstruct the blob.
    #[error("insufficient symbols: have {available}, need {required}")]
    InsufficientSymbols { available: usize, required: usize },

    /// Vectors or matrices whose lengths must agree do not.
    #[error("dimension inconsistent: {0}")]
    DimensionMismatch(String),

    /// Error when the requested operation needs more points than the SRS holds.
    #[error("required {required} srs points exceeds SRS capacity {srs_len}")]
    SrsCapacityExceeded { required: usize, srs_len: usize },

    /// Error related to Fast Fourier Transform (FFT) operations with a descriptive message.
    #[error("FFT error: {0}")]
    FFTError(String),

    #[error("MSM error: {0}")]
    MsmError(String),

    /// Error related to serialization with a descriptive message.
    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("not on curve error: {0}")]
    NotOnCurveError(String),

    /// The requested compute backend is not available in this build.
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// A generic error with a descriptive message.
    #[error("generic error: {0}")]
    GenericError(String),
}
