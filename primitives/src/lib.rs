//! ## Library Design / Architecture
//!
//! Types and helpers shared by the encoding prover, the verifier and the
//! encoder service.
//!
//! ### Data Types
//!
//! The main data pipeline goes:
//! > blob bytes -> field elements -> [frame::Frame]s + [commitments::BlobCommitments]
//!
//! - Blob bytes: an opaque byte array. Every 32 bytes, read big-endian, must be
//!   a canonical bn254 scalar. [helpers::pad_payload] turns arbitrary user
//!   data into such an array.
//! - Field elements: the coefficients of the blob polynomial, obtained with
//!   [helpers::to_fr_array].
//! - [params::EncodingParams]: how many chunks the polynomial is extended to,
//!   and how many coded symbols each chunk carries.
//! - [frame::Frame]: one chunk, its interpolating coefficients and a KZG
//!   multiproof opening the blob commitment on the chunk's coset.
//! - [srs::SRS]: the structured reference string in monomial form.
//!
//! Frames and commitment points travel in one of two byte layouts, selected by
//! [frame::ChunkEncodingFormat].

pub mod commitments;
pub mod consts;
pub mod errors;
pub mod frame;
pub mod helpers;
pub mod params;
pub mod srs;
pub mod traits;
