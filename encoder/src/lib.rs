//! Encoder service for eigenda blobs.
//!
//! [server::EncoderServer] admits requests into bounded pools, waits for a
//! free running slot, codes the blob with an
//! [eigenda_encoding_prover::backend::EncodingBackend] and serializes the
//! result in the configured [eigenda_encoding_primitives::frame::ChunkEncodingFormat].
//! Requests over the pool size are rejected right away instead of queuing
//! without bound.
//!
//! ```
//! use std::sync::Arc;
//! use eigenda_encoder::{
//!     config::EncoderConfig,
//!     context::RequestContext,
//!     metrics::NoopMetrics,
//!     server::{EncodeBlobRequest, EncoderServer},
//! };
//! use eigenda_encoding_primitives::{helpers::pad_payload, params::EncodingParams, srs::SRS};
//!
//! let srs = Arc::new(SRS::insecure_setup(b"doc", 64, 64).unwrap());
//! let server =
//!     EncoderServer::from_srs(EncoderConfig::default(), srs, Arc::new(NoopMetrics)).unwrap();
//! let request = EncodeBlobRequest {
//!     data: pad_payload(b"some rollup batch"),
//!     encoding_params: Some(EncodingParams::new(4, 8)),
//! };
//! let reply = server
//!     .encode_blob(&RequestContext::background(), &request)
//!     .unwrap();
//! assert_eq!(reply.chunks.len(), 8);
//! ```

pub mod config;
pub mod context;
pub mod errors;
pub mod gate;
pub mod metrics;
pub mod server;

pub use errors::EncoderError;
