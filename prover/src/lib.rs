//! Encoding side of eigenda blobs.
//!
//! - [rs::RsEncoder] extends a blob polynomial and splits it into chunks, and
//!   recovers the blob from any sufficient subset of them.
//! - [toeplitz::Circular] multiplies circulant matrices by vectors with FFTs.
//! - [kzg::KzgProver] commits to blobs and proves every chunk at once.
//! - [backend] selects the compute device.
//!
//! ```
//! use std::sync::Arc;
//! use eigenda_encoding_primitives::{helpers::pad_payload, params::EncodingParams, srs::SRS};
//! use eigenda_encoding_prover::kzg::KzgProver;
//!
//! let srs = Arc::new(SRS::insecure_setup(b"doc", 64, 64).unwrap());
//! let prover = KzgProver::new(srs);
//! let blob = pad_payload(b"some rollup batch");
//! let (commitments, frames) = prover
//!     .encode_and_prove(&blob, EncodingParams::new(4, 8))
//!     .unwrap();
//! assert_eq!(frames.len(), 8);
//! assert_eq!(commitments.length, 1);
//! ```

pub mod backend;
pub mod kzg;
pub mod rs;
pub mod toeplitz;
