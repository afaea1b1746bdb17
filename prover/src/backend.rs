use ark_bn254::Fr;
use eigenda_encoding_primitives::{
    commitments::BlobCommitments, errors::EncodingError, frame::Frame, params::EncodingParams,
    srs::SRS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::kzg::KzgProver;

/// Compute device used for coding and proving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Cpu,
    /// Accelerated backend. Not compiled into this build, selecting it fails
    /// at construction instead of silently running on the cpu.
    Gpu,
}

/// The operations the encoder service needs from a coding backend.
pub trait EncodingBackend: Send + Sync {
    fn encode(
        &self,
        data: &[u8],
        params: EncodingParams,
    ) -> Result<(Vec<Vec<Fr>>, Vec<u32>), EncodingError>;

    fn get_commitments(&self, data: &[u8]) -> Result<BlobCommitments, EncodingError>;

    fn encode_and_prove(
        &self,
        data: &[u8],
        params: EncodingParams,
    ) -> Result<(BlobCommitments, Vec<Frame>), EncodingError>;

    fn decode(
        &self,
        chunks: &[Vec<Fr>],
        indices: &[u32],
        max_input_size: usize,
        params: EncodingParams,
    ) -> Result<Vec<u8>, EncodingError>;
}

impl EncodingBackend for KzgProver {
    fn encode(
        &self,
        data: &[u8],
        params: EncodingParams,
    ) -> Result<(Vec<Vec<Fr>>, Vec<u32>), EncodingError> {
        KzgProver::encode(self, data, params)
    }

    fn get_commitments(&self, data: &[u8]) -> Result<BlobCommitments, EncodingError> {
        KzgProver::get_commitments(self, data)
    }

    fn encode_and_prove(
        &self,
        data: &[u8],
        params: EncodingParams,
    ) -> Result<(BlobCommitments, Vec<Frame>), EncodingError> {
        KzgProver::encode_and_prove(self, data, params)
    }

    fn decode(
        &self,
        chunks: &[Vec<Fr>],
        indices: &[u32],
        max_input_size: usize,
        params: EncodingParams,
    ) -> Result<Vec<u8>, EncodingError> {
        KzgProver::decode(self, chunks, indices, max_input_size, params)
    }
}

/// Builds the backend selected by `kind` on top of `srs`.
pub fn new_backend(
    kind: BackendKind,
    srs: Arc<SRS>,
) -> Result<Arc<dyn EncodingBackend>, EncodingError> {
    match kind {
        BackendKind::Cpu => Ok(Arc::new(KzgProver::new(srs))),
        BackendKind::Gpu => Err(EncodingError::UnsupportedBackend(
            "gpu backend is not available in this build".to_string(),
        )),
    }
}
