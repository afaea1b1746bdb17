use eigenda_encoding_primitives::frame::ChunkEncodingFormat;
use eigenda_encoding_prover::backend::BackendKind;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

use crate::errors::EncoderError;

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 16;
pub const DEFAULT_REQUEST_POOL_SIZE: usize = 32;

/// Settings of the encoder service. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Requests coding at the same time, per pipeline.
    pub max_concurrent_requests: usize,
    /// Requests admitted at the same time, running or waiting, per pipeline.
    pub request_pool_size: usize,
    /// Wire format of frames and commitment points in replies.
    pub chunk_encoding_format: ChunkEncodingFormat,
    /// Serve [crate::server::EncoderServer::encode_rs].
    pub enable_rs: bool,
    /// Serve [crate::server::EncoderServer::commit_blob].
    pub enable_kzg: bool,
    pub backend: BackendKind,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            request_pool_size: DEFAULT_REQUEST_POOL_SIZE,
            chunk_encoding_format: ChunkEncodingFormat::default(),
            enable_rs: true,
            enable_kzg: true,
            backend: BackendKind::default(),
        }
    }
}

impl EncoderConfig {
    /// Reads a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EncoderError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| EncoderError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, EncoderError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EncoderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EncoderError> {
        if self.max_concurrent_requests == 0 {
            return Err(EncoderError::Config(
                "max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        if self.request_pool_size == 0 {
            return Err(EncoderError::Config(
                "request_pool_size must be greater than 0".to_string(),
            ));
        }
        if self.request_pool_size < self.max_concurrent_requests {
            warn!(
                request_pool_size = self.request_pool_size,
                max_concurrent_requests = self.max_concurrent_requests,
                "request pool is smaller than the concurrency limit, only the pool bounds concurrency"
            );
        }
        Ok(())
    }
}
