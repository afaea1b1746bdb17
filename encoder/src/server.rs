use ark_bn254::Fr;
use ark_serialize::CanonicalSerialize;
use eigenda_encoding_primitives::{
    commitments::SerializedCommitments, errors::EncodingError, frame::ChunkEncodingFormat,
    helpers, params::EncodingParams, srs::SRS,
};
use eigenda_encoding_prover::backend::{new_backend, EncodingBackend};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::EncoderConfig,
    context::RequestContext,
    errors::EncoderError,
    gate::RequestPool,
    metrics::{Metrics, Outcome, Pipeline},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodeBlobRequest {
    pub data: Vec<u8>,
    pub encoding_params: Option<EncodingParams>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeBlobReply {
    pub commitment: SerializedCommitments,
    /// One serialized frame per chunk index, in chunk order.
    pub chunks: Vec<Vec<u8>>,
    pub chunk_encoding_format: ChunkEncodingFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeRsReply {
    /// Interpolation coefficients of every chunk, 32 bytes per symbol.
    pub chunks: Vec<Vec<u8>>,
    pub indices: Vec<u32>,
    pub chunk_encoding_format: ChunkEncodingFormat,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitBlobRequest {
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitBlobReply {
    pub commitment: SerializedCommitments,
    pub chunk_encoding_format: ChunkEncodingFormat,
}

/// Encoder service bounding how many requests wait and run at once.
///
/// Each pipeline owns a [RequestPool]. A request first takes an admission
/// slot without waiting, and is rejected with [EncoderError::TooManyRequests]
/// when none is free. It then waits for a running slot, so at most
/// `max_concurrent_requests` requests code at once and at most
/// `request_pool_size` are held in memory.
pub struct EncoderServer {
    config: EncoderConfig,
    backend: Arc<dyn EncodingBackend>,
    metrics: Arc<dyn Metrics>,
    blob_pool: RequestPool,
    rs_pool: RequestPool,
    kzg_pool: RequestPool,
}

impl EncoderServer {
    pub fn new(
        config: EncoderConfig,
        backend: Arc<dyn EncodingBackend>,
        metrics: Arc<dyn Metrics>,
    ) -> Result<Self, EncoderError> {
        config.validate()?;
        let pool =
            || RequestPool::new(config.request_pool_size, config.max_concurrent_requests);
        let (blob_pool, rs_pool, kzg_pool) = (pool(), pool(), pool());

        info!(
            max_concurrent_requests = config.max_concurrent_requests,
            request_pool_size = config.request_pool_size,
            chunk_encoding_format = ?config.chunk_encoding_format,
            enable_rs = config.enable_rs,
            enable_kzg = config.enable_kzg,
            "encoder server configured"
        );

        Ok(Self {
            config,
            backend,
            metrics,
            blob_pool,
            rs_pool,
            kzg_pool,
        })
    }

    /// Builds the backend named by the config on top of `srs`.
    pub fn from_srs(
        config: EncoderConfig,
        srs: Arc<SRS>,
        metrics: Arc<dyn Metrics>,
    ) -> Result<Self, EncoderError> {
        let backend = new_backend(config.backend, srs)
            .map_err(|e| EncoderError::Config(e.to_string()))?;
        Self::new(config, backend, metrics)
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn pool(&self, pipeline: Pipeline) -> &RequestPool {
        match pipeline {
            Pipeline::Blob => &self.blob_pool,
            Pipeline::Rs => &self.rs_pool,
            Pipeline::Kzg => &self.kzg_pool,
        }
    }

    /// Commits to the blob and codes it into serialized, provable frames.
    pub fn encode_blob(
        &self,
        ctx: &RequestContext,
        request: &EncodeBlobRequest,
    ) -> Result<EncodeBlobReply, EncoderError> {
        let format = self.config.chunk_encoding_format;
        self.handle(
            Pipeline::Blob,
            ctx,
            request.data.len(),
            || validate_request(&request.data, request.encoding_params),
            |params| self.backend.encode_and_prove(&request.data, params),
            |(commitments, frames)| {
                let commitment = commitments.serialize(format)?;
                let chunks = frames
                    .iter()
                    .map(|frame| frame.serialize(format))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(EncodeBlobReply {
                    commitment,
                    chunks,
                    chunk_encoding_format: format,
                })
            },
        )
    }

    /// Reed-Solomon chunks of the blob, without commitments or proofs.
    pub fn encode_rs(
        &self,
        ctx: &RequestContext,
        request: &EncodeBlobRequest,
    ) -> Result<EncodeRsReply, EncoderError> {
        if !self.config.enable_rs {
            self.metrics
                .record_outcome(Pipeline::Rs, Outcome::Failure, request.data.len());
            return Err(EncoderError::Disabled(Pipeline::Rs.as_str()));
        }
        let format = self.config.chunk_encoding_format;
        self.handle(
            Pipeline::Rs,
            ctx,
            request.data.len(),
            || validate_request(&request.data, request.encoding_params),
            |params| self.backend.encode(&request.data, params),
            |(chunks, indices)| {
                let chunks = chunks
                    .iter()
                    .map(|chunk| serialize_symbols(chunk, format))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(EncodeRsReply {
                    chunks,
                    indices,
                    chunk_encoding_format: format,
                })
            },
        )
    }

    /// Commitments of the blob only.
    pub fn commit_blob(
        &self,
        ctx: &RequestContext,
        request: &CommitBlobRequest,
    ) -> Result<CommitBlobReply, EncoderError> {
        if !self.config.enable_kzg {
            self.metrics
                .record_outcome(Pipeline::Kzg, Outcome::Failure, request.data.len());
            return Err(EncoderError::Disabled(Pipeline::Kzg.as_str()));
        }
        let format = self.config.chunk_encoding_format;
        self.handle(
            Pipeline::Kzg,
            ctx,
            request.data.len(),
            || validate_data(&request.data),
            |()| self.backend.get_commitments(&request.data),
            |commitments| {
                Ok(CommitBlobReply {
                    commitment: commitments.serialize(format)?,
                    chunk_encoding_format: format,
                })
            },
        )
    }

    /// Runs one request through admission, queuing, coding and
    /// serialization, recording exactly one outcome.
    fn handle<V, E, T>(
        &self,
        pipeline: Pipeline,
        ctx: &RequestContext,
        data_size: usize,
        validate: impl FnOnce() -> Result<V, EncoderError>,
        encode: impl FnOnce(V) -> Result<E, EncodingError>,
        serialize: impl FnOnce(E) -> Result<T, EncodingError>,
    ) -> Result<T, EncoderError> {
        let received = Instant::now();
        let pool = self.pool(pipeline);

        let Some(admission) = pool.try_admit() else {
            self.metrics
                .record_outcome(pipeline, Outcome::RateLimited, data_size);
            warn!(
                %pipeline,
                pool_size = pool.admission().capacity(),
                "rate limiting as request pool is full"
            );
            return Err(EncoderError::TooManyRequests);
        };

        let validated = match validate() {
            Ok(validated) => validated,
            Err(err) => {
                self.metrics.record_outcome(pipeline, Outcome::Failure, data_size);
                warn!(%pipeline, %err, "rejecting invalid request");
                return Err(err);
            },
        };

        let _permit = pool.run(admission);
        if let Some(err) = ctx.err() {
            self.metrics
                .record_outcome(pipeline, Outcome::Cancelled, data_size);
            debug!(%pipeline, %err, "request cancelled while queued");
            return Err(err.into());
        }
        self.metrics
            .observe_latency(pipeline, "queuing", received.elapsed());

        let started = Instant::now();
        let encoded = encode(validated)
            .map_err(|e| self.fail(pipeline, data_size, received, EncoderError::encoding(e)))?;
        let encoding_latency = started.elapsed();
        self.metrics
            .observe_latency(pipeline, "encoding", encoding_latency);

        let started = Instant::now();
        let reply = serialize(encoded)
            .map_err(|e| self.fail(pipeline, data_size, received, EncoderError::serialization(e)))?;
        self.metrics
            .observe_latency(pipeline, "serialization", started.elapsed());

        if let Some(err) = ctx.err() {
            self.metrics
                .record_outcome(pipeline, Outcome::Cancelled, data_size);
            debug!(%pipeline, %err, "request cancelled while encoding, dropping the result");
            return Err(err.into());
        }

        self.metrics.record_outcome(pipeline, Outcome::Success, data_size);
        let total = received.elapsed();
        self.metrics.observe_latency(pipeline, "total", total);
        debug!(
            %pipeline,
            data_size,
            encoding_ms = duration_ms(encoding_latency),
            total_ms = duration_ms(total),
            "request served"
        );
        Ok(reply)
    }

    fn fail(
        &self,
        pipeline: Pipeline,
        data_size: usize,
        received: Instant,
        err: EncoderError,
    ) -> EncoderError {
        self.metrics.record_outcome(pipeline, Outcome::Failure, data_size);
        self.metrics
            .observe_latency(pipeline, "total", received.elapsed());
        error!(%pipeline, data_size, %err, "encoding request failed");
        err
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

fn validate_data(data: &[u8]) -> Result<(), EncoderError> {
    if data.is_empty() {
        return Err(EncoderError::Validation("missing data".to_string()));
    }
    Ok(())
}

fn validate_request(
    data: &[u8],
    params: Option<EncodingParams>,
) -> Result<EncodingParams, EncoderError> {
    validate_data(data)?;
    let params = params
        .ok_or_else(|| EncoderError::Validation("missing encoding parameters".to_string()))?;
    params
        .validate(u64::MAX)
        .map_err(|e| EncoderError::Validation(e.to_string()))?;
    Ok(params)
}

/// Symbols of a chunk, 32 bytes each, big-endian for [ChunkEncodingFormat::Generic]
/// and arkworks compressed for [ChunkEncodingFormat::Native].
fn serialize_symbols(symbols: &[Fr], format: ChunkEncodingFormat) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(symbols.len() * 32);
    for symbol in symbols {
        match format {
            ChunkEncodingFormat::Generic => out.extend_from_slice(&helpers::fr_to_bytes_be(symbol)),
            ChunkEncodingFormat::Native => symbol
                .serialize_compressed(&mut out)
                .map_err(|e| EncodingError::SerializationError(e.to_string()))?,
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_request() {
        assert_eq!(
            validate_request(&[], Some(EncodingParams::new(1, 1))),
            Err(EncoderError::Validation("missing data".to_string()))
        );
        assert_eq!(
            validate_request(&[0], None),
            Err(EncoderError::Validation("missing encoding parameters".to_string()))
        );
        assert!(matches!(
            validate_request(&[0], Some(EncodingParams::new(3, 4))),
            Err(EncoderError::Validation(_))
        ));
        assert_eq!(
            validate_request(&[0], Some(EncodingParams::new(2, 4))),
            Ok(EncodingParams::new(2, 4))
        );
    }

    #[test]
    fn test_serialize_symbols() {
        let symbols = vec![Fr::from(1u64), Fr::from(2u64)];
        let generic = serialize_symbols(&symbols, ChunkEncodingFormat::Generic).unwrap();
        assert_eq!(generic.len(), 64);
        assert_eq!(generic[31], 1);
        assert_eq!(generic[63], 2);

        let native = serialize_symbols(&symbols, ChunkEncodingFormat::Native).unwrap();
        assert_eq!(native.len(), 64);
        assert_eq!(native[0], 1);
        assert_eq!(native[32], 2);
    }
}
