#[cfg(test)]
mod tests {
    use ark_bn254::Fr;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use eigenda_encoder::{
        config::EncoderConfig,
        context::{ContextError, RequestContext},
        errors::EncoderError,
        metrics::{Outcome, Pipeline, RecordingMetrics},
        server::{CommitBlobRequest, EncodeBlobRequest, EncoderServer},
    };
    use eigenda_encoding_primitives::{
        commitments::BlobCommitments,
        errors::EncodingError,
        frame::{ChunkEncodingFormat, Frame},
        helpers::{self, pad_payload},
        params::EncodingParams,
        srs::SRS,
    };
    use eigenda_encoding_prover::{
        backend::{BackendKind, EncodingBackend},
        kzg::KzgProver,
    };
    use eigenda_encoding_verifier::{
        batch::verify_frames,
        verify::{verify_blob_commitments, verify_frame},
    };
    use lazy_static::lazy_static;
    use rand::Rng;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };
    use tracing_subscriber::EnvFilter;

    const SRS_ORDER: u32 = 256;

    lazy_static! {
        static ref SRS_INSTANCE: Arc<SRS> =
            Arc::new(SRS::insecure_setup(b"encoder-test", SRS_ORDER, SRS_ORDER).unwrap());
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn random_blob(len: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        pad_payload(&payload)
    }

    fn request(data: Vec<u8>, params: EncodingParams) -> EncodeBlobRequest {
        EncodeBlobRequest {
            data,
            encoding_params: Some(params),
        }
    }

    fn cpu_server(config: EncoderConfig) -> (EncoderServer, Arc<RecordingMetrics>) {
        init_tracing();
        let metrics = Arc::new(RecordingMetrics::new());
        let server = EncoderServer::from_srs(config, SRS_INSTANCE.clone(), metrics.clone()).unwrap();
        (server, metrics)
    }

    /// Parks every coding call until the test lets it go.
    struct BlockingBackend {
        inner: KzgProver,
        entered: Sender<()>,
        release: Receiver<()>,
        calls: AtomicUsize,
    }

    impl BlockingBackend {
        fn new() -> (Arc<Self>, Receiver<()>, Sender<()>) {
            let (entered_tx, entered_rx) = unbounded();
            let (release_tx, release_rx) = unbounded();
            let backend = Arc::new(Self {
                inner: KzgProver::new(SRS_INSTANCE.clone()),
                entered: entered_tx,
                release: release_rx,
                calls: AtomicUsize::new(0),
            });
            (backend, entered_rx, release_tx)
        }

        fn park(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
    }

    impl EncodingBackend for BlockingBackend {
        fn encode(
            &self,
            data: &[u8],
            params: EncodingParams,
        ) -> Result<(Vec<Vec<Fr>>, Vec<u32>), EncodingError> {
            self.park();
            self.inner.encode(data, params)
        }

        fn get_commitments(&self, data: &[u8]) -> Result<BlobCommitments, EncodingError> {
            self.park();
            self.inner.get_commitments(data)
        }

        fn encode_and_prove(
            &self,
            data: &[u8],
            params: EncodingParams,
        ) -> Result<(BlobCommitments, Vec<Frame>), EncodingError> {
            self.park();
            self.inner.encode_and_prove(data, params)
        }

        fn decode(
            &self,
            chunks: &[Vec<Fr>],
            indices: &[u32],
            max_input_size: usize,
            params: EncodingParams,
        ) -> Result<Vec<u8>, EncodingError> {
            self.inner.decode(chunks, indices, max_input_size, params)
        }
    }

    fn blocking_server(
        pool_size: usize,
        max_concurrent: usize,
    ) -> (EncoderServer, Arc<RecordingMetrics>, Arc<BlockingBackend>, Receiver<()>, Sender<()>) {
        init_tracing();
        let (backend, entered, release) = BlockingBackend::new();
        let metrics = Arc::new(RecordingMetrics::new());
        let config = EncoderConfig {
            request_pool_size: pool_size,
            max_concurrent_requests: max_concurrent,
            ..Default::default()
        };
        let server = EncoderServer::new(config, backend.clone(), metrics.clone()).unwrap();
        (server, metrics, backend, entered, release)
    }

    #[test]
    fn test_encode_blob_frames_verify() {
        for format in [ChunkEncodingFormat::Generic, ChunkEncodingFormat::Native] {
            let (server, metrics) = cpu_server(EncoderConfig {
                chunk_encoding_format: format,
                ..Default::default()
            });
            let blob = random_blob(400);
            let params = EncodingParams::new(4, 16);
            let reply = server
                .encode_blob(&RequestContext::background(), &request(blob.clone(), params))
                .unwrap();
            assert_eq!(reply.chunk_encoding_format, format);
            assert_eq!(reply.chunks.len(), 16);

            let commitments = BlobCommitments::deserialize(&reply.commitment, format).unwrap();
            assert!(verify_blob_commitments(&SRS_INSTANCE, &commitments).unwrap());
            assert_eq!(
                commitments.length as usize,
                helpers::get_num_element(blob.len(), 32).next_power_of_two()
            );

            let frames: Vec<Frame> = reply
                .chunks
                .iter()
                .map(|bytes| Frame::deserialize(bytes, format).unwrap())
                .collect();
            for (j, frame) in frames.iter().enumerate() {
                assert_eq!(frame.len(), 4);
                assert!(
                    verify_frame(&SRS_INSTANCE, &commitments.commitment, frame, j as u32, &params)
                        .unwrap()
                );
            }
            let indices: Vec<u32> = (0..16).collect();
            assert!(
                verify_frames(&SRS_INSTANCE, &commitments.commitment, &frames, &indices, &params)
                    .unwrap()
            );

            assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Success).requests, 1);
            assert_eq!(
                metrics.outcome(Pipeline::Blob, Outcome::Success).bytes,
                blob.len() as u64
            );
            for stage in ["queuing", "encoding", "serialization", "total"] {
                assert_eq!(metrics.latencies(Pipeline::Blob, stage).len(), 1, "{}", stage);
            }
        }
    }

    #[test]
    fn test_encode_rs_matches_prover_chunks() {
        let (server, metrics) = cpu_server(EncoderConfig::default());
        let blob = random_blob(200);
        let params = EncodingParams::new(8, 8);
        let reply = server
            .encode_rs(&RequestContext::background(), &request(blob.clone(), params))
            .unwrap();

        let prover = KzgProver::new(SRS_INSTANCE.clone());
        let (chunks, indices) = prover.encode(&blob, params).unwrap();
        assert_eq!(reply.indices, indices);
        assert_eq!(reply.chunks.len(), chunks.len());
        for (bytes, chunk) in reply.chunks.iter().zip(&chunks) {
            let decoded: Vec<Fr> = bytes
                .chunks_exact(32)
                .map(|b| helpers::fr_from_bytes_be_canonical(b).unwrap())
                .collect();
            assert_eq!(&decoded, chunk);
        }

        // any half of the chunks recovers the blob
        let recovered = prover
            .decode(&chunks[4..], &indices[4..], blob.len(), params)
            .unwrap();
        assert_eq!(recovered, blob);
        assert_eq!(metrics.outcome(Pipeline::Rs, Outcome::Success).requests, 1);
    }

    #[test]
    fn test_encode_rs_beyond_srs_order() {
        let (server, metrics) = cpu_server(EncoderConfig::default());
        let params = EncodingParams::new(64, 8);
        assert!(params.num_evaluations() > SRS_ORDER as u64);
        let reply = server
            .encode_rs(&RequestContext::background(), &request(random_blob(1000), params))
            .unwrap();
        assert_eq!(reply.chunks.len(), 8);
        assert!(reply.chunks.iter().all(|chunk| chunk.len() == 64 * 32));
        assert_eq!(metrics.outcome(Pipeline::Rs, Outcome::Success).requests, 1);
    }

    #[test]
    fn test_commit_blob_matches_encode_blob() {
        let (server, metrics) = cpu_server(EncoderConfig::default());
        let blob = random_blob(100);
        let ctx = RequestContext::background();
        let committed = server
            .commit_blob(&ctx, &CommitBlobRequest { data: blob.clone() })
            .unwrap();
        let encoded = server
            .encode_blob(&ctx, &request(blob, EncodingParams::new(2, 8)))
            .unwrap();
        assert_eq!(committed.commitment, encoded.commitment);
        assert_eq!(metrics.outcome(Pipeline::Kzg, Outcome::Success).requests, 1);
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Success).requests, 1);
    }

    #[test]
    fn test_validation_errors() {
        let (server, metrics) = cpu_server(EncoderConfig::default());
        let ctx = RequestContext::background();

        let err = server
            .encode_blob(&ctx, &request(Vec::new(), EncodingParams::new(2, 8)))
            .unwrap_err();
        assert_eq!(err, EncoderError::Validation("missing data".to_string()));

        let err = server
            .encode_blob(
                &ctx,
                &EncodeBlobRequest {
                    data: random_blob(10),
                    encoding_params: None,
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            EncoderError::Validation("missing encoding parameters".to_string())
        );

        let err = server
            .encode_blob(&ctx, &request(random_blob(10), EncodingParams::new(3, 8)))
            .unwrap_err();
        assert!(matches!(err, EncoderError::Validation(_)));

        let err = server
            .commit_blob(&ctx, &CommitBlobRequest { data: Vec::new() })
            .unwrap_err();
        assert_eq!(err, EncoderError::Validation("missing data".to_string()));

        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Failure).requests, 3);
        assert_eq!(metrics.outcome(Pipeline::Kzg, Outcome::Failure).requests, 1);
        assert!(metrics.latencies(Pipeline::Blob, "queuing").is_empty());
    }

    #[test]
    fn test_encoding_failure_reports_stage() {
        let (server, metrics) = cpu_server(EncoderConfig::default());
        // 4 x 4 evaluations cannot hold a blob of 64 symbols
        let err = server
            .encode_blob(
                &RequestContext::background(),
                &request(vec![0u8; 64 * 32], EncodingParams::new(4, 4)),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EncoderError::Encoding {
                stage: "encoding",
                source: EncodingError::DataTooLarge { .. }
            }
        ));
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Failure).requests, 1);
        assert_eq!(metrics.latencies(Pipeline::Blob, "queuing").len(), 1);
        assert!(metrics.latencies(Pipeline::Blob, "encoding").is_empty());
        assert_eq!(metrics.latencies(Pipeline::Blob, "total").len(), 1);

        // params larger than the srs
        let err = server
            .encode_blob(
                &RequestContext::background(),
                &request(random_blob(10), EncodingParams::new(64, 8)),
            )
            .unwrap_err();
        assert!(matches!(err, EncoderError::Encoding { stage: "encoding", .. }));
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Failure).requests, 2);
        assert_eq!(metrics.latencies(Pipeline::Blob, "total").len(), 2);
    }

    #[test]
    fn test_disabled_pipelines() {
        let (server, metrics) = cpu_server(EncoderConfig {
            enable_rs: false,
            enable_kzg: false,
            ..Default::default()
        });
        let ctx = RequestContext::background();
        let blob = random_blob(10);

        assert_eq!(
            server
                .encode_rs(&ctx, &request(blob.clone(), EncodingParams::new(2, 8)))
                .unwrap_err(),
            EncoderError::Disabled("rs")
        );
        assert_eq!(
            server
                .commit_blob(&ctx, &CommitBlobRequest { data: blob.clone() })
                .unwrap_err(),
            EncoderError::Disabled("kzg")
        );
        // the full pipeline is always served
        assert!(server
            .encode_blob(&ctx, &request(blob, EncodingParams::new(2, 8)))
            .is_ok());
        assert_eq!(metrics.total_requests(Pipeline::Rs), 1);
        assert_eq!(metrics.total_requests(Pipeline::Kzg), 1);
    }

    #[test]
    fn test_gpu_backend_is_a_config_error() {
        let config = EncoderConfig {
            backend: BackendKind::Gpu,
            ..Default::default()
        };
        let result = EncoderServer::from_srs(
            config,
            SRS_INSTANCE.clone(),
            Arc::new(RecordingMetrics::new()),
        );
        assert!(matches!(result, Err(EncoderError::Config(_))));
    }

    #[test]
    fn test_full_pool_rejects_immediately() {
        let (server, metrics, backend, entered, release) = blocking_server(1, 1);
        let params = EncodingParams::new(2, 8);
        let blob = random_blob(50);

        thread::scope(|s| {
            let running = s.spawn(|| {
                server.encode_blob(&RequestContext::background(), &request(blob.clone(), params))
            });
            entered.recv().unwrap();

            let err = server
                .encode_blob(&RequestContext::background(), &request(blob.clone(), params))
                .unwrap_err();
            assert_eq!(err, EncoderError::TooManyRequests);
            assert_eq!(err.to_string(), "too many requests");
            assert_eq!(
                metrics.outcome(Pipeline::Blob, Outcome::RateLimited).requests,
                1
            );

            release.send(()).unwrap();
            assert!(running.join().unwrap().is_ok());
        });

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Success).requests, 1);
        assert_eq!(metrics.total_requests(Pipeline::Blob), 2);
        assert_eq!(server.pool(Pipeline::Blob).admission().in_use(), 0);
    }

    #[test]
    fn test_pipelines_have_separate_pools() {
        let (server, metrics, _backend, entered, release) = blocking_server(1, 1);
        let params = EncodingParams::new(2, 8);
        let blob = random_blob(50);

        thread::scope(|s| {
            let blob_request = s.spawn(|| {
                server.encode_blob(&RequestContext::background(), &request(blob.clone(), params))
            });
            entered.recv().unwrap();

            let rs_request = s.spawn(|| {
                server.encode_rs(&RequestContext::background(), &request(blob.clone(), params))
            });
            entered.recv().unwrap();

            release.send(()).unwrap();
            release.send(()).unwrap();
            assert!(blob_request.join().unwrap().is_ok());
            assert!(rs_request.join().unwrap().is_ok());
        });
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::RateLimited).requests, 0);
        assert_eq!(metrics.outcome(Pipeline::Rs, Outcome::RateLimited).requests, 0);
    }

    #[test]
    fn test_full_concurrency_gate_queues() {
        let (server, metrics, _backend, entered, release) = blocking_server(2, 1);
        let params = EncodingParams::new(2, 8);
        let blob = random_blob(50);

        thread::scope(|s| {
            let first = s.spawn(|| {
                server.encode_blob(&RequestContext::background(), &request(blob.clone(), params))
            });
            entered.recv().unwrap();

            let second = s.spawn(|| {
                server.encode_blob(&RequestContext::background(), &request(blob.clone(), params))
            });
            // the second request holds its admission slot while it waits
            while server.pool(Pipeline::Blob).admission().in_use() < 2 {
                thread::yield_now();
            }
            thread::sleep(Duration::from_millis(50));
            assert!(entered.try_recv().is_err());

            release.send(()).unwrap();
            entered.recv().unwrap();
            release.send(()).unwrap();

            assert!(first.join().unwrap().is_ok());
            assert!(second.join().unwrap().is_ok());
        });

        let queuing = metrics.latencies(Pipeline::Blob, "queuing");
        assert_eq!(queuing.len(), 2);
        assert!(
            queuing.iter().any(|d| *d >= Duration::from_millis(50)),
            "queuing latencies {:?}",
            queuing
        );
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Success).requests, 2);
    }

    #[test]
    fn test_cancelled_before_running() {
        let (server, metrics, backend, _entered, _release) = blocking_server(4, 1);
        let ctx = RequestContext::background();
        ctx.cancel();

        let err = server
            .encode_blob(&ctx, &request(random_blob(50), EncodingParams::new(2, 8)))
            .unwrap_err();
        assert_eq!(err, EncoderError::Cancelled(ContextError::Cancelled));
        assert_eq!(err.to_string(), "context canceled");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Cancelled).requests, 1);
        assert_eq!(metrics.total_requests(Pipeline::Blob), 1);

        let expired = RequestContext::with_timeout(Duration::ZERO);
        let err = server
            .commit_blob(&expired, &CommitBlobRequest { data: random_blob(50) })
            .unwrap_err();
        assert_eq!(err, EncoderError::Cancelled(ContextError::DeadlineExceeded));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancelled_while_encoding_discards_result() {
        let (server, metrics, backend, entered, release) = blocking_server(4, 1);
        let ctx = RequestContext::background();
        let blob = random_blob(50);

        thread::scope(|s| {
            let handle =
                s.spawn(|| server.encode_blob(&ctx, &request(blob, EncodingParams::new(2, 8))));
            entered.recv().unwrap();
            ctx.cancel();
            release.send(()).unwrap();

            assert_eq!(
                handle.join().unwrap().unwrap_err(),
                EncoderError::Cancelled(ContextError::Cancelled)
            );
        });

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Cancelled).requests, 1);
        assert_eq!(metrics.outcome(Pipeline::Blob, Outcome::Success).requests, 0);
        assert!(metrics.latencies(Pipeline::Blob, "total").is_empty());
    }

    #[test]
    fn test_config_from_json() {
        let config = EncoderConfig::from_json(r#"{"max_concurrent_requests": 4}"#).unwrap();
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.request_pool_size, 32);
        assert_eq!(config.chunk_encoding_format, ChunkEncodingFormat::Generic);
        assert!(config.enable_rs && config.enable_kzg);
        assert_eq!(config.backend, BackendKind::Cpu);

        let config = EncoderConfig::from_json(
            r#"{"chunk_encoding_format": "native", "backend": "gpu", "enable_rs": false}"#,
        )
        .unwrap();
        assert_eq!(config.chunk_encoding_format, ChunkEncodingFormat::Native);
        assert_eq!(config.backend, BackendKind::Gpu);
        assert!(!config.enable_rs);

        assert!(matches!(
            EncoderConfig::from_json(r#"{"request_pool_size": 0}"#),
            Err(EncoderError::Config(_))
        ));
        assert!(matches!(
            EncoderConfig::from_json(r#"{"backend": "tpu"}"#),
            Err(EncoderError::Config(_))
        ));
    }

    #[test]
    fn test_config_from_file() {
        let path =
            std::env::temp_dir().join(format!("encoder-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"request_pool_size": 8, "max_concurrent_requests": 2}"#).unwrap();
        let config = EncoderConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.request_pool_size, 8);
        assert_eq!(config.max_concurrent_requests, 2);

        assert!(matches!(
            EncoderConfig::from_file(&path),
            Err(EncoderError::Config(_))
        ));
    }
}
