#[cfg(test)]
mod tests {
    use ark_bn254::{Fr, G1Affine, G2Affine};
    use ark_ec::AffineRepr;
    use ark_ff::Field;
    use eigenda_encoding_primitives::{
        errors::EncodingError,
        helpers::{coset_leader, g1_lincomb, g2_lincomb, pad_payload, to_fr_array},
        params::EncodingParams,
        srs::SRS,
    };
    use eigenda_encoding_prover::kzg::KzgProver;
    use lazy_static::lazy_static;
    use rand::Rng;
    use std::{sync::Arc, thread};

    const SRS_ORDER: u32 = 256;

    lazy_static! {
        static ref SRS_INSTANCE: Arc<SRS> =
            Arc::new(SRS::insecure_setup(b"kzg-test", SRS_ORDER, SRS_ORDER).unwrap());
        static ref PROVER: KzgProver = KzgProver::new(SRS_INSTANCE.clone());
    }

    fn random_blob(num_bytes: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let raw: Vec<u8> = (0..num_bytes).map(|_| rng.gen()).collect();
        pad_payload(&raw)
    }

    // Divides f by x^L - c, returning (quotient, remainder).
    fn divide_by_coset_vanishing(f: &[Fr], chunk_length: usize, c: Fr) -> (Vec<Fr>, Vec<Fr>) {
        let mut remainder = f.to_vec();
        let mut quotient = vec![Fr::from(0u64); f.len().saturating_sub(chunk_length)];
        for k in (chunk_length..f.len()).rev() {
            let coef = remainder[k];
            quotient[k - chunk_length] = coef;
            remainder[k - chunk_length] += coef * c;
            remainder[k] = Fr::from(0u64);
        }
        remainder.truncate(chunk_length);
        (quotient, remainder)
    }

    #[test]
    fn test_multi_frame_proofs_match_direct_quotients() {
        for (chunk_length, num_chunks) in [(4u64, 8u64), (2, 16), (8, 4), (1, 32)] {
            let params = EncodingParams::new(chunk_length, num_chunks);
            let blob = random_blob(20 * 31);
            let mut coeffs = to_fr_array(&blob).unwrap();
            assert_eq!(coeffs.len(), 20);

            let (_, frames) = PROVER.encode_and_prove(&blob, params).unwrap();
            assert_eq!(frames.len(), num_chunks as usize);

            coeffs.resize(params.num_evaluations() as usize, Fr::from(0u64));
            for (j, frame) in frames.iter().enumerate() {
                let leader = coset_leader(j as u32, &params).unwrap();
                let (quotient, remainder) =
                    divide_by_coset_vanishing(&coeffs, chunk_length as usize, leader.pow([chunk_length]));
                assert_eq!(frame.coeffs, remainder, "chunk {} coefficients", j);
                assert_eq!(
                    frame.proof,
                    g1_lincomb(&SRS_INSTANCE.g1, &quotient).unwrap(),
                    "chunk {} proof with params {:?}",
                    j,
                    params
                );
            }
        }
    }

    #[test]
    fn test_single_chunk_proof_is_identity() {
        let params = EncodingParams::new(16, 1);
        let blob = random_blob(300);
        let (_, frames) = PROVER.encode_and_prove(&blob, params).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].proof.is_zero());
    }

    #[test]
    fn test_commitments() {
        let blob = random_blob(5 * 31);
        let coeffs = to_fr_array(&blob).unwrap();
        let commitments = PROVER.get_commitments(&blob).unwrap();

        assert_eq!(commitments.length, 8);
        assert_eq!(
            commitments.commitment,
            g1_lincomb(&SRS_INSTANCE.g1, &coeffs).unwrap()
        );
        assert_eq!(
            commitments.length_commitment,
            g2_lincomb(&SRS_INSTANCE.g2, &coeffs).unwrap()
        );
        let shift = (SRS_ORDER - 8) as usize;
        assert_eq!(
            commitments.length_proof,
            g2_lincomb(&SRS_INSTANCE.g2[shift..], &coeffs).unwrap()
        );

        // same bytes, same commitments
        assert_eq!(PROVER.get_commitments(&blob).unwrap(), commitments);
        let (from_encode, _) = PROVER
            .encode_and_prove(&blob, EncodingParams::new(2, 8))
            .unwrap();
        assert_eq!(from_encode, commitments);
    }

    #[test]
    fn test_empty_blob_commitments() {
        let commitments = PROVER.get_commitments(&[]).unwrap();
        assert_eq!(commitments.length, 1);
        assert_eq!(commitments.commitment, G1Affine::zero());
        assert_eq!(commitments.length_commitment, G2Affine::zero());
    }

    #[test]
    fn test_rs_only_matches_proved_frames() {
        let params = EncodingParams::new(4, 8);
        let blob = random_blob(400);
        let (chunks, indices) = PROVER.encode(&blob, params).unwrap();
        let (_, frames) = PROVER.encode_and_prove(&blob, params).unwrap();
        for (chunk, frame) in chunks.iter().zip(&frames) {
            assert_eq!(chunk, &frame.coeffs);
        }

        let decoded = PROVER
            .decode(&chunks[3..], &indices[3..], blob.len(), params)
            .unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_parametrized_prover_is_cached() {
        let params = EncodingParams::new(2, 4);
        let first = PROVER.get_parametrized(params).unwrap();
        let second = PROVER.get_parametrized(params).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.rs, &PROVER.get_rs_encoder(params).unwrap()));
    }

    #[test]
    fn test_concurrent_first_use_builds_tables_once() {
        let prover = KzgProver::new(SRS_INSTANCE.clone());
        let params = EncodingParams::new(8, 32);
        let blob = random_blob(100 * 31);

        let frames: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| prover.encode_and_prove(&blob, params).unwrap().1))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(prover.table_builds(), 1);
        for other in &frames[1..] {
            assert_eq!(other, &frames[0]);
        }

        prover.get_parametrized(EncodingParams::new(4, 4)).unwrap();
        assert_eq!(prover.table_builds(), 2);
    }

    #[test]
    fn test_rs_coding_does_not_build_tables() {
        let prover = KzgProver::new(SRS_INSTANCE.clone());
        // 512 evaluations, twice the srs order
        let params = EncodingParams::new(64, 8);
        let blob = random_blob(200 * 31);

        let (chunks, indices) = prover.encode(&blob, params).unwrap();
        assert_eq!(chunks.len(), 8);
        let decoded = prover
            .decode(&chunks[4..], &indices[4..], blob.len(), params)
            .unwrap();
        assert_eq!(decoded, blob);
        assert_eq!(prover.table_builds(), 0);

        assert!(matches!(
            prover.encode_and_prove(&blob, params),
            Err(EncodingError::InvalidEncodingParams(_))
        ));
        assert_eq!(prover.table_builds(), 0);
    }

    #[test]
    fn test_errors() {
        let blob = random_blob(100);
        assert!(matches!(
            PROVER.encode_and_prove(&blob, EncodingParams::new(64, 8)),
            Err(EncodingError::InvalidEncodingParams(_))
        ));
        assert!(matches!(
            PROVER.encode_and_prove(&blob, EncodingParams::new(3, 8)),
            Err(EncodingError::InvalidEncodingParams(_))
        ));
        assert!(matches!(
            PROVER.encode_and_prove(&random_blob(40 * 31), EncodingParams::new(4, 8)),
            Err(EncodingError::DataTooLarge { .. })
        ));
        assert!(matches!(
            PROVER.encode_and_prove(&[0xff; 32], EncodingParams::new(4, 8)),
            Err(EncodingError::InvalidFieldElement(_))
        ));

        let small_srs = Arc::new(SRS::insecure_setup(b"kzg-test", SRS_ORDER, 16).unwrap());
        let prover = KzgProver::new(small_srs);
        assert_eq!(
            prover
                .encode_and_prove(&blob, EncodingParams::new(4, 8))
                .unwrap_err(),
            EncodingError::SrsCapacityExceeded {
                required: 32,
                srs_len: 16
            }
        );
        assert!(matches!(
            prover.get_commitments(&random_blob(20 * 31)),
            Err(EncodingError::SrsCapacityExceeded { .. })
        ));
    }
}
