use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{CurveGroup, VariableBaseMSM};
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use ark_std::Zero;
use eigenda_encoding_primitives::{
    commitments::BlobCommitments,
    errors::EncodingError,
    frame::Frame,
    helpers,
    params::EncodingParams,
    srs::SRS,
};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
};
use tracing::debug;

use crate::{rs::RsEncoder, toeplitz::Circular};

/// Everything that only depends on the [EncodingParams]: the Reed-Solomon
/// coder and the FFT of the reversed SRS vectors used for the multi-frame
/// proofs. Built once per params and shared between requests.
#[derive(Debug)]
pub struct ParametrizedProver {
    pub rs: Arc<RsEncoder>,
    // fft_points_t[i][r] = FFT_{2m}(x_r)[i] with x_r[u] = [τ^{(m-1-u)·L + r}]₁
    fft_points_t: Vec<Vec<G1Affine>>,
    toeplitz_domain: GeneralEvaluationDomain<Fr>,
    proof_domain: GeneralEvaluationDomain<Fr>,
}

impl ParametrizedProver {
    fn new(srs: &SRS, rs: Arc<RsEncoder>) -> Result<Self, EncodingError> {
        let params = *rs.params();
        params.validate(srs.order as u64)?;
        let num_evaluations = params.num_evaluations() as usize;
        if srs.g1.len() < num_evaluations {
            return Err(EncodingError::SrsCapacityExceeded {
                required: num_evaluations,
                srs_len: srs.g1.len(),
            });
        }

        let num_chunks = params.num_chunks as usize;
        let chunk_length = params.chunk_length as usize;
        let toeplitz_domain = domain(2 * num_chunks)?;
        let proof_domain = domain(num_chunks)?;

        let fft_points: Vec<Vec<G1Projective>> = (0..chunk_length)
            .into_par_iter()
            .map(|r| {
                let mut x = vec![G1Projective::zero(); 2 * num_chunks];
                for (u, point) in x.iter_mut().take(num_chunks).enumerate() {
                    *point = srs.g1[(num_chunks - 1 - u) * chunk_length + r].into();
                }
                toeplitz_domain.fft(&x)
            })
            .collect();

        let fft_points_t: Vec<Vec<G1Affine>> = (0..2 * num_chunks)
            .into_par_iter()
            .map(|i| {
                let column: Vec<G1Projective> = fft_points.iter().map(|f| f[i]).collect();
                G1Projective::normalize_batch(&column)
            })
            .collect();

        Ok(Self {
            rs,
            fft_points_t,
            toeplitz_domain,
            proof_domain,
        })
    }

    pub fn params(&self) -> &EncodingParams {
        self.rs.params()
    }

    /// Computes the opening proof of every chunk at once (FK20).
    ///
    /// For each residue `r < L` the polynomial coefficients `f_{a·L + r}`
    /// form a Toeplitz system against the SRS, embedded in a circulant matrix
    /// of size `2m`. The systems are multiplied in the frequency domain, summed
    /// over `r` with one MSM per position, and brought back with a single G1
    /// inverse FFT, giving the polynomials `H_0..H_{m-1}`. The proof of the
    /// coset with leader `h` is `Σ_s h^{L·s} · H_s`, which for all chunks is one
    /// FFT of size `m` followed by a bit reversal.
    pub fn compute_multi_frame_proofs(&self, coeffs: &[Fr]) -> Result<Vec<G1Affine>, EncodingError> {
        let params = self.params();
        let num_evaluations = params.num_evaluations() as usize;
        let num_chunks = params.num_chunks as usize;
        let chunk_length = params.chunk_length as usize;
        if coeffs.len() > num_evaluations {
            return Err(EncodingError::DataTooLarge {
                num_elements: coeffs.len(),
                capacity: num_evaluations,
            });
        }
        let mut padded = coeffs.to_vec();
        padded.resize(num_evaluations, Fr::zero());

        let columns: Vec<Vec<Fr>> = (0..chunk_length)
            .into_par_iter()
            .map(|r| -> Result<Vec<Fr>, EncodingError> {
                // V_r = [0, f_{(m-1)L+r}, ..., f_{L+r}, 0 × m]
                let mut v = vec![Fr::zero(); 2 * num_chunks];
                for (d, entry) in v.iter_mut().enumerate().take(num_chunks).skip(1) {
                    *entry = padded[(num_chunks - d) * chunk_length + r];
                }
                Ok(Circular::new(v)?.fft_coeffs())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sums: Vec<G1Projective> = (0..2 * num_chunks)
            .into_par_iter()
            .map(|i| {
                let scalars: Vec<Fr> = columns.iter().map(|column| column[i]).collect();
                G1Projective::msm(&self.fft_points_t[i], &scalars)
                    .map_err(|e| EncodingError::MsmError(format!("toeplitz msm length mismatch {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut h = self.toeplitz_domain.ifft(&sums);
        h.truncate(num_chunks);
        self.proof_domain.fft_in_place(&mut h);
        helpers::bit_reverse_permutation(&mut h);

        Ok(G1Projective::normalize_batch(&h))
    }
}

fn domain(size: usize) -> Result<GeneralEvaluationDomain<Fr>, EncodingError> {
    GeneralEvaluationDomain::<Fr>::new(size)
        .ok_or_else(|| EncodingError::FFTError(format!("could not construct a domain of size {}", size)))
}

/// Values keyed by [EncodingParams], each built at most once.
///
/// The map only hands out slots. Callers asking for params that are still
/// being built wait on the slot lock instead of building their own copy,
/// while builds for different params run side by side.
#[derive(Debug)]
struct ParamsCache<T> {
    slots: RwLock<HashMap<EncodingParams, Arc<Mutex<Option<Arc<T>>>>>>,
}

impl<T> ParamsCache<T> {
    fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_try_build(
        &self,
        params: EncodingParams,
        build: impl FnOnce() -> Result<T, EncodingError>,
    ) -> Result<Arc<T>, EncodingError> {
        let existing = self
            .slots
            .read()
            .map_err(|_| cache_poisoned())?
            .get(&params)
            .cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => self
                .slots
                .write()
                .map_err(|_| cache_poisoned())?
                .entry(params)
                .or_default()
                .clone(),
        };

        // a failed or panicked build leaves the slot empty for the next caller
        let mut value = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = value.as_ref() {
            return Ok(value.clone());
        }
        let built = Arc::new(build()?);
        *value = Some(built.clone());
        Ok(built)
    }
}

fn cache_poisoned() -> EncodingError {
    EncodingError::GenericError("prover cache poisoned".to_string())
}

/// Produces commitments, Reed-Solomon chunks and multi-frame proofs for
/// blobs, against a shared [SRS].
///
/// Reed-Solomon coders and proof tables are cached per params, separately:
/// coding and decoding never build proof tables and are not bounded by the
/// SRS order.
#[derive(Debug)]
pub struct KzgProver {
    srs: Arc<SRS>,
    rs_encoders: ParamsCache<RsEncoder>,
    parametrized: ParamsCache<ParametrizedProver>,
    table_builds: AtomicUsize,
}

impl KzgProver {
    pub fn new(srs: Arc<SRS>) -> Self {
        Self {
            srs,
            rs_encoders: ParamsCache::new(),
            parametrized: ParamsCache::new(),
            table_builds: AtomicUsize::new(0),
        }
    }

    pub fn srs(&self) -> &Arc<SRS> {
        &self.srs
    }

    /// Number of multi-frame proof tables built so far.
    pub fn table_builds(&self) -> usize {
        self.table_builds.load(Ordering::Relaxed)
    }

    /// Returns the cached [RsEncoder] for `params`, building it on first use.
    pub fn get_rs_encoder(&self, params: EncodingParams) -> Result<Arc<RsEncoder>, EncodingError> {
        self.rs_encoders
            .get_or_try_build(params, || RsEncoder::new(params))
    }

    /// Returns the cached [ParametrizedProver] for `params`, building it on
    /// first use.
    pub fn get_parametrized(
        &self,
        params: EncodingParams,
    ) -> Result<Arc<ParametrizedProver>, EncodingError> {
        self.parametrized.get_or_try_build(params, || {
            let rs = self.get_rs_encoder(params)?;
            debug!(
                chunk_length = params.chunk_length,
                num_chunks = params.num_chunks,
                "precomputing multi-frame proof tables"
            );
            let prover = ParametrizedProver::new(&self.srs, rs)?;
            self.table_builds.fetch_add(1, Ordering::Relaxed);
            Ok(prover)
        })
    }

    /// Commitment, length commitment and length proof of the polynomial with
    /// coefficients `coeffs`.
    pub fn commitments_from_coeffs(&self, coeffs: &[Fr]) -> Result<BlobCommitments, EncodingError> {
        let length = coeffs.len().max(1).next_power_of_two();
        let trailing_len = self.srs.g2_trailing.len();
        if length > trailing_len {
            return Err(EncodingError::SrsCapacityExceeded {
                required: length,
                srs_len: trailing_len,
            });
        }

        let commitment = helpers::g1_lincomb(&self.srs.g1, coeffs)?;
        let length_commitment = helpers::g2_lincomb(&self.srs.g2, coeffs)?;
        // g2_trailing[t] = [τ^{order - trailing_len + t}]₂, so this slice starts at τ^{order - length}
        let length_proof =
            helpers::g2_lincomb(&self.srs.g2_trailing[trailing_len - length..], coeffs)?;

        let length = u32::try_from(length)
            .map_err(|_| EncodingError::GenericError(format!("blob length {} overflows", length)))?;

        Ok(BlobCommitments {
            commitment,
            length_commitment,
            length_proof,
            length,
        })
    }

    /// Commitments of the blob, without coding it.
    pub fn get_commitments(&self, data: &[u8]) -> Result<BlobCommitments, EncodingError> {
        let coeffs = helpers::to_fr_array(data)?;
        self.commitments_from_coeffs(&coeffs)
    }

    /// Reed-Solomon chunks of the blob, without proofs.
    pub fn encode(
        &self,
        data: &[u8],
        params: EncodingParams,
    ) -> Result<(Vec<Vec<Fr>>, Vec<u32>), EncodingError> {
        let coeffs = helpers::to_fr_array(data)?;
        self.get_rs_encoder(params)?.encode(&coeffs)
    }

    /// Codes the blob into `params.num_chunks` frames, each carrying its
    /// interpolation coefficients and an opening proof, together with the
    /// blob commitments.
    pub fn encode_and_prove(
        &self,
        data: &[u8],
        params: EncodingParams,
    ) -> Result<(BlobCommitments, Vec<Frame>), EncodingError> {
        let coeffs = helpers::to_fr_array(data)?;
        let prover = self.get_parametrized(params)?;

        let (chunks, _) = prover.rs.encode(&coeffs)?;
        let commitments = self.commitments_from_coeffs(&coeffs)?;
        let proofs = prover.compute_multi_frame_proofs(&coeffs)?;

        let frames = proofs
            .into_iter()
            .zip(chunks)
            .map(|(proof, chunk)| Frame::new(proof, chunk))
            .collect();

        Ok((commitments, frames))
    }

    /// Recovers the blob from a sufficient subset of its chunks.
    pub fn decode(
        &self,
        chunks: &[Vec<Fr>],
        indices: &[u32],
        max_input_size: usize,
        params: EncodingParams,
    ) -> Result<Vec<u8>, EncodingError> {
        self.get_rs_encoder(params)?
            .decode(chunks, indices, max_input_size)
    }
}
