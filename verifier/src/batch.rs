use ark_bn254::{Fr, G1Affine, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, Zero};
use ark_serialize::CanonicalSerialize;
use eigenda_encoding_primitives::{
    consts::RANDOM_CHALLENGE_FRAME_BATCH_DOMAIN,
    errors::EncodingError,
    frame::Frame,
    helpers,
    params::EncodingParams,
    srs::SRS,
};

use crate::verify::{check_g1, chunk_length_g2};

/// Hashes everything being verified into the challenge `r` and returns
/// `[r^0, r^1, ..., r^(n-1)]`.
fn compute_r_powers(
    commitment: &G1Affine,
    frames: &[Frame],
    indices: &[u32],
    params: &EncodingParams,
) -> Result<Vec<Fr>, EncodingError> {
    let mut data_to_be_hashed = Vec::new();
    data_to_be_hashed.extend_from_slice(RANDOM_CHALLENGE_FRAME_BATCH_DOMAIN);
    data_to_be_hashed.extend_from_slice(&params.chunk_length.to_be_bytes());
    data_to_be_hashed.extend_from_slice(&params.num_chunks.to_be_bytes());
    commitment
        .serialize_compressed(&mut data_to_be_hashed)
        .map_err(|_| EncodingError::SerializationError("Failed to serialize commitment".to_string()))?;

    for (frame, index) in frames.iter().zip(indices) {
        data_to_be_hashed.extend_from_slice(&index.to_be_bytes());
        frame
            .proof
            .serialize_compressed(&mut data_to_be_hashed)
            .map_err(|_| EncodingError::SerializationError("Failed to serialize proof".to_string()))?;
        for coeff in &frame.coeffs {
            data_to_be_hashed.extend_from_slice(&helpers::fr_to_bytes_be(coeff));
        }
    }

    let r = helpers::hash_to_field_element(&data_to_be_hashed);
    Ok(helpers::compute_powers(&r, frames.len()))
}

/// Verifies many frames of the same blob with a random linear combination of
/// the per-frame equations.
///
/// Each frame equation `e(C - I_j + c_j·π_j, [1]₂) == e(π_j, [τ^L]₂)`, with
/// `c_j = h_j^L`, is weighted by `r^j`. Both sides are then linear in the
/// inputs, so the whole batch costs three MSMs and two pairings.
///
/// # Returns
///
/// * `Ok(true)` if all frames are valid.
/// * `Ok(false)` if any frame is invalid.
/// * `Err(EncodingError)` if the inputs are malformed.
pub fn verify_frames(
    srs: &SRS,
    commitment: &G1Affine,
    frames: &[Frame],
    indices: &[u32],
    params: &EncodingParams,
) -> Result<bool, EncodingError> {
    if frames.len() != indices.len() {
        return Err(EncodingError::DimensionMismatch(format!(
            "{} frames but {} indices",
            frames.len(),
            indices.len()
        )));
    }
    let g2_tau_l = chunk_length_g2(srs, params)?;
    if frames.is_empty() {
        return Ok(true);
    }
    check_g1(commitment, "commitment")?;

    let chunk_length = params.chunk_length as usize;
    for frame in frames {
        if frame.len() != chunk_length {
            return Err(EncodingError::DimensionMismatch(format!(
                "frame has {} coefficients, expected {}",
                frame.len(),
                chunk_length
            )));
        }
        check_g1(&frame.proof, "proof")?;
    }

    let r_powers = compute_r_powers(commitment, frames, indices, params)?;

    // Σ r^j · I_j, as a single polynomial of degree < L
    let mut combined_coeffs = vec![Fr::zero(); chunk_length];
    let mut r_sum = Fr::zero();
    let mut r_times_c = Vec::with_capacity(frames.len());
    for ((frame, index), r_power) in frames.iter().zip(indices).zip(&r_powers) {
        for (acc, coeff) in combined_coeffs.iter_mut().zip(&frame.coeffs) {
            *acc += *r_power * coeff;
        }
        r_sum += r_power;
        let leader = helpers::coset_leader(*index, params)?;
        r_times_c.push(*r_power * leader.pow([params.chunk_length]));
    }

    let proofs: Vec<G1Affine> = frames.iter().map(|frame| frame.proof).collect();
    let proof_lincomb = helpers::g1_lincomb(&proofs, &r_powers)?;
    let proof_c_lincomb = helpers::g1_lincomb(&proofs, &r_times_c)?;
    let interpolation = helpers::g1_lincomb(&srs.g1, &combined_coeffs)?;

    let lhs = (*commitment * r_sum - interpolation + proof_c_lincomb).into_affine();

    Ok(helpers::pairings_verify(
        lhs,
        G2Affine::generator(),
        proof_lincomb,
        g2_tau_l,
    ))
}
