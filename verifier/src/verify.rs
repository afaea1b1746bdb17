use ark_bn254::{G1Affine, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Field;
use eigenda_encoding_primitives::{
    commitments::BlobCommitments,
    errors::EncodingError,
    frame::Frame,
    helpers,
    params::EncodingParams,
    srs::SRS,
};

pub(crate) fn check_g1(point: &G1Affine, name: &str) -> Result<(), EncodingError> {
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EncodingError::NotOnCurveError(format!("{} not on curve", name)));
    }
    Ok(())
}

pub(crate) fn check_g2(point: &G2Affine, name: &str) -> Result<(), EncodingError> {
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(EncodingError::NotOnCurveError(format!("{} not on curve", name)));
    }
    Ok(())
}

/// Returns `[τ^L]₂` after checking the params and frame shape against the SRS.
pub(crate) fn chunk_length_g2(srs: &SRS, params: &EncodingParams) -> Result<G2Affine, EncodingError> {
    params.validate(srs.order as u64)?;
    let chunk_length = params.chunk_length as usize;
    if srs.g1.len() < chunk_length {
        return Err(EncodingError::SrsCapacityExceeded {
            required: chunk_length,
            srs_len: srs.g1.len(),
        });
    }
    srs.g2_power(chunk_length)
        .ok_or(EncodingError::SrsCapacityExceeded {
            required: chunk_length + 1,
            srs_len: srs.g2.len(),
        })
}

/// Verifies that `frame` is chunk `index` of the blob committed to by
/// `commitment`.
///
/// With `I_j` the frame's interpolation polynomial and `h_j` its coset
/// leader, checks
/// `e(C - [I_j(τ)]₁, [1]₂) == e(π_j, [τ^L]₂ - h_j^L·[1]₂)`.
///
/// # Returns
///
/// * `Ok(true)` if the frame opens the commitment.
/// * `Ok(false)` if it does not.
/// * `Err(EncodingError)` if the inputs are malformed.
pub fn verify_frame(
    srs: &SRS,
    commitment: &G1Affine,
    frame: &Frame,
    index: u32,
    params: &EncodingParams,
) -> Result<bool, EncodingError> {
    let g2_tau_l = chunk_length_g2(srs, params)?;
    if frame.len() != params.chunk_length as usize {
        return Err(EncodingError::DimensionMismatch(format!(
            "frame has {} coefficients, expected {}",
            frame.len(),
            params.chunk_length
        )));
    }
    check_g1(commitment, "commitment")?;
    check_g1(&frame.proof, "proof")?;

    let leader = helpers::coset_leader(index, params)?;
    let leader_pow = leader.pow([params.chunk_length]);

    let interpolation = helpers::g1_lincomb(&srs.g1, &frame.coeffs)?;
    let lhs = (*commitment - interpolation).into_affine();
    let coset_g2 = (g2_tau_l.into_group() - G2Affine::generator() * leader_pow).into_affine();

    Ok(helpers::pairings_verify(
        lhs,
        G2Affine::generator(),
        frame.proof,
        coset_g2,
    ))
}

/// Verifies that the polynomial committed in `length_commitment` has fewer
/// than `length` coefficients: `e([τ^{order - length}]₁, LC) == e([1]₁, LP)`.
///
/// Needs the g1 point `τ^{order - length}`, so the SRS must hold g1 points
/// up to that power.
pub fn verify_length_proof(
    srs: &SRS,
    length_commitment: &G2Affine,
    length_proof: &G2Affine,
    length: u32,
) -> Result<bool, EncodingError> {
    if length == 0 || !length.is_power_of_two() {
        return Err(EncodingError::InvalidEncodingParams(format!(
            "length {} is not a power of 2",
            length
        )));
    }
    if length > srs.order {
        return Err(EncodingError::SrsCapacityExceeded {
            required: length as usize,
            srs_len: srs.order as usize,
        });
    }
    check_g2(length_commitment, "length commitment")?;
    check_g2(length_proof, "length proof")?;

    let shift = (srs.order - length) as usize;
    let g1_shift = srs.g1.get(shift).ok_or(EncodingError::SrsCapacityExceeded {
        required: shift + 1,
        srs_len: srs.g1.len(),
    })?;

    Ok(helpers::pairings_verify(
        *g1_shift,
        *length_commitment,
        G1Affine::generator(),
        *length_proof,
    ))
}

/// Checks that the G1 commitment and the G2 length commitment commit to the
/// same polynomial: `e(C, [1]₂) == e([1]₁, LC)`.
pub fn verify_commit_equivalence(
    commitment: &G1Affine,
    length_commitment: &G2Affine,
) -> Result<bool, EncodingError> {
    check_g1(commitment, "commitment")?;
    check_g2(length_commitment, "length commitment")?;
    Ok(helpers::pairings_verify(
        *commitment,
        G2Affine::generator(),
        G1Affine::generator(),
        *length_commitment,
    ))
}

/// Runs both commitment checks on a set of blob commitments.
pub fn verify_blob_commitments(
    srs: &SRS,
    commitments: &BlobCommitments,
) -> Result<bool, EncodingError> {
    Ok(
        verify_commit_equivalence(&commitments.commitment, &commitments.length_commitment)?
            && verify_length_proof(
                srs,
                &commitments.length_commitment,
                &commitments.length_proof,
                commitments.length,
            )?,
    )
}
