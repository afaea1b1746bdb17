use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{pairing::Pairing, CurveGroup, VariableBaseMSM};
use ark_ff::{BigInteger, FftField, Field, PrimeField};
use ark_serialize::CanonicalDeserialize;
use ark_std::{One, Zero};
use core::cmp;
use sha2::{Digest, Sha256};

use crate::{consts::BYTES_PER_FIELD_ELEMENT, errors::EncodingError, params::EncodingParams};

pub fn get_num_element(data_len: usize, symbol_size: usize) -> usize {
    data_len.div_ceil(symbol_size)
}

/// Reads one big-endian field element, rejecting values that are not
/// strictly smaller than the modulus.
pub fn fr_from_bytes_be_canonical(bytes: &[u8]) -> Result<Fr, EncodingError> {
    if bytes.len() != BYTES_PER_FIELD_ELEMENT {
        return Err(EncodingError::InvalidFieldElement(format!(
            "expected {} bytes, got {}",
            BYTES_PER_FIELD_ELEMENT,
            bytes.len()
        )));
    }
    // arkworks deserializes little endian and refuses non canonical encodings.
    let mut bytes_le = [0u8; BYTES_PER_FIELD_ELEMENT];
    bytes_le.copy_from_slice(bytes);
    bytes_le.reverse();
    Fr::deserialize_uncompressed(&bytes_le[..])
        .map_err(|_| EncodingError::InvalidFieldElement("value exceeds field modulus".to_string()))
}

pub fn fr_to_bytes_be(element: &Fr) -> [u8; BYTES_PER_FIELD_ELEMENT] {
    let mut out = [0u8; BYTES_PER_FIELD_ELEMENT];
    let bytes = element.into_bigint().to_bytes_be();
    out[BYTES_PER_FIELD_ELEMENT - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Interprets `data` as a sequence of big-endian field elements. Every 32 byte
/// group becomes one element; a trailing partial group is right padded with
/// zeroes before being interpreted.
///
/// Unlike a modular reduction this fails on any group that is not a canonical
/// field element, because such a group could never be decoded back to the
/// same bytes.
pub fn to_fr_array(data: &[u8]) -> Result<Vec<Fr>, EncodingError> {
    let num_ele = get_num_element(data.len(), BYTES_PER_FIELD_ELEMENT);
    let mut eles = Vec::with_capacity(num_ele);

    for (i, chunk) in data.chunks(BYTES_PER_FIELD_ELEMENT).enumerate() {
        let mut padded = [0u8; BYTES_PER_FIELD_ELEMENT];
        padded[..chunk.len()].copy_from_slice(chunk);
        let element = fr_from_bytes_be_canonical(&padded).map_err(|_| {
            EncodingError::InvalidFieldElement(format!(
                "field element at position {} is not canonical",
                i
            ))
        })?;
        eles.push(element);
    }
    Ok(eles)
}

/// Converts a slice of field elements to a big-endian byte array, truncated
/// to `max_output_size` bytes.
pub fn to_byte_array(data_fr: &[Fr], max_output_size: usize) -> Vec<u8> {
    let data_size = cmp::min(data_fr.len() * BYTES_PER_FIELD_ELEMENT, max_output_size);
    let mut data = vec![0u8; data_size];

    for (i, element) in data_fr.iter().enumerate() {
        let start = i * BYTES_PER_FIELD_ELEMENT;
        if start >= data_size {
            break;
        }
        let end = cmp::min(start + BYTES_PER_FIELD_ELEMENT, data_size);
        let bytes = fr_to_bytes_be(element);
        data[start..end].copy_from_slice(&bytes[..end - start]);
    }

    data
}

// Internally pads the input data by prepending a 0x00 to each chunk of 31 bytes. This guarantees that
// the data will be a valid field element for the bn254 curve
//
// # Additionally, this function will add necessary padding to align the output to 32 bytes
pub fn pad_payload(input_data: &[u8]) -> Vec<u8> {
    let bytes_per_chunk = BYTES_PER_FIELD_ELEMENT - 1; // 31 bytes
    let chunk_count = input_data.len().div_ceil(bytes_per_chunk);
    let output_length = chunk_count * BYTES_PER_FIELD_ELEMENT;

    let mut padded_output = vec![0u8; output_length];

    for chunk_idx in 0..chunk_count {
        let input_start = chunk_idx * bytes_per_chunk;
        let input_end = cmp::min(input_start + bytes_per_chunk, input_data.len());
        let output_start = chunk_idx * BYTES_PER_FIELD_ELEMENT + 1;

        padded_output[output_start..output_start + (input_end - input_start)]
            .copy_from_slice(&input_data[input_start..input_end]);
    }

    padded_output
}

/// Removes internal padding from data that was processed by `pad_payload`.
///
/// # Example
/// ```
/// use eigenda_encoding_primitives::helpers::{pad_payload, remove_internal_padding};
///
/// let original = b"hello world";
/// let padded = pad_payload(original);
/// let recovered = remove_internal_padding(&padded).unwrap();
/// assert_eq!(original, &recovered[..original.len()]);
/// ```
pub fn remove_internal_padding(padded_data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    if padded_data.len() % BYTES_PER_FIELD_ELEMENT != 0 {
        return Err(EncodingError::DimensionMismatch(format!(
            "padded data length {} is not a multiple of {}",
            padded_data.len(),
            BYTES_PER_FIELD_ELEMENT
        )));
    }

    let chunk_count = padded_data.len() / BYTES_PER_FIELD_ELEMENT;
    let mut output_data = Vec::with_capacity(chunk_count * (BYTES_PER_FIELD_ELEMENT - 1));
    for chunk in padded_data.chunks_exact(BYTES_PER_FIELD_ELEMENT) {
        output_data.extend_from_slice(&chunk[1..]);
    }

    Ok(output_data)
}

/// Reverses the lowest `log2(n)` bits of `value`. `n` must be a power of two.
pub fn reverse_bits_limited(n: usize, value: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let unused_bits = usize::BITS - n.trailing_zeros();
    value.reverse_bits() >> unused_bits
}

/// Applies the bit-reversal permutation in place. The buffer length must be a
/// power of two; the permutation is its own inverse.
pub fn bit_reverse_permutation<T>(values: &mut [T]) {
    let n = values.len();
    if n <= 2 {
        return;
    }
    debug_assert!(n.is_power_of_two());
    for i in 0..n {
        let j = reverse_bits_limited(n, i);
        if i < j {
            values.swap(i, j);
        }
    }
}

/// Index `k` of the coset `ω_n^k · H_L` whose evaluations land in chunk
/// `chunk_index` after the bit-reversed extension.
pub fn leading_coset_index(chunk_index: u32, num_chunks: u64) -> u32 {
    reverse_bits_limited(num_chunks as usize, chunk_index as usize) as u32
}

/// Primitive `n`-th root of unity, the generator of the radix-2 domain of size `n`.
pub fn root_of_unity(n: u64) -> Result<Fr, EncodingError> {
    Fr::get_root_of_unity(n)
        .ok_or_else(|| EncodingError::FFTError(format!("no root of unity of order {}", n)))
}

/// The shift `h_j = ω_n^{rev_m(j)}` of the coset holding chunk `j`.
pub fn coset_leader(chunk_index: u32, params: &EncodingParams) -> Result<Fr, EncodingError> {
    if chunk_index as u64 >= params.num_chunks {
        return Err(EncodingError::DimensionMismatch(format!(
            "chunk index {} out of range for {} chunks",
            chunk_index, params.num_chunks
        )));
    }
    let omega = root_of_unity(params.num_evaluations())?;
    let exponent = leading_coset_index(chunk_index, params.num_chunks) as u64;
    Ok(omega.pow([exponent]))
}

/// Computes powers of a field element up to a given exponent.
///
/// For a given field element x, computes [1, x, x², x³, ..., x^(count-1)]
pub fn compute_powers(base: &Fr, count: usize) -> Vec<Fr> {
    let mut powers = Vec::with_capacity(count);
    let mut current = Fr::one();
    for _ in 0..count {
        powers.push(current);
        current *= base;
    }
    powers
}

/// Computes a linear combination of G1 points weighted by scalar coefficients.
pub fn g1_lincomb(points: &[G1Affine], scalars: &[Fr]) -> Result<G1Affine, EncodingError> {
    if points.len() < scalars.len() {
        return Err(EncodingError::SrsCapacityExceeded {
            required: scalars.len(),
            srs_len: points.len(),
        });
    }
    let lincomb = G1Projective::msm(&points[..scalars.len()], scalars)
        .map_err(|e| EncodingError::MsmError(format!("g1 msm length mismatch {}", e)))?;
    Ok(lincomb.into_affine())
}

/// Same as [g1_lincomb] on the G2 group.
pub fn g2_lincomb(points: &[G2Affine], scalars: &[Fr]) -> Result<G2Affine, EncodingError> {
    if points.len() < scalars.len() {
        return Err(EncodingError::SrsCapacityExceeded {
            required: scalars.len(),
            srs_len: points.len(),
        });
    }
    let lincomb = G2Projective::msm(&points[..scalars.len()], scalars)
        .map_err(|e| EncodingError::MsmError(format!("g2 msm length mismatch {}", e)))?;
    Ok(lincomb.into_affine())
}

/// Maps a byte slice to a field element (`Fr`) using SHA-256.
pub fn hash_to_field_element(msg: &[u8]) -> Fr {
    let msg_digest = Sha256::digest(msg);
    Fr::from_be_bytes_mod_order(msg_digest.as_slice())
}

/// Checks e(a1, a2) == e(b1, b2).
pub fn pairings_verify(a1: G1Affine, a2: G2Affine, b1: G1Affine, b2: G2Affine) -> bool {
    let neg_b1 = -b1;
    let p = [a1, neg_b1];
    let q = [a2, b2];
    let result = Bn254::multi_pairing(p, q);
    result.is_zero()
}
