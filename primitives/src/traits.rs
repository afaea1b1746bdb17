use ark_bn254::{g1::G1Affine, g2::G2Affine, Fq, Fq2};
use ark_ec::{short_weierstrass::SWCurveConfig, AffineRepr};
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::Zero;

use crate::consts::{
    BYTES_PER_FIELD_ELEMENT, COMPRESSED_FLAG_MASK, COMPRESSED_INFINITY, COMPRESSED_LARGEST,
    COMPRESSED_SMALLEST, SIZE_OF_G1_AFFINE_COMPRESSED, SIZE_OF_G2_AFFINE_COMPRESSED,
};

#[derive(Debug, thiserror::Error)]
pub enum PointReadError {
    #[error("Invalid point data: {0}")]
    InvalidData(String),

    #[error("Deserialization failed")]
    DeserializationError,
}

pub type Result<T> = core::result::Result<T, PointReadError>;

/// Reading points from the two byte layouts we exchange with other nodes:
/// gnark style big-endian compressed points, and arkworks native compressed
/// points.
pub trait ReadPointFromBytes: AffineRepr {
    fn read_point_from_bytes_be(bytes: &[u8]) -> Result<Self>;
    fn read_point_from_bytes_native_compressed(bytes: &[u8]) -> Result<Self>;
}

pub trait WritePointToBytes: AffineRepr {
    fn write_point_to_bytes_be(&self) -> Vec<u8>;
    fn write_point_to_bytes_native_compressed(&self) -> Result<Vec<u8>>;
}

/// gnark's ordering: y is the largest root when it exceeds (p - 1) / 2.
pub fn lexicographically_largest(z: &Fq) -> bool {
    z.into_bigint() > Fq::MODULUS_MINUS_ONE_DIV_TWO
}

/// Extension field ordering used by gnark: decided by the imaginary part
/// unless it is zero.
pub fn lexicographically_largest_fq2(z: &Fq2) -> bool {
    if z.c1.is_zero() {
        lexicographically_largest(&z.c0)
    } else {
        lexicographically_largest(&z.c1)
    }
}

fn read_fq_be(bytes: &[u8]) -> Result<Fq> {
    let mut bytes_le = [0u8; BYTES_PER_FIELD_ELEMENT];
    bytes_le.copy_from_slice(bytes);
    bytes_le.reverse();
    Fq::deserialize_uncompressed(&bytes_le[..]).map_err(|_| PointReadError::DeserializationError)
}

fn write_fq_be(element: &Fq, out: &mut [u8]) {
    let mut bytes_le = Vec::with_capacity(BYTES_PER_FIELD_ELEMENT);
    // Serializing a base field element into a Vec cannot fail.
    let _ = element.serialize_uncompressed(&mut bytes_le);
    bytes_le.reverse();
    out.copy_from_slice(&bytes_le);
}

fn compression_flag(largest: bool) -> u8 {
    if largest {
        COMPRESSED_LARGEST
    } else {
        COMPRESSED_SMALLEST
    }
}

fn check_infinity(bytes: &[u8]) -> Result<bool> {
    if bytes[0] & COMPRESSED_FLAG_MASK != COMPRESSED_INFINITY {
        return Ok(false);
    }
    if bytes[0] & !COMPRESSED_FLAG_MASK != 0 || bytes[1..].iter().any(|b| *b != 0) {
        return Err(PointReadError::InvalidData(
            "point at infinity not coded properly".to_string(),
        ));
    }
    Ok(true)
}

impl ReadPointFromBytes for G1Affine {
    fn read_point_from_bytes_be(bytes: &[u8]) -> Result<G1Affine> {
        if bytes.len() != SIZE_OF_G1_AFFINE_COMPRESSED {
            return Err(PointReadError::InvalidData(
                "not enough bytes for g1 point".to_string(),
            ));
        }
        if check_infinity(bytes)? {
            return Ok(G1Affine::identity());
        }

        let flag = bytes[0] & COMPRESSED_FLAG_MASK;
        if flag != COMPRESSED_SMALLEST && flag != COMPRESSED_LARGEST {
            return Err(PointReadError::InvalidData(
                "g1 point is not compressed".to_string(),
            ));
        }
        let mut x_bytes = [0u8; SIZE_OF_G1_AFFINE_COMPRESSED];
        x_bytes.copy_from_slice(bytes);
        x_bytes[0] &= !COMPRESSED_FLAG_MASK;
        let x = read_fq_be(&x_bytes)?;

        let y_squared = x * x * x + ark_bn254::g1::Config::COEFF_B;
        let mut y = y_squared
            .sqrt()
            .ok_or_else(|| PointReadError::InvalidData("point not on curve".to_string()))?;
        if lexicographically_largest(&y) != (flag == COMPRESSED_LARGEST) {
            y = -y;
        }

        let point = G1Affine::new_unchecked(x, y);
        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(PointReadError::InvalidData(
                "point couldn't be created".to_string(),
            ));
        }
        Ok(point)
    }

    fn read_point_from_bytes_native_compressed(bytes: &[u8]) -> Result<G1Affine> {
        G1Affine::deserialize_compressed(bytes).map_err(|_| PointReadError::DeserializationError)
    }
}

impl WritePointToBytes for G1Affine {
    fn write_point_to_bytes_be(&self) -> Vec<u8> {
        let mut out = vec![0u8; SIZE_OF_G1_AFFINE_COMPRESSED];
        if self.infinity {
            out[0] = COMPRESSED_INFINITY;
            return out;
        }
        write_fq_be(&self.x, &mut out);
        out[0] |= compression_flag(lexicographically_largest(&self.y));
        out
    }

    fn write_point_to_bytes_native_compressed(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(SIZE_OF_G1_AFFINE_COMPRESSED);
        self.serialize_compressed(&mut out)
            .map_err(|e| PointReadError::InvalidData(e.to_string()))?;
        Ok(out)
    }
}

impl ReadPointFromBytes for G2Affine {
    fn read_point_from_bytes_be(bytes: &[u8]) -> Result<G2Affine> {
        if bytes.len() != SIZE_OF_G2_AFFINE_COMPRESSED {
            return Err(PointReadError::InvalidData(
                "not enough bytes for g2 point".to_string(),
            ));
        }
        if check_infinity(bytes)? {
            return Ok(G2Affine::identity());
        }

        let flag = bytes[0] & COMPRESSED_FLAG_MASK;
        if flag != COMPRESSED_SMALLEST && flag != COMPRESSED_LARGEST {
            return Err(PointReadError::InvalidData(
                "g2 point is not compressed".to_string(),
            ));
        }
        let mut x_bytes = [0u8; SIZE_OF_G2_AFFINE_COMPRESSED];
        x_bytes.copy_from_slice(bytes);
        x_bytes[0] &= !COMPRESSED_FLAG_MASK;
        let half_size = SIZE_OF_G2_AFFINE_COMPRESSED / 2;
        let c1 = read_fq_be(&x_bytes[..half_size])?;
        let c0 = read_fq_be(&x_bytes[half_size..])?;
        let x = Fq2::new(c0, c1);

        let y_squared = x * x * x + ark_bn254::g2::Config::COEFF_B;
        let mut y = y_squared.sqrt().ok_or_else(|| {
            PointReadError::InvalidData(
                "invalid compressed coordinate: square root doesn't exist".to_string(),
            )
        })?;
        if lexicographically_largest_fq2(&y) != (flag == COMPRESSED_LARGEST) {
            y = -y;
        }

        let point = G2Affine::new_unchecked(x, y);
        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(PointReadError::InvalidData(
                "point couldn't be created".to_string(),
            ));
        }
        Ok(point)
    }

    fn read_point_from_bytes_native_compressed(bytes: &[u8]) -> Result<G2Affine> {
        G2Affine::deserialize_compressed(bytes).map_err(|_| PointReadError::DeserializationError)
    }
}

impl WritePointToBytes for G2Affine {
    fn write_point_to_bytes_be(&self) -> Vec<u8> {
        let mut out = vec![0u8; SIZE_OF_G2_AFFINE_COMPRESSED];
        if self.infinity {
            out[0] = COMPRESSED_INFINITY;
            return out;
        }
        let half_size = SIZE_OF_G2_AFFINE_COMPRESSED / 2;
        write_fq_be(&self.x.c1, &mut out[..half_size]);
        write_fq_be(&self.x.c0, &mut out[half_size..]);
        out[0] |= compression_flag(lexicographically_largest_fq2(&self.y));
        out
    }

    fn write_point_to_bytes_native_compressed(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(SIZE_OF_G2_AFFINE_COMPRESSED);
        self.serialize_compressed(&mut out)
            .map_err(|e| PointReadError::InvalidData(e.to_string()))?;
        Ok(out)
    }
}
