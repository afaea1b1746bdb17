use ark_bn254::{Fr, G1Affine};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    consts::{BYTES_PER_FIELD_ELEMENT, SIZE_OF_G1_AFFINE_COMPRESSED},
    errors::EncodingError,
    helpers,
    traits::{ReadPointFromBytes, WritePointToBytes},
};

/// Binary form used for frames and commitment points on the wire. The two
/// forms are not interchangeable, so the tag always travels with the bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkEncodingFormat {
    /// Big-endian compressed points and field elements (gnark layout),
    /// frames wrapped in a bincode envelope.
    #[default]
    Generic,
    /// arkworks canonical compressed encoding, proof followed by the
    /// coefficients with no envelope.
    Native,
}

/// One coded, provable chunk of a blob.
///
/// `coeffs` are the monomial coefficients of the polynomial interpolating the
/// chunk's evaluations over its coset; `proof` opens the blob commitment on
/// that coset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub proof: G1Affine,
    pub coeffs: Vec<Fr>,
}

#[derive(Serialize, Deserialize)]
struct GenericFrame {
    proof: Vec<u8>,
    coeffs: Vec<[u8; BYTES_PER_FIELD_ELEMENT]>,
}

impl Frame {
    pub fn new(proof: G1Affine, coeffs: Vec<Fr>) -> Self {
        Self { proof, coeffs }
    }

    /// Number of coded symbols carried by the frame.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn serialize(&self, format: ChunkEncodingFormat) -> Result<Vec<u8>, EncodingError> {
        match format {
            ChunkEncodingFormat::Native => {
                let mut out = Vec::with_capacity(
                    SIZE_OF_G1_AFFINE_COMPRESSED + self.coeffs.len() * BYTES_PER_FIELD_ELEMENT,
                );
                self.proof
                    .serialize_compressed(&mut out)
                    .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
                for coeff in &self.coeffs {
                    coeff
                        .serialize_compressed(&mut out)
                        .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
                }
                Ok(out)
            },
            ChunkEncodingFormat::Generic => {
                let wire = GenericFrame {
                    proof: self.proof.write_point_to_bytes_be(),
                    coeffs: self.coeffs.iter().map(helpers::fr_to_bytes_be).collect(),
                };
                bincode::serialize(&wire).map_err(|e| EncodingError::SerializationError(e.to_string()))
            },
        }
    }

    pub fn deserialize(bytes: &[u8], format: ChunkEncodingFormat) -> Result<Self, EncodingError> {
        match format {
            ChunkEncodingFormat::Native => {
                if bytes.len() < SIZE_OF_G1_AFFINE_COMPRESSED
                    || (bytes.len() - SIZE_OF_G1_AFFINE_COMPRESSED) % BYTES_PER_FIELD_ELEMENT != 0
                {
                    return Err(EncodingError::SerializationError(format!(
                        "native frame of {} bytes has an invalid length",
                        bytes.len()
                    )));
                }
                let (proof_bytes, coeff_bytes) = bytes.split_at(SIZE_OF_G1_AFFINE_COMPRESSED);
                let proof = G1Affine::read_point_from_bytes_native_compressed(proof_bytes)
                    .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
                let coeffs = coeff_bytes
                    .chunks_exact(BYTES_PER_FIELD_ELEMENT)
                    .map(|chunk| {
                        Fr::deserialize_compressed(chunk)
                            .map_err(|e| EncodingError::SerializationError(e.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self { proof, coeffs })
            },
            ChunkEncodingFormat::Generic => {
                let wire: GenericFrame = bincode::deserialize(bytes)
                    .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
                let proof = G1Affine::read_point_from_bytes_be(&wire.proof)
                    .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
                let coeffs = wire
                    .coeffs
                    .iter()
                    .map(|c| helpers::fr_from_bytes_be_canonical(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self { proof, coeffs })
            },
        }
    }
}
