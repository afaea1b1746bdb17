use ark_bn254::{G1Affine, G2Affine};

use crate::{
    errors::EncodingError,
    frame::ChunkEncodingFormat,
    traits::{ReadPointFromBytes, WritePointToBytes},
};

/// Commitments produced once per blob. They are a deterministic function of
/// the blob content: the same bytes always produce the same commitments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobCommitments {
    /// Commitment to the blob polynomial in G1.
    pub commitment: G1Affine,
    /// Commitment to the same polynomial in G2.
    pub length_commitment: G2Affine,
    /// Commitment to the polynomial shifted to the top of the SRS, proving
    /// its degree is below `length`.
    pub length_proof: G2Affine,
    /// Number of symbols in the blob, rounded up to a power of two.
    pub length: u32,
}

/// Serialized commitment points, each in the same [ChunkEncodingFormat].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedCommitments {
    pub commitment: Vec<u8>,
    pub length_commitment: Vec<u8>,
    pub length_proof: Vec<u8>,
    pub length: u32,
}

fn g1_to_bytes(point: &G1Affine, format: ChunkEncodingFormat) -> Result<Vec<u8>, EncodingError> {
    match format {
        ChunkEncodingFormat::Generic => Ok(point.write_point_to_bytes_be()),
        ChunkEncodingFormat::Native => point
            .write_point_to_bytes_native_compressed()
            .map_err(|e| EncodingError::SerializationError(e.to_string())),
    }
}

fn g2_to_bytes(point: &G2Affine, format: ChunkEncodingFormat) -> Result<Vec<u8>, EncodingError> {
    match format {
        ChunkEncodingFormat::Generic => Ok(point.write_point_to_bytes_be()),
        ChunkEncodingFormat::Native => point
            .write_point_to_bytes_native_compressed()
            .map_err(|e| EncodingError::SerializationError(e.to_string())),
    }
}

fn point_from_bytes<T: ReadPointFromBytes>(
    bytes: &[u8],
    format: ChunkEncodingFormat,
    name: &str,
) -> Result<T, EncodingError> {
    let point = match format {
        ChunkEncodingFormat::Generic => T::read_point_from_bytes_be(bytes),
        ChunkEncodingFormat::Native => T::read_point_from_bytes_native_compressed(bytes),
    };
    point.map_err(|e| EncodingError::SerializationError(format!("{}: {}", name, e)))
}

impl BlobCommitments {
    pub fn serialize(
        &self,
        format: ChunkEncodingFormat,
    ) -> Result<SerializedCommitments, EncodingError> {
        Ok(SerializedCommitments {
            commitment: g1_to_bytes(&self.commitment, format)?,
            length_commitment: g2_to_bytes(&self.length_commitment, format)?,
            length_proof: g2_to_bytes(&self.length_proof, format)?,
            length: self.length,
        })
    }

    pub fn deserialize(
        serialized: &SerializedCommitments,
        format: ChunkEncodingFormat,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            commitment: point_from_bytes(&serialized.commitment, format, "commitment")?,
            length_commitment: point_from_bytes(
                &serialized.length_commitment,
                format,
                "length commitment",
            )?,
            length_proof: point_from_bytes(&serialized.length_proof, format, "length proof")?,
            length: serialized.length,
        })
    }
}
