use serde::{Deserialize, Serialize};

use crate::errors::EncodingError;

/// Coding granularity of one blob: `num_chunks` chunks of `chunk_length`
/// coded symbols each. Both values are powers of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodingParams {
    pub chunk_length: u64,
    pub num_chunks: u64,
}

impl EncodingParams {
    pub fn new(chunk_length: u64, num_chunks: u64) -> Self {
        Self {
            chunk_length,
            num_chunks,
        }
    }

    /// Total number of coded symbols, i.e. the size of the extension domain.
    pub fn num_evaluations(&self) -> u64 {
        self.chunk_length * self.num_chunks
    }

    /// Checks the params can be used against an SRS of order `srs_order`.
    pub fn validate(&self, srs_order: u64) -> Result<(), EncodingError> {
        if self.chunk_length == 0 || !self.chunk_length.is_power_of_two() {
            return Err(EncodingError::InvalidEncodingParams(format!(
                "chunk length {} must be a nonzero power of 2",
                self.chunk_length
            )));
        }
        if self.num_chunks == 0 || !self.num_chunks.is_power_of_two() {
            return Err(EncodingError::InvalidEncodingParams(format!(
                "number of chunks {} must be a nonzero power of 2",
                self.num_chunks
            )));
        }
        let num_evaluations = self
            .chunk_length
            .checked_mul(self.num_chunks)
            .ok_or_else(|| {
                EncodingError::InvalidEncodingParams("number of evaluations overflows".to_string())
            })?;
        if num_evaluations > srs_order {
            return Err(EncodingError::InvalidEncodingParams(format!(
                "number of evaluations {} exceeds srs order {}",
                num_evaluations, srs_order
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_power_of_two() {
        assert!(EncodingParams::new(3, 4).validate(1024).is_err());
        assert!(EncodingParams::new(4, 6).validate(1024).is_err());
        assert!(EncodingParams::new(0, 4).validate(1024).is_err());
        assert!(EncodingParams::new(4, 0).validate(1024).is_err());
    }

    #[test]
    fn test_validate_rejects_params_larger_than_srs() {
        assert!(EncodingParams::new(64, 32).validate(1024).is_err());
        assert!(EncodingParams::new(32, 32).validate(1024).is_ok());
    }
}
