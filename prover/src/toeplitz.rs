use ark_bn254::Fr;
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use eigenda_encoding_primitives::errors::EncodingError;

/// A circulant matrix described by the vector `V`. Row `w` holds `V` rotated
/// right by `w`, so `(C·x)_w = Σ_u V[(u - w) mod n] · x_u`.
///
/// The product is computed as a cyclic convolution of `x` with the first
/// column `colV[i] = V[(n - i) mod n]`, in `O(n log n)`.
#[derive(Debug, Clone)]
pub struct Circular {
    v: Vec<Fr>,
    domain: GeneralEvaluationDomain<Fr>,
}

impl Circular {
    /// `v.len()` must be a nonzero power of two.
    pub fn new(v: Vec<Fr>) -> Result<Self, EncodingError> {
        if v.is_empty() || !v.len().is_power_of_two() {
            return Err(EncodingError::DimensionMismatch(format!(
                "circular vector length {} is not a power of 2",
                v.len()
            )));
        }
        let domain = GeneralEvaluationDomain::<Fr>::new(v.len()).ok_or_else(|| {
            EncodingError::FFTError(format!("could not construct a domain of size {}", v.len()))
        })?;
        Ok(Self { v, domain })
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    /// First column of the matrix.
    pub fn coeffs(&self) -> Vec<Fr> {
        let n = self.v.len();
        (0..n).map(|i| self.v[(n - i) % n]).collect()
    }

    /// FFT of the first column. Multiplying it pointwise with the FFT of a
    /// vector is the frequency-domain form of [Circular::multiply].
    pub fn fft_coeffs(&self) -> Vec<Fr> {
        self.domain.fft(&self.coeffs())
    }

    pub fn multiply(&self, x: &[Fr]) -> Result<Vec<Fr>, EncodingError> {
        if x.len() != self.v.len() {
            return Err(EncodingError::DimensionMismatch(format!(
                "vector of length {} against circular matrix of size {}",
                x.len(),
                self.v.len()
            )));
        }
        let x_fft = self.domain.fft(x);
        let product = hadamard(&x_fft, &self.fft_coeffs())?;
        Ok(self.domain.ifft(&product))
    }
}

/// Pointwise product of two vectors of the same length.
pub fn hadamard(a: &[Fr], b: &[Fr]) -> Result<Vec<Fr>, EncodingError> {
    if a.len() != b.len() {
        return Err(EncodingError::DimensionMismatch(format!(
            "cannot do hadamard product of vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b).map(|(x, y)| *x * y).collect())
}
