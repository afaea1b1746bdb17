use ark_bn254::Fr;
use ark_ff::{batch_inversion, FftField, Field};
use ark_poly::{
    univariate::DensePolynomial, DenseUVPolynomial, EvaluationDomain, GeneralEvaluationDomain,
};
use ark_std::{One, Zero};
use eigenda_encoding_primitives::{
    consts::BYTES_PER_FIELD_ELEMENT, errors::EncodingError, helpers, params::EncodingParams,
};
use rayon::prelude::*;

/// Reed-Solomon coder for one set of [EncodingParams].
///
/// The blob polynomial is evaluated over the `num_evaluations`-th roots of
/// unity. After a bit-reversal permutation of the evaluations, chunk `j` is
/// the contiguous run `[j * L, (j + 1) * L)`, which holds the evaluations over
/// the coset `h_j · H_L` (see [helpers::coset_leader]). Every chunk is shipped
/// as the coefficients of the degree `< L` polynomial interpolating those
/// evaluations.
#[derive(Debug, Clone)]
pub struct RsEncoder {
    params: EncodingParams,
    domain: GeneralEvaluationDomain<Fr>,
    chunk_domain: GeneralEvaluationDomain<Fr>,
    coset_leaders: Vec<Fr>,
}

fn new_domain(size: u64) -> Result<GeneralEvaluationDomain<Fr>, EncodingError> {
    GeneralEvaluationDomain::<Fr>::new(size as usize).ok_or_else(|| {
        EncodingError::FFTError(format!("could not construct a domain of size {}", size))
    })
}

impl RsEncoder {
    pub fn new(params: EncodingParams) -> Result<Self, EncodingError> {
        params.validate(u64::MAX)?;
        let domain = new_domain(params.num_evaluations())?;
        let chunk_domain = new_domain(params.chunk_length)?;
        let coset_leaders = (0..params.num_chunks as u32)
            .map(|j| helpers::coset_leader(j, &params))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            params,
            domain,
            chunk_domain,
            coset_leaders,
        })
    }

    pub fn params(&self) -> &EncodingParams {
        &self.params
    }

    /// Extends the polynomial with coefficients `input_fr` and splits the
    /// evaluations into `num_chunks` chunks of interpolation coefficients.
    /// Returns the chunks and, for each, its chunk index.
    pub fn encode(&self, input_fr: &[Fr]) -> Result<(Vec<Vec<Fr>>, Vec<u32>), EncodingError> {
        let evaluations = self.extend(input_fr)?;
        let chunk_length = self.params.chunk_length as usize;

        let chunks = evaluations
            .par_chunks(chunk_length)
            .enumerate()
            .map(|(j, chunk)| self.chunk_evals_to_coeffs(j, chunk))
            .collect::<Result<Vec<_>, _>>()?;
        let indices = (0..self.params.num_chunks as u32).collect();

        Ok((chunks, indices))
    }

    /// Evaluations of the blob polynomial over the full domain, in
    /// bit-reversed order.
    pub fn extend(&self, input_fr: &[Fr]) -> Result<Vec<Fr>, EncodingError> {
        let num_evaluations = self.params.num_evaluations() as usize;
        if input_fr.len() > num_evaluations {
            return Err(EncodingError::DataTooLarge {
                num_elements: input_fr.len(),
                capacity: num_evaluations,
            });
        }

        let mut evaluations = input_fr.to_vec();
        evaluations.resize(num_evaluations, Fr::zero());
        self.domain.fft_in_place(&mut evaluations);
        helpers::bit_reverse_permutation(&mut evaluations);
        Ok(evaluations)
    }

    /// Recovers the original blob bytes from any set of chunks holding at
    /// least `ceil(max_input_size / 32)` symbols. Repeated indices are ignored.
    pub fn decode(
        &self,
        chunks: &[Vec<Fr>],
        indices: &[u32],
        max_input_size: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        if chunks.len() != indices.len() {
            return Err(EncodingError::DimensionMismatch(format!(
                "{} chunks but {} indices",
                chunks.len(),
                indices.len()
            )));
        }

        let num_evaluations = self.params.num_evaluations() as usize;
        let chunk_length = self.params.chunk_length as usize;
        let num_chunks = self.params.num_chunks as usize;
        let num_symbols = helpers::get_num_element(max_input_size, BYTES_PER_FIELD_ELEMENT);
        if num_symbols > num_evaluations {
            return Err(EncodingError::DataTooLarge {
                num_elements: num_symbols,
                capacity: num_evaluations,
            });
        }

        let mut evaluations = vec![Fr::zero(); num_evaluations];
        let mut present = vec![false; num_chunks];
        for (chunk, &index) in chunks.iter().zip(indices) {
            let j = index as usize;
            if j >= num_chunks {
                return Err(EncodingError::DimensionMismatch(format!(
                    "chunk index {} out of range for {} chunks",
                    index, num_chunks
                )));
            }
            if chunk.len() != chunk_length {
                return Err(EncodingError::DimensionMismatch(format!(
                    "chunk {} has {} symbols, expected {}",
                    index,
                    chunk.len(),
                    chunk_length
                )));
            }
            if present[j] {
                continue;
            }
            present[j] = true;
            let chunk_evals = self.chunk_coeffs_to_evals(j, chunk);
            evaluations[j * chunk_length..(j + 1) * chunk_length].copy_from_slice(&chunk_evals);
        }

        let available = present.iter().filter(|p| **p).count() * chunk_length;
        if available < num_symbols {
            return Err(EncodingError::InsufficientSymbols {
                available,
                required: num_symbols,
            });
        }
        if num_symbols == 0 {
            return Ok(Vec::new());
        }

        // back to natural order: evaluations[i] = f(ω^i)
        helpers::bit_reverse_permutation(&mut evaluations);

        let missing: Vec<usize> = (0..num_chunks).filter(|j| !present[*j]).collect();
        let coeffs = if missing.is_empty() {
            self.domain.ifft(&evaluations)
        } else {
            self.recover_coeffs(&evaluations, &missing)?
        };

        Ok(helpers::to_byte_array(&coeffs[..num_symbols], max_input_size))
    }

    /// Interpolates the blob polynomial from evaluations that are zeroed on the
    /// cosets of the `missing` chunks.
    ///
    /// With `Z` vanishing on the missing cosets, `E·Z` agrees with `f·Z` on
    /// the whole domain. Dividing the two on a coset shifted off the domain,
    /// where `Z` has no roots, yields `f`.
    fn recover_coeffs(&self, evaluations: &[Fr], missing: &[usize]) -> Result<Vec<Fr>, EncodingError> {
        let zero_poly = self.zero_poly(missing);
        let zero_evals = self.domain.fft(&zero_poly);

        let product_evals: Vec<Fr> = evaluations
            .par_iter()
            .zip(zero_evals.par_iter())
            .map(|(e, z)| *e * z)
            .collect();
        let product_coeffs = self.domain.ifft(&product_evals);

        let shift = Fr::GENERATOR;
        let mut shifted_product = product_coeffs;
        let mut shifted_zero = zero_poly;
        scale_coeffs(&mut shifted_product, shift);
        scale_coeffs(&mut shifted_zero, shift);
        self.domain.fft_in_place(&mut shifted_product);
        self.domain.fft_in_place(&mut shifted_zero);

        if shifted_zero.iter().any(|z| z.is_zero()) {
            return Err(EncodingError::GenericError(
                "zero polynomial vanishes on the shifted coset".to_string(),
            ));
        }
        batch_inversion(&mut shifted_zero);
        let quotient: Vec<Fr> = shifted_product
            .par_iter()
            .zip(shifted_zero.par_iter())
            .map(|(p, z_inv)| *p * z_inv)
            .collect();

        let mut coeffs = self.domain.ifft(&quotient);
        let shift_inv = shift
            .inverse()
            .ok_or_else(|| EncodingError::GenericError("coset shift is zero".to_string()))?;
        scale_coeffs(&mut coeffs, shift_inv);
        Ok(coeffs)
    }

    /// Coefficients, padded to the domain size, of
    /// `Z(x) = ∏ (x^L - h_j^L)` over the missing chunks `j`.
    fn zero_poly(&self, missing: &[usize]) -> Vec<Fr> {
        let chunk_length = self.params.chunk_length as usize;
        let factors: Vec<DensePolynomial<Fr>> = missing
            .iter()
            .map(|j| {
                let root = self.coset_leaders[*j].pow([self.params.chunk_length]);
                DensePolynomial::from_coefficients_vec(vec![-root, Fr::one()])
            })
            .collect();
        let z_y = product_tree(&factors);

        let mut z_x = vec![Fr::zero(); self.params.num_evaluations() as usize];
        for (i, c) in z_y.coeffs.iter().enumerate() {
            z_x[i * chunk_length] = *c;
        }
        z_x
    }

    /// Turns the bit-reversed evaluations of chunk `j` into the coefficients of
    /// its interpolating polynomial.
    fn chunk_evals_to_coeffs(&self, j: usize, chunk: &[Fr]) -> Result<Vec<Fr>, EncodingError> {
        let mut evals = chunk.to_vec();
        helpers::bit_reverse_permutation(&mut evals);
        let mut coeffs = self.chunk_domain.ifft(&evals);
        let leader_inv = self.coset_leaders[j]
            .inverse()
            .ok_or_else(|| EncodingError::GenericError("coset leader is zero".to_string()))?;
        scale_coeffs(&mut coeffs, leader_inv);
        Ok(coeffs)
    }

    /// Inverse of [Self::chunk_evals_to_coeffs].
    fn chunk_coeffs_to_evals(&self, j: usize, coeffs: &[Fr]) -> Vec<Fr> {
        let mut evals = coeffs.to_vec();
        scale_coeffs(&mut evals, self.coset_leaders[j]);
        self.chunk_domain.fft_in_place(&mut evals);
        helpers::bit_reverse_permutation(&mut evals);
        evals
    }
}

/// Multiplies coefficient `i` by `factor^i`, i.e. substitutes `x -> factor·x`.
fn scale_coeffs(coeffs: &mut [Fr], factor: Fr) {
    let mut power = Fr::one();
    for c in coeffs.iter_mut() {
        *c *= power;
        power *= factor;
    }
}

fn product_tree(factors: &[DensePolynomial<Fr>]) -> DensePolynomial<Fr> {
    match factors.len() {
        0 => DensePolynomial::from_coefficients_vec(vec![Fr::one()]),
        1 => factors[0].clone(),
        len => {
            let (left, right) = factors.split_at(len / 2);
            &product_tree(left) * &product_tree(right)
        },
    }
}
