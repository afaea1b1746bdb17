//! Stake-weighted assignment of blob chunks to operators.
//!
//! Every operator of a quorum receives a contiguous range of chunk indices
//! whose size is proportional to its share of the quorum stake. The result is
//! a pure function of the operator snapshot and the blob parameters, so every
//! party computing it agrees on who stores what.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, ops::Range};

use eigenda_encoding_primitives::params::EncodingParams;

pub mod errors;

pub use errors::AssignmentError;

pub type QuorumId = u8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperatorId(pub [u8; 32]);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorInfo {
    pub stake: BigUint,
    /// Registration index of the operator in the quorum.
    pub index: u32,
}

/// Snapshot of the registered operators and their stakes at one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperatorState {
    pub operators: HashMap<QuorumId, HashMap<OperatorId, OperatorInfo>>,
    pub totals: HashMap<QuorumId, BigUint>,
    pub block_number: u64,
}

/// Source of operator snapshots, usually backed by chain state.
pub trait OperatorStateProvider {
    fn get_operator_state(
        &self,
        block_number: u64,
        quorums: &[QuorumId],
    ) -> Result<OperatorState, AssignmentError>;
}

/// A fixed snapshot serves itself, restricted to the requested quorums.
impl OperatorStateProvider for OperatorState {
    fn get_operator_state(
        &self,
        block_number: u64,
        quorums: &[QuorumId],
    ) -> Result<OperatorState, AssignmentError> {
        if block_number != self.block_number {
            return Err(AssignmentError::StateUnavailable(format!(
                "snapshot is at block {}, requested {}",
                self.block_number, block_number
            )));
        }
        let operators = quorums
            .iter()
            .filter_map(|q| self.operators.get(q).map(|ops| (*q, ops.clone())))
            .collect();
        let totals = quorums
            .iter()
            .filter_map(|q| self.totals.get(q).map(|t| (*q, t.clone())))
            .collect();
        Ok(OperatorState {
            operators,
            totals,
            block_number,
        })
    }
}

/// Per blob version coding parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobVersionParameters {
    pub num_chunks: u32,
    pub coding_rate: u32,
    pub max_num_operators: u32,
}

/// Half-open range `[start_index, start_index + num_chunks)` of chunk indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub start_index: u32,
    pub num_chunks: u32,
}

impl Assignment {
    pub fn indices(&self) -> Range<u32> {
        self.start_index..self.start_index + self.num_chunks
    }
}

/// Assigns the `num_chunks` chunks of a blob to the operators of `quorum`.
///
/// Operator `i` first gets `ceil(stake_i * (num_chunks - n) / total_stake)`
/// chunks. Operators are then ordered by stake descending (ties by operator
/// index, then id), the leftover chunks go one each to the first operators in
/// that order, and ranges are laid out contiguously in the same order.
pub fn get_assignments(
    state: &OperatorState,
    blob_params: Option<&BlobVersionParameters>,
    quorum: QuorumId,
) -> Result<HashMap<OperatorId, Assignment>, AssignmentError> {
    let blob_params = blob_params.ok_or(AssignmentError::MissingParameters)?;

    let operators = match state.operators.get(&quorum) {
        Some(ops) if !ops.is_empty() => ops,
        _ => return Err(AssignmentError::NoOperators(quorum)),
    };
    let num_operators = operators.len();
    if num_operators > blob_params.max_num_operators as usize {
        return Err(AssignmentError::TooManyOperators {
            num_operators,
            max: blob_params.max_num_operators,
        });
    }
    if (blob_params.num_chunks as usize) < num_operators {
        return Err(AssignmentError::InsufficientChunks {
            num_chunks: blob_params.num_chunks,
            num_operators,
        });
    }
    let total_stake = match state.totals.get(&quorum) {
        Some(total) if !total.is_zero() => total,
        _ => return Err(AssignmentError::MissingTotalStake(quorum)),
    };

    let spare_chunks = BigUint::from(blob_params.num_chunks - num_operators as u32);
    let mut chunk_assignments = Vec::with_capacity(num_operators);
    for (id, info) in operators {
        let chunks = round_up_divide(&(&info.stake * &spare_chunks), total_stake)
            .to_u64()
            .ok_or(AssignmentError::ChunksExceedCapacity {
                total: u64::MAX,
                capacity: blob_params.num_chunks,
            })?;
        chunk_assignments.push((id, info, chunks));
    }

    chunk_assignments.sort_by(|(id_a, a, _), (id_b, b, _)| {
        b.stake
            .cmp(&a.stake)
            .then(a.index.cmp(&b.index))
            .then(id_a.cmp(id_b))
    });

    let total = chunk_assignments
        .iter()
        .fold(0u64, |acc, (_, _, chunks)| acc.saturating_add(*chunks));
    if total > blob_params.num_chunks as u64 {
        return Err(AssignmentError::ChunksExceedCapacity {
            total,
            capacity: blob_params.num_chunks,
        });
    }
    let delta = (blob_params.num_chunks as u64 - total) as usize;

    let mut assignments = HashMap::with_capacity(num_operators);
    let mut start_index = 0u32;
    for (i, (id, _, chunks)) in chunk_assignments.into_iter().enumerate() {
        // bounded by num_chunks, checked above
        let num_chunks = chunks as u32 + u32::from(i < delta);
        assignments.insert(
            *id,
            Assignment {
                start_index,
                num_chunks,
            },
        );
        start_index += num_chunks;
    }

    Ok(assignments)
}

/// The assignment of a single operator, or [AssignmentError::NotFound] if it
/// is not registered in `quorum`.
pub fn get_assignment(
    state: &OperatorState,
    blob_params: Option<&BlobVersionParameters>,
    quorum: QuorumId,
    operator_id: &OperatorId,
) -> Result<Assignment, AssignmentError> {
    let assignments = get_assignments(state, blob_params, quorum)?;
    assignments
        .get(operator_id)
        .copied()
        .ok_or(AssignmentError::NotFound)
}

/// Fetches the snapshot at `block_number` from `provider` and assigns the
/// chunks of `quorum`.
pub fn get_assignments_at<P: OperatorStateProvider + ?Sized>(
    provider: &P,
    block_number: u64,
    blob_params: Option<&BlobVersionParameters>,
    quorum: QuorumId,
) -> Result<HashMap<OperatorId, Assignment>, AssignmentError> {
    let state = provider.get_operator_state(block_number, &[quorum])?;
    get_assignments(&state, blob_params, quorum)
}

/// Number of coded symbols per chunk for a blob of `blob_length` symbols.
pub fn get_chunk_length(
    blob_length: u32,
    blob_params: Option<&BlobVersionParameters>,
) -> Result<u32, AssignmentError> {
    if blob_length == 0 || !blob_length.is_power_of_two() {
        return Err(AssignmentError::InvalidBlobLength(blob_length));
    }
    let blob_params = blob_params.ok_or(AssignmentError::MissingParameters)?;
    if blob_params.num_chunks == 0 {
        return Err(AssignmentError::InvalidParameters(
            "number of chunks must be greater than 0".to_string(),
        ));
    }

    let chunk_length =
        blob_length as u64 * blob_params.coding_rate as u64 / blob_params.num_chunks as u64;
    let chunk_length = u32::try_from(chunk_length.max(1)).map_err(|_| {
        AssignmentError::InvalidParameters(format!("chunk length {} overflows", chunk_length))
    })?;
    Ok(chunk_length)
}

/// Encoding params used to code a blob of `blob_length` symbols.
pub fn get_encoding_params(
    blob_length: u32,
    blob_params: Option<&BlobVersionParameters>,
) -> Result<EncodingParams, AssignmentError> {
    let chunk_length = get_chunk_length(blob_length, blob_params)?;
    let blob_params = blob_params.ok_or(AssignmentError::MissingParameters)?;
    let params = EncodingParams::new(chunk_length as u64, blob_params.num_chunks as u64);
    params
        .validate(u64::MAX)
        .map_err(|e| AssignmentError::InvalidParameters(e.to_string()))?;
    Ok(params)
}

fn round_up_divide(num: &BigUint, denom: &BigUint) -> BigUint {
    (num + denom - BigUint::from(1u8)) / denom
}
