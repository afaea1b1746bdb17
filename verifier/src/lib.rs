//! Checks run by storage nodes and retrievers on what the encoder produced.
//!
//! - [verify::verify_frame] opens the blob commitment on one chunk's coset.
//! - [batch::verify_frames] checks many frames of a blob with two pairings.
//! - [verify::verify_length_proof] and [verify::verify_commit_equivalence]
//!   check the blob commitments against each other.

pub mod batch;
pub mod verify;
