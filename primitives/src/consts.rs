pub const BYTES_PER_FIELD_ELEMENT: usize = 32;
pub const SIZE_OF_G1_AFFINE_COMPRESSED: usize = 32; // in bytes
pub const SIZE_OF_G2_AFFINE_COMPRESSED: usize = 64; // in bytes

/// Order of the mainnet SRS the g1/g2 point files are generated for.
pub const MAINNET_SRS_ORDER: u32 = 268435456;
/// Number of g1 points shipped in the mainnet point files (16MiB blobs).
pub const MAINNET_SRS_G1_SIZE: u32 = 524288;

/// Domain separator hashed with the seed when deriving the secret of an insecure setup.
pub const INSECURE_SRS_DOMAIN: &[u8] = b"EIGENDA_INSECURE_SRS_V1_";

// Flag bits stored in the top two bits of the first byte of a big-endian
// compressed point, as written by gnark-crypto.
pub const COMPRESSED_FLAG_MASK: u8 = 0b11 << 6;
pub const COMPRESSED_INFINITY: u8 = 0b01 << 6;
pub const COMPRESSED_SMALLEST: u8 = 0b10 << 6;
pub const COMPRESSED_LARGEST: u8 = 0b11 << 6;

/// Domain separator for the challenge of a batched frame verification.
pub const RANDOM_CHALLENGE_FRAME_BATCH_DOMAIN: &[u8] = b"EIGENDA_FRAME_BATCH_V1__";
