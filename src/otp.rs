//! One-time-pad and hashing primitives used by the identity commitments.

use crate::error::{Error, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`. Always 64 characters.
pub fn hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Byte-wise xor of two equally long buffers.
pub fn xor(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

/// Draws a fresh pad of `len` random bytes.
pub fn random_pad<R: RngCore + ?Sized>(len: usize, rng: &mut R) -> Vec<u8> {
    let mut pad = vec![0u8; len];
    rng.fill_bytes(&mut pad);
    pad
}
