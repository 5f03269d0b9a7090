//! Split-encoded identity commitments embedded in every coin.
//!
//! For each split index the spender's identity tag is cut into two
//! one-time-pad halves. Either half alone is uniformly random; xoring
//! the left and right half of the same index yields the tag again.

use crate::config::Params;
use crate::error::{Error, Result};
use crate::otp;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Uniform draw.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            Side::Left
        } else {
            Side::Right
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// One half of a split identity tag.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityShare(Vec<u8>);

impl IdentityShare {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn commitment(&self) -> Commitment {
        Commitment(otp::hash(&self.0))
    }
}

impl From<Vec<u8>> for IdentityShare {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// shares are secret until revealed; keep them out of logs
impl fmt::Debug for IdentityShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityShare({} bytes)", self.0.len())
    }
}

/// Hex digest committing to one share.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(String);

impl Commitment {
    /// Accepts only a lowercase hex SHA-256 digest.
    pub fn parse(s: &str) -> Option<Self> {
        let well_formed = s.len() == 64
            && s.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, share: &IdentityShare) -> bool {
        *self == share.commitment()
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `prefix ++ identity`, zero padded to the share length.
pub fn identity_tag(identity: &str, params: &Params) -> Result<Vec<u8>> {
    if identity.contains('\0') {
        return Err(Error::InvalidIdentity(
            "identity contains a NUL byte".to_string(),
        ));
    }
    let len = params.ident_prefix.len() + identity.len();
    if len > params.share_len {
        return Err(Error::IdentityTooLong {
            len,
            max: params.share_len,
        });
    }
    let mut tag = Vec::with_capacity(params.share_len);
    tag.extend_from_slice(params.ident_prefix.as_bytes());
    tag.extend_from_slice(identity.as_bytes());
    tag.resize(params.share_len, 0);
    Ok(tag)
}

/// Inverse of [`identity_tag`]. `None` unless `tag` carries the prefix
/// and a UTF-8 identity.
pub fn recover_identity(tag: &[u8], params: &Params) -> Option<String> {
    let payload = tag.strip_prefix(params.ident_prefix.as_bytes())?;
    let end = payload
        .iter()
        .rposition(|b| *b != 0)
        .map_or(0, |last| last + 1);
    String::from_utf8(payload[..end].to_vec()).ok()
}

/// The four parallel arrays a coin is built from.
#[derive(Clone, Debug)]
pub struct IdentityCommitments {
    pub left_ident: Vec<IdentityShare>,
    pub right_ident: Vec<IdentityShare>,
    pub left_hashes: Vec<Commitment>,
    pub right_hashes: Vec<Commitment>,
}

impl IdentityCommitments {
    pub fn build<R: RngCore + ?Sized>(
        identity: &str,
        params: &Params,
        rng: &mut R,
    ) -> Result<Self> {
        let tag = identity_tag(identity, params)?;
        let n = params.ris_length;

        let mut left_ident = Vec::with_capacity(n);
        let mut right_ident = Vec::with_capacity(n);
        for _ in 0..n {
            let pad = otp::random_pad(params.share_len, rng);
            let left = otp::xor(&tag, &pad)?;
            let right = otp::xor(&left, &tag)?;
            left_ident.push(IdentityShare(left));
            right_ident.push(IdentityShare(right));
        }

        let left_hashes = left_ident.iter().map(IdentityShare::commitment).collect();
        let right_hashes = right_ident.iter().map(IdentityShare::commitment).collect();

        Ok(Self {
            left_ident,
            right_ident,
            left_hashes,
            right_hashes,
        })
    }
}
