use crate::error::{Error, Result};
use crate::utils::*;
use blsttc::pairing::bls12_381::{Fr, G2};
use blsttc::{PublicKey, SecretKey, Signature};
use std::fmt;
use tracing::debug;

/// The blind-signature capability the coin protocol is built on.
///
/// The bank signs a blinded message without learning it; the spender
/// removes the blinding factor and ends up with an ordinary signature
/// over the message that anyone holding the bank's public key can check.
pub trait BlindSignatureScheme {
    type SecretKey;
    type PublicKey: Clone + fmt::Debug;
    type Blinded: Clone + fmt::Debug;
    type BlindingFactor: Clone;
    type Signature: Clone + PartialEq + fmt::Debug;

    fn generate_keypair() -> (Self::SecretKey, Self::PublicKey);

    fn blind(msg: &[u8], pk: &Self::PublicKey) -> Result<(Self::Blinded, Self::BlindingFactor)>;

    fn sign(blinded: &Self::Blinded, sk: &Self::SecretKey) -> Result<Self::Signature>;

    fn unblind(
        blind_sig: &Self::Signature,
        pk: &Self::PublicKey,
        factor: &Self::BlindingFactor,
    ) -> Result<Self::Signature>;

    fn verify(sig: &Self::Signature, pk: &Self::PublicKey, msg: &[u8]) -> bool;
}

/// A message mapped onto G2 and multiplied by a secret blinding factor.
#[derive(Clone, Debug, PartialEq)]
pub struct BlindedMessage {
    point: G2,
}

impl BlindedMessage {
    pub fn point(&self) -> G2 {
        self.point
    }

    pub fn to_bytes(&self) -> [u8; 96] {
        g2_to_be_bytes(self.point)
    }
}

impl From<G2> for BlindedMessage {
    fn from(point: G2) -> Self {
        Self { point }
    }
}

impl std::convert::TryFrom<&[u8]> for BlindedMessage {
    type Error = Error;

    fn try_from(b: &[u8]) -> Result<Self> {
        let mut bytes = [0u8; 96];
        if b.len() != bytes.len() {
            return Err(Error::InvalidPoint);
        }
        bytes.copy_from_slice(b);
        Ok(Self::from(be_bytes_to_g2(bytes)?))
    }
}

/// Secret scalar known only to the spender. Not `Debug`.
#[derive(Clone)]
pub struct BlindingFactor(Fr);

impl BlindingFactor {
    pub fn random() -> Result<Self> {
        let sk = SecretKey::random();
        Ok(Self(secret_key_scalar(&sk)?))
    }
}

impl std::convert::TryFrom<[u8; 32]> for BlindingFactor {
    type Error = Error;

    fn try_from(b: [u8; 32]) -> Result<Self> {
        Ok(Self(fr_from_be_bytes(b)?))
    }
}

/// BLS12-381 blind signatures over `blsttc` keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlsBlindScheme;

impl BlindSignatureScheme for BlsBlindScheme {
    type SecretKey = SecretKey;
    type PublicKey = PublicKey;
    type Blinded = BlindedMessage;
    type BlindingFactor = BlindingFactor;
    type Signature = Signature;

    fn generate_keypair() -> (SecretKey, PublicKey) {
        let sk = SecretKey::random();
        let pk = sk.public_key();
        (sk, pk)
    }

    // BLS blinding needs no key material; the bank key only matters for verification.
    fn blind(msg: &[u8], _pk: &PublicKey) -> Result<(BlindedMessage, BlindingFactor)> {
        let factor = BlindingFactor::random()?;
        let blinded = blind(hash_to_g2(msg)?, factor.0);
        Ok((BlindedMessage::from(blinded), factor))
    }

    fn sign(blinded: &BlindedMessage, sk: &SecretKey) -> Result<Signature> {
        let sig_g2 = sign_g2(blinded.point(), secret_key_scalar(sk)?);
        debug!("bank signed blinded message");
        g2_to_signature(sig_g2)
    }

    fn unblind(
        blind_sig: &Signature,
        _pk: &PublicKey,
        factor: &BlindingFactor,
    ) -> Result<Signature> {
        let unblinded = unblind(signature_to_g2(blind_sig)?, factor.0)?;
        g2_to_signature(unblinded)
    }

    fn verify(sig: &Signature, pk: &PublicKey, msg: &[u8]) -> bool {
        verify_signature_on_msg(msg, sig, pk)
    }
}
