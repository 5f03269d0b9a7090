use crate::error::{Error, Result};
use blst::{blst_hash_to_g2, blst_p2, blst_p2_compress};
use blsttc::ff::{Field, PrimeField}; // for Fr trait
use blsttc::group::{CurveAffine, CurveProjective, EncodedPoint};
use blsttc::pairing::bls12_381::{Fr, FrRepr, G2Affine, G2};
use blsttc::{PublicKey, SecretKey, Signature};

const COIN_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

// Canonical coin strings are arbitrary bytes, so they are mapped onto G2
// before being blinded or verified.
pub(crate) fn hash_to_g2(msg: &[u8]) -> Result<G2> {
    let mut msg_hash: blst_p2 = Default::default();
    let aug = b"";
    unsafe {
        blst_hash_to_g2(
            &mut msg_hash,
            msg.as_ptr(),
            msg.len(),
            COIN_DST.as_ptr(),
            COIN_DST.len(),
            aug.as_ptr(),
            aug.len(),
        )
    };
    let mut msg_g2_bytes = [0u8; 96];
    unsafe { blst_p2_compress(&mut msg_g2_bytes[0], &msg_hash) }
    be_bytes_to_g2(msg_g2_bytes)
}

// big-endian bytes -> little-endian u64 limbs
pub(crate) fn fr_from_be_bytes(bytes: [u8; 32]) -> Result<Fr> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.rchunks(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *limb = u64::from_be_bytes(buf);
    }
    Fr::from_repr(FrRepr(limbs)).map_err(|_| Error::InvalidScalar)
}

pub(crate) fn secret_key_scalar(sk: &SecretKey) -> Result<Fr> {
    fr_from_be_bytes(sk.to_bytes())
}

// y = x * r
pub(crate) fn blind(g2: G2, r: Fr) -> G2 {
    g2.into_affine().mul(r)
}

// x = y * 1/r
pub(crate) fn unblind(g2: G2, r: Fr) -> Result<G2> {
    let inverse = r.inverse().ok_or(Error::InvalidScalar)?;
    Ok(g2.into_affine().mul(inverse))
}

// The bank signs a G2, not message bytes, so SecretKey::sign does not apply.
pub(crate) fn sign_g2(g2: G2, sk: Fr) -> G2 {
    g2.into_affine().mul(sk)
}

pub(crate) fn be_bytes_to_g2(bytes: [u8; 96]) -> Result<G2> {
    let mut compressed: <G2Affine as CurveAffine>::Compressed = EncodedPoint::empty();
    compressed.as_mut().copy_from_slice(&bytes);
    compressed
        .into_affine()
        .map(|affine| affine.into_projective())
        .map_err(|_| Error::InvalidPoint)
}

pub(crate) fn g2_to_be_bytes(g2: G2) -> [u8; 96] {
    let mut bytes = [0u8; 96];
    bytes.copy_from_slice(g2.into_affine().into_compressed().as_ref());
    bytes
}

pub(crate) fn g2_to_signature(g2: G2) -> Result<Signature> {
    Ok(Signature::from_bytes(g2_to_be_bytes(g2))?)
}

pub(crate) fn signature_to_g2(sig: &Signature) -> Result<G2> {
    be_bytes_to_g2(sig.to_bytes())
}

// pair(pk, H(msg)) == pair(g1, sig)
pub(crate) fn verify_signature_on_msg(msg: &[u8], sig: &Signature, pk: &PublicKey) -> bool {
    match hash_to_g2(msg) {
        Ok(msg_g2) => pk.verify_g2(sig, msg_g2),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_decoding_matches_secret_key() -> Result<()> {
        let sk = SecretKey::from_bytes(*b"********************************")?;
        let scalar = secret_key_scalar(&sk)?;

        // signing H(m) by hand must agree with blsttc's own verification
        let msg = b"BANK-5-abc";
        let sig = g2_to_signature(sign_g2(hash_to_g2(msg)?, scalar))?;
        assert!(verify_signature_on_msg(msg, &sig, &sk.public_key()));

        Ok(())
    }

    #[test]
    fn unblinding_reverses_blinding() -> Result<()> {
        let r = fr_from_be_bytes(*b"11111111111111111111111111111111")?;
        let point = hash_to_g2(b"some coin")?;

        assert_eq!(unblind(blind(point, r), r)?, point);

        Ok(())
    }

    #[test]
    fn zero_factor_cannot_unblind() -> Result<()> {
        let zero = fr_from_be_bytes([0u8; 32])?;
        let point = hash_to_g2(b"some coin")?;

        assert!(matches!(unblind(point, zero), Err(Error::InvalidScalar)));

        Ok(())
    }
}
