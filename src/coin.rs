use crate::config::Params;
use crate::error::{Error, Result};
use crate::identity::{Commitment, IdentityCommitments, IdentityShare, Side};
use crate::scheme::{BlindSignatureScheme, BlsBlindScheme};
use rand::RngCore;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// The public, signed part of a coin.
///
/// Its `Display` output is the canonical coin string
/// `TAG-amount-guid-l0,l1,..-r0,r1,..`, which is exactly what gets
/// blinded, signed and later verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinDescriptor {
    pub bank_tag: String,
    pub amount: u64,
    pub guid: Uuid,
    pub left_hashes: Vec<Commitment>,
    pub right_hashes: Vec<Commitment>,
}

impl CoinDescriptor {
    pub fn parse(s: &str, params: &Params) -> Result<Self> {
        let fields: Vec<&str> = s.split('-').collect();
        if fields.len() != 5 {
            return Err(malformed(format!(
                "expected 5 fields, found {}",
                fields.len()
            )));
        }
        if fields[0] != params.bank_tag {
            return Err(malformed(format!("unknown bank tag {:?}", fields[0])));
        }
        let amount = fields[1]
            .parse::<u64>()
            .map_err(|_| malformed(format!("bad amount {:?}", fields[1])))?;
        let guid = Uuid::parse_str(fields[2])
            .map_err(|_| malformed(format!("bad guid {:?}", fields[2])))?;
        let left_hashes = parse_hashes(fields[3], Side::Left, params)?;
        let right_hashes = parse_hashes(fields[4], Side::Right, params)?;

        let descriptor = Self {
            bank_tag: fields[0].to_string(),
            amount,
            guid,
            left_hashes,
            right_hashes,
        };
        // "+5", "05" or a braced guid parse fine but are not what was signed
        if descriptor.to_string() != s {
            return Err(malformed("coin string is not in canonical form".to_string()));
        }
        Ok(descriptor)
    }

    pub fn hashes(&self, side: Side) -> &[Commitment] {
        match side {
            Side::Left => &self.left_hashes,
            Side::Right => &self.right_hashes,
        }
    }
}

impl fmt::Display for CoinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.bank_tag,
            self.amount,
            self.guid.simple(),
            join(&self.left_hashes),
            join(&self.right_hashes)
        )
    }
}

fn join(hashes: &[Commitment]) -> String {
    hashes
        .iter()
        .map(Commitment::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_hashes(field: &str, side: Side, params: &Params) -> Result<Vec<Commitment>> {
    let hashes = field
        .split(',')
        .map(|h| {
            Commitment::parse(h).ok_or_else(|| malformed(format!("bad {} hash {:?}", side, h)))
        })
        .collect::<Result<Vec<_>>>()?;
    if hashes.len() != params.ris_length {
        return Err(malformed(format!(
            "expected {} {} hashes, found {}",
            params.ris_length,
            side,
            hashes.len()
        )));
    }
    Ok(hashes)
}

fn malformed(reason: String) -> Error {
    Error::MalformedCoin(reason)
}

enum SignatureState<Sig> {
    Unsigned,
    Blind(Sig),
    Unblinded(Sig),
}

/// A coin as held by its spender: the signed descriptor plus the secret
/// identity shares backing its commitments.
pub struct Coin<S: BlindSignatureScheme = BlsBlindScheme> {
    descriptor: CoinDescriptor,
    left_ident: Vec<IdentityShare>,
    right_ident: Vec<IdentityShare>,
    bank_key: S::PublicKey,
    blinded: S::Blinded,
    blinding_factor: S::BlindingFactor,
    signature: SignatureState<S::Signature>,
}

impl<S: BlindSignatureScheme> Coin<S> {
    pub fn new(
        owner: &str,
        amount: u64,
        bank_key: &S::PublicKey,
        params: &Params,
    ) -> Result<Self> {
        Self::with_rng(owner, amount, bank_key, params, &mut rand::thread_rng())
    }

    pub fn with_rng<R: RngCore + ?Sized>(
        owner: &str,
        amount: u64,
        bank_key: &S::PublicKey,
        params: &Params,
        rng: &mut R,
    ) -> Result<Self> {
        if amount == 0 {
            return Err(Error::InvalidAmount(amount));
        }
        params.validate()?;

        let commitments = IdentityCommitments::build(owner, params, rng)?;
        let descriptor = CoinDescriptor {
            bank_tag: params.bank_tag.clone(),
            amount,
            guid: Uuid::new_v4(),
            left_hashes: commitments.left_hashes,
            right_hashes: commitments.right_hashes,
        };
        let (blinded, blinding_factor) = S::blind(descriptor.to_string().as_bytes(), bank_key)?;
        debug!("built coin {} worth {}", descriptor.guid, amount);

        Ok(Self {
            descriptor,
            left_ident: commitments.left_ident,
            right_ident: commitments.right_ident,
            bank_key: bank_key.clone(),
            blinded,
            blinding_factor,
            signature: SignatureState::Unsigned,
        })
    }

    pub fn guid(&self) -> Uuid {
        self.descriptor.guid
    }

    pub fn amount(&self) -> u64 {
        self.descriptor.amount
    }

    pub fn descriptor(&self) -> &CoinDescriptor {
        &self.descriptor
    }

    /// The blinded canonical string, to be handed to the bank for signing.
    pub fn blinded(&self) -> &S::Blinded {
        &self.blinded
    }

    pub fn canonical(&self) -> String {
        self.descriptor.to_string()
    }

    /// Stores the bank's blind signature. Only legal once.
    pub fn set_signature(&mut self, sig: S::Signature) -> Result<()> {
        match self.signature {
            SignatureState::Unsigned => {
                self.signature = SignatureState::Blind(sig);
                Ok(())
            }
            _ => Err(Error::Misuse("coin signature already set")),
        }
    }

    /// Strips the blinding factor from the bank's signature, leaving a
    /// signature over the canonical string. Only legal once, after
    /// [`Coin::set_signature`].
    pub fn unblind(&mut self) -> Result<()> {
        let blind_sig = match &self.signature {
            SignatureState::Blind(sig) => sig,
            SignatureState::Unsigned => {
                return Err(Error::Misuse("coin has no signature to unblind"))
            }
            SignatureState::Unblinded(_) => {
                return Err(Error::Misuse("coin signature already unblinded"))
            }
        };
        let sig = S::unblind(blind_sig, &self.bank_key, &self.blinding_factor)?;
        if !S::verify(&sig, &self.bank_key, self.canonical().as_bytes()) {
            return Err(Error::InvalidSignature);
        }
        self.signature = SignatureState::Unblinded(sig);
        debug!("unblinded signature on coin {}", self.guid());
        Ok(())
    }

    pub fn is_unblinded(&self) -> bool {
        matches!(self.signature, SignatureState::Unblinded(_))
    }

    /// The final signature. `None` until the coin has been unblinded.
    pub fn signature(&self) -> Option<&S::Signature> {
        match &self.signature {
            SignatureState::Unblinded(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn get_share(&self, side: Side, index: usize) -> Result<&IdentityShare> {
        let shares = match side {
            Side::Left => &self.left_ident,
            Side::Right => &self.right_ident,
        };
        shares.get(index).ok_or(Error::MissingShare { side, index })
    }
}

impl<S: BlindSignatureScheme> fmt::Display for Coin<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.descriptor, f)
    }
}
