use crate::coin::{Coin, CoinDescriptor};
use crate::config::Params;
use crate::error::{Error, Result};
use crate::identity::{IdentityShare, Side};
use crate::scheme::{BlindSignatureScheme, BlsBlindScheme};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What a spender shows a merchant: the coin's canonical string, its
/// unblinded signature, and the ability to open commitments on request.
pub trait Presentation<S: BlindSignatureScheme> {
    fn canonical(&self) -> String;

    fn signature(&self) -> Option<&S::Signature>;

    fn reveal(&self, side: Side, index: usize) -> Result<IdentityShare>;
}

impl<S: BlindSignatureScheme> Presentation<S> for Coin<S> {
    fn canonical(&self) -> String {
        Coin::canonical(self)
    }

    fn signature(&self) -> Option<&S::Signature> {
        Coin::signature(self)
    }

    fn reveal(&self, side: Side, index: usize) -> Result<IdentityShare> {
        self.get_share(side, index).map(Clone::clone)
    }
}

/// Revealed Identity String: the shares opened during one acceptance.
///
/// `acceptance` is minted fresh by the merchant for every acceptance, so
/// two honest acceptances never produce equal records even when their
/// challenges coincide. A merchant replaying another deposit does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ris {
    pub guid: Uuid,
    pub acceptance: Uuid,
    pub challenge: Vec<Side>,
    pub shares: Vec<IdentityShare>,
}

/// An accepted coin, as a merchant hands it to the bank.
#[derive(Clone, Debug)]
pub struct Deposit<S: BlindSignatureScheme = BlsBlindScheme> {
    pub coin: String,
    pub signature: S::Signature,
    pub ris: Ris,
}

/// Draws one side per split index.
pub fn random_challenge<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<Side> {
    (0..len).map(|_| Side::random(&mut *rng)).collect()
}

/// Checks every revealed share against the commitment for its side.
pub fn check_ris(descriptor: &CoinDescriptor, ris: &Ris, params: &Params) -> Result<()> {
    if ris.challenge.len() != params.ris_length || ris.shares.len() != params.ris_length {
        return Err(Error::MalformedRis(format!(
            "expected {} challenged shares, found {} sides and {} shares",
            params.ris_length,
            ris.challenge.len(),
            ris.shares.len()
        )));
    }
    for (index, (side, share)) in ris.challenge.iter().zip(&ris.shares).enumerate() {
        let commitment = descriptor
            .hashes(*side)
            .get(index)
            .ok_or(Error::MissingShare { side: *side, index })?;
        if !commitment.matches(share) {
            return Err(Error::RisHashMismatch { side: *side, index });
        }
    }
    Ok(())
}

/// A merchant that accepts coins issued under one bank key.
#[derive(Clone, Debug)]
pub struct Merchant<S: BlindSignatureScheme = BlsBlindScheme> {
    bank_key: S::PublicKey,
    params: Params,
}

impl<S: BlindSignatureScheme> Merchant<S> {
    pub fn new(bank_key: S::PublicKey, params: Params) -> Self {
        Self { bank_key, params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Accepts a coin using a fresh challenge from the thread RNG.
    pub fn accept<P: Presentation<S>>(&self, coin: &P) -> Result<Deposit<S>> {
        self.accept_with_rng(coin, &mut rand::thread_rng())
    }

    pub fn accept_with_rng<P: Presentation<S>, R: Rng + ?Sized>(
        &self,
        coin: &P,
        rng: &mut R,
    ) -> Result<Deposit<S>> {
        let challenge = random_challenge(self.params.ris_length, rng);
        self.accept_with_challenge(coin, challenge)
    }

    /// Runs acceptance against a challenge chosen by the caller.
    pub fn accept_with_challenge<P: Presentation<S>>(
        &self,
        coin: &P,
        challenge: Vec<Side>,
    ) -> Result<Deposit<S>> {
        let result = self.run_acceptance(coin, challenge);
        if let Err(e) = &result {
            warn!("refused coin: {}", e);
        }
        result
    }

    fn run_acceptance<P: Presentation<S>>(
        &self,
        coin: &P,
        challenge: Vec<Side>,
    ) -> Result<Deposit<S>> {
        let signature = coin
            .signature()
            .ok_or(Error::Misuse("coin presented before its signature was unblinded"))?;
        let canonical = coin.canonical();
        if !S::verify(signature, &self.bank_key, canonical.as_bytes()) {
            return Err(Error::InvalidSignature);
        }

        let descriptor = CoinDescriptor::parse(&canonical, &self.params)?;
        if challenge.len() != self.params.ris_length {
            debug!(
                "challenge covers {} indices, coin has {}",
                challenge.len(),
                self.params.ris_length
            );
            return Err(Error::Misuse("challenge length differs from ris_length"));
        }
        debug!("challenging coin {} with {:?}", descriptor.guid, challenge);

        let mut shares = Vec::with_capacity(challenge.len());
        for (index, side) in challenge.iter().copied().enumerate() {
            let share = coin.reveal(side, index).map_err(|e| {
                debug!("spender could not reveal {} share {}: {}", side, index, e);
                Error::MissingShare { side, index }
            })?;
            if !descriptor.hashes(side)[index].matches(&share) {
                return Err(Error::RisHashMismatch { side, index });
            }
            shares.push(share);
        }

        let ris = Ris {
            guid: descriptor.guid,
            acceptance: Uuid::new_v4(),
            challenge,
            shares,
        };
        info!("accepted coin {} worth {}", descriptor.guid, descriptor.amount);

        Ok(Deposit {
            coin: canonical,
            signature: signature.clone(),
            ris,
        })
    }
}
