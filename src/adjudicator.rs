//! Settles a coin that was deposited twice.
//!
//! Where the two merchants challenged opposite sides of a split index,
//! xoring their revealed shares gives back the spender's identity tag.
//! Where they challenged the same side, the shares cancel to zero.

use crate::config::Params;
use crate::error::{Error, Result};
use crate::identity::recover_identity;
use crate::merchant::Ris;
use crate::otp;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of adjudicating two deposits of the same coin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Both deposits are the same acceptance: one merchant replayed the other.
    MerchantCheating { guid: Uuid },
    /// The coin was spent twice; `identity` is its owner.
    SpenderCheating { guid: Uuid, identity: String },
    /// Two acceptances whose challenges agreed on every index. A replayed
    /// deposit re-stamped with a new acceptance id also lands here, since
    /// the id is chosen by the merchant and not authenticated.
    Inconclusive { guid: Uuid },
}

impl Verdict {
    pub fn guid(&self) -> Uuid {
        match self {
            Verdict::MerchantCheating { guid }
            | Verdict::SpenderCheating { guid, .. }
            | Verdict::Inconclusive { guid } => *guid,
        }
    }
}

pub fn adjudicate(first: &Ris, second: &Ris, params: &Params) -> Result<Verdict> {
    if first.guid != second.guid {
        return Err(Error::MalformedRis(format!(
            "deposits concern different coins ({} and {})",
            first.guid, second.guid
        )));
    }
    let guid = first.guid;
    for ris in [first, second].iter() {
        if ris.shares.len() != params.ris_length {
            return Err(Error::MalformedRis(format!(
                "expected {} shares, found {}",
                params.ris_length,
                ris.shares.len()
            )));
        }
    }

    if first == second {
        warn!("coin {} deposited twice from one acceptance", guid);
        return Ok(Verdict::MerchantCheating { guid });
    }

    // The two halves of an index differ by the (nonzero) identity tag, so
    // equal shares must come from equal challenges.
    if first.shares == second.shares && first.challenge != second.challenge {
        warn!(
            "coin {}: equal shares under different challenges, commitments are broken",
            guid
        );
    }

    for (index, (a, b)) in first.shares.iter().zip(&second.shares).enumerate() {
        let tag = otp::xor(a.as_bytes(), b.as_bytes())?;
        if tag.iter().all(|byte| *byte == 0) {
            debug!("coin {}: index {} challenged on the same side twice", guid, index);
            continue;
        }
        if let Some(identity) = recover_identity(&tag, params) {
            warn!("coin {} double-spent, owner recovered at index {}", guid, index);
            return Ok(Verdict::SpenderCheating { guid, identity });
        }
        debug!("coin {}: index {} does not decode to an identity", guid, index);
    }

    info!("coin {}: challenges coincided on every index", guid);
    Ok(Verdict::Inconclusive { guid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;
    use crate::identity::{IdentityShare, Side};
    use crate::merchant::Merchant;
    use crate::scheme::{BlindSignatureScheme, BlsBlindScheme};
    use blsttc::SecretKey;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(owner: &str) -> Result<(Coin, Merchant)> {
        let sk = SecretKey::from_bytes(*b"********************************")?;
        let mut coin: Coin = Coin::new(owner, 5, &sk.public_key(), &Params::default())?;
        coin.set_signature(BlsBlindScheme::sign(coin.blinded(), &sk)?)?;
        coin.unblind()?;
        Ok((coin, Merchant::new(sk.public_key(), Params::default())))
    }

    #[test]
    fn sides_differing_at_one_index_reveal_spender() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let a = merchant.accept_with_challenge(&coin, vec![Side::Left, Side::Left, Side::Right])?;
        let b = merchant.accept_with_challenge(&coin, vec![Side::Left, Side::Left, Side::Left])?;

        let verdict = adjudicate(&a.ris, &b.ris, &Params::default())?;
        assert_eq!(
            verdict,
            Verdict::SpenderCheating {
                guid: coin.guid(),
                identity: "alice".to_string()
            }
        );

        Ok(())
    }

    #[test]
    fn coinciding_challenges_are_inconclusive() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let challenge = vec![Side::Right, Side::Left, Side::Right];
        let a = merchant.accept_with_challenge(&coin, challenge.clone())?;
        let b = merchant.accept_with_challenge(&coin, challenge)?;

        let verdict = adjudicate(&a.ris, &b.ris, &Params::default())?;
        assert_eq!(verdict, Verdict::Inconclusive { guid: coin.guid() });

        Ok(())
    }

    #[test]
    fn replayed_deposit_is_merchant_cheating() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let a = merchant.accept(&coin)?;

        let verdict = adjudicate(&a.ris, &a.ris.clone(), &Params::default())?;
        assert_eq!(verdict, Verdict::MerchantCheating { guid: coin.guid() });

        Ok(())
    }

    #[test]
    fn restamped_replay_is_inconclusive() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let original = merchant.accept(&coin)?;
        let mut replay = original.ris.clone();
        replay.acceptance = Uuid::new_v4();

        let verdict = adjudicate(&original.ris, &replay, &Params::default())?;
        assert_eq!(verdict, Verdict::Inconclusive { guid: coin.guid() });

        Ok(())
    }

    #[test]
    fn random_double_spends_never_blame_the_wrong_owner() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let mut rng = StdRng::seed_from_u64(42);
        let mut caught = 0;

        for _ in 0..32 {
            let a = merchant.accept_with_rng(&coin, &mut rng)?;
            let b = merchant.accept_with_rng(&coin, &mut rng)?;
            match adjudicate(&a.ris, &b.ris, &Params::default())? {
                Verdict::SpenderCheating { guid, identity } => {
                    assert_eq!(guid, coin.guid());
                    assert_eq!(identity, "alice");
                    caught += 1;
                }
                Verdict::Inconclusive { guid } => {
                    assert_eq!(guid, coin.guid());
                    assert_eq!(a.ris.challenge, b.ris.challenge);
                }
                other => panic!("unexpected verdict {:?}", other),
            }
        }
        assert!(caught > 0);

        Ok(())
    }

    #[test]
    fn deposits_of_different_coins_are_rejected() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let a = merchant.accept(&coin)?;
        let mut b = merchant.accept(&coin)?;
        b.ris.guid = Uuid::nil();

        let result = adjudicate(&a.ris, &b.ris, &Params::default());
        assert!(matches!(result, Err(Error::MalformedRis(_))));

        Ok(())
    }

    #[test]
    fn short_ris_is_rejected() -> Result<()> {
        let (coin, merchant) = setup("alice")?;
        let a = merchant.accept(&coin)?;
        let mut b = merchant.accept(&coin)?;
        b.ris.shares.pop();

        let result = adjudicate(&a.ris, &b.ris, &Params::default());
        assert!(matches!(result, Err(Error::MalformedRis(_))));

        Ok(())
    }

    #[test]
    fn noise_is_not_mistaken_for_identity() -> Result<()> {
        let params = Params::default();
        let ris = |fill: u8| Ris {
            guid: Uuid::nil(),
            acceptance: Uuid::new_v4(),
            challenge: vec![Side::Left; 3],
            shares: vec![IdentityShare::from(vec![fill; params.share_len]); 3],
        };

        let verdict = adjudicate(&ris(0x11), &ris(0x22), &params)?;
        assert_eq!(verdict, Verdict::Inconclusive { guid: Uuid::nil() });

        Ok(())
    }
}
