use crate::adjudicator::{adjudicate, Verdict};
use crate::coin::CoinDescriptor;
use crate::config::Params;
use crate::error::{Error, Result};
use crate::merchant::{check_ris, Deposit, Ris};
use crate::scheme::{BlindSignatureScheme, BlsBlindScheme};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the bank makes of a deposit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepositOutcome {
    /// First time this coin reaches the bank.
    Credited { guid: Uuid, amount: u64 },
    /// The coin was already deposited; see the verdict for who cheated.
    DoubleSpend(Verdict),
}

/// Represents the party that signs coins without seeing them, and later
/// redeems them.
pub struct Bank<S: BlindSignatureScheme = BlsBlindScheme> {
    sk: S::SecretKey,
    pk: S::PublicKey,
    params: Params,
    deposits: HashMap<Uuid, Ris>,
}

impl<S: BlindSignatureScheme> Bank<S> {
    pub fn new(params: Params) -> Result<Self> {
        let (sk, pk) = S::generate_keypair();
        Self::with_keys(params, sk, pk)
    }

    pub fn with_keys(params: Params, sk: S::SecretKey, pk: S::PublicKey) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            sk,
            pk,
            params,
            deposits: HashMap::new(),
        })
    }

    pub fn public_key(&self) -> &S::PublicKey {
        &self.pk
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Signs a blinded coin. The bank learns nothing about the coin.
    pub fn issue(&self, blinded: &S::Blinded) -> Result<S::Signature> {
        let sig = S::sign(blinded, &self.sk)?;
        debug!("issued blind signature");
        Ok(sig)
    }

    /// Number of distinct coins deposited so far.
    pub fn deposits(&self) -> usize {
        self.deposits.len()
    }

    pub fn deposit(&mut self, deposit: &Deposit<S>) -> Result<DepositOutcome> {
        if !S::verify(&deposit.signature, &self.pk, deposit.coin.as_bytes()) {
            warn!("deposit of coin with invalid signature");
            return Err(Error::InvalidSignature);
        }
        let descriptor = CoinDescriptor::parse(&deposit.coin, &self.params)?;
        if deposit.ris.guid != descriptor.guid {
            return Err(Error::MalformedRis(format!(
                "revealed shares belong to {}, coin is {}",
                deposit.ris.guid, descriptor.guid
            )));
        }
        check_ris(&descriptor, &deposit.ris, &self.params)?;

        if let Some(earlier) = self.deposits.get(&descriptor.guid) {
            let verdict = adjudicate(earlier, &deposit.ris, &self.params)?;
            warn!("coin {} deposited again: {:?}", descriptor.guid, verdict);
            return Ok(DepositOutcome::DoubleSpend(verdict));
        }

        self.deposits.insert(descriptor.guid, deposit.ris.clone());
        info!("credited coin {} worth {}", descriptor.guid, descriptor.amount);
        Ok(DepositOutcome::Credited {
            guid: descriptor.guid,
            amount: descriptor.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;
    use crate::identity::Side;
    use crate::merchant::Merchant;
    use blsttc::SecretKey;

    fn bank() -> Result<Bank> {
        let sk = SecretKey::from_bytes(*b"********************************")?;
        let pk = sk.public_key();
        Bank::with_keys(Params::default(), sk, pk)
    }

    fn withdraw(bank: &Bank, owner: &str, amount: u64) -> Result<Coin> {
        let mut coin: Coin = Coin::new(owner, amount, bank.public_key(), bank.params())?;
        coin.set_signature(bank.issue(coin.blinded())?)?;
        coin.unblind()?;
        Ok(coin)
    }

    fn merchant(bank: &Bank) -> Merchant {
        Merchant::new(bank.public_key().clone(), bank.params().clone())
    }

    #[test]
    fn honest_deposit_is_credited() -> Result<()> {
        let mut bank = bank()?;
        let coin = withdraw(&bank, "alice", 20)?;

        let deposit = merchant(&bank).accept(&coin)?;
        let outcome = bank.deposit(&deposit)?;

        assert_eq!(
            outcome,
            DepositOutcome::Credited {
                guid: coin.guid(),
                amount: 20
            }
        );
        assert_eq!(bank.deposits(), 1);

        Ok(())
    }

    #[test]
    fn double_spend_identifies_the_spender() -> Result<()> {
        let mut bank = bank()?;
        let coin = withdraw(&bank, "alice", 20)?;
        let shop = merchant(&bank);
        let cafe = merchant(&bank);

        let first = shop.accept_with_challenge(&coin, vec![Side::Right, Side::Left, Side::Left])?;
        let second = cafe.accept_with_challenge(&coin, vec![Side::Right, Side::Right, Side::Left])?;

        bank.deposit(&first)?;
        let outcome = bank.deposit(&second)?;

        assert_eq!(
            outcome,
            DepositOutcome::DoubleSpend(Verdict::SpenderCheating {
                guid: coin.guid(),
                identity: "alice".to_string()
            })
        );
        assert_eq!(bank.deposits(), 1);

        Ok(())
    }

    #[test]
    fn replayed_deposit_is_blamed_on_merchant() -> Result<()> {
        let mut bank = bank()?;
        let coin = withdraw(&bank, "bob", 3)?;
        let deposit = merchant(&bank).accept(&coin)?;

        bank.deposit(&deposit)?;
        let outcome = bank.deposit(&deposit)?;

        assert_eq!(
            outcome,
            DepositOutcome::DoubleSpend(Verdict::MerchantCheating { guid: coin.guid() })
        );

        Ok(())
    }

    #[test]
    fn forged_coin_string_is_refused() -> Result<()> {
        let mut bank = bank()?;
        let coin = withdraw(&bank, "alice", 3)?;
        let mut deposit = merchant(&bank).accept(&coin)?;
        deposit.coin = deposit.coin.replacen("-3-", "-300-", 1);

        assert!(matches!(bank.deposit(&deposit), Err(Error::InvalidSignature)));
        assert_eq!(bank.deposits(), 0);

        Ok(())
    }

    #[test]
    fn doctored_shares_are_refused() -> Result<()> {
        let mut bank = bank()?;
        let coin = withdraw(&bank, "alice", 3)?;
        let mut deposit = merchant(&bank).accept_with_challenge(&coin, vec![Side::Left; 3])?;
        deposit.ris.shares[0] = coin.get_share(Side::Right, 0)?.clone();

        assert!(matches!(
            bank.deposit(&deposit),
            Err(Error::RisHashMismatch {
                side: Side::Left,
                index: 0
            })
        ));

        Ok(())
    }

    #[test]
    fn generated_bank_issues_coins() -> Result<()> {
        let mut bank: Bank = Bank::new(Params::default())?;
        let coin = withdraw(&bank, "carol", 1)?;

        let deposit = merchant(&bank).accept(&coin)?;
        assert!(matches!(
            bank.deposit(&deposit)?,
            DepositOutcome::Credited { .. }
        ));

        Ok(())
    }

    #[test]
    fn invalid_params_are_rejected() -> Result<()> {
        let params = Params {
            ris_length: 0,
            ..Params::default()
        };

        assert!(matches!(
            Bank::<BlsBlindScheme>::new(params),
            Err(Error::InvalidConfig(_))
        ));

        Ok(())
    }
}
