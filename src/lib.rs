//! Chaum-style anonymous e-cash over BLS blind signatures.
//!
//! A spender builds a [`Coin`] carrying split commitments to their
//! identity, has the [`Bank`] sign it blindly, and spends it at a
//! [`Merchant`], which opens one half of each commitment at random.
//! Spending the same coin twice hands the bank both halves of at least
//! one commitment with overwhelming probability, and [`adjudicate`]
//! recovers the spender's identity from them.

mod adjudicator;
mod bank;
mod coin;
mod config;
mod error;
mod identity;
mod merchant;
pub mod otp;
mod scheme;
mod utils;

pub use crate::adjudicator::{adjudicate, Verdict};
pub use crate::bank::{Bank, DepositOutcome};
pub use crate::coin::{Coin, CoinDescriptor};
pub use crate::config::{
    Params, BANK_TAG, COIN_RIS_LENGTH, IDENT_PREFIX, MAX_RIS_LENGTH, MAX_SHARE_LEN, SHARE_LEN,
};
pub use crate::error::{EcashError, Error, Result};
pub use crate::identity::{
    identity_tag, recover_identity, Commitment, IdentityCommitments, IdentityShare, Side,
};
pub use crate::merchant::{check_ris, random_challenge, Deposit, Merchant, Presentation, Ris};
pub use crate::scheme::{BlindSignatureScheme, BlindedMessage, BlindingFactor, BlsBlindScheme};
