use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tag every canonical coin string starts with.
pub const BANK_TAG: &str = "BANK";

/// Number of independent left/right split indices per coin.
pub const COIN_RIS_LENGTH: usize = 3;

/// Length in bytes of every identity share.
pub const SHARE_LEN: usize = 64;

/// Largest accepted share length.
pub const MAX_SHARE_LEN: usize = 1024;

/// Largest accepted number of split indices.
pub const MAX_RIS_LENGTH: usize = 256;

/// Marker placed before the spender identity inside the identity tag.
pub const IDENT_PREFIX: &str = "IDENT:";

/// Protocol parameters shared by spender, bank and merchants.
///
/// All parties must agree on these; a coin built under one set of
/// parameters is malformed under another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub bank_tag: String,
    pub ris_length: usize,
    pub share_len: usize,
    pub ident_prefix: String,
}

impl Params {
    /// Reads parameters from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bank_tag.is_empty() {
            return Err(Error::InvalidConfig("bank tag is empty".into()));
        }
        if self.bank_tag.contains(|c| c == '-' || c == ',') {
            return Err(Error::InvalidConfig(format!(
                "bank tag {:?} contains a delimiter",
                self.bank_tag
            )));
        }
        if self.ris_length == 0 || self.ris_length > MAX_RIS_LENGTH {
            return Err(Error::InvalidConfig(format!(
                "ris_length must be in 1..={}, got {}",
                MAX_RIS_LENGTH, self.ris_length
            )));
        }
        if self.share_len > MAX_SHARE_LEN {
            return Err(Error::InvalidConfig(format!(
                "share_len must be at most {}, got {}",
                MAX_SHARE_LEN, self.share_len
            )));
        }
        if self.ident_prefix.is_empty() || self.ident_prefix.contains('\0') {
            return Err(Error::InvalidConfig(
                "identity prefix must be non-empty and free of NUL".into(),
            ));
        }
        if self.ident_prefix.len() >= self.share_len {
            return Err(Error::InvalidConfig(format!(
                "identity prefix needs {} bytes, shares hold {}",
                self.ident_prefix.len(),
                self.share_len
            )));
        }
        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bank_tag: BANK_TAG.to_string(),
            ris_length: COIN_RIS_LENGTH,
            share_len: SHARE_LEN,
            ident_prefix: IDENT_PREFIX.to_string(),
        }
    }
}
