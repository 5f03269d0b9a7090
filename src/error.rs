use crate::identity::Side;
use blsttc::error::FromBytesError;
use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = EcashError> = std::result::Result<T, E>;
pub type Error = EcashError;

#[derive(Error, Debug)]
/// error variants.
pub enum EcashError {
    #[error("coin amount must be positive, got {0}")]
    InvalidAmount(u64),

    #[error("coin signature does not verify against the bank key")]
    InvalidSignature,

    #[error("malformed coin: {0}")]
    MalformedCoin(String),

    #[error("revealed {side} share at index {index} does not match its commitment")]
    RisHashMismatch { side: Side, index: usize },

    #[error("no {side} share at index {index}")]
    MissingShare { side: Side, index: usize },

    #[error("misuse: {0}")]
    Misuse(&'static str),

    #[error("identity tag needs {len} bytes but shares hold {max}")]
    IdentityTooLong { len: usize, max: usize },

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("xor operands differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("malformed revealed identity string: {0}")]
    MalformedRis(String),

    #[error("invalid parameters: {0}")]
    InvalidConfig(String),

    #[error("parameters could not be parsed")]
    Config(#[from] serde_json::Error),

    #[error("deserialization from bytes failed")]
    BlsttcFromBytes(#[from] FromBytesError),

    #[error("bytes do not encode a G2 point")]
    InvalidPoint,

    #[error("bytes do not encode a field element")]
    InvalidScalar,
}
