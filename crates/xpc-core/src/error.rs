use thiserror::Error;

use crate::types::TxId;

/// Coarse taxonomy of consensus failures. Callers branch on this rather than
/// on individual variants: structural and crypto failures reject the block,
/// lookup failures are ordinary negatives, config failures flag bad params.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Structural,
    Lookup,
    Crypto,
    ConfigInvariant,
}

#[derive(Debug, Error, PartialEq)]
pub enum XpcError {
    // ── Coinstake shape ──────────────────────────────────────────────────────
    #[error("coinstake must spend exactly one input, got {got}")]
    TooManyInputs { got: usize },

    #[error("coinstake must have exactly one output, got {got}")]
    TooManyOutputs { got: usize },

    #[error("coinstake has no input")]
    MissingCoinstakeInput,

    #[error("invalid coinstake input hash: referenced {referenced}, resolved {resolved}")]
    InvalidCoinstakeInputHash { referenced: TxId, resolved: TxId },

    #[error("coinstake input references missing output {index} of {txid}")]
    MissingPrevOutput { txid: TxId, index: u32 },

    #[error("invalid coinstake output: destination differs from staked input")]
    CoinstakeDestinationMismatch,

    #[error("transaction {0} spends the same input twice")]
    DuplicateInputs(TxId),

    // ── Coinbase reward manifest ─────────────────────────────────────────────
    #[error("block is missing its {0} transaction")]
    MissingTransaction(&'static str),

    #[error("malformed reward script: {0}")]
    MalformedRewardScript(&'static str),

    #[error("reward size field too long: {len} bytes (max 4)")]
    RewardSizeTooLong { len: usize },

    #[error("reward size mismatch: declared {declared}, coinbase has {outputs} outputs")]
    RewardSizeMismatch { declared: i64, outputs: usize },

    #[error("coinbase marker output {index} carries value {value}")]
    NonZeroMarkerOutput { index: usize, value: i64 },

    // ── Lookups ──────────────────────────────────────────────────────────────
    #[error("unknown coinstake input: {0}")]
    UnknownInput(TxId),

    // ── Crypto ───────────────────────────────────────────────────────────────
    #[error("invalid public key in reward script")]
    InvalidPublicKey,

    #[error("reward signature does not verify")]
    InvalidSignature,

    #[error("coinstake destination does not belong to the reward signer")]
    SignerDestinationMismatch,

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("interest rate {rate} reached ceiling {ceiling} in phase {phase}")]
    RateCeilingReached { phase: u32, rate: u32, ceiling: u32 },

    #[error("invalid consensus params: {0}")]
    InvalidParams(&'static str),
}

impl XpcError {
    pub fn class(&self) -> ErrorClass {
        match self {
            XpcError::TooManyInputs { .. }
            | XpcError::TooManyOutputs { .. }
            | XpcError::MissingCoinstakeInput
            | XpcError::InvalidCoinstakeInputHash { .. }
            | XpcError::MissingPrevOutput { .. }
            | XpcError::CoinstakeDestinationMismatch
            | XpcError::DuplicateInputs(_)
            | XpcError::MissingTransaction(_)
            | XpcError::MalformedRewardScript(_)
            | XpcError::RewardSizeTooLong { .. }
            | XpcError::RewardSizeMismatch { .. }
            | XpcError::NonZeroMarkerOutput { .. } => ErrorClass::Structural,

            XpcError::UnknownInput(_) => ErrorClass::Lookup,

            XpcError::InvalidPublicKey
            | XpcError::InvalidSignature
            | XpcError::SignerDestinationMismatch => ErrorClass::Crypto,

            XpcError::RateCeilingReached { .. } | XpcError::InvalidParams(_) => {
                ErrorClass::ConfigInvariant
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(XpcError::TooManyInputs { got: 2 }.class(), ErrorClass::Structural);
        assert_eq!(
            XpcError::UnknownInput(TxId::from_bytes([1; 32])).class(),
            ErrorClass::Lookup
        );
        assert_eq!(XpcError::InvalidSignature.class(), ErrorClass::Crypto);
        assert_eq!(
            XpcError::RateCeilingReached { phase: 1, rate: 240, ceiling: 240 }.class(),
            ErrorClass::ConfigInvariant
        );
        assert_eq!(XpcError::MissingCoinstakeInput.class(), ErrorClass::Structural);
        assert_eq!(
            XpcError::InvalidParams("coin must be positive").class(),
            ErrorClass::ConfigInvariant
        );
    }

    #[test]
    fn messages_name_the_failure() {
        let msg = XpcError::TooManyOutputs { got: 2 }.to_string();
        assert!(msg.contains("exactly one output"));
        assert_eq!(XpcError::MissingCoinstakeInput.to_string(), "coinstake has no input");
        let msg = XpcError::UnknownInput(TxId::from_bytes([0; 32])).to_string();
        assert!(msg.starts_with("unknown coinstake input"));
    }
}
