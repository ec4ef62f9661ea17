//! Signed reward manifests.
//!
//! A proof-of-stake block's coinbase commits to its payouts with a signature
//! from the staking key. Layout of the coinbase outputs:
//!
//! ```text
//! out[0]          value 0   OP_RETURN <size> <signature> <pubkey>
//! out[1..=size]   payouts   the reward manifest, in order
//! out[size+1]     value 0   trailing marker
//! ```
//!
//! `size` is a script number of at most 4 bytes. The signature is a DER
//! ECDSA signature over
//!
//! ```text
//! SHA256d( for each payout: script ‖ value ;  block time ‖ coinstake input 0 )
//! ```
//!
//! and the coinstake's output must pay the signer's own key, either as a key
//! hash (P2PKH / P2WPKH) or as P2SH-wrapped P2WPKH.

use tracing::debug;
use xpc_core::encode::Encodable;
use xpc_core::error::XpcError;
use xpc_core::script::{decode_script_num, opcodes::OP_RETURN, Instructions, Script, ScriptBuilder, ScriptClass};
use xpc_core::transaction::{Block, Transaction, TxIn, TxOut};
use xpc_core::types::{Amount, Hash256};
use xpc_crypto::{sha256d, CryptoError, KeyPair, PublicKey};

/// Longest script number accepted for the manifest size.
pub const MAX_SIZE_FIELD_BYTES: usize = 4;

// ── RewardManifest ────────────────────────────────────────────────────────────

/// The ordered payouts a block's coinbase distributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RewardManifest {
    pub entries: Vec<(Script, Amount)>,
}

impl RewardManifest {
    pub fn new(entries: Vec<(Script, Amount)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Amount {
        self.entries.iter().map(|(_, v)| *v).sum()
    }

    /// Payout outputs `1..=size` of a coinbase. Caller checks the bounds.
    fn from_outputs(outputs: &[TxOut]) -> Self {
        Self {
            entries: outputs
                .iter()
                .map(|o| (o.script_pubkey.clone(), o.value))
                .collect(),
        }
    }

    /// Digest the staking key signs.
    pub fn signature_hash(&self, block_time: u32, stake_input: &TxIn) -> Hash256 {
        let mut buf = Vec::new();
        for (script, amount) in &self.entries {
            script.consensus_encode(&mut buf);
            amount.consensus_encode(&mut buf);
        }
        block_time.consensus_encode(&mut buf);
        stake_input.consensus_encode(&mut buf);
        sha256d(&buf)
    }
}

// ── Header script ─────────────────────────────────────────────────────────────

/// Decoded `OP_RETURN <size> <signature> <pubkey>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardHeader {
    pub size: i64,
    pub signature: Vec<u8>,
    pub pubkey: Vec<u8>,
}

impl RewardHeader {
    /// Parse coinbase output 0. The pubkey is returned raw; curve validity
    /// is checked by the caller.
    pub fn parse(script: &Script) -> Result<Self, XpcError> {
        match script.as_bytes().first() {
            None => return Err(XpcError::MalformedRewardScript("empty script")),
            Some(&op) if op != OP_RETURN => {
                return Err(XpcError::MalformedRewardScript("missing OP_RETURN marker"))
            }
            Some(_) => {}
        }

        let mut ops = script.instructions_from(1);
        let size = next_push(&mut ops, "missing size field")?;
        if size.len() > MAX_SIZE_FIELD_BYTES {
            return Err(XpcError::RewardSizeTooLong { len: size.len() });
        }
        let size = decode_script_num(size);
        let signature = next_push(&mut ops, "missing signature")?.to_vec();
        let pubkey = next_push(&mut ops, "missing public key")?.to_vec();

        Ok(Self {
            size,
            signature,
            pubkey,
        })
    }

    pub fn to_script(&self) -> Script {
        let mut b = ScriptBuilder::new();
        b.push_opcode(OP_RETURN)
            .push_num(self.size)
            .push_slice(&self.signature)
            .push_slice(&self.pubkey);
        b.into_script()
    }
}

fn next_push<'a>(ops: &mut Instructions<'a>, missing: &'static str) -> Result<&'a [u8], XpcError> {
    match ops.next() {
        None => Err(XpcError::MalformedRewardScript(missing)),
        Some(None) => Err(XpcError::MalformedRewardScript("truncated push")),
        Some(Some(ins)) => Ok(ins.data),
    }
}

// ── Verification ──────────────────────────────────────────────────────────────

/// True if the coinstake's output pays the key that signed the manifest.
pub fn signer_owns_coinstake(coinstake: &Transaction, pubkey: &PublicKey) -> bool {
    let Some(out) = coinstake.outputs.first() else {
        return false;
    };
    match out.script_pubkey.classify() {
        ScriptClass::ScriptHash(script_id) => pubkey.p2sh_segwit_id() == Some(script_id),
        ScriptClass::PubKeyHash(key_id) | ScriptClass::WitnessKeyHash(key_id) => {
            key_id == pubkey.key_id()
        }
        ScriptClass::NonStandard
        | ScriptClass::PubKey(_)
        | ScriptClass::MultiSig { .. }
        | ScriptClass::NullData
        | ScriptClass::WitnessScriptHash(_)
        | ScriptClass::WitnessUnknown { .. } => false,
    }
}

/// Extract the manifest from a block's coinbase, checking the header and the
/// zero-value markers. Returns the manifest with the decoded header.
pub fn extract_manifest(coinbase: &Transaction) -> Result<(RewardHeader, RewardManifest), XpcError> {
    let first = coinbase
        .outputs
        .first()
        .ok_or(XpcError::MalformedRewardScript("coinbase has no outputs"))?;
    let header = RewardHeader::parse(&first.script_pubkey)?;

    let outputs = coinbase.outputs.len();
    let size = usize::try_from(header.size)
        .ok()
        .filter(|n| n.checked_add(2) == Some(outputs))
        .ok_or(XpcError::RewardSizeMismatch {
            declared: header.size,
            outputs,
        })?;

    if first.value != 0 {
        return Err(XpcError::NonZeroMarkerOutput {
            index: 0,
            value: first.value,
        });
    }
    let last = &coinbase.outputs[outputs - 1];
    if last.value != 0 {
        return Err(XpcError::NonZeroMarkerOutput {
            index: outputs - 1,
            value: last.value,
        });
    }

    let manifest = RewardManifest::from_outputs(&coinbase.outputs[1..=size]);
    Ok((header, manifest))
}

/// Verify the block's signed reward manifest, reporting why it fails.
pub fn check_coinbase_reward(block: &Block) -> Result<(), XpcError> {
    let coinbase = block
        .coinbase()
        .ok_or(XpcError::MissingTransaction("coinbase"))?;
    let (header, manifest) = extract_manifest(coinbase)?;

    let pubkey = PublicKey::from_slice(&header.pubkey).map_err(|_| XpcError::InvalidPublicKey)?;

    let coinstake = block
        .coinstake()
        .ok_or(XpcError::MissingTransaction("coinstake"))?;
    let stake_input = coinstake
        .inputs
        .first()
        .ok_or(XpcError::MissingCoinstakeInput)?;

    if !signer_owns_coinstake(coinstake, &pubkey) {
        return Err(XpcError::SignerDestinationMismatch);
    }

    let hash = manifest.signature_hash(block.time, stake_input);
    pubkey
        .verify(&hash, &header.signature)
        .map_err(|_| XpcError::InvalidSignature)
}

/// True only if the block's coinbase carries a valid manifest signed by the
/// coinstake's owner.
pub fn verify_coinbase_reward(block: &Block) -> bool {
    match check_coinbase_reward(block) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "coinbase reward rejected");
            false
        }
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

/// Sign `manifest` with the staking key and lay out the coinbase outputs:
/// header, payouts, then `trailer` as the zero-value last output.
pub fn build_reward_outputs(
    manifest: &RewardManifest,
    block_time: u32,
    stake_input: &TxIn,
    key: &KeyPair,
    trailer: Script,
) -> Result<Vec<TxOut>, CryptoError> {
    let hash = manifest.signature_hash(block_time, stake_input);
    let header = RewardHeader {
        size: manifest.len() as i64,
        signature: key.sign_digest(&hash)?,
        pubkey: key.public_key().as_bytes().to_vec(),
    };

    let mut outputs = Vec::with_capacity(manifest.len() + 2);
    outputs.push(TxOut::new(0, header.to_script()));
    outputs.extend(
        manifest
            .entries
            .iter()
            .map(|(script, value)| TxOut::new(*value, script.clone())),
    );
    outputs.push(TxOut::new(0, trailer));
    Ok(outputs)
}
