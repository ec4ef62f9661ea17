//! Locking scripts: tokenizer, standard templates, destinations.
//!
//! Only enough of the script language to classify standard output scripts
//! and to read the reward manifest header. Nothing here executes scripts.

use bech32::{Fe32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Hash160;

// ── Opcodes ───────────────────────────────────────────────────────────────────

pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1NEGATE: u8 = 0x4f;
    pub const OP_1: u8 = 0x51;
    pub const OP_16: u8 = 0x60;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CHECKSIG: u8 = 0xac;
    pub const OP_CHECKMULTISIG: u8 = 0xae;
}

use opcodes::*;

// ── Script ────────────────────────────────────────────────────────────────────

#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script(pub Vec<u8>);

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

/// One tokenizer step: the opcode byte and, for pushes, the pushed bytes.
/// Non-push opcodes carry an empty payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub opcode: u8,
    pub data: &'a [u8],
}

impl Script {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokenize from byte offset `pos`. Yields `None` on a truncated push.
    pub fn instructions_from(&self, pos: usize) -> Instructions<'_> {
        Instructions {
            bytes: &self.0,
            pos,
        }
    }

    pub fn instructions(&self) -> Instructions<'_> {
        self.instructions_from(0)
    }

    /// True if every opcode after `pos` is a push (`OP_1NEGATE..=OP_16`
    /// count as pushes).
    fn is_push_only_from(&self, pos: usize) -> bool {
        self.instructions_from(pos)
            .all(|ins| matches!(ins, Some(i) if i.opcode <= OP_16))
    }

    // ── Standard templates ───────────────────────────────────────────────────

    pub fn new_p2pkh(key_id: &Hash160) -> Self {
        let mut s = vec![OP_DUP, OP_HASH160, 20];
        s.extend_from_slice(key_id.as_bytes());
        s.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(s)
    }

    pub fn new_p2sh(script_id: &Hash160) -> Self {
        let mut s = vec![OP_HASH160, 20];
        s.extend_from_slice(script_id.as_bytes());
        s.push(OP_EQUAL);
        Self(s)
    }

    pub fn new_p2wpkh(key_id: &Hash160) -> Self {
        let mut s = vec![OP_0, 20];
        s.extend_from_slice(key_id.as_bytes());
        Self(s)
    }

    pub fn new_p2pk(pubkey: &[u8]) -> Self {
        let mut b = ScriptBuilder::new();
        b.push_slice(pubkey).push_opcode(OP_CHECKSIG);
        b.into_script()
    }

    pub fn for_destination(dest: &Destination) -> Self {
        match dest {
            Destination::KeyHash(h) => Self::new_p2pkh(h),
            Destination::ScriptHash(h) => Self::new_p2sh(h),
            Destination::WitnessKeyHash(h) => Self::new_p2wpkh(h),
            Destination::WitnessScriptHash(h) => {
                let mut s = vec![OP_0, 32];
                s.extend_from_slice(h);
                Self(s)
            }
            Destination::WitnessUnknown { version, program } => {
                let mut s = vec![if *version == 0 { OP_0 } else { OP_1 + version - 1 }];
                s.push(program.len() as u8);
                s.extend_from_slice(program);
                Self(s)
            }
        }
    }

    /// `(version, program)` if this is a segwit output script.
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        let b = &self.0;
        if b.len() < 4 || b.len() > 42 {
            return None;
        }
        let version = match b[0] {
            OP_0 => 0,
            op @ OP_1..=OP_16 => op - OP_1 + 1,
            _ => return None,
        };
        if b[1] as usize + 2 != b.len() {
            return None;
        }
        Some((version, &b[2..]))
    }

    /// Classify against the standard templates.
    pub fn classify(&self) -> ScriptClass {
        let b = &self.0;

        if b.len() == 23 && b[0] == OP_HASH160 && b[1] == 20 && b[22] == OP_EQUAL {
            return ScriptClass::ScriptHash(hash160_at(b, 2));
        }

        if let Some((version, program)) = self.witness_program() {
            return match (version, program.len()) {
                (0, 20) => ScriptClass::WitnessKeyHash(hash160_at(program, 0)),
                (0, 32) => {
                    let mut h = [0u8; 32];
                    h.copy_from_slice(program);
                    ScriptClass::WitnessScriptHash(h)
                }
                (0, _) => ScriptClass::NonStandard,
                (v, _) => ScriptClass::WitnessUnknown {
                    version: v,
                    program: program.to_vec(),
                },
            };
        }

        if !b.is_empty() && b[0] == OP_RETURN && self.is_push_only_from(1) {
            return ScriptClass::NullData;
        }

        if b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == 20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
        {
            return ScriptClass::PubKeyHash(hash160_at(b, 3));
        }

        if let Some(class) = self.match_pubkey() {
            return class;
        }
        if let Some(class) = self.match_multisig() {
            return class;
        }
        ScriptClass::NonStandard
    }

    fn match_pubkey(&self) -> Option<ScriptClass> {
        let b = &self.0;
        for len in [33usize, 65] {
            if b.len() == len + 2
                && b[0] as usize == len
                && b[len + 1] == OP_CHECKSIG
                && pubkey_size_ok(&b[1..=len])
            {
                return Some(ScriptClass::PubKey(b[1..=len].to_vec()));
            }
        }
        None
    }

    fn match_multisig(&self) -> Option<ScriptClass> {
        let ops: Vec<Instruction<'_>> = self.instructions().collect::<Option<_>>()?;
        if ops.len() < 4 || ops[ops.len() - 1].opcode != OP_CHECKMULTISIG {
            return None;
        }
        let required = small_int(ops[0].opcode)?;
        let total = small_int(ops[ops.len() - 2].opcode)?;
        let keys = &ops[1..ops.len() - 2];
        if keys.len() != total as usize || required == 0 || required > total {
            return None;
        }
        if !keys.iter().all(|k| k.opcode < OP_PUSHDATA1 && pubkey_size_ok(k.data)) {
            return None;
        }
        Some(ScriptClass::MultiSig {
            required,
            keys: keys.iter().map(|k| k.data.to_vec()).collect(),
        })
    }
}

fn hash160_at(b: &[u8], at: usize) -> Hash160 {
    let mut h = [0u8; 20];
    h.copy_from_slice(&b[at..at + 20]);
    Hash160(h)
}

fn small_int(op: u8) -> Option<u8> {
    match op {
        OP_1..=OP_16 => Some(op - OP_1 + 1),
        _ => None,
    }
}

/// Size/prefix check for a serialized public key. Curve membership is
/// checked separately by the crypto crate.
pub fn pubkey_size_ok(key: &[u8]) -> bool {
    match key.first() {
        Some(2) | Some(3) => key.len() == 33,
        Some(4) | Some(6) | Some(7) => key.len() == 65,
        _ => false,
    }
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

pub struct Instructions<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Instructions<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Option<Instruction<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let b = self.bytes;
        let opcode = b[self.pos];
        self.pos += 1;

        if opcode > OP_PUSHDATA4 {
            return Some(Some(Instruction { opcode, data: &[] }));
        }

        let len = match opcode {
            OP_PUSHDATA1 => self.read_len(1),
            OP_PUSHDATA2 => self.read_len(2),
            OP_PUSHDATA4 => self.read_len(4),
            n => Some(n as usize),
        };
        let item = len.and_then(|len| {
            let end = self.pos.checked_add(len)?;
            if end > b.len() {
                return None;
            }
            let data = &b[self.pos..end];
            self.pos = end;
            Some(Instruction { opcode, data })
        });
        if item.is_none() {
            // Stop after a malformed push.
            self.pos = b.len();
        }
        Some(item)
    }
}

impl<'a> Instructions<'a> {
    fn read_len(&mut self, width: usize) -> Option<usize> {
        let end = self.pos + width;
        if end > self.bytes.len() {
            return None;
        }
        let mut buf = [0u8; 4];
        buf[..width].copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Some(u32::from_le_bytes(buf) as usize)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ScriptBuilder(Vec<u8>);

impl ScriptBuilder {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_opcode(&mut self, op: u8) -> &mut Self {
        self.0.push(op);
        self
    }

    /// Push data with the shortest push opcode for its length.
    pub fn push_slice(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.0.push(len as u8);
        } else if len <= 0xff {
            self.0.push(OP_PUSHDATA1);
            self.0.push(len as u8);
        } else if len <= 0xffff {
            self.0.push(OP_PUSHDATA2);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(OP_PUSHDATA4);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
        self
    }

    /// Push an integer as script-number bytes (always a data push, so zero
    /// becomes an empty push).
    pub fn push_num(&mut self, n: i64) -> &mut Self {
        let bytes = encode_script_num(n);
        self.push_slice(&bytes)
    }

    pub fn into_script(self) -> Script {
        Script(self.0)
    }
}

// ── Script numbers ────────────────────────────────────────────────────────────

/// Minimal little-endian sign-magnitude encoding.
pub fn encode_script_num(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }
    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut out = Vec::new();
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Decode without the minimal-encoding rule. Callers bound the length.
pub fn decode_script_num(bytes: &[u8]) -> i64 {
    if bytes.is_empty() {
        return 0;
    }
    let mut result: i64 = 0;
    for (i, b) in bytes.iter().enumerate() {
        result |= (*b as i64) << (8 * i);
    }
    let last = bytes.len() - 1;
    if bytes[last] & 0x80 != 0 {
        -(result & !(0x80i64 << (8 * last)))
    } else {
        result
    }
}

// ── Classification / destinations ─────────────────────────────────────────────

/// Standard output templates. Each variant carries its solutions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptClass {
    NonStandard,
    PubKey(Vec<u8>),
    PubKeyHash(Hash160),
    ScriptHash(Hash160),
    MultiSig { required: u8, keys: Vec<Vec<u8>> },
    NullData,
    WitnessKeyHash(Hash160),
    WitnessScriptHash([u8; 32]),
    WitnessUnknown { version: u8, program: Vec<u8> },
}

impl ScriptClass {
    /// Number of solutions the template yields, `None` if it does not solve.
    pub fn solution_count(&self) -> Option<usize> {
        match self {
            ScriptClass::NonStandard => None,
            ScriptClass::NullData => Some(0),
            ScriptClass::PubKey(_)
            | ScriptClass::PubKeyHash(_)
            | ScriptClass::ScriptHash(_)
            | ScriptClass::WitnessKeyHash(_)
            | ScriptClass::WitnessScriptHash(_) => Some(1),
            ScriptClass::WitnessUnknown { .. } => Some(2),
            ScriptClass::MultiSig { keys, .. } => Some(keys.len() + 2),
        }
    }
}

/// The recipient identity of an output script.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    KeyHash(Hash160),
    ScriptHash(Hash160),
    WitnessKeyHash(Hash160),
    WitnessScriptHash([u8; 32]),
    WitnessUnknown { version: u8, program: Vec<u8> },
}

impl Destination {
    /// Destination of a standard script. Pay-to-pubkey resolves to the key
    /// hash, which needs a hasher from the caller since this crate has none.
    pub fn from_script<F>(script: &Script, key_id: F) -> Option<Self>
    where
        F: Fn(&[u8]) -> Hash160,
    {
        match script.classify() {
            ScriptClass::PubKey(pk) => Some(Destination::KeyHash(key_id(&pk))),
            ScriptClass::PubKeyHash(h) => Some(Destination::KeyHash(h)),
            ScriptClass::ScriptHash(h) => Some(Destination::ScriptHash(h)),
            ScriptClass::WitnessKeyHash(h) => Some(Destination::WitnessKeyHash(h)),
            ScriptClass::WitnessScriptHash(h) => Some(Destination::WitnessScriptHash(h)),
            ScriptClass::WitnessUnknown { version, program } => {
                Some(Destination::WitnessUnknown { version, program })
            }
            ScriptClass::MultiSig { .. } | ScriptClass::NullData | ScriptClass::NonStandard => {
                None
            }
        }
    }

    /// Address string. Key-hash and script-hash destinations are base58check
    /// with the network prefixes; witness destinations are segwit addresses
    /// under `hrp` (bech32 for v0, bech32m above). `None` when no address
    /// format covers the program.
    pub fn to_address(&self, pubkey_prefix: u8, script_prefix: u8, hrp: &str) -> Option<String> {
        let (version, program) = match self {
            Destination::KeyHash(h) => return Some(base58check(pubkey_prefix, h)),
            Destination::ScriptHash(h) => return Some(base58check(script_prefix, h)),
            Destination::WitnessKeyHash(h) => (0, &h.as_bytes()[..]),
            Destination::WitnessScriptHash(h) => (0, &h[..]),
            Destination::WitnessUnknown { version, program } => (*version, program.as_slice()),
        };
        let hrp = Hrp::parse(hrp).ok()?;
        let version = Fe32::try_from(version).ok()?;
        bech32::segwit::encode(hrp, version, program).ok()
    }
}

fn base58check(prefix: u8, hash: &Hash160) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(prefix);
    payload.extend_from_slice(hash.as_bytes());
    bs58::encode(payload).with_check().into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_key_id(pk: &[u8]) -> Hash160 {
        let mut h = [0u8; 20];
        h.copy_from_slice(&pk[..20]);
        Hash160(h)
    }

    #[test]
    fn classifies_standard_templates() {
        let h = Hash160([0x11; 20]);
        assert_eq!(Script::new_p2pkh(&h).classify(), ScriptClass::PubKeyHash(h));
        assert_eq!(Script::new_p2sh(&h).classify(), ScriptClass::ScriptHash(h));
        assert_eq!(Script::new_p2wpkh(&h).classify(), ScriptClass::WitnessKeyHash(h));

        let mut pk = vec![0x02];
        pk.extend_from_slice(&[0x33; 32]);
        assert_eq!(Script::new_p2pk(&pk).classify(), ScriptClass::PubKey(pk));
    }

    #[test]
    fn null_data_requires_push_only() {
        let mut b = ScriptBuilder::new();
        b.push_opcode(OP_RETURN).push_slice(b"hello");
        let s = b.into_script();
        assert_eq!(s.classify(), ScriptClass::NullData);
        assert_eq!(s.classify().solution_count(), Some(0));

        let s = Script::from_bytes(vec![OP_RETURN, OP_CHECKSIG]);
        assert_eq!(s.classify(), ScriptClass::NonStandard);
    }

    #[test]
    fn multisig_has_many_solutions() {
        let mut pk1 = vec![0x02];
        pk1.extend_from_slice(&[1; 32]);
        let mut pk2 = vec![0x03];
        pk2.extend_from_slice(&[2; 32]);
        let mut b = ScriptBuilder::new();
        b.push_opcode(OP_1)
            .push_slice(&pk1)
            .push_slice(&pk2)
            .push_opcode(OP_1 + 1)
            .push_opcode(OP_CHECKMULTISIG);
        let class = b.into_script().classify();
        assert!(matches!(class, ScriptClass::MultiSig { required: 1, .. }));
        assert_eq!(class.solution_count(), Some(4));
    }

    #[test]
    fn destination_extraction() {
        let h = Hash160([0x22; 20]);
        assert_eq!(
            Destination::from_script(&Script::new_p2pkh(&h), fake_key_id),
            Some(Destination::KeyHash(h))
        );
        assert_eq!(
            Destination::from_script(&Script::from_bytes(vec![OP_RETURN]), fake_key_id),
            None
        );
        for d in [
            Destination::KeyHash(h),
            Destination::ScriptHash(h),
            Destination::WitnessKeyHash(h),
        ] {
            let script = Script::for_destination(&d);
            assert_eq!(Destination::from_script(&script, fake_key_id), Some(d));
        }
    }

    #[test]
    fn tokenizer_reads_pushdata_forms() {
        let data = vec![0xaa; 300];
        let mut b = ScriptBuilder::new();
        b.push_slice(&[1, 2]).push_slice(&data).push_opcode(OP_CHECKSIG);
        let s = b.into_script();
        let ops: Vec<_> = s.instructions().collect::<Option<Vec<_>>>().unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].data, &[1, 2]);
        assert_eq!(ops[1].opcode, OP_PUSHDATA2);
        assert_eq!(ops[1].data.len(), 300);
        assert!(ops[2].data.is_empty());
    }

    #[test]
    fn tokenizer_flags_truncated_push() {
        let s = Script::from_bytes(vec![5, 1, 2]);
        let first = s.instructions().next().unwrap();
        assert!(first.is_none());
    }

    #[test]
    fn script_num_encoding() {
        assert!(encode_script_num(0).is_empty());
        assert_eq!(encode_script_num(1), vec![1]);
        assert_eq!(encode_script_num(128), vec![0x80, 0x00]);
        assert_eq!(encode_script_num(-1), vec![0x81]);
        for n in [0i64, 1, 2, 127, 128, 255, 256, 65_535, -5, 0x7fff_ffff] {
            assert_eq!(decode_script_num(&encode_script_num(n)), n);
        }
    }

    #[test]
    fn base58_address_for_key_hashes() {
        let h = Hash160([0; 20]);
        assert_eq!(
            Destination::KeyHash(h).to_address(0, 5, "bc").unwrap(),
            "1111111111111111111114oLvT2"
        );
        assert_ne!(
            Destination::ScriptHash(h).to_address(0, 5, "bc"),
            Destination::KeyHash(h).to_address(0, 5, "bc")
        );
    }

    #[test]
    fn witness_key_hash_is_bech32() {
        let program = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let h = Hash160::from_slice(&program).unwrap();
        assert_eq!(
            Destination::WitnessKeyHash(h).to_address(0, 5, "bc").unwrap(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
    }

    #[test]
    fn witness_v1_is_bech32m() {
        let program = vec![0x42; 32];
        let dest = Destination::WitnessUnknown {
            version: 1,
            program: program.clone(),
        };
        let addr = dest.to_address(0, 5, "xpc").unwrap();
        assert!(addr.starts_with("xpc1p"));

        let (hrp, version, decoded) = bech32::segwit::decode(&addr).unwrap();
        assert_eq!(hrp.as_str(), "xpc");
        assert_eq!(version.to_u8(), 1);
        assert_eq!(decoded, program);
    }

    #[test]
    fn witness_script_hash_round_trips() {
        let dest = Destination::WitnessScriptHash([7; 32]);
        let addr = dest.to_address(0, 5, "txpc").unwrap();
        let (_, version, decoded) = bech32::segwit::decode(&addr).unwrap();
        assert_eq!(version.to_u8(), 0);
        assert_eq!(decoded, vec![7; 32]);
    }

    #[test]
    fn unencodable_witness_programs_have_no_address() {
        let too_short = Destination::WitnessUnknown {
            version: 2,
            program: vec![1],
        };
        assert_eq!(too_short.to_address(0, 5, "xpc"), None);
        let bad_hrp = Destination::WitnessKeyHash(Hash160([1; 20]));
        assert_eq!(bad_hrp.to_address(0, 5, ""), None);
    }
}
