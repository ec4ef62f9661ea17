pub mod ecdsa;
pub mod hash;
pub mod keypair;

pub use ecdsa::{is_fully_valid, CryptoError, PublicKey};
pub use hash::{hash160, sha256d, txid};
pub use keypair::KeyPair;
