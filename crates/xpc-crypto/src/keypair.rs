use k256::ecdsa::SigningKey;
use xpc_core::types::{Hash160, Hash256};
use zeroize::Zeroizing;

use crate::ecdsa::{sign_digest, CryptoError, PublicKey};

/// A staking keypair: secp256k1 signing key plus its compressed public key.
///
/// `SigningKey` wipes itself on drop; exported secret bytes are wrapped in
/// `Zeroizing` for the same reason.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self::from_signing_key(signing_key)
    }

    /// Restore a keypair from 32 secret bytes (e.g. loaded from a key file).
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let point = signing_key.verifying_key().to_encoded_point(true);
        let public_key = PublicKey::from_slice(point.as_bytes())
            .expect("encoded point of a valid signing key is a valid public key");
        Self {
            signing_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The same key in 65-byte uncompressed form. Hashes to a different key id.
    pub fn public_key_uncompressed(&self) -> PublicKey {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        PublicKey::from_slice(point.as_bytes())
            .expect("encoded point of a valid signing key is a valid public key")
    }

    pub fn key_id(&self) -> Hash160 {
        self.public_key.key_id()
    }

    /// Sign a 32-byte digest (low-S DER).
    pub fn sign_digest(&self, digest: &Hash256) -> Result<Vec<u8>, CryptoError> {
        sign_digest(&self.signing_key, digest)
    }

    pub fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.signing_key.to_bytes().to_vec())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ key_id: {} }}", self.key_id())
    }
}
