//! Cryptographic primitives for Emberchain
//!
//! Thin wrapper over SHA-256 hashing and secp256k1 ECDSA. The ledger core
//! consumes these as an external capability: it hashes content, signs
//! transaction ids and verifies detached signatures, nothing more.

use crate::error::LedgerError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized secp256k1 context shared by all
/// signing and verification calls.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// A ledger address: 32-byte SHA-256 digest of a compressed public key,
/// or of a human-readable label for protocol and demo addresses.
pub type Address = [u8; 32];

/// All-zero address. Never a real participant; admission rejects it and
/// the fraud screen flags any pool entry carrying it.
pub const UNSET_ADDRESS: Address = [0u8; 32];

/// Compressed secp256k1 public key bytes, as kept in the key registry.
pub type PublicKeyBytes = [u8; PUBLIC_KEY_SIZE];

/// Compact ECDSA signature bytes.
pub type SignatureBytes = [u8; COMPACT_SIGNATURE_SIZE];

/// Derive an address from a label by hashing it. Protocol addresses
/// (the tax pool) and demo wallets are named this way.
pub fn address_from_label(label: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.finalize().into()
}

/// Render an address as lowercase hex for display and logging.
pub fn address_to_hex(addr: &Address) -> String {
    hex::encode(addr)
}

/// Parse an address from its hex rendering.
pub fn address_from_hex(hex_str: &str) -> Result<Address, LedgerError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| LedgerError::CryptoError(format!("invalid hex address: {}", e)))?;
    if bytes.len() != 32 {
        return Err(LedgerError::CryptoError(format!(
            "address must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes
        .try_into()
        .map_err(|_| LedgerError::CryptoError("failed to convert bytes into address".to_string()))
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random key pair from the OS random number generator.
    pub fn generate() -> Result<Self, LedgerError> {
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);

        Ok(KeyPair {
            secret_key,
            public_key,
        })
    }

    /// Creates a key pair from an existing secret key.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a key pair from raw secret key bytes. Handy for
    /// deterministic test fixtures.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                LedgerError::CryptoError(format!(
                    "secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                LedgerError::CryptoError(format!("invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    /// The ledger address of this key pair: SHA-256 of the compressed
    /// public key.
    pub fn address(&self) -> Address {
        let pubkey_bytes: PublicKeyBytes = self.public_key.serialize();
        Sha256::digest(pubkey_bytes).into()
    }

    /// Compressed public key bytes, in the form the key registry stores.
    pub fn public_key_bytes(&self) -> PublicKeyBytes {
        self.public_key.serialize()
    }

    /// Signs a message (hashed with SHA-256 first) and returns the
    /// compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<SignatureBytes, LedgerError> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Verifies an ECDSA signature given the raw compressed public key bytes,
/// the message, and the compact signature bytes.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), LedgerError> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(LedgerError::CryptoError(format!(
            "public key must be exactly {} bytes (compressed), got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(LedgerError::CryptoError(format!(
            "signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| LedgerError::CryptoError(format!("invalid public key: {}", e)))?;

    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)?;
    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| LedgerError::CryptoError(format!("invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| LedgerError::CryptoError("signature verification failed".to_string()))
}
