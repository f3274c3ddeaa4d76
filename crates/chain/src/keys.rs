//! P-256 signing keys for the faucet's funding account.

use crate::error::ChainError;
use crate::types::{PublicKeyBytes, ScriptHash, PUBLIC_KEY_LENGTH};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;

/// ECDSA keypair over the P-256 curve.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS entropy source.
    pub fn random() -> Self {
        KeyPair {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Load a keypair from a hex-encoded 32-byte scalar. A leading `0x` is
    /// accepted and stripped.
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, ChainError> {
        let trimmed = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(trimmed)
            .map_err(|e| ChainError::InvalidKey(format!("not valid hex: {}", e)))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| ChainError::InvalidKey(format!("not a valid P-256 scalar: {}", e)))?;
        Ok(KeyPair { signing_key })
    }

    /// Hex encoding of the private scalar.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Compressed SEC1 public key, 33 bytes.
    pub fn public_key(&self) -> PublicKeyBytes {
        let point = self.signing_key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(point.as_bytes());
        PublicKeyBytes(bytes)
    }

    /// Script hash of the single-signature verification script for this key.
    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash::from_public_key(&self.public_key().0)
    }

    /// Rendered address of this key's script hash.
    pub fn address(&self) -> String {
        self.script_hash().to_address()
    }

    /// Sign a message, returning the 64-byte `r || s` encoding.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        signature.to_vec()
    }
}

/// Verify a 64-byte `r || s` signature against a compressed public key.
///
/// Malformed keys or signatures are errors; a well-formed signature that does
/// not match returns `Ok(false)`.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, ChainError> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| ChainError::InvalidKey(format!("not a valid public key: {}", e)))?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| ChainError::InvalidSignature(format!("malformed signature: {}", e)))?;
    Ok(verifying_key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let keypair = KeyPair::random();
        let message = b"grant 1000 units";

        let signature = keypair.sign(message);
        assert_eq!(signature.len(), 64);
        assert!(verify(&keypair.public_key().0, message, &signature).unwrap());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let keypair = KeyPair::random();
        let signature = keypair.sign(b"grant 1000 units");

        assert!(!verify(&keypair.public_key().0, b"grant 9000 units", &signature).unwrap());
    }

    #[test]
    fn foreign_key_fails_verification() {
        let signer = KeyPair::random();
        let other = KeyPair::random();
        let signature = signer.sign(b"payload");

        assert!(!verify(&other.public_key().0, b"payload", &signature).unwrap());
    }

    #[test]
    fn private_key_hex_round_trip() {
        let keypair = KeyPair::random();
        let restored = KeyPair::from_private_key_hex(&keypair.private_key_hex()).unwrap();

        assert_eq!(keypair.public_key(), restored.public_key());
        assert_eq!(keypair.address(), restored.address());
    }

    #[test]
    fn accepts_0x_prefixed_private_key() {
        let keypair = KeyPair::random();
        let prefixed = format!("0x{}", keypair.private_key_hex());
        let restored = KeyPair::from_private_key_hex(&prefixed).unwrap();

        assert_eq!(keypair.public_key(), restored.public_key());
    }

    #[test]
    fn rejects_garbage_private_key() {
        assert!(KeyPair::from_private_key_hex("zz not hex").is_err());
        assert!(KeyPair::from_private_key_hex("abcd").is_err());
    }

    #[test]
    fn public_key_is_compressed_sec1() {
        let keypair = KeyPair::random();
        let key = keypair.public_key();

        assert_eq!(key.0.len(), PUBLIC_KEY_LENGTH);
        assert!(key.0[0] == 0x02 || key.0[0] == 0x03);
    }
}
