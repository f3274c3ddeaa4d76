//! Address parsing, checksum validation, and script-hash derivation.

use crate::error::ChainError;
use crate::types::{ScriptHash, SCRIPT_HASH_LENGTH};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Every rendered address starts with this prefix.
pub const ADDRESS_PREFIX: &str = "AP";

/// Fixed length of a rendered address.
pub const ADDRESS_LENGTH: usize = 35;

/// Version bytes prepended to the script hash before checksumming. These pin
/// the first two base58 characters to the `AP` prefix.
const ADDRESS_VERSION: [u8; 2] = [0x05, 0x48];

/// Validate a claimed address string and derive its script hash.
///
/// The prefix and length gates run before any checksum work. A bad checksum,
/// malformed body, or foreign version byte all fail the same way; the reason
/// string is safe to show to the user.
pub fn validate_address(raw: &str) -> Result<ScriptHash, ChainError> {
    if !raw.starts_with(ADDRESS_PREFIX) {
        return Err(ChainError::InvalidAddress(format!(
            "must start with {}",
            ADDRESS_PREFIX
        )));
    }
    if raw.len() != ADDRESS_LENGTH {
        return Err(ChainError::InvalidAddress(format!(
            "expected {} characters, got {}",
            ADDRESS_LENGTH,
            raw.len()
        )));
    }

    let payload = bs58::decode(raw)
        .with_check(None)
        .into_vec()
        .map_err(|e| ChainError::InvalidAddress(format!("checksum decode failed: {}", e)))?;

    if payload.len() != ADDRESS_VERSION.len() + SCRIPT_HASH_LENGTH {
        return Err(ChainError::InvalidAddress(format!(
            "decoded payload is {} bytes",
            payload.len()
        )));
    }
    if payload[..ADDRESS_VERSION.len()] != ADDRESS_VERSION {
        return Err(ChainError::InvalidAddress(
            "wrong network version".to_string(),
        ));
    }

    let mut hash = [0u8; SCRIPT_HASH_LENGTH];
    hash.copy_from_slice(&payload[ADDRESS_VERSION.len()..]);
    Ok(ScriptHash(hash))
}

impl ScriptHash {
    /// Render the base58check address for this script hash.
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(ADDRESS_VERSION.len() + SCRIPT_HASH_LENGTH);
        payload.extend_from_slice(&ADDRESS_VERSION);
        payload.extend_from_slice(&self.0);
        bs58::encode(payload).with_check().into_string()
    }

    /// Hash160 of the single-signature verification script for a compressed
    /// public key: `PUSH33 <key> CHECKSIG`.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let mut script = Vec::with_capacity(public_key.len() + 2);
        script.push(0x21);
        script.extend_from_slice(public_key);
        script.push(0xac);

        let sha = Sha256::digest(&script);
        let rip = Ripemd160::digest(sha);

        let mut hash = [0u8; SCRIPT_HASH_LENGTH];
        hash.copy_from_slice(&rip);
        ScriptHash(hash)
    }
}
