use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const SCRIPT_HASH_LENGTH: usize = 20;
pub const PUBLIC_KEY_LENGTH: usize = 33;

// --- NewTypes ---

/// 20-byte routable account identifier derived from an address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScriptHash(pub [u8; SCRIPT_HASH_LENGTH]);

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for ScriptHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for ScriptHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != SCRIPT_HASH_LENGTH {
            return Err(serde::de::Error::custom("Invalid script hash length"));
        }
        let mut arr = [0u8; SCRIPT_HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(ScriptHash(arr))
    }
}

/// Compressed SEC1 public key bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKeyBytes(pub [u8; PUBLIC_KEY_LENGTH]);

impl Default for PublicKeyBytes {
    fn default() -> Self {
        Self([0u8; PUBLIC_KEY_LENGTH])
    }
}

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyBytes({})", hex::encode(self.0))
    }
}

impl Serialize for PublicKeyBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(serde::de::Error::custom("Invalid public key length"));
        }
        let mut arr = [0u8; PUBLIC_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(PublicKeyBytes(arr))
    }
}

/// Opaque transaction acknowledgement returned by the node on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
