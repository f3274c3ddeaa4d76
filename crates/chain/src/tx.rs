//! Transfer transaction construction and signing.

use crate::error::ChainError;
use crate::keys::{self, KeyPair};
use crate::types::{PublicKeyBytes, ScriptHash};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Type tag for a plain value transfer.
pub const TX_TYPE_TRANSFER: u8 = 0x01;

/// A value transfer before signing. Field order matches the wire layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTransaction {
    pub version: u16,
    pub tx_type: u8,
    pub sender: PublicKeyBytes,
    pub to: ScriptHash,
    pub amount: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub timestamp: i64,
}

impl TransferTransaction {
    /// Serialize the unsigned portion. All integers are big-endian; `data`
    /// is length-prefixed with a u32.
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(100 + self.data.len());
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.push(self.tx_type);
        buf.extend_from_slice(&self.sender.0);
        buf.extend_from_slice(&self.to.0);
        buf.extend_from_slice(&self.amount.to_be_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf.extend_from_slice(&self.gas_price.to_be_bytes());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf
    }

    /// SHA-256 digest the sender signs.
    pub fn signing_digest(&self) -> [u8; 32] {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(self.unsigned_bytes()));
        digest
    }
}

/// A transfer with its sender signature attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    tx: TransferTransaction,
    signature: Vec<u8>,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &TransferTransaction {
        &self.tx
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Full wire encoding: unsigned bytes, then the signature with a u16
    /// length prefix.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.tx.unsigned_bytes();
        buf.extend_from_slice(&(self.signature.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.signature);
        buf
    }

    /// Check the signature against the embedded sender key.
    pub fn verify(&self) -> Result<bool, ChainError> {
        keys::verify(&self.tx.sender.0, &self.tx.signing_digest(), &self.signature)
    }
}

/// Builds and signs transfers from a fixed funding key. Version and fee
/// fields are pinned at construction; only destination, amount, and nonce
/// vary per transfer.
pub struct TxBuilder {
    keypair: KeyPair,
    version: u16,
    gas_price: u64,
    gas_limit: u64,
}

impl TxBuilder {
    pub fn new(keypair: KeyPair, version: u16, gas_price: u64, gas_limit: u64) -> Self {
        TxBuilder {
            keypair,
            version,
            gas_price,
            gas_limit,
        }
    }

    pub fn sender_public_key(&self) -> PublicKeyBytes {
        self.keypair.public_key()
    }

    pub fn sender_script_hash(&self) -> ScriptHash {
        self.keypair.script_hash()
    }

    /// Build a signed transfer. The timestamp is stamped here, at build time.
    pub fn build(&self, to: ScriptHash, amount: u64, nonce: u64) -> SignedTransaction {
        let tx = TransferTransaction {
            version: self.version,
            tx_type: TX_TYPE_TRANSFER,
            sender: self.keypair.public_key(),
            to,
            amount,
            nonce,
            data: Vec::new(),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let signature = self.keypair.sign(&tx.signing_digest());
        SignedTransaction { tx, signature }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TxBuilder {
        TxBuilder::new(KeyPair::random(), 1, 3, 300_000)
    }

    #[test]
    fn built_transfer_verifies() {
        let b = builder();
        let signed = b.build(ScriptHash([0x11; 20]), 1000, 7);

        assert!(signed.verify().unwrap());
        assert_eq!(signed.transaction().amount, 1000);
        assert_eq!(signed.transaction().nonce, 7);
        assert_eq!(signed.transaction().tx_type, TX_TYPE_TRANSFER);
        assert_eq!(signed.transaction().sender, b.sender_public_key());
    }

    #[test]
    fn unsigned_layout_is_stable() {
        let b = builder();
        let signed = b.build(ScriptHash([0x22; 20]), 500, 42);
        let bytes = signed.transaction().unsigned_bytes();

        // version(2) type(1) sender(33) to(20) amount(8) nonce(8)
        // data_len(4) gas_price(8) gas_limit(8) timestamp(8)
        assert_eq!(bytes.len(), 100);
        assert_eq!(&bytes[0..2], &1u16.to_be_bytes());
        assert_eq!(bytes[2], TX_TYPE_TRANSFER);
        assert_eq!(&bytes[3..36], &signed.transaction().sender.0);
        assert_eq!(&bytes[36..56], &[0x22; 20]);
        assert_eq!(&bytes[56..64], &500u64.to_be_bytes());
        assert_eq!(&bytes[64..72], &42u64.to_be_bytes());
    }

    #[test]
    fn wire_encoding_appends_signature() {
        let signed = builder().build(ScriptHash([0x33; 20]), 1, 0);
        let wire = signed.to_bytes();
        let unsigned = signed.transaction().unsigned_bytes();

        assert_eq!(wire.len(), unsigned.len() + 2 + signed.signature().len());
        assert_eq!(&wire[..unsigned.len()], &unsigned[..]);
        assert_eq!(
            &wire[unsigned.len()..unsigned.len() + 2],
            &(signed.signature().len() as u16).to_be_bytes()
        );
    }

    #[test]
    fn tampered_amount_breaks_verification() {
        let b = builder();
        let signed = b.build(ScriptHash([0x44; 20]), 1000, 3);

        let mut tampered_tx = signed.transaction().clone();
        tampered_tx.amount = 9000;
        let tampered = SignedTransaction {
            tx: tampered_tx,
            signature: signed.signature().to_vec(),
        };

        assert!(!tampered.verify().unwrap());
    }

    #[test]
    fn digest_depends_on_nonce() {
        let b = builder();
        let a = b.build(ScriptHash([0x55; 20]), 10, 1);
        let c = b.build(ScriptHash([0x55; 20]), 10, 2);

        assert_ne!(
            a.transaction().signing_digest(),
            c.transaction().signing_digest()
        );
    }
}
