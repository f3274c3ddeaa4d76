//! Chain-facing primitives for the Apex faucet.
//!
//! Everything the dispenser needs to talk to the network lives here:
//! - address parsing, checksum validation, and script-hash derivation
//! - sender key handling and ECDSA signing
//! - transfer transaction assembly and wire encoding
//! - the JSON-RPC client for the remote ledger node

pub mod address;
pub mod client;
pub mod error;
pub mod keys;
pub mod tx;
pub mod types;

pub use address::{validate_address, ADDRESS_LENGTH, ADDRESS_PREFIX};
pub use client::{AccountState, HttpNodeClient, LedgerNode};
pub use error::ChainError;
pub use keys::KeyPair;
pub use tx::{SignedTransaction, TransferTransaction, TxBuilder};
pub use types::{PublicKeyBytes, ScriptHash, TxId, PUBLIC_KEY_LENGTH, SCRIPT_HASH_LENGTH};
