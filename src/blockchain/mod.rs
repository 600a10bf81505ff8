// Blockchain module
//
// This module contains the ledger engine:
// - Canonical encoding and hashing
// - Merkle roots
// - Proof of work
// - Block and transaction structures
// - Chain validation
// - Balance computation
// - Transaction signatures

pub mod block;
pub mod chain;
pub mod crypto;
pub mod encoding;
pub mod ledger;
pub mod merkle;
pub mod pow;
pub mod transaction;
pub mod validator;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError, ChainSnapshot, DEFAULT_MINER};
pub use crypto::{DigitalSignature, KeyPair, Verification};
pub use pow::{CancelFlag, MiningError, ProofOfWork};
pub use transaction::{Transaction, TransactionError};
pub use validator::{ValidationCheck, ValidationFailure};
