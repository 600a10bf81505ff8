use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::encoding::{canonicalize, encode_value, sha256_hex, CanonicalEncode};
use super::merkle::merkle_root;
use super::transaction::{unix_now, Transaction};

/// `previous_hash` carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// List of transactions included in this block
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Creation time in UNIX seconds
    pub timestamp: f64,

    /// Proof of work nonce
    pub nonce: u64,

    /// Merkle root of `transactions`, absent for an empty block
    pub merkle_root: Option<String>,

    /// Hash of the block header
    pub hash: String,
}

impl Block {
    /// Creates a new unsealed block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The transactions to include in the block
    /// * `previous_hash` - The hash of the previous block
    ///
    /// # Returns
    ///
    /// A block with nonce 0 whose hash matches its contents
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        Self::with_timestamp(index, transactions, previous_hash, unix_now())
    }

    /// Creates a new block with an explicit timestamp
    pub fn with_timestamp(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: String,
        timestamp: f64,
    ) -> Self {
        let merkle_root = merkle_root(&transactions);

        let mut block = Block {
            index,
            transactions,
            previous_hash,
            timestamp,
            nonce: 0,
            merkle_root,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Creates the genesis block funded by `allocations`
    ///
    /// The genesis block is never mined.
    pub fn genesis(allocations: Vec<Transaction>) -> Self {
        Self::new(0, allocations, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the canonical header as a hexadecimal string
    pub fn calculate_hash(&self) -> String {
        self.canonical_hash()
    }

    /// Canonicalized header, ready for repeated hashing with a changing nonce
    pub(crate) fn header_template(&self) -> Value {
        canonicalize(self.canonical_value())
    }

    /// Hashes a header template produced by [`Block::header_template`]
    pub(crate) fn hash_header(header: &Value) -> String {
        sha256_hex(&encode_value(header))
    }

    /// Checks if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

impl CanonicalEncode for Block {
    fn canonical_value(&self) -> Value {
        let transactions: Vec<Value> = self
            .transactions
            .iter()
            .map(|tx| tx.canonical_value())
            .collect();

        json!({
            "index": self.index,
            "transactions": transactions,
            "previous_hash": self.previous_hash,
            "timestamp": self.timestamp,
            "nonce": self.nonce,
            "merkle_root": self.merkle_root,
        })
    }
}
