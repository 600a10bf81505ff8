use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::block::{Block, GENESIS_PREVIOUS_HASH};
use super::ledger::LedgerView;
use super::pow::{CancelFlag, MiningError, ProofOfWork};
use super::transaction::Transaction;
use super::validator::{validate_chain, ValidationFailure};

/// Reward paid to the miner of each block
pub const DEFAULT_MINING_REWARD: f64 = 10.0;

/// Miner credited when the caller names none
pub const DEFAULT_MINER: &str = "miner1";

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Insufficient balance: {balance} available, {required} required")]
    InsufficientFunds { balance: f64, required: f64 },

    #[error("Mining error: {0}")]
    MiningError(#[from] MiningError),
}

/// Accounts funded by the genesis block
pub fn default_genesis_allocations() -> Vec<Transaction> {
    vec![
        Transaction::network_mint("Alice", 1000.0),
        Transaction::network_mint("Bob", 1000.0),
        Transaction::network_mint("Charlie", 1000.0),
        Transaction::network_mint(DEFAULT_MINER, 500.0),
    ]
}

/// Read-only copy of the ledger
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChainSnapshot {
    /// Number of blocks in the chain
    pub length: usize,

    /// The blocks in chain order
    pub chain: Vec<Block>,

    /// Transactions waiting to be mined
    pub pending_transactions: Vec<Transaction>,

    /// Required leading hex zeros for mined blocks
    pub difficulty: usize,
}

#[derive(Debug)]
struct LedgerState {
    blocks: Vec<Block>,
    mempool: Vec<Transaction>,
}

/// Represents the blockchain
///
/// Blocks and mempool share one lock, so every reader sees either none or all
/// of a mined block and the mempool entries it consumed. Mining runs under a
/// separate mutex and holds the ledger lock only to snapshot and to commit.
#[derive(Debug)]
pub struct Blockchain {
    state: RwLock<LedgerState>,

    /// Serializes miners; only a miner removes mempool entries
    mining: Mutex<()>,

    cancel: CancelFlag,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: usize,

    mining_reward: f64,

    max_mining_attempts: Option<u64>,
}

impl Blockchain {
    /// Creates a new blockchain with the default genesis allocations
    pub fn new(difficulty: usize) -> Self {
        Self::with_genesis(difficulty, default_genesis_allocations())
    }

    /// Creates a new blockchain whose genesis block holds `allocations`
    pub fn with_genesis(difficulty: usize, allocations: Vec<Transaction>) -> Self {
        let genesis = Block::genesis(allocations);
        info!("Created genesis block {}", genesis.hash);

        Blockchain {
            state: RwLock::new(LedgerState {
                blocks: vec![genesis],
                mempool: Vec::new(),
            }),
            mining: Mutex::new(()),
            cancel: CancelFlag::new(),
            difficulty,
            mining_reward: DEFAULT_MINING_REWARD,
            max_mining_attempts: None,
        }
    }

    pub fn with_mining_reward(mut self, mining_reward: f64) -> Self {
        self.mining_reward = mining_reward;
        self
    }

    /// Bounds every nonce search to `max_attempts` hashes
    pub fn with_max_mining_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_mining_attempts = max_attempts;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }

    /// Adds a transaction to the mempool
    ///
    /// The transaction is never rejected; validation belongs to the caller.
    pub fn add_transaction(&self, transaction: Transaction) -> bool {
        let mut state = self.state.write();
        debug!(
            "Queued transaction {} -> {} ({})",
            transaction.sender, transaction.recipient, transaction.amount
        );
        state.mempool.push(transaction);
        true
    }

    /// Adds a transaction after checking the sender can cover it
    ///
    /// Network mints skip the check. The balance is read and the transaction
    /// queued under the same lock, so concurrent submissions cannot overspend.
    ///
    /// # Returns
    ///
    /// The number of pending transactions after queuing
    pub fn submit_transaction(&self, transaction: Transaction) -> Result<usize, BlockchainError> {
        let mut state = self.state.write();

        if !transaction.is_network_mint() {
            let balance = LedgerView::new(&state.blocks, &state.mempool).balance(&transaction.sender);
            if balance < transaction.amount {
                return Err(BlockchainError::InsufficientFunds {
                    balance,
                    required: transaction.amount,
                });
            }
        }

        debug!(
            "Accepted transaction {} -> {} ({})",
            transaction.sender, transaction.recipient, transaction.amount
        );
        state.mempool.push(transaction);
        Ok(state.mempool.len())
    }

    /// Mines a new block with the pending transactions
    ///
    /// # Arguments
    ///
    /// * `miner_address` - The address credited with the mining reward
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the mempool is empty, otherwise the sealed block that
    /// was appended. Transactions submitted while the nonce search runs stay
    /// pending for the next block. A cancelled or exhausted search leaves the
    /// chain and mempool untouched.
    pub fn mine_block(&self, miner_address: &str) -> Result<Option<Block>, BlockchainError> {
        let _miner = self.mining.lock();
        self.cancel.reset();

        let (candidate, consumed) = {
            let state = self.state.read();
            if state.mempool.is_empty() {
                return Ok(None);
            }

            let consumed = state.mempool.len();
            let mut transactions = state.mempool.clone();
            transactions.push(Transaction::network_mint(miner_address, self.mining_reward));

            let previous_hash = state
                .blocks
                .last()
                .map(|block| block.hash.clone())
                .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

            (
                Block::new(state.blocks.len() as u64, transactions, previous_hash),
                consumed,
            )
        };

        let pow = ProofOfWork::new(self.difficulty).with_max_attempts(self.max_mining_attempts);
        let block = pow.seal(candidate, &self.cancel).map_err(|err| {
            warn!("Mining block aborted: {}", err);
            err
        })?;

        let mut state = self.state.write();
        state.mempool.drain(..consumed);
        state.blocks.push(block.clone());

        info!("Block #{} mined: {}", block.index, block.hash);
        Ok(Some(block))
    }

    /// Stops the nonce search in progress, if any
    pub fn cancel_mining(&self) {
        info!("Cancelling mining");
        self.cancel.cancel();
    }

    /// Gets a read-only snapshot of the chain and mempool
    pub fn get_chain(&self) -> ChainSnapshot {
        let state = self.state.read();
        ChainSnapshot {
            length: state.blocks.len(),
            chain: state.blocks.clone(),
            pending_transactions: state.mempool.clone(),
            difficulty: self.difficulty,
        }
    }

    /// Gets the last block in the chain
    pub fn get_last_block(&self) -> Option<Block> {
        self.state.read().blocks.last().cloned()
    }

    /// Gets all pending transactions
    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        self.state.read().mempool.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.state.read().mempool.len()
    }

    /// Validates the blockchain, reporting the first failing block
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        let state = self.state.read();
        validate_chain(&state.blocks, self.difficulty).map_err(|failure| {
            warn!("{}", failure);
            failure
        })
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Balance of `address` over confirmed blocks and pending debits
    pub fn get_balance(&self, address: &str) -> f64 {
        let state = self.state.read();
        LedgerView::new(&state.blocks, &state.mempool).balance(address)
    }
}
