//! Proof-of-work nonce search.
//!
//! The search is sequential from nonce 0, so the nonce it returns is the
//! smallest one meeting the target. It stops early when its [`CancelFlag`] is
//! tripped or when the optional attempt limit is reached. With no limit and a
//! target the hash space cannot realistically meet (e.g. a difficulty near 64)
//! the search does not terminate; that liveness risk is left to the caller,
//! who can cancel or bound it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use serde_json::json;
use thiserror::Error;

use super::block::Block;

/// Reasons a nonce search ends without a sealed block
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("Mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("No valid nonce found within {attempts} attempts")]
    AttemptsExhausted { attempts: u64 },
}

/// Shared cancellation switch for a running nonce search
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the search holding this flag to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Re-arms the flag for the next search
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Checks that `hash` starts with `difficulty` hexadecimal zeros
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Nonce search against a leading-zero target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    max_attempts: Option<u64>,
}

impl ProofOfWork {
    /// Creates an unbounded search for `difficulty` leading zeros
    pub fn new(difficulty: usize) -> Self {
        ProofOfWork {
            difficulty,
            max_attempts: None,
        }
    }

    /// Stops the search after `max_attempts` hashes when set
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Seals `block` by searching nonces from 0 upwards
    ///
    /// # Arguments
    ///
    /// * `block` - The block to seal; its current nonce is ignored
    /// * `cancel` - Checked before every attempt
    ///
    /// # Returns
    ///
    /// The block with the first nonce whose hash meets the target
    pub fn seal(&self, mut block: Block, cancel: &CancelFlag) -> Result<Block, MiningError> {
        let mut header = block.header_template();
        let mut nonce: u64 = 0;
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(MiningError::Cancelled { attempts });
            }
            if self.max_attempts.map_or(false, |max| attempts >= max) {
                return Err(MiningError::AttemptsExhausted { attempts });
            }

            header["nonce"] = json!(nonce);
            let hash = Block::hash_header(&header);
            attempts += 1;

            if meets_difficulty(&hash, self.difficulty) {
                debug!(
                    "Sealed block {} with nonce {} after {} attempts",
                    block.index, nonce, attempts
                );
                block.nonce = nonce;
                block.hash = hash;
                return Ok(block);
            }

            nonce = match nonce.checked_add(1) {
                Some(next) => next,
                None => return Err(MiningError::AttemptsExhausted { attempts }),
            };
        }
    }
}
