use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use super::block::Block;
use super::pow::meets_difficulty;

/// The check a block failed during chain validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCheck {
    /// Stored hash differs from the recomputed header hash
    Hash,
    /// `previous_hash` differs from the preceding block's hash
    Linkage,
    /// Hash lacks the required leading zeros
    ProofOfWork,
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationCheck::Hash => "hash incorrect",
            ValidationCheck::Linkage => "previous_hash incorrect",
            ValidationCheck::ProofOfWork => "proof of work incorrect",
        };
        f.write_str(text)
    }
}

/// First failure found while walking the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationFailure {
    /// Index of the failing block
    pub index: usize,

    /// Which check failed
    pub check: ValidationCheck,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {} invalid: {}", self.index, self.check)
    }
}

/// Validates `blocks` from index 1 onwards
///
/// For each block, in order: content hash, linkage to the previous block,
/// then proof of work. The genesis block is not checked on its own.
///
/// # Returns
///
/// `Ok(())` for a valid chain, otherwise the first failing block and check
pub fn validate_chain(blocks: &[Block], difficulty: usize) -> Result<(), ValidationFailure> {
    for (index, pair) in blocks.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = index + 1;

        if current.hash != current.calculate_hash() {
            return Err(ValidationFailure {
                index,
                check: ValidationCheck::Hash,
            });
        }

        if current.previous_hash != previous.hash {
            return Err(ValidationFailure {
                index,
                check: ValidationCheck::Linkage,
            });
        }

        if !meets_difficulty(&current.hash, difficulty) {
            return Err(ValidationFailure {
                index,
                check: ValidationCheck::ProofOfWork,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::pow::{CancelFlag, ProofOfWork};
    use crate::blockchain::transaction::Transaction;

    const DIFFICULTY: usize = 2;

    fn mined_chain(length: u64) -> Vec<Block> {
        let pow = ProofOfWork::new(DIFFICULTY);
        let mut blocks = vec![Block::genesis(vec![Transaction::network_mint("Alice", 100.0)])];

        for index in 1..length {
            let previous_hash = blocks[blocks.len() - 1].hash.clone();
            let candidate = Block::new(
                index,
                vec![
                    Transaction::new("Alice", "Bob", index as f64),
                    Transaction::network_mint("miner1", 10.0),
                ],
                previous_hash,
            );
            blocks.push(pow.seal(candidate, &CancelFlag::new()).unwrap());
        }

        blocks
    }

    #[test]
    fn test_valid_chain() {
        assert_eq!(validate_chain(&mined_chain(3), DIFFICULTY), Ok(()));
    }

    #[test]
    fn test_tampered_transaction_fails_hash_check() {
        let mut blocks = mined_chain(3);
        blocks[1].transactions[0].amount = 1_000_000.0;

        assert_eq!(
            validate_chain(&blocks, DIFFICULTY),
            Err(ValidationFailure {
                index: 1,
                check: ValidationCheck::Hash
            })
        );
    }

    #[test]
    fn test_tampered_recipient_fails_hash_check() {
        let mut blocks = mined_chain(3);
        blocks[1].transactions[1].recipient = "mallory".to_string();

        let failure = validate_chain(&blocks, DIFFICULTY).unwrap_err();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.check, ValidationCheck::Hash);
    }

    #[test]
    fn test_resealed_previous_hash_fails_linkage_check() {
        let mut blocks = mined_chain(3);
        blocks[1].previous_hash = "f".repeat(64);
        blocks[1].hash = blocks[1].calculate_hash();

        assert_eq!(
            validate_chain(&blocks, DIFFICULTY),
            Err(ValidationFailure {
                index: 1,
                check: ValidationCheck::Linkage
            })
        );
    }

    #[test]
    fn test_unmined_block_fails_proof_of_work_check() {
        let mut blocks = mined_chain(1);
        let mut candidate = Block::new(1, Vec::new(), blocks[0].hash.clone());
        // Walk nonces until the hash misses the target.
        while meets_difficulty(&candidate.hash, DIFFICULTY) {
            candidate.nonce += 1;
            candidate.hash = candidate.calculate_hash();
        }
        blocks.push(candidate);

        assert_eq!(
            validate_chain(&blocks, DIFFICULTY),
            Err(ValidationFailure {
                index: 1,
                check: ValidationCheck::ProofOfWork
            })
        );
    }

    #[test]
    fn test_genesis_is_exempt_from_proof_of_work() {
        let mut blocks = mined_chain(1);
        while meets_difficulty(&blocks[0].hash, DIFFICULTY) {
            blocks[0].nonce += 1;
            blocks[0].hash = blocks[0].calculate_hash();
        }

        assert_eq!(validate_chain(&blocks, DIFFICULTY), Ok(()));
    }

    #[test]
    fn test_first_failure_wins() {
        let mut blocks = mined_chain(4);
        blocks[2].transactions[0].amount = 42.0;
        blocks[3].transactions[0].amount = 42.0;

        assert_eq!(validate_chain(&blocks, DIFFICULTY).unwrap_err().index, 2);
    }

    #[test]
    fn test_failure_message() {
        let failure = ValidationFailure {
            index: 1,
            check: ValidationCheck::Linkage,
        };
        assert_eq!(failure.to_string(), "Block 1 invalid: previous_hash incorrect");
    }
}
