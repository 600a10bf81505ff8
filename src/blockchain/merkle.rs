//! Merkle roots over ordered transaction lists.
//!
//! - Leaves are the hex SHA-256 of each transaction's canonical bytes.
//! - A parent is the SHA-256 of the concatenated hex strings of its children.
//! - Odd levels pair the last node with itself.
//! - An empty list has no root.

use super::encoding::{sha256_hex, CanonicalEncode};
use super::transaction::Transaction;

fn hash_pair(left: &str, right: &str) -> String {
    let mut combined = String::with_capacity(left.len() + right.len());
    combined.push_str(left);
    combined.push_str(right);
    sha256_hex(combined.as_bytes())
}

/// Reduces leaf hashes to a single root, in place.
///
/// Returns `None` when `nodes` is empty.
pub fn root_from_leaves(mut nodes: Vec<String>) -> Option<String> {
    if nodes.is_empty() {
        return None;
    }

    let mut len = nodes.len();

    while len > 1 {
        let mut write = 0;
        let mut read = 0;

        while read < len {
            let parent = if read + 1 < len {
                hash_pair(&nodes[read], &nodes[read + 1])
            } else {
                hash_pair(&nodes[read], &nodes[read])
            };

            nodes[write] = parent;

            write += 1;
            read += 2;
        }

        len = write;
    }

    nodes.truncate(1);
    nodes.pop()
}

/// Computes the Merkle root of `transactions` in their given order
pub fn merkle_root(transactions: &[Transaction]) -> Option<String> {
    let leaves = transactions.iter().map(|tx| tx.canonical_hash()).collect();
    root_from_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(recipient: &str, amount: f64) -> Transaction {
        Transaction::with_timestamp("network", recipient, amount, 1700000000.0)
    }

    #[test]
    fn test_empty_list_has_no_root() {
        assert_eq!(merkle_root(&[]), None);
    }

    #[test]
    fn test_single_leaf_is_the_root() {
        let a = tx("Alice", 1.0);
        let leaf = a.canonical_hash();

        assert_eq!(merkle_root(&[a]), Some(leaf));
    }

    #[test]
    fn test_two_leaves() {
        let a = tx("Alice", 1.0);
        let b = tx("Bob", 2.0);

        let expected = hash_pair(&a.canonical_hash(), &b.canonical_hash());
        assert_eq!(merkle_root(&[a, b]), Some(expected));
    }

    #[test]
    fn test_odd_leaf_is_duplicated() {
        let a = tx("Alice", 1.0);
        let b = tx("Bob", 2.0);
        let c = tx("Charlie", 3.0);

        let (ha, hb, hc) = (a.canonical_hash(), b.canonical_hash(), c.canonical_hash());
        let left = sha256_hex(format!("{}{}", ha, hb).as_bytes());
        let right = sha256_hex(format!("{}{}", hc, hc).as_bytes());
        let expected = sha256_hex(format!("{}{}", left, right).as_bytes());

        assert_eq!(merkle_root(&[a, b, c.clone()]), Some(expected.clone()));

        // Propagating `c` up unmodified would give a different root.
        let propagated = sha256_hex(format!("{}{}", left, hc).as_bytes());
        assert_ne!(expected, propagated);
    }

    #[test]
    fn test_root_is_order_sensitive() {
        let a = tx("Alice", 1.0);
        let b = tx("Bob", 2.0);
        let c = tx("Charlie", 3.0);

        let forward = merkle_root(&[a.clone(), b.clone(), c.clone()]);
        let reversed = merkle_root(&[c, b, a]);

        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_root_is_deterministic() {
        let txs: Vec<Transaction> = (0..7).map(|i| tx("Alice", i as f64)).collect();

        assert_eq!(merkle_root(&txs), merkle_root(&txs.clone()));
        assert_eq!(merkle_root(&txs).map(|root| root.len()), Some(64));
    }
}
