use super::block::Block;
use super::transaction::Transaction;

/// Read-only balance view over confirmed blocks and the mempool
///
/// Nothing is cached; every query replays all recorded transactions.
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    blocks: &'a [Block],
    mempool: &'a [Transaction],
}

impl<'a> LedgerView<'a> {
    pub fn new(blocks: &'a [Block], mempool: &'a [Transaction]) -> Self {
        LedgerView { blocks, mempool }
    }

    /// Computes the balance of `address`
    ///
    /// Confirmed transactions count both ways. Pending transactions only
    /// count as debits: money on its way to `address` is not included until
    /// it is mined.
    pub fn balance(&self, address: &str) -> f64 {
        let mut balance = 0.0;

        for tx in self.blocks.iter().flat_map(|block| block.transactions.iter()) {
            if tx.sender == address {
                balance -= tx.amount;
            }
            if tx.recipient == address {
                balance += tx.amount;
            }
        }

        for tx in self.mempool.iter().filter(|tx| tx.sender == address) {
            balance -= tx.amount;
        }

        balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> Vec<Block> {
        vec![Block::genesis(vec![
            Transaction::network_mint("Alice", 100.0),
            Transaction::network_mint("Bob", 50.0),
        ])]
    }

    #[test]
    fn test_confirmed_balances() {
        let blocks = genesis();
        let view = LedgerView::new(&blocks, &[]);

        assert_eq!(view.balance("Alice"), 100.0);
        assert_eq!(view.balance("Bob"), 50.0);
        assert_eq!(view.balance("nobody"), 0.0);
    }

    #[test]
    fn test_network_balance_goes_negative() {
        let blocks = genesis();
        let view = LedgerView::new(&blocks, &[]);

        assert_eq!(view.balance("network"), -150.0);
    }

    #[test]
    fn test_pending_debits_apply_but_credits_do_not() {
        let blocks = genesis();
        let mempool = vec![Transaction::new("Alice", "Bob", 30.0)];
        let view = LedgerView::new(&blocks, &mempool);

        assert_eq!(view.balance("Alice"), 70.0);
        assert_eq!(view.balance("Bob"), 50.0);
    }

    #[test]
    fn test_self_transfer_nets_to_zero() {
        let mut blocks = genesis();
        blocks.push(Block::new(
            1,
            vec![Transaction::new("Alice", "Alice", 25.0)],
            blocks[0].hash.clone(),
        ));
        let view = LedgerView::new(&blocks, &[]);

        assert_eq!(view.balance("Alice"), 100.0);
    }
}
