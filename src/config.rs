//! Process configuration for the ledger node

use clap::Parser;

use crate::blockchain::Blockchain;

/// Command line and environment configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "pow_ledger", version, about = "Proof-of-work ledger node")]
pub struct NodeConfig {
    /// Port the HTTP server listens on
    #[arg(env = "LEDGER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Interface the HTTP server binds to
    #[arg(long, env = "LEDGER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Leading hex zeros required in mined block hashes
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = 3)]
    pub difficulty: usize,

    /// Amount credited to the miner of each block
    #[arg(long, env = "LEDGER_MINING_REWARD", default_value_t = 10.0)]
    pub mining_reward: f64,

    /// Give up a nonce search after this many hashes
    #[arg(long, env = "LEDGER_MAX_MINING_ATTEMPTS")]
    pub max_mining_attempts: Option<u64>,
}

impl NodeConfig {
    /// Identifier shown to clients, derived from the port
    pub fn node_id(&self) -> String {
        format!("Node{}", self.port)
    }

    /// Builds the chain this node serves
    pub fn build_blockchain(&self) -> Blockchain {
        Blockchain::new(self.difficulty)
            .with_mining_reward(self.mining_reward)
            .with_max_mining_attempts(self.max_mining_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::try_parse_from(["pow_ledger"]).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.mining_reward, 10.0);
        assert_eq!(config.max_mining_attempts, None);
        assert_eq!(config.node_id(), "Node5000");
    }

    #[test]
    fn test_positional_port_and_flags() {
        let config = NodeConfig::try_parse_from([
            "pow_ledger",
            "5001",
            "--difficulty",
            "2",
            "--max-mining-attempts",
            "1000",
        ])
        .unwrap();

        assert_eq!(config.port, 5001);
        assert_eq!(config.node_id(), "Node5001");
        assert_eq!(config.max_mining_attempts, Some(1000));

        let blockchain = config.build_blockchain();
        assert_eq!(blockchain.difficulty(), 2);
        assert_eq!(blockchain.mining_reward(), 10.0);
    }

    #[test]
    fn test_invalid_port() {
        assert!(NodeConfig::try_parse_from(["pow_ledger", "not-a-port"]).is_err());
    }
}
