use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

use super::encoding::CanonicalEncode;

/// Sender name used for privilege-free mints (genesis funding, mining rewards)
pub const NETWORK_SENDER: &str = "network";

/// Errors raised while building a transaction from external input
#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Represents a transfer recorded in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's address, or `network` for mints
    pub sender: String,

    /// Recipient's address
    pub recipient: String,

    /// Amount being transferred
    pub amount: f64,

    /// Creation time in UNIX seconds
    pub timestamp: f64,
}

impl Transaction {
    /// Creates a new transaction stamped with the current time
    ///
    /// No validation is performed; use [`Transaction::checked`] for input
    /// coming from outside the node.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self::with_timestamp(sender, recipient, amount, unix_now())
    }

    /// Creates a new transaction with an explicit timestamp
    pub fn with_timestamp(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        timestamp: f64,
    ) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp,
        }
    }

    /// Creates a mint from the network (genesis funding or mining reward)
    pub fn network_mint(recipient: impl Into<String>, amount: f64) -> Self {
        Self::new(NETWORK_SENDER, recipient, amount)
    }

    /// Builds a transaction from untrusted input
    ///
    /// # Arguments
    ///
    /// * `sender` - The sender's address, must not be blank
    /// * `recipient` - The recipient's address, must not be blank
    /// * `amount` - The amount, must be finite and strictly positive
    ///
    /// # Returns
    ///
    /// The well-formed transaction, or the first problem found
    pub fn checked(sender: &str, recipient: &str, amount: f64) -> Result<Self, TransactionError> {
        if sender.trim().is_empty() {
            return Err(TransactionError::MissingField("sender"));
        }
        if recipient.trim().is_empty() {
            return Err(TransactionError::MissingField("recipient"));
        }
        if !amount.is_finite() {
            return Err(TransactionError::InvalidAmount(format!(
                "{} is not a number",
                amount
            )));
        }
        if amount <= 0.0 {
            return Err(TransactionError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }

        Ok(Self::new(sender, recipient, amount))
    }

    /// Checks if the transaction is a network mint
    pub fn is_network_mint(&self) -> bool {
        self.sender == NETWORK_SENDER
    }
}

impl CanonicalEncode for Transaction {
    fn canonical_value(&self) -> Value {
        json!({
            "sender": self.sender,
            "recipient": self.recipient,
            "amount": self.amount,
            "timestamp": self.timestamp,
        })
    }
}

/// Current time in UNIX seconds with microsecond precision
pub fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new("Alice", "Bob", 10.5);

        assert_eq!(transaction.sender, "Alice");
        assert_eq!(transaction.recipient, "Bob");
        assert_eq!(transaction.amount, 10.5);
        assert!(transaction.timestamp > 0.0);
        assert!(!transaction.is_network_mint());
    }

    #[test]
    fn test_network_mint() {
        let transaction = Transaction::network_mint("miner1", 10.0);

        assert_eq!(transaction.sender, NETWORK_SENDER);
        assert_eq!(transaction.recipient, "miner1");
        assert!(transaction.is_network_mint());
    }

    #[test]
    fn test_checked_rejects_bad_input() {
        assert_eq!(
            Transaction::checked("", "Bob", 1.0),
            Err(TransactionError::MissingField("sender"))
        );
        assert_eq!(
            Transaction::checked("Alice", "  ", 1.0),
            Err(TransactionError::MissingField("recipient"))
        );
        assert!(matches!(
            Transaction::checked("Alice", "Bob", 0.0),
            Err(TransactionError::InvalidAmount(_))
        ));
        assert!(matches!(
            Transaction::checked("Alice", "Bob", -3.0),
            Err(TransactionError::InvalidAmount(_))
        ));
        assert!(matches!(
            Transaction::checked("Alice", "Bob", f64::NAN),
            Err(TransactionError::InvalidAmount(_))
        ));
        assert!(Transaction::checked("Alice", "Bob", 0.5).is_ok());
    }

    #[test]
    fn test_canonical_bytes_use_sorted_keys() {
        let transaction = Transaction::with_timestamp("network", "Alice", 50.0, 1700000000.5);
        let bytes = String::from_utf8(transaction.canonical_bytes()).unwrap();

        assert_eq!(
            bytes,
            r#"{"amount":50.0,"recipient":"Alice","sender":"network","timestamp":1700000000.5}"#
        );
    }

    #[test]
    fn test_wire_format_field_names() {
        let transaction = Transaction::with_timestamp("Alice", "Bob", 30.0, 1.0);
        let value = serde_json::to_value(&transaction).unwrap();

        assert_eq!(value["sender"], "Alice");
        assert_eq!(value["recipient"], "Bob");
        assert_eq!(value["amount"], 30.0);
        assert_eq!(value["timestamp"], 1.0);

        let decoded: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, transaction);
    }
}
