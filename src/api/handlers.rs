use std::time::Instant;

use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::crypto::{verify_transaction, KeyPair};
use crate::blockchain::{
    Block, Blockchain, BlockchainError, DigitalSignature, MiningError, Transaction,
    TransactionError, ValidationFailure, DEFAULT_MINER,
};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

/// Identity of the node serving requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NodeInfo {
    /// Node identifier
    pub node_id: String,

    /// HTTP port
    pub port: u16,

    /// Mining difficulty
    pub difficulty: usize,
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, message: impl Into<String>) -> HttpResponse {
    builder.json(serde_json::json!({ "error": message.into() }))
}

/// Amount as sent by clients, either a JSON number or a numeric string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(f64),
    Text(String),
}

impl AmountField {
    fn parse(&self) -> Result<f64, TransactionError> {
        match self {
            AmountField::Number(amount) => Ok(*amount),
            AmountField::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| TransactionError::InvalidAmount("amount must be a number".to_string())),
        }
    }
}

/// Request for the transaction endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: Option<String>,

    /// The recipient's address
    pub recipient: Option<String>,

    /// The amount to transfer
    #[schema(value_type = f64)]
    pub amount: Option<AmountField>,
}

impl TransactionRequest {
    /// Validates the request into a transaction
    pub fn into_transaction(self) -> Result<Transaction, TransactionError> {
        let sender = self.sender.ok_or(TransactionError::MissingField("sender"))?;
        let recipient = self.recipient.ok_or(TransactionError::MissingField("recipient"))?;
        let amount = self
            .amount
            .ok_or(TransactionError::MissingField("amount"))?
            .parse()?;

        Transaction::checked(&sender, &recipient, amount)
    }
}

/// Response for the transaction endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The queued transaction
    pub transaction: Transaction,

    /// Number of transactions waiting to be mined
    pub pending_transactions: usize,
}

/// Query for the mine endpoint
#[derive(Debug, Deserialize)]
pub struct MineQuery {
    /// The miner's address
    pub miner: Option<String>,
}

/// Response for the mine endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The newly mined block
    pub block: Block,

    /// Seconds spent mining
    pub mining_time: f64,
}

/// Response for the validate endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationResponse {
    /// Whether the chain is valid
    pub valid: bool,

    /// The message
    pub message: String,

    /// First failing block, when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ValidationFailure>,
}

/// Response for the balance endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// The queried address
    pub address: String,

    /// Confirmed balance minus pending debits
    pub balance: f64,
}

/// Node information
#[utoipa::path(
    get,
    path = "/api/v1/",
    responses(
        (status = 200, description = "Node information", body = NodeInfo)
    )
)]
pub async fn node_info(node: web::Data<NodeInfo>) -> impl Responder {
    HttpResponse::Ok().json(node.get_ref())
}

/// Get the full blockchain
///
/// Returns every block, the pending transactions and the difficulty
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = ChainSnapshot)
    )
)]
pub async fn get_chain(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.get_chain())
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.get_pending_transactions())
}

/// Create a new transaction
///
/// Checks the sender's balance (except for `network`) and queues the
/// transaction in the mempool
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction queued", body = TransactionResponse),
        (status = 400, description = "Invalid transaction or insufficient balance")
    )
)]
pub async fn new_transaction(
    blockchain: BlockchainData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let transaction = match transaction_req.into_inner().into_transaction() {
        Ok(transaction) => transaction,
        Err(err) => return error_response(HttpResponse::BadRequest(), err.to_string()),
    };

    match blockchain.submit_transaction(transaction.clone()) {
        Ok(pending_transactions) => HttpResponse::Created().json(TransactionResponse {
            message: "Transaction added to the mempool".to_string(),
            transaction,
            pending_transactions,
        }),
        Err(err) => error_response(HttpResponse::BadRequest(), err.to_string()),
    }
}

/// Mine a new block
///
/// Seals all pending transactions plus the miner's reward into a new block.
/// The nonce search runs on the blocking thread pool.
#[utoipa::path(
    get,
    path = "/api/v1/mine",
    params(
        ("miner" = Option<String>, Query, description = "Address credited with the reward, defaults to miner1")
    ),
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 400, description = "No transactions to mine"),
        (status = 409, description = "Mining was cancelled"),
        (status = 503, description = "Mining attempt limit reached")
    )
)]
pub async fn mine_block(blockchain: BlockchainData, query: web::Query<MineQuery>) -> impl Responder {
    let miner = query
        .into_inner()
        .miner
        .unwrap_or_else(|| DEFAULT_MINER.to_string());

    let started = Instant::now();
    let chain = blockchain.clone();
    let result = web::block(move || chain.mine_block(&miner)).await;
    let mining_time = started.elapsed().as_secs_f64();

    match result {
        Ok(Ok(Some(block))) => HttpResponse::Ok().json(MineResponse {
            message: format!("Block #{} mined in {:.2}s", block.index, mining_time),
            block,
            mining_time,
        }),
        Ok(Ok(None)) => error_response(HttpResponse::BadRequest(), "No transactions to mine"),
        Ok(Err(err @ BlockchainError::MiningError(MiningError::Cancelled { .. }))) => {
            error_response(HttpResponse::Conflict(), err.to_string())
        }
        Ok(Err(err)) => error_response(HttpResponse::ServiceUnavailable(), err.to_string()),
        Err(err) => {
            error!("Mining task failed: {}", err);
            error_response(HttpResponse::InternalServerError(), "Mining task failed")
        }
    }
}

/// Cancel mining
///
/// Stops the nonce search in progress; its transactions stay pending
#[utoipa::path(
    post,
    path = "/api/v1/mine/cancel",
    responses(
        (status = 202, description = "Cancellation requested")
    )
)]
pub async fn cancel_mining(blockchain: BlockchainData) -> impl Responder {
    blockchain.cancel_mining();
    HttpResponse::Accepted().json(serde_json::json!({ "message": "Cancellation requested" }))
}

/// Check if the blockchain is valid
///
/// Validates the entire blockchain and names the first failing block
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = ValidationResponse)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    let response = match blockchain.validate() {
        Ok(()) => ValidationResponse {
            valid: true,
            message: "The blockchain is valid".to_string(),
            failure: None,
        },
        Err(failure) => ValidationResponse {
            valid: false,
            message: failure.to_string(),
            failure: Some(failure),
        },
    };

    HttpResponse::Ok().json(response)
}

/// Get an address balance
///
/// Confirmed transactions count both ways; pending ones only as debits
#[utoipa::path(
    get,
    path = "/api/v1/balance/{address}",
    params(
        ("address" = String, Path, description = "Account address")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse)
    )
)]
pub async fn get_balance(blockchain: BlockchainData, address: web::Path<String>) -> impl Responder {
    let address = address.into_inner();
    let balance = blockchain.get_balance(&address);

    HttpResponse::Ok().json(BalanceResponse { address, balance })
}

/// Response for the create wallet endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    /// The public key (hex encoded)
    pub public_key: String,

    /// The private key (hex encoded)
    pub private_key: String,
}

/// Create a new keypair
///
/// The keypair is not linked to any ledger address and is not stored;
/// the private key must be kept by the caller
#[utoipa::path(
    post,
    path = "/api/v1/wallet/new",
    responses(
        (status = 201, description = "Keypair created successfully", body = WalletResponse)
    )
)]
pub async fn create_wallet() -> impl Responder {
    let keys = KeyPair::generate();

    HttpResponse::Created().json(WalletResponse {
        public_key: keys.public_key_hex(),
        private_key: keys.secret_key_hex(),
    })
}

/// Request for the sign endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignRequest {
    /// The transaction to sign
    pub transaction: Transaction,

    /// The signer's private key (hex encoded)
    pub private_key: String,
}

/// Response for the sign endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignResponse {
    /// Signature over the canonical transaction bytes
    pub signature: DigitalSignature,
}

/// Sign a transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions/sign",
    request_body = SignRequest,
    responses(
        (status = 200, description = "Transaction signed", body = SignResponse),
        (status = 400, description = "Invalid private key")
    )
)]
pub async fn sign_transaction(sign_req: web::Json<SignRequest>) -> impl Responder {
    let keys = match KeyPair::from_secret_hex(&sign_req.private_key) {
        Ok(keys) => keys,
        Err(err) => return error_response(HttpResponse::BadRequest(), err.to_string()),
    };

    HttpResponse::Ok().json(SignResponse {
        signature: keys.sign_transaction(&sign_req.transaction),
    })
}

/// Request for the verify endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// The signed transaction
    pub transaction: Transaction,

    /// The signature (hex encoded)
    pub signature: DigitalSignature,

    /// The signer's public key (hex encoded)
    pub public_key: String,
}

/// Response for the verify endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// Whether the signature is valid; false for any malformed input
    pub verified: bool,
}

/// Verify a transaction signature
#[utoipa::path(
    post,
    path = "/api/v1/transactions/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyResponse)
    )
)]
pub async fn verify_signature(verify_req: web::Json<VerifyRequest>) -> impl Responder {
    let verified = verify_transaction(
        &verify_req.transaction,
        &verify_req.signature,
        &verify_req.public_key,
    );

    HttpResponse::Ok().json(VerifyResponse { verified })
}
