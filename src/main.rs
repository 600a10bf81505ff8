use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pow_ledger::api::{self, NodeInfo};
use pow_ledger::blockchain;
use pow_ledger::config::NodeConfig;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::node_info,
        api::handlers::get_chain,
        api::handlers::get_pending_transactions,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::cancel_mining,
        api::handlers::validate_chain,
        api::handlers::get_balance,
        api::handlers::create_wallet,
        api::handlers::sign_transaction,
        api::handlers::verify_signature
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            blockchain::ChainSnapshot,
            blockchain::DigitalSignature,
            blockchain::ValidationCheck,
            blockchain::ValidationFailure,
            api::handlers::NodeInfo,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineResponse,
            api::handlers::ValidationResponse,
            api::handlers::BalanceResponse,
            api::handlers::WalletResponse,
            api::handlers::SignRequest,
            api::handlers::SignResponse,
            api::handlers::VerifyRequest,
            api::handlers::VerifyResponse
        )
    ),
    tags(
        (name = "ledger", description = "Proof-of-work ledger endpoints")
    ),
    info(
        title = "Ledger Node API",
        version = "1.0.0",
        description = "A proof-of-work ledger node",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = NodeConfig::parse();
    let node_id = config.node_id();

    // Each process owns its own, unshared ledger
    let blockchain = web::Data::new(config.build_blockchain());
    let node = web::Data::new(NodeInfo {
        node_id: node_id.clone(),
        port: config.port,
        difficulty: config.difficulty,
    });

    info!("Starting ledger node {} (difficulty {})", node_id, config.difficulty);
    info!("Listening on http://{}:{}", config.host, config.port);
    info!("To start another node, run with port {}", config.port.saturating_add(1));

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            .app_data(node.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
