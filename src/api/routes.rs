use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/", web::get().to(handlers::node_info))
            .route("/chain", web::get().to(handlers::get_chain))
            .route("/transactions/pending", web::get().to(handlers::get_pending_transactions))
            .route("/transactions/new", web::post().to(handlers::new_transaction))
            .route("/transactions/sign", web::post().to(handlers::sign_transaction))
            .route("/transactions/verify", web::post().to(handlers::verify_signature))
            .route("/mine", web::get().to(handlers::mine_block))
            .route("/mine/cancel", web::post().to(handlers::cancel_mining))
            .route("/validate", web::get().to(handlers::validate_chain))
            .route("/balance/{address}", web::get().to(handlers::get_balance))
            .route("/wallet/new", web::post().to(handlers::create_wallet))
    );
}
