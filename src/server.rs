/// HTTP server setup and routing
use crate::{
    api,
    context::AppContext,
    error::{GistError, GistResult},
};
use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Browsers ask for this on every page load; never a gist
        .route("/favicon.ico", get(not_found))
        .merge(api::routes())
        // Anything else is a gist path
        .fallback(api::gist::serve_gist)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

/// 404 handler
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> GistResult<()> {
    let addr = ctx.listen_addr();

    info!("{} listening on {}", ctx.config.embed.provider_name, addr);
    info!("   Public URL: {}", ctx.public_url());
    info!("   Gist cache: {:?}", ctx.config.storage.cache_directory);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GistError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| GistError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
