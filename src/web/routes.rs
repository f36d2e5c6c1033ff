use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::application::ProposalService;
use crate::infrastructure::middleware::rate_limit_middleware;
use crate::infrastructure::rate_limiter::RateLimiter;
use crate::web::{docs, handlers::*};

/// Builds the application router.
///
/// Layer order, outermost first: request tracing, the `/api` rate limiter, then
/// routing. The fallback is installed before the limiter so unknown `/api/*` paths
/// are counted too. The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` because the limiter keys
/// on the peer address.
pub fn create_router(service: ProposalService, limiter: RateLimiter) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/proposals", get(list_proposals).post(create_proposal))
        .merge(docs::swagger_ui())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(service))
}
