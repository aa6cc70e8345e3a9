mod classificador;
mod elegibilidade;
mod extracao;
mod health;
mod processos;
mod solicitacao;

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use fishsub_core::context::RequestContext;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::state::SharedState;

/// Constructs a `RequestContext` (C9) per request from the `x-user-id`
/// header (defaulting to `"anonymous"`), records it onto a span wrapping
/// the rest of the middleware stack, and makes it available to handlers
/// via `Extension<RequestContext>`.
async fn attach_request_context(headers: HeaderMap, mut req: Request, next: Next) -> Response {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");
    let context = RequestContext::new(user_id);

    let span = tracing::info_span!(
        "request",
        request_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    );
    context.record_on_span(&span);

    req.extensions_mut().insert(context);
    next.run(req).instrument(span).await
}

/// Builds the full HTTP surface (spec §6): one router, request-context,
/// CORS, and tracing layers, shared state.
pub fn build_router(state: SharedState) -> Router<()> {
    Router::new()
        .route("/solicitacao/classificador", post(classificador::handle))
        .route("/solicitacao/extracao", post(extracao::handle))
        .route("/solicitacao/elegibilidade", post(elegibilidade::handle))
        .route("/solicitacao/dashboard", get(solicitacao::dashboard))
        .route("/solicitacao/:id", get(solicitacao::detail))
        .route("/processos/consultar/:cnj", get(processos::consultar))
        .route("/processos/dashboard", get(processos::dashboard))
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(attach_request_context))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
