use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
    serve,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::infrastructure::AppContainer;
use crate::presentation::http::handlers::AskHandler;

pub async fn run(container: AppContainer) {
    let handler = Arc::new(AskHandler::new(container.dispatcher.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Invoice Query API" }))
        .route("/ask", post(AskHandler::ask))
        .route("/tools", get(AskHandler::list_tools))
        .with_state(handler)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    serve(listener, app).await.expect("Server error");
}
