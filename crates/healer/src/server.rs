//! HTTP trigger for the healer registry.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::registry::{HealReport, HealerRegistry};

/// Build the healer router.
pub fn build_router(registry: Arc<HealerRegistry>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healers", get(list_handler))
        .route("/healers/{name}", post(heal_handler).get(heal_handler))
        .route("/heal", post(heal_all_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Serve the router on `listen` until the process is stopped.
pub async fn serve(registry: Arc<HealerRegistry>, listen: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, healers = registry.len(), "Healer trigger listening");
    axum::serve(listener, build_router(registry)).await
}

#[derive(Debug, Serialize)]
struct HealResponse {
    healer: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn list_handler(State(registry): State<Arc<HealerRegistry>>) -> Json<Vec<&'static str>> {
    Json(registry.names())
}

async fn heal_handler(
    State(registry): State<Arc<HealerRegistry>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match registry.heal(&name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealResponse {
                healer: name,
                status: "healed",
                error: None,
            }),
        ),
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(HealResponse {
                    healer: name,
                    status: "failed",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn heal_all_handler(State(registry): State<Arc<HealerRegistry>>) -> Json<Vec<HealReport>> {
    Json(registry.heal_all().await)
}
