//! HTTP surface
//!
//! Axum router exposing the documentation page, the liveness probe and the
//! `/upload` pipeline test endpoint. Domain errors travel in the JSON
//! payload with HTTP 200, matching the convention the engine's existing
//! clients expect.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::PipelineOrchestrator;
use crate::traits::{FilterConfigStore, MessageDispatcher, OutputHarvester, PatternStore};
use crate::types::{PipelineReport, PipelineRequest};

/// Fallback body for `GET /` when the readme cannot be read.
const FALLBACK_DOCUMENTATION: &str = "Filter tester's server\n";

/// HTTP front end over the pipeline orchestrator.
pub struct FilterTesterServer<P, F, D, H>
where
    P: PatternStore + 'static,
    F: FilterConfigStore + 'static,
    D: MessageDispatcher + 'static,
    H: OutputHarvester + 'static,
{
    orchestrator: Arc<PipelineOrchestrator<P, F, D, H>>,
    readme_path: Arc<PathBuf>,
    bind_address: SocketAddr,
}

impl<P, F, D, H> Clone for FilterTesterServer<P, F, D, H>
where
    P: PatternStore + 'static,
    F: FilterConfigStore + 'static,
    D: MessageDispatcher + 'static,
    H: OutputHarvester + 'static,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            readme_path: Arc::clone(&self.readme_path),
            bind_address: self.bind_address,
        }
    }
}

impl<P, F, D, H> FilterTesterServer<P, F, D, H>
where
    P: PatternStore + 'static,
    F: FilterConfigStore + 'static,
    D: MessageDispatcher + 'static,
    H: OutputHarvester + 'static,
{
    pub fn new(
        orchestrator: PipelineOrchestrator<P, F, D, H>,
        readme_path: PathBuf,
        bind_address: SocketAddr,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            readme_path: Arc::new(readme_path),
            bind_address,
        }
    }

    /// Build the axum router with all routes.
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/", get(documentation_handler))
            .route("/ping", get(ping_handler))
            .route("/upload", post(upload_handler))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()).into_inner())
            .with_state(self.clone())
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(&self) -> PipelineResult<()> {
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.bind_address).await.map_err(|e| {
            PipelineError::ServerStartup(format!("cannot bind {}: {}", self.bind_address, e))
        })?;

        info!("filter tester listening on http://{}", self.bind_address);

        axum::serve(listener, router)
            .await
            .map_err(|e| PipelineError::ServerStartup(e.to_string()))?;

        Ok(())
    }
}

fn error_body(error: &PipelineError) -> Value {
    json!({ "Error": error.to_string() })
}

/// `GET /` — serve the readme, falling back to a one-line description.
async fn documentation_handler<P, F, D, H>(
    State(server): State<FilterTesterServer<P, F, D, H>>,
) -> impl IntoResponse
where
    P: PatternStore + 'static,
    F: FilterConfigStore + 'static,
    D: MessageDispatcher + 'static,
    H: OutputHarvester + 'static,
{
    match tokio::fs::read_to_string(server.readme_path.as_ref()).await {
        Ok(documentation) => documentation,
        Err(error) => {
            warn!("cannot read readme file: {}", error);
            FALLBACK_DOCUMENTATION.to_string()
        }
    }
}

/// `GET /ping` — liveness token.
async fn ping_handler() -> &'static str {
    "pong"
}

/// `POST /upload` — decode the multipart submission and run the pipeline
/// test. Always responds 200; failures are reported in the payload.
async fn upload_handler<P, F, D, H>(
    State(server): State<FilterTesterServer<P, F, D, H>>,
    multipart: Multipart,
) -> axum::response::Response
where
    P: PatternStore + 'static,
    F: FilterConfigStore + 'static,
    D: MessageDispatcher + 'static,
    H: OutputHarvester + 'static,
{
    info!("got new request");

    let result = match decode_request(multipart).await {
        Ok(request) => server.orchestrator.run_test(&request).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(output) => Json(PipelineReport::success(output)).into_response(),
        Err(error) => {
            warn!("pipeline test failed: {}", error);
            Json(error_body(&error)).into_response()
        }
    }
}

/// Drain the multipart body into `(field name, value)` pairs and fold them
/// into a validated request. Transport-level read errors reject the whole
/// submission before any staging occurs.
async fn decode_request(mut multipart: Multipart) -> PipelineResult<PipelineRequest> {
    let mut parts = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| PipelineError::InvalidRequest { reason: e.to_string() })?;
                parts.push((name, value));
            }
            Ok(None) => break,
            Err(error) => {
                return Err(PipelineError::InvalidRequest { reason: error.to_string() });
            }
        }
    }

    PipelineRequest::from_parts(parts)
}
