//! Status endpoints served by the supervisor.

use std::path::Path;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Path of the endpoint that lists every registered endpoint.
pub const LIST_PATH: &str = "/eps";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Writes `data` as plain text
    Text,
    /// Serves the file `data` from the static directory
    Page,
    /// Writes `data` (or the endpoint list for `/eps`) as JSON
    Json,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub description: String,
    pub kind: EndpointKind,
    pub data: String,
}

impl Endpoint {
    pub fn new(
        path: impl Into<String>,
        kind: EndpointKind,
        description: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            kind,
            data: data.into(),
        }
    }
}

/// Row of the `/eps` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSummary {
    pub endpoint: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
}

pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new(
            "/whoru",
            EndpointKind::Text,
            "Returns 'wf-run :- I am WebRunner a Web Services Driver Program.'",
            "wf-run :- Web Services Driver Program.",
        ),
        Endpoint::new("/", EndpointKind::Page, "Displays the main page.", "WebRunner.html"),
        Endpoint::new(
            "/favicon.ico",
            EndpointKind::Page,
            "Favicon for the application.",
            "favicon.ico",
        ),
        Endpoint::new(
            "/version",
            EndpointKind::Text,
            "Returns the version of the program.",
            env!("CARGO_PKG_VERSION"),
        ),
        Endpoint::new(LIST_PATH, EndpointKind::Json, "Returns the list of endpoints.", ""),
    ]
}

pub fn summarize(endpoints: &[Endpoint]) -> Vec<EndpointSummary> {
    endpoints
        .iter()
        .map(|ep| EndpointSummary {
            endpoint: ep.path.clone(),
            description: ep.description.clone(),
            kind: ep.kind,
        })
        .collect()
}

/// Router with one route per endpoint. The `/` page also serves as fallback.
pub fn build_router(endpoints: &[Endpoint], static_dir: &Path) -> Router {
    let mut router = Router::new();

    for ep in endpoints {
        router = match ep.kind {
            EndpointKind::Text => {
                let body = ep.data.clone();
                router.route(&ep.path, get(move || async move { body }))
            }
            EndpointKind::Page => {
                let file = ServeFile::new(static_dir.join(&ep.data));
                if ep.path == "/" {
                    router.route_service(&ep.path, file.clone()).fallback_service(file)
                } else {
                    router.route_service(&ep.path, file)
                }
            }
            EndpointKind::Json if ep.path == LIST_PATH => {
                let list = summarize(endpoints);
                router.route(&ep.path, get(move || async move { Json(list) }))
            }
            EndpointKind::Json => match serde_json::from_str::<Value>(&ep.data) {
                Ok(value) => router.route(&ep.path, get(move || async move { Json(value) })),
                Err(e) => {
                    warn!("Failed to parse JSON data for endpoint {}: {}", ep.path, e);
                    router.route(&ep.path, get(invalid_json_handler))
                }
            },
        };
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

async fn invalid_json_handler() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "Invalid JSON data")
}
