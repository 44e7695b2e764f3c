pub mod assets;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    city::CityError,
    session::{PaletteEntry, Session, View},
};

use self::assets::AssetHost;

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
    assets: Arc<AssetHost>,
}

impl AppState {
    pub fn new(session: Session, asset_root: impl Into<PathBuf>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            assets: Arc::new(AssetHost::new(asset_root.into())),
        }
    }
}

pub struct WebServerConfig {
    pub session: Session,
    pub asset_root: PathBuf,
    pub host: String,
    pub port: u16,
}

/// Reply to every intent: whether it was accepted plus the view to render.
#[derive(Debug, Clone, Serialize)]
pub struct IntentResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub view: View,
}

#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    pub tool: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BuildRequest {
    pub index: usize,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        session,
        asset_root,
        host,
        port,
    } = config;

    if !asset_root.join(assets::INDEX_DOCUMENT).is_file() {
        warn!(
            root = %asset_root.display(),
            "asset root has no {}; page requests will fail",
            assets::INDEX_DOCUMENT
        );
    }

    let router = build_router(AppState::new(session, asset_root));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;

    info!("Bee City Builder running on http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(current_state))
        .route("/api/catalog", get(catalog))
        .route("/api/tool", post(select_tool))
        .route("/api/build", post(build))
        .route("/api/clear", post(clear_grid))
        .route("/api/end-turn", post(end_turn))
        .fallback(static_asset)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down Bee City...");
}

fn respond(outcome: Result<(), CityError>, view: View) -> Response {
    match outcome {
        Ok(()) => Json(IntentResponse {
            ok: true,
            error: None,
            view,
        })
        .into_response(),
        Err(err) => reject(StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), view),
    }
}

fn reject(status: StatusCode, error: String, view: View) -> Response {
    (
        status,
        Json(IntentResponse {
            ok: false,
            error: Some(error),
            view,
        }),
    )
        .into_response()
}

// Unreadable bodies never reach the session; the client still gets the
// current view so it can re-render.
async fn malformed(state: &AppState, rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "malformed intent body");
    let view = state.session.lock().await.view();
    reject(rejection.status(), rejection.body_text(), view)
}

async fn current_state(State(state): State<AppState>) -> Json<View> {
    Json(state.session.lock().await.view())
}

async fn catalog(State(state): State<AppState>) -> Json<Vec<PaletteEntry>> {
    Json(state.session.lock().await.palette())
}

async fn select_tool(
    State(state): State<AppState>,
    request: Result<Json<ToolRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return malformed(&state, rejection).await,
    };
    let mut session = state.session.lock().await;
    let outcome = session.select_tool(request.tool.as_deref());
    respond(outcome, session.view())
}

async fn build(
    State(state): State<AppState>,
    request: Result<Json<BuildRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return malformed(&state, rejection).await,
    };
    let mut session = state.session.lock().await;
    let outcome = session.build_at(request.index).map(|_| ());
    respond(outcome, session.view())
}

async fn clear_grid(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    session.clear_grid();
    respond(Ok(()), session.view())
}

async fn end_turn(State(state): State<AppState>) -> Response {
    let mut session = state.session.lock().await;
    session.end_turn();
    respond(Ok(()), session.view())
}

// Anything that is not an intent is a static asset; unknown intents are 404s
// rather than the index page.
async fn static_asset(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("no such endpoint {path}") })),
        )
            .into_response();
    }
    state.assets.serve(request).await
}
