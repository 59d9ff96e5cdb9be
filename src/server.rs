//! Axum routes: thin JSON wrappers around SquadronPages plus the static pages.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::Args;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::cli::FetchArgs;
use crate::config::{API_VERSION, DEFAULT_STAT_GROUP};
use crate::pages::SquadronPages;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "SQUAD_API_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short, env = "SQUAD_API_PORT", default_value = "8000")]
    pub port: u16,

    /// Icon served at /favicon.ico
    #[arg(long, default_value = "favicon.ico")]
    pub favicon: PathBuf,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    info!(version = API_VERSION, "starting squad-api");
    if args.fetch.no_cache {
        warn!("caching is disabled (--no-cache)");
    } else {
        info!("caching is enabled (1 hour), disable with --no-cache");
    }

    let pages = args.fetch.build_pages().await?;
    let state = AppState::new(Arc::new(pages), args.favicon);
    serve(SocketAddr::new(args.host, args.port), state).await
}

#[derive(Clone)]
pub struct AppState {
    pages: Arc<SquadronPages>,
    favicon: Arc<PathBuf>,
}

impl AppState {
    pub fn new(pages: Arc<SquadronPages>, favicon: impl Into<PathBuf>) -> Self {
        Self {
            pages,
            favicon: Arc::new(favicon.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    group: Option<i64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/version", get(version))
        .route("/squadron/{name}", get(squadron_roster))
        .route("/squadroninfo/{name}", get(squadron_stats))
        .route("/favicon.ico", get(favicon))
        .route("/favicon", get(favicon))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires. If the handler could not be installed the
/// server keeps running instead of shutting down at once.
async fn wait_for_shutdown(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            error!(error = %e, "failed to install Ctrl-C handler, graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

/// GET /, the static welcome page.
async fn welcome() -> Html<String> {
    Html(welcome_page())
}

/// GET /version
async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "version": API_VERSION }))
}

/// GET /squadron/{name}: roster keyed by player name.
async fn squadron_roster(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    debug!(squadron = %name, "roster request");
    Json(state.pages.roster(&name).await).into_response()
}

/// GET /squadroninfo/{name}?group=N: squadron stat block.
async fn squadron_stats(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Response {
    let group = query.group.unwrap_or(DEFAULT_STAT_GROUP);
    debug!(squadron = %name, group, "stats request");
    Json(state.pages.stats(&name, group).await).into_response()
}

async fn favicon(State(state): State<AppState>) -> Response {
    match tokio::fs::read(state.favicon.as_path()).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/x-icon")], bytes).into_response(),
        Err(e) => {
            debug!(path = %state.favicon.display(), error = %e, "favicon unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn welcome_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>War Thunder Squadron API</title>
</head>
<body style="background-color: #002b36; color: #839496; font-family: Consolas, 'Courier New', monospace; font-size: 14px;">
<pre style="color: #2aa198;">Squad API</pre>
<div><span style="color: #ffcc00;"><strong>Running API version: {version}</strong></span></div>
<div>Welcome to the War Thunder Squadron API!</div>
<div>Routes:</div>
<ul>
    <li>/squadron/[squadronName] for squadron roster data</li>
    <li>/squadroninfo/[squadronName] for squadron stats (optional ?group=N)</li>
    <li>/version for API version</li>
</ul>
</body>
</html>
"#,
        version = API_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PageCache;
    use crate::config::Config;
    use crate::error::FetchError;
    use crate::fetch::PageFetcher;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const PROFILE: &str = r#"<html><body>
<div class="squadrons-profile__header-stat squadrons-stat">
  <ul class="squadrons-stat__item">
    <li class="squadrons-stat__item-value squadrons-stat__item-value--label">Air targets destroyed</li>
  </ul>
  <ul class="squadrons-stat__item">
    <li class="squadrons-stat__item-value squadrons-stat__item-value--label">Total</li>
    <li class="squadrons-stat__item-value">12,345</li>
    <li class="squadrons-stat__item-value">678</li>
    <li class="squadrons-stat__item-value">N/A</li>
    <li class="squadrons-stat__item-value">3.5</li>
  </ul>
</div>
<div class="squadrons-members__table">
  <div class="squadrons-members__grid-item">1</div>
  <div class="squadrons-members__grid-item">Ace</div>
  <div class="squadrons-members__grid-item">2150</div>
  <div class="squadrons-members__grid-item">47</div>
  <div class="squadrons-members__grid-item">Commander</div>
  <div class="squadrons-members__grid-item">05.03.2021</div>
</div>
</body></html>"#;

    /// Serves PROFILE for "Band Of Brothers" and fails for anything else.
    struct FixtureFetcher;

    #[async_trait]
    impl PageFetcher for FixtureFetcher {
        async fn fetch(&self, squadron: &str) -> Result<String, FetchError> {
            if squadron == "Band Of Brothers" {
                Ok(PROFILE.to_string())
            } else {
                Err(FetchError::Status {
                    squadron: squadron.to_string(),
                    status: 404,
                })
            }
        }
    }

    fn app(favicon: PathBuf) -> Router {
        let pages = SquadronPages::new(
            Arc::new(FixtureFetcher),
            Arc::new(PageCache::new()),
            &Config::default(),
        );
        router(AppState::new(Arc::new(pages), favicon))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_roster_route() {
        let (status, body) = get(app("missing.ico".into()), "/squadron/Band%20Of%20Brothers").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["Ace"]["rating"], 2150);
        assert_eq!(json["Ace"]["joindate"], "05.03.2021");
    }

    #[tokio::test]
    async fn test_stats_route_default_group() {
        let (status, body) = get(app("missing.ico".into()), "/squadroninfo/Band%20Of%20Brothers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"Air targets destroyed":12345,"Ground targets destroyed":678,"Deaths":null,"Flight Time":3.5}"#
        );
    }

    #[tokio::test]
    async fn test_stats_route_out_of_range_group() {
        let (status, body) =
            get(app("missing.ico".into()), "/squadroninfo/Band%20Of%20Brothers?group=-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_unknown_squadron_is_empty_object() {
        let (status, body) = get(app("missing.ico".into()), "/squadron/Nobody").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_version_and_welcome() {
        let (_, body) = get(app("missing.ico".into()), "/version").await;
        assert_eq!(body, format!(r#"{{"version":"{}"}}"#, API_VERSION));

        let (status, body) = get(app("missing.ico".into()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(API_VERSION));
        assert!(body.contains("/squadroninfo/"));
    }

    #[tokio::test]
    async fn test_shutdown_waits_when_signal_hook_fails() {
        let failed = async { Err::<(), _>(std::io::Error::other("no signal handler")) };
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), wait_for_shutdown(failed))
                .await;
        assert!(waited.is_err());

        let fired = async { Ok::<(), std::io::Error>(()) };
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), wait_for_shutdown(fired))
                .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_favicon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favicon.ico");
        std::fs::write(&path, [0u8, 0, 1, 0]).unwrap();

        let (status, body) = get(app(path.clone()), "/favicon.ico").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.len(), 4);

        let (status, _) = get(app(dir.path().join("none.ico")), "/favicon").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
