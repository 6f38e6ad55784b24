use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::HeaderName,
    middleware,
    routing::{get, post},
};
use medlink_his::{DynIdentityResolver, HisClient};
use medlink_search::PatientSearchService;
use medlink_storage::DynPatientStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, StorageBackend};
use crate::{handlers, middleware as app_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<PatientSearchService>,
    /// Name of the storage backend, reported by `/readyz`.
    pub backend: &'static str,
    pub tenant_header: HeaderName,
}

impl AppState {
    pub fn new(
        store: DynPatientStore,
        resolver: DynIdentityResolver,
        tenant_header: HeaderName,
    ) -> Self {
        let backend = store.backend_name();
        Self {
            search: Arc::new(PatientSearchService::new(store, resolver)),
            backend,
            tenant_header,
        }
    }
}

/// Connects the configured store and HIS client.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store: DynPatientStore = match cfg.storage.backend {
        StorageBackend::Postgres => {
            let pg = cfg.storage.postgres.to_postgres_config();
            tracing::info!(
                url = %medlink_db_postgres::redact_password(&pg.url),
                "connecting to PostgreSQL"
            );
            medlink_db_postgres::create_store(pg)
                .await
                .context("failed to initialize PostgreSQL patient store")?
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory patient store; data is lost on restart");
            medlink_db_memory::create_patient_store()
        }
    };

    let resolver: DynIdentityResolver =
        Arc::new(HisClient::new(&cfg.his).context("failed to build HIS client")?);
    let tenant_header = HeaderName::from_bytes(cfg.server.tenant_header.as_bytes())
        .context("invalid server.tenant_header")?;

    Ok(AppState::new(store, resolver, tenant_header))
}

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/patient/search", post(handlers::search_patients))
        .with_state(state)
        // Outermost last: body limit -> request id -> cors/trace -> handler
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .map_response(|res: axum::http::Response<_>| res.map(axum::body::Body::new))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(build_router(state, cfg.server.body_limit_bytes))
}

pub struct MedlinkServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<MedlinkServer> {
        let app = build_app(&self.config).await?;
        Ok(MedlinkServer {
            addr: self.addr,
            app,
        })
    }
}

impl MedlinkServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
