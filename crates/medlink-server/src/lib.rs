//! HTTP server for Medlink patient search.
//!
//! Routes:
//!
//! - `GET /healthz`, `GET /readyz`
//! - `POST /patient/search`: tenant from the configured header, criteria
//!   from the JSON body

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod tenant;

pub use config::AppConfig;
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{AppState, MedlinkServer, ServerBuilder, build_app, build_router, build_state};
