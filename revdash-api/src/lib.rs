//! revdash-api library - review dashboard HTTP service
//!
//! Fetches raw reviews from Hostaway (or the fallback dataset) and Google
//! Places, runs them through the revdash-common core, and serves the
//! manager dashboard, the public approved-only view and the approval action.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use revdash_common::approval::{ApprovalStore, JsonFileApprovalStore, SqliteApprovalStore};
use revdash_common::config::{ApprovalBackend, TomlConfig};

pub mod api;
pub mod clients;
pub mod error;

pub use error::{ApiError, ApiResult};

use clients::{GooglePlacesClient, HostawayClient};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TomlConfig>,
    /// Durable home of the `approved` flags
    pub approvals: Arc<dyn ApprovalStore>,
    /// `None` when no Hostaway API key is configured
    pub hostaway: Option<Arc<HostawayClient>>,
    /// `None` when no Google Places API key is configured
    pub google: Option<Arc<GooglePlacesClient>>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create application state, building the remote clients that have credentials
    pub fn new(config: TomlConfig, approvals: Arc<dyn ApprovalStore>) -> Self {
        let hostaway = match HostawayClient::new(&config.hostaway) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                info!("Hostaway client disabled: {}", e);
                None
            }
        };

        let google = match GooglePlacesClient::new(&config.google) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                info!("Google Places client disabled: {}", e);
                None
            }
        };

        Self {
            config: Arc::new(config),
            approvals,
            hostaway,
            google,
            startup_time: chrono::Utc::now(),
        }
    }
}

/// Open the approval store selected by `[approvals] backend`
pub async fn open_approval_store(
    config: &TomlConfig,
) -> revdash_common::Result<Arc<dyn ApprovalStore>> {
    let store: Arc<dyn ApprovalStore> = match config.approvals.backend {
        ApprovalBackend::JsonFile => {
            if !config.dataset.path.exists() {
                warn!(
                    "Review dataset not found at {} (approvals will report not found)",
                    config.dataset.path.display()
                );
            }
            Arc::new(JsonFileApprovalStore::new(config.dataset.path.clone()))
        }
        ApprovalBackend::Sqlite => {
            Arc::new(SqliteApprovalStore::open(&config.approvals.sqlite_path).await?)
        }
    };

    info!("Approval store: {}", store.backend());
    Ok(store)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::review_routes())
        .merge(api::google_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
