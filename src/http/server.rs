//! API server setup.
//!
//! # Responsibilities
//! - Wire subsystems together (catalog, breakers, workflow, aggregator)
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, bearer auth)
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::breaker::{BreakerPolicy, BreakerRegistry};
use crate::config::loader::ConfigError;
use crate::config::schema::GateConfig;
use crate::config::validation::validate_config;
use crate::config::SlotTable;
use crate::health::HealthAggregator;
use crate::http::auth::bearer_auth;
use crate::http::handlers;
use crate::schema::SchemaCatalog;
use crate::workflow::{ActivationWorkflow, ConfigStore, HttpProbe, HttpStore, MemoryStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<ActivationWorkflow>,
    pub aggregator: Arc<HealthAggregator>,
    pub breakers: Arc<BreakerRegistry>,
    pub catalog: Arc<SchemaCatalog>,
    pub api_key: Arc<str>,
}

/// HTTP server for the resilience core.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Validate the configuration and wire up all subsystems.
    pub fn new(config: GateConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let catalog = Arc::new(SchemaCatalog::with_declared(&config.schemas));
        let slots = Arc::new(SlotTable::from_config(&config.slots));

        let policy = BreakerPolicy::from(config.breaker);
        let breakers = Arc::new(BreakerRegistry::with_slots(
            policy,
            config.slots.iter().map(|s| s.name.as_str()),
        ));

        let store: Arc<dyn ConfigStore> = match &config.persistence.backend_url {
            Some(url) => Arc::new(HttpStore::new(
                url.clone(),
                config.persistence.backend_token.clone(),
            )),
            None => Arc::new(MemoryStore::new()),
        };

        let probe = Arc::new(HttpProbe::new(Duration::from_secs(config.probe.timeout_secs)));

        let workflow = Arc::new(ActivationWorkflow::new(
            probe,
            store,
            catalog.clone(),
            breakers.clone(),
            slots.clone(),
        ));
        let aggregator = Arc::new(HealthAggregator::new(breakers.clone(), slots));

        let state = AppState {
            workflow,
            aggregator,
            breakers,
            catalog,
            api_key: Arc::from(config.api.api_key.as_str()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/status", get(handlers::get_status))
            .route("/api/schemas/{provider_type}", get(handlers::get_schema))
            .route("/api/slots", get(handlers::list_slots))
            .route("/api/slots/{slot}/test", post(handlers::test_slot))
            .route(
                "/api/slots/{slot}/config",
                get(handlers::get_config).post(handlers::save_config),
            )
            .route("/api/slots/{slot}/health", get(handlers::get_health))
            .route("/api/slots/{slot}/refresh", post(handlers::refresh_health))
            .route("/api/slots/{slot}/acquire", post(handlers::acquire_slot))
            .route("/api/slots/{slot}/outcome", post(handlers::report_outcome))
            .layer(middleware::from_fn_with_state(state.clone(), bearer_auth))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.api.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "API server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

/// Request ID generation (UUID v4) for the `x-request-id` header.
#[derive(Clone, Copy, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
