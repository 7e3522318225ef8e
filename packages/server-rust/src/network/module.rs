//! Network module with deferred startup lifecycle.
//!
//! `new()` wires the router state, `start()` binds the TCP listener, and
//! `serve()` accepts requests until shutdown. Between `start()` and
//! `serve()` the caller can log the bound port or share the shutdown
//! controller with other tasks.

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    abuse_flags_handler, category_form_handler, category_stats_handler, create_listing_handler,
    edit_listing_handler, health_handler, list_categories_handler, liveness_handler,
    readiness_handler, remove_listing_handler, update_listing_handler, AppState,
};
use super::middleware::{build_http_layers, track_in_flight};
use super::shutdown::ShutdownController;

/// Owns the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    state: AppState,
    listener: Option<TcpListener>,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            listener: None,
        }
    }

    /// Shared shutdown controller, also held by every handler.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Assembles the router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health`, `/health/live`, `/health/ready`
    /// - `GET /categories?parent=`
    /// - `GET /categories/{id}/form?sub=&model=`
    /// - `GET /categories/{id}/stats`
    /// - `POST /listings`
    /// - `PUT|DELETE /listings/{id}`
    /// - `GET /listings/{id}/edit`
    /// - `GET /moderation/flags`
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/categories", get(list_categories_handler))
            .route("/categories/{id}/form", get(category_form_handler))
            .route("/categories/{id}/stats", get(category_stats_handler))
            .route("/listings", post(create_listing_handler))
            .route(
                "/listings/{id}",
                axum::routing::put(update_listing_handler).delete(remove_listing_handler),
            )
            .route("/listings/{id}/edit", get(edit_listing_handler))
            .route("/moderation/flags", get(abuse_flags_handler))
            .layer(axum::middleware::from_fn_with_state(
                self.shutdown_controller(),
                track_in_flight,
            ))
            .layer(build_http_layers(&self.config))
            .with_state(self.state.clone())
    }

    /// Binds the TCP listener and returns the bound port, which differs from
    /// the configured one when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains.
    ///
    /// After the signal the health state moves to `Draining`, new requests
    /// get 503, and in-flight ones have `drain_timeout` to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener.take() else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = self.build_router();
        let controller = self.shutdown_controller();
        let drain_timeout = self.config.drain_timeout;

        controller.set_ready();
        info!("Serving HTTP");

        let signal_controller = Arc::clone(&controller);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                signal_controller.trigger_shutdown();
            })
            .await?;

        controller.trigger_shutdown();
        if controller.wait_for_drain(drain_timeout).await {
            info!("All requests drained");
        } else {
            warn!(
                in_flight = controller.in_flight_count(),
                "Drain timeout expired with requests still in flight"
            );
        }
        Ok(())
    }
}
