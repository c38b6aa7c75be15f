//! Gateway lifecycle: `new()` wires state, `start()` binds the listener,
//! `serve()` accepts requests until shutdown and then drains.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{books, health_handler, liveness_handler, readiness_handler, users, AppState};
use super::middleware::{admit_requests, build_http_layers};
use super::shutdown::ShutdownController;
use crate::repository::CachedBookRepository;
use crate::rpc::UserClient;

/// Owns the listener and everything the HTTP handlers share.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    books: Arc<CachedBookRepository>,
    users: Option<Arc<UserClient>>,
}

impl NetworkModule {
    #[must_use]
    pub fn new(config: NetworkConfig, books: Arc<CachedBookRepository>) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            books,
            users: None,
        }
    }

    /// Mounts the account routes, proxied through `users`.
    #[must_use]
    pub fn with_user_client(mut self, users: Arc<UserClient>) -> Self {
        self.users = Some(users);
        self
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Routes:
    /// - `GET /health`, `/health/live`, `/health/ready`
    /// - `GET|POST /api/v1/books`, `GET|DELETE /api/v1/books/{id}`
    /// - `GET /api/v1/books/by-{author,publisher,language,genre}/{value}`
    /// - with a user client: `/api/v1/auth/{sign-up,sign-in,refresh}`,
    ///   `GET /api/v1/users/me`, `GET /api/v1/users/{id}`, `PUT /api/v1/users`
    pub fn build_router(&self) -> Router {
        let state = AppState {
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
            books: Arc::clone(&self.books),
            users: self.users.clone(),
        };

        let mut api = Router::new()
            .route("/api/v1/books", get(books::list_books).post(books::create_book))
            .route(
                "/api/v1/books/{id}",
                get(books::get_book).delete(books::delete_book),
            )
            .route("/api/v1/books/by-author/{author}", get(books::books_by_author))
            .route(
                "/api/v1/books/by-publisher/{publisher}",
                get(books::books_by_publisher),
            )
            .route(
                "/api/v1/books/by-language/{language}",
                get(books::books_by_language),
            )
            .route("/api/v1/books/by-genre/{genre}", get(books::books_by_genre));

        if self.users.is_some() {
            api = api
                .route("/api/v1/auth/sign-up", post(users::sign_up))
                .route("/api/v1/auth/sign-in", post(users::sign_in))
                .route("/api/v1/auth/refresh", post(users::refresh))
                .route("/api/v1/users", put(users::update_user))
                .route("/api/v1/users/me", get(users::me))
                .route("/api/v1/users/{id}", get(users::get_user));
        }

        let api = api.route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&self.shutdown),
            admit_requests,
        ));

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .merge(api)
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the listener and returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let port = listener.local_addr()?.port();
        info!(host = %self.config.host, port, "listener bound");
        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then waits up to the configured
    /// drain timeout for in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if [`start`](Self::start) was not called or the
    /// server fails with an I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener.take() else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = self.build_router();
        let controller = Arc::clone(&self.shutdown);
        let stop = Arc::clone(&self.shutdown);

        controller.set_ready();
        info!(
            cache = self.books.cache_name(),
            user_service = self.users.is_some(),
            "serving"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                stop.trigger_shutdown();
            })
            .await?;

        controller.trigger_shutdown();
        if controller.wait_for_drain(self.config.drain_timeout).await {
            info!("drained");
        } else {
            warn!(
                in_flight = controller.in_flight_count(),
                "drain timeout expired with requests in flight"
            );
        }
        Ok(())
    }
}
