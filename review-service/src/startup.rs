use crate::config::ReviewConfig;
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::{JwtService, LocalStorage, MongoDb, Storage};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::{security_headers_middleware, UPLOADS_PREFIX},
    tracing::{make_request_span, request_id_middleware},
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Upper bound on a whole review upload request, independent of the per-file limit.
const MAX_FILES_PER_REQUEST: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub config: ReviewConfig,
    pub db: MongoDb,
    pub storage: Arc<dyn Storage>,
    pub jwt: JwtService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub async fn new(config: ReviewConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.storage.upload_dir)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize upload directory at {}: {}",
                        config.storage.upload_dir,
                        e
                    );
                    e
                })?,
        );

        let jwt = JwtService::new(&config.jwt)?;

        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );
        let register_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.register_attempts,
            config.rate_limit.register_window_seconds,
        );

        Ok(Self {
            config,
            db,
            storage,
            jwt,
            login_rate_limiter,
            register_rate_limiter,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/teacher-login", post(handlers::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/register", post(handlers::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let upload_limit = state
        .config
        .storage
        .max_file_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST);

    let protected = Router::new()
        .route("/batches", post(handlers::create_batch))
        .route("/batches/:section", get(handlers::list_batches_for_section))
        .route(
            "/studentinfo",
            get(handlers::list_student_info).post(handlers::save_student_info),
        )
        .merge(
            Router::new()
                .route("/saveReview", post(handlers::save_review))
                .route("/submitReview", post(handlers::submit_review))
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/reviews", get(handlers::list_reviews))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/forgot-password", post(handlers::forgot_password))
        .merge(login_route)
        .merge(register_route)
        .merge(protected)
        .nest_service(
            UPLOADS_PREFIX,
            ServeDir::new(&state.config.storage.upload_dir),
        )
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(state.config.cors.frontend_origin.as_deref()))
        .with_state(state)
}

/// A configured origin gets credentialed CORS; otherwise any origin, no credentials.
fn cors_layer(frontend_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match frontend_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin).allow_credentials(true),
        Some(Err(e)) => {
            tracing::error!("Invalid FRONTEND_ORIGIN, allowing any origin: {}", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
    state: AppState,
}

impl Application {
    pub async fn build(config: ReviewConfig) -> Result<Self, AppError> {
        let state = AppState::new(config).await?;

        state.db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let app = build_router(state.clone());

        let addr = state.config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
