use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Method,
    http::Request,
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use dotenvy::dotenv;
use jr_common::cache::{MemoryCache, ResponseCache};
use jr_common::db::{create_pool_from_url, run_migrations, PgCache, PgPool};
use jr_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use jr_common::matching::{MatchConfig, MatchEngine};
use jr_common::providers::{JSearchProvider, JobProvider, TheirStackProvider};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod ratelimit;

use auth::{AuthConfig, AuthMode};
use error::ApiError;
use handlers::{health, jobs};
use ratelimit::{RateCounter, RateLimitConfig, SlidingWindowCounter};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "jr-api", about = "HTTP API for job search aggregation")]
struct Cli {
    /// PostgreSQL connection string for the response cache; in-memory when unset
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// API key for X-API-Key authentication
    #[arg(long, env = "JR_API_KEY")]
    api_key: Option<String>,

    /// Authentication mode: api_key | jwt
    #[arg(long, env = "AUTH_MODE", default_value = "api_key", value_enum)]
    auth_mode: AuthMode,

    /// JWT secret for AUTH_MODE=jwt
    #[arg(long, env = "JR_JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "JR_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// RapidAPI key for the JSearch provider
    #[arg(long, env = "RAPID_API_KEY")]
    rapidapi_key: Option<String>,

    /// API key for the TheirStack provider
    #[arg(long, env = "THEIRSTACK_API_KEY")]
    theirstack_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub rapidapi_key: Option<String>,
    pub theirstack_key: Option<String>,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "JR_CORS_ORIGINS must list explicit origins when credentials are enabled".into(),
            ));
        }

        let auth = AuthConfig {
            mode: cli.auth_mode,
            api_key: cli.api_key,
            jwt_secret: cli.jwt_secret,
        };

        let blank = |value: &Option<String>| {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        };
        match auth.mode {
            AuthMode::ApiKey if blank(&auth.api_key) => {
                return Err(ApiError::BadRequest(
                    "JR_API_KEY is required when AUTH_MODE=api_key".into(),
                ));
            }
            AuthMode::Jwt if blank(&auth.jwt_secret) => {
                return Err(ApiError::BadRequest(
                    "JR_JWT_SECRET is required when AUTH_MODE=jwt".into(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            database_url: cli.database_url,
            port: cli.port,
            cors_origins,
            auth,
            rapidapi_key: cli.rapidapi_key,
            theirstack_key: cli.theirstack_key,
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            database_url: None,
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
            rapidapi_key: None,
            theirstack_key: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: Arc<MatchEngine>,
    pub cache: Arc<dyn ResponseCache>,
    pub pool: Option<PgPool>,
    pub jsearch: Option<Arc<dyn JobProvider>>,
    pub theirstack: Option<Arc<dyn JobProvider>>,
    pub(crate) counter: Arc<dyn RateCounter>,
    pub rate_limits: RateLimitConfig,
    pub readiness: Arc<std::sync::atomic::AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ])
        .allow_credentials(true)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/jobs/jsearch", post(jobs::search_jsearch))
        .route("/jobs/theirstack", post(jobs::search_theirstack));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::enforce_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

pub fn test_state(api_key: &str) -> SharedState {
    let auth = AuthConfig {
        mode: AuthMode::ApiKey,
        api_key: Some(api_key.to_string()),
        jwt_secret: None,
    };

    Arc::new(AppState {
        config: AppConfig::for_tests(auth),
        engine: Arc::new(MatchEngine::new(MatchConfig::default())),
        cache: Arc::new(MemoryCache::default()),
        pool: None,
        jsearch: None,
        theirstack: None,
        counter: Arc::new(SlidingWindowCounter::default()),
        rate_limits: RateLimitConfig::default(),
        readiness: Arc::new(std::sync::atomic::AtomicBool::new(true)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn base_cli() -> Cli {
        Cli {
            database_url: None,
            port: 3001,
            api_key: Some("test-key".into()),
            auth_mode: AuthMode::ApiKey,
            jwt_secret: None,
            cors_origins: "http://localhost:3000".into(),
            rapidapi_key: None,
            theirstack_key: None,
        }
    }

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(SetRequestIdLayer::new(
                HeaderName::from_static("x-request-id"),
                MakeRequestUuid::default(),
            ));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn api_key_mode_requires_a_key() {
        let cli = Cli {
            api_key: None,
            ..base_cli()
        };

        assert!(matches!(
            AppConfig::from_cli(cli),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let cli = Cli {
            api_key: Some("   ".into()),
            ..base_cli()
        };

        assert!(matches!(
            AppConfig::from_cli(cli),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn jwt_mode_requires_a_secret() {
        let cli = Cli {
            auth_mode: AuthMode::Jwt,
            jwt_secret: None,
            ..base_cli()
        };

        assert!(matches!(
            AppConfig::from_cli(cli),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let cli = Cli {
            cors_origins: "*".into(),
            ..base_cli()
        };

        assert!(matches!(
            AppConfig::from_cli(cli),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cli = Cli {
            cors_origins: "http://a.example, http://b.example ,".into(),
            ..base_cli()
        };

        let config = AppConfig::from_cli(cli).unwrap();

        assert_eq!(
            config.cors_origins,
            vec!["http://a.example", "http://b.example"]
        );
    }

    #[test]
    fn provider_keys_stay_optional() {
        let config = AppConfig::from_cli(base_cli()).unwrap();

        assert!(config.rapidapi_key.is_none());
        assert!(config.theirstack_key.is_none());
    }
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;

    let (pool, cache) = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool_from_url(url)
                .map_err(|err| ApiError::Database(format!("failed to create pool: {err}")))?;
            run_migrations(&pool)
                .await
                .map_err(|err| ApiError::Database(format!("failed to run migrations: {err}")))?;
            let cache: Arc<dyn ResponseCache> = Arc::new(PgCache::new(pool.clone()));
            (Some(pool), cache)
        }
        None => {
            info!("DATABASE_URL not set; caching responses in memory");
            let cache: Arc<dyn ResponseCache> = Arc::new(MemoryCache::default());
            (None, cache)
        }
    };

    let client = reqwest::Client::builder()
        .build()
        .map_err(|err| ApiError::Internal(format!("failed to build http client: {err}")))?;

    let jsearch = config.rapidapi_key.as_deref().map(|key| {
        Arc::new(JSearchProvider::new(client.clone(), key)) as Arc<dyn JobProvider>
    });
    let theirstack = config.theirstack_key.as_deref().map(|key| {
        Arc::new(TheirStackProvider::new(client.clone(), key)) as Arc<dyn JobProvider>
    });

    if jsearch.is_none() {
        info!("RAPID_API_KEY not set; /api/jobs/jsearch will report unavailable");
    }
    if theirstack.is_none() {
        info!("THEIRSTACK_API_KEY not set; /api/jobs/theirstack will report unavailable");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        engine: Arc::new(MatchEngine::new(MatchConfig::from_env())),
        cache,
        pool,
        jsearch,
        theirstack,
        counter: Arc::new(SlidingWindowCounter::default()),
        rate_limits: RateLimitConfig::from_env(),
        readiness: Arc::new(std::sync::atomic::AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, auth_mode = ?config.auth.mode, "jr-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
