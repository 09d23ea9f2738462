//! ccbridge server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use ccbridge_ap::{ap_router, well_known_router, ApService, ApState};
use ccbridge_api::{api_router, ApiService, ApiState};
use ccbridge_bridge::Bridge;
use ccbridge_common::metrics::{self, HTTP_REQUESTS_TOTAL};
use ccbridge_common::{config::listen_port, Config};
use ccbridge_concrnt::{derive_ccid, GatewayClient};
use ccbridge_federation::{ApClient, PersonCache};
use ccbridge_store::Store;
use ccbridge_worker::{AssociationWorker, MessageWorker};
use fred::clients::Client as RedisClient;
use fred::interfaces::{ClientLike, KeysInterface};
use fred::types::config::Config as RedisConfig;
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received SIGINT, shutting down");
        },
        () = terminate => {
            info!("received SIGTERM, shutting down");
        },
    }
}

/// Count requests per method, route and status.
async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &route, response.status().as_str()])
        .inc();
    response
}

#[derive(Clone)]
struct HealthState {
    db: Arc<DatabaseConnection>,
    redis: RedisClient,
}

async fn health(State(state): State<HealthState>) -> Response {
    if state.db.ping().await.is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "db error").into_response();
    }

    let redis_ok: Result<Option<String>, _> = state.redis.get("ccbridge:health").await;
    if redis_ok.is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "redis error").into_response();
    }

    (StatusCode::OK, "ok").into_response()
}

async fn metrics_handler() -> Response {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics::gather(),
    )
        .into_response()
}

fn redis_url(addr: &str, db: i64) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{addr}/{db}")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ccbridge=debug,tower_http=info".into()),
        )
        .init();

    info!("ccbridge {} starting", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load()?;
    config.ap_config.proxy_ccid = derive_ccid(&config.ap_config.proxy_priv)?;
    info!(proxy = %config.ap_config.proxy_ccid, "config loaded");

    if config.server.enable_trace {
        // the exporter is an external collaborator; spans are emitted via
        // tracing regardless
        info!(endpoint = %config.server.trace_endpoint, "trace export requested");
    }

    metrics::init_metrics();

    let db = ccbridge_store::init(&config.server.dsn).await?;
    info!("connected to database");

    info!("running migrations");
    ccbridge_store::migrate(&db).await?;
    info!("migrations completed");

    let redis_config = RedisConfig::from_url(&redis_url(
        &config.server.redis_addr,
        config.server.redis_db,
    ))?;
    let redis = RedisClient::new(redis_config.clone(), None, None, None);
    redis.init().await?;
    info!("connected to redis");

    let db = Arc::new(db);
    let store = Store::new(Arc::clone(&db));
    let gateway = GatewayClient::new(&config.server.gateway_addr);
    let apclient = ApClient::new(PersonCache::new(redis.clone()), config.ap_config.clone());
    let bridge = Bridge::new(store.clone(), gateway.clone(), config.ap_config.clone());

    let ap_service = ApService::new(
        store.clone(),
        gateway.clone(),
        apclient.clone(),
        bridge.clone(),
        config.node_info.clone(),
        config.ap_config.clone(),
    );
    let api_service = ApiService::new(
        store.clone(),
        gateway.clone(),
        apclient.clone(),
        bridge.clone(),
        config.ap_config.clone(),
    );

    tokio::spawn(
        MessageWorker::new(
            redis_config.clone(),
            store.clone(),
            gateway.clone(),
            apclient.clone(),
            bridge.clone(),
            config.ap_config.clone(),
        )
        .run(),
    );
    tokio::spawn(
        AssociationWorker::new(
            redis_config,
            store.clone(),
            gateway.clone(),
            apclient.clone(),
            config.ap_config.clone(),
        )
        .run(),
    );

    let ap_state = ApState {
        service: ap_service,
    };
    let api_state = ApiState {
        service: api_service,
    };
    let health_state = HealthState {
        db: Arc::clone(&db),
        redis,
    };

    let app = Router::new()
        .merge(well_known_router(ap_state.clone()))
        .nest(
            "/ap",
            ap_router(ap_state).nest("/api", api_router(api_state)),
        )
        .route("/health", get(health).with_state(health_state))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port()));
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
