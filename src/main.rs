mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Settings;
use crate::core::MatchEngine;
use routes::matches::AppState;
use services::{
    escalation_pair, Directory, HttpDirectory, HttpMailer, IncidentStore, NotificationDispatcher,
    NotificationStore, PgStore, RedisPush,
};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST),
        )
        .content_type("application/json")
        .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Wingmate core service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize the directory client
    let directory: Arc<dyn Directory> = Arc::new(HttpDirectory::new(
        settings.directory.endpoint,
        settings.directory.api_key,
        settings.directory.user_cache_size.unwrap_or(1000),
        settings.directory.user_cache_ttl_secs.unwrap_or(300),
    ));

    info!("Directory client initialized");

    // Initialize the push channel
    let push = match RedisPush::connect(&settings.push.redis_url).await {
        Ok(push) => Arc::new(push),
        Err(e) => {
            error!("Failed to connect to Redis ({}), push channel unavailable", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "Redis connection required",
            ));
        }
    };

    info!("Push channel initialized");

    // Initialize the record store
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let db_min_conn = settings.database.min_connections.unwrap_or(1);

    let store = Arc::new(
        PgStore::connect(&settings.database.url, db_max_conn, db_min_conn)
            .await
            .unwrap_or_else(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                panic!("PostgreSQL connection error: {}", e);
            }),
    );

    info!("Record store initialized (max: {} connections)", db_max_conn);

    // Initialize the mailer
    let mailer = Arc::new(HttpMailer::new(
        settings.mailer.endpoint,
        settings.mailer.api_key,
        settings.mailer.sender,
    ));

    // Wire the dispatcher and the escalation orchestrator
    let notifications: Arc<dyn NotificationStore> = store.clone();
    let incidents: Arc<dyn IncidentStore> = store.clone();

    let dispatcher = Arc::new(NotificationDispatcher::new(
        notifications.clone(),
        push,
        mailer,
        directory.clone(),
    ));

    let (escalation, worker) = escalation_pair(
        incidents,
        directory.clone(),
        dispatcher.clone(),
        settings.escalation.queue_depth,
    );

    tokio::spawn(worker.run());

    info!("Escalation worker started (queue depth: {})", settings.escalation.queue_depth);

    // Initialize the match engine
    let engine = Arc::new(MatchEngine::new(
        directory.clone(),
        settings.matching.default_limit as usize,
        settings.matching.max_limit as usize,
    ));

    // Build application state
    let app_state = AppState {
        engine,
        dispatcher,
        escalation,
        directory,
        notifications,
        store,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
