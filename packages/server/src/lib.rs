#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for crime watch.
//!
//! Serves the JSON API for crime reports, vigilante responses, SOS
//! alerts, and account sessions. Rows live in `PostgreSQL` or `SQLite`
//! (chosen by `DATABASE_URL`); credentials are checked by a
//! GoTrue-compatible identity provider.

pub mod config;
pub mod error;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_watch_database::db;
use crime_watch_dispatch::selector::ResponderSelector;
use crime_watch_session::{GoTrueClient, IdentityProvider};
use switchy_database::Database;

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Store connection.
    pub db: Arc<dyn Database>,
    /// Identity provider for login, session, and logout.
    pub identity: Arc<dyn IdentityProvider>,
    /// Picks which responders a new report is sent to.
    pub selector: Arc<dyn ResponderSelector>,
}

/// Registers the `/api` routes and the JSON/query error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error))
        .app_data(web::QueryConfig::default().error_handler(error::query_error))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/crime-reports", web::post().to(handlers::create_report))
                .route("/crime-reports", web::get().to(handlers::list_reports))
                .route("/crime-reports/{id}", web::get().to(handlers::get_report))
                .route(
                    "/vigilante-response",
                    web::post().to(handlers::update_response),
                )
                .route("/sos", web::post().to(handlers::create_sos))
                .route("/auth/register", web::post().to(handlers::register))
                .route("/auth/login", web::post().to(handlers::login))
                .route("/auth/session", web::get().to(handlers::session))
                .route("/auth/logout", web::post().to(handlers::logout))
                .route(
                    "/auth/forgot-password",
                    web::post().to(handlers::forgot_password),
                )
                .route(
                    "/auth/reset-password",
                    web::post().to(handlers::reset_password),
                ),
        );
}

/// Starts the crime watch API server.
///
/// Reads [`ServerConfig`] from the environment, connects to the store
/// (creating the schema if needed), and serves until shut down. The
/// caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if configuration is missing or
/// invalid, the store or identity client cannot be set up, or the HTTP
/// server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;

    log::info!("Connecting to database...");
    let db_conn = db::connect(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;

    let identity = GoTrueClient::new(
        config.auth_url.clone(),
        config.auth_anon_key.clone(),
        config.auth_timeout,
    )
    .map_err(std::io::Error::other)?;

    match config.dispatch_radius_km {
        Some(km) => log::info!("Dispatching to responders within {km} km"),
        None => log::info!("Dispatching to every active vigilante"),
    }

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
        identity: Arc::new(identity),
        selector: config.selector(),
    });

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
