use std::process::ExitCode;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use crate::config::{Config, ConfigError};
use crate::endpoints::AppState;

mod config;
mod database;
mod endpoints;
mod model;
mod response_object;
mod validation;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Begin logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level().unwrap_or(tracing::Level::INFO))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install log subscriber: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize the store, aborting start-up if an error occurs
    let store = match database::init_database(&config).await {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Storage initialized ({:?})", config.storage);

    let cors = match cors_layer(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Outer layers run first: CORS, then the body limit, then request tracing
    let app: Router = endpoints::router(AppState {
        store,
        locale: config.locale,
    })
    .layer(TraceLayer::new_for_http())
    .layer(DefaultBodyLimit::max(config.body_limit))
    .layer(cors);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    let served = match &config.tls {
        Some(tls) => {
            // Several providers may be compiled in, so pick one before loading certificates
            let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

            let rustls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(c) => c,
                Err(e) => {
                    error!("Could not load TLS certificate {:?}: {e}", tls.cert);
                    return ExitCode::FAILURE;
                }
            };

            info!("Serving HTTPS on {}", config.bind);
            axum_server::bind_rustls(config.bind, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("Serving HTTP on {}", config.bind);
            axum_server::bind(config.bind)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    if let Err(e) = served {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

// Allow GET, POST, and OPTIONS with a JSON content-type, from the configured origins or any
fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    let origins = if config.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let values = config
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                    key: "cors_origins",
                    value: origin.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(origins))
}

async fn shutdown_on_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for Ctrl-C: {e}");
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
                error!("Could not listen for SIGTERM: {e}");
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

    info!("Shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
