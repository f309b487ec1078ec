//! Photo Gallery - a PIN-protected image gallery server.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_gallery::{
    catalog::CatalogBuilder,
    config::Config,
    server::{create_router, RouterConfig},
    session::MemorySessionStore,
    source::FsImageSource,
};

/// How often expired sessions are purged from the store.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set
    let dotenv = dotenvy::dotenv();

    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    if let Err(e) = &dotenv {
        debug!("No .env file loaded: {}", e);
    }

    run_serve(config).await
}

// =============================================================================
// Serve
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let folder = config.images_folder_or_empty();

    info!("Photo Gallery v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Images folder: {}", folder.display());
    info!("  Public assets: {}", config.public_dir.display());
    info!("  Listing: {:?}", config.listing);

    // Auth status with warning if disabled
    if config.auth_enabled {
        info!(
            "  Auth: enabled ({} attempts/min per client, session TTL {}s)",
            config.pin_attempts_per_minute, config.session_ttl
        );
        if config.trust_proxy_headers {
            info!("  Clients identified by X-Forwarded-For / X-Real-IP");
        }
        if !config.cookie_secure {
            warn!("  Session cookie is not marked Secure; enable --cookie-secure behind HTTPS");
        }
    } else {
        warn!("  Auth: DISABLED - all images are publicly accessible");
        warn!("        Enable for production: --auth-enabled=true --pin-code=<pin>");
    }

    if !config.public_dir.is_dir() {
        warn!(
            "  Public directory {} not found; the front-end will not be served",
            config.public_dir.display()
        );
    }

    // Create image source and catalog builder
    let catalog = CatalogBuilder::new(FsImageSource::new(folder))
        .with_max_concurrency(config.catalog_concurrency);

    match catalog.list_names().await {
        Ok(names) => info!("  Found {} image(s)", names.len()),
        Err(e) => warn!("  Could not scan images folder: {}", e),
    }

    // Session store with periodic expiry sweep
    let sessions = Arc::new(MemorySessionStore::new(config.session_lifetime()));
    if config.auth_enabled {
        spawn_session_cleanup(Arc::clone(&sessions));
    }

    // Build router configuration
    let router_config = build_router_config(&config, sessions);

    // Create router
    let router = create_router(catalog, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Open the gallery in your browser:");
    info!("    open http://{}/", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_gallery=debug,tower_http=debug"
    } else {
        "photo_gallery=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config, sessions: Arc<MemorySessionStore>) -> RouterConfig {
    let mut router_config = if config.auth_enabled {
        RouterConfig::new(config.pin_code_or_empty(), config.session_secret_or_empty())
            .with_session_store(sessions)
            .with_pin_attempts_per_minute(config.pin_attempts_per_minute)
            .with_cookie_secure(config.cookie_secure)
            .with_trust_proxy_headers(config.trust_proxy_headers)
    } else {
        RouterConfig::without_auth()
    };

    router_config = router_config
        .with_cache_max_age(config.cache_max_age)
        .with_listing(config.listing)
        .with_public_dir(config.public_dir.clone());

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}

/// Purge expired sessions in the background.
fn spawn_session_cleanup(sessions: Arc<MemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired().await;
            if removed > 0 {
                debug!(removed, "Purged expired sessions");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
