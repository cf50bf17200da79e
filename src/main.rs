use anyhow::{Context, Result};
use clap::Parser;
use district_atlas::datasets::DatasetRegistry;
use district_atlas::engine::{EarthEngine, RestEngine};
use district_atlas::services::regions::RegionCatalog;
use district_atlas::{cli, config, openapi, routes, state, static_assets};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind district-atlas listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind district-atlas listener on {addr}"))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::AtlasConfig::from_env(args.static_root)?;
    tracing::info!(?config, "loaded configuration");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.ee_timeout_seconds))
        .build()
        .context("failed to build Earth Engine HTTP client")?;
    let engine: Arc<dyn EarthEngine> = Arc::new(RestEngine::new(
        config.ee_api_base_url.clone(),
        config.ee_project.clone(),
        config.ee_access_token.clone(),
        http,
    ));
    let registry = Arc::new(DatasetRegistry::new(&config.datasets));

    // Data endpoints answer 500 until restart if this fails.
    let catalog = match RegionCatalog::load(engine.as_ref(), &registry).await {
        Ok(catalog) => {
            tracing::info!(states = catalog.states().len(), "boundary dataset loaded");
            Some(Arc::new(catalog))
        }
        Err(err) => {
            tracing::error!("failed to load boundary dataset: {err:#}");
            None
        }
    };

    let state = state::AppState {
        config: config.clone(),
        engine,
        registry,
        catalog,
    };

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(60)
            .methods(vec![axum::http::Method::POST])
            .use_headers()
            .finish()
            .context("failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();
    std::thread::spawn(move || loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
        governor_limiter.retain_recent();
    });

    let app = routes::router(state)
        .layer(GovernorLayer::new(governor_conf))
        .merge(static_assets::service(config.static_root.clone())?);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}
