use anyhow::Context;
use clap::Parser;
use cookbook::{
    api::{create_router, AppState},
    cli::{commands, Cli, Commands},
    config::Settings,
    cookbook::{CookbookStore, Reloader},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cookbook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env().context("Failed to load settings")?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(host) = host {
                settings.server.host = host;
            }
            settings.validate()?;
            serve(settings).await?;
        }
        Commands::Check { path } => {
            let folder = folder(&mut settings, path)?;
            let summary = tokio::task::spawn_blocking(move || commands::check(&folder))
                .await
                .context("Check task failed")??;
            if !summary.is_ok() {
                std::process::exit(1);
            }
        }
        Commands::Search { query, lang, path } => {
            let folder = folder(&mut settings, path)?;
            let results = tokio::task::spawn_blocking(move || {
                commands::search(&folder, &query, lang.as_deref())
            })
            .await
            .context("Search task failed")??;
            commands::print_search_results(&results);
        }
    }

    Ok(())
}

/// Recipe folder for one-shot commands, `--path` winning over the environment
fn folder(settings: &mut Settings, path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = path {
        settings.cookbook.location = path;
    }
    settings.validate()?;
    Ok(settings.cookbook.location.clone())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    info!("Starting {}", settings.cookbook.site_name);
    info!("Recipes: {}", settings.cookbook.location.display());
    info!("Server: {}:{}", settings.server.host, settings.server.port);

    let (store, report) = CookbookStore::open(&settings.cookbook.location)
        .await
        .context("Failed to load cookbook")?;
    report.log();
    if !report.errors.is_empty() {
        warn!("Serving without {} broken recipes", report.errors.len());
    }

    if let Some(interval) = settings.cookbook.reload_interval_seconds {
        let _reloader_handle = Reloader::new(store.clone(), interval).start();
    }

    let state = AppState {
        store,
        settings: settings.clone(),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}
