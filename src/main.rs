use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use craft_copilot::{
    api::{ApiClient, HttpTransport},
    config::AppConfig,
    handlers::Controller,
    presenter::PagePresenter,
    routes::{router, AppState},
    view::{Document, ViewBindings},
};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    tracing::info!("Using backend at {}", config.backend_url);

    let document = Document::standard();
    let view = ViewBindings::resolve(&document).context("page is missing a required element")?;
    let transport = HttpTransport::new(config.backend_url.clone(), config.request_timeout)
        .context("failed to build HTTP client")?;
    let presenter = Arc::new(PagePresenter::new(view.notifications.clone(), view.loading.clone()));
    let controller = Arc::new(Controller::new(
        ApiClient::new(Arc::new(transport)),
        view,
        presenter,
        config.min_input_chars,
    ));

    // Initial page load: trending grid and backend status.
    let startup = controller.clone();
    tokio::spawn(async move {
        tokio::join!(startup.load_trending(), startup.check_status());
    });

    let app = router(AppState::new(controller, config.debounce)).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
