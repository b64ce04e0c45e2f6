//! Course Coach — Binary Entrypoint
//! Boots the Axum HTTP server: config, tracing, demo seed, routes.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use course_coach::api::AppState;
use course_coach::{api, config, seed};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("course_coach=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = config::load()?;
    let bind = config.server.bind.clone();
    let state = AppState::new(config);

    if state.config.demo.seed {
        seed::seed_demo(&state.store);
    }

    let router = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
