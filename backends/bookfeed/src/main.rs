use std::net::SocketAddr;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use bookfeed::{config::Config, db, routes, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(config.log_format);

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to the database")?;

    db::prepare_db(&pool)
        .await
        .context("failed to prepare the database schema")?;

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR {}", config.bind_addr))?;

    let app = routes::generate_routes(AppState::new(pool, &config), config.rate_limit_per_second);

    info!(%addr, "bookfeed listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
