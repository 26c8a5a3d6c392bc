use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing::info;

use tradesim_backend::config::AppConfig;
use tradesim_backend::logging::{self, LoggingConfig};
use tradesim_backend::state::AppState;
use tradesim_backend::{app, db, external};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env()).map_err(|e| anyhow!(e.to_string()))?;

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url, config.db_max_connections).await?;
    db::migrate(&pool).await?;

    let provider = external::build_provider(&config)?;
    let state = AppState::new(pool, provider, &config)?;
    if !state.trading.enforce_sufficient_funds {
        info!("Fund-sufficiency check on buy is DISABLED");
    }
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Trading simulator backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
