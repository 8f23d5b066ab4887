// Notice bot entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config
// 3. Open the archive database
// 4. Build the board client
// 5. Spawn the background ingest sweep
// 6. Serve the Kakao webhook routes

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use notice_bot::board::BoardClient;
use notice_bot::config;
use notice_bot::dispatcher::Dispatcher;
use notice_bot::ingest;
use notice_bot::kakao::RandomPicker;
use notice_bot::server;
use notice_bot::store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing().context("failed to set tracing subscriber")?;
    info!("Notice bot starting up");

    // 2. Load config
    let config = Arc::new(config::load_config().context("failed to load configuration")?);
    info!(
        address = %config.board.address,
        categories = config.board.categories.len(),
        "Config loaded"
    );

    // 3. Open the archive database
    let db = Arc::new(Database::open(&config.db_path).context("failed to open database")?);
    info!("Database opened at {}", config.db_path);

    // 4. Build the board client
    let client = BoardClient::new(&config.board).context("failed to build board client")?;

    // 5. Spawn the background ingest sweep
    tokio::spawn(ingest::run(client.clone(), db.clone(), config.clone()));

    // 6. Serve the Kakao webhook routes
    let dispatcher = Arc::new(Dispatcher::new(
        config.clone(),
        client,
        db,
        Arc::new(RandomPicker),
    ));
    server::serve(dispatcher, config.server_port).await
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notice_bot=info,tower_http=info,warn")),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
