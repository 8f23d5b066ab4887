// Archive ingestion: periodically copies the live board into the notices
// table so the yesterday flow can answer from history.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::board::{BoardClient, ListQuery};
use crate::config::Config;
use crate::store::Database;

/// Fetch one page of the live board and archive every record not yet stored.
/// Returns how many rows were inserted.
///
/// Pinned rows carry a label id ("공지") instead of a number and are never
/// archived. A sentinel fetch inserts nothing and is not an error — the next
/// sweep tries again.
pub async fn sync_once(client: &BoardClient, db: &Database, page_size: usize) -> Result<usize> {
    let records = client.fetch(&ListQuery::new(page_size)).await;

    let mut inserted = 0;
    for record in &records {
        let Ok(id) = record.id.parse::<i64>() else {
            continue;
        };
        if db.notice_exists(id)? {
            continue;
        }
        if db.insert_notice(id, &record.title, &record.date, &record.link, &record.writer)? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Drive [`sync_once`] on the configured interval, forever. The first sweep
/// runs immediately so the archive is warm right after startup.
pub async fn run(client: BoardClient, db: Arc<Database>, config: Arc<Config>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.ingest.interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sync_once(&client, &db, config.ingest.page_size).await {
            Ok(0) => debug!("ingest sweep found no new notices"),
            Ok(n) => info!(inserted = n, "archived new notices"),
            Err(e) => warn!(error = %e, "ingest sweep failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
