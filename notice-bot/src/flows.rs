// Incremental selection: which notices a user still needs to see.

use chrono::Local;
use tracing::{debug, warn};

use crate::board::{BoardClient, ListQuery, NoticeRecord};
use crate::kakao::{self, Card};
use crate::store::Database;

// ---------------------------------------------------------------------------
// Day selection
// ---------------------------------------------------------------------------

/// Which day a "show me notices" command targets. Anything other than the
/// literal `"today"` parameter maps to Yesterday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Today,
    Yesterday,
}

impl When {
    pub fn from_param(param: &str) -> Self {
        if param == "today" {
            When::Today
        } else {
            When::Yesterday
        }
    }
}

/// Today's date stamp in the board's `YY.MM.DD` format.
pub fn today_stamp() -> String {
    Local::now().format("%y.%m.%d").to_string()
}

/// Yesterday's date stamp in the board's `YY.MM.DD` format.
pub fn yesterday_stamp() -> String {
    (Local::now() - chrono::Duration::days(1))
        .format("%y.%m.%d")
        .to_string()
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Prefix of `records` dated `now`.
///
/// Walks in order and stops at the first record whose date differs — the
/// board sorts newest-first with same-day items contiguous at the front, so
/// everything past that point is older.
pub fn take_today<'a>(records: &'a [NoticeRecord], now: &str) -> &'a [NoticeRecord] {
    let end = records
        .iter()
        .position(|record| record.date != now)
        .unwrap_or(records.len());
    &records[..end]
}

/// Live notices posted today, formatted as cards.
///
/// On a sentinel fetch the result is an empty set — the dispatcher renders
/// its placeholder for that, deliberately weaker than the probe's timeout
/// card. The watermark advances to the first *fetched* record's id exactly
/// once per invocation, regardless of how many records were accepted — even
/// zero.
pub async fn today_notices(
    client: &BoardClient,
    db: &Database,
    user_id: &str,
    page_size: usize,
    now: &str,
) -> Vec<Card> {
    let records = client.fetch(&ListQuery::new(page_size)).await;

    let Some(first) = records.first() else {
        return Vec::new();
    };

    let cards = take_today(&records, now)
        .iter()
        .map(|record| kakao::notice_card(&record.title, &record.writer, None, &record.link))
        .collect();

    advance_watermark(db, user_id, &first.id);

    cards
}

/// Historical notices for `date` from the archive. No watermark mutation.
pub fn yesterday_notices(db: &Database, date: &str) -> Vec<Card> {
    match db.notices_by_date(date) {
        Ok(rows) => rows
            .iter()
            .map(|notice| kakao::notice_card(&notice.title, &notice.writer, None, &notice.link))
            .collect(),
        Err(e) => {
            warn!(date, error = %e, "failed to read archived notices");
            Vec::new()
        }
    }
}

/// The single most recent live notice, with its date. Independent of the
/// day state — always a page-size-1 fetch.
pub async fn latest_notice(client: &BoardClient) -> Option<(NoticeRecord, Card)> {
    let records = client.fetch(&ListQuery::new(1)).await;
    let record = records.into_iter().next()?;
    let card = kakao::notice_card(&record.title, &record.writer, None, &record.link);
    Some((record, card))
}

/// Overwrite the user's watermark with `notice_id` when it is numeric.
/// Pinned rows carry label ids and never become watermarks. Store failures
/// are logged, not propagated — a stale watermark is recoverable, a dropped
/// reply is not.
pub fn advance_watermark(db: &Database, user_id: &str, notice_id: &str) {
    match notice_id.parse::<i64>() {
        Ok(id) => {
            if let Err(e) = db.set_last_seen(user_id, id) {
                warn!(user_id, notice_id = id, error = %e, "failed to advance watermark");
            }
        }
        Err(_) => {
            debug!(notice_id, "skipping watermark for non-numeric notice id");
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, date: &str) -> NoticeRecord {
        NoticeRecord {
            id: id.to_string(),
            title: format!("공지 {id}"),
            date: date.to_string(),
            writer: "학사팀".to_string(),
            link: format!("http://board/?articleNo={id}"),
        }
    }

    #[test]
    fn when_maps_only_today_literal() {
        assert_eq!(When::from_param("today"), When::Today);
        assert_eq!(When::from_param("yesterday"), When::Yesterday);
        assert_eq!(When::from_param("tomorrow"), When::Yesterday);
        assert_eq!(When::from_param(""), When::Yesterday);
        assert_eq!(When::from_param("Today"), When::Yesterday);
    }

    #[test]
    fn take_today_stops_at_first_older_record() {
        let records = vec![
            record("5", "21.03.02"),
            record("4", "21.03.02"),
            record("3", "21.03.02"),
            record("2", "21.03.01"),
            record("1", "21.03.01"),
        ];
        let todays = take_today(&records, "21.03.02");
        assert_eq!(todays.len(), 3);
        assert_eq!(todays[0].id, "5");
        assert_eq!(todays[2].id, "3");
    }

    #[test]
    fn take_today_empty_when_newest_is_older() {
        let records = vec![record("2", "21.03.01"), record("1", "21.02.28")];
        assert!(take_today(&records, "21.03.02").is_empty());
    }

    #[test]
    fn take_today_takes_all_when_everything_matches() {
        let records = vec![record("2", "21.03.02"), record("1", "21.03.02")];
        assert_eq!(take_today(&records, "21.03.02").len(), 2);
    }

    #[test]
    fn take_today_ignores_later_same_day_stragglers() {
        // Same-day items are assumed contiguous at the front; a matching date
        // after an older record is past the cutoff and excluded.
        let records = vec![
            record("3", "21.03.02"),
            record("2", "21.03.01"),
            record("1", "21.03.02"),
        ];
        assert_eq!(take_today(&records, "21.03.02").len(), 1);
    }

    #[test]
    fn advance_watermark_writes_numeric_ids() {
        let db = Database::open(":memory:").unwrap();
        advance_watermark(&db, "u", "12345");
        assert_eq!(db.last_seen("u").unwrap(), Some(12345));
    }

    #[test]
    fn advance_watermark_skips_pinned_label_ids() {
        let db = Database::open(":memory:").unwrap();
        db.set_last_seen("u", 10).unwrap();
        advance_watermark(&db, "u", "공지");
        assert_eq!(db.last_seen("u").unwrap(), Some(10));
    }

    #[test]
    fn yesterday_notices_formats_archived_rows() {
        let db = Database::open(":memory:").unwrap();
        db.insert_notice(2, "둘째", "21.03.01", "http://x/2", "장학팀")
            .unwrap();
        db.insert_notice(1, "첫째", "21.03.01", "http://x/1", "학사팀")
            .unwrap();

        let cards = yesterday_notices(&db, "21.03.01");
        assert_eq!(cards.len(), 2);
        // Archive order is descending id.
        assert_eq!(cards[0].title, "둘째");
        assert_eq!(cards[0].description.as_deref(), Some("장학팀"));
        assert_eq!(cards[1].title, "첫째");
    }

    #[test]
    fn yesterday_notices_empty_for_unarchived_date() {
        let db = Database::open(":memory:").unwrap();
        assert!(yesterday_notices(&db, "21.03.01").is_empty());
    }

    #[test]
    fn date_stamps_use_board_format() {
        let today = today_stamp();
        assert_eq!(today.len(), 8);
        assert_eq!(today.as_bytes()[2], b'.');
        assert_eq!(today.as_bytes()[5], b'.');
        assert_ne!(today, yesterday_stamp());
    }
}
