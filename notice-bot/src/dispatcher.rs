// Command dispatch: maps an inbound chat command onto a flow and assembles
// the final payload.
//
// Every entry point resolves to a valid payload — transport failures become
// the timeout message, empty results become the placeholder card, bad
// parameters become nudge replies. Nothing here returns an error to the
// HTTP boundary.

use std::sync::Arc;

use tracing::warn;

use crate::board::{BoardClient, ListQuery};
use crate::config::Config;
use crate::flows::{self, When};
use crate::kakao::{self, Button, Card, ImagePicker, Payload, QuickReply};
use crate::store::Database;

/// Visible cap on list cards; everything past this folds into the trailing
/// "more" button.
const LIST_CAP: usize = 5;

/// Visible cap on carousel cards.
const CAROUSEL_CAP: usize = 10;

/// Suggestion chips for the category prompt, in board menu order.
const CATEGORY_SUGGESTIONS: [&str; 11] = [
    "학사",
    "학사일정",
    "비교과",
    "장학",
    "취업",
    "사무",
    "행사",
    "파란학기제",
    "학술",
    "입학",
    "기타",
];

pub struct Dispatcher {
    config: Arc<Config>,
    client: BoardClient,
    db: Arc<Database>,
    picker: Arc<dyn ImagePicker>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        client: BoardClient,
        db: Arc<Database>,
        picker: Arc<dyn ImagePicker>,
    ) -> Self {
        Self {
            config,
            client,
            db,
            picker,
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// "Show me today's / yesterday's notices."
    pub async fn day_notices(&self, user_id: &str, when: &str) -> Payload {
        self.touch_user(user_id);

        let (stamp, day_label, cards) = match When::from_param(when) {
            When::Today => {
                if !self.client.check_connection().await {
                    return kakao::timeout_message();
                }
                let stamp = flows::today_stamp();
                let cards = flows::today_notices(
                    &self.client,
                    &self.db,
                    user_id,
                    self.config.board.today_page_size,
                    &stamp,
                )
                .await;
                (stamp, "오늘", cards)
            }
            When::Yesterday => {
                let stamp = flows::yesterday_stamp();
                let cards = flows::yesterday_notices(&self.db, &stamp);
                (stamp, "이전", cards)
            }
        };

        let quick_replies = vec![
            QuickReply::message("어제", "어제 공지 보여줘"),
            QuickReply::message("오늘", "오늘 공지 보여줘"),
        ];
        self.assemble_list(
            format!("{stamp}) {day_label} 공지"),
            cards,
            self.config.board.address.clone(),
            Some(quick_replies),
        )
    }

    /// "Show me notices in this category."
    pub async fn category_notices(&self, user_id: &str, label: &str) -> Payload {
        self.touch_user(user_id);

        let label = label.replace(' ', "");
        let Some(&category_id) = self.config.board.categories.get(&label) else {
            return kakao::simple_text("잘못된 카테고리입니다.", None);
        };

        if !self.client.check_connection().await {
            return kakao::timeout_message();
        }

        let query =
            ListQuery::new(self.config.board.category_page_size).with_category(category_id);
        let records = self.client.fetch(&query).await;

        if let Some(first) = records.first() {
            flows::advance_watermark(&self.db, user_id, &first.id);
        }

        let cards = records
            .iter()
            .map(|r| kakao::notice_card(&r.title, &r.writer, Some(&r.date), &r.link))
            .collect();

        self.assemble_list(
            format!("{label} 공지"),
            cards,
            self.client.list_url(&query),
            None,
        )
    }

    /// "Search notices for this keyword."
    pub async fn search_notices(&self, user_id: &str, keyword: Option<&str>) -> Payload {
        self.touch_user(user_id);

        let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
            let quick_replies = vec![QuickReply::message("2021 검색", "2021 검색")];
            return kakao::simple_text(
                "2021 검색과 같이 검색어를 같이 입력하세요.",
                Some(quick_replies),
            );
        };

        if !self.client.check_connection().await {
            return kakao::timeout_message();
        }

        let query =
            ListQuery::new(self.config.board.search_page_size).with_keyword(keyword);
        let records = self.client.fetch(&query).await;

        if let Some(first) = records.first() {
            flows::advance_watermark(&self.db, user_id, &first.id);
        }

        let cards = records
            .iter()
            .map(|r| kakao::notice_card(&r.title, &r.writer, Some(&r.date), &r.link))
            .collect();

        let short: String = keyword.chars().take(12).collect();
        let quick_replies = vec![
            QuickReply::message("등록금 검색", "등록금 검색"),
            QuickReply::message("이벤트 검색", "이벤트 검색"),
            QuickReply::message("코로나 검색", "코로나 검색"),
        ];
        self.assemble_list(
            format!("{short} 결과"),
            cards,
            self.client.list_url(&query),
            Some(quick_replies),
        )
    }

    /// "Show me the single most recent notice."
    pub async fn latest(&self, user_id: &str) -> Payload {
        self.touch_user(user_id);

        if !self.client.check_connection().await {
            return kakao::timeout_message();
        }

        match flows::latest_notice(&self.client).await {
            Some((record, card)) => {
                flows::advance_watermark(&self.db, user_id, &record.id);
                kakao::list_card(
                    format!("{} 공지", record.date),
                    vec![card],
                    vec![Button::share("공유하기")],
                    None,
                )
            }
            None => kakao::list_card(
                "아주대학교 공지",
                vec![kakao::placeholder_card(&self.config.images.placeholder)],
                vec![Button::share("공유하기")],
                None,
            ),
        }
    }

    /// "Show me the academic calendar." Carousel of basicCards, capped at 10.
    pub fn schedule(&self, user_id: &str) -> Payload {
        self.touch_user(user_id);

        let items = match self.db.all_schedules() {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "failed to read schedules");
                Vec::new()
            }
        };

        if items.is_empty() {
            return kakao::simple_text("등록된 학사일정이 없어요.", None);
        }

        let cards = items
            .iter()
            .take(CAROUSEL_CAP)
            .map(|item| {
                kakao::carousel_card(
                    &item.content,
                    &format!("{} ~ {}", item.start_date, item.end_date),
                    &self.config.images.carousel_pool,
                    self.picker.as_ref(),
                )
            })
            .collect();

        kakao::carousel(cards)
    }

    /// "What kinds of notices are there?" Fixed suggestion chips.
    pub fn ask_category(&self) -> Payload {
        let quick_replies = CATEGORY_SUGGESTIONS
            .iter()
            .map(|c| QuickReply::message(*c, *c))
            .collect();
        kakao::simple_text("무슨 공지를 보고 싶으신가요?", Some(quick_replies))
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    /// Cap `cards` to the visible limit and wrap them in a listCard.
    ///
    /// When the full list exceeds the cap, exactly one trailing "(N−5)개
    /// 더보기" button deep-links to `more_url`, the equivalent filtered view
    /// on the live site. An empty list becomes exactly one placeholder card.
    fn assemble_list(
        &self,
        header: String,
        cards: Vec<Card>,
        more_url: String,
        quick_replies: Option<Vec<QuickReply>>,
    ) -> Payload {
        let total = cards.len();

        let mut items: Vec<Card> = cards.into_iter().take(LIST_CAP).collect();
        if items.is_empty() {
            items.push(kakao::placeholder_card(&self.config.images.placeholder));
        }

        let mut buttons = vec![Button::share("공유하기")];
        if total > LIST_CAP {
            buttons.push(Button::web_link(
                format!("{}개 더보기", total - LIST_CAP),
                more_url,
            ));
        }

        kakao::list_card(header, items, buttons, quick_replies)
    }

    /// Get-or-create the user row. Flows that only render still touch the
    /// pointer so it exists before any later read.
    fn touch_user(&self, user_id: &str) {
        if user_id.is_empty() {
            return;
        }
        if let Err(e) = self.db.get_or_create_user(user_id) {
            warn!(user_id, error = %e, "failed to ensure user row");
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
