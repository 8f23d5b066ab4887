// Kakao 2.0 chat payload assembly.
//
// Typed render targets for the skill-server response format: a payload is
// `version` + `template.outputs`, where an output is a simpleText, a
// listCard, or a basicCard carousel, plus optional quickReplies. Builders
// here are pure; the dispatcher decides which to send.

use rand::seq::SliceRandom;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const PAYLOAD_VERSION: &str = "2.0";

/// Shown when the probe says the board is unreachable.
const TIMEOUT_TEXT: &str = "아주대학교 홈페이지 서버 반응이 늦고 있네요. 잠시 후 다시 시도해보세요.";

/// Title of the single card substituted for an empty result list.
pub const PLACEHOLDER_TITLE: &str = "공지가 없습니다!";

/// Titles longer than this many characters get truncated.
const TITLE_MAX_CHARS: usize = 35;
/// Characters kept before the ellipsis when truncating.
const TITLE_KEEP_CHARS: usize = 32;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub version: String,
    pub template: Template,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub outputs: Vec<Output>,
    #[serde(rename = "quickReplies", skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<QuickReply>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Output {
    #[serde(rename = "simpleText")]
    SimpleText { text: String },
    #[serde(rename = "listCard")]
    ListCard(ListCard),
    #[serde(rename = "carousel")]
    Carousel(Carousel),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListCard {
    pub header: Header,
    pub items: Vec<Card>,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Carousel {
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<Card>,
}

/// A single card. Which optional fields are set depends on the surface:
/// listCard items carry a `link`, carousel basicCards a `thumbnail`, the
/// placeholder card a bare `imageUrl`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub web: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    pub label: String,
    pub action: String,
    #[serde(rename = "webLinkUrl", skip_serializing_if = "Option::is_none")]
    pub web_link_url: Option<String>,
    #[serde(rename = "messageText", skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
}

impl Button {
    pub fn share(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: "share".to_string(),
            web_link_url: None,
            message_text: None,
        }
    }

    pub fn web_link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: "webLink".to_string(),
            web_link_url: Some(url.into()),
            message_text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    pub label: String,
    pub action: String,
    #[serde(rename = "messageText")]
    pub message_text: String,
}

impl QuickReply {
    pub fn message(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: "message".to_string(),
            message_text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Thumbnail picking
// ---------------------------------------------------------------------------

/// Chooses a thumbnail from the configured pool. Injected so tests can swap
/// in a deterministic source.
pub trait ImagePicker: Send + Sync {
    fn pick<'a>(&self, pool: &'a [String]) -> Option<&'a str>;
}

/// Production picker: uniform random choice.
pub struct RandomPicker;

impl ImagePicker for RandomPicker {
    fn pick<'a>(&self, pool: &'a [String]) -> Option<&'a str> {
        pool.choose(&mut rand::thread_rng()).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Card builders
// ---------------------------------------------------------------------------

/// Build a listCard item for one notice.
///
/// Boards sometimes redundantly prefix the title with the bracketed writer
/// name; that marker is stripped before truncation. Titles longer than 35
/// characters keep their first 32 and gain an ellipsis. The description is
/// the writer alone, or `"writer MM.DD"` when a date is supplied.
pub fn notice_card(title: &str, writer: &str, date: Option<&str>, link: &str) -> Card {
    let marker = format!("[{writer}]");
    let title = if title.contains(&marker) {
        title.replace(&marker, "").trim().to_string()
    } else {
        title.to_string()
    };

    let description = match date {
        Some(date) => format!("{writer} {}", date_suffix(date)),
        None => writer.to_string(),
    };

    Card {
        title: truncate_title(&title),
        description: Some(description),
        image_url: None,
        thumbnail: None,
        link: Some(Link {
            web: link.to_string(),
        }),
    }
}

/// The fixed card substituted when a result list is empty.
pub fn placeholder_card(image_url: &str) -> Card {
    Card {
        title: PLACEHOLDER_TITLE.to_string(),
        description: None,
        image_url: Some(image_url.to_string()),
        thumbnail: None,
        link: None,
    }
}

/// Build a carousel basicCard. Non-notice content (schedule items) has no
/// real thumbnail, so one is drawn from the configured pool.
pub fn carousel_card(
    title: &str,
    description: &str,
    pool: &[String],
    picker: &dyn ImagePicker,
) -> Card {
    Card {
        title: title.to_string(),
        description: Some(description.to_string()),
        image_url: None,
        thumbnail: picker.pick(pool).map(|url| Thumbnail {
            image_url: url.to_string(),
        }),
        link: None,
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let mut kept: String = title.chars().take(TITLE_KEEP_CHARS).collect();
        kept.push('…');
        kept
    } else {
        title.to_string()
    }
}

/// Last five characters of a `YY.MM.DD` date — the compact `MM.DD` form.
fn date_suffix(date: &str) -> String {
    let chars: Vec<char> = date.chars().collect();
    if chars.len() <= 5 {
        date.to_string()
    } else {
        chars[chars.len() - 5..].iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn simple_text(text: impl Into<String>, quick_replies: Option<Vec<QuickReply>>) -> Payload {
    Payload {
        version: PAYLOAD_VERSION.to_string(),
        template: Template {
            outputs: vec![Output::SimpleText { text: text.into() }],
            quick_replies,
        },
    }
}

pub fn list_card(
    title: impl Into<String>,
    items: Vec<Card>,
    buttons: Vec<Button>,
    quick_replies: Option<Vec<QuickReply>>,
) -> Payload {
    Payload {
        version: PAYLOAD_VERSION.to_string(),
        template: Template {
            outputs: vec![Output::ListCard(ListCard {
                header: Header {
                    title: title.into(),
                },
                items,
                buttons,
            })],
            quick_replies,
        },
    }
}

pub fn carousel(items: Vec<Card>) -> Payload {
    Payload {
        version: PAYLOAD_VERSION.to_string(),
        template: Template {
            outputs: vec![Output::Carousel(Carousel {
                kind: "basicCard".to_string(),
                items,
            })],
            quick_replies: None,
        },
    }
}

/// The fixed payload for "the board is not answering".
pub fn timeout_message() -> Payload {
    simple_text(TIMEOUT_TEXT, None)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
