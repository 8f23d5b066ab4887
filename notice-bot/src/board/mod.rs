// Board access: list-URL construction, HTTP fetch, and HTML extraction.

pub mod client;
pub mod parse;

pub use client::BoardClient;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// One notice row scraped from the board's list view. Ephemeral — constructed
/// per fetch, never persisted by the fetch path itself.
///
/// Position 0 of a fetched batch is the newest item (the board sorts
/// newest-first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    /// Board-assigned id. Usually numeric, but pinned rows carry a label
    /// ("공지") instead.
    pub id: String,
    pub title: String,
    /// `YY.MM.DD` as printed by the board.
    pub date: String,
    /// Whitespace is preserved: leading/trailing glyphs sometimes encode a
    /// "new" marker.
    pub writer: String,
    /// Absolute URL of the notice.
    pub link: String,
}

/// Page-size hint used when a caller has no better number.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Query parameters for the board's list view. Builds the same URL shape the
/// board's own search form submits.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub limit: usize,
    pub category: Option<u32>,
    pub keyword: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            category: None,
            keyword: None,
        }
    }

    pub fn with_category(mut self, category: u32) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Render the full list URL against the board base address. Keywords are
    /// percent-encoded by the URL serializer.
    pub fn build(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("mode", "list");
            pairs.append_pair("srSearchKey", "");
            pairs.append_pair(
                "srSearchVal",
                self.keyword.as_deref().map(str::trim).unwrap_or(""),
            );
            pairs.append_pair(
                "srCategoryId",
                &self
                    .category
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            );
            pairs.append_pair("articleLimit", &self.limit.to_string());
            pairs.append_pair("article.offset", "0");
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.ajou.ac.kr/kr/ajou/notice.do").unwrap()
    }

    #[test]
    fn default_query_uses_page_size_hint() {
        assert_eq!(ListQuery::default().limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn default_list_url() {
        let url = ListQuery::new(10).build(&base());
        let s = url.as_str();
        assert!(s.starts_with("https://www.ajou.ac.kr/kr/ajou/notice.do?"));
        assert!(s.contains("mode=list"));
        assert!(s.contains("articleLimit=10"));
        assert!(s.contains("article.offset=0"));
        assert!(s.contains("srCategoryId=&") || s.ends_with("srCategoryId="));
    }

    #[test]
    fn category_query_carries_id() {
        let url = ListQuery::new(5).with_category(168).build(&base());
        assert!(url.as_str().contains("srCategoryId=168"));
        assert!(url.as_str().contains("articleLimit=5"));
    }

    #[test]
    fn keyword_is_percent_encoded() {
        let url = ListQuery::new(7).with_keyword("등록금").build(&base());
        let s = url.as_str();
        // "등록금" UTF-8 percent-encoded.
        assert!(s.contains("srSearchVal=%EB%93%B1%EB%A1%9D%EA%B8%88"));
        assert!(!s.contains("등록금"));
    }

    #[test]
    fn keyword_is_trimmed() {
        let url = ListQuery::new(7).with_keyword("  2021  ").build(&base());
        assert!(url.as_str().contains("srSearchVal=2021"));
    }
}
