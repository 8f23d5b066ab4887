// HTTP access to the board.
//
// The board's certificate chain is unreliable, so certificate validation is
// disabled for this host. Every request is bounded by the configured timeout;
// there are no retries — a failed fetch surfaces immediately and the
// surrounding request layer decides whether to re-invoke the command.

use std::time::Duration;

use anyhow::Context;
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::BoardConfig;

use super::parse::parse_board_page;
use super::{ListQuery, NoticeRecord};

/// Client for the board's list view and connection probe. Cheap to clone —
/// the underlying `reqwest::Client` is a shared handle.
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    base: Url,
}

impl BoardClient {
    pub fn new(config: &BoardConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("failed to build board HTTP client")?;
        let base = Url::parse(&config.address)
            .with_context(|| format!("invalid board address {:?}", config.address))?;
        Ok(Self { http, base })
    }

    /// Fetch and extract a page of notices.
    ///
    /// Transport failures (connect/DNS error, timeout, HTTP error status) and
    /// the board's own "no posts" marker all return the sentinel empty result;
    /// no error crosses this boundary. Downstream treats an empty result as
    /// "try later", not as fatal — only the probe distinguishes an unreachable
    /// board from a legitimately empty one.
    pub async fn fetch(&self, query: &ListQuery) -> Vec<NoticeRecord> {
        let url = query.build(&self.base);

        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "board fetch failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "board returned error status");
            return Vec::new();
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%url, error = %e, "failed to read board response body");
                return Vec::new();
            }
        };

        let records = parse_board_page(&body, self.base.as_str());
        debug!(%url, count = records.len(), "fetched board page");
        records
    }

    /// Bare GET against the board root, same timeout and TLS policy as
    /// [`fetch`](Self::fetch). This is the only operation that tells
    /// "upstream down" apart from "upstream legitimately empty".
    pub async fn check_connection(&self) -> bool {
        match self.http.get(self.base.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "board connection probe failed");
                false
            }
        }
    }

    /// Render the list URL for `query` — used for "see more" deep links that
    /// must point at the equivalent filtered view on the live site.
    pub fn list_url(&self, query: &ListQuery) -> String {
        query.build(&self.base).into()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
