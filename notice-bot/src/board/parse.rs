// HTML extraction for the board's list view.
//
// The board renders notices as a table; each row carries the same four
// structural nodes (id cell, title anchor, date span, writer span). Parsing
// is pure — the fetch layer hands in a decoded body and a base address and
// gets records back, so everything here is testable without I/O.

use scraper::{ElementRef, Html, Selector};

use super::NoticeRecord;

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

const SEL_NO_POST: &str = "td.b-no-post";
const SEL_ID: &str = "td.b-num-box";
const SEL_TITLE: &str = "div.b-title-box > a";
const SEL_DATE: &str = "span.b-date";
const SEL_WRITER: &str = "span.b-writer";

/// Hidden accessibility suffix the board appends inside every title anchor.
const DETAIL_SUFFIX: &str = " 자세히 보기";

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("selector literal is valid")
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract notice records from a board list page.
///
/// Returns the sentinel empty result when the "no posts" marker is present
/// (a valid empty state) or when the expected structure is missing (malformed
/// markup) — both collapse into the same shape as a transport failure
/// upstream. Records come back in document order, newest first.
pub fn parse_board_page(html: &str, address: &str) -> Vec<NoticeRecord> {
    let doc = Html::parse_document(html);

    if doc.select(&selector(SEL_NO_POST)).next().is_some() {
        return Vec::new();
    }

    let ids: Vec<ElementRef> = doc.select(&selector(SEL_ID)).collect();
    let titles: Vec<ElementRef> = doc.select(&selector(SEL_TITLE)).collect();
    let dates: Vec<ElementRef> = doc.select(&selector(SEL_DATE)).collect();
    let writers: Vec<ElementRef> = doc.select(&selector(SEL_WRITER)).collect();

    // The four node lists are positionally aligned on a well-formed page.
    // Zipping to the shortest keeps the alignment invariant when markup is
    // broken; a page missing one list entirely degrades to the sentinel.
    let len = ids
        .len()
        .min(titles.len())
        .min(dates.len())
        .min(writers.len());

    let mut records = Vec::with_capacity(len);
    for i in 0..len {
        let link = format!(
            "{address}{}",
            titles[i].value().attr("href").unwrap_or_default()
        );
        records.push(NoticeRecord {
            id: text_of(&ids[i], true),
            title: clean_title(&text_of(&titles[i], true)),
            date: text_of(&dates[i], true),
            writer: text_of(&writers[i], false),
            link,
        });
    }

    records
}

/// Concatenated text of an element, optionally with surrounding whitespace
/// stripped. Writers keep their whitespace (see [`NoticeRecord::writer`]).
fn text_of(el: &ElementRef, strip: bool) -> String {
    let text: String = el.text().collect();
    if strip {
        text.trim().to_string()
    } else {
        text
    }
}

/// Drop the board's hidden " 자세히 보기" suffix from a title.
fn clean_title(title: &str) -> String {
    title.replace(DETAIL_SUFFIX, "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
