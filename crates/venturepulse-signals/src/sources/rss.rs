//! Generic RSS item parser for feed-backed sources.
//!
//! Feeds in this path carry no reliable score or comment metadata, so the
//! caller supplies per-source defaults. Items missing a title, link, or
//! publish date are unparseable and silently dropped.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use venturepulse_core::SignalItem;

use crate::error::SignalError;

/// Per-source fill-ins for fields RSS does not carry.
#[derive(Debug, Clone, Copy)]
pub struct FeedDefaults {
    pub origin: &'static str,
    pub score: i32,
    pub comment_count: i32,
}

/// Parse an RSS feed XML body into normalized signal items.
///
/// The dedup key for feed items is the canonical link, since feeds expose no
/// better source-stable identifier.
///
/// # Errors
///
/// Returns [`SignalError::Xml`] if the XML is malformed at the reader level.
pub fn parse_feed(xml: &str, defaults: &FeedDefaults) -> Result<Vec<SignalItem>, SignalError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current_title = String::new();
    let mut current_link = String::new();
    let mut current_date = String::new();
    let mut in_item = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                match name.as_str() {
                    "item" => {
                        in_item = true;
                        current_title.clear();
                        current_link.clear();
                        current_date.clear();
                    }
                    _ => {
                        current_tag = name;
                    }
                }
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    if let Some(item) = build_item(
                        &current_title,
                        &current_link,
                        &current_date,
                        defaults,
                    ) {
                        items.push(item);
                    }
                }
                // Stray text after a closing tag belongs to no field.
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    assign_field(&current_tag, text, &mut current_title, &mut current_link, &mut current_date);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    assign_field(&current_tag, text, &mut current_title, &mut current_link, &mut current_date);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SignalError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn assign_field(
    tag: &str,
    text: String,
    title: &mut String,
    link: &mut String,
    date: &mut String,
) {
    match tag {
        "title" => *title = text,
        "link" => *link = text,
        "pubDate" => *date = text,
        _ => {}
    }
}

/// Null-item rule: missing title, link, or an unparseable date drops the item.
fn build_item(
    title: &str,
    link: &str,
    date: &str,
    defaults: &FeedDefaults,
) -> Option<SignalItem> {
    let title = title.trim();
    let link = link.trim();
    if title.is_empty() || link.is_empty() {
        return None;
    }
    let published_at = parse_feed_date(date)?;

    Some(SignalItem {
        external_id: link.to_string(),
        title: title.to_string(),
        content: None,
        origin: defaults.origin.to_string(),
        score: defaults.score,
        comment_count: defaults.comment_count,
        url: link.to_string(),
        published_at,
    })
}

/// RSS feeds mostly use RFC 2822 dates; some Atom-flavored ones emit RFC 3339.
fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
