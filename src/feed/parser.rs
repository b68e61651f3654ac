use crate::feed::types::{ArticleRecord, FeedRecord};
use feed_rs::model::{Entry, Feed, Link};
use feed_rs::parser::{self, ParseFeedError};

/// Parses raw bytes as Atom, RSS 0.9x/2.0 or RSS 1.0 (RDF); the format is auto-detected.
pub fn parse_feed(bytes: &[u8]) -> Result<Feed, ParseFeedError> {
    parser::parse(bytes)
}

/// Converts a parsed document into a [`FeedRecord`].
///
/// `requested_url` becomes the feed URL unless the document declares its own
/// `rel="self"` link. Items are mapped one-to-one in document order; items
/// without a title or link are kept with empty fields.
pub fn normalize(feed: Feed, requested_url: &str) -> FeedRecord {
    let feed_url = self_link(&feed.links)
        .map(|link| link.href.clone())
        .filter(|href| !href.is_empty())
        .unwrap_or_else(|| requested_url.to_string());

    let home_link = home_link(&feed.links)
        .map(|link| link.href.clone())
        .unwrap_or_default();

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    let articles = feed.entries.into_iter().map(to_article).collect();

    FeedRecord {
        title,
        home_link,
        feed_url,
        articles,
    }
}

fn to_article(entry: Entry) -> ArticleRecord {
    let link = entry_link(&entry.links)
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let published_at = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();
    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    ArticleRecord {
        title,
        link,
        published_at,
        summary,
    }
}

fn is_alternate(link: &Link) -> bool {
    match link.rel.as_deref() {
        None => true,
        Some(rel) => rel.eq_ignore_ascii_case("alternate"),
    }
}

fn is_self(link: &Link) -> bool {
    link.rel
        .as_deref()
        .is_some_and(|rel| rel.eq_ignore_ascii_case("self"))
}

fn self_link(links: &[Link]) -> Option<&Link> {
    links.iter().find(|l| is_self(l))
}

// Alternate first, then anything that is not the feed's own address
fn home_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| is_alternate(l))
        .or_else(|| links.iter().find(|l| !is_self(l)))
}

fn entry_link(links: &[Link]) -> Option<&Link> {
    links.iter().find(|l| is_alternate(l)).or_else(|| links.first())
}
