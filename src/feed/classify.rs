//! Format-specific acceptance checks.
//!
//! Each classifier parses the bytes on its own and only accepts documents of
//! its wire format. The batch path does not use these; it relies on the
//! auto-detecting parse in [`super::parser`].

use crate::feed::fetcher::FetchError;
use crate::feed::parser::{normalize, parse_feed};
use crate::feed::types::FeedRecord;
use feed_rs::model::FeedType;

/// Outcome of running one classifier over a document.
#[derive(Debug)]
pub enum Classification {
    /// The document is in this classifier's format.
    Matched(FeedRecord),
    /// Well-formed feed, different format.
    NotApplicable,
    /// The bytes are not a parseable feed at all.
    ParseFailed(FetchError),
}

impl Classification {
    pub fn matched(self) -> Option<FeedRecord> {
        match self {
            Classification::Matched(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Classification::NotApplicable)
    }
}

pub trait FormatClassifier {
    /// Short label for logging ("atom", "rss2", "rdf").
    fn name(&self) -> &'static str;

    fn accepts(&self, feed_type: &FeedType) -> bool;

    fn classify(&self, source_url: &str, bytes: &[u8]) -> Classification {
        let feed = match parse_feed(bytes) {
            Ok(feed) => feed,
            Err(e) => return Classification::ParseFailed(FetchError::Parse(e.to_string())),
        };

        if !self.accepts(&feed.feed_type) {
            tracing::trace!(
                classifier = self.name(),
                detected = ?feed.feed_type,
                "Document not in classifier format"
            );
            return Classification::NotApplicable;
        }

        Classification::Matched(normalize(feed, source_url))
    }
}

/// Accepts Atom 1.0 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomClassifier;

/// Accepts RSS documents declaring version 2.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rss2Classifier;

/// Accepts RSS 1.0 (RDF) documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdfClassifier;

impl FormatClassifier for AtomClassifier {
    fn name(&self) -> &'static str {
        "atom"
    }

    fn accepts(&self, feed_type: &FeedType) -> bool {
        matches!(feed_type, FeedType::Atom)
    }
}

impl FormatClassifier for Rss2Classifier {
    fn name(&self) -> &'static str {
        "rss2"
    }

    fn accepts(&self, feed_type: &FeedType) -> bool {
        matches!(feed_type, FeedType::RSS2)
    }
}

impl FormatClassifier for RdfClassifier {
    fn name(&self) -> &'static str {
        "rdf"
    }

    fn accepts(&self, feed_type: &FeedType) -> bool {
        matches!(feed_type, FeedType::RSS1)
    }
}

/// Runs the Atom, RSS 2.0 and RDF classifiers in turn and returns the first match.
///
/// A parse failure short-circuits: the three classifiers share a parser, so
/// bytes one rejects as malformed are malformed for all of them.
pub fn classify_any(source_url: &str, bytes: &[u8]) -> Classification {
    let classifiers: [&dyn FormatClassifier; 3] =
        [&AtomClassifier, &Rss2Classifier, &RdfClassifier];

    for classifier in classifiers {
        match classifier.classify(source_url, bytes) {
            Classification::NotApplicable => continue,
            other => return other,
        }
    }

    Classification::NotApplicable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::ErrorKind;

    const URL: &str = "https://example.com/feed";

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <id>urn:uuid:feed</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <id>urn:uuid:1</id>
    <title>Atom Entry</title>
    <link href="https://example.com/atom/1"/>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

    const RSS2: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>RSS2.0 Feed</title>
    <link>https://example.com/rss</link>
    <item><title>RSS Item</title><link>https://example.com/rss/1</link></item>
</channel></rss>"#;

    const RDF: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://example.com/rdf">
    <title>RDF Feed</title>
    <link>https://example.com/rdf-home</link>
    <description>RSS 1.0</description>
  </channel>
  <item rdf:about="https://example.com/rdf/1">
    <title>RDF Item</title>
    <link>https://example.com/rdf/1</link>
  </item>
</rdf:RDF>"#;

    const MALFORMED: &str = "<not valid xml";

    #[test]
    fn test_atom_classifier() {
        let record = AtomClassifier.classify(URL, ATOM.as_bytes()).matched().unwrap();
        assert_eq!(record.title, "Atom Feed");
        assert_eq!(record.articles.len(), 1);

        assert!(AtomClassifier.classify(URL, RSS2.as_bytes()).is_not_applicable());
        assert!(AtomClassifier.classify(URL, RDF.as_bytes()).is_not_applicable());
    }

    #[test]
    fn test_rss2_classifier() {
        let record = Rss2Classifier.classify(URL, RSS2.as_bytes()).matched().unwrap();
        assert_eq!(record.title, "RSS2.0 Feed");
        assert_eq!(record.articles[0].title, "RSS Item");

        assert!(Rss2Classifier.classify(URL, ATOM.as_bytes()).is_not_applicable());
        assert!(Rss2Classifier.classify(URL, RDF.as_bytes()).is_not_applicable());
    }

    #[test]
    fn test_rdf_classifier() {
        let record = RdfClassifier.classify(URL, RDF.as_bytes()).matched().unwrap();
        assert_eq!(record.title, "RDF Feed");
        assert_eq!(record.articles[0].link, "https://example.com/rdf/1");

        assert!(RdfClassifier.classify(URL, ATOM.as_bytes()).is_not_applicable());
        assert!(RdfClassifier.classify(URL, RSS2.as_bytes()).is_not_applicable());
    }

    #[test]
    fn test_malformed_input_fails_for_every_classifier() {
        let classifiers: [&dyn FormatClassifier; 3] =
            [&AtomClassifier, &Rss2Classifier, &RdfClassifier];
        for classifier in classifiers {
            match classifier.classify(URL, MALFORMED.as_bytes()) {
                Classification::ParseFailed(e) => assert_eq!(e.kind(), ErrorKind::Parse),
                other => panic!("{}: expected ParseFailed, got {:?}", classifier.name(), other),
            }
        }
    }

    #[test]
    fn test_classify_any_picks_matching_format() {
        for (xml, title) in [(ATOM, "Atom Feed"), (RSS2, "RSS2.0 Feed"), (RDF, "RDF Feed")] {
            let record = classify_any(URL, xml.as_bytes()).matched().unwrap();
            assert_eq!(record.title, title);
        }
        assert!(matches!(
            classify_any(URL, MALFORMED.as_bytes()),
            Classification::ParseFailed(_)
        ));
    }

    #[test]
    fn test_matched_record_uses_source_url_fallback() {
        let record = Rss2Classifier.classify(URL, RSS2.as_bytes()).matched().unwrap();
        assert_eq!(record.feed_url, URL);
    }
}
