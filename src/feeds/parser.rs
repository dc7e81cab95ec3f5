//! RSS 2.0 and Atom parsing with `quick-xml`'s serde deserializer.
//!
//! Both formats are flattened into [`FeedEntry`], which keeps every field the
//! normalizer might need (alternate links and the `<source url>` are used to
//! unwrap Google News redirects).

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

/// Raw entry as read from the feed, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Every other `href` the entry carries.
    pub alternate_links: Vec<String>,
    /// `description` (RSS) or `summary` (Atom), still HTML.
    pub summary: String,
    /// Publisher URL from RSS `<source url="...">`.
    pub source_url: Option<String>,
    /// Unparsed date string: `pubDate` or `published`/`updated`.
    pub published: Option<String>,
}

#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("not an RSS or Atom document: {0}")]
    Unrecognized(#[from] quick_xml::DeError),
}

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source: Option<RssSource>,
}

#[derive(Debug, Deserialize)]
struct RssSource {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl From<RssItem> for FeedEntry {
    fn from(item: RssItem) -> Self {
        Self {
            title: item.title.unwrap_or_default(),
            link: item.link.unwrap_or_default(),
            alternate_links: Vec::new(),
            summary: item.description.unwrap_or_default(),
            source_url: item.source.and_then(|s| s.url),
            published: item.pub_date,
        }
    }
}

impl From<AtomEntry> for FeedEntry {
    fn from(entry: AtomEntry) -> Self {
        // Primary link: rel="alternate" or no rel at all.
        let mut hrefs: Vec<(bool, String)> = entry
            .links
            .into_iter()
            .filter_map(|l| {
                let primary = matches!(l.rel.as_deref(), None | Some("alternate"));
                l.href.map(|h| (primary, h))
            })
            .collect();
        let link = hrefs
            .iter()
            .position(|(primary, _)| *primary)
            .map(|i| hrefs.remove(i).1)
            .unwrap_or_default();

        Self {
            title: entry.title.map(|t| t.text).unwrap_or_default(),
            link,
            alternate_links: hrefs.into_iter().map(|(_, h)| h).collect(),
            summary: entry.summary.map(|t| t.text).unwrap_or_default(),
            source_url: None,
            published: entry.published.or(entry.updated),
        }
    }
}

/// Replace HTML named entities that XML does not define.
///
/// Feeds routinely leak `&nbsp;` and friends into XML, which would otherwise
/// fail the whole document.
fn scrub_html_entities(xml: &str) -> String {
    xml.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS or Atom document into entries.
///
/// RSS is tried first; a document without a `<channel>` is then read as Atom
/// if it has a `<feed>` root.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FeedParseError> {
    let xml = scrub_html_entities(xml);
    match from_str::<RssDocument>(&xml) {
        Ok(rss) => Ok(rss.channel.items.into_iter().map(FeedEntry::from).collect()),
        Err(rss_err) if xml.contains("<feed") => match from_str::<AtomFeed>(&xml) {
            Ok(atom) => Ok(atom.entries.into_iter().map(FeedEntry::from).collect()),
            Err(_) => Err(rss_err.into()),
        },
        Err(rss_err) => Err(rss_err.into()),
    }
}
