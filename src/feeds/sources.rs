//! The fixed list of tech feeds the bot reads.

/// A named feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

const DEFAULT_SOURCES: [(&str, &str); 11] = [
    ("Android Police", "https://www.androidpolice.com/feed/"),
    ("GSMArena", "https://www.gsmarena.com/rss-news-reviews.php3"),
    ("Android Central", "https://www.androidcentral.com/feed"),
    ("The Verge", "https://www.theverge.com/rss/index.xml"),
    ("TechCrunch", "https://techcrunch.com/feed/"),
    ("9to5Mac", "https://9to5mac.com/feed/"),
    ("MacRumors", "https://www.macrumors.com/macrumors.xml"),
    (
        "Google News - Nvidia",
        "https://news.google.com/rss/search?q=Nvidia&hl=en-US&gl=US&ceid=US:en",
    ),
    (
        "Google News - Apple",
        "https://news.google.com/rss/search?q=Apple+iPhone+iPad&hl=en-US&gl=US&ceid=US:en",
    ),
    (
        "Google News - AMD",
        "https://news.google.com/rss/search?q=AMD&hl=en-US&gl=US&ceid=US:en",
    ),
    (
        "Google News - Mobile",
        "https://news.google.com/rss/search?q=mobile+phone+smartphone&hl=en-US&gl=US&ceid=US:en",
    ),
];

/// Feeds polled on every run, in fetch order.
pub fn default_sources() -> Vec<FeedSource> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, url)| FeedSource::new(*name, *url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_default_sources_are_valid_urls() {
        let sources = default_sources();
        assert_eq!(sources.len(), 11);
        for source in &sources {
            let url = Url::parse(&source.url).unwrap();
            assert_eq!(url.scheme(), "https", "{}", source.name);
        }
    }

    #[test]
    fn test_google_news_searches_present() {
        let google = default_sources()
            .into_iter()
            .filter(|s| s.url.contains("news.google.com"))
            .count();
        assert_eq!(google, 4);
    }
}
