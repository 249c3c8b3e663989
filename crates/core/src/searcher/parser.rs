//! Torrent RSS feed parser.
//!
//! Each `<item>` is cut out of the document and parsed on its own, so a
//! broken item costs exactly that item. Items outside the TV/Anime
//! categories and items with an empty title or link are skipped silently.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Url;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{ProviderConfig, TorrentMethod};

use super::size::{convert_size, try_int};
use super::{CandidateRelease, SearchMode, UNKNOWN_SIZE};

/// Category suffixes an item must carry to be considered.
const ALLOWED_CATEGORIES: [&str; 2] = ["TV", "Anime"];

/// Why a single feed item could not be turned into a candidate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemParseError {
    #[error("item {index}: missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("item {index}: malformed xml: {message}")]
    Malformed { index: usize, message: String },
}

impl ItemParseError {
    pub fn index(&self) -> usize {
        match self {
            ItemParseError::MissingField { index, .. } | ItemParseError::Malformed { index, .. } => {
                *index
            }
        }
    }
}

/// Output of parsing one feed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Candidates in feed order.
    pub candidates: Vec<CandidateRelease>,
    /// Items dropped for category, empty title or empty link.
    pub skipped: usize,
    pub failures: Vec<ItemParseError>,
}

/// How an item's download link is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Keep direct links from the cache host instead of magnets.
    pub prefer_direct: bool,
    pub cache_host: String,
    /// Appended to every magnet link.
    pub custom_trackers: String,
}

impl LinkPolicy {
    pub fn new(provider: &ProviderConfig, method: TorrentMethod) -> Self {
        Self {
            prefer_direct: method == TorrentMethod::Blackhole,
            cache_host: provider.cache_host.clone(),
            custom_trackers: provider.custom_trackers.clone(),
        }
    }

    fn keeps_direct(&self, direct_link: &str) -> bool {
        self.prefer_direct && !self.cache_host.is_empty() && host_matches(direct_link, &self.cache_host)
    }

    fn resolve(
        &self,
        index: usize,
        direct_link: &str,
        magnet: Option<&str>,
    ) -> Result<String, ItemParseError> {
        if self.keeps_direct(direct_link) {
            return Ok(direct_link.trim().to_string());
        }

        let magnet = magnet.ok_or(ItemParseError::MissingField {
            index,
            field: "magneturi",
        })?;
        let magnet = strip_markers(magnet);
        if magnet.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}{}", magnet, self.custom_trackers))
    }
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            prefer_direct: false,
            cache_host: "torcache".to_string(),
            custom_trackers: String::new(),
        }
    }
}

fn host_matches(link: &str, cache_host: &str) -> bool {
    match Url::parse(link.trim()) {
        Ok(url) => url
            .host_str()
            .map(|host| host.contains(cache_host))
            .unwrap_or(false),
        Err(_) => link.contains(cache_host),
    }
}

/// Remove CDATA remnants some feeds leak into magnet text.
fn strip_markers(text: &str) -> String {
    text.replace("CDATA", "")
        .trim()
        .trim_matches(|c: char| c == '[' || c == ']' || c == '!' || c == '<' || c == '>')
        .trim()
        .to_string()
}

/// Parse a feed document into candidates.
///
/// Never fails as a whole: per-item problems are logged and collected in
/// [`ParsedFeed::failures`].
pub fn parse_feed(raw: &str, mode: &SearchMode, policy: &LinkPolicy) -> ParsedFeed {
    let mut parsed = ParsedFeed::default();

    for (index, chunk) in split_items(raw).into_iter().enumerate() {
        let result = read_item(index, chunk).and_then(|item| build_candidate(index, &item, policy));
        match result {
            Ok(Some(candidate)) => {
                if !mode.is_broad() {
                    debug!(
                        title = %candidate.title,
                        seeders = candidate.seeders,
                        leechers = candidate.leechers,
                        "Found result"
                    );
                }
                parsed.candidates.push(candidate);
            }
            Ok(None) => parsed.skipped += 1,
            Err(e) => {
                error!(mode = %mode, error = %e, "Failed parsing provider item");
                parsed.failures.push(e);
            }
        }
    }

    parsed
}

/// Slice out every `<item>...</item>` block.
///
/// Boundaries come from a lenient pass over the whole document, so markup
/// inside CDATA sections and comments never opens or closes an item. An
/// unterminated final item runs to the end of the document and fails to
/// parse on its own.
fn split_items(raw: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut from = 0;
    while let Some(resume) = scan_items(raw, from, &mut chunks) {
        if resume <= from {
            break;
        }
        from = resume;
    }
    chunks
}

/// Collect item blocks starting at byte `from`. Returns where to resume
/// when the document stops being readable.
fn scan_items<'a>(raw: &'a str, from: usize, chunks: &mut Vec<&'a str>) -> Option<usize> {
    let text = &raw[from..];
    let mut reader = Reader::from_str(text);
    // a mismatched end tag only breaks its own item
    reader.config_mut().check_end_names = false;

    let mut depth = 0usize;
    let mut start = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) if is_item(e.local_name().as_ref()) => {
                if depth == 0 {
                    start = tag_start(text, before);
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) if depth == 0 && is_item(e.local_name().as_ref()) => {
                let stop = reader.buffer_position() as usize;
                chunks.push(&text[tag_start(text, before)..stop]);
            }
            Ok(Event::End(e)) if depth > 0 && is_item(e.local_name().as_ref()) => {
                depth -= 1;
                if depth == 0 {
                    let stop = reader.buffer_position() as usize;
                    chunks.push(&text[start..stop]);
                }
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    chunks.push(&text[start..]);
                }
                return None;
            }
            Err(_) => {
                let failed_at = char_boundary(text, reader.buffer_position() as usize);
                if depth == 0 {
                    return Some(from + failed_at);
                }
                // the broken item ends at the next close tag, if any
                return match text[failed_at..].find(ITEM_CLOSE) {
                    Some(offset) => {
                        let stop = failed_at + offset + ITEM_CLOSE.len();
                        chunks.push(&text[start..stop]);
                        Some(from + stop)
                    }
                    None => {
                        chunks.push(&text[start..]);
                        None
                    }
                };
            }
            _ => {}
        }
    }
}

const ITEM_CLOSE: &str = "</item>";

fn is_item(local_name: &[u8]) -> bool {
    local_name == b"item"
}

/// First char boundary at or after `position`, clamped to the text length.
fn char_boundary(text: &str, position: usize) -> usize {
    let mut position = position.min(text.len());
    while !text.is_char_boundary(position) {
        position += 1;
    }
    position
}

/// Offset of the `<` opening the tag the reader was positioned at.
fn tag_start(text: &str, position: usize) -> usize {
    text.get(..position + 1)
        .and_then(|head| head.rfind('<'))
        .unwrap_or(position)
}

/// Child element text of one item, keyed by lowercased local name.
#[derive(Debug, Default)]
struct RawItem {
    fields: HashMap<String, String>,
    enclosure_url: Option<String>,
}

impl RawItem {
    fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn enclosure_url(index: usize, e: &BytesStart<'_>) -> Result<Option<String>, ItemParseError> {
    let malformed = |message: String| ItemParseError::Malformed { index, message };

    let attr = e
        .try_get_attribute("url")
        .map_err(|err| malformed(err.to_string()))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|err| malformed(err.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn read_item(index: usize, chunk: &str) -> Result<RawItem, ItemParseError> {
    let malformed = |message: String| ItemParseError::Malformed { index, message };

    let mut reader = Reader::from_str(chunk);
    reader.config_mut().trim_text(true);

    let mut item = RawItem::default();
    // (element name, whether its text is being captured)
    let mut open: Vec<(String, bool)> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if name == "enclosure" && item.enclosure_url.is_none() {
                    item.enclosure_url = enclosure_url(index, &e)?;
                }
                // first occurrence wins
                let capture = !item.fields.contains_key(&name);
                if capture {
                    item.fields.insert(name.clone(), String::new());
                }
                open.push((name, capture));
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if name == "enclosure" && item.enclosure_url.is_none() {
                    item.enclosure_url = enclosure_url(index, &e)?;
                }
                item.fields.entry(name).or_default();
            }
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| malformed(e.to_string()))?;
                append_text(&mut item, &open, &text);
            }
            Ok(Event::CData(c)) => {
                let bytes = c.into_inner();
                append_text(&mut item, &open, &String::from_utf8_lossy(&bytes));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(malformed(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if let Some((name, _)) = open.last() {
        return Err(malformed(format!("unclosed <{}>", name)));
    }

    Ok(item)
}

fn append_text(item: &mut RawItem, open: &[(String, bool)], text: &str) {
    if let Some((name, true)) = open.last() {
        if let Some(value) = item.fields.get_mut(name) {
            value.push_str(text);
        }
    }
}

fn build_candidate(
    index: usize,
    item: &RawItem,
    policy: &LinkPolicy,
) -> Result<Option<CandidateRelease>, ItemParseError> {
    let category = item.get("category").ok_or(ItemParseError::MissingField {
        index,
        field: "category",
    })?;
    let category = category.trim();
    if !ALLOWED_CATEGORIES.iter().any(|c| category.ends_with(c)) {
        return Ok(None);
    }

    let title = item
        .get("title")
        .ok_or(ItemParseError::MissingField {
            index,
            field: "title",
        })?
        .trim()
        .to_string();
    let direct_link = item
        .enclosure_url
        .as_deref()
        .ok_or(ItemParseError::MissingField {
            index,
            field: "enclosure",
        })?;
    let link = policy.resolve(index, direct_link, item.get("magneturi"))?;

    if title.is_empty() || link.is_empty() {
        return Ok(None);
    }

    let seeders = try_int(item.first_of(&["numseeders", "seeders"]));
    let leechers = try_int(item.first_of(&["numleechers", "leechers"]));

    let size = item
        .get("size")
        .and_then(convert_size)
        .and_then(|bytes| i64::try_from(bytes).ok())
        .unwrap_or(UNKNOWN_SIZE);

    let pubdate = item.get("pubdate").and_then(parse_pubdate);

    Ok(Some(CandidateRelease {
        title,
        link,
        size,
        seeders,
        leechers,
        pubdate,
    }))
}

/// RSS dates are RFC 2822.
fn parse_pubdate(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{feed, FeedItem};
    use chrono::Datelike;

    fn parse(raw: &str) -> ParsedFeed {
        parse_feed(raw, &SearchMode::Broad, &LinkPolicy::default())
    }

    #[test]
    fn test_parse_single_item() {
        let raw = feed(&[FeedItem::new("Show.Name.S01E02.HDTV.x264", "TV")
            .seeders("12")
            .leechers("3")
            .size("1.5 GB")
            .pubdate("Tue, 04 Jun 2024 10:30:00 +0000")]);

        let parsed = parse(&raw);
        assert_eq!(parsed.failures, vec![]);
        assert_eq!(parsed.candidates.len(), 1);

        let c = &parsed.candidates[0];
        assert_eq!(c.title, "Show.Name.S01E02.HDTV.x264");
        assert!(c.link.starts_with("magnet:?xt=urn:btih:"));
        assert_eq!(c.seeders, 12);
        assert_eq!(c.leechers, 3);
        assert_eq!(c.size, 1_610_612_736);
        assert_eq!(c.pubdate.map(|d| d.year()), Some(2024));
    }

    #[test]
    fn test_category_filter() {
        let raw = feed(&[
            FeedItem::new("Some.Movie.2019.1080p", "Video » Movies"),
            FeedItem::new("Show.S01E01", "Video » TV"),
            FeedItem::new("Anime.Show.01", "Video » Anime"),
        ]);

        let parsed = parse(&raw);
        let titles: Vec<_> = parsed.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Show.S01E01", "Anime.Show.01"]);
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_malformed_item_is_isolated() {
        let raw = feed(&[
            FeedItem::new("First.S01E01", "TV"),
            FeedItem::new("Broken.S01E02", "TV").without_category(),
            FeedItem::new("Third.S01E03", "TV"),
            FeedItem::new("Fourth.S01E04", "TV"),
        ]);

        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 3);
        assert_eq!(parsed.candidates[2].title, "Fourth.S01E04");
        assert_eq!(
            parsed.failures,
            vec![ItemParseError::MissingField {
                index: 1,
                field: "category"
            }]
        );
    }

    #[test]
    fn test_broken_xml_item_is_isolated() {
        let good = FeedItem::new("Good.S01E01", "TV").to_xml();
        let raw = format!(
            "<?xml version=\"1.0\"?><rss><channel>{}<item><title>Bad</titel><category>TV</category></item>{}</channel></rss>",
            good,
            FeedItem::new("Also.Good.S01E02", "TV").to_xml()
        );

        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.failures.len(), 1);
        assert!(matches!(
            parsed.failures[0],
            ItemParseError::Malformed { index: 1, .. }
        ));
    }

    #[test]
    fn test_truncated_document() {
        let good = FeedItem::new("Good.S01E01", "TV").to_xml();
        let raw = format!(
            "<?xml version=\"1.0\"?><rss><channel>{}<item><title>Cut off",
            good
        );

        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.failures.len(), 1);
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let raw = feed(&[FeedItem::new("Show.S01E01", "TV").seeders("lots")]);
        let parsed = parse(&raw);
        assert_eq!(parsed.candidates[0].seeders, 0);
        assert_eq!(parsed.candidates[0].leechers, 0);
    }

    #[test]
    fn test_unparsable_size_is_unknown() {
        let raw = feed(&[FeedItem::new("Show.S01E01", "TV").size("huge")]);
        let parsed = parse(&raw);
        assert_eq!(parsed.candidates[0].size, UNKNOWN_SIZE);

        let raw = feed(&[FeedItem::new("Show.S01E01", "TV")]);
        let parsed = parse(&raw);
        assert_eq!(parsed.candidates[0].size, UNKNOWN_SIZE);
    }

    #[test]
    fn test_empty_title_is_skipped() {
        let raw = feed(&[FeedItem::new("", "TV"), FeedItem::new("Show.S01E01", "TV")]);
        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_magnet_gets_custom_trackers() {
        let policy = LinkPolicy {
            custom_trackers: "&tr=udp://tracker.example:80".to_string(),
            ..Default::default()
        };
        let raw = feed(&[FeedItem::new("Show.S01E01", "TV").magnet("magnet:?xt=urn:btih:abc")]);

        let parsed = parse_feed(&raw, &SearchMode::Broad, &policy);
        assert_eq!(
            parsed.candidates[0].link,
            "magnet:?xt=urn:btih:abc&tr=udp://tracker.example:80"
        );
    }

    #[test]
    fn test_direct_link_kept_for_blackhole_on_cache_host() {
        let policy = LinkPolicy {
            prefer_direct: true,
            ..Default::default()
        };
        let raw = feed(&[
            FeedItem::new("Cached.S01E01", "TV").enclosure("http://torcache.net/torrent/ABC.torrent"),
            FeedItem::new("Elsewhere.S01E02", "TV").enclosure("http://files.example/ABC.torrent"),
        ]);

        let parsed = parse_feed(&raw, &SearchMode::Broad, &policy);
        assert_eq!(parsed.candidates[0].link, "http://torcache.net/torrent/ABC.torrent");
        assert!(parsed.candidates[1].link.starts_with("magnet:"));
    }

    #[test]
    fn test_direct_link_ignored_without_blackhole() {
        let raw = feed(&[
            FeedItem::new("Cached.S01E01", "TV").enclosure("http://torcache.net/torrent/ABC.torrent")
        ]);
        let parsed = parse(&raw);
        assert!(parsed.candidates[0].link.starts_with("magnet:"));
    }

    #[test]
    fn test_missing_magnet_is_a_failure() {
        let raw = feed(&[FeedItem::new("Show.S01E01", "TV").without_magnet()]);
        let parsed = parse(&raw);
        assert!(parsed.candidates.is_empty());
        assert_eq!(
            parsed.failures,
            vec![ItemParseError::MissingField {
                index: 0,
                field: "magneturi"
            }]
        );
    }

    #[test]
    fn test_missing_enclosure_is_a_failure() {
        let raw = feed(&[FeedItem::new("Show.S01E01", "TV").without_enclosure()]);
        let parsed = parse(&raw);
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].index(), 0);
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("[CDATA[magnet:?xt=abc]]"), "magnet:?xt=abc");
        assert_eq!(strip_markers("  magnet:?xt=abc "), "magnet:?xt=abc");
        assert_eq!(strip_markers("<![CDATA[]]>"), "");
    }

    #[test]
    fn test_split_items_ignores_similar_tags() {
        let raw = "<rss><itemCount>2</itemCount><item>a</item><item id=\"2\">b</item></rss>";
        assert_eq!(
            split_items(raw),
            vec!["<item>a</item>", "<item id=\"2\">b</item>"]
        );
    }

    #[test]
    fn test_close_tag_inside_cdata_does_not_end_item() {
        let raw = format!(
            "<?xml version=\"1.0\"?><rss><channel>\
             <item><title>Valid.S01E01</title><category>TV</category>\
             <description><![CDATA[see </item> here]]></description>\
             <magnetURI><![CDATA[magnet:?xt=urn:btih:valid]]></magnetURI>\
             <enclosure url=\"https://bitsnoop.com/dl/valid.torrent\" /><numSeeders>4</numSeeders></item>\
             {}</channel></rss>",
            FeedItem::new("Next.S01E02", "TV").to_xml()
        );

        let parsed = parse(&raw);
        let titles: Vec<_> = parsed.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Valid.S01E01", "Next.S01E02"]);
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_open_tag_inside_channel_cdata_is_ignored() {
        let raw = format!(
            "<?xml version=\"1.0\"?><rss><channel>\
             <description><![CDATA[Use <item> tags]]></description>{}{}</channel></rss>",
            FeedItem::new("First.S01E01", "TV").to_xml(),
            FeedItem::new("Second.S01E02", "TV").to_xml()
        );

        let parsed = parse(&raw);
        let titles: Vec<_> = parsed.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First.S01E01", "Second.S01E02"]);
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_item_markup_inside_comment_is_ignored() {
        let raw = format!(
            "<?xml version=\"1.0\"?><rss><channel><!-- <item> and </item> -->{}</channel></rss>",
            FeedItem::new("Only.S01E01", "TV").to_xml()
        );

        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].title, "Only.S01E01");
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_truncated_document_fails_only_last_item() {
        let raw = format!(
            "<?xml version=\"1.0\"?><rss><channel>{}{}<item><title>Cut.S01E03</title><description><![CDATA[trunc",
            FeedItem::new("First.S01E01", "TV").to_xml(),
            FeedItem::new("Second.S01E02", "TV").to_xml()
        );

        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 2);
        assert_eq!(parsed.failures.len(), 1);
        assert_eq!(parsed.failures[0].index(), 2);
    }

    #[test]
    fn test_missing_title_is_a_failure() {
        let raw = feed(&[
            FeedItem::new("Untitled.S01E01", "TV").without_title(),
            FeedItem::new("Show.S01E02", "TV"),
        ]);

        let parsed = parse(&raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.failures,
            vec![ItemParseError::MissingField {
                index: 0,
                field: "title"
            }]
        );
    }

    #[test]
    fn test_self_closing_title_is_skipped() {
        let raw = "<?xml version=\"1.0\"?><rss><channel><item><title/><category>TV</category>\
                   <magnetURI>magnet:?xt=urn:btih:abc</magnetURI>\
                   <enclosure url=\"https://bitsnoop.com/dl/abc.torrent\"/></item></channel></rss>";

        let parsed = parse(raw);
        assert!(parsed.candidates.is_empty());
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_no_items() {
        let parsed = parse("<?xml version=\"1.0\"?><rss><channel></channel></rss>");
        assert!(parsed.candidates.is_empty());
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn test_parse_pubdate_invalid() {
        assert!(parse_pubdate("yesterday").is_none());
    }
}
