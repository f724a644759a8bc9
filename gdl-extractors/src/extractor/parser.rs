//! Index page parsing.
//!
//! Only the parts the pagination logic needs are read here: whether the page has results at
//! all, the gallery rows and the forward navigation link.
use crate::cursor::ContinuationToken;
use crate::interceptor::crop::CropRegion;
use gdl_common::gallery::{Category, GalleryEntry};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Text the index shows instead of the result table when nothing matched.
pub const NO_HITS_MARKER: &str = "No hits found";

static RESULT_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".itg").expect("invalid selector"));
static ROWS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".itg > tbody > tr, .itg > .gl1t").expect("invalid selector")
});
static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("invalid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(".glink").expect("invalid selector"));
static THUMB: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("invalid selector"));
static CATEGORY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".cn, .cs").expect("invalid selector"));
static SPRITE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[style*=\"url(\"]").expect("invalid selector"));
static NOTICE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".searchtext, p").expect("invalid selector"));
static NEXT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a#unext[href]").expect("invalid selector"));

static GALLERY_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/g/(\d+)/([0-9a-f]+)").expect("invalid regex"));
static SPRITE_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|;)\s*width:\s*(\d+)px").expect("invalid regex"));
static SPRITE_HEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|;)\s*height:\s*(\d+)px").expect("invalid regex"));
static SPRITE_BACKGROUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"url\(([^)]+)\)\s*(-?\d+)(?:px)?\s+(-?\d+)(?:px)?").expect("invalid regex")
});

/// What an index page turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPage {
    /// The search matched nothing.
    NoHits,
    /// The result table is missing, usually because the session settings went stale.
    MissingContainer,
    Results {
        entries: Vec<GalleryEntry>,
        /// Token for the following page, [`ContinuationToken::END`] on the last one.
        next: ContinuationToken,
    },
}

/// Classifies and parses an index page. `base` resolves relative links.
pub fn parse_index_page(base: &Url, html: &str) -> IndexPage {
    let document = Html::parse_document(html);
    let container = document.select(&RESULT_CONTAINER).next();

    let entries: Vec<GalleryEntry> = container
        .map(|c| c.select(&ROWS).filter_map(|row| parse_row(base, row)).collect())
        .unwrap_or_default();

    // Titles can contain the marker too, only an empty listing counts
    if entries.is_empty() && has_no_hits_notice(&document) {
        return IndexPage::NoHits;
    }

    if container.is_none() {
        return IndexPage::MissingContainer;
    }

    let next = document
        .select(&NEXT_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok())
        .and_then(|url| next_token(&url))
        .unwrap_or(ContinuationToken::END);

    debug!("Parsed {} entries, next cursor {next}", entries.len());

    IndexPage::Results { entries, next }
}

fn has_no_hits_notice(document: &Html) -> bool {
    document
        .select(&NOTICE)
        .any(|el| collect_text(el).contains(NO_HITS_MARKER))
}

/// Reads the `next` query value of a forward link.
fn next_token(url: &Url) -> Option<ContinuationToken> {
    url.query_pairs()
        .find(|(k, _)| k == "next")
        .and_then(|(_, v)| {
            let digits: String = v.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        })
        .map(ContinuationToken::new)
}

fn parse_row(base: &Url, row: ElementRef<'_>) -> Option<GalleryEntry> {
    let (anchor, url) = row.select(&LINKS).find_map(|a| {
        let url = base.join(a.value().attr("href")?).ok()?;
        GALLERY_PATH.is_match(url.path()).then_some((a, url))
    })?;

    let caps = GALLERY_PATH.captures(url.path())?;
    let gid = caps.get(1)?.as_str().parse::<u64>().ok()?;
    let token = caps.get(2)?.as_str();

    let mut entry = GalleryEntry::new(gid, token, url.as_str());

    entry.title = row
        .select(&TITLE)
        .next()
        .map_or_else(|| collect_text(anchor), collect_text);

    entry.thumbnail = row
        .select(&THUMB)
        .next()
        .and_then(|img| {
            let src = img
                .value()
                .attr("data-src")
                .or_else(|| img.value().attr("src"))?;
            base.join(src).ok()
        })
        .or_else(|| {
            row.select(&SPRITE)
                .find_map(|div| sprite_locator(base, div.value().attr("style")?))
        })
        .map(|u| u.to_string());

    entry.category = row
        .select(&CATEGORY)
        .next()
        .and_then(|c| Category::from_label(&collect_text(c)));

    Some(entry)
}

/// Turns an inline sprite style into a locator carrying the crop region of the thumbnail.
///
/// The style places a sheet as background with negative offsets, e.g.
/// `width:100px;height:140px;background:transparent url(sheet.jpg) -200px 0 no-repeat`.
fn sprite_locator(base: &Url, style: &str) -> Option<Url> {
    let number = |re: &Regex| -> Option<u32> { re.captures(style)?.get(1)?.as_str().parse().ok() };

    let width = number(&SPRITE_WIDTH)?;
    let height = number(&SPRITE_HEIGHT)?;

    let caps = SPRITE_BACKGROUND.captures(style)?;
    let sheet = base
        .join(caps.get(1)?.as_str().trim_matches(|c| c == '\'' || c == '"'))
        .ok()?;
    let left = caps.get(2)?.as_str().parse::<i64>().ok()?.unsigned_abs();
    let top = caps.get(3)?.as_str().parse::<i64>().ok()?.unsigned_abs();

    let left = u32::try_from(left).ok()?;
    let top = u32::try_from(top).ok()?;

    let region = CropRegion::new(left, top, left.checked_add(width)?, top.checked_add(height)?);
    Some(region.locator(&sheet))
}

fn collect_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
