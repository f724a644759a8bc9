#![cfg(test)]
use crate::cursor::{ContinuationToken, CursorStore, MemoryCursorStore};
use crate::error::ExtractorError;
use crate::extractor::parser::test::index_html;
use crate::extractor::GalleryExtractor;
use crate::extractor_config::{RefreshParam, SourceConfig};
use crate::filter::SearchFilter;
use crate::interceptor::crop::CropRegion;
use crate::session::{CookieJar, Marker, SessionRouter};
use crate::transport::{HttpTransport, Pipeline, RawResponse};
use gdl_common::gallery::Category;
use reqwest::{cookie::Jar, StatusCode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const STALE_PAGE: &str =
    "<html><body><form id=\"dms\"><select><option>Compact</option></select></form></body></html>";

const NO_HITS_PAGE: &str =
    "<html><body><div class=\"searchtext\"><p>No hits found</p></div></body></html>";

/// Transport that answers with canned responses in order and records every request.
#[derive(Default)]
struct FakeTransport {
    responses: Mutex<VecDeque<(StatusCode, Vec<u8>)>>,
    requests: Mutex<Vec<Url>>,
}

impl FakeTransport {
    fn with_pages(pages: &[&str]) -> Self {
        let fake = Self::default();
        for page in pages {
            fake.push(StatusCode::OK, page.as_bytes().to_vec());
        }
        fake
    }

    fn push(&self, status: StatusCode, body: Vec<u8>) {
        self.responses.lock().unwrap().push_back((status, body));
    }

    fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, ExtractorError> {
        self.requests.lock().unwrap().push(url.clone());

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {url}"));

        Ok(RawResponse::new(url.clone(), status, body))
    }
}

type TestExtractor = GalleryExtractor<FakeTransport, MemoryCursorStore, Arc<Jar>>;

fn extractor(transport: FakeTransport) -> TestExtractor {
    let config = SourceConfig::default();

    let router = SessionRouter::new(
        Arc::new(Jar::default()),
        config.public_url().unwrap(),
        config.authenticated_url().unwrap(),
        config.session_cookies.clone(),
        Some(Marker {
            name: "yay".to_string(),
            value: "louder".to_string(),
        }),
    );

    GalleryExtractor::new(
        Pipeline::with_default_chain(transport, config.ban_body_threshold),
        MemoryCursorStore::new(),
        router,
        RefreshParam::default(),
    )
}

fn query(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn filter() -> SearchFilter {
    SearchFilter::new()
        .term("cats")
        .include("female:glasses".parse().unwrap())
}

#[tokio::test]
async fn next_page_uses_parsed_cursor() {
    let first = index_html(Some(1_999_999));
    let last = index_html(None);
    let ext = extractor(FakeTransport::with_pages(&[&first, &last]));
    let filter = filter();
    let fp = filter.fingerprint();

    let page0 = ext.fetch_page(fp, 0, &filter).await.unwrap();
    assert_eq!(page0.len(), 2);
    assert_eq!(
        ext.cursors().get(fp, 1),
        Some(ContinuationToken::new(1_999_999))
    );
    assert!(ext.has_next_page(fp, 0));

    let page1 = ext.fetch_page(fp, 1, &filter).await.unwrap();
    assert_eq!(page1.len(), 2);
    assert!(!ext.has_next_page(fp, 1));

    let requests = ext.pipeline().transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(query(&requests[0], "next"), None);
    assert_eq!(query(&requests[1], "next").as_deref(), Some("1999999"));

    // Past the last page nothing is requested
    assert!(ext.fetch_page(fp, 2, &filter).await.unwrap().is_empty());
    assert_eq!(ext.pipeline().transport().requests().len(), 2);
}

#[tokio::test]
async fn skipping_a_page_is_an_error() {
    let ext = extractor(FakeTransport::default());
    let filter = filter();

    let err = ext.search(&filter, 2).await.unwrap_err();
    assert!(matches!(
        err,
        ExtractorError::CursorMissing { page: 2, fingerprint } if fingerprint == filter.fingerprint()
    ));
    assert!(ext.pipeline().transport().requests().is_empty());
}

#[tokio::test]
async fn request_carries_search_and_category_mask() {
    let ext = extractor(FakeTransport::with_pages(&[&index_html(None)]));
    let filter = filter()
        .exclude_category(Category::Misc)
        .exclude_category(Category::Western);

    ext.search(&filter, 0).await.unwrap();

    let request = &ext.pipeline().transport().requests()[0];
    assert_eq!(request.host_str(), Some("e-hentai.org"));

    let search = query(request, "f_search").unwrap();
    assert_eq!(search, filter.search_query());
    assert!(search.starts_with("cats "));
    assert!(search.contains("female:\"glasses$\""));

    assert_eq!(query(request, "f_cats").as_deref(), Some("513"));
    assert_eq!(query(request, "inline_set"), None);
}

#[tokio::test]
async fn stale_session_is_refreshed_once() {
    let ext = extractor(FakeTransport::with_pages(&[STALE_PAGE, &index_html(Some(42))]));
    let filter = filter();

    let entries = ext.search(&filter, 0).await.unwrap();
    assert_eq!(entries.len(), 2);

    let requests = ext.pipeline().transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(query(&requests[0], "inline_set"), None);
    assert_eq!(query(&requests[1], "inline_set").as_deref(), Some("dm_l"));
    assert_eq!(
        ext.cursors().get(filter.fingerprint(), 1),
        Some(ContinuationToken::new(42))
    );
}

#[tokio::test]
async fn stale_session_twice_is_a_parse_failure() {
    let ext = extractor(FakeTransport::with_pages(&[STALE_PAGE, STALE_PAGE]));
    let filter = filter();

    let err = ext.search(&filter, 0).await.unwrap_err();
    match err {
        ExtractorError::ParseFailure { url, .. } => {
            assert_eq!(query(&url, "inline_set").as_deref(), Some("dm_l"));
        }
        other => panic!("expected ParseFailure, got {other:?}"),
    }

    assert_eq!(ext.pipeline().transport().requests().len(), 2);
    assert!(!ext.has_next_page(filter.fingerprint(), 0));
}

#[tokio::test]
async fn no_hits_is_an_empty_page() {
    let ext = extractor(FakeTransport::with_pages(&[NO_HITS_PAGE]));
    let filter = filter();

    assert!(ext.search(&filter, 0).await.unwrap().is_empty());
    assert_eq!(ext.pipeline().transport().requests().len(), 1);
    assert_eq!(ext.cursors().get(filter.fingerprint(), 1), None);
}

#[tokio::test]
async fn ban_is_propagated_without_retry() {
    let ext = extractor(FakeTransport::with_pages(&[
        "Your IP address has been temporarily banned for excessive pageloads. The ban expires in 2 hours and 30 minutes",
    ]));
    let filter = filter();

    let err = ext.search(&filter, 0).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(9000)));

    assert_eq!(ext.pipeline().transport().requests().len(), 1);
    assert_eq!(ext.cursors().get(filter.fingerprint(), 1), None);
}

#[tokio::test]
async fn error_status_is_reported() {
    let transport = FakeTransport::default();
    transport.push(StatusCode::SERVICE_UNAVAILABLE, b"busy".to_vec());
    let ext = extractor(transport);

    let err = ext.search(&filter(), 0).await.unwrap_err();
    assert!(matches!(
        err,
        ExtractorError::ServerStatus { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
    ));
}

#[tokio::test]
async fn logged_in_session_uses_authenticated_host() {
    let ext = extractor(FakeTransport::with_pages(&[&index_html(None)]));
    let jar = ext.router().jar();
    let public = Url::parse("https://e-hentai.org/").unwrap();
    let members = Url::parse("https://exhentai.org/").unwrap();

    jar.set_cookie(&public, "ipb_member_id", "1234");
    jar.set_cookie(&public, "ipb_pass_hash", "abcdef");

    ext.search(&filter(), 0).await.unwrap();

    let request = &ext.pipeline().transport().requests()[0];
    assert_eq!(request.host_str(), Some("exhentai.org"));
    assert_eq!(jar.cookie(&members, "ipb_member_id").as_deref(), Some("1234"));
    assert_eq!(jar.cookie(&members, "ipb_pass_hash").as_deref(), Some("abcdef"));
    assert_eq!(jar.cookie(&members, "yay").as_deref(), Some("louder"));
}

#[tokio::test]
async fn full_search_walks_until_the_last_page() {
    let ext = extractor(FakeTransport::with_pages(&[
        &index_html(Some(30)),
        &index_html(Some(20)),
        &index_html(None),
    ]));

    let entries = ext.full_search(&filter(), None).await.unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(ext.pipeline().transport().requests().len(), 3);
}

#[tokio::test]
async fn full_search_honors_limit() {
    let ext = extractor(FakeTransport::with_pages(&[
        &index_html(Some(30)),
        &index_html(Some(20)),
    ]));

    let entries = ext.full_search(&filter(), Some(1)).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(ext.pipeline().transport().requests().len(), 1);
}

#[tokio::test]
async fn fetch_image_applies_crop() {
    use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    let sheet: RgbImage = ImageBuffer::from_fn(40, 40, |x, y| Rgb([x as u8, y as u8, 0]));
    let mut png = Cursor::new(Vec::new());
    sheet.write_to(&mut png, ImageFormat::Png).unwrap();

    let transport = FakeTransport::default();
    transport.push(StatusCode::OK, png.into_inner());
    let ext = extractor(transport);

    let sprite = Url::parse("https://ehgt.org/m/000123/sprite.png").unwrap();
    let locator = CropRegion::new(10, 0, 30, 20).locator(&sprite);
    let bytes = ext.fetch_image(&locator).await.unwrap();

    let out = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(out.dimensions(), (20, 20));
    assert_eq!(out.get_pixel(0, 0), &Rgb([10, 0, 0]));
}
