//! Paginated retrieval of gallery index pages.
//! # Extractor
//!
//! [`GalleryExtractor`] ties the other building blocks together: it looks up the continuation
//! token for the requested page in its [`CursorStore`], asks the [`SessionRouter`] which host to
//! use, sends the request through the interceptor [`Pipeline`] and parses the result, storing the
//! token for the page after it.
//!
//! Pages of one search must be requested in order. Asking for page `n` before page `n - 1` was
//! fetched fails with [`ExtractorError::CursorMissing`].
use crate::cursor::{continuation_token, ContinuationToken, CursorStore, MemoryCursorStore};
use crate::error::ExtractorError;
use crate::extractor_config::{RefreshParam, SourceConfig};
use crate::filter::{Fingerprint, SearchFilter};
use crate::session::{CookieJar, SessionRouter};
use crate::transport::{HttpTransport, Pipeline, ReqwestTransport};
use gdl_common::bytes::Bytes;
use gdl_common::gallery::GalleryEntry;
use log::{debug, info};
use reqwest::cookie::Jar;
use std::num::NonZeroUsize;
use std::sync::Arc;
use url::Url;

pub mod parser;

use parser::{parse_index_page, IndexPage};

/// Extractor wired with the production transport, an in-memory cursor store and a shared
/// `reqwest` cookie jar.
pub type DefaultExtractor = GalleryExtractor<ReqwestTransport, MemoryCursorStore, Arc<Jar>>;

pub struct GalleryExtractor<T: HttpTransport, C: CursorStore, J: CookieJar> {
    pipeline: Pipeline<T>,
    cursors: C,
    router: SessionRouter<J>,
    refresh_param: RefreshParam,
}

impl DefaultExtractor {
    /// Sets up an extractor for `config` with an empty cookie jar.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ExtractorError> {
        Self::from_config_with_jar(config, Arc::new(Jar::default()))
    }

    /// Same as [`from_config`](Self::from_config), sharing `jar` with the caller.
    ///
    /// Seed the jar with session cookies beforehand to use the authenticated host.
    pub fn from_config_with_jar(config: &SourceConfig, jar: Arc<Jar>) -> Result<Self, ExtractorError> {
        let public_url = config.public_url()?;
        let authenticated_url = config.authenticated_url()?;

        let transport = ReqwestTransport::new(&config.user_agent, jar.clone())?;
        let pipeline = Pipeline::with_default_chain(transport, config.ban_body_threshold);

        let cursors = match config.cursor_capacity.and_then(NonZeroUsize::new) {
            Some(limit) => MemoryCursorStore::with_capacity_limit(limit),
            None => MemoryCursorStore::new(),
        };

        let router = SessionRouter::new(
            jar,
            public_url,
            authenticated_url,
            config.session_cookies.clone(),
            config.marker_cookie.clone().map(Into::into),
        );

        debug!("Built extractor for source {config}");

        Ok(Self::new(
            pipeline,
            cursors,
            router,
            config.refresh_param.clone(),
        ))
    }
}

impl<T: HttpTransport, C: CursorStore, J: CookieJar> GalleryExtractor<T, C, J> {
    pub const fn new(
        pipeline: Pipeline<T>,
        cursors: C,
        router: SessionRouter<J>,
        refresh_param: RefreshParam,
    ) -> Self {
        Self {
            pipeline,
            cursors,
            router,
            refresh_param,
        }
    }

    #[must_use]
    pub const fn cursors(&self) -> &C {
        &self.cursors
    }

    #[must_use]
    pub const fn router(&self) -> &SessionRouter<J> {
        &self.router
    }

    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline<T> {
        &self.pipeline
    }

    /// Fetches `page` of the search described by `filter`.
    pub async fn search(
        &self,
        filter: &SearchFilter,
        page: u32,
    ) -> Result<Vec<GalleryEntry>, ExtractorError> {
        self.fetch_page(filter.fingerprint(), page, filter).await
    }

    /// Fetches pages starting at 0 until the last one, or until `limit` pages were read.
    pub async fn full_search(
        &self,
        filter: &SearchFilter,
        limit: Option<u32>,
    ) -> Result<Vec<GalleryEntry>, ExtractorError> {
        let fingerprint = filter.fingerprint();
        let mut entries = Vec::new();
        let mut page = 0;

        loop {
            if limit.is_some_and(|l| page >= l) {
                break;
            }

            let list = self.fetch_page(fingerprint, page, filter).await?;
            entries.extend(list);

            if !self.has_next_page(fingerprint, page) {
                break;
            }
            page += 1;
        }

        debug!("Collected {} entries over {} pages", entries.len(), page + 1);
        Ok(entries)
    }

    /// Fetches one index page.
    ///
    /// `fingerprint` must be the fingerprint of `filter`. It is taken separately so callers that
    /// already computed it don't hash the filter on every page.
    ///
    /// A page without the result container usually means the server-side display settings of
    /// the session went stale. In that case the request is repeated once with the refresh
    /// parameter, and a second miss is a [`ExtractorError::ParseFailure`].
    pub async fn fetch_page(
        &self,
        fingerprint: Fingerprint,
        page: u32,
        filter: &SearchFilter,
    ) -> Result<Vec<GalleryEntry>, ExtractorError> {
        let mut forced_refresh = false;

        loop {
            let token = continuation_token(&self.cursors, fingerprint, page)?;

            if token.is_end() {
                debug!("Page {page} of {fingerprint} is past the last page");
                return Ok(Vec::new());
            }

            let (endpoint, base) = self.router.resolve_endpoint();
            let url = self.page_url(base, filter, token, forced_refresh);

            debug!("Fetching page {page} from the {endpoint} host: {url}");
            let response = self.pipeline.execute(&url).await?;

            if !response.status.is_success() {
                return Err(ExtractorError::ServerStatus {
                    url,
                    status: response.status,
                });
            }

            match parse_index_page(&response.url, &response.text()) {
                IndexPage::NoHits => {
                    debug!("No hits for {fingerprint}");
                    return Ok(Vec::new());
                }
                IndexPage::MissingContainer if !forced_refresh => {
                    info!("Result list missing on page {page}, retrying with a settings refresh");
                    forced_refresh = true;
                }
                IndexPage::MissingContainer => {
                    return Err(ExtractorError::ParseFailure {
                        url,
                        reason: String::from("result list missing after a settings refresh"),
                    });
                }
                IndexPage::Results { entries, next } => {
                    self.cursors
                        .put(fingerprint, page.saturating_add(1), next);
                    return Ok(entries);
                }
            }
        }
    }

    /// Whether `page + 1` of the search can be fetched right now.
    pub fn has_next_page(&self, fingerprint: Fingerprint, page: u32) -> bool {
        self.cursors
            .get(fingerprint, page.saturating_add(1))
            .is_some_and(|token| !token.is_end())
    }

    /// Downloads an image through the pipeline.
    ///
    /// A crop region in the URL fragment (`#left,top,right,bottom`) is applied to the result.
    pub async fn fetch_image(&self, url: &Url) -> Result<Bytes, ExtractorError> {
        let response = self.pipeline.execute(url).await?;

        if !response.status.is_success() {
            return Err(ExtractorError::ServerStatus {
                url: url.clone(),
                status: response.status,
            });
        }

        Ok(response.body)
    }

    fn page_url(
        &self,
        base: &Url,
        filter: &SearchFilter,
        token: ContinuationToken,
        forced_refresh: bool,
    ) -> Url {
        let mut url = base.clone();

        {
            let mut query = url.query_pairs_mut();

            let search = filter.search_query();
            if !search.is_empty() {
                query.append_pair("f_search", &search);
            }

            let cats = filter.excluded_categories.bits();
            if cats != 0 {
                query.append_pair("f_cats", &cats.to_string());
            }

            if !token.is_start() {
                query.append_pair("next", &token.to_string());
            }

            if forced_refresh {
                query.append_pair(&self.refresh_param.name, &self.refresh_param.value);
            }
        }

        url
    }
}
