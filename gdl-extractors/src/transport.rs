//! HTTP plumbing: a minimal transport trait, its `reqwest` implementation and the interceptor
//! pipeline every request goes through.
use crate::error::ExtractorError;
use crate::interceptor::{crop::CropInterceptor, ratelimit::RateLimitInterceptor, Interceptor};
use gdl_common::bytes::Bytes;
use log::debug;
use reqwest::{cookie::Jar, header::HeaderMap, Client, StatusCode};
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Fully buffered response.
///
/// The body is kept as [`Bytes`], so interceptors can look at it without consuming it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Lossy UTF-8 view of the body.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Anything able to perform a GET and hand back a buffered response.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<RawResponse, ExtractorError>> + Send;
}

/// [`HttpTransport`] backed by a `reqwest::Client` sharing a cookie jar with the session router.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, jar: Arc<Jar>) -> Result<Self, ExtractorError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_provider(jar)
            .build()?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns the used client for external use.
    #[must_use]
    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, ExtractorError> {
        // Fragments never reach the server, they only matter to the interceptors
        let mut target = url.clone();
        target.set_fragment(None);

        debug!("GET {target}");
        let response = self.client.get(target).send().await?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!("{status} from {final_url} ({} bytes)", body.len());

        Ok(RawResponse {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

/// A transport wrapped with an ordered list of response interceptors.
///
/// Every completed response runs through each interceptor once, in order, before it is handed
/// back. Any interceptor can replace the response or turn it into an error.
pub struct Pipeline<T: HttpTransport> {
    transport: T,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl<T: HttpTransport> Pipeline<T> {
    /// Pipeline without interceptors.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            interceptors: Vec::new(),
        }
    }

    /// Ban detection first, then thumbnail cropping.
    pub fn with_default_chain(transport: T, ban_body_threshold: usize) -> Self {
        Self::new(transport)
            .with(RateLimitInterceptor::new(ban_body_threshold))
            .with(CropInterceptor)
    }

    #[must_use]
    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn execute(&self, url: &Url) -> Result<RawResponse, ExtractorError> {
        let mut response = self.transport.get(url).await?;

        for interceptor in &self.interceptors {
            response = interceptor.intercept(url, response)?;
        }

        Ok(response)
    }
}
