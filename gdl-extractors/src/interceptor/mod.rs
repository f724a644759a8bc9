//! Response interceptors run by the [`Pipeline`](crate::transport::Pipeline).
//!
//! Interceptors see the request locator together with the completed response and either return
//! a (possibly replaced) response or fail the request.
use crate::{error::ExtractorError, transport::RawResponse};
use url::Url;

pub mod crop;
pub mod ratelimit;

pub trait Interceptor: Send + Sync {
    fn intercept(&self, request: &Url, response: RawResponse) -> Result<RawResponse, ExtractorError>;
}

impl<F> Interceptor for F
where
    F: Fn(&Url, RawResponse) -> Result<RawResponse, ExtractorError> + Send + Sync,
{
    fn intercept(&self, request: &Url, response: RawResponse) -> Result<RawResponse, ExtractorError> {
        self(request, response)
    }
}
