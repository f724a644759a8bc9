//! Detection of temporary IP bans.
//!
//! The server doesn't use a status code for bans. It answers with a tiny plain-text body saying
//! the IP was banned and for how long, e.g.
//! `Your IP address has been temporarily banned for excessive pageloads ... The ban expires in 2 hours and 30 minutes`.
use super::Interceptor;
use crate::{error::ExtractorError, transport::RawResponse};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BAN_BODY_THRESHOLD: usize = 256;

const BAN_PHRASE: &str = "IP address has been temporarily banned";

static HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s+hours?").expect("invalid regex"));
static MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s+minutes?").expect("invalid regex"));
static SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s+seconds?").expect("invalid regex"));

/// Turns ban notices into [`ExtractorError::RateLimited`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInterceptor {
    /// Bodies longer than this are never ban notices.
    threshold: usize,
}

impl Default for RateLimitInterceptor {
    fn default() -> Self {
        Self::new(DEFAULT_BAN_BODY_THRESHOLD)
    }
}

impl RateLimitInterceptor {
    #[must_use]
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

/// Parses the ban duration out of a notice. Missing units count as zero.
pub fn parse_ban_duration(text: &str) -> Duration {
    let grab = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    let hours = grab(&HOURS);
    let minutes = grab(&MINUTES);
    let seconds = grab(&SECONDS);

    Duration::from_secs(
        hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds),
    )
}

impl Interceptor for RateLimitInterceptor {
    fn intercept(&self, request: &Url, response: RawResponse) -> Result<RawResponse, ExtractorError> {
        if response.body.len() > self.threshold {
            return Ok(response);
        }

        let text = response.text();
        if !text.contains(BAN_PHRASE) {
            return Ok(response);
        }

        let retry_after = parse_ban_duration(&text);
        warn!(
            "Banned while fetching {request}, ban lifts in {}s",
            retry_after.as_secs()
        );

        Err(ExtractorError::RateLimited {
            url: request.clone(),
            retry_after,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use reqwest::StatusCode;

    fn url() -> Url {
        Url::parse("https://e-hentai.org/?f_search=test").unwrap()
    }

    fn run(body: &[u8]) -> Result<RawResponse, ExtractorError> {
        RateLimitInterceptor::default().intercept(&url(), RawResponse::new(url(), StatusCode::OK, body.to_vec()))
    }

    #[test]
    fn hours_and_minutes() {
        let body = b"Your IP address has been temporarily banned for excessive pageloads which indicates that you are using automated mirroring/harvesting software. The ban expires in 2 hours and 30 minutes";
        assert!(body.len() <= 256);

        match run(body) {
            Err(ExtractorError::RateLimited { url: u, retry_after }) => {
                assert_eq!(u, url());
                assert_eq!(retry_after, Duration::from_secs(2 * 3600 + 30 * 60));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn singular_units_and_seconds() {
        let text = "IP address has been temporarily banned. The ban expires in 1 hour, 1 minute and 9 seconds";
        assert_eq!(parse_ban_duration(text), Duration::from_secs(3600 + 60 + 9));
    }

    #[test]
    fn missing_units_default_to_zero() {
        let err = run(b"Your IP address has been temporarily banned. The ban expires in 45 seconds").unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(45)));

        let err = run(b"Your IP address has been temporarily banned.").unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::ZERO));
    }

    #[test]
    fn regular_bodies_pass_untouched() {
        let short = b"<html>ok</html>".to_vec();
        assert_eq!(run(&short).unwrap().body, short);

        let mut long = b"<html>".to_vec();
        long.extend(std::iter::repeat(b'x').take(10_000));
        long.extend(b"</html>");
        assert_eq!(run(&long).unwrap().body, long);

        let binary = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
        assert_eq!(run(&binary).unwrap().body, binary);
    }

    #[test]
    fn ban_phrase_in_long_body_is_ignored() {
        let mut body = b"Your IP address has been temporarily banned. 2 hours".to_vec();
        body.extend(std::iter::repeat(b' ').take(300));

        let response = run(&body).unwrap();
        assert_eq!(response.body, body);
    }
}
