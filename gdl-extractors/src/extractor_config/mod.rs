//! Per-source settings: hosts, cookie names and the tunables of the retrieval engine.
use gdl_common::serde::{self, Deserialize, Serialize};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Display;
use std::io;
use thiserror::Error;
use url::Url;

use crate::interceptor::ratelimit::DEFAULT_BAN_BODY_THRESHOLD;
use crate::session::Marker;
use crate::source_config;

pub(crate) const DEFAULT_UA: &str =
    concat!("Rust Gallery Index Extractor/", env!("CARGO_PKG_VERSION"));

pub mod macros;
pub mod serialize;

pub static DEFAULT_SOURCES: Lazy<HashMap<String, SourceConfig>> = Lazy::new(|| {
    let mut hmap = HashMap::with_capacity(1);
    hmap.insert(
        "e-hentai".to_string(),
        source_config!(
            "e-hentai",
            "E-Hentai",
            "https://e-hentai.org/",
            "https://exhentai.org/",
            DEFAULT_UA,
            ["ipb_member_id", "ipb_pass_hash"],
            Some(MarkerCookie::new("yay", "louder")),
            DEFAULT_BAN_BODY_THRESHOLD,
            RefreshParam::default(),
            None
        ),
    );
    hmap
});

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access source config file: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Failed to parse source config file: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },

    #[error("Source {name} has an invalid {field}: {source}")]
    InvalidUrl {
        name: String,
        field: &'static str,
        source: url::ParseError,
    },
}

/// Cookie set on the authenticated host alongside the copied session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct MarkerCookie {
    pub name: String,
    pub value: String,
}

impl MarkerCookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<MarkerCookie> for Marker {
    fn from(value: MarkerCookie) -> Self {
        Self {
            name: value.name,
            value: value.value,
        }
    }
}

/// Query parameter that makes the server reset the listing display mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct RefreshParam {
    pub name: String,
    pub value: String,
}

impl Default for RefreshParam {
    fn default() -> Self {
        Self {
            name: String::from("inline_set"),
            value: String::from("dm_l"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SourceConfig {
    pub name: String,
    pub pretty_name: String,
    pub public_url: String,
    pub authenticated_url: String,
    pub user_agent: String,
    /// Cookies that together make up a logged-in session.
    pub session_cookies: Vec<String>,
    pub marker_cookie: Option<MarkerCookie>,
    /// Bodies up to this size are checked for ban notices.
    pub ban_body_threshold: usize,
    pub refresh_param: RefreshParam,
    /// Maximum number of searches whose cursors are kept. Unbounded when `None`.
    pub cursor_capacity: Option<usize>,
}

impl SourceConfig {
    pub fn public_url(&self) -> Result<Url, ConfigError> {
        self.parse_url("public_url", &self.public_url)
    }

    pub fn authenticated_url(&self) -> Result<Url, ConfigError> {
        self.parse_url("authenticated_url", &self.authenticated_url)
    }

    fn parse_url(&self, field: &'static str, raw: &str) -> Result<Url, ConfigError> {
        Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            name: self.name.clone(),
            field,
            source,
        })
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        source_config!(
            "e-hentai",
            "E-Hentai",
            "https://e-hentai.org/",
            "https://exhentai.org/",
            DEFAULT_UA,
            ["ipb_member_id", "ipb_pass_hash"],
            Some(MarkerCookie::new("yay", "louder")),
            DEFAULT_BAN_BODY_THRESHOLD,
            RefreshParam::default(),
            None
        )
    }
}

impl Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_source_matches_builtin() {
        let builtin = DEFAULT_SOURCES.get("e-hentai").unwrap();
        let default = SourceConfig::default();

        assert_eq!(builtin.name, default.name);
        assert_eq!(builtin.session_cookies, default.session_cookies);
        assert_eq!(default.refresh_param.name, "inline_set");
        assert_eq!(default.ban_body_threshold, 256);
        assert_eq!(default.public_url().unwrap().host_str(), Some("e-hentai.org"));
        assert_eq!(
            default.authenticated_url().unwrap().host_str(),
            Some("exhentai.org")
        );
    }

    #[test]
    fn invalid_url_names_the_field() {
        let mut cfg = SourceConfig::default();
        cfg.authenticated_url = String::from("not a url");

        match cfg.authenticated_url() {
            Err(ConfigError::InvalidUrl { name, field, .. }) => {
                assert_eq!(name, "e-hentai");
                assert_eq!(field, "authenticated_url");
            }
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
    }
}
