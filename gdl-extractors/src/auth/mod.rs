//! Persistence of logged-in session cookies.
//!
//! Logging in happens out of band (a browser hands out the session cookies). Those cookies are
//! kept in a small bincode file per source and seeded into the cookie jar on startup, so the
//! [`SessionRouter`](crate::session::SessionRouter) can pick the authenticated host.
use bincode::{deserialize, serialize};
use gdl_common::serde::{self, Deserialize, Serialize};
use gdl_common::{bincode, log, tokio};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::extractor_config::SourceConfig;
use crate::session::CookieJar;

#[derive(Error, Debug)]
pub enum Error {
    /// Indicates any unrecoverable IO error when trying to read or write the cache file.
    #[error("Failed to access session cache. error: {source}")]
    CacheIOError {
        #[from]
        source: io::Error,
    },

    /// Indicates a failed attempt to serialize the cache file to `bincode`.
    #[error("Failed to encode session cache")]
    CacheEncodeError,

    /// The cache file exists but is not a valid session cache.
    #[error("Failed to decode session cache at {}", .path.display())]
    CacheDecodeError { path: PathBuf },

    #[error("No stored session for {name}. Run `gdl login` first")]
    MissingCache { name: String },

    #[error("Session for {name} is missing cookie {cookie}")]
    IncompleteSession { name: String, cookie: String },
}

/// Session cookies of one source, in the order the source config lists them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct SessionCookies {
    /// Name of the [`SourceConfig`] the cookies belong to. Also used as the cache file name.
    source: String,
    pub cookies: Vec<(String, String)>,
}

impl SessionCookies {
    #[must_use]
    pub const fn new(source: String, cookies: Vec<(String, String)>) -> Self {
        Self { source, cookies }
    }

    /// Pairs the source's session cookie names with `values`, in order.
    pub fn from_values(config: &SourceConfig, values: &[&str]) -> Result<Self, Error> {
        let mut cookies = Vec::with_capacity(config.session_cookies.len());

        for (idx, name) in config.session_cookies.iter().enumerate() {
            let Some(value) = values.get(idx) else {
                return Err(Error::IncompleteSession {
                    name: config.name.clone(),
                    cookie: name.clone(),
                });
            };
            cookies.push((name.clone(), (*value).to_string()));
        }

        Ok(Self::new(config.name.clone(), cookies))
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Installs the cookies on `host`.
    pub fn seed<J: CookieJar + ?Sized>(&self, jar: &J, host: &Url) {
        for (name, value) in &self.cookies {
            jar.set_cookie(host, name, value);
        }
        debug!("Seeded {} session cookies for {host}", self.cookies.len());
    }

    /// Reads the cached session of `source` from the default cache directory.
    pub async fn read_cache(source: &str) -> Result<Self, Error> {
        Self::read_cache_from(&gdl_common::cache_dir()?, source).await
    }

    pub async fn read_cache_from(dir: &Path, source: &str) -> Result<Self, Error> {
        let path = dir.join(Path::new(source));

        if !path.exists() {
            return Err(Error::MissingCache {
                name: source.to_string(),
            });
        }

        let bytes = tokio::fs::read(&path).await?;
        let Ok(cookies) = deserialize::<Self>(&bytes) else {
            return Err(Error::CacheDecodeError { path });
        };

        debug!("Read session cache from {}", path.display());
        Ok(cookies)
    }

    /// Generates a bincode file that contains all the data from `self` and saves
    /// it in the directory provided by [`gdl_common::cache_dir`].
    pub async fn write_cache(&self) -> Result<PathBuf, Error> {
        self.write_cache_to(&gdl_common::cache_dir()?).await
    }

    pub async fn write_cache_to(&self, dir: &Path) -> Result<PathBuf, Error> {
        let config_path = dir.join(Path::new(&self.source));
        let mut cfg_cache = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&config_path)
            .await?;

        let Ok(bytes) = serialize(&self) else {
            return Err(Error::CacheEncodeError);
        };

        cfg_cache.write_all(&bytes).await?;
        debug!("Wrote session cache to {}", &config_path.display());
        Ok(config_path)
    }
}
