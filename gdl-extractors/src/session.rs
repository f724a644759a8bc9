//! Routing between the public and the authenticated host.
//!
//! Both hosts serve the same index. The authenticated one shows more results but only works with
//! a logged-in session, and login cookies are usually obtained on the public host. The
//! [`SessionRouter`] looks at the cookies each host holds, copies the session over when needed and
//! tells the extractor which host to talk to.
use log::{debug, info};
use reqwest::cookie::{CookieStore, Jar};
use std::fmt::Display;
use std::sync::Arc;
use url::Url;

/// Cookie storage that can be queried per host.
pub trait CookieJar: Send + Sync {
    /// Value of the cookie `name` that would be sent to `host`.
    fn cookie(&self, host: &Url, name: &str) -> Option<String>;

    /// Stores a host-only cookie for `host`.
    fn set_cookie(&self, host: &Url, name: &str, value: &str);
}

impl CookieJar for Jar {
    fn cookie(&self, host: &Url, name: &str) -> Option<String> {
        let header = self.cookies(host)?;
        let raw = header.to_str().ok()?;

        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    fn set_cookie(&self, host: &Url, name: &str, value: &str) {
        self.add_cookie_str(&format!("{name}={value}; Path=/"), host);
    }
}

impl<J: CookieJar + ?Sized> CookieJar for Arc<J> {
    fn cookie(&self, host: &Url, name: &str) -> Option<String> {
        (**self).cookie(host, name)
    }

    fn set_cookie(&self, host: &Url, name: &str, value: &str) {
        (**self).set_cookie(host, name, value);
    }
}

/// Which of the two hosts a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointIdentity {
    Public,
    Authenticated,
}

impl EndpointIdentity {
    #[inline]
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        match self {
            Self::Authenticated => true,
            Self::Public => false,
        }
    }
}

impl Display for EndpointIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Cookie seeded only on the authenticated host after a session is copied over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    pub value: String,
}

pub struct SessionRouter<J: CookieJar> {
    jar: J,
    public_url: Url,
    authenticated_url: Url,
    session_cookies: Vec<String>,
    marker: Option<Marker>,
}

impl<J: CookieJar> SessionRouter<J> {
    pub fn new(
        jar: J,
        public_url: Url,
        authenticated_url: Url,
        session_cookies: Vec<String>,
        marker: Option<Marker>,
    ) -> Self {
        Self {
            jar,
            public_url,
            authenticated_url,
            session_cookies,
            marker,
        }
    }

    #[must_use]
    pub const fn jar(&self) -> &J {
        &self.jar
    }

    #[must_use]
    pub fn url_for(&self, endpoint: EndpointIdentity) -> &Url {
        match endpoint {
            EndpointIdentity::Public => &self.public_url,
            EndpointIdentity::Authenticated => &self.authenticated_url,
        }
    }

    fn has_session(&self, host: &Url) -> bool {
        !self.session_cookies.is_empty()
            && self
                .session_cookies
                .iter()
                .all(|name| self.jar.cookie(host, name).is_some())
    }

    /// Authenticated when either host holds the full session.
    ///
    /// If only the public host has it, [`ensure_propagated`](Self::ensure_propagated) must run
    /// before the authenticated host is used.
    pub fn active_endpoint(&self) -> EndpointIdentity {
        if self.has_session(&self.authenticated_url) || self.has_session(&self.public_url) {
            EndpointIdentity::Authenticated
        } else {
            EndpointIdentity::Public
        }
    }

    /// Copies the session cookies from the public host to the authenticated one.
    ///
    /// Only the named session cookies are copied, then the marker cookie is seeded on the
    /// authenticated host. Does nothing when the authenticated host already has a session or the
    /// public host doesn't. Returns `true` if cookies were copied.
    pub fn ensure_propagated(&self) -> bool {
        if self.has_session(&self.authenticated_url) || !self.has_session(&self.public_url) {
            return false;
        }

        for name in &self.session_cookies {
            if let Some(value) = self.jar.cookie(&self.public_url, name) {
                self.jar.set_cookie(&self.authenticated_url, name, &value);
            }
        }

        if let Some(marker) = &self.marker {
            self.jar
                .set_cookie(&self.authenticated_url, &marker.name, &marker.value);
        }

        info!(
            "Copied session from {} to {}",
            self.public_url, self.authenticated_url
        );
        true
    }

    /// Propagates the session if needed and returns the endpoint to use with its base URL.
    pub fn resolve_endpoint(&self) -> (EndpointIdentity, &Url) {
        self.ensure_propagated();
        let endpoint = self.active_endpoint();
        debug!("Using {endpoint} endpoint");
        (endpoint, self.url_for(endpoint))
    }
}
