//! Main representation of a gallery listed by an index page
//!
//! # GalleryEntry
//! A [`GalleryEntry` struct](GalleryEntry) is the minimum set of info needed to identify a gallery
//! and open it later: its numeric id, the access token paired with it and the canonical URL.
use serde::{Deserialize, Serialize};

use std::{cmp::Ordering, fmt::Debug};

pub use self::category::Category;

pub mod category;

/// Catchall model for one row of a gallery index page.
#[derive(Clone, Serialize, Deserialize, Eq)]
pub struct GalleryEntry {
    /// Numeric gallery id given by the index
    pub gid: u64,
    /// Access token that must accompany the id on gallery URLs
    pub token: String,
    /// Canonical gallery URL
    pub url: String,
    /// Display title as shown in the index
    pub title: String,
    /// Thumbnail locator, if the current display mode shows one.
    ///
    /// Sprite thumbnails carry their crop rectangle in the URL fragment.
    pub thumbnail: Option<String>,
    pub category: Option<Category>,
}

impl GalleryEntry {
    pub fn new(gid: u64, token: &str, url: &str) -> Self {
        Self {
            gid,
            token: token.to_string(),
            url: url.to_string(),
            title: String::new(),
            thumbnail: None,
            category: None,
        }
    }
}

impl Debug for GalleryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryEntry")
            .field("Gallery ID", &self.gid)
            .field("Token", &self.token)
            .field("URL", &self.url)
            .field("Title", &self.title)
            .field("Thumbnail", &self.thumbnail)
            .field("Category", &self.category)
            .finish()
    }
}

impl Ord for GalleryEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gid.cmp(&other.gid)
    }
}

impl PartialOrd for GalleryEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GalleryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.gid == other.gid
    }
}
