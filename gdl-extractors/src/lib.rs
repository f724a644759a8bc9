//! Retrieval engine for paginated, session-gated gallery indexes.
//!
//! The index only offers forward navigation through continuation tokens, bans clients with plain
//! text pages instead of status codes, and serves more results on a second host once the user is
//! logged in. [`extractor::GalleryExtractor`] hides all of that behind page-numbered requests.

extern crate gdl_common;

pub mod auth;
pub mod cursor;
pub mod error;
pub mod extractor;
pub mod extractor_config;
pub mod filter;
pub mod interceptor;
pub mod prelude;
pub mod session;
pub mod transport;

mod test;
