//! Continuation tokens for forward-only pagination.
//!
//! The index has no "page N" addressing: the request for a page must carry the token found on the
//! page before it. A [`CursorStore`] remembers those tokens per [`Fingerprint`] so callers can keep
//! asking for plain page numbers. Page 0 is the only page that never needs a stored token.
use crate::{error::ExtractorError, filter::Fingerprint};
use ahash::{HashMap, HashMapExt};
use log::debug;
use std::fmt::Display;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Opaque token the server wants back to serve the page after the one that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinuationToken(u64);

impl ContinuationToken {
    /// Sentinel for the first page.
    pub const START: Self = Self(0);
    /// Stored when a page had no forward link. Nothing can be fetched past it.
    pub const END: Self = Self(u64::MAX);

    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_start(self) -> bool {
        self.0 == Self::START.0
    }

    #[inline]
    #[must_use]
    pub const fn is_end(self) -> bool {
        self.0 == Self::END.0
    }
}

impl Display for ContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage for `(fingerprint, page) -> token` entries.
///
/// Implementations must make every read and write atomic per key. Concurrent writers to the same
/// key are allowed, last writer wins.
pub trait CursorStore: Send + Sync {
    /// Returns the token to present when requesting `page`.
    ///
    /// Page 0 always yields [`ContinuationToken::START`].
    fn get(&self, fingerprint: Fingerprint, page: u32) -> Option<ContinuationToken>;

    /// Records the token to present when requesting `page`.
    fn put(&self, fingerprint: Fingerprint, page: u32, token: ContinuationToken);
}

/// Looks up the token for `page`, failing loudly if the page before it was never fetched.
pub fn continuation_token<C: CursorStore + ?Sized>(
    store: &C,
    fingerprint: Fingerprint,
    page: u32,
) -> Result<ContinuationToken, ExtractorError> {
    store
        .get(fingerprint, page)
        .ok_or(ExtractorError::CursorMissing { fingerprint, page })
}

#[derive(Debug, Default)]
struct CursorMap {
    searches: HashMap<Fingerprint, SearchCursors>,
    /// Monotonic counter used to find the least recently used search.
    clock: u64,
}

#[derive(Debug)]
struct SearchCursors {
    pages: HashMap<u32, ContinuationToken>,
    last_used: u64,
}

/// In-memory [`CursorStore`] guarded by a single lock.
///
/// Unbounded by default. With [`with_capacity_limit`](Self::with_capacity_limit) it keeps at most
/// `n` searches and drops every entry of the least recently used one when a new search comes in.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    inner: Mutex<CursorMap>,
    max_searches: Option<NonZeroUsize>,
}

impl MemoryCursorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity_limit(max_searches: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(CursorMap::default()),
            max_searches: Some(max_searches),
        }
    }

    /// Number of searches currently holding at least one cursor.
    pub fn len(&self) -> usize {
        self.lock().searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are plain values, a panic in another holder can't leave them half-written.
    fn lock(&self) -> MutexGuard<'_, CursorMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CursorMap {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self, keep: Fingerprint) {
        let oldest = self
            .searches
            .iter()
            .filter(|(fp, _)| **fp != keep)
            .min_by_key(|(_, s)| s.last_used)
            .map(|(fp, _)| *fp);

        if let Some(fp) = oldest {
            debug!("Evicting cursors of search {fp}");
            self.searches.remove(&fp);
        }
    }
}

impl CursorStore for MemoryCursorStore {
    fn get(&self, fingerprint: Fingerprint, page: u32) -> Option<ContinuationToken> {
        if page == 0 {
            return Some(ContinuationToken::START);
        }

        let mut map = self.lock();
        let now = map.tick();
        let search = map.searches.get_mut(&fingerprint)?;
        search.last_used = now;
        search.pages.get(&page).copied()
    }

    fn put(&self, fingerprint: Fingerprint, page: u32, token: ContinuationToken) {
        let mut map = self.lock();
        let now = map.tick();

        let search = map
            .searches
            .entry(fingerprint)
            .or_insert_with(|| SearchCursors {
                pages: HashMap::with_capacity(8),
                last_used: now,
            });
        search.last_used = now;
        search.pages.insert(page, token);

        debug!("Stored cursor {token} for page {page} of search {fingerprint}");

        if let Some(max) = self.max_searches {
            while map.searches.len() > max.get() {
                map.evict_lru(fingerprint);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    fn fp(n: u8) -> Fingerprint {
        Fingerprint::from_bytes([n; 16])
    }

    #[test]
    fn first_page_needs_no_entry() {
        let store = MemoryCursorStore::new();
        assert_eq!(store.get(fp(1), 0), Some(ContinuationToken::START));
        assert!(store.is_empty());
    }

    #[test]
    fn skipped_page_is_a_protocol_violation() {
        let store = MemoryCursorStore::new();
        store.put(fp(1), 1, ContinuationToken::new(42));

        assert!(matches!(
            continuation_token(&store, fp(1), 2),
            Err(ExtractorError::CursorMissing { page: 2, .. })
        ));
        assert!(matches!(
            continuation_token(&store, fp(2), 1),
            Err(ExtractorError::CursorMissing { page: 1, .. })
        ));
        assert_eq!(
            continuation_token(&store, fp(1), 1).unwrap(),
            ContinuationToken::new(42)
        );
    }

    #[test]
    fn searches_do_not_mix() {
        let store = MemoryCursorStore::new();
        store.put(fp(1), 1, ContinuationToken::new(10));
        store.put(fp(2), 1, ContinuationToken::new(20));

        assert_eq!(store.get(fp(1), 1), Some(ContinuationToken::new(10)));
        assert_eq!(store.get(fp(2), 1), Some(ContinuationToken::new(20)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn last_writer_wins() {
        let store = MemoryCursorStore::new();
        store.put(fp(1), 3, ContinuationToken::new(1));
        store.put(fp(1), 3, ContinuationToken::new(2));
        assert_eq!(store.get(fp(1), 3), Some(ContinuationToken::new(2)));
    }

    #[test]
    fn bounded_store_evicts_least_recently_used_search() {
        let store = MemoryCursorStore::with_capacity_limit(NonZeroUsize::new(2).unwrap());
        store.put(fp(1), 1, ContinuationToken::new(10));
        store.put(fp(2), 1, ContinuationToken::new(20));

        // Touch search 1 so search 2 becomes the oldest
        assert!(store.get(fp(1), 1).is_some());

        store.put(fp(3), 1, ContinuationToken::new(30));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(fp(1), 1), Some(ContinuationToken::new(10)));
        assert_eq!(store.get(fp(2), 1), None);
        assert_eq!(store.get(fp(3), 1), Some(ContinuationToken::new(30)));
    }

    #[tokio::test]
    async fn concurrent_writers_keep_every_search() {
        let store = Arc::new(MemoryCursorStore::new());

        let handles: Vec<_> = (0..16u8)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    for page in 1..=50u32 {
                        store.put(fp(n), page, ContinuationToken::new(u64::from(page) * 7));
                    }
                })
            })
            .collect();

        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.len(), 16);
        for n in 0..16u8 {
            assert_eq!(store.get(fp(n), 50), Some(ContinuationToken::new(350)));
        }
    }
}
