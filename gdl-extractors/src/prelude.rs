pub use crate::cursor::{ContinuationToken, CursorStore, MemoryCursorStore};
pub use crate::error::ExtractorError;
pub use crate::extractor::{DefaultExtractor, GalleryExtractor};
pub use crate::extractor_config::{SourceConfig, DEFAULT_SOURCES};
pub use crate::filter::{CategoryMask, Fingerprint, NamespacedTag, SearchFilter};
pub use crate::interceptor::{crop::CropRegion, Interceptor};
pub use crate::session::{CookieJar, EndpointIdentity, SessionRouter};
pub use crate::transport::{HttpTransport, Pipeline, RawResponse, ReqwestTransport};
