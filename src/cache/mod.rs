//! AI response caching: namespaced keys, a typed payload registry and a
//! TTL cache persisted as a JSON snapshot.

pub mod keys;
pub mod payload;
pub mod response_cache;

pub use keys::{composite_key, content_key, daily_key, Namespace};
pub use payload::{Cacheable, CachedPayload};
pub use response_cache::{CacheStats, ResponseCache, DEFAULT_MAX_ENTRIES};
