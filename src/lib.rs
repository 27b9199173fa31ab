//! Prody AI core: cached, rate-limited, persona-consistent AI content with
//! offline fallbacks.
//!
//! [`coordinator::CacheCoordinator`] is the entry point. It checks feature
//! toggles, serves from the [`cache::ResponseCache`], gates provider calls
//! through the [`providers::RateLimiter`], runs the
//! [`orchestrator::FallbackOrchestrator`] across a primary and a secondary
//! provider, and records everything in [`stats::StatsRecorder`].
//!
//! ```rust
//! use std::sync::Arc;
//! use prody_ai::providers::{GeminiProvider, OpenRouterProvider};
//! use prody_ai::{CacheCoordinator, FallbackSource};
//!
//! # tokio_test::block_on(async {
//! let coordinator = CacheCoordinator::builder(
//!     Arc::new(GeminiProvider::new(None, "")),
//!     Arc::new(OpenRouterProvider::new(None, "")),
//! )
//! .build();
//!
//! // No credentials: offline content, never an error.
//! let outcome = coordinator.message_helper("Dear future me", false).await.unwrap();
//! assert_eq!(outcome.fallback_source(), Some(FallbackSource::Unavailable));
//! assert_eq!(outcome.value().improved_message, "Dear future me");
//! # });
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod features;
pub mod orchestrator;
pub mod persist;
pub mod persona;
pub mod providers;
pub mod stats;
pub mod utils;

pub use coordinator::{AiOutcome, CacheCoordinator, CoordinatorBuilder, FallbackSource};
pub use error::{ProdyError, Result};
