//! End-to-end coordinator scenarios against scripted providers and a manual
//! clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use prody_ai::clock::ManualClock;
use prody_ai::config::{FeatureToggles, StaticToggles};
use prody_ai::persist::JsonFileStore;
use prody_ai::providers::ProviderClient;
use prody_ai::{AiOutcome, CacheCoordinator, FallbackSource, ProdyError, Result};

/// Replays scripted replies, then repeats the last one.
struct ScriptedProvider {
    name: &'static str,
    configured: bool,
    replies: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(name: &'static str, replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: true,
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn always(name: &'static str, reply: &str) -> Arc<Self> {
        Self::new(name, vec![Ok(reply.to_string())])
    }

    fn offline(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            configured: false,
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            return replies.pop_front().unwrap();
        }
        match replies.front() {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(e)) => Err(ProdyError::Provider(e.to_string())),
            None => Err(ProdyError::Provider("no reply scripted".into())),
        }
    }
}

const WISDOM: &str = "WISDOM: Small steps still move you.\n\
                      REFLECTION: What step did you take today?\n\
                      ACTION: Write down one thing you finished.";

const QUOTE: &str = "MEANING: Be kind.\nAPPLICATION: Start with yourself.\nTRY TODAY: smile";

fn start_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 5, 4, 7, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn disabled_feature_never_calls_providers_or_limiter() {
    let primary = ScriptedProvider::always("primary", WISDOM);
    let secondary = ScriptedProvider::always("secondary", WISDOM);
    let toggles = Arc::new(StaticToggles::new(FeatureToggles {
        daily_wisdom: false,
        ..FeatureToggles::default()
    }));
    let coord = CacheCoordinator::builder(primary.clone(), secondary.clone())
        .toggles(toggles)
        .rate_limits(1, 1)
        .build();

    for _ in 0..5 {
        let out = coord.daily_wisdom(false).await.unwrap();
        assert_eq!(out.fallback_source(), Some(FallbackSource::Disabled));
        assert!(!out.value().wisdom.is_empty());
    }
    assert_eq!(primary.calls() + secondary.calls(), 0);
    let status = coord.status();
    assert_eq!(status.rate_limit.last_day, 0);
    assert_eq!(status.stats.cache_hits + status.stats.cache_misses, 0);
}

#[tokio::test]
async fn identical_requests_call_the_provider_once() {
    let primary = ScriptedProvider::always("primary", QUOTE);
    let secondary = ScriptedProvider::offline("secondary");
    let coord = CacheCoordinator::builder(primary.clone(), secondary)
        .clock(start_clock())
        .build();

    let a = coord
        .quote_explanation("Be the change.", Some("Gandhi"), false)
        .await
        .unwrap();
    let b = coord
        .quote_explanation("Be the change.", Some("Gandhi"), false)
        .await
        .unwrap();

    assert!(matches!(a, AiOutcome::Fresh(_)));
    assert!(matches!(b, AiOutcome::Cached(_)));
    assert_eq!(a.value().meaning, "Be kind.");
    assert_eq!(b.value().try_today, "smile");
    assert_eq!(primary.calls(), 1);
}

#[tokio::test]
async fn daily_wisdom_is_keyed_by_calendar_day() {
    let clock = start_clock();
    let primary = ScriptedProvider::always("primary", WISDOM);
    let coord = CacheCoordinator::builder(primary.clone(), ScriptedProvider::offline("secondary"))
        .clock(clock.clone())
        .build();

    coord.daily_wisdom(false).await.unwrap();
    clock.advance(Duration::hours(3));
    assert!(matches!(
        coord.daily_wisdom(false).await.unwrap(),
        AiOutcome::Cached(_)
    ));

    clock.advance(Duration::days(1));
    assert!(matches!(
        coord.daily_wisdom(false).await.unwrap(),
        AiOutcome::Fresh(_)
    ));
    assert_eq!(primary.calls(), 2);
}

#[tokio::test]
async fn rate_limit_denial_returns_fallback_without_provider_call() {
    let clock = start_clock();
    let primary = ScriptedProvider::always("primary", WISDOM);
    let coord = CacheCoordinator::builder(primary.clone(), ScriptedProvider::offline("secondary"))
        .clock(clock.clone())
        .rate_limits(2, 100)
        .build();

    let first = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
    for offset in 0..2 {
        let out = coord
            .daily_wisdom_for(first + Duration::days(offset), false)
            .await
            .unwrap();
        assert!(matches!(out, AiOutcome::Fresh(_)));
    }

    let denied = coord
        .daily_wisdom_for(first + Duration::days(2), false)
        .await
        .unwrap();
    assert_eq!(denied.fallback_source(), Some(FallbackSource::RateLimited));
    assert_eq!(primary.calls(), 2);

    // Denials do not consume capacity: the window frees up after an hour.
    clock.advance(Duration::minutes(61));
    let later = coord
        .daily_wisdom_for(first + Duration::days(2), false)
        .await
        .unwrap();
    assert!(matches!(later, AiOutcome::Fresh(_)));
    assert_eq!(coord.stats().rate_limit_hits, 1);
}

#[tokio::test]
async fn failing_primary_falls_through_to_secondary() {
    let primary = ScriptedProvider::new(
        "primary",
        vec![Err(ProdyError::Provider("HTTP 503".into()))],
    );
    let secondary = ScriptedProvider::always("secondary", QUOTE);
    let coord = CacheCoordinator::builder(primary.clone(), secondary.clone()).build();

    let out = coord
        .quote_explanation("Stay curious.", None, false)
        .await
        .unwrap();
    assert!(matches!(out, AiOutcome::Fresh(_)));
    assert_eq!(coord.stats().last_provider.as_deref(), Some("secondary"));
    assert!(primary.calls() >= 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn off_persona_replies_fall_back_to_offline_content() {
    let generic = "As an AI language model, I don't have feelings.";
    let primary = ScriptedProvider::always("primary", generic);
    let secondary = ScriptedProvider::always("secondary", generic);
    let coord = CacheCoordinator::builder(primary.clone(), secondary.clone())
        .max_retries(2)
        .build();

    let out = coord
        .journal_insight("I felt stuck all afternoon.", Some("frustrated"), false)
        .await
        .unwrap();
    assert_eq!(out.fallback_source(), Some(FallbackSource::Unavailable));
    assert_eq!(primary.calls(), 2);
    assert_eq!(secondary.calls(), 2);
    assert!(coord.stats().last_error.is_some());
    assert_eq!(coord.status().cache.total_entries, 0);
}

#[tokio::test]
async fn malformed_input_is_rejected_before_any_side_effect() {
    let primary = ScriptedProvider::always("primary", QUOTE);
    let coord = CacheCoordinator::builder(primary.clone(), ScriptedProvider::offline("secondary"))
        .build();

    let date = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
    assert!(matches!(
        coord.quote_explanation("  ", None, false).await,
        Err(ProdyError::InvalidInput(_))
    ));
    assert!(matches!(
        coord
            .weekly_pattern(date, vec!["".into(), "   ".into()], false)
            .await,
        Err(ProdyError::InvalidInput(_))
    ));
    assert!(matches!(
        coord.message_helper("", false).await,
        Err(ProdyError::InvalidInput(_))
    ));
    assert_eq!(primary.calls(), 0);
    assert_eq!(coord.status().rate_limit.last_day, 0);
}

#[tokio::test]
async fn cache_and_stats_persist_across_restarts() {
    let tmp = TempDir::new().unwrap();
    let cache_path = tmp.path().join("cache").join("ai_responses.json");
    let stats_path = tmp.path().join("stats").join("ai_usage.json");
    let clock = start_clock();

    let build = |primary: Arc<ScriptedProvider>| {
        CacheCoordinator::builder(primary, ScriptedProvider::offline("secondary"))
            .clock(clock.clone())
            .cache_store(Arc::new(JsonFileStore::new(&cache_path)))
            .stats_store(Arc::new(JsonFileStore::new(&stats_path)))
            .build()
    };

    let first = ScriptedProvider::always("primary", WISDOM);
    build(first.clone()).daily_wisdom(false).await.unwrap();
    assert_eq!(first.calls(), 1);

    let second = ScriptedProvider::always("primary", WISDOM);
    let coord = build(second.clone());
    let out = coord.daily_wisdom(false).await.unwrap();
    assert!(matches!(out, AiOutcome::Cached(_)));
    assert_eq!(second.calls(), 0);

    let stats = coord.stats();
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.total_api_calls, 1);
}

#[tokio::test]
async fn corrupt_snapshots_start_clean() {
    let tmp = TempDir::new().unwrap();
    let cache_path = tmp.path().join("ai_responses.json");
    let stats_path = tmp.path().join("ai_usage.json");
    std::fs::write(&cache_path, "{\"entries\": [1, 2").unwrap();
    std::fs::write(&stats_path, "not json").unwrap();

    let primary = ScriptedProvider::always("primary", WISDOM);
    let coord = CacheCoordinator::builder(primary.clone(), ScriptedProvider::offline("secondary"))
        .cache_store(Arc::new(JsonFileStore::new(&cache_path)))
        .stats_store(Arc::new(JsonFileStore::new(&stats_path)))
        .build();

    assert_eq!(coord.status().cache.total_entries, 0);
    assert_eq!(coord.stats().total_api_calls, 0);
    assert!(matches!(
        coord.daily_wisdom(false).await.unwrap(),
        AiOutcome::Fresh(_)
    ));
    let saved = std::fs::read_to_string(&cache_path).unwrap();
    assert!(saved.contains("daily_wisdom_"));
}

#[tokio::test]
async fn concurrent_callers_never_exceed_the_hourly_limit() {
    let primary = ScriptedProvider::always("primary", QUOTE);
    let coord = Arc::new(
        CacheCoordinator::builder(primary.clone(), ScriptedProvider::offline("secondary"))
            .rate_limits(5, 100)
            .build(),
    );

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let coord = Arc::clone(&coord);
            tokio::spawn(async move {
                coord
                    .quote_explanation(&format!("Quote number {i}"), None, false)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut fresh = 0;
    for outcome in futures::future::join_all(handles).await {
        if matches!(outcome.unwrap(), AiOutcome::Fresh(_)) {
            fresh += 1;
        }
    }
    assert_eq!(fresh, 5);
    assert_eq!(primary.calls(), 5);
    assert_eq!(coord.stats().rate_limit_hits, 15);
}
