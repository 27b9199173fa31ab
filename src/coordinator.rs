//! Feature-facing entry point.
//!
//! Every feature call runs the same pipeline: toggle check, cache lookup,
//! rate limit, provider orchestration, parse, cache store, stats. Callers
//! always get a usable value back; the only error is malformed input.

use std::sync::Arc;
use std::time::Instant;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use tracing::{debug, info};

use crate::cache::{CacheStats, ResponseCache, DEFAULT_MAX_ENTRIES};
use crate::clock::{Clock, SystemClock};
use crate::config::{
    Config, ConfigWatchHandle, ConfigWatcher, FeatureToggles, StaticToggles, ToggleSource,
};
use crate::error::Result;
use crate::features::{
    DailyWisdom, DailyWisdomRequest, DefaultPrompts, Feature, JournalInsight,
    JournalInsightRequest, MessageHelp, MessageHelpRequest, PromptBuilder, QuoteExplanation,
    QuoteExplanationRequest, VocabularyContext, VocabularyContextRequest, WeeklyPattern,
    WeeklyPatternRequest,
};
use crate::orchestrator::{FallbackOrchestrator, DEFAULT_MAX_RETRIES};
use crate::persist::{JsonFileStore, MemoryStore, SnapshotStore};
use crate::providers::rate_limit::{DEFAULT_MAX_PER_DAY, DEFAULT_MAX_PER_HOUR};
use crate::providers::{
    GeminiProvider, OpenRouterProvider, ProviderClient, ProviderSlot, RateLimitUsage, RateLimiter,
};
use crate::stats::{ApiCall, StatsRecorder, UsageStats};

/// Provider tag recorded when no provider produced text.
const NO_PROVIDER: &str = "none";

/// Why a static fallback was returned instead of AI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    /// The master switch or the feature toggle is off.
    Disabled,
    /// The sliding-window limiter denied the call.
    RateLimited,
    /// No provider produced usable text.
    Unavailable,
}

/// Result of a feature call.
#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome<T> {
    /// Generated by a provider on this call.
    Fresh(T),
    /// Served from the response cache.
    Cached(T),
    /// Static offline content.
    Fallback { value: T, source: FallbackSource },
}

impl<T> AiOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            AiOutcome::Fresh(v) | AiOutcome::Cached(v) => v,
            AiOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            AiOutcome::Fresh(v) | AiOutcome::Cached(v) => v,
            AiOutcome::Fallback { value, .. } => value,
        }
    }

    /// Whether the value came from a provider, now or earlier.
    pub fn is_ai_generated(&self) -> bool {
        !matches!(self, AiOutcome::Fallback { .. })
    }

    pub fn fallback_source(&self) -> Option<FallbackSource> {
        match self {
            AiOutcome::Fallback { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Configuration state of one provider slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub slot: ProviderSlot,
    pub name: String,
    pub configured: bool,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorStatus {
    pub stats: UsageStats,
    pub cache: CacheStats,
    pub rate_limit: RateLimitUsage,
    pub providers: Vec<ProviderStatus>,
    pub toggles: FeatureToggles,
}

pub struct CacheCoordinator {
    cache: ResponseCache,
    limiter: RateLimiter,
    orchestrator: FallbackOrchestrator,
    stats: StatsRecorder,
    toggles: Arc<dyn ToggleSource>,
    prompts: Arc<dyn PromptBuilder>,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl CacheCoordinator {
    pub fn builder(
        primary: Arc<dyn ProviderClient>,
        secondary: Arc<dyn ProviderClient>,
    ) -> CoordinatorBuilder {
        CoordinatorBuilder::new(primary, secondary)
    }

    /// Serve one feature request.
    pub async fn run<F: Feature>(&self, req: &F, force_refresh: bool) -> Result<AiOutcome<F::Output>> {
        req.validate()?;
        let namespace = F::NAMESPACE;

        let toggles = self.toggles.current();
        if !toggles.ai_enabled || !req.is_enabled(&toggles) {
            debug!(feature = %namespace, "Feature disabled, using offline content");
            return Ok(AiOutcome::Fallback {
                value: req.fallback(),
                source: FallbackSource::Disabled,
            });
        }

        let key = req.cache_key();
        if !force_refresh {
            if let Some(value) = self.cache.get::<F::Output>(&key, namespace.ttl()) {
                debug!(feature = %namespace, key = %key, "Cache hit");
                self.stats.record_cache_hit();
                return Ok(AiOutcome::Cached(value));
            }
        }

        if !self.limiter.try_acquire() {
            info!(feature = %namespace, "Rate limited, using offline content");
            self.stats.record_rate_limit_hit();
            return Ok(AiOutcome::Fallback {
                value: req.fallback(),
                source: FallbackSource::RateLimited,
            });
        }
        self.stats.record_cache_miss();

        let prompt = req.prompt(self.prompts.as_ref());
        let started = Instant::now();
        let generation = self.orchestrator.generate(&prompt).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match generation {
            Some(gen) => {
                let value = req.parse(&gen.text);
                self.cache.put(&key, value.clone());
                self.stats.record_api_call(ApiCall {
                    latency_ms,
                    provider: &gen.provider_name,
                    prompt_type: namespace.as_str(),
                    error: None,
                });
                debug!(
                    feature = %namespace,
                    provider = %gen.provider_name,
                    attempts = gen.attempts,
                    sanitized = gen.sanitized,
                    "Generated fresh result"
                );
                Ok(AiOutcome::Fresh(value))
            }
            None => {
                let error = if self.orchestrator.any_configured() {
                    "no provider produced a usable response"
                } else {
                    "no provider configured"
                };
                self.stats.record_api_call(ApiCall {
                    latency_ms,
                    provider: NO_PROVIDER,
                    prompt_type: namespace.as_str(),
                    error: Some(error.to_string()),
                });
                info!(feature = %namespace, reason = error, "Using offline content");
                Ok(AiOutcome::Fallback {
                    value: req.fallback(),
                    source: FallbackSource::Unavailable,
                })
            }
        }
    }

    pub async fn journal_insight(
        &self,
        content: &str,
        mood: Option<&str>,
        force_refresh: bool,
    ) -> Result<AiOutcome<JournalInsight>> {
        let mut req = JournalInsightRequest::new(content);
        if let Some(mood) = mood {
            req = req.with_mood(mood);
        }
        self.run(&req, force_refresh).await
    }

    /// Wisdom for today according to the coordinator's clock.
    ///
    /// "Today" is the calendar date at the builder's UTC offset, which is UTC
    /// unless [`CoordinatorBuilder::utc_offset`] was set. The card rolls over
    /// at local midnight for that offset.
    pub async fn daily_wisdom(&self, force_refresh: bool) -> Result<AiOutcome<DailyWisdom>> {
        let today = self.clock.now().with_timezone(&self.utc_offset).date_naive();
        self.daily_wisdom_for(today, force_refresh).await
    }

    pub async fn daily_wisdom_for(
        &self,
        date: NaiveDate,
        force_refresh: bool,
    ) -> Result<AiOutcome<DailyWisdom>> {
        self.run(&DailyWisdomRequest::new(date), force_refresh).await
    }

    pub async fn quote_explanation(
        &self,
        quote: &str,
        author: Option<&str>,
        force_refresh: bool,
    ) -> Result<AiOutcome<QuoteExplanation>> {
        let req = QuoteExplanationRequest::new(quote, author.map(String::from));
        self.run(&req, force_refresh).await
    }

    pub async fn vocabulary_context(
        &self,
        word: &str,
        definition: Option<&str>,
        force_refresh: bool,
    ) -> Result<AiOutcome<VocabularyContext>> {
        let req = VocabularyContextRequest::new(word, definition.map(String::from));
        self.run(&req, force_refresh).await
    }

    pub async fn weekly_pattern(
        &self,
        week_ending: NaiveDate,
        entries: Vec<String>,
        force_refresh: bool,
    ) -> Result<AiOutcome<WeeklyPattern>> {
        self.run(&WeeklyPatternRequest::new(week_ending, entries), force_refresh)
            .await
    }

    pub async fn message_helper(
        &self,
        draft: &str,
        force_refresh: bool,
    ) -> Result<AiOutcome<MessageHelp>> {
        self.run(&MessageHelpRequest::new(draft), force_refresh).await
    }

    pub fn stats(&self) -> UsageStats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Forget every recorded call in the rate-limit window.
    pub fn reset_rate_limit(&self) {
        self.limiter.reset();
    }

    pub fn status(&self) -> CoordinatorStatus {
        let providers = [
            (ProviderSlot::Primary, self.orchestrator.primary()),
            (ProviderSlot::Secondary, self.orchestrator.secondary()),
        ]
        .into_iter()
        .map(|(slot, client)| ProviderStatus {
            slot,
            name: client.name().to_string(),
            configured: client.is_configured(),
        })
        .collect();

        CoordinatorStatus {
            stats: self.stats.snapshot(),
            cache: self.cache.stats(),
            rate_limit: self.limiter.usage(),
            providers,
            toggles: self.toggles.current(),
        }
    }
}

/// Wires a [`CacheCoordinator`]. Defaults are in-memory persistence, the
/// system clock at UTC, all toggles on and [`DefaultPrompts`].
pub struct CoordinatorBuilder {
    primary: Arc<dyn ProviderClient>,
    secondary: Arc<dyn ProviderClient>,
    clock: Arc<dyn Clock>,
    cache_store: Arc<dyn SnapshotStore>,
    stats_store: Arc<dyn SnapshotStore>,
    toggles: Arc<dyn ToggleSource>,
    prompts: Arc<dyn PromptBuilder>,
    max_entries: usize,
    max_per_hour: u32,
    max_per_day: u32,
    max_retries: u32,
    persona_prompt: Option<String>,
    utc_offset: FixedOffset,
}

impl CoordinatorBuilder {
    pub fn new(primary: Arc<dyn ProviderClient>, secondary: Arc<dyn ProviderClient>) -> Self {
        Self {
            primary,
            secondary,
            clock: Arc::new(SystemClock),
            cache_store: Arc::new(MemoryStore::new()),
            stats_store: Arc::new(MemoryStore::new()),
            toggles: Arc::new(StaticToggles::default()),
            prompts: Arc::new(DefaultPrompts),
            max_entries: DEFAULT_MAX_ENTRIES,
            max_per_hour: DEFAULT_MAX_PER_HOUR,
            max_per_day: DEFAULT_MAX_PER_DAY,
            max_retries: DEFAULT_MAX_RETRIES,
            persona_prompt: None,
            utc_offset: Utc.fix(),
        }
    }

    /// Gemini as primary, OpenRouter as secondary, JSON snapshots at the
    /// configured paths and limits from `config`.
    pub fn from_config(config: &Config) -> Self {
        let gemini = &config.providers.gemini;
        let openrouter = &config.providers.openrouter;
        let primary = Arc::new(GeminiProvider::from_config(
            gemini.api_key.as_deref(),
            &gemini.model,
        ));
        let secondary = Arc::new(OpenRouterProvider::from_config(
            openrouter.api_key.as_deref(),
            &openrouter.model,
        ));

        let mut builder = Self::new(primary, secondary)
            .cache_store(Arc::new(JsonFileStore::new(config.cache_path())))
            .stats_store(Arc::new(JsonFileStore::new(config.stats_path())))
            .toggles(Arc::new(StaticToggles::new(config.features.clone())))
            .max_entries(config.cache.max_entries)
            .rate_limits(config.rate_limit.max_per_hour, config.rate_limit.max_per_day)
            .max_retries(config.orchestrator.max_retries);
        builder.persona_prompt = config.orchestrator.persona_prompt.clone();
        builder
    }

    /// Toggles follow `watcher`'s file from now on, starting from
    /// `initial.features`. Stop the returned handle on shutdown.
    ///
    /// Must be called inside a tokio runtime.
    pub fn watch_config(
        mut self,
        watcher: ConfigWatcher,
        initial: Config,
    ) -> (Self, ConfigWatchHandle) {
        let (toggles, handle) = watcher.spawn(initial);
        self.toggles = Arc::new(toggles);
        (self, handle)
    }

    /// Offset used to decide the calendar day for [`CacheCoordinator::daily_wisdom`].
    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.cache_store = store;
        self
    }

    pub fn stats_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.stats_store = store;
        self
    }

    pub fn toggles(mut self, toggles: Arc<dyn ToggleSource>) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn prompts(mut self, prompts: Arc<dyn PromptBuilder>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn rate_limits(mut self, max_per_hour: u32, max_per_day: u32) -> Self {
        self.max_per_hour = max_per_hour;
        self.max_per_day = max_per_day;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn persona_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.persona_prompt = Some(prompt.into());
        self
    }

    /// Load both snapshots and assemble the coordinator.
    pub fn build(self) -> CacheCoordinator {
        let mut orchestrator =
            FallbackOrchestrator::new(self.primary, self.secondary).with_max_retries(self.max_retries);
        if let Some(persona) = self.persona_prompt {
            orchestrator = orchestrator.with_persona_prompt(persona);
        }

        CacheCoordinator {
            cache: ResponseCache::new(self.cache_store, self.clock.clone(), self.max_entries),
            limiter: RateLimiter::new(self.clock.clone(), self.max_per_hour, self.max_per_day),
            orchestrator,
            stats: StatsRecorder::new(self.stats_store, self.clock.clone()),
            toggles: self.toggles,
            prompts: self.prompts,
            clock: self.clock,
            utc_offset: self.utc_offset,
        }
    }
}
