//! `prody-ai status` handler.

use anyhow::Result;

use prody_ai::coordinator::{CacheCoordinator, CoordinatorStatus};

/// Print usage stats, cache occupancy, the rate-limit window and providers.
pub(crate) fn cmd_status(coordinator: &CacheCoordinator) -> Result<()> {
    print!("{}", render_status(&coordinator.status()));
    Ok(())
}

fn render_status(status: &CoordinatorStatus) -> String {
    let mut out = String::new();
    let s = &status.stats;

    out.push_str("Usage\n");
    out.push_str(&format!("  {:<18} {}\n", "Cache hits", s.cache_hits));
    out.push_str(&format!("  {:<18} {}\n", "Cache misses", s.cache_misses));
    out.push_str(&format!(
        "  {:<18} {:.0}%\n",
        "Hit rate",
        s.cache_hit_rate() * 100.0
    ));
    out.push_str(&format!("  {:<18} {}\n", "Rate-limit hits", s.rate_limit_hits));
    out.push_str(&format!("  {:<18} {}\n", "API calls", s.total_api_calls));
    if let Some(provider) = &s.last_provider {
        out.push_str(&format!(
            "  {:<18} {} ({}, {} ms)\n",
            "Last call",
            provider,
            s.last_prompt_type.as_deref().unwrap_or("-"),
            s.last_latency_ms.unwrap_or(0)
        ));
    }
    if let Some(err) = &s.last_error {
        out.push_str(&format!("  {:<18} {}\n", "Last error", err));
    }

    out.push_str("\nCache\n");
    out.push_str(&format!(
        "  {:<18} {}/{}\n",
        "Entries", status.cache.total_entries, status.cache.max_entries
    ));
    let mut namespaces: Vec<_> = status.cache.per_namespace.iter().collect();
    namespaces.sort_by_key(|(name, _)| **name);
    for (name, count) in namespaces {
        out.push_str(&format!("    {:<16} {}\n", name, count));
    }

    let r = &status.rate_limit;
    out.push_str("\nRate limit\n");
    out.push_str(&format!("  {:<18} {}/{}\n", "Last hour", r.last_hour, r.max_per_hour));
    out.push_str(&format!("  {:<18} {}/{}\n", "Last day", r.last_day, r.max_per_day));

    out.push_str("\nProviders\n");
    for p in &status.providers {
        out.push_str(&format!(
            "  {:<10} {:<12} {}\n",
            p.slot,
            p.name,
            if p.configured { "configured" } else { "not configured" }
        ));
    }

    if !status.toggles.ai_enabled {
        out.push_str("\nAI features are disabled.\n");
    }
    out
}
