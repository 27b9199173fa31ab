//! Cache and stats maintenance commands.

use anyhow::Result;

use prody_ai::coordinator::CacheCoordinator;

/// Handle `prody-ai clear-cache`.
pub(crate) fn cmd_clear_cache(coordinator: &CacheCoordinator) -> Result<()> {
    let entries = coordinator.status().cache.total_entries;
    coordinator.clear_cache();
    println!("Cleared {} cached response(s).", entries);
    Ok(())
}

/// Handle `prody-ai reset-stats`.
pub(crate) fn cmd_reset_stats(coordinator: &CacheCoordinator) -> Result<()> {
    coordinator.reset_stats();
    println!("Reset AI usage stats.");
    Ok(())
}
