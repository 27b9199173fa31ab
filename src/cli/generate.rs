//! Content generation commands.

use anyhow::Result;

use prody_ai::coordinator::{AiOutcome, CacheCoordinator, FallbackSource};

pub(crate) async fn cmd_wisdom(coordinator: &CacheCoordinator, refresh: bool) -> Result<()> {
    let outcome = coordinator.daily_wisdom(refresh).await?;
    let w = outcome.value();
    println!("{}\n", w.wisdom);
    println!("Reflect: {}", w.reflection);
    println!("Today:   {}", w.action);
    print_origin(&outcome);
    Ok(())
}

pub(crate) async fn cmd_insight(
    coordinator: &CacheCoordinator,
    content: &str,
    mood: Option<&str>,
    refresh: bool,
) -> Result<()> {
    let outcome = coordinator.journal_insight(content, mood, refresh).await?;
    let i = outcome.value();
    println!("Emotion:    {}", i.emotion);
    println!("Themes:     {}", i.themes.join(", "));
    println!("Insight:    {}", i.insight);
    println!("Suggestion: {}", i.suggestion);
    print_origin(&outcome);
    Ok(())
}

pub(crate) async fn cmd_explain(
    coordinator: &CacheCoordinator,
    quote: &str,
    author: Option<&str>,
    refresh: bool,
) -> Result<()> {
    let outcome = coordinator.quote_explanation(quote, author, refresh).await?;
    let q = outcome.value();
    println!("Meaning:     {}", q.meaning);
    println!("Application: {}", q.application);
    println!("Try today:   {}", q.try_today);
    print_origin(&outcome);
    Ok(())
}

fn print_origin<T>(outcome: &AiOutcome<T>) {
    println!("\n({})", origin_label(outcome));
}

fn origin_label<T>(outcome: &AiOutcome<T>) -> &'static str {
    match outcome {
        AiOutcome::Fresh(_) => "fresh",
        AiOutcome::Cached(_) => "cached",
        AiOutcome::Fallback { source, .. } => match source {
            FallbackSource::Disabled => "offline: AI features disabled",
            FallbackSource::RateLimited => "offline: rate limit reached",
            FallbackSource::Unavailable => "offline: no provider available",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_labels() {
        assert_eq!(origin_label(&AiOutcome::Fresh(1)), "fresh");
        assert_eq!(origin_label(&AiOutcome::Cached(1)), "cached");
        assert_eq!(
            origin_label(&AiOutcome::Fallback {
                value: 1,
                source: FallbackSource::RateLimited
            }),
            "offline: rate limit reached"
        );
    }
}
