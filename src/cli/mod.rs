//! Command-line interface.

mod generate;
mod maintenance;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use prody_ai::config::Config;
use prody_ai::coordinator::{CacheCoordinator, CoordinatorBuilder};

#[derive(Parser, Debug)]
#[command(name = "prody-ai", version, about = "Cached, rate-limited AI content for Prody")]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.prody/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show usage stats, cache size, rate-limit window and providers
    Status,
    /// Delete every cached AI response
    ClearCache,
    /// Zero the usage counters
    ResetStats,
    /// Today's wisdom
    Wisdom {
        /// Skip the cache
        #[arg(long)]
        refresh: bool,
    },
    /// Reflect on a journal entry
    Insight {
        /// Entry text
        content: String,
        /// Mood tag
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        refresh: bool,
    },
    /// Explain a quote
    Explain {
        quote: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        refresh: bool,
    },
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let coordinator = build_coordinator(&config);

    match cli.command {
        Command::Status => status::cmd_status(&coordinator),
        Command::ClearCache => maintenance::cmd_clear_cache(&coordinator),
        Command::ResetStats => maintenance::cmd_reset_stats(&coordinator),
        Command::Wisdom { refresh } => generate::cmd_wisdom(&coordinator, refresh).await,
        Command::Insight {
            content,
            mood,
            refresh,
        } => generate::cmd_insight(&coordinator, &content, mood.as_deref(), refresh).await,
        Command::Explain {
            quote,
            author,
            refresh,
        } => generate::cmd_explain(&coordinator, &quote, author.as_deref(), refresh).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let mut config = match path {
        Some(p) => Config::load_from_path(p)
            .with_context(|| format!("failed to load config from {}", p.display()))?,
        None => return Config::load().context("failed to load config"),
    };
    config.apply_env_overrides();
    config.validate().context("invalid config after environment overrides")?;
    Ok(config)
}

fn build_coordinator(config: &Config) -> CacheCoordinator {
    CoordinatorBuilder::from_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_insight_with_mood() {
        let cli = Cli::try_parse_from([
            "prody-ai",
            "insight",
            "Long day but good",
            "--mood",
            "tired",
            "--log-json",
        ])
        .unwrap();
        assert!(cli.log_json);
        match cli.command {
            Command::Insight { content, mood, refresh } => {
                assert_eq!(content, "Long day but good");
                assert_eq!(mood.as_deref(), Some("tired"));
                assert!(!refresh);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"rate_limit":{"max_per_hour":3}}"#).unwrap();
        let cfg = load_config(Some(path.as_path())).unwrap();
        assert_eq!(cfg.rate_limit.max_per_hour, 3);
    }
}
