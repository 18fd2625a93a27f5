use anyhow::Context;
use bot_service::{Bot, BotOptions};
use chorus_core::{AppConfig, ErrorExt};
use clap::Parser;
use commented_log::CommentedLog;
use llm_interface::OpenAiProvider;
use reddit_client::{resolve_user_agent, RedditClient, RedditOAuth2Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chorus")]
#[command(about = "Replies to hot Reddit threads in the tone of their top comments")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration (default: ./chorus.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File recording the threads already answered
    #[arg(long)]
    log_file: Option<String>,

    /// Subreddit whose hot listing is walked
    #[arg(short, long)]
    subreddit: Option<String>,

    /// Maximum number of hot threads to consider
    #[arg(short, long)]
    limit: Option<u32>,

    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chorus={level},bot_service={level},reddit_client={level},llm_interface={level},commented_log={level},chorus_core={level}"
        ))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(log_file) = &cli.log_file {
        config.bot.log_file = log_file.clone();
    }
    if let Some(subreddit) = &cli.subreddit {
        config.reddit.subreddit = subreddit.clone();
    }
    if let Some(limit) = cli.limit {
        config.reddit.hot_limit = limit;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("Invalid configuration")?;
    init_tracing(&config.logging.level, cli.verbose);

    tracing::info!(
        "Starting chorus on r/{} (up to {} hot threads)",
        config.reddit.subreddit,
        config.reddit.hot_limit
    );

    let reddit = RedditClient::new(RedditOAuth2Config::new(
        config.reddit.client_id.clone(),
        config.reddit.client_secret.clone(),
        config.reddit.username.clone(),
        config.reddit.password.clone(),
        resolve_user_agent(config.reddit.user_agent.as_deref()),
    ))?;

    let mut llm = OpenAiProvider::new(config.llm.api_key.clone())?.with_model(config.llm.model.clone());
    if let Some(base_url) = &config.llm.base_url {
        llm = llm.with_base_url(base_url);
    }

    let log = CommentedLog::open(&config.bot.log_file).await?;
    let mut bot = Bot::new(reddit, llm, log, BotOptions::from_config(&config));

    match bot.run().await {
        Ok(summary) => {
            tracing::info!(
                "Done: {} new threads, {} replies posted",
                summary.candidates,
                summary.replied
            );
            Ok(())
        }
        Err(e) => {
            e.log_error();
            let hint = e.user_friendly_message();
            Err(anyhow::Error::new(e).context(hint))
        }
    }
}
