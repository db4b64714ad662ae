use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use newsdesk::config::DiscordConfig;
use newsdesk::news::{
    NewsCommands, NewsConfigStore, NewsScheduler, QueryReply, QueryService, RenderedArticle,
    NO_ARTICLES_MESSAGE,
};
use newsdesk::{Config, Delivery, DiscordDelivery, FeedFetcher, HostReady, LogDelivery, Result};

#[derive(Parser)]
#[command(name = "newsdesk", version, about = "Daily science news poster")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daily scheduler until interrupted (default).
    Run,
    /// Show the latest articles.
    News {
        /// Feed to read instead of the active one.
        #[arg(short, long)]
        feed: Option<String>,
        /// Number of articles (1-5).
        #[arg(short = 'n', long, default_value_t = 1, allow_negative_numbers = true)]
        count: i64,
    },
    /// Enable daily posting to a channel.
    SetChannel { channel_id: u64 },
    /// Disable daily posting.
    Stop,
    /// Switch the active feed.
    SetFeed { feed: String },
    /// Show the current configuration.
    Status,
    /// List available feeds.
    Feeds,
    /// Run one posting cycle immediately.
    PostNow,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    let command = cli.command.unwrap_or(Command::Run);
    if matches!(command, Command::Run) {
        if let Err(e) = newsdesk::logging::init(&config.logging) {
            eprintln!("Failed to initialize logging: {e}");
            newsdesk::logging::init_console_only(&config.logging.level);
        }
    } else {
        newsdesk::logging::init_console_only(&config.logging.level);
    }

    match execute(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Discord client, if posts should really be sent. One-shot commands fall
/// back to dry run when no token is configured.
fn discord_client(
    config: &DiscordConfig,
    require_token: bool,
) -> Result<Option<Arc<DiscordDelivery>>> {
    if config.dry_run || (!require_token && config.token.is_empty()) {
        return Ok(None);
    }
    Ok(Some(Arc::new(DiscordDelivery::new(config)?)))
}

async fn execute(command: Command, config: Config) -> Result<()> {
    let registry = Arc::new(config.registry()?);
    let store = Arc::new(NewsConfigStore::load(
        &config.news.state_path,
        &config.news.default_feed,
    )?);
    let source = Arc::new(FeedFetcher::new(&config.fetch)?);

    let is_run = matches!(command, Command::Run);
    let discord = discord_client(&config.discord, is_run)?;
    let delivery: Arc<dyn Delivery> = match &discord {
        Some(client) => client.clone(),
        None => Arc::new(LogDelivery::new()),
    };

    let scheduler = Arc::new(NewsScheduler::new(
        store.clone(),
        registry.clone(),
        source.clone(),
        delivery.clone(),
        config.post_time()?,
        config.timezone()?,
    ));
    let query = QueryService::new(store.clone(), registry.clone(), source);
    let commands = NewsCommands::new(store, registry, query, delivery, scheduler.schedule());

    match command {
        Command::Run => {
            info!("newsdesk starting");
            let ready = HostReady::new();
            let handle = scheduler.clone().spawn(&ready);

            if let Some(client) = &discord {
                client.connect().await?;
            }
            ready.signal();

            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for shutdown signal: {}", e);
            }
            info!("shutting down");
            handle.shutdown().await;
        }
        Command::News { feed, count } => {
            match commands.request_query(feed.as_deref(), count).await {
                QueryReply::Articles { feed, articles } => {
                    for (i, article) in articles.iter().enumerate() {
                        if i > 0 {
                            println!();
                        }
                        println!("{}", RenderedArticle::new(article, &feed).to_plain_text());
                    }
                }
                QueryReply::NoArticles { .. } => println!("{}", NO_ARTICLES_MESSAGE),
                QueryReply::UnknownFeed { available, .. } => {
                    println!("Unknown feed. Available feeds: {}", available.join(", "))
                }
            }
        }
        Command::SetChannel { channel_id } => {
            println!("{}", commands.request_set_channel(channel_id)?);
        }
        Command::Stop => {
            commands.request_clear_channel()?;
            println!("Daily news disabled.");
        }
        Command::SetFeed { feed } => {
            println!("{}", commands.request_set_feed(&feed)?);
        }
        Command::Status => println!("{}", commands.request_status().await),
        Command::Feeds => println!("{}", commands.request_feeds()),
        Command::PostNow => {
            let outcome = scheduler.run_cycle().await?;
            println!("{:?}", outcome);
        }
    }

    Ok(())
}
