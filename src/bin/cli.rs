//! Penpals CLI
//!
//! Fetch, export and search recent posts of r/penpals and r/penpalsover30.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use penpals::{
    error::{AppError, Result},
    export,
    models::{AgeRange, Config, Credentials, FilterSpec, Post, Recency, SortMode, Subreddit},
    pipeline::{self, Feed, QueryResult},
    services::RedditClient,
    utils::time::{Freshness, display_date},
};

/// Penpals - Reddit penpal post finder
#[derive(Parser, Debug)]
#[command(
    name = "penpals",
    version,
    about = "Search recent posts of the penpal subreddits"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "penpals.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch posts and report what was collected
    Fetch {
        /// penpals, penpalsover30 or all
        #[arg(short, long, default_value = "all")]
        subreddit: String,

        /// Maximum posts per subreddit (default from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Also write the posts to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search posts by keywords, age range and recency
    Search {
        /// penpals, penpalsover30 or all
        #[arg(short, long, default_value = "all")]
        subreddit: String,

        /// Comma-separated keywords
        #[arg(short, long, default_value = "")]
        keywords: String,

        /// Lower age bound (requires --max-age)
        #[arg(long, requires = "max_age")]
        min_age: Option<u32>,

        /// Upper age bound (requires --min-age)
        #[arg(long, requires = "min_age")]
        max_age: Option<u32>,

        /// today, last-week, last-month or none
        #[arg(short, long, default_value = "none")]
        recency: Recency,

        /// recency or title
        #[arg(long, default_value = "recency")]
        sort: SortMode,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Search a previous export instead of fetching
        #[arg(long)]
        from_csv: Option<PathBuf>,
    },

    /// Fetch one subreddit and write it to CSV
    Export {
        #[arg(short, long)]
        subreddit: Subreddit,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate configuration and credentials
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_feed(config: &Config) -> Result<Feed<RedditClient>> {
    let credentials = Credentials::from_env()?;
    log::debug!("Using credentials {:?}", credentials);
    let client = RedditClient::new(config, credentials)?;
    Ok(Feed::new(client, config))
}

/// Load posts from the API, one subreddit after another, within one budget.
async fn load_posts(feed: &Feed<RedditClient>, targets: &[Subreddit]) -> Result<Vec<Post>> {
    let mut posts = Vec::new();
    for (subreddit, outcome) in feed.load_many(targets).await {
        let result = outcome.into_result(subreddit, feed.timeout())?;
        posts.extend(result.posts.iter().cloned());
    }
    Ok(posts)
}

fn print_page(result: &QueryResult<'_>, config: &Config) {
    let now = Utc::now();
    let display = &config.display;
    let page = &result.page;

    println!(
        "Showing {} of {} matching posts (page {}/{})",
        page.label(),
        result.matched,
        page.index + 1,
        page.total_pages
    );
    for post in &page.posts {
        let title = result
            .matcher
            .highlight(&post.title, &display.highlight_open, &display.highlight_close);
        println!();
        println!(
            "[{}] r/{} | {} | u/{}",
            Freshness::classify(post.created_at, now).as_str(),
            post.subreddit,
            display_date(post.created_at, post.created_raw.as_deref(), now),
            post.author
        );
        println!("  {}", title);
        if !post.permalink.is_empty() {
            println!("  {}", post.permalink);
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Fetch {
            subreddit,
            count,
            output,
        } => {
            if let Some(count) = count {
                config.fetch.max_posts = count;
            }
            config.validate()?;
            let targets = Subreddit::parse_selection(&subreddit)?;
            let feed = build_feed(&config)?;

            let mut posts = Vec::new();
            for (target, outcome) in feed.load_many(&targets).await {
                match outcome {
                    pipeline::FetchOutcome::Posts(result) => {
                        log::info!("r/{}: {} posts", target, result.posts.len());
                        posts.extend(result.posts.iter().cloned());
                    }
                    outcome => {
                        let retryable = outcome.is_retryable();
                        if let Err(error) = outcome.into_result(target, feed.timeout()) {
                            log::error!("r/{}: {} (retryable: {})", target, error, retryable);
                        }
                    }
                }
            }

            if let Some(output) = output {
                export::export_csv(&output, &posts)?;
            }
        }

        Command::Search {
            subreddit,
            keywords,
            min_age,
            max_age,
            recency,
            sort,
            page,
            from_csv,
        } => {
            let targets = Subreddit::parse_selection(&subreddit)?;
            let age_range = match (min_age, max_age) {
                (Some(min), Some(max)) => Some(AgeRange::new(min, max)?),
                _ => None,
            };
            let spec = FilterSpec {
                keywords: FilterSpec::parse_keywords(&keywords),
                age_range,
                recency,
                sort,
                page: page.saturating_sub(1),
            };

            let posts = match from_csv {
                Some(path) => {
                    // Exports carry no subreddit column, so the origin must be named.
                    let [origin] = targets[..] else {
                        return Err(AppError::validation(
                            "--from-csv needs a single --subreddit (penpals or penpalsover30)",
                        ));
                    };
                    let raw = export::import_csv(&path)?;
                    pipeline::deduplicate(pipeline::normalize(raw, origin))
                }
                None => {
                    config.validate()?;
                    let feed = build_feed(&config)?;
                    load_posts(&feed, &targets).await?
                }
            };

            let results = pipeline::run_query_per_subreddit(
                &posts,
                &targets,
                &spec,
                config.display.page_size,
                Utc::now(),
            )?;
            for (subreddit, result) in &results {
                println!("== r/{} ==", subreddit);
                print_page(result, &config);
                println!();
            }
        }

        Command::Export { subreddit, output } => {
            config.validate()?;
            let feed = build_feed(&config)?;
            let posts = load_posts(&feed, &[subreddit]).await?;
            export::export_csv(&output, &posts)?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            match Credentials::from_env() {
                Ok(credentials) => log::info!("✓ Credentials OK ({})", credentials.user_agent()),
                Err(e) => {
                    log::error!("Credential check failed: {}", e);
                    return Err(e);
                }
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
