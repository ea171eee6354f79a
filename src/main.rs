use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use review_harvest::config::Config;
use review_harvest::pipeline::RunContext;
use review_harvest::report;

/// Review Harvest - storefront review collection and insight reporting
#[derive(Parser, Debug)]
#[command(name = "review-harvest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collects storefront reviews and produces an insight report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, default_value = "false", global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline and print the summary report
    Run {
        /// Play Store URL of the app (overrides PLAY_PACKAGE)
        #[arg(long)]
        play_url: Option<String>,

        /// App Store URL of the app (overrides APP_STORE_ID)
        #[arg(long)]
        app_store_url: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Fetch the merged corpus without insight generation
    Fetch {
        /// Play Store URL of the app (overrides PLAY_PACKAGE)
        #[arg(long)]
        play_url: Option<String>,

        /// App Store URL of the app (overrides APP_STORE_ID)
        #[arg(long)]
        app_store_url: Option<String>,

        /// Output format (json, table, summary)
        #[arg(short, long, default_value = "summary")]
        output: String,
    },

    /// Show configured providers and tunables
    Status,
}

/// Sets up structured logging with tracing
fn setup_logging(log_level: &str, json_output: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

fn apply_url_overrides(
    config: &mut Config,
    play_url: Option<String>,
    app_store_url: Option<String>,
) -> Result<()> {
    if let Some(url) = play_url {
        config.apply_play_url(&url)?;
    }
    if let Some(url) = app_store_url {
        config.apply_app_store_url(&url)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.json_logs);

    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        correlation_id = %correlation_id,
        "Starting review harvest"
    );

    let mut config = Config::load()?;

    match cli.command {
        Commands::Run {
            play_url,
            app_store_url,
            output,
        } => {
            apply_url_overrides(&mut config, play_url, app_store_url)?;
            let context = RunContext::from_config(config)?;
            let summary = context.run().await;

            match output.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                _ => print!("{}", report::render_text(&summary)),
            }
        }

        Commands::Fetch {
            play_url,
            app_store_url,
            output,
        } => {
            apply_url_overrides(&mut config, play_url, app_store_url)?;
            let context = RunContext::from_config(config)?;
            let corpus = context.collect_corpus().await;

            match output.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&corpus)?),
                "table" => {
                    println!(
                        "\n{:<18} {:<12} {:<8} {:<20}",
                        "ID", "Source", "Rating", "Timestamp"
                    );
                    println!("{}", "-".repeat(60));
                    for review in &corpus {
                        let id_preview: String = review.id.chars().take(16).collect();
                        println!(
                            "{:<18} {:<12} {:<8} {:<20}",
                            id_preview,
                            review.source.to_string(),
                            review.rating,
                            review.timestamp.format("%Y-%m-%d %H:%M")
                        );
                    }
                    println!("\nTotal: {} reviews", corpus.len());
                }
                _ => {
                    println!("\nFetch Summary");
                    println!("=============");
                    println!("Reviews: {}", corpus.len());
                    if let (Some(first), Some(last)) = (corpus.first(), corpus.last()) {
                        println!("Newest: {}", first.timestamp.format("%Y-%m-%d %H:%M"));
                        println!("Oldest: {}", last.timestamp.format("%Y-%m-%d %H:%M"));
                    }
                    let mut by_source: std::collections::BTreeMap<String, usize> =
                        std::collections::BTreeMap::new();
                    for review in &corpus {
                        *by_source.entry(review.source.to_string()).or_insert(0) += 1;
                    }
                    println!("\nBy Source:");
                    for (source, count) in by_source {
                        println!("  - {source}: {count}");
                    }
                }
            }
        }

        Commands::Status => {
            println!("\nReview Harvest Status");
            println!("=====================\n");
            println!("Providers:");
            println!(
                "  - Play Store: {}",
                config
                    .play_package
                    .as_deref()
                    .unwrap_or("not configured (set PLAY_PACKAGE)")
            );
            println!(
                "  - App Store:  {}",
                config
                    .app_store_id
                    .as_deref()
                    .unwrap_or("not configured (set APP_STORE_ID)")
            );
            println!(
                "  - Backend:    {}",
                if config.has_backend() {
                    config.gemini_model.as_str()
                } else {
                    "not configured (deterministic insights only)"
                }
            );
            println!("\nWindow: last {} days", config.window_days);
            println!("Caps: {} total, {} per bucket, {} per page",
                config.global_review_cap, config.bucket_cap, config.page_size);
        }
    }

    Ok(())
}
