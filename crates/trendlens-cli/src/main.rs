mod run;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "trendlens")]
#[command(about = "Track keyword mentions and sentiment across social and web sources")]
struct Cli {
    /// Print raw JSON instead of a markdown report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Mention volume, sentiment and top sources for a keyword
    Track {
        keyword: String,
        /// Window such as 1h, 24h or 7d
        #[arg(long, short)]
        timeframe: Option<String>,
    },
    /// Full trend metrics for a keyword
    Analyze {
        keyword: String,
        #[arg(long, short)]
        timeframe: Option<String>,
    },
    /// Compare several keywords side by side
    Compare {
        #[arg(required = true, num_args = 1..)]
        keywords: Vec<String>,
        #[arg(long, short)]
        timeframe: Option<String>,
    },
    /// Topics surfacing in recent content
    Trending {
        /// tech, finance or general
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Sentiment detail for a keyword by source type
    Sentiment {
        keyword: String,
        /// social (or twitter), web, or both
        #[arg(long = "source", short = 's', default_value = "both")]
        source_type: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = trendlens_core::load_app_config()?;
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_directive()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = run::build_engine(&config)?;
    let output = run::execute(&engine, cli.command, cli.json).await?;
    println!("{output}");
    Ok(())
}
