//! newsbrief command line
//!
//! ```sh
//! newsbrief summarize "Bitcoin rallies" article.txt --format text
//! cat article.txt | newsbrief summarize "Bitcoin rallies" -
//! newsbrief serve --config newsbrief.json --bind 127.0.0.1:8000
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use newsbrief::{Config, Error, NewsSummarizer, Result, Summary, SummaryService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsbrief", version, about = "Summarize news articles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize one article and print the result
    Summarize {
        /// Article title
        title: String,
        /// Article text, a path to a file containing it, or `-` for stdin
        text: String,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the summary to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Maximum number of hashtags
        #[arg(long)]
        max_hashtags: Option<usize>,
        /// Maximum number of words in the title
        #[arg(long)]
        max_title_words: Option<usize>,
    },
    /// Run the REST API until SIGINT or SIGTERM
    Serve {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Address to bind (overrides config and NEWSBRIEF_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Summarize {
            title,
            text,
            config,
            output,
            format,
            max_hashtags,
            max_title_words,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(max) = max_hashtags {
                config.summary.max_hashtags = max;
                config.summary.min_hashtags = config.summary.min_hashtags.min(max);
            }
            if let Some(words) = max_title_words {
                config.summary.max_title_words = words;
            }
            config.validate()?;
            init_tracing(&config);

            let text = read_text(&text).await?;
            let summarizer = NewsSummarizer::new(&config)?;
            let summary = summarizer.summarize_article(&title, &text).await?;

            let rendered = render(&summary, format)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered).await?;
                    tracing::info!(path = %path.display(), "summary written");
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
        Command::Serve { config, bind } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.api.bind_address = bind;
            }
            config.validate()?;
            init_tracing(&config);
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "newsbrief starting");

            let summarizer = Arc::new(NewsSummarizer::new(&config)?);
            let service = SummaryService::new(config, summarizer).await?;
            newsbrief::api::start_api_server_with_shutdown(service, newsbrief::wait_for_signal())
                .await
        }
    }
}

/// File (if any), then environment overrides
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    Ok(config)
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so `summarize` output stays clean on stdout
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// `-` reads stdin; an existing file path reads the file; anything else is the text itself
async fn read_text(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    match tokio::fs::metadata(arg).await {
        Ok(meta) if meta.is_file() => Ok(tokio::fs::read_to_string(arg).await?),
        _ => Ok(arg.to_string()),
    }
}

fn render(summary: &Summary, format: Format) -> Result<String> {
    match format {
        Format::Json => serde_json::to_string_pretty(summary).map_err(Error::from),
        Format::Text => Ok(format!(
            "Title: {}\n\nParagraph:\n{}\n\nHashtags: {}",
            summary.title, summary.paragraph, summary.hashtags
        )),
    }
}
