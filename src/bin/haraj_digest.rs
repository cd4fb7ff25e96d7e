//! Command-line entry point: scrape the listing, extract a saved page, or
//! print the current digest.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::error;
use url::Url;

use haraj_digest::store::{JsonFilePersistence, Persistence};
use haraj_digest::{
    extract_ads_from_url, pipeline, telemetry, HttpSnapshotSource, HttpSourceConfig, Options,
    ReplaySource, SnapshotSource,
};

#[derive(Parser)]
#[command(name = "haraj_digest", version, about = "Classified-ad digest scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect ads, update the store and write a new digest
    Scrape(ScrapeCmd),
    /// Extract ads from one HTML file (or stdin) and print them as JSON
    Extract(ExtractCmd),
    /// Print the last written digest
    Digest(DigestCmd),
}

#[derive(Args)]
struct SiteArgs {
    /// Listing page to start from
    #[arg(long, env = "HARAJ_SITE_URL", default_value = "https://haraj.com.sa/")]
    site_url: String,

    /// Host ad links must belong to
    #[arg(long, env = "HARAJ_SITE_HOST", default_value = "haraj.com.sa")]
    site_host: String,
}

#[derive(Args)]
struct ScrapeCmd {
    #[command(flatten)]
    site: SiteArgs,

    /// Directory holding store.json and top24.json
    #[arg(long, env = "HARAJ_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Extraction passes per run
    #[arg(long, default_value_t = 8)]
    passes: usize,

    /// Pause after each scroll and load-more request, in milliseconds
    #[arg(long, default_value_t = 1200)]
    pass_delay_ms: u64,

    /// Stop after this many passes in a row add no new ad
    #[arg(long)]
    idle_stop: Option<usize>,

    /// Wall-clock bound for collection in seconds; 0 disables it
    #[arg(long, default_value_t = 300)]
    deadline_secs: u64,

    /// Hours an unseen ad stays in the store
    #[arg(long, default_value_t = 24)]
    ttl_hours: u64,

    /// Digest size (at most 300)
    #[arg(long, default_value_t = 300)]
    top_n: usize,

    /// Replay saved *.html snapshots from this directory instead of fetching
    #[arg(long)]
    replay_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Retries after a failed fetch
    #[arg(long, default_value_t = 2)]
    retries: u32,

    #[arg(long, env = "HARAJ_USER_AGENT")]
    user_agent: Option<String>,
}

#[derive(Args)]
struct ExtractCmd {
    #[command(flatten)]
    site: SiteArgs,

    /// HTML file to read; stdin when omitted or "-"
    file: Option<PathBuf>,
}

#[derive(Args)]
struct DigestCmd {
    #[arg(long, env = "HARAJ_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Scrape(cmd) => scrape(cmd).await,
        Commands::Extract(cmd) => extract(&cmd),
        Commands::Digest(cmd) => digest(&cmd),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "SCRAPE_FAILED");
            ExitCode::FAILURE
        }
    }
}

async fn scrape(cmd: ScrapeCmd) -> Result<()> {
    let options = Options {
        site_url: cmd.site.site_url.clone(),
        site_host: cmd.site.site_host.clone(),
        max_passes: cmd.passes,
        pass_delay: Duration::from_millis(cmd.pass_delay_ms),
        stop_after_idle_passes: cmd.idle_stop,
        collection_deadline: (cmd.deadline_secs > 0).then(|| Duration::from_secs(cmd.deadline_secs)),
        ttl: Duration::from_secs(cmd.ttl_hours.saturating_mul(60 * 60)),
        top_n: cmd.top_n,
        ..Options::default()
    };
    let start = Url::parse(&options.site_url)
        .with_context(|| format!("invalid site url {}", options.site_url))?;

    let mut source: Box<dyn SnapshotSource> = match &cmd.replay_dir {
        Some(dir) => Box::new(
            ReplaySource::from_dir(dir, &start)
                .with_context(|| format!("loading snapshots from {}", dir.display()))?,
        ),
        None => {
            let mut config = HttpSourceConfig {
                request_timeout: Duration::from_secs(cmd.timeout_secs),
                max_retries: cmd.retries,
                ..HttpSourceConfig::default()
            };
            if let Some(agent) = cmd.user_agent {
                config.user_agent = agent;
            }
            Box::new(HttpSnapshotSource::new(start, config)?)
        }
    };

    let persistence = JsonFilePersistence::new(&cmd.data_dir);
    let summary = pipeline::run(source.as_mut(), &persistence, &options).await?;
    println!(
        "Saved {} top items; store size: {}",
        summary.digest_len, summary.store_len
    );
    Ok(())
}

fn extract(cmd: &ExtractCmd) -> Result<()> {
    let bytes = match cmd.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        _ => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes).context("reading stdin")?;
            bytes
        }
    };
    let html = haraj_digest::encoding::decode_body(&bytes, None);

    let options = Options {
        site_url: cmd.site.site_url.clone(),
        site_host: cmd.site.site_host.clone(),
        ..Options::default()
    };
    let ads = extract_ads_from_url(&html, &options.site_url, &options)?;
    println!("{}", serde_json::to_string_pretty(&ads)?);
    Ok(())
}

fn digest(cmd: &DigestCmd) -> Result<()> {
    let persistence = JsonFilePersistence::new(&cmd.data_dir);
    match persistence.load_digest()? {
        Some(digest) => println!("{}", serde_json::to_string_pretty(&digest)?),
        None => println!("No digest in {}", cmd.data_dir.display()),
    }
    Ok(())
}
