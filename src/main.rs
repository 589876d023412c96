use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use subconvert::app::{convert_sources, ConvertRequest, DEFAULT_CONFIG_URL};
use subconvert::common::HttpFetcher;
use subconvert::config::{load_settings, Settings};
use subconvert::convert::Dialect;
use subconvert::subscription::SubFormat;

#[derive(Parser, Debug)]
#[command(name = "subconvert")]
#[command(about = "Convert proxy subscriptions into Clash or Surge configs", long_about = None)]
struct Args {
    /// Subscription URL or local path
    #[arg(short, long)]
    url: String,

    /// Rule config (INI) URL or local path
    #[arg(short, long, default_value = DEFAULT_CONFIG_URL)]
    config: String,

    /// Output dialect: clash | surge
    #[arg(short, long, default_value = "clash")]
    target: Dialect,

    /// Subscription format: line | clashx
    #[arg(short, long, default_value = "line")]
    format: SubFormat,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Converter settings (YAML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Drop nodes that fail validation
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = match args.settings {
        Some(ref path) => load_settings(&path.to_string_lossy())
            .with_context(|| format!("load settings {}", path.display()))?,
        None => Settings::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log.level)),
        )
        .init();

    info!(url = args.url.as_str(), target = args.target.as_str(), "subconvert starting");

    let fetcher = HttpFetcher::new(&settings.fetch)?;
    let request = ConvertRequest {
        subscription_url: args.url,
        config_url: args.config,
        format: args.format,
        target: args.target,
        validate: args.validate,
    };
    let outcome = convert_sources(&request, &fetcher, &settings)?;

    if args.output == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(outcome.output.as_bytes())?;
        stdout.flush()?;
    } else {
        std::fs::write(&args.output, outcome.output.as_bytes())
            .with_context(|| format!("write {}", args.output))?;
        info!(path = args.output.as_str(), nodes = outcome.nodes, "config written");
    }

    Ok(())
}
