//! End-to-end conversion: fetch, decode, parse rules, render.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::common::fetch::ContentFetcher;
use crate::config::types::Settings;
use crate::convert::{converter_for, Dialect};
use crate::rules::parse_rule_config;
use crate::subscription::{parse_subscription, SubFormat};

/// Rule config used when none is given.
pub const DEFAULT_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/ACL4SSR/ACL4SSR/refs/heads/master/Clash/config/ACL4SSR.ini";

#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub subscription_url: String,
    pub config_url: String,
    pub format: SubFormat,
    pub target: Dialect,
    /// Drop nodes that fail validation instead of emitting them
    pub validate: bool,
}

impl ConvertRequest {
    pub fn new(subscription_url: impl Into<String>) -> Self {
        Self {
            subscription_url: subscription_url.into(),
            config_url: DEFAULT_CONFIG_URL.to_string(),
            format: SubFormat::Line,
            target: Dialect::Clash,
            validate: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub output: String,
    pub nodes: usize,
    /// Links that failed to decode
    pub skipped: usize,
    /// Nodes dropped by validation
    pub invalid: usize,
}

/// Run one conversion. Failing to fetch either top-level source is fatal.
pub fn convert_sources(
    request: &ConvertRequest,
    fetcher: &dyn ContentFetcher,
    settings: &Settings,
) -> Result<ConvertOutcome> {
    let raw = fetcher
        .fetch(&request.subscription_url)
        .with_context(|| format!("fetch subscription {}", request.subscription_url))?;
    let report = parse_subscription(&String::from_utf8_lossy(&raw), request.format)
        .context("decode subscription")?;
    let skipped = report.failed();
    if let Some(ref err) = report.error {
        warn!(failed = err.len(), "{}", err);
    }
    let mut nodes = report.nodes;

    let raw_config = fetcher
        .fetch(&request.config_url)
        .with_context(|| format!("fetch rule config {}", request.config_url))?;
    let rules = parse_rule_config(
        &String::from_utf8_lossy(&raw_config),
        fetcher,
        &settings.rules,
    )
    .context("parse rule config")?;

    let mut invalid = 0;
    if request.validate {
        nodes.retain(|node| match node.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "dropping invalid node");
                invalid += 1;
                false
            }
        });
    }

    let converter = converter_for(request.target, settings);
    let output = converter
        .convert(&nodes, &rules)
        .with_context(|| format!("render {} config", converter.dialect()))?;

    info!(
        target = request.target.as_str(),
        nodes = nodes.len(),
        skipped = skipped,
        invalid = invalid,
        "conversion finished"
    );
    Ok(ConvertOutcome {
        output,
        nodes: nodes.len(),
        skipped,
        invalid,
    })
}
