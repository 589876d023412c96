//! Subscription decoding: raw content in, normalized [`Node`]s out.

pub mod clash;
pub mod link;
pub mod node;

use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::common::codec::base64_decode_str;
use crate::common::error::{BatchDecodeError, LinkFailure, SubscriptionError};

pub use node::{
    Node, NodeKind, Protocol, ShadowsocksParams, ShadowsocksRParams, TrojanParams, VmessParams,
};

/// Shape of the subscription payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubFormat {
    /// One scheme-prefixed link per line
    #[default]
    Line,
    /// An existing Clash YAML document
    ClashX,
}

impl SubFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SubFormat::Line => "line",
            SubFormat::ClashX => "clashx",
        }
    }
}

impl FromStr for SubFormat {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(SubFormat::Line),
            "clashx" => Ok(SubFormat::ClashX),
            other => Err(SubscriptionError::UnknownFormat(other.to_string())),
        }
    }
}

/// Decoded nodes plus the failures that were skipped on the way.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub nodes: Vec<Node>,
    pub error: Option<BatchDecodeError>,
}

impl ParseReport {
    pub fn failed(&self) -> usize {
        self.error.as_ref().map_or(0, BatchDecodeError::len)
    }
}

/// Decode a subscription payload.
///
/// A malformed link never aborts a `line` batch; it is recorded in
/// [`ParseReport::error`] and the rest of the batch is still decoded.
pub fn parse_subscription(
    content: &str,
    format: SubFormat,
) -> Result<ParseReport, SubscriptionError> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Err(SubscriptionError::EmptyContent);
    }

    let report = match format {
        SubFormat::Line => parse_lines(content),
        SubFormat::ClashX => ParseReport {
            nodes: clash::parse_clash_proxies(content)?,
            error: None,
        },
    };

    info!(
        format = format.as_str(),
        nodes = report.nodes.len(),
        failed = report.failed(),
        "subscription decoded"
    );
    Ok(report)
}

fn parse_lines(content: &str) -> ParseReport {
    let unwrapped;
    let payload = if content.contains("://") {
        content
    } else {
        match base64_decode_str(content) {
            Ok(decoded) => {
                debug!("subscription payload was base64 encoded");
                unwrapped = decoded;
                unwrapped.as_str()
            }
            Err(_) => content,
        }
    };

    let mut nodes = Vec::new();
    let mut failures = Vec::new();
    for (idx, raw) in payload.split('\n').enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match link::decode_link(line) {
            Ok(node) => nodes.push(node),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping undecodable link");
                failures.push(LinkFailure {
                    line: idx + 1,
                    link: line.to_string(),
                    error: e,
                });
            }
        }
    }

    ParseReport {
        nodes,
        error: (!failures.is_empty()).then_some(BatchDecodeError { failures }),
    }
}
