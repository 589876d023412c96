//! `ruleset=strategy,source` entries.
//!
//! `source` is either an inline rule prefixed with `[]` or the URL of a remote
//! rule list whose lines all route to `strategy`.

use tracing::{debug, info, warn};

use crate::common::fetch::ContentFetcher;
use crate::config::types::RuleSettings;

use super::directive::RoutingDirective;

const INLINE_PREFIX: &str = "[]";
const LIST_MARKER: &str = "/Clash";

/// Expand one `ruleset` value into directives.
///
/// Unusable values and unreachable lists are logged and yield nothing.
pub fn expand_ruleset(
    value: &str,
    fetcher: &dyn ContentFetcher,
    settings: &RuleSettings,
) -> Vec<RoutingDirective> {
    let Some((strategy, source)) = value.split_once(',') else {
        warn!(value = value, "ruleset without a rule or list, skipping");
        return Vec::new();
    };
    let strategy = strategy.trim();
    let source = source.trim();

    if let Some(body) = source.strip_prefix(INLINE_PREFIX) {
        return vec![RoutingDirective::from_body(body, strategy)];
    }

    let url = resolve_list_url(source, &settings.rule_base_url);
    if !is_remote(&url) {
        warn!(url = url.as_str(), strategy = strategy, "rule list is not an http(s) URL, skipping");
        return Vec::new();
    }
    let body = match fetcher.fetch(&url) {
        Ok(body) => body,
        Err(e) => {
            warn!(url = url.as_str(), strategy = strategy, error = %e, "rule list fetch failed, skipping");
            return Vec::new();
        }
    };

    let directives = parse_rule_list(&String::from_utf8_lossy(&body), strategy);
    info!(
        url = url.as_str(),
        strategy = strategy,
        rules = directives.len(),
        "rule list expanded"
    );
    directives
}

/// Rebase a list URL onto `base`: the part after the first `/Clash` is kept.
/// URLs without the marker are used as given.
pub fn resolve_list_url(source: &str, base: &str) -> String {
    match source.find(LIST_MARKER) {
        Some(pos) => {
            let tail = &source[pos + LIST_MARKER.len()..];
            format!("{}{}", base.trim_end_matches('/'), tail)
        }
        None => {
            debug!(url = source, "rule list URL has no /Clash segment, fetching as-is");
            source.to_string()
        }
    }
}

/// Rule lists come from the network only; a config must not point at local files.
fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// One directive per non-blank, non-`#` line.
pub fn parse_rule_list(content: &str, strategy: &str) -> Vec<RoutingDirective> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| RoutingDirective::from_body(line, strategy))
        .collect()
}
