//! Render nodes plus a rule configuration into a client config.

pub mod clash;
pub mod surge;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::common::error::ConvertError;
use crate::config::types::Settings;
use crate::rules::{Member, ProxyGroupDefinition, RoutingDirective, RuleConfiguration};
use crate::subscription::node::Node;

pub use clash::{ClashConverter, ClashProxy};
pub use surge::SurgeConverter;

/// 目标客户端格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Clash,
    Surge,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Clash => "clash",
            Dialect::Surge => "surge",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clash" => Ok(Dialect::Clash),
            "surge" => Ok(Dialect::Surge),
            other => Err(ConvertError::UnknownTarget(other.to_string())),
        }
    }
}

/// A node mapped onto one dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyRecord {
    Clash(ClashProxy),
    Surge(String),
}

pub trait Converter {
    fn dialect(&self) -> Dialect;

    /// Produce the full client config text. Any node the dialect cannot
    /// express aborts the conversion.
    fn convert(&self, nodes: &[Node], rules: &RuleConfiguration) -> Result<String, ConvertError>;
}

/// Build the converter for `dialect` from the loaded baselines.
pub fn converter_for(dialect: Dialect, settings: &Settings) -> Box<dyn Converter> {
    match dialect {
        Dialect::Clash => Box::new(ClashConverter::new(settings.clash.clone())),
        Dialect::Surge => Box::new(SurgeConverter::new(settings.surge.clone())),
    }
}

/// A group definition with its members resolved against the node list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedGroup<'a> {
    pub definition: &'a ProxyGroupDefinition,
    pub members: Vec<String>,
}

/// Resolve member lists. `[]x` becomes `x`; any other entry pulls in every
/// node name in supply order. A name is listed at most once per group.
/// Groups of unknown kind are dropped.
pub fn expand_groups<'a>(
    groups: &'a [ProxyGroupDefinition],
    node_names: &[&str],
) -> Vec<ExpandedGroup<'a>> {
    groups
        .iter()
        .filter(|g| g.kind.is_known())
        .map(|definition| {
            let mut members: Vec<String> = Vec::new();
            for member in definition.member_refs() {
                match member {
                    Member::Literal(name) => {
                        if !members.iter().any(|m| m.as_str() == name) {
                            members.push(name.to_string());
                        }
                    }
                    Member::AllNodes(raw) => {
                        if !node_names.contains(&raw) {
                            debug!(
                                group = definition.name.as_str(),
                                entry = raw,
                                "entry is not a node name, expanding to all nodes"
                            );
                        }
                        for name in node_names {
                            if !members.iter().any(|m| m.as_str() == *name) {
                                members.push(name.to_string());
                            }
                        }
                    }
                }
            }
            ExpandedGroup {
                definition,
                members,
            }
        })
        .collect()
}

/// Directive lines in config order; unknown types dropped.
pub fn render_rules(directives: &[RoutingDirective]) -> Vec<String> {
    directives
        .iter()
        .filter_map(|d| {
            let line = d.render();
            if line.is_none() {
                debug!(rule_type = d.rule_type.as_str(), "dropping unsupported rule type");
            }
            line
        })
        .collect()
}

/// Map every node, failing on the first one the dialect rejects.
pub(crate) fn map_nodes(nodes: &[Node], dialect: Dialect) -> Result<Vec<ProxyRecord>, ConvertError> {
    nodes.iter().map(|n| n.to_target(dialect)).collect()
}
