//! `custom_proxy_group` entries.
//!
//! ```text
//! name`select`[]DIRECT`[]REJECT`.*
//! name`url-test|fallback|load-balance`member...`http://test/url`interval[,timeout][,tolerance]
//! ```

use std::fmt;

use tracing::warn;

const LITERAL_PREFIX: &str = "[]";

/// 代理组类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    Select,
    UrlTest,
    Fallback,
    LoadBalance,
    /// Anything else; parsed but never emitted
    Unknown(String),
}

impl GroupKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "select" => GroupKind::Select,
            "url-test" => GroupKind::UrlTest,
            "fallback" => GroupKind::Fallback,
            "load-balance" => GroupKind::LoadBalance,
            other => GroupKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupKind::Select => "select",
            GroupKind::UrlTest => "url-test",
            GroupKind::Fallback => "fallback",
            GroupKind::LoadBalance => "load-balance",
            GroupKind::Unknown(raw) => raw,
        }
    }

    /// Kinds that probe a test URL.
    pub fn is_tested(&self) -> bool {
        matches!(
            self,
            GroupKind::UrlTest | GroupKind::Fallback | GroupKind::LoadBalance
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, GroupKind::Unknown(_))
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group member as written in the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member<'a> {
    /// `[]NAME`: a group or built-in policy, emitted verbatim
    Literal(&'a str),
    /// Anything else stands for every decoded node
    AllNodes(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyGroupDefinition {
    pub name: String,
    pub kind: GroupKind,
    /// Raw member entries, `[]` prefixes kept
    pub members: Vec<String>,
    pub url: String,
    pub interval: Option<u32>,
    pub timeout: Option<u32>,
    pub tolerance: Option<u32>,
}

impl ProxyGroupDefinition {
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            name: name.into(),
            kind,
            members: Vec::new(),
            url: String::new(),
            interval: None,
            timeout: None,
            tolerance: None,
        }
    }

    pub fn member_refs(&self) -> impl Iterator<Item = Member<'_>> {
        self.members
            .iter()
            .map(|m| match m.strip_prefix(LITERAL_PREFIX) {
                Some(name) => Member::Literal(name),
                None => Member::AllNodes(m.as_str()),
            })
    }
}

/// Parse one backtick-separated group definition. A blank name yields `None`.
pub fn parse_group(value: &str) -> Option<ProxyGroupDefinition> {
    let mut parts = value.split('`');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        warn!(value = value, "proxy group without a name, skipping");
        return None;
    }

    let kind = GroupKind::parse(parts.next().unwrap_or_default());
    let mut group = ProxyGroupDefinition::new(name, kind);
    let entries = parts.filter(|p| !p.trim().is_empty());

    if group.kind == GroupKind::Select {
        group.members.extend(entries.map(str::to_string));
    } else if group.kind.is_tested() {
        let mut after_url = false;
        for entry in entries {
            if entry.starts_with("http://") || entry.starts_with("https://") {
                group.url = entry.to_string();
                after_url = true;
                continue;
            }
            let is_options = after_url && apply_test_options(&mut group, entry);
            if !is_options {
                group.members.push(entry.to_string());
            }
        }
    } else {
        warn!(
            group = group.name.as_str(),
            kind = group.kind.as_str(),
            "unknown proxy group kind, group will not be emitted"
        );
    }

    Some(group)
}

/// `interval[,timeout][,tolerance]`. Returns false when `entry` is not an
/// option tuple, i.e. its first field is not a number.
fn apply_test_options(group: &mut ProxyGroupDefinition, entry: &str) -> bool {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    let Ok(interval) = fields[0].parse::<u32>() else {
        return false;
    };
    group.interval = Some(interval);
    group.timeout = fields.get(1).and_then(|f| f.parse().ok());
    group.tolerance = fields.get(2).and_then(|f| f.parse().ok());
    true
}
