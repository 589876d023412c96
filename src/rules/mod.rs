//! Rule configuration: routing directives and proxy group definitions read
//! from the `[custom]` section of an INI rule config.

pub mod directive;
pub mod group;
pub mod ini;
pub mod ruleset;

use tracing::{info, warn};

use crate::common::codec::parse_bool;
use crate::common::error::RuleConfigError;
use crate::common::fetch::ContentFetcher;
use crate::config::types::RuleSettings;

pub use directive::{RoutingDirective, RuleType};
pub use group::{GroupKind, Member, ProxyGroupDefinition};
pub use ini::IniDocument;

const SECTION: &str = "custom";

/// Parsed rule config, read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfiguration {
    /// In config order; remote lists are expanded in place
    pub directives: Vec<RoutingDirective>,
    /// Unique by name, in order of first definition
    pub groups: Vec<ProxyGroupDefinition>,
    pub enable_rule_generator: bool,
    pub overwrite_original_rules: bool,
}

impl RuleConfiguration {
    pub fn group(&self, name: &str) -> Option<&ProxyGroupDefinition> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Insert `group`, replacing an earlier definition with the same name in
    /// its original position.
    fn push_group(&mut self, group: ProxyGroupDefinition) {
        match self.groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => {
                warn!(group = group.name.as_str(), "duplicate proxy group, later definition wins");
                *existing = group;
            }
            None => self.groups.push(group),
        }
    }
}

/// Parse a rule config, fetching remote rule lists through `fetcher`.
///
/// Only syntax errors fail the parse; bad entries and unreachable lists are
/// logged and skipped.
pub fn parse_rule_config(
    content: &str,
    fetcher: &dyn ContentFetcher,
    settings: &RuleSettings,
) -> Result<RuleConfiguration, RuleConfigError> {
    let doc = IniDocument::parse(content)?;
    let mut config = RuleConfiguration::default();
    let Some(section) = doc.section(SECTION) else {
        warn!("rule config has no [custom] section");
        return Ok(config);
    };

    for value in section.values("ruleset") {
        config
            .directives
            .extend(ruleset::expand_ruleset(value, fetcher, settings));
    }

    for value in section.values("custom_proxy_group") {
        if let Some(group) = group::parse_group(value) {
            config.push_group(group);
        }
    }

    config.enable_rule_generator = flag(section.get("enable_rule_generator"));
    config.overwrite_original_rules = flag(section.get("overwrite_original_rules"));

    info!(
        directives = config.directives.len(),
        groups = config.groups.len(),
        "rule config parsed"
    );
    Ok(config)
}

fn flag(value: Option<&str>) -> bool {
    let Some(raw) = value else {
        return false;
    };
    parse_bool(raw).unwrap_or_else(|| {
        warn!(value = raw, "not a boolean, using false");
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fetch::StaticFetcher;

    fn parse(content: &str) -> RuleConfiguration {
        parse_rule_config(content, &StaticFetcher::new(), &RuleSettings::default()).unwrap()
    }

    #[test]
    fn inline_ruleset_and_flags() {
        let cfg = parse(
            "[custom]\nruleset=🎯 Direct,[]GEOIP,CN\nruleset=🐟 Final,[]FINAL\nenable_rule_generator=true\noverwrite_original_rules=1\n",
        );
        assert_eq!(cfg.directives.len(), 2);
        assert_eq!(cfg.directives[0].rule_type, "GEOIP");
        assert_eq!(cfg.directives[0].param, "CN");
        assert_eq!(cfg.directives[0].strategy, "🎯 Direct");
        assert_eq!(cfg.directives[1].render().as_deref(), Some("MATCH,🐟 Final"));
        assert!(cfg.enable_rule_generator);
        assert!(cfg.overwrite_original_rules);
    }

    #[test]
    fn flags_default_false() {
        let cfg = parse("[custom]\nenable_rule_generator=maybe\n");
        assert!(!cfg.enable_rule_generator);
        assert!(!cfg.overwrite_original_rules);
    }

    #[test]
    fn missing_section_is_empty() {
        assert_eq!(parse("[other]\nruleset=a,[]MATCH\n"), RuleConfiguration::default());
        assert_eq!(parse(""), RuleConfiguration::default());
    }

    #[test]
    fn duplicate_group_shadows_in_place() {
        let cfg = parse(
            "[custom]\ncustom_proxy_group=A`select`[]DIRECT\ncustom_proxy_group=B`select`.*\ncustom_proxy_group=A`url-test`.*`http://t/204`300\n",
        );
        let names: Vec<&str> = cfg.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        let a = cfg.group("A").unwrap();
        assert_eq!(a.kind, GroupKind::UrlTest);
        assert_eq!(a.interval, Some(300));
    }

    #[test]
    fn syntax_error_propagates() {
        let err = parse_rule_config(
            "[custom]\nruleset=a,[]MATCH\nbroken line\n",
            &StaticFetcher::new(),
            &RuleSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RuleConfigError::Syntax { line: 3, .. }));
    }
}
