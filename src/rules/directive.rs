use std::fmt;

/// 分流规则类型
///
/// Closed vocabulary shared by the Clash and Surge outputs. Anything else is
/// filtered out at conversion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    Domain,
    DomainSuffix,
    DomainKeyword,
    GeoIp,
    IpCidr,
    IpCidr6,
    SrcIpCidr,
    SrcPort,
    DstPort,
    ProcessName,
    ProcessPath,
    IpSet,
    RuleSet,
    Script,
    /// Catch-all; `FINAL` is accepted as an alias
    Match,
}

impl RuleType {
    /// Map a raw type token onto the vocabulary. Case-sensitive, as both
    /// targets are.
    pub fn parse(raw: &str) -> Option<Self> {
        let t = match raw.trim() {
            "DOMAIN" => RuleType::Domain,
            "DOMAIN-SUFFIX" => RuleType::DomainSuffix,
            "DOMAIN-KEYWORD" => RuleType::DomainKeyword,
            "GEOIP" => RuleType::GeoIp,
            "IP-CIDR" => RuleType::IpCidr,
            "IP-CIDR6" => RuleType::IpCidr6,
            "SRC-IP-CIDR" => RuleType::SrcIpCidr,
            "SRC-PORT" => RuleType::SrcPort,
            "DST-PORT" => RuleType::DstPort,
            "PROCESS-NAME" => RuleType::ProcessName,
            "PROCESS-PATH" => RuleType::ProcessPath,
            "IPSET" => RuleType::IpSet,
            "RULE-SET" => RuleType::RuleSet,
            "SCRIPT" => RuleType::Script,
            "MATCH" | "FINAL" => RuleType::Match,
            _ => return None,
        };
        Some(t)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::Domain => "DOMAIN",
            RuleType::DomainSuffix => "DOMAIN-SUFFIX",
            RuleType::DomainKeyword => "DOMAIN-KEYWORD",
            RuleType::GeoIp => "GEOIP",
            RuleType::IpCidr => "IP-CIDR",
            RuleType::IpCidr6 => "IP-CIDR6",
            RuleType::SrcIpCidr => "SRC-IP-CIDR",
            RuleType::SrcPort => "SRC-PORT",
            RuleType::DstPort => "DST-PORT",
            RuleType::ProcessName => "PROCESS-NAME",
            RuleType::ProcessPath => "PROCESS-PATH",
            RuleType::IpSet => "IPSET",
            RuleType::RuleSet => "RULE-SET",
            RuleType::Script => "SCRIPT",
            RuleType::Match => "MATCH",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One routing rule: traffic matching `rule_type`/`param` goes to `strategy`.
///
/// `rule_type` keeps the raw token from the config or rule list; unknown
/// types survive parsing and are dropped by the converters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDirective {
    pub rule_type: String,
    pub param: String,
    pub strategy: String,
    /// Trailing modifier, normally `no-resolve`. Empty when absent.
    pub no_resolve: String,
}

impl RoutingDirective {
    /// Parse a `type[,param[,modifier]]` body and bind it to `strategy`.
    pub fn from_body(body: &str, strategy: &str) -> Self {
        let mut parts = body.splitn(3, ',').map(str::trim);
        Self {
            rule_type: parts.next().unwrap_or_default().to_string(),
            param: parts.next().unwrap_or_default().to_string(),
            strategy: strategy.to_string(),
            no_resolve: parts.next().unwrap_or_default().to_string(),
        }
    }

    pub fn known_type(&self) -> Option<RuleType> {
        RuleType::parse(&self.rule_type)
    }

    /// Render as `TYPE[,param],strategy[,modifier]`, or `None` when the type
    /// is outside the vocabulary.
    pub fn render(&self) -> Option<String> {
        let rule_type = self.known_type()?;
        let mut fields = vec![rule_type.as_str()];
        if !self.param.is_empty() {
            fields.push(&self.param);
        }
        fields.push(&self.strategy);
        if !self.no_resolve.is_empty() {
            fields.push(&self.no_resolve);
        }
        Some(fields.join(","))
    }
}
