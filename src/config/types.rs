use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Canonical host for remote ACL4SSR rule lists.
pub const DEFAULT_RULE_BASE_URL: &str =
    "https://raw.githubusercontent.com/ACL4SSR/ACL4SSR/refs/heads/master/Clash";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogConfig,
    pub fetch: FetchSettings,
    pub rules: RuleSettings,
    pub clash: ClashBaseline,
    pub surge: SurgeBaseline,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than zero");
        }
        if !self.rules.rule_base_url.starts_with("http://")
            && !self.rules.rule_base_url.starts_with("https://")
        {
            anyhow::bail!(
                "rules.rule_base_url '{}' is not an http(s) URL",
                self.rules.rule_base_url
            );
        }
        if self.clash.port == self.clash.socks_port {
            anyhow::bail!("clash.port and clash.socks_port must differ");
        }
        if self.clash.dns.nameserver.is_empty() {
            anyhow::bail!("clash.dns.nameserver needs at least one server");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Remote `ruleset` URLs are rewritten onto this base.
    pub rule_base_url: String,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            rule_base_url: DEFAULT_RULE_BASE_URL.to_string(),
        }
    }
}

/// Fixed top-level keys of an emitted Clash document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClashBaseline {
    pub port: u16,
    pub socks_port: u16,
    pub allow_lan: bool,
    pub mode: String,
    pub log_level: String,
    pub external_controller: String,
    pub secret: String,
    pub dns: ClashDns,
}

impl Default for ClashBaseline {
    fn default() -> Self {
        Self {
            port: 7890,
            socks_port: 7891,
            allow_lan: false,
            mode: "rule".to_string(),
            log_level: "info".to_string(),
            external_controller: "127.0.0.1:9090".to_string(),
            secret: String::new(),
            dns: ClashDns::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClashDns {
    pub enable: bool,
    pub ipv6: bool,
    pub nameserver: Vec<String>,
}

impl Default for ClashDns {
    fn default() -> Self {
        Self {
            enable: true,
            ipv6: false,
            nameserver: vec!["114.114.114.114".to_string(), "8.8.8.8".to_string()],
        }
    }
}

/// `[General]` section of an emitted Surge profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurgeBaseline {
    pub loglevel: String,
    pub bypass_system: bool,
    pub skip_proxy: Vec<String>,
    pub dns_server: Vec<String>,
    pub allow_wifi_access: bool,
}

impl Default for SurgeBaseline {
    fn default() -> Self {
        Self {
            loglevel: "notify".to_string(),
            bypass_system: true,
            skip_proxy: [
                "127.0.0.1",
                "192.168.0.0/16",
                "10.0.0.0/8",
                "172.16.0.0/12",
                "100.64.0.0/10",
                "localhost",
                "*.local",
                "e.crashlytics.com",
                "captive.apple.com",
                "::ffff:0:0:0:0/1",
                "::ffff:128:0:0:0/1",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            dns_server: ["system", "114.114.114.114", "8.8.8.8"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_wifi_access: false,
        }
    }
}
