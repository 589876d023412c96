//! Surge profile output.

use std::fmt::Write as _;

use tracing::info;

use crate::common::error::ConvertError;
use crate::config::types::SurgeBaseline;
use crate::rules::{RuleConfiguration, RuleType};
use crate::subscription::node::{default_if_empty, Node, Protocol, ShadowsocksParams};

use super::{expand_groups, map_nodes, render_rules, Converter, Dialect, ProxyRecord};

const DIALECT: &str = "surge";

/// Map a node onto its `[Proxy]` line. SSR and non-obfs SS plugins have no
/// Surge equivalent.
pub fn proxy_line(node: &Node) -> Result<String, ConvertError> {
    let mut line = match &node.protocol {
        Protocol::Shadowsocks(p) => format!(
            "{} = ss, {}, {}, encrypt-method={}, password={}{}",
            node.name,
            node.server,
            node.port,
            p.cipher,
            p.password,
            obfs_opts(node, p)?
        ),
        Protocol::Vmess(p) => {
            let ws = p.network == "ws";
            let mut line = format!(
                "{} = vmess, {}, {}, username={}, ws={}, tls={}",
                node.name, node.server, node.port, p.uuid, ws, p.tls
            );
            if ws {
                line.push_str(&format!(
                    ", ws-path={}",
                    default_if_empty(&p.ws_path, "/")
                ));
                if !p.ws_headers.is_empty() {
                    let headers: Vec<String> = p
                        .ws_headers
                        .iter()
                        .map(|(k, v)| format!("{}:{}", k, v))
                        .collect();
                    line.push_str(&format!(", ws-headers={}", headers.join("|")));
                }
            }
            if p.tls {
                line.push_str(&format!(", sni={}", default_if_empty(&p.sni, &node.server)));
            }
            line
        }
        Protocol::Trojan(p) => format!(
            "{} = trojan, {}, {}, password={}, sni={}, skip-cert-verify={}",
            node.name,
            node.server,
            node.port,
            p.password,
            default_if_empty(&p.sni, &node.server),
            p.allow_insecure
        ),
        Protocol::ShadowsocksR(_) => {
            return Err(ConvertError::UnsupportedProtocol {
                dialect: DIALECT,
                protocol: node.kind().as_str(),
                node: node.name.clone(),
            })
        }
    };

    if node.udp {
        line.push_str(", udp-relay=true");
    }
    Ok(line)
}

/// `obfs-local;obfs=http;obfs-host=x` becomes `, obfs=http, obfs-host=x`.
fn obfs_opts(node: &Node, params: &ShadowsocksParams) -> Result<String, ConvertError> {
    if params.plugin.is_empty() {
        return Ok(String::new());
    }
    if !matches!(params.plugin.as_str(), "obfs" | "obfs-local" | "simple-obfs") {
        return Err(ConvertError::UnsupportedProtocol {
            dialect: DIALECT,
            protocol: "ss plugin",
            node: node.name.clone(),
        });
    }

    let mut out = String::new();
    if let Some(mode) = plugin_opt(params, &["obfs", "mode"]) {
        let _ = write!(out, ", obfs={}", mode);
    }
    if let Some(host) = plugin_opt(params, &["obfs-host", "host"]) {
        let _ = write!(out, ", obfs-host={}", host);
    }
    Ok(out)
}

fn plugin_opt<'a>(params: &'a ShadowsocksParams, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| params.plugin_opts.get(*k))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

pub struct SurgeConverter {
    baseline: SurgeBaseline,
}

impl SurgeConverter {
    pub fn new(baseline: SurgeBaseline) -> Self {
        Self { baseline }
    }

    fn write_general(&self, out: &mut String) {
        let b = &self.baseline;
        out.push_str("[General]\n");
        let _ = writeln!(out, "loglevel = {}", b.loglevel);
        let _ = writeln!(out, "bypass-system = {}", b.bypass_system);
        let _ = writeln!(out, "skip-proxy = {}", b.skip_proxy.join(","));
        let _ = writeln!(out, "dns-server = {}", b.dns_server.join(","));
        let _ = writeln!(out, "allow-wifi-access = {}", b.allow_wifi_access);
        out.push('\n');
    }
}

impl Converter for SurgeConverter {
    fn dialect(&self) -> Dialect {
        Dialect::Surge
    }

    fn convert(&self, nodes: &[Node], rules: &RuleConfiguration) -> Result<String, ConvertError> {
        let lines: Vec<String> = map_nodes(nodes, Dialect::Surge)?
            .into_iter()
            .filter_map(|record| match record {
                ProxyRecord::Surge(line) => Some(line),
                ProxyRecord::Clash(_) => None,
            })
            .collect();
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        let groups = expand_groups(&rules.groups, &names);
        let rule_lines = render_rules(&rules.directives);

        info!(
            proxies = lines.len(),
            groups = groups.len(),
            rules = rule_lines.len(),
            "rendering surge profile"
        );

        let mut out = String::new();
        self.write_general(&mut out);

        out.push_str("[Proxy]\nDIRECT = direct\n");
        for line in &lines {
            out.push_str(line);
            out.push('\n');
        }

        out.push_str("\n[Proxy Group]\n");
        for group in &groups {
            let def = group.definition;
            let mut fields = vec![def.kind.as_str().to_string()];
            fields.extend(group.members.iter().cloned());
            if !def.url.is_empty() {
                fields.push(format!("url={}", def.url));
            }
            if let Some(interval) = def.interval {
                fields.push(format!("interval={}", interval));
            }
            if let Some(timeout) = def.timeout {
                fields.push(format!("timeout={}", timeout));
            }
            if let Some(tolerance) = def.tolerance {
                fields.push(format!("tolerance={}", tolerance));
            }
            let _ = writeln!(out, "{} = {}", def.name, fields.join(", "));
        }

        out.push_str("\n[Rule]\n");
        for rule in &rule_lines {
            let _ = writeln!(out, "{}", surge_rule(rule));
        }

        Ok(out)
    }
}

/// Surge spells the catch-all `FINAL`.
fn surge_rule(line: &str) -> String {
    // Rules render with MATCH; Surge's [Rule] grammar only accepts FINAL.
    let catch_all = RuleType::Match.as_str();
    match line.strip_prefix(catch_all) {
        Some(rest) if rest.starts_with(',') => format!("FINAL{}", rest),
        _ => line.to_string(),
    }
}
