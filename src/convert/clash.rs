//! Clash YAML output.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::common::error::ConvertError;
use crate::config::types::{ClashBaseline, ClashDns};
use crate::rules::RuleConfiguration;
use crate::subscription::node::{default_if_empty, Node, Protocol};

use super::{expand_groups, map_nodes, render_rules, Converter, Dialect, ProxyRecord};

/// One entry of `proxies:`. Absent fields are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashProxy {
    pub name: String,
    #[serde(rename = "type")]
    pub proxy_type: String,
    pub server: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs_param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(rename = "alterId", skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WsOpts {
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Map a node onto its Clash proxy entry.
pub fn proxy_record(node: &Node) -> ClashProxy {
    let mut proxy = ClashProxy {
        name: node.name.clone(),
        proxy_type: node.kind().as_str().to_string(),
        server: node.server.clone(),
        port: node.port,
        udp: node.udp.then_some(true),
        ..Default::default()
    };

    match &node.protocol {
        Protocol::Shadowsocks(p) => {
            proxy.cipher = Some(p.cipher.clone());
            proxy.password = Some(p.password.clone());
            if !p.plugin.is_empty() {
                proxy.plugin = Some(p.plugin.clone());
                proxy.plugin_opts = Some(p.plugin_opts.clone());
            }
        }
        Protocol::ShadowsocksR(p) => {
            proxy.cipher = Some(p.cipher.clone());
            proxy.password = Some(p.password.clone());
            proxy.protocol = Some(p.protocol.clone());
            proxy.protocol_param = Some(p.protocol_param.clone());
            proxy.obfs = Some(p.obfs.clone());
            proxy.obfs_param = Some(p.obfs_param.clone());
        }
        Protocol::Vmess(p) => {
            proxy.uuid = Some(p.uuid.clone());
            proxy.alter_id = Some(p.alter_id);
            proxy.cipher = Some(default_if_empty(&p.cipher, "auto").to_string());
            if p.tls {
                proxy.tls = Some(true);
                proxy.servername = Some(default_if_empty(&p.sni, &node.server).to_string());
                proxy.alpn = p.alpn.clone();
            }
            if p.network == "ws" {
                proxy.network = Some(p.network.clone());
                proxy.ws_opts = Some(WsOpts {
                    path: default_if_empty(&p.ws_path, "/").to_string(),
                    headers: p.ws_headers.clone(),
                });
            }
        }
        Protocol::Trojan(p) => {
            proxy.password = Some(p.password.clone());
            proxy.sni = Some(default_if_empty(&p.sni, &node.server).to_string());
            proxy.skip_cert_verify = Some(p.allow_insecure);
            proxy.alpn = p.alpn.clone();
        }
    }

    proxy
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ClashDocument<'a> {
    port: u16,
    socks_port: u16,
    allow_lan: bool,
    mode: &'a str,
    log_level: &'a str,
    external_controller: &'a str,
    secret: &'a str,
    dns: &'a ClashDns,
    proxies: Vec<ClashProxy>,
    proxy_groups: Vec<ClashGroup<'a>>,
    rules: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ClashGroup<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tolerance: Option<u32>,
    proxies: Vec<String>,
}

pub struct ClashConverter {
    baseline: ClashBaseline,
}

impl ClashConverter {
    pub fn new(baseline: ClashBaseline) -> Self {
        Self { baseline }
    }
}

impl Converter for ClashConverter {
    fn dialect(&self) -> Dialect {
        Dialect::Clash
    }

    fn convert(&self, nodes: &[Node], rules: &RuleConfiguration) -> Result<String, ConvertError> {
        let proxies: Vec<ClashProxy> = map_nodes(nodes, Dialect::Clash)?
            .into_iter()
            .filter_map(|record| match record {
                ProxyRecord::Clash(p) => Some(p),
                ProxyRecord::Surge(_) => None,
            })
            .collect();
        let names: Vec<&str> = proxies.iter().map(|p| p.name.as_str()).collect();

        let proxy_groups: Vec<ClashGroup<'_>> = expand_groups(&rules.groups, &names)
            .into_iter()
            .map(|g| {
                let def = g.definition;
                ClashGroup {
                    name: &def.name,
                    kind: def.kind.as_str(),
                    url: &def.url,
                    interval: def.interval,
                    tolerance: def.tolerance,
                    proxies: g.members,
                }
            })
            .collect();
        let rule_lines = render_rules(&rules.directives);

        info!(
            proxies = proxies.len(),
            groups = proxy_groups.len(),
            rules = rule_lines.len(),
            "rendering clash config"
        );

        let doc = ClashDocument {
            port: self.baseline.port,
            socks_port: self.baseline.socks_port,
            allow_lan: self.baseline.allow_lan,
            mode: &self.baseline.mode,
            log_level: &self.baseline.log_level,
            external_controller: &self.baseline.external_controller,
            secret: &self.baseline.secret,
            dns: &self.baseline.dns,
            proxies,
            proxy_groups,
            rules: rule_lines,
        };

        serde_yml::to_string(&doc).map_err(|e| ConvertError::Serialize {
            dialect: Dialect::Clash.as_str(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::group::parse_group;
    use crate::rules::RoutingDirective;
    use crate::subscription::node::{ShadowsocksParams, TrojanParams, VmessParams};

    fn ss(name: &str) -> Node {
        Node::new(
            name.to_string(),
            "ss.example.com".to_string(),
            8388,
            Protocol::Shadowsocks(ShadowsocksParams {
                cipher: "aes-256-gcm".to_string(),
                password: "pw".to_string(),
                ..Default::default()
            }),
        )
    }

    fn yaml(text: &str) -> serde_yml::Value {
        serde_yml::from_str(text).unwrap()
    }

    #[test]
    fn vmess_defaults() {
        let node = Node::new(
            "v".to_string(),
            "v.example.com".to_string(),
            443,
            Protocol::Vmess(VmessParams {
                uuid: "u".to_string(),
                tls: true,
                network: "ws".to_string(),
                ..Default::default()
            }),
        );
        let p = proxy_record(&node);
        assert_eq!(p.cipher.as_deref(), Some("auto"));
        assert_eq!(p.servername.as_deref(), Some("v.example.com"));
        assert_eq!(p.alter_id, Some(0));
        let ws = p.ws_opts.unwrap();
        assert_eq!(ws.path, "/");
        assert!(ws.headers.is_empty());
        assert_eq!(p.udp, None);
    }

    #[test]
    fn trojan_sni_defaults_to_server() {
        let mut node = Node::new(
            "t".to_string(),
            "t.example.com".to_string(),
            443,
            Protocol::Trojan(TrojanParams {
                password: "pw".to_string(),
                allow_insecure: true,
                ..Default::default()
            }),
        );
        node.udp = true;
        let p = proxy_record(&node);
        assert_eq!(p.sni.as_deref(), Some("t.example.com"));
        assert_eq!(p.skip_cert_verify, Some(true));
        assert_eq!(p.udp, Some(true));
    }

    #[test]
    fn ss_entry_serializes_without_empty_fields() {
        let text = serde_yml::to_string(&proxy_record(&ss("a"))).unwrap();
        let v = yaml(&text);
        assert_eq!(v["type"].as_str(), Some("ss"));
        assert_eq!(v["cipher"].as_str(), Some("aes-256-gcm"));
        assert!(v.get("plugin").is_none());
        assert!(v.get("uuid").is_none());
        assert!(v.get("udp").is_none());
    }

    #[test]
    fn full_document() {
        let nodes = vec![ss("NodeA"), ss("NodeB")];
        let rules = RuleConfiguration {
            directives: vec![
                RoutingDirective::from_body("GEOIP,CN", "🎯 Direct"),
                RoutingDirective::from_body("USER-AGENT,x*", "Proxy"),
                RoutingDirective::from_body("FINAL", "Proxy"),
            ],
            groups: vec![
                parse_group("Proxy`select`[]Auto`[]DIRECT`.*").unwrap(),
                parse_group("Auto`url-test`.*`http://www.gstatic.com/generate_204`300,,50")
                    .unwrap(),
                parse_group("Empty`select").unwrap(),
            ],
            ..Default::default()
        };

        let out = ClashConverter::new(ClashBaseline::default())
            .convert(&nodes, &rules)
            .unwrap();
        let v = yaml(&out);

        assert_eq!(v["port"].as_u64(), Some(7890));
        assert_eq!(v["socks-port"].as_u64(), Some(7891));
        assert_eq!(v["allow-lan"].as_bool(), Some(false));
        assert_eq!(v["mode"].as_str(), Some("rule"));
        assert_eq!(v["external-controller"].as_str(), Some("127.0.0.1:9090"));
        assert_eq!(v["dns"]["nameserver"][1].as_str(), Some("8.8.8.8"));
        assert_eq!(v["proxies"].as_sequence().unwrap().len(), 2);

        let groups = v["proxy-groups"].as_sequence().unwrap();
        assert_eq!(groups.len(), 3);
        let proxy_members: Vec<&str> = groups[0]["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|m| m.as_str())
            .collect();
        assert_eq!(proxy_members, vec!["Auto", "DIRECT", "NodeA", "NodeB"]);
        assert!(groups[0].get("url").is_none());
        assert_eq!(groups[1]["interval"].as_u64(), Some(300));
        assert_eq!(groups[1]["tolerance"].as_u64(), Some(50));
        assert!(groups[2]["proxies"].as_sequence().unwrap().is_empty());

        let rules: Vec<&str> = v["rules"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|r| r.as_str())
            .collect();
        assert_eq!(rules, vec!["GEOIP,CN,🎯 Direct", "MATCH,Proxy"]);
    }
}
