//! Re-normalize the `proxies` of an existing Clash document into nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::common::error::SubscriptionError;

use super::node::{
    Node, NodeKind, Protocol, ShadowsocksParams, ShadowsocksRParams, TrojanParams, VmessParams,
};

#[derive(Debug, Deserialize)]
struct ClashDocument {
    #[serde(default)]
    proxies: Option<Vec<ClashProxy>>,
    #[serde(rename = "Proxy", default)]
    proxy_legacy: Option<Vec<ClashProxy>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClashProxy {
    #[serde(deserialize_with = "scalar_string")]
    name: String,
    #[serde(rename = "type")]
    proxy_type: String,
    server: String,
    #[serde(deserialize_with = "port_number")]
    port: u16,
    #[serde(default, deserialize_with = "scalar_string")]
    password: String,
    #[serde(default)]
    uuid: String,
    #[serde(rename = "alterId", default, deserialize_with = "alter_id_number")]
    alter_id: i64,
    #[serde(default)]
    cipher: String,
    #[serde(default)]
    tls: bool,
    #[serde(default)]
    skip_cert_verify: bool,
    #[serde(default)]
    alpn: Vec<String>,
    #[serde(default)]
    sni: String,
    #[serde(default)]
    servername: String,
    #[serde(default)]
    network: String,
    #[serde(default)]
    ws_path: String,
    #[serde(default)]
    ws_headers: BTreeMap<String, String>,
    #[serde(default)]
    ws_opts: Option<WsOpts>,
    #[serde(default)]
    plugin: String,
    #[serde(default)]
    plugin_opts: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    protocol: String,
    #[serde(default, deserialize_with = "scalar_string")]
    protocol_param: String,
    #[serde(default)]
    obfs: String,
    #[serde(default, deserialize_with = "scalar_string")]
    obfs_param: String,
}

#[derive(Debug, Default, Deserialize)]
struct WsOpts {
    #[serde(default)]
    path: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Accept strings, numbers and booleans; YAML happily types `password: 123456` as an int.
fn scalar_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value: Option<Scalar> = Option::deserialize(d)?;
    Ok(match value {
        Some(Scalar::Str(s)) => s,
        Some(Scalar::Int(i)) => i.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
        Some(Scalar::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

fn port_number<'de, D: Deserializer<'de>>(d: D) -> Result<u16, D::Error> {
    let raw = scalar_string(d)?;
    raw.trim()
        .parse::<u16>()
        .map_err(|_| serde::de::Error::custom(format!("invalid port: {}", raw)))
}

fn alter_id_number<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let raw = scalar_string(d)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>()
        .map_err(|_| serde::de::Error::custom(format!("invalid alterId: {}", raw)))
}

fn json_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse the document and emit one node per supported proxy entry.
///
/// Every node is UDP-capable; `skip-cert-verify` becomes the insecure-TLS flag.
pub fn parse_clash_proxies(content: &str) -> Result<Vec<Node>, SubscriptionError> {
    let doc: ClashDocument = serde_yml::from_str(content)?;
    let proxies = doc.proxies.or(doc.proxy_legacy).unwrap_or_default();

    let mut nodes = Vec::with_capacity(proxies.len());
    for proxy in proxies {
        match into_node(proxy) {
            Ok(node) => nodes.push(node),
            Err((name, proxy_type)) => {
                warn!(
                    name = name.as_str(),
                    proxy_type = proxy_type.as_str(),
                    "skipping proxy with unsupported type"
                );
            }
        }
    }
    Ok(nodes)
}

fn into_node(proxy: ClashProxy) -> Result<Node, (String, String)> {
    let Some(kind) = NodeKind::from_clash_type(&proxy.proxy_type) else {
        return Err((proxy.name, proxy.proxy_type));
    };

    let mut settings = BTreeMap::new();
    settings.insert(
        "skip-cert-verify".to_string(),
        proxy.skip_cert_verify.to_string(),
    );
    settings.insert("tls".to_string(), proxy.tls.to_string());
    if !proxy.network.is_empty() {
        settings.insert("network".to_string(), proxy.network.clone());
    }

    let protocol = match kind {
        NodeKind::Ss => Protocol::Shadowsocks(ShadowsocksParams {
            cipher: proxy.cipher,
            password: proxy.password,
            plugin: proxy.plugin,
            plugin_opts: proxy
                .plugin_opts
                .iter()
                .map(|(k, v)| (k.clone(), json_scalar(v)))
                .collect(),
        }),
        NodeKind::Ssr => Protocol::ShadowsocksR(ShadowsocksRParams {
            cipher: proxy.cipher,
            password: proxy.password,
            protocol: proxy.protocol,
            protocol_param: proxy.protocol_param,
            obfs: proxy.obfs,
            obfs_param: proxy.obfs_param,
        }),
        NodeKind::Vmess => {
            settings.insert("uuid".to_string(), proxy.uuid.clone());
            settings.insert("alterId".to_string(), proxy.alter_id.to_string());
            let ws = proxy.ws_opts.unwrap_or_default();
            Protocol::Vmess(VmessParams {
                uuid: proxy.uuid,
                alter_id: proxy.alter_id,
                cipher: proxy.cipher,
                network: proxy.network,
                tls: proxy.tls,
                sni: if proxy.servername.is_empty() {
                    proxy.sni
                } else {
                    proxy.servername
                },
                alpn: proxy.alpn,
                ws_path: if ws.path.is_empty() {
                    proxy.ws_path
                } else {
                    ws.path
                },
                ws_headers: if ws.headers.is_empty() {
                    proxy.ws_headers
                } else {
                    ws.headers
                },
            })
        }
        NodeKind::Trojan => Protocol::Trojan(TrojanParams {
            password: proxy.password,
            sni: proxy.sni,
            alpn: proxy.alpn,
            allow_insecure: proxy.skip_cert_verify,
        }),
    };

    let mut node = Node::new(proxy.name, proxy.server, proxy.port, protocol);
    node.udp = true;
    node.settings = settings;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
port: 7890
proxies:
  - name: "ss-hk"
    type: ss
    server: hk.example.com
    port: 8388
    cipher: aes-256-gcm
    password: 123456
    plugin: obfs
    plugin-opts:
      mode: tls
      host: bing.com
  - name: "vmess-jp"
    type: vmess
    server: jp.example.com
    port: "443"
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
    alterId: 0
    cipher: auto
    tls: true
    servername: edge.example.com
    network: ws
    ws-opts:
      path: /ray
      headers:
        Host: cdn.example.com
  - name: "trojan-sg"
    type: trojan
    server: sg.example.com
    port: 443
    password: pw
    sni: sg.example.com
    skip-cert-verify: true
  - name: "http-proxy"
    type: http
    server: 10.0.0.1
    port: 3128
"#;

    #[test]
    fn renormalizes_supported_entries() {
        let nodes = parse_clash_proxies(DOC).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.udp));

        match &nodes[0].protocol {
            Protocol::Shadowsocks(p) => {
                assert_eq!(p.password, "123456");
                assert_eq!(p.plugin, "obfs");
                assert_eq!(p.plugin_opts.get("mode").map(String::as_str), Some("tls"));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(nodes[1].port, 443);
        match &nodes[1].protocol {
            Protocol::Vmess(p) => {
                assert!(p.tls);
                assert_eq!(p.sni, "edge.example.com");
                assert_eq!(p.ws_path, "/ray");
                assert_eq!(
                    p.ws_headers.get("Host").map(String::as_str),
                    Some("cdn.example.com")
                );
            }
            other => panic!("unexpected {:?}", other),
        }

        match &nodes[2].protocol {
            Protocol::Trojan(p) => assert!(p.allow_insecure),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            nodes[2].settings.get("skip-cert-verify").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn quoted_alter_id() {
        let doc = r#"
proxies:
  - {name: v, type: vmess, server: v.example.com, port: 443, uuid: b831381d-6324-4d53-ad4f-8cda48b30811, alterId: "2"}
  - {name: s, type: ss, server: s.example.com, port: 8388, cipher: aes-256-gcm, password: pw}
"#;
        let nodes = parse_clash_proxies(doc).unwrap();
        assert_eq!(nodes.len(), 2);
        match &nodes[0].protocol {
            Protocol::Vmess(p) => assert_eq!(p.alter_id, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(nodes[0].settings.get("alterId").map(String::as_str), Some("2"));
        assert_eq!(nodes[1].name, "s");
    }

    #[test]
    fn legacy_proxy_key() {
        let doc = "Proxy:\n  - {name: a, type: trojan, server: s, port: 443, password: p}\n";
        let nodes = parse_clash_proxies(doc).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "a");
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(matches!(
            parse_clash_proxies("proxies:\n  - name: a\n    type: ss\n    port: [1, 2]\n"),
            Err(SubscriptionError::Document(_))
        ));
        assert!(parse_clash_proxies("proxies: [unclosed").is_err());
    }

    #[test]
    fn document_without_proxies_is_empty() {
        assert!(parse_clash_proxies("mode: rule\n").unwrap().is_empty());
    }
}
