//! `vmess://base64(json)` in the v2rayN share format.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::common::codec::base64_decode_str;
use crate::common::error::DecodeError;
use crate::subscription::node::{Node, Protocol, VmessParams};

/// Keys copied verbatim into the node's settings bag.
const SHARE_KEYS: &[&str] = &[
    "v", "ps", "add", "port", "id", "aid", "net", "type", "tls", "host", "path", "sni", "alpn",
    "scy",
];

pub fn decode(link: &str) -> Result<Node, DecodeError> {
    let body = link
        .strip_prefix("vmess://")
        .ok_or(DecodeError::UnsupportedScheme)?;
    let decoded = base64_decode_str(body)?;
    let json: Value = serde_json::from_str(&decoded).map_err(|e| DecodeError::InvalidField {
        field: "json",
        reason: e.to_string(),
    })?;
    if !json.is_object() {
        return Err(DecodeError::InvalidField {
            field: "json",
            reason: "expected an object".to_string(),
        });
    }

    let mut settings = BTreeMap::new();
    for key in SHARE_KEYS {
        if let Some(value) = json.get(*key).and_then(scalar_to_string) {
            settings.insert(key.to_string(), value);
        }
    }
    let field = |key: &str| settings.get(key).cloned().unwrap_or_default();

    let server = field("add");
    let port_str = field("port");
    let port = port_str
        .trim()
        .parse::<u16>()
        .map_err(|_| DecodeError::InvalidPort(port_str.clone()))?;
    let aid = field("aid");
    let alter_id = if aid.trim().is_empty() {
        0
    } else {
        aid.trim()
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidField {
                field: "aid",
                reason: format!("not an integer: {}", aid),
            })?
    };

    let mut ws_headers = BTreeMap::new();
    let host = field("host");
    if !host.is_empty() {
        ws_headers.insert("Host".to_string(), host);
    }

    let params = VmessParams {
        uuid: field("id"),
        alter_id,
        cipher: field("scy"),
        network: field("net"),
        tls: field("tls").eq_ignore_ascii_case("tls"),
        sni: field("sni"),
        alpn: split_list(&field("alpn")),
        ws_path: field("path"),
        ws_headers,
    };

    let name = field("ps");
    let mut node = Node::new(name, server, port, Protocol::Vmess(params));
    node.settings = settings;
    Ok(node)
}

/// Share links write numbers either as JSON numbers or as strings.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
