//! `ss://` links.
//!
//! Accepted shapes:
//! - `ss://base64(method:password@host:port)#name`
//! - `ss://base64(method:password)@host:port[/][?plugin=...]#name` (SIP002)
//! - `ss://method:password@host:port#name`

use std::collections::BTreeMap;

use crate::common::codec::{base64_decode_str, parse_host_port, percent_decode};
use crate::common::error::DecodeError;
use crate::subscription::node::{Node, Protocol, ShadowsocksParams};

use super::split_fragment;

pub fn decode(link: &str) -> Result<Node, DecodeError> {
    let rest = link
        .strip_prefix("ss://")
        .ok_or(DecodeError::UnsupportedScheme)?;
    let (body, name) = split_fragment(rest);
    let (body, query) = match body.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (body, None),
    };

    let (credentials, host_port) = match body.rsplit_once('@') {
        Some((user_info, host_part)) => {
            (decode_user_info(user_info), host_part.trim_end_matches('/').to_string())
        }
        None => {
            let decoded = base64_decode_str(body.trim_end_matches('/'))?;
            let (creds, host_part) = decoded
                .rsplit_once('@')
                .ok_or(DecodeError::MissingSeparator('@'))?;
            (creds.to_string(), host_part.trim().to_string())
        }
    };

    let (method, password) = credentials
        .split_once(':')
        .ok_or(DecodeError::MissingSeparator(':'))?;
    let (server, port) = parse_host_port(&host_port)?;

    let mut params = ShadowsocksParams {
        cipher: method.to_string(),
        password: password.to_string(),
        ..Default::default()
    };
    let mut settings = BTreeMap::new();
    if let Some(query) = query {
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = percent_decode(value);
            if key == "plugin" {
                let (plugin, opts) = parse_plugin(&value);
                params.plugin = plugin;
                params.plugin_opts = opts;
            }
            settings.insert(key.to_string(), value);
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("SS_{}_{}", server, port));
    let mut node = Node::new(name, server, port, Protocol::Shadowsocks(params));
    node.settings = settings;
    Ok(node)
}

/// SIP002 user-info is base64 in practice, plain `method:password` otherwise.
/// Percent escapes are undone first since providers often emit `%3D` padding.
/// `+` stays literal: it belongs to the standard base64 alphabet.
fn decode_user_info(user_info: &str) -> String {
    let unescaped = urlencoding::decode(user_info)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| user_info.to_string());
    match base64_decode_str(&unescaped) {
        Ok(decoded) if decoded.contains(':') => decoded,
        _ => unescaped,
    }
}

/// `obfs-local;obfs=http;obfs-host=example.com`
fn parse_plugin(value: &str) -> (String, BTreeMap<String, String>) {
    let mut parts = value.split(';');
    let plugin = parts.next().unwrap_or_default().trim().to_string();
    let opts = parts
        .filter_map(|kv| {
            let (k, v) = kv.split_once('=').unwrap_or((kv, ""));
            let k = k.trim();
            (!k.is_empty()).then(|| (k.to_string(), v.trim().to_string()))
        })
        .collect();
    (plugin, opts)
}
