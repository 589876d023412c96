//! `trojan://password@host[:port][?query]#name`

use std::collections::BTreeMap;

use reqwest::Url;

use crate::common::codec::{parse_bool, percent_decode};
use crate::common::error::DecodeError;
use crate::subscription::node::{Node, Protocol, TrojanParams};

const DEFAULT_PORT: u16 = 443;

pub fn decode(link: &str) -> Result<Node, DecodeError> {
    let url = Url::parse(link).map_err(|e| DecodeError::Uri(e.to_string()))?;
    if url.scheme() != "trojan" {
        return Err(DecodeError::UnsupportedScheme);
    }

    let server = url
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DecodeError::Uri("missing host".to_string()))?;
    let port = url.port().unwrap_or(DEFAULT_PORT);
    // user-info keeps a literal '+', unlike the fragment
    let password = urlencoding::decode(url.username())
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| url.username().to_string());
    let name = url.fragment().map(percent_decode).unwrap_or_default();

    let settings: BTreeMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let sni = settings
        .get("sni")
        .or_else(|| settings.get("peer"))
        .cloned()
        .unwrap_or_default();
    let allow_insecure = settings
        .get("allowInsecure")
        .or_else(|| settings.get("skip-cert-verify"))
        .and_then(|v| parse_bool(v))
        .unwrap_or(false);
    let alpn = settings
        .get("alpn")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let name = if name.is_empty() {
        format!("Trojan_{}_{}", server, port)
    } else {
        name
    };
    let mut node = Node::new(
        name,
        server,
        port,
        Protocol::Trojan(TrojanParams {
            password,
            sni,
            alpn,
            allow_insecure,
        }),
    );
    node.settings = settings;
    Ok(node)
}
