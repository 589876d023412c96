//! `ssr://base64(host:port:protocol:method:obfs:base64(password)/?k=base64(v)&...)`

use std::collections::BTreeMap;

use crate::common::codec::{base64_decode_padded, base64_decode_str, parse_port};
use crate::common::error::DecodeError;
use crate::subscription::node::{Node, Protocol, ShadowsocksRParams};

pub fn decode(link: &str) -> Result<Node, DecodeError> {
    let body = link
        .strip_prefix("ssr://")
        .ok_or(DecodeError::UnsupportedScheme)?;
    let decoded = base64_decode_str(body)?;

    let (main, query) = match decoded.split_once("/?") {
        Some((m, q)) => (m, Some(q)),
        None => (decoded.as_str(), None),
    };

    // Right to left, so an IPv6 host keeps its colons.
    let fields: Vec<&str> = main.rsplitn(6, ':').collect();
    if fields.len() < 6 {
        return Err(DecodeError::InvalidField {
            field: "main",
            reason: format!("expected 6 colon-separated fields, got {}", fields.len()),
        });
    }
    let (password_b64, obfs, cipher, protocol, port, host) =
        (fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]);

    let port = parse_port(port)?;
    let password = base64_decode_padded(password_b64).map_err(|e| DecodeError::InvalidField {
        field: "password",
        reason: e.to_string(),
    })?;

    let settings = query.map(parse_params).unwrap_or_default();
    let params = ShadowsocksRParams {
        cipher: cipher.to_string(),
        password,
        protocol: protocol.to_string(),
        protocol_param: settings.get("protoparam").cloned().unwrap_or_default(),
        obfs: obfs.to_string(),
        obfs_param: settings.get("obfsparam").cloned().unwrap_or_default(),
    };

    let name = settings
        .get("remarks")
        .filter(|r| !r.is_empty())
        .cloned()
        .unwrap_or_else(|| format!("SSR_{}_{}", host, port));

    let mut node = Node::new(name, host.to_string(), port, Protocol::ShadowsocksR(params));
    node.group = settings.get("group").cloned().unwrap_or_default();
    node.settings = settings;
    Ok(node)
}

/// Values that fail to decode are dropped.
fn parse_params(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let value = base64_decode_padded(value).ok()?;
            Some((key.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use base64::Engine;

    use super::*;
    use crate::common::codec::URL_SAFE_LENIENT;

    fn b64(s: &str) -> String {
        URL_SAFE_LENIENT.encode(s)
    }

    fn params(node: &Node) -> &ShadowsocksRParams {
        match &node.protocol {
            Protocol::ShadowsocksR(p) => p,
            other => panic!("expected ssr, got {:?}", other),
        }
    }

    #[test]
    fn full_link() {
        let raw = format!(
            "1.2.3.4:8443:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:{}/?obfsparam={}&protoparam={}&remarks={}&group={}",
            b64("secret"),
            b64("cdn.example.com"),
            b64("3:abc"),
            b64("东京 01"),
            b64("Provider")
        );
        let node = decode(&format!("ssr://{}", b64(&raw))).unwrap();
        let p = params(&node);
        assert_eq!(node.name, "东京 01");
        assert_eq!(node.server, "1.2.3.4");
        assert_eq!(node.port, 8443);
        assert_eq!(node.group, "Provider");
        assert_eq!(p.protocol, "auth_aes128_md5");
        assert_eq!(p.cipher, "aes-256-cfb");
        assert_eq!(p.obfs, "tls1.2_ticket_auth");
        assert_eq!(p.password, "secret");
        assert_eq!(p.obfs_param, "cdn.example.com");
        assert_eq!(p.protocol_param, "3:abc");
    }

    #[test]
    fn standard_alphabet_and_default_name() {
        let raw = format!("example.com:443:origin:rc4-md5:plain:{}", b64("pw"));
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        let node = decode(&format!("ssr://{}", encoded)).unwrap();
        assert_eq!(node.name, "SSR_example.com_443");
        assert_eq!(params(&node).password, "pw");
        assert!(node.group.is_empty());
    }

    #[test]
    fn undecodable_param_is_skipped() {
        let raw = format!(
            "h.example:80:origin:none:plain:{}/?remarks=***&group={}",
            b64("pw"),
            b64("g")
        );
        let node = decode(&format!("ssr://{}", b64(&raw))).unwrap();
        assert_eq!(node.name, "SSR_h.example_80");
        assert_eq!(node.group, "g");
        assert!(!node.settings.contains_key("remarks"));
    }

    #[test]
    fn too_few_fields() {
        let err = decode(&format!("ssr://{}", b64("host:80:origin:none"))).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "main", .. }));
    }

    #[test]
    fn bad_port() {
        let raw = format!("host:http:origin:none:plain:{}", b64("pw"));
        assert!(matches!(
            decode(&format!("ssr://{}", b64(&raw))).unwrap_err(),
            DecodeError::InvalidPort(_)
        ));
    }
}
