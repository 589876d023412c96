//! Scheme-prefixed proxy link decoders.
//!
//! Dispatch is a fixed, ordered table: the first entry whose prefix matches
//! decodes the link. Adding a protocol means adding a row.

pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod vmess;

use crate::common::error::DecodeError;

use super::node::{Node, NodeKind};

/// One row of the dispatch table.
pub struct LinkDecoder {
    pub kind: NodeKind,
    pub prefix: &'static str,
    pub decode: fn(&str) -> Result<Node, DecodeError>,
}

impl LinkDecoder {
    pub fn matches(&self, link: &str) -> bool {
        link.starts_with(self.prefix)
    }
}

pub const DECODERS: &[LinkDecoder] = &[
    LinkDecoder {
        kind: NodeKind::Ss,
        prefix: "ss://",
        decode: ss::decode,
    },
    LinkDecoder {
        kind: NodeKind::Ssr,
        prefix: "ssr://",
        decode: ssr::decode,
    },
    LinkDecoder {
        kind: NodeKind::Vmess,
        prefix: "vmess://",
        decode: vmess::decode,
    },
    LinkDecoder {
        kind: NodeKind::Trojan,
        prefix: "trojan://",
        decode: trojan::decode,
    },
];

/// Find the decoder responsible for `link`.
pub fn decoder_for(link: &str) -> Option<&'static LinkDecoder> {
    DECODERS.iter().find(|d| d.matches(link))
}

/// Decode a single link with the first matching decoder.
pub fn decode_link(link: &str) -> Result<Node, DecodeError> {
    let decoder = decoder_for(link).ok_or(DecodeError::UnsupportedScheme)?;
    (decoder.decode)(link)
}

/// Split `body#fragment`, percent-decoding the fragment.
pub(crate) fn split_fragment(rest: &str) -> (&str, Option<String>) {
    match rest.split_once('#') {
        Some((body, fragment)) => (body, Some(crate::common::codec::percent_decode(fragment))),
        None => (rest, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_picks_matching_prefix() {
        assert_eq!(decoder_for("ss://abc").map(|d| d.kind), Some(NodeKind::Ss));
        assert_eq!(decoder_for("ssr://abc").map(|d| d.kind), Some(NodeKind::Ssr));
        assert_eq!(
            decoder_for("vmess://abc").map(|d| d.kind),
            Some(NodeKind::Vmess)
        );
        assert_eq!(
            decoder_for("trojan://abc").map(|d| d.kind),
            Some(NodeKind::Trojan)
        );
        assert!(decoder_for("vless://abc").is_none());
    }

    #[test]
    fn unknown_scheme_is_a_decode_error() {
        assert_eq!(
            decode_link("hysteria2://pw@h:443").unwrap_err(),
            DecodeError::UnsupportedScheme
        );
    }

    #[test]
    fn fragment_split() {
        assert_eq!(
            split_fragment("abc#My%20Node"),
            ("abc", Some("My Node".to_string()))
        );
        assert_eq!(split_fragment("abc"), ("abc", None));
    }
}
