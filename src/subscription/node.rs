use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::common::error::{ConvertError, ValidationError, ValidationReason};
use crate::convert::{clash, surge, Dialect, ProxyRecord};

/// 节点协议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Ss,
    Ssr,
    Vmess,
    Trojan,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Ss => "ss",
            NodeKind::Ssr => "ssr",
            NodeKind::Vmess => "vmess",
            NodeKind::Trojan => "trojan",
        }
    }

    /// Map a Clash `type:` value onto a kind.
    pub fn from_clash_type(s: &str) -> Option<Self> {
        match s {
            "ss" | "shadowsocks" => Some(NodeKind::Ss),
            "ssr" | "shadowsocksr" => Some(NodeKind::Ssr),
            "vmess" => Some(NodeKind::Vmess),
            "trojan" => Some(NodeKind::Trojan),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol-specific part of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Protocol {
    #[serde(rename = "ss")]
    Shadowsocks(ShadowsocksParams),
    #[serde(rename = "ssr")]
    ShadowsocksR(ShadowsocksRParams),
    Vmess(VmessParams),
    Trojan(TrojanParams),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShadowsocksParams {
    pub cipher: String,
    pub password: String,
    pub plugin: String,
    pub plugin_opts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShadowsocksRParams {
    pub cipher: String,
    pub password: String,
    pub protocol: String,
    pub protocol_param: String,
    pub obfs: String,
    pub obfs_param: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VmessParams {
    pub uuid: String,
    pub alter_id: i64,
    /// Empty means `auto`.
    pub cipher: String,
    pub network: String,
    pub tls: bool,
    pub sni: String,
    pub alpn: Vec<String>,
    pub ws_path: String,
    pub ws_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrojanParams {
    pub password: String,
    pub sni: String,
    pub alpn: Vec<String>,
    pub allow_insecure: bool,
}

/// 统一的节点结构
///
/// Built once by a decoder, read-only afterwards. `settings` carries the raw
/// key/value pairs of the source link for parameters the typed fields do
/// not model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub server: String,
    pub port: u16,
    #[serde(flatten)]
    pub protocol: Protocol,
    pub udp: bool,
    pub group: String,
    pub tags: Vec<String>,
    pub settings: BTreeMap<String, String>,
}

impl Node {
    pub fn new(name: String, server: String, port: u16, protocol: Protocol) -> Self {
        Self {
            name,
            server,
            port,
            protocol,
            udp: false,
            group: String::new(),
            tags: Vec::new(),
            settings: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.protocol {
            Protocol::Shadowsocks(_) => NodeKind::Ss,
            Protocol::ShadowsocksR(_) => NodeKind::Ssr,
            Protocol::Vmess(_) => NodeKind::Vmess,
            Protocol::Trojan(_) => NodeKind::Trojan,
        }
    }

    /// Password for the protocols that have one.
    pub fn password(&self) -> Option<&str> {
        match &self.protocol {
            Protocol::Shadowsocks(p) => Some(&p.password),
            Protocol::ShadowsocksR(p) => Some(&p.password),
            Protocol::Trojan(p) => Some(&p.password),
            Protocol::Vmess(_) => None,
        }
    }

    /// Check the node invariants, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check().map_err(|reason| ValidationError {
            node: self.name.clone(),
            reason,
        })
    }

    fn check(&self) -> Result<(), ValidationReason> {
        if self.server.trim().is_empty() {
            return Err(ValidationReason::MissingServer);
        }
        if self.port == 0 {
            return Err(ValidationReason::InvalidPort);
        }
        if let Some(password) = self.password() {
            if password.is_empty() {
                return Err(ValidationReason::MissingPassword);
            }
        }

        match &self.protocol {
            Protocol::Shadowsocks(p) if p.cipher.is_empty() => Err(ValidationReason::MissingCipher),
            Protocol::ShadowsocksR(p) if p.protocol.is_empty() || p.obfs.is_empty() => {
                Err(ValidationReason::MissingProtocolOrObfs)
            }
            Protocol::Vmess(p) if p.uuid.is_empty() => Err(ValidationReason::MissingIdentifier),
            Protocol::Vmess(p) if p.alter_id < 0 => Err(ValidationReason::InvalidAlterId),
            _ => Ok(()),
        }
    }

    /// Map onto the record one output dialect needs. Never mutates the node.
    pub fn to_target(&self, dialect: Dialect) -> Result<ProxyRecord, ConvertError> {
        match dialect {
            Dialect::Clash => Ok(ProxyRecord::Clash(clash::proxy_record(self))),
            Dialect::Surge => surge::proxy_line(self).map(ProxyRecord::Surge),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Return `fallback` when `value` is blank.
pub(crate) fn default_if_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
