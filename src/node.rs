//! Canonical node model
//!
//! Every link decoder produces a [`Node`] and every target encoder consumes one.
//! The enum is closed: one variant per supported link scheme, each carrying the
//! common `name`/`server`/`port` triple plus its kind-specific payload.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::util::{is_empty_str, is_false, is_zero_u32};

// ============================================================================
// Node Enum
// ============================================================================

/// A decoded proxy endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// Shadowsocks
    Ss(ShadowsocksNode),
    /// ShadowsocksR
    Ssr(ShadowsocksRNode),
    /// VMess
    Vmess(VMessNode),
    /// VLESS
    Vless(VLessNode),
    /// Trojan
    Trojan(TrojanNode),
    /// Hysteria (v1)
    Hysteria(HysteriaNode),
    /// Hysteria2
    Hysteria2(Hysteria2Node),
    /// TUIC (v5)
    Tuic(TuicNode),
}

/// Discriminant of a [`Node`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Ss,
    Ssr,
    Vmess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    Tuic,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Ss => "ss",
            NodeKind::Ssr => "ssr",
            NodeKind::Vmess => "vmess",
            NodeKind::Vless => "vless",
            NodeKind::Trojan => "trojan",
            NodeKind::Hysteria => "hysteria",
            NodeKind::Hysteria2 => "hysteria2",
            NodeKind::Tuic => "tuic",
        }
    }

    /// Name given to a node whose link carries no remark.
    pub fn default_name(&self) -> &'static str {
        match self {
            NodeKind::Ss => "SS Node",
            NodeKind::Ssr => "SSR Node",
            NodeKind::Vmess => "VMess Node",
            NodeKind::Vless => "VLESS Node",
            NodeKind::Trojan => "Trojan Node",
            NodeKind::Hysteria => "Hysteria Node",
            NodeKind::Hysteria2 => "Hysteria2 Node",
            NodeKind::Tuic => "TUIC Node",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transport / Security Sub-records
// ============================================================================

/// WebSocket transport settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct WsOptions {
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl WsOptions {
    /// Builds ws options from a path and an optional `Host` header value.
    pub fn new(path: Option<&str>, host: Option<&str>) -> Self {
        let mut headers = BTreeMap::new();
        if let Some(host) = host
            && !host.is_empty()
        {
            headers.insert("Host".to_string(), host.to_string());
        }
        Self {
            path: path
                .filter(|p| !p.is_empty())
                .unwrap_or("/")
                .to_string(),
            headers,
        }
    }

    /// The `Host` header, if one was given.
    pub fn host(&self) -> Option<&str> {
        self.headers.get("Host").map(String::as_str)
    }
}

/// gRPC transport settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GrpcOptions {
    pub service_name: String,
}

/// REALITY security settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct RealityOptions {
    pub public_key: String,
    pub short_id: String,
    pub sni: String,
}

/// Hysteria2 obfuscation settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ObfsOptions {
    /// Obfuscation type, e.g. `salamander`
    pub kind: String,
    pub password: String,
}

// ============================================================================
// Per-kind Payloads
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShadowsocksNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub method: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShadowsocksRNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub method: String,
    pub password: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "is_empty_str")]
    pub protocol_param: String,
    pub obfs: String,
    #[serde(default, skip_serializing_if = "is_empty_str")]
    pub obfs_param: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VMessNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub alter_id: u32,
    pub network: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<WsOptions>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VLessNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "is_empty_str")]
    pub flow: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<WsOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality: Option<RealityOptions>,
}

impl VLessNode {
    /// REALITY runs over TLS, so either flag turns TLS on for the encoders.
    pub fn tls_enabled(&self) -> bool {
        self.tls || self.reality.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrojanNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub password: String,
    pub sni: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HysteriaNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "is_empty_str")]
    pub auth: String,
    /// Upload bandwidth hint in Mbps
    pub up: String,
    /// Download bandwidth hint in Mbps
    pub down: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Hysteria2Node {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<ObfsOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TuicNode {
    pub name: String,
    pub server: String,
    pub port: u16,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "is_empty_str")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion: Option<String>,
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,
}

// ============================================================================
// Accessors
// ============================================================================

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Ss(_) => NodeKind::Ss,
            Node::Ssr(_) => NodeKind::Ssr,
            Node::Vmess(_) => NodeKind::Vmess,
            Node::Vless(_) => NodeKind::Vless,
            Node::Trojan(_) => NodeKind::Trojan,
            Node::Hysteria(_) => NodeKind::Hysteria,
            Node::Hysteria2(_) => NodeKind::Hysteria2,
            Node::Tuic(_) => NodeKind::Tuic,
        }
    }

    /// Display name of the node.
    pub fn name(&self) -> &str {
        match self {
            Node::Ss(n) => &n.name,
            Node::Ssr(n) => &n.name,
            Node::Vmess(n) => &n.name,
            Node::Vless(n) => &n.name,
            Node::Trojan(n) => &n.name,
            Node::Hysteria(n) => &n.name,
            Node::Hysteria2(n) => &n.name,
            Node::Tuic(n) => &n.name,
        }
    }

    pub fn server(&self) -> &str {
        match self {
            Node::Ss(n) => &n.server,
            Node::Ssr(n) => &n.server,
            Node::Vmess(n) => &n.server,
            Node::Vless(n) => &n.server,
            Node::Trojan(n) => &n.server,
            Node::Hysteria(n) => &n.server,
            Node::Hysteria2(n) => &n.server,
            Node::Tuic(n) => &n.server,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Node::Ss(n) => n.port,
            Node::Ssr(n) => n.port,
            Node::Vmess(n) => n.port,
            Node::Vless(n) => n.port,
            Node::Trojan(n) => n.port,
            Node::Hysteria(n) => n.port,
            Node::Hysteria2(n) => n.port,
            Node::Tuic(n) => n.port,
        }
    }

    fn name_mut(&mut self) -> &mut String {
        match self {
            Node::Ss(n) => &mut n.name,
            Node::Ssr(n) => &mut n.name,
            Node::Vmess(n) => &mut n.name,
            Node::Vless(n) => &mut n.name,
            Node::Trojan(n) => &mut n.name,
            Node::Hysteria(n) => &mut n.name,
            Node::Hysteria2(n) => &mut n.name,
            Node::Tuic(n) => &mut n.name,
        }
    }

    /// Returns a copy of this node carrying a different display name.
    ///
    /// An empty name falls back to the kind's default name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = self.kind();
        *self.name_mut() = if name.is_empty() {
            kind.default_name().to_string()
        } else {
            name
        };
        self
    }

    /// Checks the invariants every decoded node must hold.
    pub fn validate(&self) -> Result<()> {
        if self.name().is_empty() {
            bail!("{} node has an empty name", self.kind());
        }
        if self.server().is_empty() {
            bail!("{} node is missing a server address", self.kind());
        }
        if self.port() == 0 {
            bail!("{} node has port 0", self.kind());
        }
        Ok(())
    }
}

/// Picks the link remark, or the kind's default name when it is absent or empty.
pub fn name_or_default(name: Option<String>, kind: NodeKind) -> String {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => kind.default_name().to_string(),
    }
}
