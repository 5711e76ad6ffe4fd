//! sing-box / NekoBox encoder
//!
//! Produces `{"outbounds": [...]}` with a leading `selector` over every node,
//! one outbound per node, and a trailing `direct` outbound.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::error;

use crate::config::ConversionOptions;
use crate::node::{Node, WsOptions};

/// Fallback bandwidth in Mbps when a Hysteria hint is not numeric
const DEFAULT_MBPS: u32 = 100;

// ============================================================================
// Outbound Records
// ============================================================================

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Selector {
        tag: String,
        outbounds: Vec<String>,
    },
    Direct {
        tag: String,
    },
    Shadowsocks {
        tag: String,
        server: String,
        server_port: u16,
        method: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        network: Option<&'static str>,
    },
    ShadowsocksR {
        tag: String,
        server: String,
        server_port: u16,
        method: String,
        password: String,
        protocol: String,
        protocol_param: String,
        obfs: String,
        obfs_param: String,
    },
    Vmess {
        tag: String,
        server: String,
        server_port: u16,
        uuid: String,
        security: &'static str,
        alter_id: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        tls: Option<Tls>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transport: Option<Transport>,
    },
    Vless {
        tag: String,
        server: String,
        server_port: u16,
        uuid: String,
        #[serde(skip_serializing_if = "String::is_empty")]
        flow: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tls: Option<Tls>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transport: Option<Transport>,
    },
    Trojan {
        tag: String,
        server: String,
        server_port: u16,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tls: Option<Tls>,
    },
    Hysteria {
        tag: String,
        server: String,
        server_port: u16,
        #[serde(skip_serializing_if = "String::is_empty")]
        auth_str: String,
        up_mbps: u32,
        down_mbps: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        obfs: Option<String>,
        tls: Tls,
    },
    Hysteria2 {
        tag: String,
        server: String,
        server_port: u16,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        obfs: Option<Obfs>,
        tls: Tls,
    },
    Tuic {
        tag: String,
        server: String,
        server_port: u16,
        uuid: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        congestion_control: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        udp_relay_mode: Option<String>,
        tls: Tls,
    },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Tls {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    pub insecure: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality: Option<Reality>,
}

impl Tls {
    fn new(server_name: Option<String>, insecure: bool) -> Self {
        Self {
            enabled: true,
            server_name,
            insecure,
            alpn: Vec::new(),
            reality: None,
        }
    }

    fn with_alpn(mut self, alpn: &[String]) -> Self {
        self.alpn = alpn.to_vec();
        self
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Reality {
    pub enabled: bool,
    pub public_key: String,
    pub short_id: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transport {
    Ws {
        path: String,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
    Grpc {
        service_name: String,
    },
}

impl From<&WsOptions> for Transport {
    fn from(ws: &WsOptions) -> Self {
        Transport::Ws {
            path: ws.path.clone(),
            headers: ws.headers.clone(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Obfs {
    #[serde(rename = "type")]
    pub kind: String,
    pub password: String,
}

#[derive(Serialize)]
struct SingBoxDocument {
    outbounds: Vec<Outbound>,
}

// ============================================================================
// Projection
// ============================================================================

/// Projects a node into its sing-box outbound
pub fn to_outbound(node: &Node, options: &ConversionOptions) -> Outbound {
    let tag = node.name().to_string();
    let server = node.server().to_string();
    let server_port = node.port();

    match node {
        Node::Ss(n) => Outbound::Shadowsocks {
            tag,
            server,
            server_port,
            method: n.method.clone(),
            password: n.password.clone(),
            network: (!options.udp).then_some("tcp"),
        },
        Node::Ssr(n) => Outbound::ShadowsocksR {
            tag,
            server,
            server_port,
            method: n.method.clone(),
            password: n.password.clone(),
            protocol: n.protocol.clone(),
            protocol_param: n.protocol_param.clone(),
            obfs: n.obfs.clone(),
            obfs_param: n.obfs_param.clone(),
        },
        Node::Vmess(n) => {
            let ws = n.ws.as_ref().filter(|_| n.network == "ws");
            let tls = n.tls.then(|| {
                let name = ws
                    .and_then(|w| w.host())
                    .unwrap_or(&n.server)
                    .to_string();
                Tls::new(Some(name), options.skip_cert)
            });
            Outbound::Vmess {
                tag,
                server,
                server_port,
                uuid: n.uuid.clone(),
                security: "auto",
                alter_id: n.alter_id,
                tls,
                transport: ws.map(Transport::from),
            }
        }
        Node::Vless(n) => {
            let ws = n.ws.as_ref().filter(|_| n.network == "ws");
            let tls = n.tls_enabled().then(|| {
                let name = n
                    .reality
                    .as_ref()
                    .map(|r| r.sni.as_str())
                    .filter(|s| !s.is_empty())
                    .or_else(|| ws.and_then(|w| w.host()))
                    .unwrap_or(&n.server)
                    .to_string();
                let mut tls = Tls::new(Some(name), options.skip_cert);
                tls.reality = n.reality.as_ref().map(|r| Reality {
                    enabled: true,
                    public_key: r.public_key.clone(),
                    short_id: r.short_id.clone(),
                });
                tls
            });
            let transport = match (ws, n.grpc.as_ref()) {
                (Some(ws), _) => Some(Transport::from(ws)),
                (None, Some(grpc)) if n.network == "grpc" => Some(Transport::Grpc {
                    service_name: grpc.service_name.clone(),
                }),
                _ => None,
            };
            Outbound::Vless {
                tag,
                server,
                server_port,
                uuid: n.uuid.clone(),
                flow: n.flow.clone(),
                tls,
                transport,
            }
        }
        Node::Trojan(n) => Outbound::Trojan {
            tag,
            server,
            server_port,
            password: n.password.clone(),
            tls: (!n.sni.is_empty())
                .then(|| Tls::new(Some(n.sni.clone()), options.skip_cert).with_alpn(&n.alpn)),
        },
        Node::Hysteria(n) => Outbound::Hysteria {
            tag,
            server,
            server_port,
            auth_str: n.auth.clone(),
            up_mbps: n.up.trim().parse().unwrap_or(DEFAULT_MBPS),
            down_mbps: n.down.trim().parse().unwrap_or(DEFAULT_MBPS),
            obfs: n.obfs.clone(),
            tls: Tls::new(n.sni.clone(), n.insecure || options.skip_cert).with_alpn(&n.alpn),
        },
        Node::Hysteria2(n) => Outbound::Hysteria2 {
            tag,
            server,
            server_port,
            password: n.password.clone(),
            obfs: n.obfs.as_ref().map(|o| Obfs {
                kind: o.kind.clone(),
                password: o.password.clone(),
            }),
            tls: Tls::new(n.sni.clone(), n.insecure || options.skip_cert),
        },
        Node::Tuic(n) => Outbound::Tuic {
            tag,
            server,
            server_port,
            uuid: n.uuid.clone(),
            password: n.password.clone(),
            congestion_control: n.congestion.clone(),
            udp_relay_mode: n.udp_relay_mode.clone(),
            tls: Tls::new(n.sni.clone(), n.insecure || options.skip_cert).with_alpn(&n.alpn),
        },
    }
}

// ============================================================================
// Encoding
// ============================================================================

pub fn encode(nodes: &[Node], options: &ConversionOptions) -> String {
    let mut outbounds = Vec::with_capacity(nodes.len() + 2);
    outbounds.push(Outbound::Selector {
        tag: "proxy".to_string(),
        outbounds: nodes.iter().map(|n| n.name().to_string()).collect(),
    });
    outbounds.extend(nodes.iter().map(|n| to_outbound(n, options)));
    outbounds.push(Outbound::Direct {
        tag: "direct".to_string(),
    });

    match serde_json::to_string_pretty(&SingBoxDocument { outbounds }) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize sing-box document: {}", e);
            String::new()
        }
    }
}
