//! Link encoder (shadowrocket, v2rayn, v2rayng)
//!
//! Turns each node back into its own share link and wraps the newline-joined
//! bundle in standard Base64. Links are re-built from the node fields, so they
//! decode to the same node but need not match the source text byte for byte.

use serde::Serialize;
use tracing::error;
use urlencoding::encode;

use crate::node::{
    Hysteria2Node, HysteriaNode, Node, ShadowsocksNode, ShadowsocksRNode, TrojanNode, TuicNode,
    VLessNode, VMessNode,
};
use crate::parser::base64::{encode_base64, encode_base64_url_safe};

/// Encodes every node as a link and Base64-wraps the bundle
pub fn encode_bundle(nodes: &[Node]) -> String {
    let links: Vec<String> = nodes.iter().filter_map(encode_link).collect();
    encode_base64(&links.join("\n"))
}

/// Re-serializes one node into its share link
pub fn encode_link(node: &Node) -> Option<String> {
    match node {
        Node::Ss(n) => Some(ss_link(n)),
        Node::Ssr(n) => Some(ssr_link(n)),
        Node::Vmess(n) => vmess_link(n),
        Node::Vless(n) => Some(vless_link(n)),
        Node::Trojan(n) => Some(trojan_link(n)),
        Node::Hysteria(n) => Some(hysteria_link(n)),
        Node::Hysteria2(n) => Some(hysteria2_link(n)),
        Node::Tuic(n) => Some(tuic_link(n)),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// `host:port`, bracketing IPv6 literals
fn authority(server: &str, port: u16) -> String {
    if server.contains(':') {
        format!("[{}]:{}", server, port)
    } else {
        format!("{}:{}", server, port)
    }
}

/// Builds `?k=v&...` from the pairs whose value is non-empty
fn query(pairs: &[(&str, &str)]) -> String {
    let encoded: Vec<String> = pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, encode(v)))
        .collect();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}

fn flag(enabled: bool) -> &'static str {
    if enabled { "1" } else { "" }
}

// ============================================================================
// Per-kind Links
// ============================================================================

fn ss_link(n: &ShadowsocksNode) -> String {
    format!(
        "ss://{}@{}#{}",
        encode_base64(&format!("{}:{}", n.method, n.password)),
        authority(&n.server, n.port),
        encode(&n.name)
    )
}

fn ssr_link(n: &ShadowsocksRNode) -> String {
    let body = format!(
        "{}:{}:{}:{}:{}:{}/?obfsparam={}&protoparam={}&remarks={}",
        n.server,
        n.port,
        n.protocol,
        n.method,
        n.obfs,
        encode_base64_url_safe(&n.password),
        encode_base64_url_safe(&n.obfs_param),
        encode_base64_url_safe(&n.protocol_param),
        encode_base64_url_safe(&n.name)
    );
    format!("ssr://{}", encode_base64_url_safe(&body))
}

#[derive(Serialize)]
struct VMessShare<'a> {
    v: &'static str,
    ps: &'a str,
    add: &'a str,
    port: u16,
    id: &'a str,
    aid: u32,
    net: &'a str,
    #[serde(rename = "type")]
    header_type: &'static str,
    host: &'a str,
    path: &'a str,
    tls: &'static str,
}

fn vmess_link(n: &VMessNode) -> Option<String> {
    let share = VMessShare {
        v: "2",
        ps: &n.name,
        add: &n.server,
        port: n.port,
        id: &n.uuid,
        aid: n.alter_id,
        net: &n.network,
        header_type: "none",
        host: n.ws.as_ref().and_then(|ws| ws.host()).unwrap_or(""),
        path: n.ws.as_ref().map(|ws| ws.path.as_str()).unwrap_or(""),
        tls: if n.tls { "tls" } else { "" },
    };
    match serde_json::to_string(&share) {
        Ok(json) => Some(format!("vmess://{}", encode_base64(&json))),
        Err(e) => {
            error!("Failed to serialize VMess link for {}: {}", n.name, e);
            None
        }
    }
}

fn vless_link(n: &VLessNode) -> String {
    let security = if n.reality.is_some() {
        "reality"
    } else if n.tls {
        "tls"
    } else {
        ""
    };
    let ws = n.ws.as_ref();
    let reality = n.reality.as_ref();

    let params = query(&[
        ("encryption", "none"),
        ("type", n.network.as_str()),
        ("security", security),
        ("flow", n.flow.as_str()),
        ("path", ws.map(|w| w.path.as_str()).unwrap_or("")),
        ("host", ws.and_then(|w| w.host()).unwrap_or("")),
        (
            "serviceName",
            n.grpc.as_ref().map(|g| g.service_name.as_str()).unwrap_or(""),
        ),
        ("pbk", reality.map(|r| r.public_key.as_str()).unwrap_or("")),
        ("sid", reality.map(|r| r.short_id.as_str()).unwrap_or("")),
        ("sni", reality.map(|r| r.sni.as_str()).unwrap_or("")),
    ]);

    format!(
        "vless://{}@{}{}#{}",
        encode(&n.uuid),
        authority(&n.server, n.port),
        params,
        encode(&n.name)
    )
}

fn trojan_link(n: &TrojanNode) -> String {
    let sni = if n.sni.is_empty() { &n.server } else { &n.sni };
    let alpn = n.alpn.join(",");
    format!(
        "trojan://{}@{}{}#{}",
        encode(&n.password),
        authority(&n.server, n.port),
        query(&[("peer", sni.as_str()), ("alpn", alpn.as_str())]),
        encode(&n.name)
    )
}

fn hysteria_link(n: &HysteriaNode) -> String {
    let alpn = n.alpn.join(",");
    format!(
        "hysteria://{}{}#{}",
        authority(&n.server, n.port),
        query(&[
            ("auth", n.auth.as_str()),
            ("upmbps", n.up.as_str()),
            ("downmbps", n.down.as_str()),
            ("alpn", alpn.as_str()),
            ("obfs", n.obfs.as_deref().unwrap_or("")),
            ("peer", n.sni.as_deref().unwrap_or("")),
            ("insecure", flag(n.insecure)),
        ]),
        encode(&n.name)
    )
}

fn hysteria2_link(n: &Hysteria2Node) -> String {
    let obfs = n.obfs.as_ref();
    format!(
        "hysteria2://{}@{}{}#{}",
        encode(&n.password),
        authority(&n.server, n.port),
        query(&[
            ("obfs", obfs.map(|o| o.kind.as_str()).unwrap_or("")),
            ("obfs-password", obfs.map(|o| o.password.as_str()).unwrap_or("")),
            ("sni", n.sni.as_deref().unwrap_or("")),
            ("insecure", flag(n.insecure)),
        ]),
        encode(&n.name)
    )
}

fn tuic_link(n: &TuicNode) -> String {
    let userinfo = if n.password.is_empty() {
        encode(&n.uuid).into_owned()
    } else {
        format!("{}:{}", encode(&n.uuid), encode(&n.password))
    };
    let alpn = n.alpn.join(",");
    format!(
        "tuic://{}@{}{}#{}",
        userinfo,
        authority(&n.server, n.port),
        query(&[
            ("congestion_control", n.congestion.as_deref().unwrap_or("")),
            ("alpn", alpn.as_str()),
            ("sni", n.sni.as_deref().unwrap_or("")),
            ("allow_insecure", flag(n.insecure)),
            ("udp_relay_mode", n.udp_relay_mode.as_deref().unwrap_or("")),
        ]),
        encode(&n.name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ObfsOptions, RealityOptions, WsOptions};
    use crate::parser::base64::decode_base64_str;
    use crate::parser::protocols::ProtocolRegistry;

    fn round_trip(node: &Node) -> Node {
        let link = encode_link(node).unwrap();
        ProtocolRegistry::with_builtin_parsers()
            .parse_uri(&link)
            .unwrap_or_else(|e| panic!("{} failed to decode: {}", link, e))
    }

    #[test]
    fn test_ss_link_shape() {
        let node = Node::Ss(ShadowsocksNode {
            name: "Test".to_string(),
            server: "1.2.3.4".to_string(),
            port: 8388,
            method: "aes-256-gcm".to_string(),
            password: "pw".to_string(),
        });
        assert_eq!(
            encode_link(&node).unwrap(),
            "ss://YWVzLTI1Ni1nY206cHc=@1.2.3.4:8388#Test"
        );
        assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn test_ssr_round_trip() {
        let node = Node::Ssr(ShadowsocksRNode {
            name: "香港 SSR".to_string(),
            server: "ssr.example.com".to_string(),
            port: 8989,
            method: "aes-128-cfb".to_string(),
            password: "p@ss:word".to_string(),
            protocol: "auth_aes128_md5".to_string(),
            protocol_param: "32:abc".to_string(),
            obfs: "tls1.2_ticket_auth".to_string(),
            obfs_param: "bing.com".to_string(),
        });
        let link = encode_link(&node).unwrap();
        assert!(!link.contains('='));
        assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn test_vmess_round_trip() {
        let node = Node::Vmess(VMessNode {
            name: "VM ws".to_string(),
            server: "vm.example.com".to_string(),
            port: 443,
            uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
            alter_id: 2,
            network: "ws".to_string(),
            tls: true,
            ws: Some(WsOptions::new(Some("/ray"), Some("cdn.example.com"))),
        });
        assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn test_vless_reality_round_trip() {
        let node = Node::Vless(VLessNode {
            name: "VLESS Reality".to_string(),
            server: "r.example.com".to_string(),
            port: 443,
            uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
            flow: "xtls-rprx-vision".to_string(),
            network: "tcp".to_string(),
            tls: false,
            ws: None,
            grpc: None,
            reality: Some(RealityOptions {
                public_key: "pbk".to_string(),
                short_id: "0123".to_string(),
                sni: "www.microsoft.com".to_string(),
            }),
        });
        let link = encode_link(&node).unwrap();
        assert_eq!(link.matches("security=").count(), 1);
        assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn test_trojan_round_trip_ipv6() {
        let node = Node::Trojan(TrojanNode {
            name: "T6".to_string(),
            server: "2001:db8::1".to_string(),
            port: 443,
            password: "pass word".to_string(),
            sni: "t.example.com".to_string(),
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
        });
        assert!(encode_link(&node).unwrap().contains("@[2001:db8::1]:443"));
        assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn test_hysteria_family_round_trip() {
        let hy = Node::Hysteria(HysteriaNode {
            name: "H1".to_string(),
            server: "h.example.com".to_string(),
            port: 443,
            auth: "token".to_string(),
            up: "50".to_string(),
            down: "200".to_string(),
            alpn: vec!["h3".to_string()],
            obfs: Some("xplus".to_string()),
            sni: Some("h.example.com".to_string()),
            insecure: true,
        });
        let hy2 = Node::Hysteria2(Hysteria2Node {
            name: "H2".to_string(),
            server: "h2.example.com".to_string(),
            port: 8443,
            password: "user:pass".to_string(),
            obfs: Some(ObfsOptions {
                kind: "salamander".to_string(),
                password: "obfs".to_string(),
            }),
            sni: None,
            insecure: false,
        });
        assert_eq!(round_trip(&hy), hy);
        assert_eq!(round_trip(&hy2), hy2);
    }

    #[test]
    fn test_tuic_round_trip() {
        let node = Node::Tuic(TuicNode {
            name: "TUIC".to_string(),
            server: "tuic.example.com".to_string(),
            port: 443,
            uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
            password: "pw".to_string(),
            congestion: Some("bbr".to_string()),
            alpn: vec!["h3".to_string()],
            sni: Some("tuic.example.com".to_string()),
            insecure: true,
            udp_relay_mode: Some("native".to_string()),
        });
        assert_eq!(round_trip(&node), node);
    }

    #[test]
    fn test_bundle_is_base64_of_lines() {
        let node = Node::Ss(ShadowsocksNode {
            name: "A".to_string(),
            server: "1.1.1.1".to_string(),
            port: 1,
            method: "aes-128-gcm".to_string(),
            password: "x".to_string(),
        });
        let bundle = encode_bundle(&[node.clone(), node.with_name("B")]);
        let decoded = decode_base64_str(&bundle).unwrap();
        assert_eq!(decoded.lines().count(), 2);
        assert!(decoded.lines().all(|l| l.starts_with("ss://")));
    }

    #[test]
    fn test_bundle_empty() {
        assert_eq!(encode_bundle(&[]), "");
    }
}
