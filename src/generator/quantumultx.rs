//! Quantumult X encoder
//!
//! Lines take the `type=server:port, key=value, ..., tag=name` shape.
//! Hysteria, Hysteria2 and TUIC are left out.

use crate::config::ConversionOptions;
use crate::node::Node;

/// Encodes nodes as Quantumult X server lines
pub fn encode(nodes: &[Node], options: &ConversionOptions) -> String {
    nodes
        .iter()
        .filter_map(|node| to_line(node, options))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_line(node: &Node, options: &ConversionOptions) -> Option<String> {
    let line = match node {
        Node::Ss(n) => {
            let mut line = format!(
                "shadowsocks={}:{}, method={}, password={}, tag={}",
                n.server, n.port, n.method, n.password, n.name
            );
            if options.udp {
                line.push_str(", udp-relay=true");
            }
            line
        }
        Node::Ssr(n) => {
            let mut line = format!(
                "shadowsocks={}:{}, method={}, password={}, ssr-protocol={}",
                n.server, n.port, n.method, n.password, n.protocol
            );
            if !n.protocol_param.is_empty() {
                line.push_str(&format!(", ssr-protocol-param={}", n.protocol_param));
            }
            line.push_str(&format!(", obfs={}", n.obfs));
            if !n.obfs_param.is_empty() {
                line.push_str(&format!(", obfs-host={}", n.obfs_param));
            }
            if options.udp {
                line.push_str(", udp-relay=true");
            }
            line.push_str(&format!(", tag={}", n.name));
            line
        }
        Node::Vmess(n) => {
            let mut line = format!(
                "vmess={}:{}, method=auto, password={}, tag={}",
                n.server, n.port, n.uuid, n.name
            );
            if n.tls {
                line.push_str(", tls=1");
            }
            if let Some(ws) = &n.ws {
                line.push_str(", obfs=ws");
                line.push_str(&format!(", obfs-uri={}", ws.path));
                if let Some(host) = ws.host() {
                    line.push_str(&format!(", obfs-host={}", host));
                }
            }
            if options.skip_cert {
                line.push_str(", tls-verification=false");
            }
            line
        }
        Node::Vless(n) => {
            let mut line = format!(
                "vless={}:{}, method=none, password={}, tag={}",
                n.server, n.port, n.uuid, n.name
            );
            if n.tls_enabled() {
                line.push_str(", tls=1");
            }
            if options.skip_cert {
                line.push_str(", tls-verification=false");
            }
            if let Some(ws) = n.ws.as_ref().filter(|_| n.network == "ws") {
                line.push_str(", obfs=ws");
                line.push_str(&format!(", obfs-uri={}", ws.path));
            }
            line
        }
        Node::Trojan(n) => {
            let mut line = format!(
                "trojan={}:{}, password={}, tag={}",
                n.server, n.port, n.password, n.name
            );
            if !n.sni.is_empty() {
                line.push_str(&format!(", tls-host={}", n.sni));
            }
            if options.skip_cert {
                line.push_str(", tls-verification=false");
            }
            line
        }
        Node::Hysteria(_) | Node::Hysteria2(_) | Node::Tuic(_) => return None,
    };
    Some(line)
}
