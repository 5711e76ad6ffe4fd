//! Surge / Surfboard encoder
//!
//! One `name = type, server, port, key=value, ...` line per node. SSR and
//! Hysteria v1 have no Surge form and are left out.

use tracing::trace;

use crate::config::ConversionOptions;
use crate::node::Node;

/// Encodes nodes as Surge proxy lines
pub fn encode(nodes: &[Node], options: &ConversionOptions) -> String {
    nodes
        .iter()
        .filter_map(|node| {
            let line = to_line(node, options);
            if line.is_none() {
                trace!("Surge has no form for {} node {}", node.kind(), node.name());
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the proxy line for one node, or `None` when Surge cannot express it
pub fn to_line(node: &Node, options: &ConversionOptions) -> Option<String> {
    let line = match node {
        Node::Ss(n) => {
            let mut line = format!(
                "{} = ss, {}, {}, encrypt-method={}, password={}",
                n.name, n.server, n.port, n.method, n.password
            );
            if options.udp {
                line.push_str(", udp-relay=true");
            }
            line
        }
        Node::Vmess(n) => {
            let mut line = format!(
                "{} = vmess, {}, {}, username={}",
                n.name, n.server, n.port, n.uuid
            );
            if n.tls {
                line.push_str(", tls=true");
            }
            if let Some(ws) = &n.ws {
                line.push_str(", ws=true");
                line.push_str(&format!(", ws-path={}", ws.path));
                if let Some(host) = ws.host() {
                    line.push_str(&format!(", ws-headers=Host:{}", host));
                }
            }
            if options.skip_cert {
                line.push_str(", skip-cert-verify=true");
            }
            line
        }
        Node::Vless(n) => {
            let mut line = format!(
                "{} = vless, {}, {}, username={}",
                n.name, n.server, n.port, n.uuid
            );
            if n.tls_enabled() {
                line.push_str(", tls=true");
            }
            if options.skip_cert {
                line.push_str(", skip-cert-verify=true");
            }
            if let Some(ws) = n.ws.as_ref().filter(|_| n.network == "ws") {
                line.push_str(", ws=true");
                line.push_str(&format!(", ws-path={}", ws.path));
            }
            line
        }
        Node::Trojan(n) => {
            let mut line = format!(
                "{} = trojan, {}, {}, password={}",
                n.name, n.server, n.port, n.password
            );
            if !n.sni.is_empty() {
                line.push_str(&format!(", sni={}", n.sni));
            }
            if options.skip_cert {
                line.push_str(", skip-cert-verify=true");
            }
            line
        }
        Node::Hysteria2(n) => {
            let mut line = format!(
                "{} = hysteria2, {}, {}, password={}",
                n.name, n.server, n.port, n.password
            );
            if let Some(sni) = &n.sni {
                line.push_str(&format!(", sni={}", sni));
            }
            if n.insecure || options.skip_cert {
                line.push_str(", skip-cert-verify=true");
            }
            line
        }
        Node::Tuic(n) => {
            let mut line = format!(
                "{} = tuic-v5, {}, {}, uuid={}, password={}",
                n.name, n.server, n.port, n.uuid, n.password
            );
            if !n.alpn.is_empty() {
                line.push_str(&format!(", alpn={}", n.alpn.join(",")));
            }
            if let Some(sni) = &n.sni {
                line.push_str(&format!(", sni={}", sni));
            }
            if n.insecure || options.skip_cert {
                line.push_str(", skip-cert-verify=true");
            }
            line
        }
        Node::Ssr(_) | Node::Hysteria(_) => return None,
    };
    Some(line)
}
