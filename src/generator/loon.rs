//! Loon encoder
//!
//! `name = Type,server,port,...` lines with credentials in double quotes.

use crate::config::ConversionOptions;
use crate::node::Node;

pub fn encode(nodes: &[Node], options: &ConversionOptions) -> String {
    nodes
        .iter()
        .filter_map(|node| to_line(node, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the Loon line for one node; Hysteria v1 and TUIC have none
pub fn to_line(node: &Node, options: &ConversionOptions) -> Option<String> {
    let line = match node {
        Node::Ss(n) => {
            let mut line = format!(
                "{} = Shadowsocks,{},{},{},\"{}\"",
                n.name, n.server, n.port, n.method, n.password
            );
            if options.udp {
                line.push_str(",udp=true");
            }
            line
        }
        Node::Ssr(n) => {
            let mut line = format!(
                "{} = ShadowsocksR,{},{},{},\"{}\",protocol={},protocol-param={},obfs={},obfs-param={}",
                n.name,
                n.server,
                n.port,
                n.method,
                n.password,
                n.protocol,
                n.protocol_param,
                n.obfs,
                n.obfs_param
            );
            if options.udp {
                line.push_str(",udp=true");
            }
            line
        }
        Node::Vmess(n) => {
            let mut line = format!("{} = vmess,{},{},auto,\"{}\"", n.name, n.server, n.port, n.uuid);
            if let Some(ws) = &n.ws {
                line.push_str(",transport=ws");
                line.push_str(&format!(",path={}", ws.path));
                if let Some(host) = ws.host() {
                    line.push_str(&format!(",host={}", host));
                }
            }
            if n.tls {
                line.push_str(",over-tls=true");
            }
            if options.skip_cert {
                line.push_str(",skip-cert-verify=true");
            }
            line
        }
        Node::Vless(n) => {
            let mut line = format!("{} = vless,{},{},\"{}\"", n.name, n.server, n.port, n.uuid);
            if let Some(ws) = n.ws.as_ref().filter(|_| n.network == "ws") {
                line.push_str(",transport=ws");
                line.push_str(&format!(",path={}", ws.path));
                if let Some(host) = ws.host() {
                    line.push_str(&format!(",host={}", host));
                }
            }
            if n.tls_enabled() {
                line.push_str(",over-tls=true");
            }
            line
        }
        Node::Trojan(n) => {
            let mut line = format!(
                "{} = trojan,{},{},\"{}\"",
                n.name, n.server, n.port, n.password
            );
            if !n.sni.is_empty() {
                line.push_str(&format!(",sni={}", n.sni));
            }
            if options.skip_cert {
                line.push_str(",skip-cert-verify=true");
            }
            line
        }
        Node::Hysteria2(n) => {
            let mut line = format!(
                "{} = Hysteria2,{},{},\"{}\"",
                n.name, n.server, n.port, n.password
            );
            if let Some(sni) = &n.sni {
                line.push_str(&format!(",sni={}", sni));
            }
            if n.insecure || options.skip_cert {
                line.push_str(",skip-cert-verify=true");
            }
            line
        }
        Node::Hysteria(_) | Node::Tuic(_) => return None,
    };
    Some(line)
}
