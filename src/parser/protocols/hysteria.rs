//! Hysteria (v1) protocol parser
//!
//! Format: hysteria://host:port?auth=..&upmbps=..&downmbps=..&peer=..#tag

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use tracing::trace;
use url::Url;

use crate::node::{HysteriaNode, Node, NodeKind, name_or_default};

use super::{
    ProtocolParser, is_truthy, percent_decode, split_list, url_fragment, url_host, url_port,
};

/// Bandwidth hint used when the link gives none, in Mbps
const DEFAULT_BANDWIDTH: &str = "100";

/// Parser for Hysteria (hysteria://) URIs
pub struct HysteriaParser;

impl ProtocolParser for HysteriaParser {
    fn scheme(&self) -> &str {
        "hysteria"
    }

    fn parse(&self, uri: &str) -> Result<Node> {
        trace!("Parsing Hysteria URI");
        let url = Url::parse(uri).map_err(|e| anyhow!("Failed to parse Hysteria URI: {}", e))?;

        let server = url_host(&url, "Hysteria")?;
        let port = url_port(&url, "Hysteria")?;

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let non_empty = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

        let auth = non_empty("auth")
            .or_else(|| non_empty("auth_str"))
            .unwrap_or_else(|| percent_decode(url.username()));

        let bandwidth = |key: &str| non_empty(key).unwrap_or_else(|| DEFAULT_BANDWIDTH.to_string());

        Ok(Node::Hysteria(HysteriaNode {
            name: name_or_default(url_fragment(&url), NodeKind::Hysteria),
            server,
            port,
            auth,
            up: bandwidth("upmbps"),
            down: bandwidth("downmbps"),
            alpn: params.get("alpn").map(|s| split_list(s)).unwrap_or_default(),
            obfs: non_empty("obfs").filter(|o| o != "none"),
            sni: non_empty("peer").or_else(|| non_empty("sni")),
            insecure: is_truthy(params.get("insecure")),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_hysteria(uri: &str) -> HysteriaNode {
        match HysteriaParser.parse(uri).unwrap() {
            Node::Hysteria(hy) => hy,
            other => panic!("Expected Hysteria node, got {:?}", other),
        }
    }

    #[test]
    fn test_hysteria_full() {
        let hy = parse_hysteria(
            "hysteria://example.com:443?auth=password&upmbps=50&downmbps=200&alpn=h3&obfs=x&peer=sni.example.com&insecure=1#Hysteria-1",
        );
        assert_eq!(hy.name, "Hysteria-1");
        assert_eq!(hy.server, "example.com");
        assert_eq!(hy.port, 443);
        assert_eq!(hy.auth, "password");
        assert_eq!(hy.up, "50");
        assert_eq!(hy.down, "200");
        assert_eq!(hy.alpn, vec!["h3"]);
        assert_eq!(hy.obfs.as_deref(), Some("x"));
        assert_eq!(hy.sni.as_deref(), Some("sni.example.com"));
        assert!(hy.insecure);
    }

    #[test]
    fn test_hysteria_defaults() {
        let hy = parse_hysteria("hysteria://example.com:8443");
        assert_eq!(hy.name, "Hysteria Node");
        assert_eq!(hy.up, "100");
        assert_eq!(hy.down, "100");
        assert!(hy.auth.is_empty());
        assert!(hy.alpn.is_empty());
        assert!(hy.obfs.is_none());
        assert!(hy.sni.is_none());
        assert!(!hy.insecure);
    }

    #[test]
    fn test_hysteria_auth_from_userinfo() {
        let hy = parse_hysteria("hysteria://secret%21@example.com:443");
        assert_eq!(hy.auth, "secret!");
    }

    #[test]
    fn test_hysteria_sni_fallback() {
        let hy = parse_hysteria("hysteria://example.com:443?sni=s.example.com");
        assert_eq!(hy.sni.as_deref(), Some("s.example.com"));
    }

    #[test]
    fn test_hysteria_insecure_only_when_set() {
        let hy = parse_hysteria("hysteria://example.com:443?insecure=0");
        assert!(!hy.insecure);
    }

    #[test]
    fn test_hysteria_missing_port() {
        assert!(HysteriaParser.parse("hysteria://example.com").is_err());
        assert!(HysteriaParser.parse("hysteria://example.com:0").is_err());
    }

    #[test]
    fn test_can_parse() {
        let parser = HysteriaParser;
        assert!(parser.can_parse("hysteria://host:443"));
        assert!(!parser.can_parse("hysteria2://host:443"));
    }
}
