//! VLESS protocol parser
//!
//! This module provides parsing for VLESS (vless://) URIs.
//! Format: vless://uuid@host:port?params#tag

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use tracing::trace;
use url::Url;

use crate::node::{
    GrpcOptions, Node, NodeKind, RealityOptions, VLessNode, WsOptions, name_or_default,
};

use super::{ProtocolParser, is_truthy, percent_decode, url_fragment, url_host, url_port};

// ============================================================================
// VLESS Parser
// ============================================================================

/// Parser for VLESS (vless://) URIs
///
/// Format: vless://uuid@host:port?params#tag
pub struct VLessParser;

impl ProtocolParser for VLessParser {
    fn scheme(&self) -> &str {
        "vless"
    }

    fn parse(&self, uri: &str) -> Result<Node> {
        trace!("Parsing VLESS URI");
        let url = Url::parse(uri).map_err(|e| anyhow!("Failed to parse VLESS URI: {}", e))?;

        let uuid = percent_decode(url.username());
        if uuid.is_empty() {
            bail!("VLESS URI missing UUID");
        }

        let server = url_host(&url, "VLESS")?;
        let port = url_port(&url, "VLESS")?;

        // Parse query parameters
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

        let network = match param("type") {
            "" => "tcp".to_string(),
            other => other.to_string(),
        };
        let security = param("security");

        let ws = (network == "ws").then(|| {
            WsOptions::new(
                params.get("path").map(String::as_str),
                params.get("host").map(String::as_str),
            )
        });
        let grpc = (network == "grpc").then(|| GrpcOptions {
            service_name: param("serviceName").to_string(),
        });
        let reality = (security == "reality").then(|| RealityOptions {
            public_key: param("pbk").to_string(),
            short_id: param("sid").to_string(),
            sni: param("sni").to_string(),
        });

        Ok(Node::Vless(VLessNode {
            name: name_or_default(url_fragment(&url), NodeKind::Vless),
            server,
            port,
            uuid,
            flow: param("flow").to_string(),
            network,
            tls: security == "tls" || is_truthy(params.get("tls")),
            ws,
            grpc,
            reality,
        }))
    }
}
