//! Trojan protocol parser
//!
//! This module provides parsing for Trojan (trojan://) URIs.
//! Format: trojan://password@host:port?params#tag

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use tracing::trace;
use url::Url;

use crate::node::{Node, NodeKind, TrojanNode, name_or_default};

use super::{ProtocolParser, percent_decode, split_list, url_fragment, url_host, url_port};

// ============================================================================
// Trojan Parser
// ============================================================================

/// Parser for Trojan (trojan://) URIs
///
/// The SNI comes from `sni`, then `peer`, then the server host itself.
pub struct TrojanParser;

impl ProtocolParser for TrojanParser {
    fn scheme(&self) -> &str {
        "trojan"
    }

    fn parse(&self, uri: &str) -> Result<Node> {
        trace!("Parsing Trojan URI");
        let url = Url::parse(uri).map_err(|e| anyhow!("Failed to parse Trojan URI: {}", e))?;

        let password = percent_decode(url.username());
        if password.is_empty() {
            bail!("Trojan URI missing password");
        }

        let server = url_host(&url, "Trojan")?;
        let port = url_port(&url, "Trojan")?;

        // Parse query parameters
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

        let sni = ["sni", "peer"]
            .iter()
            .filter_map(|key| params.get(*key))
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| server.clone());

        let alpn = params.get("alpn").map(|s| split_list(s)).unwrap_or_default();

        Ok(Node::Trojan(TrojanNode {
            name: name_or_default(url_fragment(&url), NodeKind::Trojan),
            server,
            port,
            password,
            sni,
            alpn,
        }))
    }
}
