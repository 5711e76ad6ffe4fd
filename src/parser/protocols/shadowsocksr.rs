//! ShadowsocksR protocol parser
//!
//! Format: ssr://URLSAFE_BASE64(host:port:protocol:method:obfs:URLSAFE_BASE64(password)/?params)
//!
//! `protoparam`, `obfsparam` and `remarks` are themselves URL-safe Base64.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use tracing::trace;

use crate::node::{Node, NodeKind, ShadowsocksRNode, name_or_default};
use crate::parser::base64::decode_base64_str;

use super::{ProtocolParser, parse_port};

// ============================================================================
// ShadowsocksR Parser
// ============================================================================

/// Parser for ShadowsocksR (ssr://) URIs
///
/// Hosts containing `:` (IPv6 literals) are rejected rather than guessed at.
pub struct ShadowsocksRParser;

impl ProtocolParser for ShadowsocksRParser {
    fn scheme(&self) -> &str {
        "ssr"
    }

    fn parse(&self, uri: &str) -> Result<Node> {
        trace!("Parsing ShadowsocksR URI");
        let encoded = uri
            .trim()
            .strip_prefix("ssr://")
            .ok_or_else(|| anyhow!("Invalid SSR URI: missing ssr:// prefix"))?;

        let decoded = decode_base64_str(encoded).context("Failed to decode SSR URI")?;

        let (main, query) = match decoded.split_once('?') {
            Some((main, query)) => (main.trim_end_matches('/'), Some(query)),
            None => (decoded.trim_end_matches('/'), None),
        };

        let fields: Vec<&str> = main.split(':').collect();
        if fields.len() < 6 {
            bail!("Invalid SSR URI: expected 6 fields, found {}", fields.len());
        }
        if fields.len() > 6 {
            bail!("Invalid SSR URI: host literals containing ':' are not supported");
        }

        let server = fields[0].to_string();
        if server.is_empty() {
            bail!("Invalid SSR URI: empty host");
        }
        let port = parse_port(fields[1])?;
        let password =
            decode_base64_str(fields[5]).context("Failed to decode SSR password")?;

        let params = query.map(parse_params).unwrap_or_default();
        let param = |key: &str| -> String {
            params
                .get(key)
                .and_then(|v| decode_base64_str(v).ok())
                .unwrap_or_default()
        };

        let remarks = param("remarks");
        let name = name_or_default(Some(remarks), NodeKind::Ssr);

        Ok(Node::Ssr(ShadowsocksRNode {
            name,
            server,
            port,
            method: fields[3].to_string(),
            password,
            protocol: fields[2].to_string(),
            protocol_param: param("protoparam"),
            obfs: fields[4].to_string(),
            obfs_param: param("obfsparam"),
        }))
    }
}

/// Splits `a=1&b=2` without percent-decoding; SSR values are Base64, not URL-encoded
fn parse_params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
