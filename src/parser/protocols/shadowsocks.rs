//! Shadowsocks protocol parser
//!
//! This module provides parsing for Shadowsocks (ss://) URIs in both the SIP002
//! layout and the legacy whole-link Base64 layout.

use anyhow::{Context, Result, anyhow};
use tracing::trace;

use crate::node::{Node, NodeKind, ShadowsocksNode, name_or_default};
use crate::parser::base64::decode_base64_str;

use super::{ProtocolParser, parse_host_port, parse_port, percent_decode};

// ============================================================================
// Shadowsocks Parser
// ============================================================================

/// Parser for Shadowsocks (ss://) URIs
///
/// - SIP002: ss://BASE64(method:password)@host:port#tag
/// - SIP002 with plain userinfo: ss://method:password@host:port#tag
/// - Legacy: ss://BASE64(method:password@host:port)#tag
pub struct ShadowsocksParser;

impl ProtocolParser for ShadowsocksParser {
    fn scheme(&self) -> &str {
        "ss"
    }

    fn parse(&self, uri: &str) -> Result<Node> {
        let uri = uri.trim();
        trace!("Parsing Shadowsocks URI");

        let without_scheme = uri
            .strip_prefix("ss://")
            .ok_or_else(|| anyhow!("Invalid Shadowsocks URI: missing ss:// prefix"))?;

        // The first '#' starts the remark; a '#' inside an encoded remark is always escaped
        let (main_part, tag) = match without_scheme.find('#') {
            Some(pos) => (
                &without_scheme[..pos],
                Some(percent_decode(&without_scheme[pos + 1..])),
            ),
            None => (without_scheme, None),
        };
        let name = name_or_default(tag, NodeKind::Ss);

        match self.parse_sip002(main_part, &name) {
            Ok(node) => Ok(node),
            Err(e) => {
                trace!("SIP002 parse failed ({}), trying legacy format", e);
                self.parse_legacy(main_part, name)
            }
        }
    }
}

impl ShadowsocksParser {
    /// Parses SIP002 format: BASE64(method:password)@host:port[/?query]
    fn parse_sip002(&self, main_part: &str, name: &str) -> Result<Node> {
        let at_pos = main_part
            .rfind('@')
            .ok_or_else(|| anyhow!("Not a SIP002 URI: missing @ separator"))?;

        let userinfo = &main_part[..at_pos];
        let hostport_and_query = &main_part[at_pos + 1..];

        // Plugin queries are outside the modelled field set and are dropped
        let hostport = hostport_and_query
            .split('?')
            .next()
            .unwrap_or(hostport_and_query)
            .trim_end_matches('/');

        let (server, port) = parse_host_port(hostport)?;
        let (method, password) = self.parse_userinfo(userinfo)?;

        Ok(Node::Ss(ShadowsocksNode {
            name: name.to_string(),
            server,
            port,
            method,
            password,
        }))
    }

    /// Parses legacy format: BASE64(method:password@host:port)
    fn parse_legacy(&self, main_part: &str, name: String) -> Result<Node> {
        let decoded =
            decode_base64_str(main_part).context("Failed to decode legacy Shadowsocks URI")?;

        let at_pos = decoded
            .rfind('@')
            .ok_or_else(|| anyhow!("Invalid legacy Shadowsocks format: missing @"))?;

        let userinfo = &decoded[..at_pos];
        let hostport = &decoded[at_pos + 1..];

        let colon_pos = hostport
            .rfind(':')
            .ok_or_else(|| anyhow!("Invalid legacy Shadowsocks format: missing port"))?;
        let server = hostport[..colon_pos].to_string();
        let port = parse_port(&hostport[colon_pos + 1..])?;

        let (method, password) = split_method_password(userinfo)?;

        Ok(Node::Ss(ShadowsocksNode {
            name,
            server,
            port,
            method,
            password,
        }))
    }

    /// Parses userinfo which can be Base64(method:password) or method:password
    fn parse_userinfo(&self, userinfo: &str) -> Result<(String, String)> {
        let unescaped = percent_decode(userinfo);

        if let Ok(decoded) = decode_base64_str(&unescaped)
            && let Ok(pair) = split_method_password(&decoded)
        {
            return Ok(pair);
        }

        split_method_password(&unescaped)
    }
}

/// Splits `method:password`, requiring both halves to be non-empty
fn split_method_password(userinfo: &str) -> Result<(String, String)> {
    let (method, password) = userinfo
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid Shadowsocks userinfo: missing method:password separator"))?;
    if method.is_empty() || password.is_empty() {
        anyhow::bail!("Invalid Shadowsocks userinfo: empty method or password");
    }
    Ok((method.to_string(), password.to_string()))
}
