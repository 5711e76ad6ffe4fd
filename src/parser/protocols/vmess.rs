//! VMess protocol parser
//!
//! This module provides parsing for VMess (vmess://) URIs.
//! VMess URIs are Base64 encoded JSON records containing connection details.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::trace;

use crate::node::{Node, NodeKind, VMessNode, WsOptions, name_or_default};
use crate::parser::base64::decode_base64_str;

use super::ProtocolParser;

// ============================================================================
// VMess Parser
// ============================================================================

/// Parser for VMess (vmess://) URIs
///
/// vmess://BASE64({ "v": "2", "ps": "name", "add": "host", "port": 443, ... })
pub struct VMessParser;

/// VMess URI JSON structure
#[derive(Deserialize, Debug)]
struct VMessJson {
    /// Remark/name
    #[serde(default)]
    ps: String,
    /// Server address
    add: String,
    /// Server port (can be string or number)
    #[serde(deserialize_with = "deserialize_port")]
    port: u16,
    /// UUID
    id: String,
    /// Alter ID (can be string or number)
    #[serde(default, deserialize_with = "deserialize_option_u32")]
    aid: Option<u32>,
    /// Network type (tcp, ws, etc.)
    #[serde(default)]
    net: Option<String>,
    /// TLS setting
    #[serde(default)]
    tls: Option<String>,
    /// WebSocket host
    #[serde(default)]
    host: Option<String>,
    /// WebSocket path
    #[serde(default)]
    path: Option<String>,
}

impl ProtocolParser for VMessParser {
    fn scheme(&self) -> &str {
        "vmess"
    }

    fn parse(&self, uri: &str) -> Result<Node> {
        let uri = uri.trim();
        trace!("Parsing VMess URI");

        let encoded = uri
            .strip_prefix("vmess://")
            .ok_or_else(|| anyhow!("Invalid VMess URI: missing vmess:// prefix"))?;

        let decoded = decode_base64_str(encoded).context("Failed to decode VMess URI")?;
        trace!("Decoded VMess JSON: {}", decoded);

        let json: VMessJson =
            serde_json::from_str(&decoded).context("Failed to parse VMess JSON")?;

        if json.id.is_empty() {
            anyhow::bail!("VMess URI missing id");
        }
        if json.port == 0 {
            anyhow::bail!("VMess URI has invalid port 0");
        }

        let network = json
            .net
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "tcp".to_string());
        let ws = (network == "ws")
            .then(|| WsOptions::new(json.path.as_deref(), json.host.as_deref()));

        Ok(Node::Vmess(VMessNode {
            name: name_or_default(Some(json.ps), NodeKind::Vmess),
            server: json.add,
            port: json.port,
            uuid: json.id,
            alter_id: json.aid.unwrap_or(0),
            network,
            tls: json.tls.as_deref() == Some("tls"),
            ws,
        }))
    }
}

// ============================================================================
// Deserialization Helpers
// ============================================================================

/// Custom deserializer for port (handles both string and number)
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        String(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => Ok(n),
        PortValue::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Custom deserializer for optional u32 (handles both string and number)
///
/// Unparsable strings deserialize to `None`, matching clients that treat a
/// garbage `aid` as 0.
fn deserialize_option_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U32Value {
        Number(u32),
        String(String),
    }

    match Option::<U32Value>::deserialize(deserializer)? {
        Some(U32Value::Number(n)) => Ok(Some(n)),
        Some(U32Value::String(s)) => Ok(s.trim().parse().ok()),
        None => Ok(None),
    }
}
