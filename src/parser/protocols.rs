//! Link decoders
//!
//! One parser per link scheme, each implementing [`ProtocolParser`] to turn a
//! single trimmed line into a canonical [`Node`]. The [`ProtocolRegistry`]
//! dispatches lines by scheme and turns every per-line failure into omission.

mod hysteria;
mod hysteria2;
mod shadowsocks;
mod shadowsocksr;
mod trojan;
mod tuic;
mod vless;
mod vmess;

pub use hysteria::HysteriaParser;
pub use hysteria2::Hysteria2Parser;
pub use shadowsocks::ShadowsocksParser;
pub use shadowsocksr::ShadowsocksRParser;
pub use trojan::TrojanParser;
pub use tuic::TuicParser;
pub use vless::VLessParser;
pub use vmess::VMessParser;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::{debug, warn};
use url::Url;

use crate::node::Node;

// ============================================================================
// Protocol Parser Trait
// ============================================================================

/// Trait for parsing individual protocol URIs
pub trait ProtocolParser: Send + Sync {
    /// Returns the protocol scheme this parser handles (e.g., "ss", "vmess")
    fn scheme(&self) -> &str;

    /// Parses a URI string into a canonical node
    fn parse(&self, uri: &str) -> Result<Node>;

    /// Checks if this parser can handle the given URI
    fn can_parse(&self, uri: &str) -> bool {
        uri.starts_with(&format!("{}://", self.scheme()))
    }
}

// ============================================================================
// Protocol Registry
// ============================================================================

/// Registry for protocol parsers with dynamic dispatch
#[derive(Default)]
pub struct ProtocolRegistry {
    parsers: HashMap<String, Arc<dyn ProtocolParser>>,
}

impl ProtocolRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Creates a registry with all built-in parsers registered
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ShadowsocksParser));
        registry.register(Arc::new(ShadowsocksRParser));
        registry.register(Arc::new(VMessParser));
        registry.register(Arc::new(VLessParser));
        registry.register(Arc::new(TrojanParser));
        registry.register(Arc::new(HysteriaParser));
        registry.register(Arc::new(Hysteria2Parser::new("hysteria2")));
        registry.register(Arc::new(Hysteria2Parser::new("hy2")));
        registry.register(Arc::new(TuicParser));
        registry
    }

    /// Registers a protocol parser
    pub fn register(&mut self, parser: Arc<dyn ProtocolParser>) {
        self.parsers.insert(parser.scheme().to_string(), parser);
    }

    /// Gets a parser for the given scheme
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn ProtocolParser>> {
        self.parsers.get(scheme)
    }

    /// Parses a URI using the appropriate parser
    ///
    /// The scheme is everything before the first `://` and must match a
    /// registered scheme exactly, so `hysteria2://` never reaches the
    /// `hysteria` parser.
    pub fn parse_uri(&self, uri: &str) -> Result<Node> {
        let scheme = extract_scheme(uri)?;
        debug!("Parsing URI with scheme '{}'", scheme);

        let parser = self
            .parsers
            .get(scheme)
            .ok_or_else(|| anyhow!("No parser registered for scheme: {}", scheme))?;

        let result = parser.parse(uri).and_then(|node| {
            node.validate()?;
            Ok(node)
        });
        match &result {
            Ok(node) => debug!("Successfully parsed {} URI -> node '{}'", scheme, node.name()),
            Err(e) => debug!("Failed to parse {} URI: {}", scheme, e),
        }
        result
    }

    /// Parses multiple URIs from content (one per line)
    pub fn parse_uri_list(&self, content: &str) -> Vec<Result<Node>> {
        let lines: Vec<&str> = content
            .lines()
            .map(|line| line.trim_start_matches('\u{feff}').trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        debug!("Parsing {} URI lines from content", lines.len());

        lines.into_iter().map(|line| self.parse_uri(line)).collect()
    }

    /// Parses multiple URIs, collecting only successful results in source order
    pub fn parse_uri_list_lossy(&self, content: &str) -> Vec<Node> {
        let results = self.parse_uri_list(content);
        let total = results.len();

        let nodes: Vec<Node> = results
            .into_iter()
            .filter_map(|r| match r {
                Ok(node) => Some(node),
                Err(e) => {
                    warn!("Skipping link: {}", e);
                    None
                }
            })
            .collect();

        let success = nodes.len();
        debug!(
            "URI list parsing complete: {} total, {} successful, {} failed",
            total,
            success,
            total - success
        );

        nodes
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses host:port string, handling IPv6 addresses in brackets
pub fn parse_host_port(hostport: &str) -> Result<(String, u16)> {
    // Handle IPv6 addresses: [::1]:8080
    if hostport.starts_with('[') {
        let bracket_end = hostport
            .find(']')
            .ok_or_else(|| anyhow!("Invalid IPv6 address: missing closing bracket"))?;

        let host = hostport[1..bracket_end].to_string();
        let port_str = hostport[bracket_end + 1..]
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("Missing port after IPv6 address"))?;

        return Ok((host, parse_port(port_str)?));
    }

    let colon_pos = hostport
        .rfind(':')
        .ok_or_else(|| anyhow!("Invalid host:port format: missing colon"))?;

    let host = hostport[..colon_pos].to_string();
    if host.is_empty() {
        bail!("Invalid host:port format: empty host");
    }
    let port = parse_port(&hostport[colon_pos + 1..])?;

    Ok((host, port))
}

/// Parses a port number, rejecting 0 and anything outside 1-65535
pub fn parse_port(port: &str) -> Result<u16> {
    let port: u16 = port
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid port number: {}", port))?;
    if port == 0 {
        bail!("Invalid port number: 0");
    }
    Ok(port)
}

/// Extracts the scheme from a URI
pub fn extract_scheme(uri: &str) -> Result<&str> {
    if !uri.contains("://") {
        bail!("Invalid URI: missing scheme separator ://");
    }
    uri.split("://")
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Invalid URI: missing scheme"))
}

/// Percent-decodes a URI component, keeping the raw text when it is not valid UTF-8
pub fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .unwrap_or_else(|_| s.into())
        .into_owned()
}

/// Returns the decoded `#fragment` of a parsed URL, if present and non-empty
pub fn url_fragment(url: &Url) -> Option<String> {
    url.fragment()
        .map(percent_decode)
        .filter(|f| !f.is_empty())
}

/// Returns the host of a parsed URL with IPv6 brackets removed
pub fn url_host(url: &Url, scheme: &str) -> Result<String> {
    let host = url
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
        .filter(|h| !h.is_empty())
        .ok_or_else(|| anyhow!("{} URI missing host", scheme))?;
    Ok(host.to_string())
}

/// Returns the explicit port of a parsed URL
pub fn url_port(url: &Url, scheme: &str) -> Result<u16> {
    match url.port() {
        Some(0) => bail!("{} URI has invalid port 0", scheme),
        Some(port) => Ok(port),
        None => bail!("{} URI missing port", scheme),
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Interprets `1` / `true` query values as enabled
pub fn is_truthy(value: Option<&String>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
