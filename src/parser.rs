//! Subscription parsing module
//!
//! This module provides functionality for:
//! - Unwrapping subscriptions delivered as one Base64 blob
//! - Splitting the payload into link lines
//! - Dispatching each line to the decoder registered for its scheme
//!
//! Nothing here fails: unparsable lines are logged and dropped.

pub mod base64;
pub mod protocols;

use tracing::{debug, trace};

use crate::node::Node;

use self::base64::decode_base64_str;
use self::protocols::ProtocolRegistry;

/// Marker every supported link carries
const SCHEME_MARKER: &str = "://";

/// UTF-8 byte order mark some providers prepend
const BOM: char = '\u{feff}';

// ============================================================================
// Unified Subscription Parsing
// ============================================================================

/// Parses subscription content into nodes, preserving source order
pub fn parse_subscription(content: &str) -> Vec<Node> {
    let registry = ProtocolRegistry::with_builtin_parsers();
    parse_subscription_with_registry(content, &registry)
}

/// Parses subscription content using a custom registry
pub fn parse_subscription_with_registry(content: &str, registry: &ProtocolRegistry) -> Vec<Node> {
    let payload = unwrap_payload(content);
    let nodes = registry.parse_uri_list_lossy(&payload);
    debug!("Parsed {} nodes from subscription", nodes.len());
    nodes
}

/// Returns the Base64-decoded payload when it holds links, else the input as-is
pub fn unwrap_payload(content: &str) -> String {
    let content = content.trim_start_matches(BOM);
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match decode_base64_str(trimmed) {
        Ok(decoded) if decoded.contains(SCHEME_MARKER) => {
            debug!(
                "Subscription is Base64 wrapped ({} -> {} bytes)",
                trimmed.len(),
                decoded.len()
            );
            decoded
        }
        Ok(_) => {
            trace!("Payload decodes as Base64 but carries no links, using raw text");
            content.to_string()
        }
        Err(_) => content.to_string(),
    }
}
