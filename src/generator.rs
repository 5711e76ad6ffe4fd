//! Target encoders
//!
//! This module maps a target client id onto the encoder family that serves it
//! and exposes the conversion call `(nodes, target id, options) -> payload`.
//!
//! | Family | Targets |
//! |---|---|
//! | structured text (YAML) | clash, clashmeta, stash |
//! | line text | surge, surfboard, quantumultx, loon |
//! | Base64 link bundle | shadowrocket, v2rayn, v2rayng |
//! | embedded JSON | singbox, nekobox |

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::ConversionOptions;
use crate::node::Node;

// Sub-modules
pub mod clash;
pub mod helpers;
pub mod links;
pub mod loon;
pub mod quantumultx;
pub mod singbox;
pub mod surge;

// Re-exports
pub use helpers::{expand_tilde, fetch_text, read_source, write_output};

// ============================================================================
// Target
// ============================================================================

/// A client application family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Clash,
    ClashMeta,
    Stash,
    Surge,
    Surfboard,
    QuantumultX,
    Loon,
    Shadowrocket,
    V2rayN,
    V2rayNG,
    SingBox,
    NekoBox,
}

impl Target {
    /// Every supported target, in display order
    pub const ALL: [Target; 12] = [
        Target::Clash,
        Target::ClashMeta,
        Target::Stash,
        Target::Surge,
        Target::Surfboard,
        Target::QuantumultX,
        Target::Loon,
        Target::Shadowrocket,
        Target::V2rayN,
        Target::V2rayNG,
        Target::SingBox,
        Target::NekoBox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Clash => "clash",
            Target::ClashMeta => "clashmeta",
            Target::Stash => "stash",
            Target::Surge => "surge",
            Target::Surfboard => "surfboard",
            Target::QuantumultX => "quantumultx",
            Target::Loon => "loon",
            Target::Shadowrocket => "shadowrocket",
            Target::V2rayN => "v2rayn",
            Target::V2rayNG => "v2rayng",
            Target::SingBox => "singbox",
            Target::NekoBox => "nekobox",
        }
    }

    /// MIME type an HTTP front end should serve the payload with
    pub fn content_type(&self) -> &'static str {
        match self {
            Target::Clash | Target::ClashMeta | Target::Stash => "text/yaml",
            Target::SingBox | Target::NekoBox => "application/json",
            _ => "text/plain",
        }
    }

    /// File extension for saved payloads
    pub fn extension(&self) -> &'static str {
        match self {
            Target::Clash | Target::ClashMeta | Target::Stash => "yaml",
            Target::Surge | Target::Surfboard | Target::Loon => "conf",
            Target::SingBox | Target::NekoBox => "json",
            Target::QuantumultX | Target::Shadowrocket | Target::V2rayN | Target::V2rayNG => {
                "txt"
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a target id is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTargetError(pub String);

impl fmt::Display for UnknownTargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported: Vec<&str> = Target::ALL.iter().map(Target::as_str).collect();
        write!(
            f,
            "unknown target '{}', supported: {}",
            self.0,
            supported.join(", ")
        )
    }
}

impl std::error::Error for UnknownTargetError {}

impl FromStr for Target {
    type Err = UnknownTargetError;

    /// Target ids are matched exactly, lowercase
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| UnknownTargetError(s.to_string()))
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Converts nodes for a target id, returning an empty string for unknown ids
pub fn convert(nodes: &[Node], target_id: &str, options: &ConversionOptions) -> String {
    match Target::from_str(target_id) {
        Ok(target) => encode(nodes, target, options),
        Err(e) => {
            warn!("{}", e);
            String::new()
        }
    }
}

/// Encodes nodes with the encoder serving `target`
pub fn encode(nodes: &[Node], target: Target, options: &ConversionOptions) -> String {
    debug!("Encoding {} nodes for {}", nodes.len(), target);
    match target {
        Target::Clash | Target::ClashMeta | Target::Stash => clash::encode(nodes, options),
        Target::Surge | Target::Surfboard => surge::encode(nodes, options),
        Target::QuantumultX => quantumultx::encode(nodes, options),
        Target::Loon => loon::encode(nodes, options),
        Target::Shadowrocket | Target::V2rayN | Target::V2rayNG => links::encode_bundle(nodes),
        Target::SingBox | Target::NekoBox => singbox::encode(nodes, options),
    }
}
