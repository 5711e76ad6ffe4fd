//! Conversion options and converter configuration
//!
//! [`ConversionOptions`] and [`AnnotateOptions`] are the per-call value objects the
//! pipeline consumes. [`OptionsBag`] is their string form as it arrives from a query
//! string, and [`ConverterConfig`] is the TOML file the command-line front end reads.

pub mod util;

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generator::Target;
use crate::generator::helpers::{expand_tilde, fetch_text};

// ============================================================================
// Per-call Options
// ============================================================================

/// Options consumed by the target encoders.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Propagate the UDP relay flag into encoders
    pub udp: bool,
    /// Propagate the insecure-TLS flag into encoders
    pub skip_cert: bool,
    /// Rule preset id for the structured-text targets
    pub rule_preset: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            udp: true,
            skip_cert: false,
            rule_preset: None,
        }
    }
}

/// Options consumed by the annotation stage.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Prefix names with a geographic flag
    pub emoji: bool,
    /// Sort nodes by name
    pub sort: bool,
    /// Keep only nodes whose name contains one of these keywords
    pub include: Vec<String>,
    /// Drop nodes whose name contains one of these keywords
    pub exclude: Vec<String>,
    /// Ordered `(pattern, replacement)` rename rules
    pub rename: Vec<(String, String)>,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            emoji: true,
            sort: false,
            include: Vec::new(),
            exclude: Vec::new(),
            rename: Vec::new(),
        }
    }
}

// ============================================================================
// Options Bag
// ============================================================================

/// The caller-facing options bag in string form.
///
/// Every field is optional; missing fields take the documented defaults when the
/// bag is split with [`OptionsBag::into_options`].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionsBag {
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub udp: Option<String>,
    #[serde(default, alias = "skipCert", alias = "skip_cert")]
    pub scert: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    /// Pipe-delimited keyword list
    #[serde(default)]
    pub include: Option<String>,
    /// Pipe-delimited keyword list
    #[serde(default)]
    pub exclude: Option<String>,
    /// Newline-delimited `from->to` rules
    #[serde(default)]
    pub rename: Option<String>,
    #[serde(default, rename = "rulePreset", alias = "rule_preset")]
    pub rule_preset: Option<String>,
}

impl OptionsBag {
    /// Parses an options bag from a URL query string such as
    /// `emoji=1&udp=0&include=HK|JP`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut bag = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "emoji" => bag.emoji = value,
                "udp" => bag.udp = value,
                "scert" | "skipCert" | "skip_cert" => bag.scert = value,
                "sort" => bag.sort = value,
                "include" => bag.include = value,
                "exclude" => bag.exclude = value,
                "rename" => bag.rename = value,
                "rulePreset" | "rule_preset" => bag.rule_preset = value,
                other => debug!("Ignoring unknown option '{}'", other),
            }
        }
        bag
    }

    /// Splits the bag into annotation and conversion options.
    pub fn into_options(self) -> (AnnotateOptions, ConversionOptions) {
        let annotate = AnnotateOptions {
            emoji: parse_flag(self.emoji.as_deref(), true),
            sort: parse_flag(self.sort.as_deref(), false),
            include: split_keywords(self.include.as_deref()),
            exclude: split_keywords(self.exclude.as_deref()),
            rename: parse_rename_rules(self.rename.as_deref().unwrap_or("")),
        };
        let conversion = ConversionOptions {
            udp: parse_flag(self.udp.as_deref(), true),
            skip_cert: parse_flag(self.scert.as_deref(), false),
            rule_preset: self
                .rule_preset
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        };
        (annotate, conversion)
    }
}

/// Parses a boolean flag, returning `default` for absent or unrecognised values.
pub fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "on" | "yes") => true,
        Some("0" | "false" | "off" | "no") => false,
        _ => default,
    }
}

/// Splits a pipe-delimited keyword list, dropping empty keywords.
pub fn split_keywords(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split('|')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses newline-delimited `from->to` rename rules.
///
/// Lines without `->` are ignored. Anything after a second `->` is discarded.
pub fn parse_rename_rules(value: &str) -> Vec<(String, String)> {
    value
        .lines()
        .filter(|line| line.contains("->"))
        .filter_map(|line| {
            let mut parts = line.split("->");
            let from = parts.next()?.trim();
            let to = parts.next().unwrap_or("").trim();
            if from.is_empty() {
                return None;
            }
            Some((from.to_string(), to.to_string()))
        })
        .collect()
}

// ============================================================================
// Converter Config
// ============================================================================

/// Converter configuration parsed from a TOML file
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConverterConfig {
    /// Subscription file path or URL (required)
    pub subscription: String,

    /// Target client id, e.g. "clash" or "singbox" (required)
    pub target: String,

    /// Output file path, default "./out/config.<extension of target>"
    #[serde(default)]
    pub output: Option<String>,

    /// Prefix node names with a geographic flag
    #[serde(default = "default_true")]
    pub emoji: bool,

    /// Emit the UDP relay flag
    #[serde(default = "default_true")]
    pub udp: bool,

    /// Skip TLS certificate verification in generated configs
    #[serde(default, alias = "scert")]
    pub skip_cert: bool,

    /// Sort nodes by name
    #[serde(default)]
    pub sort: bool,

    /// Pipe-delimited keywords; only matching nodes are kept
    #[serde(default)]
    pub include: String,

    /// Pipe-delimited keywords; matching nodes are dropped
    #[serde(default)]
    pub exclude: String,

    /// Newline-delimited `from->to` rename rules
    #[serde(default)]
    pub rename: String,

    /// Rule preset id for clash-family targets
    #[serde(default)]
    pub rule_preset: Option<String>,
}

impl ConverterConfig {
    /// Parse converter config from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ConverterConfig =
            toml::from_str(content).context("Failed to parse converter config TOML")?;

        if config.subscription.trim().is_empty() {
            bail!("A subscription path or URL is required");
        }

        Target::from_str(&config.target)
            .map_err(|e| anyhow!("Invalid target: {}: {}", config.target, e))?;

        Ok(config)
    }

    /// Load converter config from file path
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read converter config from {:?}", path))?;
        Self::from_toml(&content)
    }

    /// Load converter config from file path or URL
    pub async fn load(path_or_url: &str) -> Result<Self> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            let content = fetch_text(path_or_url).await?;
            Self::from_toml(&content)
        } else {
            let expanded = expand_tilde(path_or_url);
            Self::from_file(Path::new(&expanded)).await
        }
    }

    /// Get the parsed target.
    pub fn get_target(&self) -> Result<Target> {
        Target::from_str(&self.target).map_err(|e| anyhow!("Invalid target: {}", e))
    }

    /// Output path, defaulting to `./out/config.<ext>` for the target.
    pub fn output_path(&self) -> Result<String> {
        match &self.output {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(format!("./out/config.{}", self.get_target()?.extension())),
        }
    }

    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            emoji: self.emoji,
            sort: self.sort,
            include: split_keywords(Some(&self.include)),
            exclude: split_keywords(Some(&self.exclude)),
            rename: parse_rename_rules(&self.rename),
        }
    }

    pub fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            udp: self.udp,
            skip_cert: self.skip_cert,
            rule_preset: self.rule_preset.clone().filter(|p| !p.is_empty()),
        }
    }
}

fn default_true() -> bool {
    true
}
