//! Generator utility functions
//!
//! Path expansion and the I/O the command-line front end needs around the pure
//! conversion pipeline: reading a subscription from disk or over HTTP, and
//! writing the encoded payload.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::get_version;

// ============================================================================
// Path Utilities
// ============================================================================

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = dirs_home()
    {
        return path.replacen("~", &home, 1);
    }
    path.to_string()
}

/// Get home directory path
pub fn dirs_home() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok()
    }
}

/// Whether a source string names a remote resource
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

// ============================================================================
// HTTP Utilities
// ============================================================================

/// Fetch text content from a URL
pub async fn fetch_text(url: &str) -> Result<String> {
    debug!("Fetching URL: {}", url);

    let client = reqwest::Client::builder()
        .user_agent(format!("subshift/{}", get_version()))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch URL: {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP request failed with status {}: {}", status, url);
    }

    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from: {}", url))?;

    Ok(text)
}

// ============================================================================
// Source / Output
// ============================================================================

/// Reads subscription text from a URL or a local path
pub async fn read_source(source: &str) -> Result<String> {
    if is_remote(source) {
        info!("Fetching subscription from {}", source);
        return fetch_text(source).await;
    }

    let expanded = expand_tilde(source);
    info!("Reading subscription from {}", expanded);
    tokio::fs::read_to_string(&expanded)
        .await
        .with_context(|| format!("Failed to read subscription from {}", expanded))
}

/// Writes a payload, creating parent directories as needed
pub async fn write_output(path: &str, content: &str) -> Result<()> {
    let expanded = expand_tilde(path);
    let path = Path::new(&expanded);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write output to {:?}", path))?;

    info!("Output written to {:?} ({} bytes)", path, content.len());
    Ok(())
}
