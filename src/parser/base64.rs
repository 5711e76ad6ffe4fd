//! Base64 helpers
//!
//! Subscription payloads and several link schemes wrap their content in Base64,
//! and providers are inconsistent about the alphabet and padding. Decoding tries
//! every common variant; encoding always produces one canonical form per use.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use tracing::trace;

// ============================================================================
// Base64 Decoding
// ============================================================================

/// Decodes Base64 content, trying multiple variants
///
/// Attempts to decode the content using:
/// 1. Standard Base64
/// 2. URL-safe Base64
/// 3. URL-safe Base64 without padding
/// 4. Standard/URL-safe with padding added
///
/// Whitespace in the input is automatically removed before decoding.
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
    // Remove all whitespace (handles line breaks within Base64)
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    trace!(
        "Attempting Base64 decode, cleaned length: {} bytes",
        cleaned.len()
    );

    if let Ok(decoded) = STANDARD.decode(&cleaned) {
        trace!("Decoded using standard Base64");
        return Ok(decoded);
    }

    if let Ok(decoded) = URL_SAFE.decode(&cleaned) {
        trace!("Decoded using URL-safe Base64");
        return Ok(decoded);
    }

    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(&cleaned) {
        trace!("Decoded using URL-safe Base64 without padding");
        return Ok(decoded);
    }

    let padded = add_base64_padding(&cleaned);
    if let Ok(decoded) = STANDARD.decode(&padded) {
        trace!("Decoded using standard Base64 with added padding");
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&padded) {
        trace!("Decoded using URL-safe Base64 with added padding");
        return Ok(decoded);
    }

    bail!("Failed to decode Base64 content")
}

/// Decodes Base64 content into a UTF-8 string
pub fn decode_base64_str(content: &str) -> Result<String> {
    let decoded = decode_base64(content)?;
    String::from_utf8(decoded).context("Decoded Base64 content is not valid UTF-8")
}

/// Adds proper padding to Base64 string if missing
///
/// Strings whose length is `1 mod 4` can never be valid Base64 and are returned
/// with padding anyway; the decoder rejects them.
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}

// ============================================================================
// Base64 Encoding
// ============================================================================

/// Encodes with the standard alphabet and padding
pub fn encode_base64(content: &str) -> String {
    STANDARD.encode(content)
}

/// Encodes with the URL-safe alphabet and no padding
pub fn encode_base64_url_safe(content: &str) -> String {
    URL_SAFE_NO_PAD.encode(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_standard() {
        let encoded = "aGVsbG8gd29ybGQ=";
        let decoded = decode_base64(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_base64_url_safe() {
        let encoded = "aGVsbG8td29ybGQ_";
        assert!(decode_base64(encoded).is_ok());
    }

    #[test]
    fn test_decode_base64_with_linebreaks() {
        let encoded = "aGVs\nbG8g\nd29y\nbGQ=";
        assert_eq!(decode_base64_str(encoded).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_base64_without_padding() {
        let encoded = "aGVsbG8gd29ybGQ";
        assert_eq!(decode_base64_str(encoded).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_base64_empty() {
        let result = decode_base64("");
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert!(decode_base64("not valid base64!!!").is_err());
        assert!(decode_base64("ss://abc@host:1").is_err());
    }

    #[test]
    fn test_decode_base64_str_invalid_utf8() {
        // 0xff 0xfe is not valid UTF-8
        assert!(decode_base64_str("//4=").is_err());
    }

    #[test]
    fn test_add_base64_padding() {
        assert_eq!(add_base64_padding("abcd"), "abcd");
        assert_eq!(add_base64_padding("abc"), "abc=");
        assert_eq!(add_base64_padding("ab"), "ab==");
        assert_eq!(add_base64_padding(""), "");
    }

    #[test]
    fn test_encode_base64_url_safe_has_no_padding() {
        let encoded = encode_base64_url_safe("pw?>");
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(decode_base64_str(&encoded).unwrap(), "pw?>");
    }

    #[test]
    fn test_encode_then_decode_multiline() {
        let original = "ss://abc@host1:1234#node1\nvmess://xyz";
        let encoded = encode_base64(original);
        assert_eq!(decode_base64_str(&encoded).unwrap(), original);
    }
}
