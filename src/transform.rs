//! Node annotation utilities
//!
//! This module provides the display-name stage that runs between parsing and
//! encoding:
//! - Include/exclude keyword filtering
//! - Sorting by name
//! - Geographic flag prefixes chosen from a bilingual keyword table
//! - Regex rename rules

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::AnnotateOptions;
use crate::node::Node;

/// Prefix for names that match no geographic keyword
pub const GLOBE: &str = "🌐";

// ============================================================================
// Pipeline
// ============================================================================

/// Applies every enabled annotation step in order: include, exclude, sort,
/// emoji, rename.
pub fn annotate(nodes: Vec<Node>, options: &AnnotateOptions) -> Vec<Node> {
    let before = nodes.len();

    let mut nodes = filter_include(nodes, &options.include);
    nodes = filter_exclude(nodes, &options.exclude);
    if options.sort {
        sort_by_name(&mut nodes);
    }
    if options.emoji {
        nodes = nodes
            .into_iter()
            .map(|node| {
                let name = add_emoji(node.name());
                node.with_name(name)
            })
            .collect();
    }
    if !options.rename.is_empty() {
        nodes = rename_nodes(nodes, &options.rename);
    }

    debug!("Annotation kept {} of {} nodes", nodes.len(), before);
    nodes
}

// ============================================================================
// Filtering and Sorting
// ============================================================================

/// Keeps nodes whose name contains any keyword. An empty list keeps everything.
pub fn filter_include(nodes: Vec<Node>, keywords: &[String]) -> Vec<Node> {
    if keywords.is_empty() {
        return nodes;
    }
    nodes
        .into_iter()
        .filter(|node| keywords.iter().any(|kw| node.name().contains(kw.as_str())))
        .collect()
}

/// Drops nodes whose name contains any keyword.
pub fn filter_exclude(nodes: Vec<Node>, keywords: &[String]) -> Vec<Node> {
    if keywords.is_empty() {
        return nodes;
    }
    nodes
        .into_iter()
        .filter(|node| !keywords.iter().any(|kw| node.name().contains(kw.as_str())))
        .collect()
}

/// Stable lexicographic sort by display name.
pub fn sort_by_name(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| a.name().cmp(b.name()));
}

// ============================================================================
// Rename
// ============================================================================

/// Applies `(pattern, replacement)` rules to every name, in order.
///
/// Patterns are regular expressions replaced globally; `$1` style group
/// references work in the replacement. Patterns that fail to compile are
/// skipped with a warning.
pub fn rename_nodes(nodes: Vec<Node>, rules: &[(String, String)]) -> Vec<Node> {
    let compiled: Vec<(Regex, String)> = rules
        .iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(re) => Some((re, braced_replacement(replacement))),
            Err(e) => {
                warn!("Skipping invalid rename pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect();

    if compiled.is_empty() {
        return nodes;
    }

    nodes
        .into_iter()
        .map(|node| {
            let mut name = node.name().to_string();
            for (re, replacement) in &compiled {
                name = re.replace_all(&name, replacement.as_str()).into_owned();
            }
            node.with_name(name)
        })
        .collect()
}

/// Rewrites `$N` group references to `${N}` and `$&` to `${0}`.
///
/// The regex crate reads `$1x` as a group named `1x`. Bracing keeps `$1x` as
/// group 1 followed by `x`. At most two digits form a group number.
fn braced_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some(d) if d.is_ascii_digit() => {
                let mut digits = String::new();
                while digits.len() < 2 {
                    match chars.peek() {
                        Some(d) if d.is_ascii_digit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push_str("${");
                out.push_str(&digits);
                out.push('}');
            }
            _ => out.push('$'),
        }
    }
    out
}

// ============================================================================
// Geographic Emoji
// ============================================================================

/// How a keyword is matched against a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    /// Full place name, ASCII case-insensitive substring
    Name,
    /// Two-letter code, case-sensitive, not adjacent to another ASCII letter
    Code,
}

#[derive(Debug)]
struct GeoKeyword {
    keyword: String,
    flag: String,
    mode: MatchMode,
}

/// `(country code, place names, codes matched on word boundaries)`
const GEO_TABLE: &[(&str, &[&str], &[&str])] = &[
    ("HK", &["香港", "Hong Kong", "HongKong"], &["HK"]),
    ("TW", &["台湾", "台灣", "Taiwan", "台北", "Taipei"], &["TW"]),
    ("JP", &["日本", "Japan", "东京", "Tokyo", "大阪", "Osaka"], &["JP"]),
    ("SG", &["新加坡", "Singapore", "狮城"], &["SG"]),
    (
        "US",
        &["美国", "美國", "United States", "America", "洛杉矶", "Los Angeles", "硅谷"],
        &["US", "USA"],
    ),
    ("KR", &["韩国", "韓國", "Korea", "首尔", "Seoul"], &["KR"]),
    ("GB", &["英国", "United Kingdom", "Britain", "伦敦", "London"], &["UK", "GB"]),
    ("DE", &["德国", "Germany", "法兰克福", "Frankfurt"], &["DE"]),
    ("FR", &["法国", "France", "巴黎", "Paris"], &["FR"]),
    ("RU", &["俄罗斯", "Russia", "莫斯科", "Moscow"], &["RU"]),
    ("CA", &["加拿大", "Canada"], &["CA"]),
    ("AU", &["澳大利亚", "澳洲", "Australia", "悉尼", "Sydney"], &["AU"]),
    ("NL", &["荷兰", "Netherlands", "阿姆斯特丹", "Amsterdam"], &["NL"]),
    ("IN", &["印度", "India", "孟买", "Mumbai"], &[]),
    ("TR", &["土耳其", "Turkey", "Türkiye"], &["TR"]),
    ("BR", &["巴西", "Brazil"], &["BR"]),
    ("AR", &["阿根廷", "Argentina"], &[]),
    ("MY", &["马来西亚", "Malaysia"], &[]),
    ("TH", &["泰国", "Thailand"], &[]),
    ("VN", &["越南", "Vietnam"], &[]),
    ("PH", &["菲律宾", "Philippines"], &[]),
    ("ID", &["印尼", "印度尼西亚", "Indonesia"], &[]),
];

/// Keyword table ordered longest keyword first; ties keep table order.
static GEO_KEYWORDS: LazyLock<Vec<GeoKeyword>> = LazyLock::new(|| {
    let mut keywords = Vec::new();
    for (code, names, codes) in GEO_TABLE {
        let Some(flag) = country_code_to_flag(code) else {
            continue;
        };
        for name in *names {
            keywords.push(GeoKeyword {
                keyword: name.to_lowercase(),
                flag: flag.clone(),
                mode: MatchMode::Name,
            });
        }
        for alias in *codes {
            keywords.push(GeoKeyword {
                keyword: alias.to_string(),
                flag: flag.clone(),
                mode: MatchMode::Code,
            });
        }
    }
    keywords.sort_by_key(|k| std::cmp::Reverse(k.keyword.chars().count()));
    keywords
});

/// Prefixes a name with the flag of the first (longest) matching keyword, or
/// with [`GLOBE`] when nothing matches.
///
/// Names that already carry a flag are returned unchanged.
pub fn add_emoji(name: &str) -> String {
    if extract_country_code(name).is_some() || name.starts_with(GLOBE) {
        return name.to_string();
    }

    match find_flag(name) {
        Some(flag) => format!("{} {}", flag, name),
        None => format!("{} {}", GLOBE, name),
    }
}

/// Finds the flag for a name using the longest-match-first keyword scan.
pub fn find_flag(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    GEO_KEYWORDS
        .iter()
        .find(|k| match k.mode {
            MatchMode::Name => lowered.contains(&k.keyword),
            MatchMode::Code => contains_code(name, &k.keyword),
        })
        .map(|k| k.flag.as_str())
}

/// Whether `code` occurs in `text` with no ASCII letter directly on either side.
fn contains_code(text: &str, code: &str) -> bool {
    text.match_indices(code).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphabetic())
            && !after.is_some_and(|c| c.is_ascii_alphabetic())
    })
}

// ============================================================================
// Country Code / Flag Conversion
// ============================================================================

/// Extract a country code from a flag emoji in a string.
///
/// Flag emojis are composed of two Regional Indicator Symbols, U+1F1E6 (A)
/// through U+1F1FF (Z). Returns the first pair found as a two-letter code.
pub fn extract_country_code(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();

    for pair in chars.windows(2) {
        if is_regional_indicator(pair[0]) && is_regional_indicator(pair[1]) {
            let letter1 = regional_indicator_to_letter(pair[0])?;
            let letter2 = regional_indicator_to_letter(pair[1])?;
            return Some(format!("{}{}", letter1, letter2));
        }
    }

    None
}

/// Check if a character is a Regional Indicator Symbol (U+1F1E6 to U+1F1FF).
fn is_regional_indicator(c: char) -> bool {
    let code = c as u32;
    (0x1F1E6..=0x1F1FF).contains(&code)
}

/// Convert a Regional Indicator Symbol to its corresponding letter (A-Z).
fn regional_indicator_to_letter(c: char) -> Option<char> {
    let code = c as u32;
    if (0x1F1E6..=0x1F1FF).contains(&code) {
        let letter_offset = code - 0x1F1E6;
        Some((b'A' + letter_offset as u8) as char)
    } else {
        None
    }
}

/// Convert an ASCII letter (A-Z) to its corresponding Regional Indicator Symbol.
fn letter_to_regional_indicator(c: char) -> Option<char> {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        let code = 0x1F1E6 + (upper as u32 - 'A' as u32);
        char::from_u32(code)
    } else {
        None
    }
}

/// Convert a two-letter country code to a flag emoji, e.g. "JP" to "🇯🇵".
pub fn country_code_to_flag(code: &str) -> Option<String> {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() != 2 {
        return None;
    }

    let ri1 = letter_to_regional_indicator(chars[0])?;
    let ri2 = letter_to_regional_indicator(chars[1])?;

    Some(format!("{}{}", ri1, ri2))
}
