//! End-to-end tests for the subscription conversion pipeline.
//!
//! These tests drive the public API the way the command-line front end does:
//! subscription text in, decoded nodes, annotation, and target payloads out.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subshift::config::{AnnotateOptions, ConversionOptions, OptionsBag};
use subshift::generator::{self, Target, links};
use subshift::node::{Node, NodeKind};
use subshift::parser::parse_subscription;
use subshift::transform::{self, GLOBE};

const MIXED: &str = "\
ss://YWVzLTI1Ni1nY206cHc@1.2.3.4:8388#Test
trojan://secret@trojan.example.com:443?sni=sni.example.com&alpn=h2,http/1.1#%E9%A6%99%E6%B8%AF%20Trojan
vless://b831381d-6324-4d53-ad4f-8cda48b30811@vless.example.com:443?type=ws&security=tls&path=%2Fws&host=cdn.example.com#JP%20VLESS
vless://b831381d-6324-4d53-ad4f-8cda48b30811@reality.example.com:443?type=tcp&security=reality&pbk=pubkey&sid=ab12&sni=www.microsoft.com&flow=xtls-rprx-vision#Reality
hysteria://hy.example.com:443?auth=token&upmbps=20&downmbps=80&obfs=xplus&peer=hy.example.com#Hysteria
hysteria2://pw@hy2.example.com:8443?obfs=salamander&obfs-password=op&sni=hy2.example.com&insecure=1#Singapore%20Hy2
tuic://b831381d-6324-4d53-ad4f-8cda48b30811:pw@tuic.example.com:443?congestion_control=bbr&alpn=h3&sni=tuic.example.com#TUIC
";

fn vmess_link() -> String {
    let json = r#"{"v":"2","ps":"US VMess","add":"vm.example.com","port":"443","id":"b831381d-6324-4d53-ad4f-8cda48b30811","aid":"0","net":"ws","type":"none","host":"cdn.example.com","path":"/ray","tls":"tls"}"#;
    format!("vmess://{}", STANDARD.encode(json))
}

fn ssr_link() -> String {
    let b64 = |s: &str| base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(s);
    let body = format!(
        "ssr.example.com:8989:auth_aes128_md5:aes-128-cfb:tls1.2_ticket_auth:{}/?obfsparam={}&remarks={}",
        b64("pw"),
        b64("bing.com"),
        b64("SSR Node HK")
    );
    format!("ssr://{}", b64(&body))
}

fn all_kinds_subscription() -> String {
    format!("{}{}\n{}\n", MIXED, vmess_link(), ssr_link())
}

// ============================================================================
// Splitter
// ============================================================================

#[test]
fn test_empty_and_unknown_input() {
    assert!(parse_subscription("").is_empty());
    assert!(parse_subscription("not-a-known-scheme://x").is_empty());
}

#[test]
fn test_every_kind_is_decoded_in_order() {
    let nodes = parse_subscription(&all_kinds_subscription());
    let kinds: Vec<NodeKind> = nodes.iter().map(Node::kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Ss,
            NodeKind::Trojan,
            NodeKind::Vless,
            NodeKind::Vless,
            NodeKind::Hysteria,
            NodeKind::Hysteria2,
            NodeKind::Tuic,
            NodeKind::Vmess,
            NodeKind::Ssr,
        ]
    );
}

#[test]
fn test_base64_wrapping_preserves_node_count() {
    let raw = all_kinds_subscription();
    let wrapped = STANDARD.encode(&raw);
    assert_eq!(
        parse_subscription(&wrapped).len(),
        parse_subscription(&raw).len()
    );
}

#[test]
fn test_broken_lines_do_not_abort_batch() {
    let content = format!("vmess://%%%\n{}\nssr://AAAA\ntrojan://@:0\n", MIXED);
    assert_eq!(parse_subscription(&content).len(), 7);
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_link_round_trip_for_every_kind() {
    let nodes = parse_subscription(&all_kinds_subscription());
    assert_eq!(nodes.len(), 9);

    for node in &nodes {
        let link = links::encode_link(node).unwrap();
        let decoded = parse_subscription(&link);
        assert_eq!(decoded.len(), 1, "link did not decode: {}", link);
        let decoded = &decoded[0];

        assert_eq!(decoded.kind(), node.kind());
        assert_eq!(decoded.server(), node.server());
        assert_eq!(decoded.port(), node.port());
        assert_eq!(decoded, node, "round trip changed {}", node.name());
    }
}

#[test]
fn test_bundle_decodes_to_same_nodes() {
    let nodes = parse_subscription(&all_kinds_subscription());
    let bundle = generator::convert(&nodes, "v2rayn", &ConversionOptions::default());
    assert_eq!(parse_subscription(&bundle), nodes);
}

// ============================================================================
// Encoders
// ============================================================================

#[test]
fn test_example_ss_to_clash() {
    let link = format!("ss://{}@1.2.3.4:8388#Test", STANDARD.encode("aes-256-gcm:pw"));
    let nodes = parse_subscription(&link);
    assert_eq!(nodes.len(), 1);
    match &nodes[0] {
        Node::Ss(ss) => {
            assert_eq!(ss.server, "1.2.3.4");
            assert_eq!(ss.port, 8388);
            assert_eq!(ss.method, "aes-256-gcm");
            assert_eq!(ss.password, "pw");
            assert_eq!(ss.name, "Test");
        }
        other => panic!("Expected ss node, got {:?}", other),
    }

    let output = generator::convert(&nodes, "clash", &ConversionOptions::default());
    assert!(output.contains("cipher: aes-256-gcm"));
    assert!(output.contains("password: pw"));
}

#[test]
fn test_clash_family_outputs_are_valid_yaml() {
    let nodes = parse_subscription(&all_kinds_subscription());
    for target in ["clash", "clashmeta", "stash"] {
        let output = generator::convert(&nodes, target, &ConversionOptions::default());
        let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(doc["proxies"].as_sequence().unwrap().len(), nodes.len());
        assert!(doc["proxy-groups"].as_sequence().is_some());
        assert!(doc["rules"].as_sequence().is_some());
    }
}

#[test]
fn test_clash_empty_nodes_keeps_sections() {
    let output = generator::convert(&[], "clash", &ConversionOptions::default());
    assert!(output.contains("proxies:"));
    let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    assert!(doc["proxy-groups"].as_sequence().is_some());
    assert!(doc["rules"].as_sequence().is_some());
}

#[test]
fn test_singbox_outbounds_length() {
    let nodes = parse_subscription(&all_kinds_subscription());
    for target in ["singbox", "nekobox"] {
        let output = generator::convert(&nodes, target, &ConversionOptions::default());
        let doc: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            doc["outbounds"].as_array().unwrap().len(),
            nodes.len() + 2
        );
    }
}

#[test]
fn test_line_targets_omit_unsupported_kinds() {
    let nodes = parse_subscription(&all_kinds_subscription());
    let options = ConversionOptions::default();

    // ssr and hysteria v1 have no surge form
    let surge = generator::convert(&nodes, "surge", &options);
    assert_eq!(surge.lines().count(), nodes.len() - 2);
    assert_eq!(generator::convert(&nodes, "surfboard", &options), surge);

    // hysteria, hysteria2 and tuic have no quantumultx form
    let qx = generator::convert(&nodes, "quantumultx", &options);
    assert_eq!(qx.lines().count(), nodes.len() - 3);

    // hysteria v1 and tuic have no loon form
    let loon = generator::convert(&nodes, "loon", &options);
    assert_eq!(loon.lines().count(), nodes.len() - 2);
}

#[test]
fn test_unknown_target_is_empty() {
    let nodes = parse_subscription(MIXED);
    assert_eq!(
        generator::convert(&nodes, "nope", &ConversionOptions::default()),
        ""
    );
}

#[test]
fn test_every_target_produces_output() {
    let nodes = parse_subscription(&all_kinds_subscription());
    for target in Target::ALL {
        let output = generator::encode(&nodes, target, &ConversionOptions::default());
        assert!(!output.is_empty(), "{} produced nothing", target);
    }
}

// ============================================================================
// Annotation
// ============================================================================

#[test]
fn test_geo_emoji_word_boundaries() {
    assert!(transform::add_emoji("Hong Kong BUSINESS 01").starts_with("🇭🇰"));
    assert_eq!(
        transform::add_emoji("Unknown Location"),
        format!("{} Unknown Location", GLOBE)
    );
    assert!(transform::add_emoji("STATUS node").starts_with(GLOBE));
}

#[test]
fn test_annotate_then_convert_uses_new_names() {
    let nodes = parse_subscription(MIXED);
    let (annotate, conversion) =
        OptionsBag::from_query("emoji=1&exclude=Reality|TUIC&sort=1").into_options();
    let nodes = transform::annotate(nodes, &annotate);

    assert_eq!(nodes.len(), 5);
    assert!(nodes.iter().all(|n| !n.name().contains("Reality")));
    assert!(nodes.iter().any(|n| n.name() == "🇯🇵 JP VLESS"));
    assert!(nodes.iter().any(|n| n.name() == "🇭🇰 香港 Trojan"));

    let output = generator::convert(&nodes, "singbox", &conversion);
    assert!(output.contains("🇸🇬 Singapore Hy2"));
}

#[test]
fn test_annotate_include_then_exclude() {
    let nodes = parse_subscription(MIXED);
    let options = AnnotateOptions {
        emoji: false,
        include: vec!["VLESS".to_string(), "Reality".to_string()],
        exclude: vec!["JP".to_string()],
        ..Default::default()
    };
    let nodes = transform::annotate(nodes, &options);
    let names: Vec<&str> = nodes.iter().map(Node::name).collect();
    assert_eq!(names, vec!["Reality"]);
}

#[test]
fn test_rule_preset_selection() {
    let nodes = parse_subscription(MIXED);
    let options = ConversionOptions {
        rule_preset: Some("streaming".to_string()),
        ..Default::default()
    };
    let output = generator::convert(&nodes, "clash", &options);
    assert!(output.contains("# Rule preset: streaming"));

    let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    let last_rule = doc["rules"]
        .as_sequence()
        .and_then(|rules| rules.last())
        .and_then(serde_yaml::Value::as_str)
        .unwrap();
    assert!(last_rule.starts_with("MATCH,"));
}
