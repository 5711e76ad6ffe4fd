//! Clash-family encoder (clash, clashmeta, stash)
//!
//! Each node is projected into a [`ClashProxy`] record; groups and rules come
//! from the rule composer seeded with the node names. The document is written
//! as block-style YAML under a short header comment.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error};

use crate::config::ConversionOptions;
use crate::node::{Node, WsOptions};
use crate::rules::{self, ProxyGroup};

// ============================================================================
// Records
// ============================================================================

/// One entry of the `proxies` list
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ClashProxy {
    pub name: String,
    #[serde(rename = "type")]
    pub proxy_type: &'static str,
    pub server: String,
    pub port: u16,
    #[serde(flatten)]
    pub settings: ProxySettings,
}

/// Kind-specific keys of a [`ClashProxy`]
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ProxySettings {
    Ss(SsSettings),
    Ssr(SsrSettings),
    Vmess(VmessSettings),
    Vless(VlessSettings),
    Trojan(TrojanSettings),
    Hysteria(HysteriaSettings),
    Hysteria2(Hysteria2Settings),
    Tuic(TuicSettings),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SsSettings {
    pub cipher: String,
    pub password: String,
    pub udp: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SsrSettings {
    pub cipher: String,
    pub password: String,
    pub protocol: String,
    pub protocol_param: String,
    pub obfs: String,
    pub obfs_param: String,
    pub udp: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct VmessSettings {
    pub uuid: String,
    #[serde(rename = "alterId")]
    pub alter_id: u32,
    pub cipher: &'static str,
    pub udp: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOpts>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct VlessSettings {
    pub uuid: String,
    pub udp: bool,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOpts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOpts>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TrojanSettings {
    pub password: String,
    pub udp: bool,
    pub skip_cert_verify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HysteriaSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_str: Option<String>,
    pub up: String,
    pub down: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    pub skip_cert_verify: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Hysteria2Settings {
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfs_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    pub skip_cert_verify: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TuicSettings {
    pub uuid: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub congestion_controller: Option<String>,
    pub alpn: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,
    pub skip_cert_verify: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WsOpts {
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl From<&WsOptions> for WsOpts {
    fn from(ws: &WsOptions) -> Self {
        Self {
            path: ws.path.clone(),
            headers: ws.headers.clone(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GrpcOpts {
    #[serde(rename = "grpc-service-name")]
    pub grpc_service_name: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOpts {
    pub public_key: String,
    pub short_id: String,
}

#[derive(Serialize)]
struct ClashDocument<'a> {
    proxies: Vec<ClashProxy>,
    #[serde(rename = "proxy-groups")]
    proxy_groups: &'a [ProxyGroup],
    rules: &'a [String],
}

// ============================================================================
// Projection
// ============================================================================

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Projects a node into its Clash proxy record
pub fn to_proxy(node: &Node, options: &ConversionOptions) -> ClashProxy {
    let (proxy_type, settings) = match node {
        Node::Ss(n) => (
            "ss",
            ProxySettings::Ss(SsSettings {
                cipher: n.method.clone(),
                password: n.password.clone(),
                udp: options.udp,
            }),
        ),
        Node::Ssr(n) => (
            "ssr",
            ProxySettings::Ssr(SsrSettings {
                cipher: n.method.clone(),
                password: n.password.clone(),
                protocol: n.protocol.clone(),
                protocol_param: n.protocol_param.clone(),
                obfs: n.obfs.clone(),
                obfs_param: n.obfs_param.clone(),
                udp: options.udp,
            }),
        ),
        Node::Vmess(n) => {
            let ws = n.ws.as_ref().filter(|_| n.network == "ws");
            (
                "vmess",
                ProxySettings::Vmess(VmessSettings {
                    uuid: n.uuid.clone(),
                    alter_id: n.alter_id,
                    cipher: "auto",
                    udp: options.udp,
                    tls: n.tls.then_some(true),
                    skip_cert_verify: n.tls.then_some(options.skip_cert),
                    network: ws.map(|_| "ws".to_string()),
                    ws_opts: ws.map(WsOpts::from),
                }),
            )
        }
        Node::Vless(n) => {
            let tls = n.tls_enabled();
            (
                "vless",
                ProxySettings::Vless(VlessSettings {
                    uuid: n.uuid.clone(),
                    udp: options.udp,
                    network: n.network.clone(),
                    flow: non_empty(&n.flow),
                    tls: tls.then_some(true),
                    skip_cert_verify: tls.then_some(options.skip_cert),
                    servername: n.reality.as_ref().and_then(|r| non_empty(&r.sni)),
                    ws_opts: n
                        .ws
                        .as_ref()
                        .filter(|_| n.network == "ws")
                        .map(WsOpts::from),
                    grpc_opts: n
                        .grpc
                        .as_ref()
                        .filter(|_| n.network == "grpc")
                        .map(|g| GrpcOpts {
                            grpc_service_name: g.service_name.clone(),
                        }),
                    reality_opts: n.reality.as_ref().map(|r| RealityOpts {
                        public_key: r.public_key.clone(),
                        short_id: r.short_id.clone(),
                    }),
                }),
            )
        }
        Node::Trojan(n) => (
            "trojan",
            ProxySettings::Trojan(TrojanSettings {
                password: n.password.clone(),
                udp: options.udp,
                skip_cert_verify: options.skip_cert,
                sni: non_empty(&n.sni),
                alpn: n.alpn.clone(),
            }),
        ),
        Node::Hysteria(n) => (
            "hysteria",
            ProxySettings::Hysteria(HysteriaSettings {
                auth_str: non_empty(&n.auth),
                up: n.up.clone(),
                down: n.down.clone(),
                alpn: n.alpn.clone(),
                obfs: n.obfs.clone(),
                sni: n.sni.clone(),
                skip_cert_verify: n.insecure || options.skip_cert,
            }),
        ),
        Node::Hysteria2(n) => (
            "hysteria2",
            ProxySettings::Hysteria2(Hysteria2Settings {
                password: n.password.clone(),
                obfs: n.obfs.as_ref().map(|o| o.kind.clone()),
                obfs_password: n.obfs.as_ref().and_then(|o| non_empty(&o.password)),
                sni: n.sni.clone(),
                skip_cert_verify: n.insecure || options.skip_cert,
            }),
        ),
        Node::Tuic(n) => (
            "tuic",
            ProxySettings::Tuic(TuicSettings {
                uuid: n.uuid.clone(),
                password: n.password.clone(),
                congestion_controller: n.congestion.clone(),
                alpn: n.alpn.clone(),
                sni: n.sni.clone(),
                udp_relay_mode: n.udp_relay_mode.clone(),
                skip_cert_verify: n.insecure || options.skip_cert,
            }),
        ),
    };

    ClashProxy {
        name: node.name().to_string(),
        proxy_type,
        server: node.server().to_string(),
        port: node.port(),
        settings,
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes nodes as a Clash YAML document
pub fn encode(nodes: &[Node], options: &ConversionOptions) -> String {
    encode_with_timestamp(nodes, options, Utc::now())
}

/// Encodes nodes as a Clash YAML document stamped with `generated_at`
pub fn encode_with_timestamp(
    nodes: &[Node],
    options: &ConversionOptions,
    generated_at: DateTime<Utc>,
) -> String {
    let names: Vec<String> = nodes.iter().map(|n| n.name().to_string()).collect();
    let composed = rules::compose(options.rule_preset.as_deref(), &names);

    let document = ClashDocument {
        proxies: nodes.iter().map(|n| to_proxy(n, options)).collect(),
        proxy_groups: &composed.proxy_groups,
        rules: &composed.rules,
    };

    let body = match serde_yaml::to_string(&document) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize Clash document: {}", e);
            return String::new();
        }
    };

    debug!(
        "Clash document: {} proxies, {} groups, preset {}",
        nodes.len(),
        composed.proxy_groups.len(),
        composed.preset_id
    );

    format!(
        "# Generated by subshift {}\n# Nodes: {}\n# Rule preset: {}\n# Generated at: {}\n\n{}",
        crate::get_version(),
        nodes.len(),
        composed.preset_id,
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{
        Hysteria2Node, ObfsOptions, RealityOptions, ShadowsocksNode, TrojanNode, VLessNode,
        VMessNode,
    };
    use chrono::TimeZone;
    use serde_yaml::Value;

    fn ss() -> Node {
        Node::Ss(ShadowsocksNode {
            name: "Test".to_string(),
            server: "1.2.3.4".to_string(),
            port: 8388,
            method: "aes-256-gcm".to_string(),
            password: "pw".to_string(),
        })
    }

    fn vmess_ws() -> Node {
        Node::Vmess(VMessNode {
            name: "VM".to_string(),
            server: "vm.example.com".to_string(),
            port: 443,
            uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
            alter_id: 0,
            network: "ws".to_string(),
            tls: true,
            ws: Some(WsOptions::new(Some("/ray"), Some("cdn.example.com"))),
        })
    }

    fn parse(output: &str) -> Value {
        serde_yaml::from_str(output).unwrap()
    }

    #[test]
    fn test_encode_ss_fields() {
        let output = encode(&[ss()], &ConversionOptions::default());
        assert!(output.contains("cipher: aes-256-gcm"));
        assert!(output.contains("password: pw"));

        let doc = parse(&output);
        let proxy = &doc["proxies"][0];
        assert_eq!(proxy["type"], "ss");
        assert_eq!(proxy["port"], 8388);
        assert_eq!(proxy["udp"], true);
    }

    #[test]
    fn test_encode_empty_has_sections() {
        let output = encode(&[], &ConversionOptions::default());
        let doc = parse(&output);
        assert!(doc["proxies"].as_sequence().unwrap().is_empty());
        assert_eq!(doc["proxy-groups"].as_sequence().unwrap().len(), 2);
        assert_eq!(doc["rules"].as_sequence().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_lists_are_the_only_flow_tokens() {
        // YAML has no block form for an empty sequence
        let output = encode(&[], &ConversionOptions::default());
        assert!(output.contains("proxies: []"));
        let rest = output.replace("[]", "");
        assert!(!rest.contains('['));
        assert!(!rest.contains('{'));
    }

    #[test]
    fn test_header_comment() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let output = encode_with_timestamp(&[ss()], &ConversionOptions::default(), at);
        assert!(output.starts_with("# Generated by subshift"));
        assert!(output.contains("# Nodes: 1\n"));
        assert!(output.contains("# Rule preset: basic\n"));
        assert!(output.contains("# Generated at: 2026-01-02T03:04:05Z\n"));
    }

    #[test]
    fn test_block_style_output() {
        let output = encode(&[ss()], &ConversionOptions::default());
        assert!(!output.contains('{'));
        assert!(!output.contains('['));
        assert!(output.contains("\n- name: Test\n"));
    }

    #[test]
    fn test_vmess_ws_tls() {
        let options = ConversionOptions {
            skip_cert: true,
            ..Default::default()
        };
        let doc = parse(&encode(&[vmess_ws()], &options));
        let proxy = &doc["proxies"][0];
        assert_eq!(proxy["alterId"], 0);
        assert_eq!(proxy["cipher"], "auto");
        assert_eq!(proxy["tls"], true);
        assert_eq!(proxy["skip-cert-verify"], true);
        assert_eq!(proxy["network"], "ws");
        assert_eq!(proxy["ws-opts"]["path"], "/ray");
        assert_eq!(proxy["ws-opts"]["headers"]["Host"], "cdn.example.com");
    }

    #[test]
    fn test_vmess_plain_has_no_tls_keys() {
        let node = Node::Vmess(VMessNode {
            name: "plain".to_string(),
            server: "vm.example.com".to_string(),
            port: 80,
            uuid: "id".to_string(),
            alter_id: 64,
            network: "tcp".to_string(),
            tls: false,
            ws: None,
        });
        let doc = parse(&encode(&[node], &ConversionOptions::default()));
        let proxy = &doc["proxies"][0];
        assert_eq!(proxy["alterId"], 64);
        assert!(proxy.get("tls").is_none());
        assert!(proxy.get("skip-cert-verify").is_none());
        assert!(proxy.get("ws-opts").is_none());
    }

    #[test]
    fn test_vless_reality() {
        let node = Node::Vless(VLessNode {
            name: "R".to_string(),
            server: "r.example.com".to_string(),
            port: 443,
            uuid: "id".to_string(),
            flow: "xtls-rprx-vision".to_string(),
            network: "tcp".to_string(),
            tls: false,
            ws: None,
            grpc: None,
            reality: Some(RealityOptions {
                public_key: "pbk".to_string(),
                short_id: "sid".to_string(),
                sni: "www.microsoft.com".to_string(),
            }),
        });
        let doc = parse(&encode(&[node], &ConversionOptions::default()));
        let proxy = &doc["proxies"][0];
        assert_eq!(proxy["tls"], true);
        assert_eq!(proxy["flow"], "xtls-rprx-vision");
        assert_eq!(proxy["servername"], "www.microsoft.com");
        assert_eq!(proxy["reality-opts"]["public-key"], "pbk");
        assert_eq!(proxy["reality-opts"]["short-id"], "sid");
    }

    #[test]
    fn test_trojan_and_hysteria2() {
        let trojan = Node::Trojan(TrojanNode {
            name: "T".to_string(),
            server: "t.example.com".to_string(),
            port: 443,
            password: "secret".to_string(),
            sni: "t.example.com".to_string(),
            alpn: vec!["h2".to_string()],
        });
        let hy2 = Node::Hysteria2(Hysteria2Node {
            name: "H".to_string(),
            server: "h.example.com".to_string(),
            port: 8443,
            password: "pw".to_string(),
            obfs: Some(ObfsOptions {
                kind: "salamander".to_string(),
                password: "obfs-pw".to_string(),
            }),
            sni: Some("h.example.com".to_string()),
            insecure: true,
        });
        let doc = parse(&encode(&[trojan, hy2], &ConversionOptions::default()));
        assert_eq!(doc["proxies"][0]["sni"], "t.example.com");
        assert_eq!(doc["proxies"][0]["alpn"][0], "h2");
        assert_eq!(doc["proxies"][0]["skip-cert-verify"], false);
        assert_eq!(doc["proxies"][1]["type"], "hysteria2");
        assert_eq!(doc["proxies"][1]["obfs"], "salamander");
        assert_eq!(doc["proxies"][1]["obfs-password"], "obfs-pw");
        assert_eq!(doc["proxies"][1]["skip-cert-verify"], true);
    }

    #[test]
    fn test_groups_reference_nodes() {
        let doc = parse(&encode(&[ss(), vmess_ws()], &ConversionOptions::default()));
        let selector = &doc["proxy-groups"][0];
        let members: Vec<&str> = selector["proxies"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(members.contains(&"Test"));
        assert!(members.contains(&"VM"));

        let auto = &doc["proxy-groups"][1];
        assert_eq!(auto["type"], "url-test");
        assert_eq!(auto["interval"], 300);
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let options = ConversionOptions {
            rule_preset: Some("no-such-preset".to_string()),
            ..Default::default()
        };
        let output = encode(&[ss()], &options);
        assert!(output.contains("# Rule preset: basic"));
    }

    #[test]
    fn test_named_preset_rules() {
        let options = ConversionOptions {
            rule_preset: Some("gaming".to_string()),
            ..Default::default()
        };
        let doc = parse(&encode(&[ss()], &options));
        let rules = doc["rules"].as_sequence().unwrap();
        assert!(rules.last().unwrap().as_str().unwrap().starts_with("MATCH,"));
    }
}
