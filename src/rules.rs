//! Rule and proxy-group presets
//!
//! A [`RulePreset`] is a static bundle of proxy-group templates and routing
//! rules used by the structured-text (Clash family) encoder. [`compose`] seeds
//! a preset with the current node names.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preset used when none is requested or the requested id is unknown
pub const DEFAULT_PRESET: &str = "basic";

const PROBE_URL: &str = "http://www.gstatic.com/generate_204";

// ============================================================================
// Preset Types
// ============================================================================

/// Proxy-group selection strategy
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GroupType {
    Select,
    UrlTest,
    Fallback,
    LoadBalance,
}

impl GroupType {
    /// Automatic groups pick among every node themselves.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, GroupType::Select)
    }
}

/// A proxy-group template
#[derive(Debug)]
pub struct GroupTemplate {
    pub name: &'static str,
    pub group_type: GroupType,
    /// Members before node names are added
    pub proxies: &'static [&'static str],
    /// Probe settings, automatic groups only
    pub probe: Option<Probe>,
}

/// Health-check settings for an automatic group
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub url: &'static str,
    pub interval: u32,
    pub tolerance: Option<u32>,
}

/// A named, read-only bundle of group templates and rules
#[derive(Debug)]
pub struct RulePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// The manual selector that receives every node
    pub selector: &'static str,
    /// The automatic group appended to the selector
    pub auto_group: &'static str,
    pub groups: &'static [GroupTemplate],
    /// `matcher,value,group` lines, the last one always `MATCH,group`
    pub rules: &'static [&'static str],
}

// ============================================================================
// Composed Output
// ============================================================================

/// A proxy group with its members filled in
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub proxies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

/// Groups and rules produced for one conversion
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedRules {
    /// Id of the preset actually used
    pub preset_id: &'static str,
    pub proxy_groups: Vec<ProxyGroup>,
    pub rules: Vec<String>,
}

/// One line of the preset catalogue
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PresetSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub group_count: usize,
    pub rule_count: usize,
}

// ============================================================================
// Composition
// ============================================================================

/// Looks up a preset, falling back to [`DEFAULT_PRESET`] for unknown ids.
pub fn get_preset(id: Option<&str>) -> &'static RulePreset {
    let requested = id.unwrap_or(DEFAULT_PRESET);
    PRESETS
        .iter()
        .find(|p| p.id == requested)
        .unwrap_or_else(|| {
            debug!("Unknown rule preset '{}', using '{}'", requested, DEFAULT_PRESET);
            &PRESETS[0]
        })
}

/// Builds the proxy groups and rules for a preset and a list of node names.
///
/// Automatic groups get every node name. The preset's selector keeps its
/// template members minus the automatic group, then gets the automatic group
/// followed by every node name.
pub fn compose(preset_id: Option<&str>, node_names: &[String]) -> ComposedRules {
    let preset = get_preset(preset_id);

    let proxy_groups = preset
        .groups
        .iter()
        .map(|template| {
            let proxies = if template.group_type.is_automatic() {
                node_names.to_vec()
            } else if template.name == preset.selector {
                template
                    .proxies
                    .iter()
                    .filter(|p| **p != preset.auto_group)
                    .map(|p| p.to_string())
                    .chain(std::iter::once(preset.auto_group.to_string()))
                    .chain(node_names.iter().cloned())
                    .collect()
            } else {
                template.proxies.iter().map(|p| p.to_string()).collect()
            };

            ProxyGroup {
                name: template.name.to_string(),
                group_type: template.group_type,
                proxies,
                url: template.probe.map(|p| p.url.to_string()),
                interval: template.probe.map(|p| p.interval),
                tolerance: template.probe.and_then(|p| p.tolerance),
            }
        })
        .collect();

    ComposedRules {
        preset_id: preset.id,
        proxy_groups,
        rules: preset.rules.iter().map(|r| r.to_string()).collect(),
    }
}

/// Lists every preset with its group and rule counts.
pub fn catalogue() -> Vec<PresetSummary> {
    PRESETS
        .iter()
        .map(|p| PresetSummary {
            id: p.id,
            name: p.name,
            description: p.description,
            group_count: p.groups.len(),
            rule_count: p.rules.len(),
        })
        .collect()
}

// ============================================================================
// Preset Table
// ============================================================================

const SELECT: &str = "🚀 节点选择";
const AUTO: &str = "♻️ 自动选择";
const LOW_LATENCY: &str = "⚡ 低延迟";
const DIRECT_GROUP: &str = "🎯 全球直连";

const fn select(name: &'static str, proxies: &'static [&'static str]) -> GroupTemplate {
    GroupTemplate {
        name,
        group_type: GroupType::Select,
        proxies,
        probe: None,
    }
}

const fn url_test(name: &'static str, interval: u32, tolerance: Option<u32>) -> GroupTemplate {
    GroupTemplate {
        name,
        group_type: GroupType::UrlTest,
        proxies: &[],
        probe: Some(Probe {
            url: PROBE_URL,
            interval,
            tolerance,
        }),
    }
}

/// The first entry is the fallback preset.
pub static PRESETS: &[RulePreset] = &[
    RulePreset {
        id: "basic",
        name: "基础模板",
        description: "最小化规则配置",
        selector: SELECT,
        auto_group: AUTO,
        groups: &[select(SELECT, &[AUTO, "DIRECT"]), url_test(AUTO, 300, None)],
        rules: &["GEOIP,LAN,DIRECT", "GEOIP,CN,DIRECT", "MATCH,🚀 节点选择"],
    },
    RulePreset {
        id: "standard",
        name: "标准模板",
        description: "平衡的规则配置，适合日常使用",
        selector: SELECT,
        auto_group: AUTO,
        groups: &[
            select(SELECT, &[AUTO, DIRECT_GROUP]),
            url_test(AUTO, 300, None),
            select("📲 电报信息", &[SELECT]),
            select("🎥 流媒体", &[SELECT]),
            select("🤖 AI 服务", &[SELECT]),
            select(DIRECT_GROUP, &["DIRECT"]),
            select("🛑 广告拦截", &["REJECT"]),
            select("🐟 漏网之鱼", &[SELECT, DIRECT_GROUP]),
        ],
        rules: &[
            "DOMAIN-SUFFIX,ad.com,🛑 广告拦截",
            "DOMAIN-KEYWORD,adservice,🛑 广告拦截",
            "DOMAIN-KEYWORD,tracking,🛑 广告拦截",
            "DOMAIN-SUFFIX,openai.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,ai.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,claude.ai,🤖 AI 服务",
            "DOMAIN-SUFFIX,anthropic.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,bard.google.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,gemini.google.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,t.me,📲 电报信息",
            "DOMAIN-SUFFIX,telegram.org,📲 电报信息",
            "DOMAIN-SUFFIX,telegram.me,📲 电报信息",
            "IP-CIDR,91.108.56.0/22,📲 电报信息",
            "IP-CIDR,91.108.4.0/22,📲 电报信息",
            "IP-CIDR,149.154.160.0/20,📲 电报信息",
            "DOMAIN-SUFFIX,netflix.com,🎥 流媒体",
            "DOMAIN-SUFFIX,netflix.net,🎥 流媒体",
            "DOMAIN-SUFFIX,nflxvideo.net,🎥 流媒体",
            "DOMAIN-SUFFIX,youtube.com,🎥 流媒体",
            "DOMAIN-SUFFIX,ytimg.com,🎥 流媒体",
            "DOMAIN-SUFFIX,googlevideo.com,🎥 流媒体",
            "DOMAIN-SUFFIX,spotify.com,🎥 流媒体",
            "DOMAIN-SUFFIX,twitch.tv,🎥 流媒体",
            "DOMAIN-SUFFIX,cn,🎯 全球直连",
            "DOMAIN-SUFFIX,taobao.com,🎯 全球直连",
            "DOMAIN-SUFFIX,tmall.com,🎯 全球直连",
            "DOMAIN-SUFFIX,jd.com,🎯 全球直连",
            "DOMAIN-SUFFIX,qq.com,🎯 全球直连",
            "DOMAIN-SUFFIX,weixin.com,🎯 全球直连",
            "DOMAIN-SUFFIX,bilibili.com,🎯 全球直连",
            "DOMAIN-SUFFIX,163.com,🎯 全球直连",
            "DOMAIN-SUFFIX,126.com,🎯 全球直连",
            "DOMAIN-SUFFIX,baidu.com,🎯 全球直连",
            "GEOIP,LAN,🎯 全球直连",
            "GEOIP,CN,🎯 全球直连",
            "MATCH,🐟 漏网之鱼",
        ],
    },
    RulePreset {
        id: "developer",
        name: "开发者模板",
        description: "针对开发者优化，包含 GitHub、NPM 等",
        selector: SELECT,
        auto_group: AUTO,
        groups: &[
            select(SELECT, &[AUTO, DIRECT_GROUP]),
            url_test(AUTO, 300, None),
            select("💻 开发工具", &[SELECT]),
            select("🤖 AI 服务", &[SELECT]),
            select(DIRECT_GROUP, &["DIRECT"]),
            select("🐟 漏网之鱼", &[SELECT, DIRECT_GROUP]),
        ],
        rules: &[
            "DOMAIN-SUFFIX,openai.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,claude.ai,🤖 AI 服务",
            "DOMAIN-SUFFIX,anthropic.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,github.copilot.com,🤖 AI 服务",
            "DOMAIN-SUFFIX,github.com,💻 开发工具",
            "DOMAIN-SUFFIX,githubusercontent.com,💻 开发工具",
            "DOMAIN-SUFFIX,githubassets.com,💻 开发工具",
            "DOMAIN-SUFFIX,github.io,💻 开发工具",
            "DOMAIN-SUFFIX,npmjs.org,💻 开发工具",
            "DOMAIN-SUFFIX,npmjs.com,💻 开发工具",
            "DOMAIN-SUFFIX,yarnpkg.com,💻 开发工具",
            "DOMAIN-SUFFIX,docker.com,💻 开发工具",
            "DOMAIN-SUFFIX,docker.io,💻 开发工具",
            "DOMAIN-SUFFIX,stackoverflow.com,💻 开发工具",
            "DOMAIN-SUFFIX,stackexchange.com,💻 开发工具",
            "DOMAIN-SUFFIX,vercel.com,💻 开发工具",
            "DOMAIN-SUFFIX,vercel.app,💻 开发工具",
            "DOMAIN-SUFFIX,netlify.com,💻 开发工具",
            "DOMAIN-SUFFIX,netlify.app,💻 开发工具",
            "DOMAIN-SUFFIX,cloudflare.com,💻 开发工具",
            "DOMAIN-SUFFIX,heroku.com,💻 开发工具",
            "DOMAIN-SUFFIX,digitalocean.com,💻 开发工具",
            "GEOIP,LAN,🎯 全球直连",
            "GEOIP,CN,🎯 全球直连",
            "MATCH,🐟 漏网之鱼",
        ],
    },
    RulePreset {
        id: "gaming",
        name: "游戏加速模板",
        description: "针对游戏优化，低延迟节点优先",
        selector: SELECT,
        auto_group: LOW_LATENCY,
        groups: &[
            select(SELECT, &[LOW_LATENCY, DIRECT_GROUP]),
            url_test(LOW_LATENCY, 150, Some(50)),
            select("🎮 游戏平台", &[LOW_LATENCY, SELECT]),
            select(DIRECT_GROUP, &["DIRECT"]),
            select("🐟 漏网之鱼", &[SELECT, DIRECT_GROUP]),
        ],
        rules: &[
            "DOMAIN-SUFFIX,steamcommunity.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,steampowered.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,steamstatic.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,steamcontent.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,epicgames.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,unrealengine.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,playstation.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,playstation.net,🎮 游戏平台",
            "DOMAIN-SUFFIX,xbox.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,xboxlive.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,nintendo.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,nintendo.net,🎮 游戏平台",
            "DOMAIN-SUFFIX,ea.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,origin.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,riotgames.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,leagueoflegends.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,battle.net,🎮 游戏平台",
            "DOMAIN-SUFFIX,blizzard.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,discord.com,🎮 游戏平台",
            "DOMAIN-SUFFIX,discord.gg,🎮 游戏平台",
            "DOMAIN-SUFFIX,discordapp.com,🎮 游戏平台",
            "GEOIP,LAN,🎯 全球直连",
            "GEOIP,CN,🎯 全球直连",
            "MATCH,🐟 漏网之鱼",
        ],
    },
    RulePreset {
        id: "streaming",
        name: "流媒体解锁模板",
        description: "针对流媒体服务优化",
        selector: SELECT,
        auto_group: AUTO,
        groups: &[
            select(SELECT, &[AUTO, DIRECT_GROUP]),
            url_test(AUTO, 300, None),
            select("📺 Netflix", &[SELECT]),
            select("🎬 Disney+", &[SELECT]),
            select("▶️ YouTube", &[SELECT]),
            select("🎵 Spotify", &[SELECT]),
            select(DIRECT_GROUP, &["DIRECT"]),
            select("🐟 漏网之鱼", &[SELECT, DIRECT_GROUP]),
        ],
        rules: &[
            "DOMAIN-SUFFIX,netflix.com,📺 Netflix",
            "DOMAIN-SUFFIX,netflix.net,📺 Netflix",
            "DOMAIN-SUFFIX,nflxvideo.net,📺 Netflix",
            "DOMAIN-SUFFIX,nflximg.net,📺 Netflix",
            "DOMAIN-SUFFIX,nflximg.com,📺 Netflix",
            "DOMAIN-SUFFIX,nflxso.net,📺 Netflix",
            "DOMAIN-SUFFIX,nflxext.com,📺 Netflix",
            "DOMAIN-SUFFIX,disney.com,🎬 Disney+",
            "DOMAIN-SUFFIX,disneyplus.com,🎬 Disney+",
            "DOMAIN-SUFFIX,dssott.com,🎬 Disney+",
            "DOMAIN-SUFFIX,disneystreaming.com,🎬 Disney+",
            "DOMAIN-SUFFIX,bamgrid.com,🎬 Disney+",
            "DOMAIN-SUFFIX,youtube.com,▶️ YouTube",
            "DOMAIN-SUFFIX,ytimg.com,▶️ YouTube",
            "DOMAIN-SUFFIX,googlevideo.com,▶️ YouTube",
            "DOMAIN-SUFFIX,youtu.be,▶️ YouTube",
            "DOMAIN-SUFFIX,yt.be,▶️ YouTube",
            "DOMAIN-SUFFIX,spotify.com,🎵 Spotify",
            "DOMAIN-SUFFIX,scdn.co,🎵 Spotify",
            "DOMAIN-SUFFIX,spotifycdn.com,🎵 Spotify",
            "DOMAIN-SUFFIX,audio-ak-spotify-com.akamaized.net,🎵 Spotify",
            "DOMAIN-SUFFIX,hbomax.com,📺 Netflix",
            "DOMAIN-SUFFIX,hbo.com,📺 Netflix",
            "DOMAIN-SUFFIX,primevideo.com,📺 Netflix",
            "DOMAIN-SUFFIX,amazon.com,📺 Netflix",
            "GEOIP,LAN,🎯 全球直连",
            "GEOIP,CN,🎯 全球直连",
            "MATCH,🐟 漏网之鱼",
        ],
    },
];
