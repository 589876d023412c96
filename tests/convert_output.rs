//! 端到端转换测试

use subconvert::app::{convert_sources, ConvertRequest};
use subconvert::common::StaticFetcher;
use subconvert::config::{parse_settings, Settings};
use subconvert::convert::{ClashConverter, Converter, Dialect, SurgeConverter};
use subconvert::rules::RuleConfiguration;
use subconvert::subscription::{parse_subscription, SubFormat};

const SUB_URL: &str = "https://sub.example.com/api/v1/client?token=abc";
const CFG_URL: &str = "https://cfg.example.com/rules.ini";
const LIST_URL: &str =
    "https://raw.githubusercontent.com/ACL4SSR/ACL4SSR/refs/heads/master/Clash/ProxyGFWlist.list";

const SUBSCRIPTION: &str = "\
ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@hk.example.com:8388#HK
trojan://pw@jp.example.com:443?sni=edge.example.com#JP
not-a-link
";

const RULES: &str = "\
[custom]
ruleset=🚀 Proxy,https://raw.githubusercontent.com/ACL4SSR/ACL4SSR/master/Clash/ProxyGFWlist.list
ruleset=🎯 Direct,[]GEOIP,CN
ruleset=🚀 Proxy,[]USER-AGENT,Instagram*
ruleset=🐟 Final,[]FINAL
custom_proxy_group=🚀 Proxy`select`[]♻️ Auto`[]DIRECT`.*
custom_proxy_group=♻️ Auto`url-test`.*`http://www.gstatic.com/generate_204`300,,50
custom_proxy_group=🎯 Direct`select`[]DIRECT
custom_proxy_group=🐟 Final`select`[]🚀 Proxy`[]🎯 Direct
custom_proxy_group=🔗 Relay`relay`[]🚀 Proxy
";

fn fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with(SUB_URL, SUBSCRIPTION)
        .with(CFG_URL, RULES)
        .with(LIST_URL, "DOMAIN-SUFFIX,google.com\nDOMAIN-KEYWORD,youtube\n")
}

fn request(target: Dialect) -> ConvertRequest {
    let mut req = ConvertRequest::new(SUB_URL);
    req.config_url = CFG_URL.to_string();
    req.target = target;
    req
}

fn strings(v: &serde_yml::Value) -> Vec<String> {
    v.as_sequence()
        .unwrap()
        .iter()
        .filter_map(|x| x.as_str().map(str::to_string))
        .collect()
}

#[test]
fn clash_end_to_end() {
    let out = convert_sources(&request(Dialect::Clash), &fetcher(), &Settings::default()).unwrap();
    assert_eq!(out.nodes, 2);
    assert_eq!(out.skipped, 1);

    let doc: serde_yml::Value = serde_yml::from_str(&out.output).unwrap();
    let proxies = doc["proxies"].as_sequence().unwrap();
    assert_eq!(proxies.len(), 2);
    assert_eq!(proxies[0]["name"].as_str(), Some("HK"));
    assert_eq!(proxies[1]["type"].as_str(), Some("trojan"));
    assert_eq!(proxies[1]["sni"].as_str(), Some("edge.example.com"));

    let groups = doc["proxy-groups"].as_sequence().unwrap();
    let names: Vec<&str> = groups.iter().filter_map(|g| g["name"].as_str()).collect();
    // the relay group has an unknown kind and is not emitted
    assert_eq!(names, vec!["🚀 Proxy", "♻️ Auto", "🎯 Direct", "🐟 Final"]);
    assert_eq!(
        strings(&groups[0]["proxies"]),
        vec!["♻️ Auto", "DIRECT", "HK", "JP"]
    );
    assert_eq!(strings(&groups[1]["proxies"]), vec!["HK", "JP"]);
    assert_eq!(groups[1]["interval"].as_u64(), Some(300));

    assert_eq!(
        strings(&doc["rules"]),
        vec![
            "DOMAIN-SUFFIX,google.com,🚀 Proxy",
            "DOMAIN-KEYWORD,youtube,🚀 Proxy",
            "GEOIP,CN,🎯 Direct",
            "MATCH,🐟 Final",
        ]
    );
}

#[test]
fn surge_end_to_end() {
    let out = convert_sources(&request(Dialect::Surge), &fetcher(), &Settings::default()).unwrap();
    let text = out.output;
    assert!(text.contains("HK = ss, hk.example.com, 8388, encrypt-method=aes-256-gcm, password=password\n"));
    assert!(text.contains("🚀 Proxy = select, ♻️ Auto, DIRECT, HK, JP\n"));
    assert!(!text.contains("Relay"));
    assert!(!text.contains("USER-AGENT"));
    assert!(text.contains("GEOIP,CN,🎯 Direct\nFINAL,🐟 Final\n"));
}

#[test]
fn baseline_from_settings() {
    let settings = parse_settings("clash:\n  port: 7990\n  mode: global\n  secret: s\n").unwrap();
    let out = convert_sources(&request(Dialect::Clash), &fetcher(), &settings).unwrap();
    let doc: serde_yml::Value = serde_yml::from_str(&out.output).unwrap();
    assert_eq!(doc["port"].as_u64(), Some(7990));
    assert_eq!(doc["mode"].as_str(), Some("global"));
    assert_eq!(doc["secret"].as_str(), Some("s"));
    assert_eq!(doc["socks-port"].as_u64(), Some(7891));
}

#[test]
fn converters_never_touch_nodes() {
    let report = parse_subscription(SUBSCRIPTION, SubFormat::Line).unwrap();
    let before = report.nodes.clone();
    let rules = RuleConfiguration::default();

    ClashConverter::new(Default::default())
        .convert(&report.nodes, &rules)
        .unwrap();
    SurgeConverter::new(Default::default())
        .convert(&report.nodes, &rules)
        .unwrap();
    assert_eq!(report.nodes, before);
}
