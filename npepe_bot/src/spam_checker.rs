use std::{fmt::Display, sync::LazyLock};

use regex::Regex;
use url::Url;

use crate::{config::Config, misc::parse_url_like_telegram};

/// Phrases that show up in paid promotion and scam offers, lowercase.
const AD_PHRASES: &[&str] = &[
    "dm me",
    "dm for",
    "inbox me",
    "message me for",
    "paid promotion",
    "promote your",
    "promotion service",
    "pump your",
    "listing service",
    "guaranteed profit",
    "guaranteed returns",
    "100x signal",
    "free airdrop",
    "claim your airdrop",
    "send me your",
    "join my channel",
    "join my group",
    "investment opportunity",
    "earn $",
    "recover your",
];

/// Why a message was taken for spam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamReason {
    /// Links somewhere other than the project's own places.
    ForeignLink(String),
    /// Contains an advertising or scam phrase.
    AdPhrase(&'static str),
    /// Contains a Solana-style address that isn't ours.
    ForeignContractAddress,
    /// Contains an Ethereum-style address.
    EvmAddress,
}

impl Display for SpamReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpamReason::ForeignLink(host) => write!(f, "Unapproved link to {host}"),
            SpamReason::AdPhrase(phrase) => write!(f, "Advertising phrase \"{phrase}\""),
            SpamReason::ForeignContractAddress => write!(f, "Foreign contract address"),
            SpamReason::EvmAddress => write!(f, "Potential EVM Contract Address"),
        }
    }
}

/// Check a message for spam or advertising.
///
/// `text` is the message text or caption, `links` are the URLs found in its
/// entities and buttons. Links written plainly in `text` are found too.
#[must_use]
pub fn detect_spam(text: &str, links: &[Url], config: &Config) -> Option<SpamReason> {
    static BARE_LINK: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\b(?:https?://|www\.|t\.me/|telegram\.me/)[^\s<>()]+")
            .expect("Regex will always be valid")
    });
    static BASE58_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{32,44}\b").expect("Regex will always be valid")
    });
    static EVM_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b0x[a-fA-F0-9]{40}\b").expect("Regex will always be valid")
    });

    let text_links = BARE_LINK
        .find_iter(text)
        .filter_map(|x| parse_url_like_telegram(x.as_str()).ok());

    for url in links.iter().cloned().chain(text_links) {
        if !is_link_allowed(&url, config) {
            let host = url.host_str().unwrap_or("an unknown place").to_string();
            return Some(SpamReason::ForeignLink(host));
        }
    }

    let lower = text.to_lowercase();
    if let Some(phrase) = AD_PHRASES.iter().copied().find(|x| lower.contains(x)) {
        return Some(SpamReason::AdPhrase(phrase));
    }

    let foreign_address = BASE58_ADDRESS
        .find_iter(text)
        .map(|x| x.as_str())
        .filter(|x| x.chars().any(|c| c.is_ascii_digit()))
        .filter(|x| x.chars().any(|c| c.is_ascii_alphabetic()))
        .any(|x| x != config.contract_address);
    if foreign_address {
        return Some(SpamReason::ForeignContractAddress);
    }

    if EVM_ADDRESS.is_match(text) {
        return Some(SpamReason::EvmAddress);
    }

    None
}

/// Lowercase host without a leading `www.`.
fn bare_host(url: &Url) -> Option<String> {
    let host = url.domain()?.to_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    })
}

fn first_path_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.next().filter(|x| !x.is_empty())
}

/// Same account on the same kind of site as one of ours.
fn same_account(url: &Url, host: &str, ours: &Url, hosts: &[&str]) -> bool {
    if !hosts.contains(&host) {
        return false;
    }
    match (first_path_segment(url), first_path_segment(ours)) {
        (Some(theirs), Some(ours)) => theirs.eq_ignore_ascii_case(ours),
        _ => false,
    }
}

/// Returns `true` if the link points at one of the project's own places.
#[must_use]
pub fn is_link_allowed(url: &Url, config: &Config) -> bool {
    let Some(host) = bare_host(url) else {
        // An IP address or something weirder. Nobody posts those in good faith.
        return false;
    };

    if bare_host(&config.website_url).as_deref() == Some(host.as_str()) {
        return true;
    }

    if same_account(url, &host, &config.telegram_url, &["t.me", "telegram.me"]) {
        return true;
    }
    if same_account(url, &host, &config.twitter_url, &["x.com", "twitter.com"]) {
        return true;
    }

    // Token pages are fine as long as they're about our token.
    if matches!(host.as_str(), "pump.fun" | "dexscreener.com") {
        return url
            .as_str()
            .to_lowercase()
            .contains(&config.contract_address.to_lowercase());
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::config_with;

    fn check(text: &str) -> Option<SpamReason> {
        detect_spam(text, &[], &config_with(&[]))
    }

    #[test]
    fn normal_chatter_is_fine() {
        assert_eq!(check("gm frens, wen moon?"), None);
        assert_eq!(check("HODL! ribbit 🐸"), None);
        assert_eq!(check("What's the contract address?"), None);
        assert_eq!(check(""), None);
    }

    #[test]
    fn own_links_and_address_are_fine() {
        assert_eq!(check("CA: BJ65ym9UYPkcfLSUuE9j4uXYuiG6TgA4pFn393Eppump"), None);
        assert_eq!(check("join us at https://t.me/NPEPEVERSE"), None);
        assert_eq!(check("t.me/npepeverse is the chat"), None);
        assert_eq!(check("follow https://x.com/NPEPE_Verse/status/123"), None);
        assert_eq!(
            check("buy at https://pump.fun/BJ65ym9UYPkcfLSUuE9j4uXYuiG6TgA4pFn393Eppump"),
            None
        );
        assert_eq!(
            check("site: https://next-npepe-launchpad-2b8b3071.base44.app/roadmap"),
            None
        );
    }

    #[test]
    fn foreign_links_are_spam() {
        assert_eq!(
            check("best gains at https://scam.example.com/x"),
            Some(SpamReason::ForeignLink("scam.example.com".to_string()))
        );
        assert_eq!(
            check("come to t.me/other_group now"),
            Some(SpamReason::ForeignLink("t.me".to_string()))
        );
        assert_eq!(
            check("https://pump.fun/SomeOtherCoinpump"),
            Some(SpamReason::ForeignLink("pump.fun".to_string()))
        );
        assert_eq!(
            check("www.shady-exchange.io"),
            Some(SpamReason::ForeignLink("www.shady-exchange.io".to_string()))
        );
    }

    #[test]
    fn entity_links_are_checked() {
        let config = config_with(&[]);
        let bad = Url::parse("https://airdrop.example.org/claim").unwrap();
        assert_eq!(
            detect_spam("click here", &[bad], &config),
            Some(SpamReason::ForeignLink("airdrop.example.org".to_string()))
        );

        let good = Url::parse("https://t.me/NPEPEVERSE/123").unwrap();
        assert_eq!(detect_spam("click here", &[good], &config), None);
    }

    #[test]
    fn ad_phrases_are_spam() {
        assert_eq!(
            check("I can get you trending, DM me for details"),
            Some(SpamReason::AdPhrase("dm me"))
        );
        assert_eq!(
            check("Paid Promotion available for your coin"),
            Some(SpamReason::AdPhrase("paid promotion"))
        );
    }

    #[test]
    fn foreign_addresses_are_spam() {
        assert_eq!(
            check("aped into 7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr just now"),
            Some(SpamReason::ForeignContractAddress)
        );
        assert_eq!(
            check("new gem 0x6982508145454Ce325dDbE47a25d4ec3d2311933"),
            Some(SpamReason::EvmAddress)
        );
    }

    #[test]
    fn link_allow_list() {
        let config = config_with(&[
            ("TELEGRAM_URL", "https://t.me/SomeChat"),
            ("WEBSITE_URL", "https://www.frog.example/"),
        ]);
        let allowed = |x: &str| is_link_allowed(&Url::parse(x).unwrap(), &config);

        assert!(allowed("https://frog.example/about"));
        assert!(allowed("https://www.frog.example/"));
        assert!(allowed("https://telegram.me/somechat"));
        assert!(!allowed("https://t.me/NPEPEVERSE"));
        assert!(!allowed("https://t.me/"));
        assert!(!allowed("http://127.0.0.1/"));
        assert!(allowed(
            "https://dexscreener.com/solana/bj65ym9uypkcflsuue9j4uxyuig6tga4pfn393eppump"
        ));
    }
}
