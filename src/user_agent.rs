//! Shared User-Agent string for probe and follow-up requests.
//!
//! Probes present as an ordinary desktop browser. Kit hosts frequently serve
//! a decoy or nothing at all to obvious tooling.

/// Browser User-Agent sent with every probe.
pub(crate) const PROBE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// User-Agent for seed feed downloads (identifies the tool to feed operators).
#[must_use]
pub(crate) fn feed_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("kitscan/{version} (phishing-kit-research)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_user_agent_looks_like_browser() {
        assert!(PROBE_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(!PROBE_USER_AGENT.contains("kitscan"));
    }

    #[test]
    fn test_feed_user_agent_contains_version() {
        let ua = feed_user_agent();
        assert_eq!(
            ua.strip_prefix("kitscan/")
                .and_then(|s| s.split(' ').next()),
            Some(env!("CARGO_PKG_VERSION"))
        );
    }
}
