use std::fmt;

use serde::{Deserialize, Serialize};
use shelter_core::GenerationKind;
use smol_str::SmolStr;

/// Caching algorithm applied to a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serve from the store, touch the network only on a miss.
    CacheFirst,
    /// Serve from the store immediately and refresh it in the background.
    StaleWhileRevalidate,
    /// Always fetch, never read or write the store.
    NetworkOnly,
    /// Fetch and persist; fall back to any current generation when offline.
    #[default]
    NetworkWithFallback,
}

impl Strategy {
    /// Returns the strategy as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
            Strategy::NetworkOnly => "network_only",
            Strategy::NetworkWithFallback => "network_with_fallback",
        }
    }

    /// Generation the strategy reads from and writes into.
    ///
    /// Static assets live in their own generation; pages and every other
    /// response share the general-purpose `pages` generation. Network-only
    /// never touches the store and has none.
    pub const fn generation_kind(&self) -> Option<GenerationKind> {
        match self {
            Strategy::CacheFirst => Some(GenerationKind::Static),
            Strategy::StaleWhileRevalidate | Strategy::NetworkWithFallback => {
                Some(GenerationKind::Pages)
            }
            Strategy::NetworkOnly => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathMatcher {
    /// Path starts with the given string.
    Prefix(SmolStr),
    /// Path ends with the given string, compared ASCII case-insensitively.
    Suffix(SmolStr),
}

impl PathMatcher {
    /// Creates a prefix matcher.
    pub fn prefix(prefix: impl Into<SmolStr>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Creates a suffix matcher.
    pub fn suffix(suffix: impl Into<SmolStr>) -> Self {
        Self::Suffix(suffix.into())
    }

    /// Returns `true` if `path` satisfies the predicate.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathMatcher::Suffix(suffix) => {
                let (path, suffix) = (path.as_bytes(), suffix.as_bytes());
                path.len() >= suffix.len()
                    && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
            }
        }
    }
}

/// One `(predicate, strategy)` entry of a [`PolicyTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Path predicate.
    pub matcher: PathMatcher,
    /// Strategy applied on match.
    pub strategy: Strategy,
}

impl PolicyRule {
    /// Creates a rule.
    pub fn new(matcher: PathMatcher, strategy: Strategy) -> Self {
        Self { matcher, strategy }
    }
}

const ASSET_PREFIXES: &[&str] = &["/assets/", "/_next/static/"];

const ASSET_SUFFIXES: &[&str] = &[
    ".js", ".css", ".woff2", ".woff", ".png", ".jpg", ".jpeg", ".svg", ".ico", ".webp",
];

const PAGE_PREFIXES: &[&str] = &["/dashboard", "/recalls", "/sites", "/offline"];

/// Ordered routing table from URL path to [`Strategy`].
///
/// Rules are evaluated in order and the first match wins; a path no rule
/// matches gets the default strategy. A table cannot be changed once
/// built, so selection is a pure function of the path.
///
/// ```
/// use shelter::policy::{PolicyTable, Strategy};
///
/// let table = PolicyTable::default();
/// assert_eq!(table.select("/assets/app.js"), Strategy::CacheFirst);
/// assert_eq!(table.select("/recalls/42"), Strategy::StaleWhileRevalidate);
/// assert_eq!(table.select("/profile"), Strategy::NetworkWithFallback);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
    default: Strategy,
}

impl PolicyTable {
    /// Creates a new [`PolicyTableBuilder`] with no rules.
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::default()
    }

    /// Selects the strategy for `path`.
    pub fn select(&self, path: &str) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.strategy)
            .unwrap_or(self.default)
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Returns the strategy for unmatched paths.
    pub fn default_strategy(&self) -> Strategy {
        self.default
    }
}

impl Default for PolicyTable {
    /// Static asset rules first, then the page rules, default
    /// network-with-fallback.
    fn default() -> Self {
        let mut builder = PolicyTable::builder();
        for prefix in ASSET_PREFIXES {
            builder = builder.prefix(*prefix, Strategy::CacheFirst);
        }
        for suffix in ASSET_SUFFIXES {
            builder = builder.suffix(*suffix, Strategy::CacheFirst);
        }
        for prefix in PAGE_PREFIXES {
            builder = builder.prefix(*prefix, Strategy::StaleWhileRevalidate);
        }
        builder.build()
    }
}

/// Builder for [`PolicyTable`].
#[derive(Debug, Clone, Default)]
pub struct PolicyTableBuilder {
    rules: Vec<PolicyRule>,
    default: Strategy,
}

impl PolicyTableBuilder {
    /// Appends a rule. Earlier rules take priority.
    pub fn rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a prefix rule.
    pub fn prefix(self, prefix: impl Into<SmolStr>, strategy: Strategy) -> Self {
        self.rule(PolicyRule::new(PathMatcher::prefix(prefix), strategy))
    }

    /// Appends a suffix rule.
    pub fn suffix(self, suffix: impl Into<SmolStr>, strategy: Strategy) -> Self {
        self.rule(PolicyRule::new(PathMatcher::suffix(suffix), strategy))
    }

    /// Sets the strategy for unmatched paths.
    pub fn default_strategy(self, strategy: Strategy) -> Self {
        Self {
            default: strategy,
            ..self
        }
    }

    /// Builds the immutable table.
    pub fn build(self) -> PolicyTable {
        PolicyTable {
            rules: self.rules,
            default: self.default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_assets_are_cache_first() {
        let table = PolicyTable::default();
        for path in [
            "/assets/app.js",
            "/assets/logo",
            "/_next/static/chunks/main.js",
            "/favicon.ico",
            "/fonts/inter.woff2",
            "/img/HERO.PNG",
        ] {
            assert_eq!(table.select(path), Strategy::CacheFirst, "{path}");
        }
    }

    #[test]
    fn pages_are_stale_while_revalidate() {
        let table = PolicyTable::default();
        for path in ["/dashboard", "/recalls/42", "/sites", "/offline"] {
            assert_eq!(table.select(path), Strategy::StaleWhileRevalidate, "{path}");
        }
    }

    #[test]
    fn asset_rules_win_over_page_rules() {
        let table = PolicyTable::default();
        assert_eq!(table.select("/dashboard/chart.js"), Strategy::CacheFirst);
    }

    #[test]
    fn unmatched_paths_use_default() {
        let table = PolicyTable::default();
        assert_eq!(table.select("/"), Strategy::NetworkWithFallback);
        assert_eq!(table.select("/profile/settings"), Strategy::NetworkWithFallback);
        assert_eq!(table.select("/app.jsx"), Strategy::NetworkWithFallback);
    }

    #[test]
    fn first_match_wins() {
        let table = PolicyTable::builder()
            .prefix("/reports", Strategy::NetworkOnly)
            .suffix(".pdf", Strategy::CacheFirst)
            .default_strategy(Strategy::StaleWhileRevalidate)
            .build();
        assert_eq!(table.select("/reports/q1.pdf"), Strategy::NetworkOnly);
        assert_eq!(table.select("/menus/q1.pdf"), Strategy::CacheFirst);
        assert_eq!(table.select("/menus"), Strategy::StaleWhileRevalidate);
    }

    #[test]
    fn strategy_generations() {
        assert_eq!(
            Strategy::CacheFirst.generation_kind(),
            Some(GenerationKind::Static)
        );
        assert_eq!(
            Strategy::StaleWhileRevalidate.generation_kind(),
            Some(GenerationKind::Pages)
        );
        assert_eq!(
            Strategy::NetworkWithFallback.generation_kind(),
            Some(GenerationKind::Pages)
        );
        assert_eq!(Strategy::NetworkOnly.generation_kind(), None);
    }

    #[test]
    fn strategy_serde_names() {
        let json = serde_json::to_string(&Strategy::StaleWhileRevalidate).unwrap();
        assert_eq!(json, "\"stale_while_revalidate\"");
    }
}
