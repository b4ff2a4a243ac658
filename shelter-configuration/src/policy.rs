//! Policy table configuration.

use serde::{Deserialize, Serialize};
use shelter::policy::PolicyRule;
use shelter::{PathMatcher, PolicyTable, Strategy};
use smol_str::SmolStr;

use crate::error::ConfigError;

/// One path rule. Exactly one of `prefix` and `suffix` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRule {
    /// Match paths starting with this string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<SmolStr>,
    /// Match paths ending with this string, ignoring ASCII case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<SmolStr>,
    /// Strategy for matching paths.
    pub strategy: Strategy,
}

impl ConfigRule {
    fn into_rule(self, index: usize) -> Result<PolicyRule, ConfigError> {
        let matcher = match (self.prefix, self.suffix) {
            (Some(prefix), None) => PathMatcher::Prefix(prefix),
            (None, Some(suffix)) => PathMatcher::Suffix(suffix),
            _ => return Err(ConfigError::InvalidRule { index }),
        };
        Ok(PolicyRule::new(matcher, self.strategy))
    }
}

/// Ordered rule list plus the strategy for paths no rule matches.
///
/// Rules are evaluated top to bottom and the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigPolicy {
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<ConfigRule>,
    /// Strategy for unmatched paths.
    #[serde(default)]
    pub default: Strategy,
}

impl ConfigPolicy {
    /// Builds the policy table.
    pub fn into_table(self) -> Result<PolicyTable, ConfigError> {
        let mut builder = PolicyTable::builder().default_strategy(self.default);
        for (index, rule) in self.rules.into_iter().enumerate() {
            builder = builder.rule(rule.into_rule(index)?);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rules_keep_their_order() {
        let yaml = r#"
default: network_only
rules:
  - prefix: /assets/
    strategy: cache_first
  - suffix: .JS
    strategy: stale_while_revalidate
"#;
        let policy: ConfigPolicy = serde_saphyr::from_str(yaml).unwrap();
        let table = policy.into_table().unwrap();

        assert_eq!(table.default_strategy(), Strategy::NetworkOnly);
        assert_eq!(table.select("/assets/app.js"), Strategy::CacheFirst);
        assert_eq!(table.select("/vendor/lib.js"), Strategy::StaleWhileRevalidate);
        assert_eq!(table.select("/recalls"), Strategy::NetworkOnly);
    }

    #[test]
    fn rule_needs_exactly_one_matcher() {
        let both = ConfigPolicy {
            rules: vec![ConfigRule {
                prefix: Some("/a".into()),
                suffix: Some(".js".into()),
                strategy: Strategy::CacheFirst,
            }],
            default: Strategy::default(),
        };
        assert!(matches!(
            both.into_table(),
            Err(ConfigError::InvalidRule { index: 0 })
        ));

        let neither = ConfigPolicy {
            rules: vec![
                ConfigRule {
                    prefix: Some("/a".into()),
                    suffix: None,
                    strategy: Strategy::CacheFirst,
                },
                ConfigRule {
                    prefix: None,
                    suffix: None,
                    strategy: Strategy::CacheFirst,
                },
            ],
            default: Strategy::default(),
        };
        assert!(matches!(
            neither.into_table(),
            Err(ConfigError::InvalidRule { index: 1 })
        ));
    }
}
