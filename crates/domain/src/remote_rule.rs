use edgelimit_core::RemoteRuleId;
use serde::{Deserialize, Serialize};

use crate::RateLimitRule;

/// Rate-limit rule as persisted by the remote store.
///
/// Serializes as the remote payload: the identifier next to the rule fields.
/// Fields the model does not know about are ignored when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRule {
    id: RemoteRuleId,
    #[serde(flatten)]
    rule: RateLimitRule,
}

impl RemoteRule {
    /// Pairs a rule with the identifier the store assigned to it.
    #[must_use]
    pub fn new(id: RemoteRuleId, rule: RateLimitRule) -> Self {
        Self { id, rule }
    }

    /// Returns the remote identifier.
    #[must_use]
    pub fn id(&self) -> &RemoteRuleId {
        &self.id
    }

    /// Returns the persisted rule definition.
    #[must_use]
    pub fn rule(&self) -> &RateLimitRule {
        &self.rule
    }

    /// Returns whether this rule is keyed by the given URL pattern.
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        self.rule.url() == url
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteRule;
    use crate::ActionMode;

    const CLOUDFLARE_PAYLOAD: &str = r#"{
        "id": "372e67954025e0ba6aaa6d586b9e0b59",
        "disabled": false,
        "description": "Prevent multiple login failures to mitigate brute force attacks",
        "match": {
            "request": {
                "methods": ["POST", "GET"],
                "schemes": ["HTTPS", "HTTP"],
                "url": "*.example.org/path*"
            },
            "response": {
                "status": [401, 403],
                "origin_traffic": true,
                "headers": [{"name": "Cf-Cache-Status", "op": "ne", "value": "HIT"}]
            }
        },
        "bypass": [{"name": "url", "value": "api.example.com/*"}],
        "threshold": 60,
        "period": 900,
        "action": {
            "mode": "simulate",
            "timeout": 86400,
            "response": {
                "content_type": "text/xml",
                "body": "<error>This request has been rate-limited.</error>"
            }
        }
    }"#;

    #[test]
    fn decodes_remote_payload_and_ignores_unknown_fields() {
        let rule = serde_json::from_str::<RemoteRule>(CLOUDFLARE_PAYLOAD);
        assert!(rule.is_ok());
        let Ok(rule) = rule else {
            return;
        };

        assert_eq!(rule.id().as_str(), "372e67954025e0ba6aaa6d586b9e0b59");
        assert_eq!(rule.rule().period_seconds(), 900);
        assert_eq!(rule.rule().action().mode(), ActionMode::Simulate);
        assert!(rule.matches_url("*.example.org/path*"));
        assert!(
            rule.rule()
                .rule_match()
                .response()
                .status_codes()
                .contains(&403)
        );
    }

    #[test]
    fn tolerates_challenge_rules_without_response_block() {
        let payload = r#"{
            "id": "abc",
            "threshold": 10,
            "period": 60,
            "match": {"request": {"url": "example.org/login"}},
            "action": {"mode": "managed_challenge"}
        }"#;

        let rule = serde_json::from_str::<RemoteRule>(payload);
        assert!(rule.is_ok());
        let Ok(rule) = rule else {
            return;
        };

        assert_eq!(rule.rule().action().mode(), ActionMode::ManagedChallenge);
        assert!(rule.rule().action().response().is_none());
        assert!(rule.rule().rule_match().request().methods().is_empty());
        assert_eq!(rule.rule().description(), "");
    }

    #[test]
    fn serializes_identifier_next_to_rule_fields() {
        let rule = serde_json::from_str::<RemoteRule>(CLOUDFLARE_PAYLOAD);
        let Ok(rule) = rule else {
            unreachable!();
        };

        let value = serde_json::to_value(&rule).unwrap_or_default();
        assert_eq!(value["id"], "372e67954025e0ba6aaa6d586b9e0b59");
        assert_eq!(value["period"], 900);
        assert_eq!(value["match"]["response"]["status"], serde_json::json!([401, 403]));
        assert!(value.get("bypass").is_none());
    }
}
