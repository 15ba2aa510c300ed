use async_trait::async_trait;
use edgelimit_core::{AppResult, RemoteRuleId, ZoneId};
use edgelimit_domain::{RateLimitRule, RemoteRule};

/// Port for the remote service that persists a zone's rate-limit rules.
///
/// Implementations report every failure as `AppError::RemoteStore` and do not
/// retry.
#[async_trait]
pub trait RemoteRuleStore: Send + Sync {
    /// Lists every rule defined for the zone, in store order.
    async fn list_rules(&self, zone_id: &ZoneId) -> AppResult<Vec<RemoteRule>>;

    /// Creates a rule and returns it with its newly assigned identifier.
    async fn create_rule(&self, zone_id: &ZoneId, rule: &RateLimitRule) -> AppResult<RemoteRule>;

    /// Replaces the definition of an existing rule.
    async fn update_rule(
        &self,
        zone_id: &ZoneId,
        rule_id: &RemoteRuleId,
        rule: &RateLimitRule,
    ) -> AppResult<RemoteRule>;
}
