use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use edgelimit_application::{RemoteRuleStore, ZoneDirectory};
use edgelimit_core::{AppError, AppResult, RemoteRuleId, ZoneId};
use edgelimit_domain::{RateLimitRule, RemoteRule};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct InMemoryRuleState {
    zones: HashMap<ZoneId, Vec<RemoteRule>>,
    next_rule_number: u64,
    mutation_count: u64,
}

/// In-memory rule store for tests and offline runs.
///
/// Keeps rules per zone in insertion order and, like the remote API, does not
/// enforce unique URLs.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    zone_names: BTreeSet<String>,
    state: RwLock<InMemoryRuleState>,
}

impl InMemoryRuleStore {
    /// Creates a store that knows the given zone names.
    ///
    /// Each name resolves to a zone identifier equal to the name.
    #[must_use]
    pub fn new<I, S>(zone_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zone_names: zone_names.into_iter().map(Into::into).collect(),
            state: RwLock::default(),
        }
    }

    /// Seeds a zone with already persisted rules.
    #[must_use]
    pub fn with_rules(self, zone_id: ZoneId, rules: Vec<RemoteRule>) -> Self {
        let mut state = self.state.into_inner();
        state.zones.entry(zone_id).or_default().extend(rules);

        Self {
            zone_names: self.zone_names,
            state: RwLock::new(state),
        }
    }

    /// Returns a snapshot of the rules stored for a zone.
    pub async fn rules(&self, zone_id: &ZoneId) -> Vec<RemoteRule> {
        self.state
            .read()
            .await
            .zones
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns how many create or update calls succeeded.
    pub async fn mutation_count(&self) -> u64 {
        self.state.read().await.mutation_count
    }
}

#[async_trait]
impl ZoneDirectory for InMemoryRuleStore {
    async fn resolve_zone(&self, zone_name: &str) -> AppResult<ZoneId> {
        if !self.zone_names.contains(zone_name) {
            return Err(AppError::NotFound(format!("zone '{zone_name}' not found")));
        }

        ZoneId::new(zone_name)
    }
}

#[async_trait]
impl RemoteRuleStore for InMemoryRuleStore {
    async fn list_rules(&self, zone_id: &ZoneId) -> AppResult<Vec<RemoteRule>> {
        Ok(self.rules(zone_id).await)
    }

    async fn create_rule(&self, zone_id: &ZoneId, rule: &RateLimitRule) -> AppResult<RemoteRule> {
        let mut state = self.state.write().await;
        state.next_rule_number = state.next_rule_number.saturating_add(1);
        let rule_id = RemoteRuleId::new(format!("rl-{}", state.next_rule_number))?;
        let created = RemoteRule::new(rule_id, rule.clone());

        state
            .zones
            .entry(zone_id.clone())
            .or_default()
            .push(created.clone());
        state.mutation_count = state.mutation_count.saturating_add(1);

        Ok(created)
    }

    async fn update_rule(
        &self,
        zone_id: &ZoneId,
        rule_id: &RemoteRuleId,
        rule: &RateLimitRule,
    ) -> AppResult<RemoteRule> {
        let mut state = self.state.write().await;
        let slot = state
            .zones
            .get_mut(zone_id)
            .and_then(|rules| rules.iter_mut().find(|existing| existing.id() == rule_id))
            .ok_or_else(|| {
                AppError::RemoteStore(format!("rate limit rule '{rule_id}' not found"))
            })?;

        let updated = RemoteRule::new(rule_id.clone(), rule.clone());
        *slot = updated.clone();
        state.mutation_count = state.mutation_count.saturating_add(1);

        Ok(updated)
    }
}
