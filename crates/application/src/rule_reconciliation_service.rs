//! Converges a zone's remote rate-limit rules towards one desired rule.
//!
//! Every pass lists the zone's rules, picks the first rule keyed by the same
//! URL pattern and issues at most one mutating call. Two passes racing on the
//! same zone and URL can both decide to create, because the remote store has
//! no uniqueness constraint on the URL; callers serialize runs per zone if
//! that matters to them.

use std::sync::Arc;

use edgelimit_core::{AppResult, ZoneId};
use edgelimit_domain::{RateLimitRule, RemoteRule};
use tracing::{debug, info};

use crate::rule_store_ports::RemoteRuleStore;

mod plan;


pub use plan::{ReconcilePlan, find_existing, plan_reconciliation};

/// Knobs for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Update a rule with the same URL when it differs. When `false`, a new
    /// rule is always created, even next to an existing one.
    pub update_if_exists: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            update_if_exists: true,
        }
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The remote rule already matched; nothing was written.
    Unchanged,
    /// A rule was created; carries the store's response.
    Created(RemoteRule),
    /// An existing rule was replaced; carries the store's response.
    Updated(RemoteRule),
}

impl ReconcileOutcome {
    /// Returns whether the remote store was modified.
    #[must_use]
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Returns the rule written by this pass, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&RemoteRule> {
        match self {
            Self::Unchanged => None,
            Self::Created(rule) | Self::Updated(rule) => Some(rule),
        }
    }

    /// Returns a stable label for logs and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
        }
    }
}

/// Application service reconciling desired rules against a remote store.
#[derive(Clone)]
pub struct RuleReconciliationService {
    store: Arc<dyn RemoteRuleStore>,
}

impl RuleReconciliationService {
    /// Creates a reconciliation service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteRuleStore>) -> Self {
        Self { store }
    }

    /// Computes what [`Self::reconcile`] would do without writing anything.
    pub async fn preview(
        &self,
        zone_id: &ZoneId,
        desired: &RateLimitRule,
        options: ReconcileOptions,
    ) -> AppResult<ReconcilePlan> {
        let existing_rules = self.store.list_rules(zone_id).await?;
        Ok(plan_reconciliation(&existing_rules, desired, options))
    }

    /// Makes the zone hold `desired`, writing at most once.
    ///
    /// Store failures are returned as-is; nothing is retried or rolled back.
    pub async fn reconcile(
        &self,
        zone_id: &ZoneId,
        desired: &RateLimitRule,
        options: ReconcileOptions,
    ) -> AppResult<ReconcileOutcome> {
        let existing_rules = self.store.list_rules(zone_id).await?;
        debug!(
            zone_id = %zone_id,
            rule_count = existing_rules.len(),
            "listed zone rate limit rules"
        );

        let plan = plan_reconciliation(&existing_rules, desired, options);
        let outcome = match plan {
            ReconcilePlan::Create => {
                let created = self.store.create_rule(zone_id, desired).await?;
                ReconcileOutcome::Created(created)
            }
            ReconcilePlan::Update {
                rule_id,
                changed_fields,
            } => {
                debug!(
                    zone_id = %zone_id,
                    rule_id = %rule_id,
                    changed_fields = ?changed_fields,
                    "rate limit rule differs from desired definition"
                );
                let updated = self.store.update_rule(zone_id, &rule_id, desired).await?;
                ReconcileOutcome::Updated(updated)
            }
            ReconcilePlan::Unchanged { .. } => ReconcileOutcome::Unchanged,
        };

        info!(
            zone_id = %zone_id,
            url = %desired.url(),
            outcome = outcome.as_str(),
            rule_id = outcome.rule().map(|rule| rule.id().as_str()).unwrap_or("-"),
            "rate limit rule reconciled"
        );

        Ok(outcome)
    }
}
