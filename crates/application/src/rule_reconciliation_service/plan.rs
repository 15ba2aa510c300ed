use edgelimit_core::RemoteRuleId;
use edgelimit_domain::{RateLimitRule, RemoteRule, RuleField};

use super::ReconcileOptions;

/// Decision taken for one desired rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// No usable rule exists; create one.
    Create,
    /// A rule with the same URL exists but differs.
    Update {
        /// Rule that will be replaced.
        rule_id: RemoteRuleId,
        /// Compared fields that differ.
        changed_fields: Vec<RuleField>,
    },
    /// A rule with the same URL already matches.
    Unchanged {
        /// The matching rule.
        rule_id: RemoteRuleId,
    },
}

impl ReconcilePlan {
    /// Returns whether carrying out the plan writes to the store.
    #[must_use]
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }

    /// Returns a stable label for logs and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update { .. } => "update",
            Self::Unchanged { .. } => "unchanged",
        }
    }
}

/// Finds the rule keyed by `url`.
///
/// The store does not enforce unique URLs; with duplicates the first rule in
/// list order wins.
#[must_use]
pub fn find_existing<'a>(rules: &'a [RemoteRule], url: &str) -> Option<&'a RemoteRule> {
    rules.iter().find(|rule| rule.matches_url(url))
}

/// Decides how to converge `existing_rules` towards `desired`.
#[must_use]
pub fn plan_reconciliation(
    existing_rules: &[RemoteRule],
    desired: &RateLimitRule,
    options: ReconcileOptions,
) -> ReconcilePlan {
    let existing = find_existing(existing_rules, desired.url());

    match existing {
        Some(existing) if options.update_if_exists => {
            let changed_fields = desired.changed_fields(existing.rule());
            if changed_fields.is_empty() {
                ReconcilePlan::Unchanged {
                    rule_id: existing.id().clone(),
                }
            } else {
                ReconcilePlan::Update {
                    rule_id: existing.id().clone(),
                    changed_fields,
                }
            }
        }
        _ => ReconcilePlan::Create,
    }
}
