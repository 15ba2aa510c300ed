use std::fmt::{Display, Formatter};

use serde::Serialize;

use super::RateLimitRule;

/// Rule attribute taken into account when comparing desired and observed rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    /// The action block.
    Action,
    /// The match predicate.
    Match,
    /// The disabled toggle.
    Disabled,
    /// The counting window.
    Period,
    /// The request threshold.
    Threshold,
    /// The description.
    Description,
}

impl RuleField {
    /// Compared fields in comparison order.
    pub const ALL: [Self; 6] = [
        Self::Action,
        Self::Match,
        Self::Disabled,
        Self::Period,
        Self::Threshold,
        Self::Description,
    ];

    /// Returns the wire name of the field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Match => "match",
            Self::Disabled => "disabled",
            Self::Period => "period",
            Self::Threshold => "threshold",
            Self::Description => "description",
        }
    }

    fn differs(self, left: &RateLimitRule, right: &RateLimitRule) -> bool {
        match self {
            Self::Action => left.action != right.action,
            Self::Match => left.rule_match != right.rule_match,
            Self::Disabled => left.disabled != right.disabled,
            Self::Period => left.period_seconds != right.period_seconds,
            Self::Threshold => left.threshold != right.threshold,
            Self::Description => left.description != right.description,
        }
    }
}

impl Display for RuleField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl RateLimitRule {
    /// Lists the compared fields whose values differ from `other`.
    #[must_use]
    pub fn changed_fields(&self, other: &RateLimitRule) -> Vec<RuleField> {
        RuleField::ALL
            .into_iter()
            .filter(|field| field.differs(self, other))
            .collect()
    }
}
