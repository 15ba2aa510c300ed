use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use edgelimit_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

mod diff;
mod input;


pub use diff::RuleField;
pub use input::{
    DEFAULT_ACTION_BODY, DEFAULT_ACTION_CONTENT_TYPE, RateLimitRuleInput, parse_status_codes,
};

/// Smallest accepted request threshold.
pub const THRESHOLD_MIN: u32 = 2;
/// Largest accepted request threshold.
pub const THRESHOLD_MAX: u32 = 1_000_000;
/// Shortest accepted counting period in seconds.
pub const PERIOD_MIN_SECONDS: u32 = 2;
/// Longest accepted counting period in seconds.
pub const PERIOD_MAX_SECONDS: u32 = 86_400;

/// What happens to traffic that exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Blocks matching traffic for the action timeout.
    Ban,
    /// Only logs matching traffic.
    Simulate,
    /// Serves a challenge page. Only ever observed on remote rules.
    Challenge,
    /// Serves a JavaScript challenge. Only ever observed on remote rules.
    JsChallenge,
    /// Serves a managed challenge. Only ever observed on remote rules.
    ManagedChallenge,
}

impl ActionMode {
    /// Returns the stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Simulate => "simulate",
            Self::Challenge => "challenge",
            Self::JsChallenge => "js_challenge",
            Self::ManagedChallenge => "managed_challenge",
        }
    }
}

impl Display for ActionMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ActionMode {
    type Err = AppError;

    /// Parses a mode that may be requested for a managed rule.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ban" => Ok(Self::Ban),
            "simulate" => Ok(Self::Simulate),
            _ => Err(AppError::Validation(format!(
                "action mode must be 'ban' or 'simulate', got '{value}'"
            ))),
        }
    }
}

/// Request half of a rule's match predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMatch {
    #[serde(default)]
    methods: BTreeSet<String>,
    #[serde(default)]
    schemes: BTreeSet<String>,
    url: String,
}

impl RequestMatch {
    /// Returns the HTTP methods the rule counts.
    #[must_use]
    pub fn methods(&self) -> &BTreeSet<String> {
        &self.methods
    }

    /// Returns the URL schemes the rule counts.
    #[must_use]
    pub fn schemes(&self) -> &BTreeSet<String> {
        &self.schemes
    }

    /// Returns the URL pattern, the natural key of a rule within its zone.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Response half of a rule's match predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMatch {
    #[serde(rename = "status", default)]
    status_codes: BTreeSet<u16>,
    #[serde(default)]
    origin_traffic: bool,
}

impl ResponseMatch {
    /// Returns the origin status codes that count towards the threshold.
    #[must_use]
    pub fn status_codes(&self) -> &BTreeSet<u16> {
        &self.status_codes
    }

    /// Returns whether responses served by the origin are counted.
    #[must_use]
    pub fn origin_traffic(&self) -> bool {
        self.origin_traffic
    }
}

/// Structured match predicate of a rate-limit rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    request: RequestMatch,
    #[serde(default)]
    response: ResponseMatch,
}

impl RuleMatch {
    /// Returns the request predicate.
    #[must_use]
    pub fn request(&self) -> &RequestMatch {
        &self.request
    }

    /// Returns the response predicate.
    #[must_use]
    pub fn response(&self) -> &ResponseMatch {
        &self.response
    }
}

/// Custom response served while an action is in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    content_type: String,
    body: String,
}

impl ActionResponse {
    /// Returns the response content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Returns the response body.
    #[must_use]
    pub fn body(&self) -> &str {
        self.body.as_str()
    }
}

/// Action applied once the threshold is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    mode: ActionMode,
    #[serde(rename = "timeout", default)]
    timeout_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<ActionResponse>,
}

impl RuleAction {
    /// Returns the action mode.
    #[must_use]
    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    /// Returns how long the action stays in effect.
    #[must_use]
    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds
    }

    /// Returns the custom response, when one is configured.
    #[must_use]
    pub fn response(&self) -> Option<&ActionResponse> {
        self.response.as_ref()
    }
}

/// Rate-limit policy for one URL pattern of a zone.
///
/// Equality is structural over every field, which are exactly the fields
/// reconciliation compares. The remote identifier lives on
/// [`crate::RemoteRule`], so a freshly built rule has no identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    #[serde(default)]
    description: String,
    #[serde(default)]
    disabled: bool,
    threshold: u32,
    #[serde(rename = "period")]
    period_seconds: u32,
    #[serde(rename = "match")]
    rule_match: RuleMatch,
    action: RuleAction,
}

impl RateLimitRule {
    /// Builds a validated rule from raw input values.
    ///
    /// Bounds are checked here, so an out-of-range rule never reaches a store.
    pub fn new(input: RateLimitRuleInput) -> AppResult<Self> {
        let RateLimitRuleInput {
            description,
            disabled,
            threshold,
            period_seconds,
            methods,
            schemes,
            url,
            status_codes,
            origin_traffic,
            action_mode,
            action_timeout_seconds,
            action_content_type,
            action_body,
        } = input;

        let threshold = bounded("threshold", threshold, THRESHOLD_MIN, THRESHOLD_MAX)?;
        let period_seconds = bounded(
            "period_seconds",
            period_seconds,
            PERIOD_MIN_SECONDS,
            PERIOD_MAX_SECONDS,
        )?;

        let url = NonEmptyString::new(url.trim())
            .map_err(|_| AppError::Validation("match url must not be empty".to_owned()))?;

        Ok(Self {
            description,
            disabled,
            threshold,
            period_seconds,
            rule_match: RuleMatch {
                request: RequestMatch {
                    methods: input::normalize_tokens("match method", &methods)?,
                    schemes: input::normalize_tokens("match scheme", &schemes)?,
                    url: url.into(),
                },
                response: ResponseMatch {
                    status_codes: parse_status_codes(&status_codes)?,
                    origin_traffic,
                },
            },
            action: RuleAction {
                mode: action_mode,
                timeout_seconds: action_timeout_seconds,
                response: Some(ActionResponse {
                    content_type: action_content_type,
                    body: action_body,
                }),
            },
        })
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns whether the rule is switched off.
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the request count that triggers the action.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns the counting window in seconds.
    #[must_use]
    pub fn period_seconds(&self) -> u32 {
        self.period_seconds
    }

    /// Returns the match predicate.
    #[must_use]
    pub fn rule_match(&self) -> &RuleMatch {
        &self.rule_match
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> &RuleAction {
        &self.action
    }

    /// Returns the URL pattern used to correlate desired and observed rules.
    #[must_use]
    pub fn url(&self) -> &str {
        self.rule_match.request.url()
    }
}

fn bounded(field: &'static str, value: i64, min: u32, max: u32) -> AppResult<u32> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(AppError::OutOfRange {
            field,
            value,
            min: i64::from(min),
            max: i64::from(max),
        });
    }

    u32::try_from(value)
        .map_err(|error| AppError::Internal(format!("{field} conversion failed: {error}")))
}
