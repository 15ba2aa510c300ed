//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod desired_state;
mod rate_limit_rule;
mod remote_rule;

pub use desired_state::DesiredState;
pub use rate_limit_rule::{
    ActionMode, ActionResponse, DEFAULT_ACTION_BODY, DEFAULT_ACTION_CONTENT_TYPE,
    PERIOD_MAX_SECONDS, PERIOD_MIN_SECONDS, RateLimitRule, RateLimitRuleInput, RequestMatch,
    ResponseMatch, RuleAction, RuleField, RuleMatch, THRESHOLD_MAX, THRESHOLD_MIN,
    parse_status_codes,
};
pub use remote_rule::RemoteRule;
