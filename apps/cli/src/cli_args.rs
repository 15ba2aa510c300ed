use std::str::FromStr;

use clap::Parser;
use edgelimit_core::AppResult;
use edgelimit_domain::{ActionMode, RateLimitRuleInput};

/// Makes one Cloudflare zone rate-limit rule match the given definition.
///
/// Unset rule options fall back to the built-in defaults: threshold 60,
/// period 60, methods GET,POST, schemes HTTP,HTTPS, status 401, origin
/// traffic counted, action ban for 86400 seconds with an XML error body.
#[derive(Debug, Parser)]
#[command(name = "edgelimit", version, about)]
pub struct CliArgs {
    /// Zone name the rule belongs to.
    #[arg(long, env = "EDGELIMIT_ZONE")]
    pub zone: String,

    /// Whether the rule should exist (`present`) or not (`absent`, unsupported).
    #[arg(long, env = "EDGELIMIT_STATE", default_value = "present")]
    pub state: String,

    /// Account email, used together with `--account-api-token`.
    #[arg(long, env = "EDGELIMIT_ACCOUNT_EMAIL")]
    pub account_email: Option<String>,

    /// Global API key of the account.
    #[arg(long, env = "EDGELIMIT_ACCOUNT_API_TOKEN", hide_env_values = true)]
    pub account_api_token: Option<String>,

    /// Free-text rule description.
    #[arg(long)]
    pub description: Option<String>,

    /// Create or keep the rule switched off.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub disabled: Option<bool>,

    /// Requests per period that trigger the action.
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// Counting period in seconds.
    #[arg(long, allow_negative_numbers = true)]
    pub period: Option<i64>,

    /// HTTP methods to count (repeat or comma-separate).
    #[arg(long = "match-method", value_delimiter = ',')]
    pub match_methods: Vec<String>,

    /// URL schemes to count (repeat or comma-separate).
    #[arg(long = "match-scheme", value_delimiter = ',')]
    pub match_schemes: Vec<String>,

    /// URL pattern the rule applies to; identifies the rule within the zone.
    #[arg(long)]
    pub match_url: String,

    /// Origin status codes to count (repeat or comma-separate).
    #[arg(long = "match-response-status", value_delimiter = ',')]
    pub match_response_status: Vec<String>,

    /// Count responses served by the origin.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub match_response_origin: Option<bool>,

    /// Action mode: `ban` or `simulate`.
    #[arg(long)]
    pub action_mode: Option<String>,

    /// Seconds the action stays in effect.
    #[arg(long)]
    pub action_timeout: Option<u32>,

    /// Body served while the action is in effect.
    #[arg(long)]
    pub action_body: Option<String>,

    /// Content type of the action body.
    #[arg(long)]
    pub action_content_type: Option<String>,

    /// Always create a new rule instead of updating one with the same URL.
    #[arg(long)]
    pub no_update: bool,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub check: bool,
}

impl CliArgs {
    /// Merges the given options over the rule defaults.
    pub fn rule_input(&self) -> AppResult<RateLimitRuleInput> {
        let defaults = RateLimitRuleInput::new(self.match_url.as_str());
        let action_mode = self
            .action_mode
            .as_deref()
            .map(ActionMode::from_str)
            .transpose()?
            .unwrap_or(defaults.action_mode);

        Ok(RateLimitRuleInput {
            description: self.description.clone().unwrap_or(defaults.description),
            disabled: self.disabled.unwrap_or(defaults.disabled),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            period_seconds: self.period.unwrap_or(defaults.period_seconds),
            methods: non_empty_or(&self.match_methods, defaults.methods),
            schemes: non_empty_or(&self.match_schemes, defaults.schemes),
            url: defaults.url,
            status_codes: non_empty_or(&self.match_response_status, defaults.status_codes),
            origin_traffic: self
                .match_response_origin
                .unwrap_or(defaults.origin_traffic),
            action_mode,
            action_timeout_seconds: self
                .action_timeout
                .unwrap_or(defaults.action_timeout_seconds),
            action_content_type: self
                .action_content_type
                .clone()
                .unwrap_or(defaults.action_content_type),
            action_body: self.action_body.clone().unwrap_or(defaults.action_body),
        })
    }
}

fn non_empty_or(values: &[String], fallback: Vec<String>) -> Vec<String> {
    if values.is_empty() {
        fallback
    } else {
        values.to_vec()
    }
}
