use std::collections::BTreeSet;

use edgelimit_core::{AppError, AppResult};

use super::ActionMode;

/// Body served to banned clients when no custom body is given.
pub const DEFAULT_ACTION_BODY: &str = "<error>This request has been rate-limited.</error>";
/// Content type of [`DEFAULT_ACTION_BODY`].
pub const DEFAULT_ACTION_CONTENT_TYPE: &str = "text/xml";

/// Raw, unvalidated rule parameters.
///
/// `Default` is the defaults catalogue; only `url` has no meaningful default
/// and is left empty, which fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRuleInput {
    /// Free-text label.
    pub description: String,
    /// Whether the rule is switched off.
    pub disabled: bool,
    /// Request count that triggers the action.
    pub threshold: i64,
    /// Counting window in seconds.
    pub period_seconds: i64,
    /// HTTP methods to count.
    pub methods: Vec<String>,
    /// URL schemes to count.
    pub schemes: Vec<String>,
    /// URL pattern the rule applies to.
    pub url: String,
    /// Origin status codes to count, as given by the caller.
    pub status_codes: Vec<String>,
    /// Whether responses served by the origin are counted.
    pub origin_traffic: bool,
    /// Action taken once the threshold is exceeded.
    pub action_mode: ActionMode,
    /// How long the action stays in effect, in seconds.
    pub action_timeout_seconds: u32,
    /// Content type of the custom response.
    pub action_content_type: String,
    /// Body of the custom response.
    pub action_body: String,
}

impl RateLimitRuleInput {
    /// Creates an input with every default applied for the given URL pattern.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for RateLimitRuleInput {
    fn default() -> Self {
        Self {
            description: String::new(),
            disabled: false,
            threshold: 60,
            period_seconds: 60,
            methods: vec!["GET".to_owned(), "POST".to_owned()],
            schemes: vec!["HTTP".to_owned(), "HTTPS".to_owned()],
            url: String::new(),
            status_codes: vec!["401".to_owned()],
            origin_traffic: true,
            action_mode: ActionMode::Ban,
            action_timeout_seconds: 86_400,
            action_content_type: DEFAULT_ACTION_CONTENT_TYPE.to_owned(),
            action_body: DEFAULT_ACTION_BODY.to_owned(),
        }
    }
}

/// Coerces textual status codes into integers.
///
/// Every entry must be a number in `100..=599`.
pub fn parse_status_codes<S: AsRef<str>>(values: &[S]) -> AppResult<BTreeSet<u16>> {
    values
        .iter()
        .map(|value| {
            let value = value.as_ref().trim();
            let code = value.parse::<u16>().map_err(|_| {
                AppError::Validation(format!("status code '{value}' is not a number"))
            })?;

            if !(100..=599).contains(&code) {
                return Err(AppError::Validation(format!(
                    "status code {code} is not a valid HTTP status"
                )));
            }

            Ok(code)
        })
        .collect()
}

pub(super) fn normalize_tokens(label: &str, values: &[String]) -> AppResult<BTreeSet<String>> {
    values
        .iter()
        .map(|value| {
            let token = value.trim();
            if token.is_empty() {
                return Err(AppError::Validation(format!("{label} must not be empty")));
            }

            Ok(token.to_ascii_uppercase())
        })
        .collect()
}
