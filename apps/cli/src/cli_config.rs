use std::env;
use std::time::Duration;

use edgelimit_core::{AppError, AppResult};
use edgelimit_infrastructure::{CLOUDFLARE_API_BASE_URL, CloudflareCredentials};
use url::Url;

use crate::cli_args::CliArgs;

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 15;

/// Runtime settings that come from the environment rather than rule options.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_base_url: Url,
    pub http_timeout: Duration,
    pub credentials: CloudflareCredentials,
}

impl CliConfig {
    pub fn load(args: &CliArgs) -> AppResult<Self> {
        Self::from_lookup(args, |name| env::var(name).ok())
    }

    fn from_lookup<F>(args: &CliArgs, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = non_empty(&lookup, "EDGELIMIT_API_BASE_URL")
            .unwrap_or_else(|| CLOUDFLARE_API_BASE_URL.to_owned());
        let api_base_url = Url::parse(api_base_url.trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!(
                "invalid EDGELIMIT_API_BASE_URL value '{api_base_url}': {error}"
            ))
        })?;

        let http_timeout_seconds = parse_u64(
            &lookup,
            "EDGELIMIT_HTTP_TIMEOUT_SECONDS",
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;
        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "EDGELIMIT_HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let credentials = resolve_credentials(
            args.account_email.as_deref(),
            args.account_api_token.as_deref(),
            &lookup,
        )?;

        Ok(Self {
            api_base_url,
            http_timeout: Duration::from_secs(http_timeout_seconds),
            credentials,
        })
    }
}

/// Picks explicit credentials first, then the ambient Cloudflare environment.
fn resolve_credentials<F>(
    email: Option<&str>,
    api_key: Option<&str>,
    lookup: &F,
) -> AppResult<CloudflareCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let email = email.map(str::trim).filter(|value| !value.is_empty());
    let api_key = api_key.map(str::trim).filter(|value| !value.is_empty());

    match (email, api_key) {
        (Some(email), Some(key)) => {
            return Ok(CloudflareCredentials::ApiKey {
                email: email.to_owned(),
                key: key.to_owned(),
            });
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(AppError::Validation(
                "account_email and account_api_token must be given together".to_owned(),
            ));
        }
        (None, None) => {}
    }

    if let Some(token) = non_empty(lookup, "CLOUDFLARE_API_TOKEN") {
        return Ok(CloudflareCredentials::ApiToken(token));
    }

    match (
        non_empty(lookup, "CLOUDFLARE_EMAIL"),
        non_empty(lookup, "CLOUDFLARE_API_KEY"),
    ) {
        (Some(email), Some(key)) => Ok(CloudflareCredentials::ApiKey { email, key }),
        _ => Err(AppError::Validation(
            "no Cloudflare credentials: pass --account-email and --account-api-token, \
             or set CLOUDFLARE_API_TOKEN or CLOUDFLARE_EMAIL and CLOUDFLARE_API_KEY"
                .to_owned(),
        )),
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_u64<F>(lookup: &F, name: &str, default: u64) -> AppResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
