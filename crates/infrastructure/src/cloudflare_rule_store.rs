//! Cloudflare v4 API adapter for zone rate-limit rules.

use async_trait::async_trait;
use edgelimit_application::{RemoteRuleStore, ZoneDirectory};
use edgelimit_core::{AppError, AppResult, RemoteRuleId, ZoneId};
use edgelimit_domain::{RateLimitRule, RemoteRule};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

mod credentials;
mod envelope;

#[cfg(test)]
mod tests;

pub use credentials::CloudflareCredentials;

use envelope::{ApiEnvelope, ZoneSummary};

/// Public Cloudflare v4 API root.
pub const CLOUDFLARE_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

const RULES_PAGE_SIZE: u32 = 50;

/// Remote rule store backed by the Cloudflare `rate_limits` API.
pub struct CloudflareRuleStore {
    http_client: reqwest::Client,
    base_url: Url,
    credentials: CloudflareCredentials,
}

impl CloudflareRuleStore {
    /// Creates a store talking to `base_url` with the given credentials.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: Url,
        credentials: CloudflareCredentials,
    ) -> Self {
        Self {
            http_client,
            base_url,
            credentials,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!(
                    "cloudflare base url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.credentials
            .authorize(self.http_client.request(method, url))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> AppResult<ApiEnvelope<T>> {
        let response = builder.send().await.map_err(|error| {
            AppError::RemoteStore(format!("failed to {operation}: {error}"))
        })?;

        let status = response.status();
        debug!(
            operation,
            status = status.as_u16(),
            "cloudflare api responded"
        );

        let body = response.text().await.map_err(|error| {
            AppError::RemoteStore(format!("failed to read response to {operation}: {error}"))
        })?;

        let envelope = match serde_json::from_str::<ApiEnvelope<T>>(body.as_str()) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(AppError::RemoteStore(format!(
                    "{operation} returned status {}: {body}",
                    status.as_u16()
                )));
            }
            Err(error) => {
                return Err(AppError::RemoteStore(format!(
                    "failed to decode response to {operation}: {error}"
                )));
            }
        };

        if !status.is_success() || !envelope.success {
            return Err(AppError::RemoteStore(format!(
                "{operation} failed with status {}: {}",
                status.as_u16(),
                envelope.describe_errors()
            )));
        }

        Ok(envelope)
    }

    async fn write_rule(
        &self,
        method: Method,
        url: Url,
        rule: &RateLimitRule,
        operation: &str,
    ) -> AppResult<RemoteRule> {
        let envelope = self
            .execute::<RemoteRule>(self.request(method, url).json(rule), operation)
            .await?;

        envelope.result.ok_or_else(|| {
            AppError::RemoteStore(format!("response to {operation} carried no rule"))
        })
    }
}

#[async_trait]
impl ZoneDirectory for CloudflareRuleStore {
    async fn resolve_zone(&self, zone_name: &str) -> AppResult<ZoneId> {
        let mut url = self.endpoint(&["zones"])?;
        url.query_pairs_mut().append_pair("name", zone_name);

        let envelope = self
            .execute::<Vec<ZoneSummary>>(self.request(Method::GET, url), "look up zone")
            .await?;

        let zone = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("zone '{zone_name}' not found")))?;

        debug!(zone_name, zone_id = %zone.id, "resolved cloudflare zone");
        ZoneId::new(zone.id)
    }
}

#[async_trait]
impl RemoteRuleStore for CloudflareRuleStore {
    async fn list_rules(&self, zone_id: &ZoneId) -> AppResult<Vec<RemoteRule>> {
        let mut rules = Vec::new();
        let mut page = 1_u32;

        loop {
            let mut url = self.endpoint(&["zones", zone_id.as_str(), "rate_limits"])?;
            url.query_pairs_mut()
                .append_pair("page", page.to_string().as_str())
                .append_pair("per_page", RULES_PAGE_SIZE.to_string().as_str());

            let envelope = self
                .execute::<Vec<RemoteRule>>(
                    self.request(Method::GET, url),
                    "list rate limit rules",
                )
                .await?;

            let page_rules = envelope.result.unwrap_or_default();
            let has_next_page = envelope
                .result_info
                .is_some_and(|info| info.has_next_page());

            debug!(
                zone_id = %zone_id,
                page,
                page_rule_count = page_rules.len(),
                "fetched rate limit rule page"
            );

            if page_rules.is_empty() || !has_next_page {
                rules.extend(page_rules);
                break;
            }

            rules.extend(page_rules);
            page = page.saturating_add(1);
        }

        Ok(rules)
    }

    async fn create_rule(&self, zone_id: &ZoneId, rule: &RateLimitRule) -> AppResult<RemoteRule> {
        let url = self.endpoint(&["zones", zone_id.as_str(), "rate_limits"])?;
        self.write_rule(Method::POST, url, rule, "create rate limit rule")
            .await
    }

    async fn update_rule(
        &self,
        zone_id: &ZoneId,
        rule_id: &RemoteRuleId,
        rule: &RateLimitRule,
    ) -> AppResult<RemoteRule> {
        let url = self.endpoint(&["zones", zone_id.as_str(), "rate_limits", rule_id.as_str()])?;
        self.write_rule(Method::PUT, url, rule, "update rate limit rule")
            .await
    }
}
