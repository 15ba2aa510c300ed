use std::fmt::{Debug, Formatter};

use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;

/// Credentials accepted by the Cloudflare v4 API.
///
/// `Debug` never prints secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum CloudflareCredentials {
    /// Account email plus global API key.
    ApiKey {
        /// Account email address.
        email: String,
        /// Global API key.
        key: String,
    },
    /// Scoped API token.
    ApiToken(String),
}

impl CloudflareCredentials {
    /// Returns a short label of the credential kind for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey { .. } => "api_key",
            Self::ApiToken(_) => "api_token",
        }
    }

    pub(super) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey { email, key } => builder
                .header("X-Auth-Email", email.as_str())
                .header("X-Auth-Key", key.as_str()),
            Self::ApiToken(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        }
    }
}

impl Debug for CloudflareCredentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey { email, .. } => formatter
                .debug_struct("ApiKey")
                .field("email", email)
                .field("key", &"<redacted>")
                .finish(),
            Self::ApiToken(_) => formatter
                .debug_tuple("ApiToken")
                .field(&"<redacted>")
                .finish(),
        }
    }
}
