use serde::Deserialize;

/// Response envelope shared by every Cloudflare v4 endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct ApiEnvelope<T> {
    pub(super) success: bool,
    #[serde(default)]
    pub(super) errors: Vec<ApiMessage>,
    pub(super) result: Option<T>,
    pub(super) result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Pagination block of list responses.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct ResultInfo {
    #[serde(default)]
    pub(super) page: u32,
    #[serde(default)]
    pub(super) total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct ZoneSummary {
    pub(super) id: String,
}

impl<T> ApiEnvelope<T> {
    /// Joins the remote error list as `code: message` pairs.
    pub(super) fn describe_errors(&self) -> String {
        if self.errors.is_empty() {
            return "no error detail returned".to_owned();
        }

        self.errors
            .iter()
            .map(|error| format!("{}: {}", error.code, error.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl ResultInfo {
    /// Returns whether pages after this one remain.
    pub(super) fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }
}
