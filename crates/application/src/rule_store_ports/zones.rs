use async_trait::async_trait;
use edgelimit_core::{AppResult, ZoneId};

/// Port resolving human-facing zone names to remote zone identifiers.
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    /// Resolves a zone name.
    ///
    /// Returns `AppError::NotFound` when no zone carries the name.
    async fn resolve_zone(&self, zone_name: &str) -> AppResult<ZoneId>;
}
