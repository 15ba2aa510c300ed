//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod cloudflare_rule_store;
mod in_memory_rule_store;

pub use cloudflare_rule_store::{
    CLOUDFLARE_API_BASE_URL, CloudflareCredentials, CloudflareRuleStore,
};
pub use in_memory_rule_store::InMemoryRuleStore;
