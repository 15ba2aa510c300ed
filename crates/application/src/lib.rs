//! Application services and ports.

#![forbid(unsafe_code)]

mod rule_reconciliation_service;
mod rule_store_ports;

pub use rule_reconciliation_service::{
    ReconcileOptions, ReconcileOutcome, ReconcilePlan, RuleReconciliationService, find_existing,
    plan_reconciliation,
};
pub use rule_store_ports::{RemoteRuleStore, ZoneDirectory};
