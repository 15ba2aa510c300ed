use std::process::ExitCode;

use edgelimit_application::{ReconcileOutcome, ReconcilePlan};
use edgelimit_core::AppError;
use edgelimit_domain::{RemoteRule, RuleField};
use serde::Serialize;

/// The single JSON document printed on stdout.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CliOutput {
    Applied {
        changed: bool,
        result: Option<RemoteRule>,
    },
    Planned {
        changed: bool,
        plan: &'static str,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        changed_fields: Vec<RuleField>,
    },
    Failed {
        failed: bool,
        msg: String,
    },
}

impl CliOutput {
    pub fn applied(outcome: &ReconcileOutcome) -> Self {
        Self::Applied {
            changed: outcome.changed(),
            result: outcome.rule().cloned(),
        }
    }

    pub fn planned(plan: &ReconcilePlan) -> Self {
        let changed_fields = match plan {
            ReconcilePlan::Update { changed_fields, .. } => changed_fields.clone(),
            ReconcilePlan::Create | ReconcilePlan::Unchanged { .. } => Vec::new(),
        };

        Self::Planned {
            changed: plan.changed(),
            plan: plan.as_str(),
            changed_fields,
        }
    }

    pub fn failure(error: &AppError) -> Self {
        let msg = if error.is_validation() {
            format!("parameter issue: {error}")
        } else {
            error.to_string()
        };

        Self::Failed { failed: true, msg }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            format!(r#"{{"failed":true,"msg":"failed to encode output: {error}"}}"#)
        })
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Failed { .. } => ExitCode::FAILURE,
            Self::Applied { .. } | Self::Planned { .. } => ExitCode::SUCCESS,
        }
    }
}
