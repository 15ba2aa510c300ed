//! Edgelimit command line: converges one Cloudflare zone rate-limit rule.

#![forbid(unsafe_code)]

mod cli_args;
mod cli_config;
mod cli_output;

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use edgelimit_application::{ReconcileOptions, RuleReconciliationService, ZoneDirectory};
use edgelimit_core::{AppError, AppResult};
use edgelimit_domain::{DesiredState, RateLimitRule};
use edgelimit_infrastructure::CloudflareRuleStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli_args::CliArgs;
use crate::cli_config::CliConfig;
use crate::cli_output::CliOutput;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = CliArgs::parse();
    let output = match run(&args).await {
        Ok(output) => output,
        Err(error) => {
            warn!(zone = %args.zone, error = %error, "rate limit rule run failed");
            CliOutput::failure(&error)
        }
    };

    println!("{}", output.to_json());
    output.exit_code()
}

async fn run(args: &CliArgs) -> AppResult<CliOutput> {
    let state = DesiredState::from_str(args.state.as_str())?;
    if state == DesiredState::Absent {
        return Err(AppError::Validation(
            "state=absent is not supported; rules can only be created or updated".to_owned(),
        ));
    }

    let desired = RateLimitRule::new(args.rule_input()?)?;
    let options = ReconcileOptions {
        update_if_exists: !args.no_update,
    };

    let config = CliConfig::load(args)?;
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    info!(
        zone = %args.zone,
        url = %desired.url(),
        credentials = config.credentials.kind(),
        check = args.check,
        "edgelimit started"
    );

    let store = Arc::new(CloudflareRuleStore::new(
        http_client,
        config.api_base_url,
        config.credentials,
    ));
    let zone_id = store.resolve_zone(args.zone.as_str()).await?;
    let service = RuleReconciliationService::new(store);

    if args.check {
        let plan = service.preview(&zone_id, &desired, options).await?;
        return Ok(CliOutput::planned(&plan));
    }

    let outcome = service.reconcile(&zone_id, &desired, options).await?;
    Ok(CliOutput::applied(&outcome))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
