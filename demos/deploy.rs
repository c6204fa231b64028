//! One-shot deployment example.
//!
//! Connects to the configured host, runs the deployment command sequence
//! for the given application, and prints the response string.
//!
//! Usage:
//!   cargo run --example deploy -- orders-svc
//!   cargo run --example deploy -- '{"appName":"orders-svc"}'
//!
//! Environment:
//!   DEPLOY_HOST                 - remote host      (default: 16.171.129.206)
//!   DEPLOY_PORT                 - ssh port         (default: 22)
//!   DEPLOY_USER                 - ssh user         (default: ubuntu)
//!   DEPLOY_KEY_PATH             - private key path (default: ~/.ssh/id_ed25519)
//!   DEPLOY_REPO_URL             - repository to clone
//!   DEPLOY_WORKSPACE            - remote scratch directory
//!   DEPLOY_COMMAND_TIMEOUT_SECS - optional per-command bound
//!
//! Remote command output logs at info level under the `remote` target;
//! control verbosity with RUST_LOG.

use app_deploy_rs::{handler, DeployConfig, SshConnector, TracingLog};
use std::collections::HashMap;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let arg = std::env::args()
        .nth(1)
        .ok_or("usage: deploy <app-name | json-payload>")?;

    let config = DeployConfig::from_env();

    println!("═══ App Deploy ═══");
    println!(
        "  target: {}@{}:{}",
        config.target.user, config.target.host, config.target.port
    );
    println!("  repo:   {}", config.repo_url);
    println!();

    let connector = SshConnector::new();

    // A JSON argument goes through the envelope path, anything else is
    // taken as the app name directly.
    let response = if arg.trim_start().starts_with('{') {
        handler::handle_json(&connector, config, &TracingLog, &arg).await
    } else {
        let mut fields = HashMap::new();
        fields.insert("appName".to_string(), arg);
        handler::handle(&connector, config, &TracingLog, &fields).await
    };

    println!();
    println!("{response}");
    Ok(())
}
