//! Live SSH integration tests.
//!
//! These need a reachable SSH host with publickey auth. Set
//! `DEPLOY_LIVE_HOST` and `DEPLOY_LIVE_KEY_PATH` in `.env` or the
//! environment to run them; without credentials the tests skip gracefully.
//! The full deployment test additionally wants `DEPLOY_LIVE_FULL=1`,
//! `DEPLOY_LIVE_REPO_URL`, and a host with git and docker installed.

#![cfg(feature = "ssh-client")]

use app_deploy_rs::{
    handle_json, CommandStep, DeployConfig, HostKeyPolicy, KeySource, MemoryLog, RemoteConnector,
    RemoteSession, RemoteTarget, SshConnector,
};
use std::path::PathBuf;

/// Load .env and build the live target, or None to skip.
fn live_target() -> Option<RemoteTarget> {
    dotenvy::dotenv().ok();

    let host = match std::env::var("DEPLOY_LIVE_HOST") {
        Ok(h) if !h.is_empty() => h,
        _ => {
            eprintln!("DEPLOY_LIVE_HOST not set, skipping live test");
            return None;
        }
    };
    let key_path = match std::env::var("DEPLOY_LIVE_KEY_PATH") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => {
            eprintln!("DEPLOY_LIVE_KEY_PATH not set, skipping live test");
            return None;
        }
    };
    let port = std::env::var("DEPLOY_LIVE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(22);
    let user = std::env::var("DEPLOY_LIVE_USER").unwrap_or_else(|_| "ubuntu".to_string());

    Some(RemoteTarget {
        host,
        port,
        user,
        key: KeySource::Path(key_path),
        key_passphrase: std::env::var("DEPLOY_LIVE_KEY_PASSPHRASE").ok(),
        host_keys: HostKeyPolicy::TrustFirstUse,
    })
}

#[tokio::test]
async fn test_live_session_runs_commands() -> Result<(), Box<dyn std::error::Error>> {
    let Some(target) = live_target() else {
        return Ok(());
    };

    let connector = SshConnector::new();
    let mut session = connector.open(&target).await?;
    eprintln!("connected to {}:{}", target.host, target.port);

    let log = MemoryLog::new();
    let outcome = session
        .run(&CommandStep::new("echo", "echo live-check"), &log)
        .await?;
    assert!(outcome.is_success());
    assert_eq!(outcome.lines, vec!["live-check"]);
    assert_eq!(log.lines(), vec!["live-check"]);

    // Non-zero exits come back as outcomes, not errors.
    let outcome = session
        .run(&CommandStep::new("exit 7", "exit 7"), &log)
        .await?;
    assert_eq!(outcome.exit_status, 7);
    assert!(!outcome.is_success());

    session.close().await;
    Ok(())
}

#[tokio::test]
async fn test_live_full_deployment() -> Result<(), Box<dyn std::error::Error>> {
    let Some(target) = live_target() else {
        return Ok(());
    };
    if std::env::var("DEPLOY_LIVE_FULL").is_err() {
        eprintln!("DEPLOY_LIVE_FULL not set, skipping full deployment test");
        return Ok(());
    }
    let repo_url = match std::env::var("DEPLOY_LIVE_REPO_URL") {
        Ok(r) if !r.is_empty() => r,
        _ => {
            eprintln!("DEPLOY_LIVE_REPO_URL not set, skipping full deployment test");
            return Ok(());
        }
    };

    // Unique names so a rerun never trips over leftovers.
    let app = format!("live-smoke-{}", rand::random::<u16>());
    let mut config = DeployConfig::default();
    config.target = target.clone();
    config.repo_url = repo_url;
    config.workspace = format!("/tmp/app-deploy-live-{}", rand::random::<u32>());

    let connector = SshConnector::new();
    let log = MemoryLog::new();
    let payload = format!(r#"{{"appName":"{app}"}}"#);

    let response = handle_json(&connector, config, &log, &payload).await;
    eprintln!("response: {response}");
    for line in log.lines() {
        eprintln!("  | {line}");
    }

    // Always remove the container, even when the attempt failed partway.
    let mut session = connector.open(&target).await?;
    let _ = session
        .run(
            &CommandStep::new("docker rm", format!("docker rm -f {app}")),
            &MemoryLog::new(),
        )
        .await;
    session.close().await;

    assert_eq!(response, format!("App '{app}' successfully deployed on EC2!"));
    Ok(())
}
