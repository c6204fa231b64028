//! Deployment configuration.
//!
//! Target host, repository, workspace and ports were fixed constants in the
//! deployer this crate replaces. They live in an explicit config now so the
//! caller owns them: `Default` reproduces the original values, `from_env`
//! overrides them per process.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::CommandStep;

/// Where the private key for publickey auth comes from.
///
/// Resolving the key out of a secret store is the caller's problem; by the
/// time config is built the key is a path or PEM text.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Key file on disk (OpenSSH or PKCS#8 PEM).
    Path(PathBuf),
    /// Key material already in memory.
    Pem(String),
}

/// How to treat the key the remote host presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept any host key. This is what the original deployer did
    /// (`StrictHostKeyChecking=no`).
    TrustFirstUse,
    /// Refuse hosts presenting a key we cannot verify.
    RejectUnknown,
}

/// The remote host a deployment runs against. Immutable per attempt.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub key: KeySource,
    /// Passphrase for an encrypted key, if it has one.
    pub key_passphrase: Option<String>,
    pub host_keys: HostKeyPolicy,
}

/// Everything one deployment attempt needs to know.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Host the commands run on.
    pub target: RemoteTarget,
    /// Repository cloned on the remote host.
    pub repo_url: String,
    /// Remote scratch directory holding the clone. Removed after the run.
    pub workspace: String,
    /// Host port the container is published on.
    pub host_port: u16,
    /// Port the application listens on inside the container.
    pub container_port: u16,
    /// Bound on establishing the session. `None` waits forever.
    pub connect_timeout: Option<Duration>,
    /// Bound on each remote command. `None` lets a command run as long as
    /// it wants, which is what the original deployer did.
    pub command_timeout: Option<Duration>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            target: RemoteTarget {
                host: "16.171.129.206".to_string(),
                port: 22,
                user: "ubuntu".to_string(),
                key: KeySource::Path(default_key_path()),
                key_passphrase: None,
                host_keys: HostKeyPolicy::TrustFirstUse,
            },
            repo_url: "https://github.com/kapilCSL/TestRepo.git".to_string(),
            workspace: "/tmp/webapps".to_string(),
            host_port: 8080,
            container_port: 8080,
            connect_timeout: Some(Duration::from_secs(30)),
            command_timeout: None,
        }
    }
}

impl DeployConfig {
    /// Build a config from `DEPLOY_*` environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `from_env` against any variable source. Tests feed a map here instead
    /// of mutating the process environment.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = get("DEPLOY_HOST") {
            config.target.host = host;
        }
        if let Some(port) = get("DEPLOY_PORT").and_then(|v| v.parse().ok()) {
            config.target.port = port;
        }
        if let Some(user) = get("DEPLOY_USER") {
            config.target.user = user;
        }
        // Inline PEM wins over a path when both are set.
        if let Some(path) = get("DEPLOY_KEY_PATH") {
            config.target.key = KeySource::Path(PathBuf::from(path));
        }
        if let Some(pem) = get("DEPLOY_KEY_PEM") {
            config.target.key = KeySource::Pem(pem);
        }
        if let Some(passphrase) = get("DEPLOY_KEY_PASSPHRASE") {
            config.target.key_passphrase = Some(passphrase);
        }
        if let Some(policy) = get("DEPLOY_HOST_KEY_POLICY") {
            config.target.host_keys = match policy.as_str() {
                "reject-unknown" => HostKeyPolicy::RejectUnknown,
                _ => HostKeyPolicy::TrustFirstUse,
            };
        }
        if let Some(repo) = get("DEPLOY_REPO_URL") {
            config.repo_url = repo;
        }
        if let Some(workspace) = get("DEPLOY_WORKSPACE") {
            config.workspace = workspace;
        }
        if let Some(port) = get("DEPLOY_HOST_PORT").and_then(|v| v.parse().ok()) {
            config.host_port = port;
        }
        if let Some(port) = get("DEPLOY_CONTAINER_PORT").and_then(|v| v.parse().ok()) {
            config.container_port = port;
        }
        if let Some(secs) = get("DEPLOY_CONNECT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = get("DEPLOY_COMMAND_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.command_timeout = Some(Duration::from_secs(secs));
        }

        config
    }

    /// The ordered remote commands for deploying `app_name`.
    ///
    /// A pure function of config and app name; the workflow issues these
    /// verbatim, in order.
    pub fn command_steps(&self, app_name: &str) -> Vec<CommandStep> {
        vec![
            CommandStep::new(
                "git clone",
                format!("git clone {} {}", self.repo_url, self.workspace),
            ),
            CommandStep::new(
                "docker build",
                format!("docker build -t {} {}", app_name, self.workspace),
            ),
            CommandStep::new(
                "docker run",
                format!(
                    "docker run -d -p {}:{} --name {} {}",
                    self.host_port, self.container_port, app_name, app_name
                ),
            ),
            CommandStep::new("cleanup", format!("rm -rf {}", self.workspace)),
        ]
    }
}

fn default_key_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
        .join("id_ed25519")
}
