//! App Deploy Library
//!
//! One-shot SSH deployment runner: clone a repository on a remote host,
//! build a container image from it, start the container, clean up.
//!
//! # Design
//!
//! The workflow engine is pure logic, decoupled from any transport. You
//! implement the [`RemoteConnector`] and [`RemoteSession`] traits over your
//! infrastructure, or use the bundled [`SshConnector`] (behind the default
//! `ssh-client` feature), and the engine drives the fixed command sequence
//! while streaming remote output to a [`CommandLog`] of your choosing.
//!
//! # Usage
//!
//! ```ignore
//! use app_deploy_rs::{handler, DeployConfig, SshConnector, TracingLog};
//!
//! let connector = SshConnector::new();
//! let config = DeployConfig::from_env();
//!
//! let mut input = std::collections::HashMap::new();
//! input.insert("appName".to_string(), "orders-svc".to_string());
//!
//! let response = handler::handle(&connector, config, &TracingLog, &input).await;
//! println!("{response}");
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod log;
pub mod remote;
pub mod state;
pub mod types;
pub mod workflow;

#[cfg(feature = "ssh-client")]
pub mod ssh;

// Re-export the main types at crate root for convenience
pub use config::{DeployConfig, HostKeyPolicy, KeySource, RemoteTarget};
pub use error::DeployError;
pub use handler::{handle, handle_in_task, handle_json};
pub use log::{CommandLog, MemoryLog, TracingLog};
pub use remote::{RemoteConnector, RemoteSession};
pub use state::{DeploymentState, Phase, StepRecord};
pub use types::{CommandOutcome, CommandStep, DeployRequest};
pub use workflow::DeploymentWorkflow;

#[cfg(feature = "ssh-client")]
pub use handler::handle_request;
#[cfg(feature = "ssh-client")]
pub use ssh::{SshConnector, SshSession};
