//! Minimal domain types for the deployment runner.
//!
//! These are the types the workflow engine needs. Nothing more.
//! If you're adding types here, ask yourself if the workflow
//! actually needs them or if you're just being clever.

use crate::error::DeployError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The field the invocation envelope must carry.
const APP_NAME_FIELD: &str = "appName";

/// A deployment request: which application to deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    #[serde(rename = "appName")]
    pub app_name: String,
}

impl DeployRequest {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Extract a request from the invocation's key-value fields.
    ///
    /// `appName` must be present and non-empty; anything else is a terminal
    /// input error, raised before any remote action.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, DeployError> {
        match fields.get(APP_NAME_FIELD) {
            Some(name) if !name.is_empty() => Ok(Self::new(name.clone())),
            _ => Err(DeployError::Input(format!(
                "'{APP_NAME_FIELD}' is required!"
            ))),
        }
    }

    /// Extract a request from a JSON envelope, e.g. `{"appName":"orders-svc"}`.
    pub fn from_json(payload: &str) -> Result<Self, DeployError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| DeployError::Input(format!("invalid request payload: {e}")))?;
        if !value.is_object() {
            return Err(DeployError::Input(
                "invalid request payload: expected a JSON object".to_string(),
            ));
        }
        match value.get(APP_NAME_FIELD).and_then(|v| v.as_str()) {
            Some(name) if !name.is_empty() => Ok(Self::new(name)),
            _ => Err(DeployError::Input(format!(
                "'{APP_NAME_FIELD}' is required!"
            ))),
        }
    }
}

/// One remote shell command, with a short label for state and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStep {
    /// Short step description, e.g. "docker build".
    pub description: String,
    /// The exact shell string issued on the remote host.
    pub command: String,
}

impl CommandStep {
    pub fn new(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: command.into(),
        }
    }
}

/// What a completed remote command reported back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Exit status from the remote shell. Zero is success.
    pub exit_status: u32,
    /// Combined stdout and stderr, split into lines in arrival order.
    pub lines: Vec<String>,
}

impl CommandOutcome {
    pub fn new(exit_status: u32, lines: Vec<String>) -> Self {
        Self { exit_status, lines }
    }

    pub fn is_success(&self) -> bool {
        self.exit_status == 0
    }
}
