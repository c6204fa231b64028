//! Deployment state machine definition.
//!
//! The state is the complete snapshot of one deployment attempt. It is
//! serializable for reporting, but nothing persists it: an attempt is
//! one-shot and the phase only ever moves forward.

use serde::{Deserialize, Serialize};

/// Attempt phases, the state machine's nodes. The happy path is linear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Starting point, nothing attempted yet.
    Start,
    /// Session established and authenticated.
    Connected,
    /// Source cloned into the remote workspace.
    Fetched,
    /// Container image built.
    Built,
    /// Container started.
    Running,
    /// Remote workspace removed.
    Cleaned,
    /// Done.
    Succeeded,
    /// Failed. Terminal; there are no retries.
    Failed { reason: String },
}

impl Phase {
    /// Human-readable phase name for logging/display.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Connected => "connected",
            Phase::Fetched => "fetched",
            Phase::Built => "built",
            Phase::Running => "running",
            Phase::Cleaned => "cleaned",
            Phase::Succeeded => "succeeded",
            Phase::Failed { .. } => "failed",
        }
    }
}

/// Record of one issued command step, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Short step description, e.g. "docker build".
    pub step: String,
    /// Exit status the remote shell reported.
    pub exit_status: u32,
}

/// Full state of a single deployment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentState {
    /// Application this attempt deploys.
    pub app_name: String,
    /// Current phase.
    pub phase: Phase,
    /// Exit statuses of the steps issued so far, in order.
    pub history: Vec<StepRecord>,

    // Audit
    /// Unix timestamp of creation.
    pub created_at: u64,
    /// Unix timestamp of last update.
    pub updated_at: u64,
}

impl DeploymentState {
    /// Create a fresh attempt state for an application.
    pub fn new(app_name: impl Into<String>) -> Self {
        let now = current_unix_time();

        Self {
            app_name: app_name.into(),
            phase: Phase::Start,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Is this attempt in a terminal phase?
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Succeeded | Phase::Failed { .. })
    }

    /// Did this attempt fail?
    pub fn is_failed(&self) -> bool {
        matches!(self.phase, Phase::Failed { .. })
    }

    /// Did this attempt succeed?
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Succeeded)
    }

    /// Record the exit status of an issued step.
    pub fn record_step(&mut self, step: impl Into<String>, exit_status: u32) {
        self.history.push(StepRecord {
            step: step.into(),
            exit_status,
        });
        self.updated_at = current_unix_time();
    }

    /// Transition to a new phase.
    pub fn transition(&mut self, phase: Phase) {
        self.phase = phase;
        self.updated_at = current_unix_time();
    }

    /// Fail the attempt.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.phase = Phase::Failed {
            reason: reason.into(),
        };
        self.updated_at = current_unix_time();
    }
}

fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = DeploymentState::new("orders-svc");
        assert_eq!(state.app_name, "orders-svc");
        assert!(matches!(state.phase, Phase::Start));
        assert!(state.history.is_empty());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_linear_transitions() {
        let mut state = DeploymentState::new("orders-svc");
        for phase in [
            Phase::Connected,
            Phase::Fetched,
            Phase::Built,
            Phase::Running,
            Phase::Cleaned,
        ] {
            state.transition(phase.clone());
            assert_eq!(state.phase, phase);
            assert!(!state.is_terminal());
        }

        state.transition(Phase::Succeeded);
        assert!(state.is_terminal());
        assert!(state.is_complete());
        assert!(!state.is_failed());
    }

    #[test]
    fn test_fail_records_reason() {
        let mut state = DeploymentState::new("orders-svc");
        state.transition(Phase::Connected);
        state.fail("step 'docker build' failed with exit status: 1");

        assert!(state.is_terminal());
        assert!(state.is_failed());
        assert!(!state.is_complete());
        match &state.phase {
            Phase::Failed { reason } => assert!(reason.contains("exit status: 1")),
            other => panic!("expected failed phase, got {}", other.name()),
        }
    }

    #[test]
    fn test_record_step_history() {
        let mut state = DeploymentState::new("orders-svc");
        state.record_step("git clone", 0);
        state.record_step("docker build", 1);

        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].step, "git clone");
        assert_eq!(state.history[0].exit_status, 0);
        assert_eq!(state.history[1].exit_status, 1);
    }

    #[test]
    fn test_state_serializes_for_reporting() {
        let mut state = DeploymentState::new("orders-svc");
        state.transition(Phase::Connected);
        state.record_step("git clone", 0);
        state.record_step("docker build", 1);
        state.fail("step 'docker build' failed with exit status: 1");

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(r#""app_name":"orders-svc""#));
        assert!(json.contains(r#""exit_status":1"#));

        let back: DeploymentState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, state.phase);
        assert_eq!(back.history, state.history);
        assert_eq!(back.created_at, state.created_at);
    }
}
