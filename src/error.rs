//! Error types for the deployment runner.
//!
//! No `anyhow` leakage. Explicit, typed errors.

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("command execution failed: {0}")]
    Command(String),

    #[error("step '{step}' failed with exit status: {exit_status}")]
    StepFailed { step: String, exit_status: u32 },

    #[error("unexpected fault: {0}")]
    Fault(String),
}

impl DeployError {
    /// Whether the failure involved the remote host at all.
    ///
    /// Input validation and top-level faults happen before or outside the
    /// session; everything else means a connection was at least attempted.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DeployError::Connection(_) | DeployError::Command(_) | DeployError::StepFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::Input("'appName' is required!".to_string());
        assert_eq!(err.to_string(), "invalid input: 'appName' is required!");

        let err = DeployError::Connection("no route to host".to_string());
        assert_eq!(err.to_string(), "connection failed: no route to host");

        let err = DeployError::Command("channel closed".to_string());
        assert_eq!(err.to_string(), "command execution failed: channel closed");

        let err = DeployError::StepFailed {
            step: "docker build".to_string(),
            exit_status: 1,
        };
        assert_eq!(
            err.to_string(),
            "step 'docker build' failed with exit status: 1"
        );

        let err = DeployError::Fault("deploy task panicked".to_string());
        assert_eq!(err.to_string(), "unexpected fault: deploy task panicked");
    }

    #[test]
    fn test_error_is_remote() {
        assert!(DeployError::Connection("test".to_string()).is_remote());
        assert!(DeployError::Command("test".to_string()).is_remote());
        assert!(DeployError::StepFailed {
            step: "git clone".to_string(),
            exit_status: 128,
        }
        .is_remote());

        assert!(!DeployError::Input("test".to_string()).is_remote());
        assert!(!DeployError::Fault("test".to_string()).is_remote());
    }
}
