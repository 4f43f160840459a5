//! Command executor contract (consumer side)
//!
//! The core never runs anything. A platform executor receives the
//! [`ResolvedCommand`] and reports back; the result is passed through for
//! presentation without interpretation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ResolvedCommand;

/// Captured output of an executed command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("no executor handles intent '{0}'")]
    Unsupported(String),

    #[error("slot '{slot}' rejected by executor: {reason}")]
    InvalidSlot { slot: String, reason: String },

    #[error("execution failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait CommandExecutor {
    fn execute(&self, command: &ResolvedCommand) -> Result<ExecutionResult, ExecutionError>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for &T {
    fn execute(&self, command: &ResolvedCommand) -> Result<ExecutionResult, ExecutionError> {
        (**self).execute(command)
    }
}
