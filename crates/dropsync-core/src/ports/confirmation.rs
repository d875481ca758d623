//! Confirmation policy port
//!
//! The reconciler and the engine ask before every transfer and before
//! descending into a directory. What the answer is comes from an injected
//! policy: a fixed answer mode or an interactive prompt living in the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Answer returned by a confirmation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
    /// Stop the whole run in an orderly way
    Abort,
}

impl From<bool> for Answer {
    fn from(yes: bool) -> Self {
        if yes {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}

/// Decides whether an action proposed by the engine goes ahead
pub trait IConfirmationPolicy: Send + Sync {
    /// # Arguments
    /// * `message` - Short description of the action, e.g. `Upload and overwrite a.txt`
    /// * `default` - The answer the action gets when the user expresses no preference
    fn confirm(&self, message: &str, default: bool) -> Answer;
}

/// Non-interactive answer modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Always take the proposed default
    #[default]
    Default,
    /// Always answer yes
    Yes,
    /// Always answer no
    No,
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerMode::Default => write!(f, "default"),
            AnswerMode::Yes => write!(f, "yes"),
            AnswerMode::No => write!(f, "no"),
        }
    }
}

/// A policy that answers every question the same way
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAnswerPolicy {
    mode: AnswerMode,
}

impl FixedAnswerPolicy {
    pub fn new(mode: AnswerMode) -> Self {
        Self { mode }
    }
}

impl IConfirmationPolicy for FixedAnswerPolicy {
    fn confirm(&self, _message: &str, default: bool) -> Answer {
        match self.mode {
            AnswerMode::Default => Answer::from(default),
            AnswerMode::Yes => Answer::Yes,
            AnswerMode::No => Answer::No,
        }
    }
}
