use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials of the privileged account every later call runs as.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub user: String,
    pub password: String,
}

/// A scoped user that receives full privileges on one database.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    pub name: String,
    pub user: Option<UserCredentials>,
}

impl DatabaseSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(UserCredentials {
            user: user.into(),
            password: password.into(),
        });
        self
    }
}

/// The validated desired state. `databases` keeps document order.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub admin: AdminCredentials,
    pub databases: Vec<DatabaseSpec>,
}

/// One unit of work in a provisioning run.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "lowercase")]
pub enum Step {
    Admin { user: String },
    Database { name: String },
    User { database: String, user: String },
    Grant { database: String, user: String },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Admin { user } => write!(f, "admin user {}", user),
            Step::Database { name } => write!(f, "database {}", name),
            Step::User { database, user } => write!(f, "user {} (database {})", user, database),
            Step::Grant { database, user } => {
                write!(f, "grant ALL on {} to {}", database, user)
            }
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Created,
    AlreadyExists,
    /// Success outcome of a grant; grants are re-applied on every run.
    Applied,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Created => write!(f, "created"),
            StepOutcome::AlreadyExists => write!(f, "already exists"),
            StepOutcome::Applied => write!(f, "applied"),
            StepOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStatus {
    Success,
    Failed,
}

/// Per-step breakdown of a run. Successful steps are never undone, so a
/// failed run still reports everything that was completed.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub steps: Vec<StepRecord>,
}

impl ProvisioningResult {
    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    pub fn status(&self) -> ProvisioningStatus {
        if self.steps.iter().any(|record| record.outcome.is_failure()) {
            ProvisioningStatus::Failed
        } else {
            ProvisioningStatus::Success
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == ProvisioningStatus::Success
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|record| record.outcome.is_failure())
    }

    /// Outcome of the first step matching `step`, if it was attempted.
    pub fn outcome_of(&self, step: &Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| &record.step == step)
            .map(|record| &record.outcome)
    }
}
