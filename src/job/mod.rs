//! Archive jobs: planning, supervising and tracking one `tartex` run per
//! selected file.

pub mod board;
pub mod planner;
pub mod request;
pub mod state;
pub mod supervisor;

pub use board::{DialogIntent, JobBoard, Launch, OpenLogOutcome};
pub use planner::{plan, ArtifactTarget, PlannedInvocation, ToolCommand};
pub use request::{JobRequest, TargetKind};
pub use state::{FailureReport, Job, JobSnapshot, JobState};
pub use supervisor::{CompletionEvent, Outcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell jobs apart in logs and toasts.
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique_and_short_in_display() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 8);
    }
}
