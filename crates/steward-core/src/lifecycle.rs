use crate::CoreError;
use serde::Serialize;
use std::fmt;

/// Where a scheduled job stands relative to its desired definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    Absent,
    Created,
    InSync,
    Diverged,
    Deleted,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Absent => "absent",
            JobState::Created => "created",
            JobState::InSync => "in-sync",
            JobState::Diverged => "diverged",
            JobState::Deleted => "deleted",
        })
    }
}

pub fn validate_transition(from: JobState, to: JobState) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (JobState::Absent, JobState::Created)
            | (JobState::Created | JobState::Diverged, JobState::InSync)
            | (JobState::Created | JobState::InSync, JobState::Diverged)
            | (JobState::InSync, JobState::InSync)
            | (_, JobState::Deleted)
            // Removed out-of-band, or gone after a delete.
            | (
                JobState::Created | JobState::InSync | JobState::Diverged | JobState::Deleted,
                JobState::Absent
            )
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Move `state` to `to`, rejecting edges the job lifecycle does not have.
pub(crate) fn advance(state: &mut JobState, to: JobState) -> Result<(), CoreError> {
    validate_transition(*state, to)?;
    *state = to;
    Ok(())
}
