//! Drift detection and correction for scheduled jobs.
//!
//! Only the schedule, the suspend flag, and the container image are monitored.
//! Everything else in a live job is left exactly as the store has it, so edits
//! made by other writers to unmonitored fields survive reconciliation.

use crate::creator::{ensure_created, Creation};
use crate::factory::JobStream;
use crate::lifecycle::{advance, JobState};
use crate::retry::{retry_on_conflict, RetryPolicy};
use crate::{CoreError, Operation};
use serde::Serialize;
use std::fmt;
use steward_schema::{Object, ScheduledJob};
use steward_store::{ResourceStore, TypedStore};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftField {
    Schedule,
    Suspend,
    Image,
}

impl fmt::Display for DriftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriftField::Schedule => "schedule",
            DriftField::Suspend => "suspend",
            DriftField::Image => "image",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub changed: bool,
    pub fields: Vec<DriftField>,
}

impl DiffResult {
    fn push(&mut self, field: DriftField) {
        self.changed = true;
        self.fields.push(field);
    }

    pub fn contains(&self, field: DriftField) -> bool {
        self.fields.contains(&field)
    }
}

/// Compare the monitored fields of `live` against `desired`.
pub fn diff_scheduled_job(live: &ScheduledJob, desired: &ScheduledJob) -> DiffResult {
    let mut diff = DiffResult::default();

    if live.spec.schedule != desired.spec.schedule {
        diff.push(DriftField::Schedule);
    }

    // An unset flag on either side is never drift.
    if let (Some(live_suspend), Some(desired_suspend)) = (live.spec.suspend, desired.spec.suspend)
    {
        if live_suspend != desired_suspend {
            diff.push(DriftField::Suspend);
        }
    }

    if live.primary_image() != desired.primary_image() {
        diff.push(DriftField::Image);
    }

    diff
}

/// Copy the fields named in `diff` from `desired` onto `live`.
pub fn apply_patch(live: &mut ScheduledJob, desired: &ScheduledJob, diff: &DiffResult) {
    for field in &diff.fields {
        match field {
            DriftField::Schedule => live.spec.schedule.clone_from(&desired.spec.schedule),
            DriftField::Suspend => live.spec.suspend = desired.spec.suspend,
            DriftField::Image => {
                let Some(image) = desired.primary_image() else {
                    continue;
                };
                match live.primary_container_mut() {
                    Some(container) => image.clone_into(&mut container.image),
                    None => live
                        .spec
                        .job_template
                        .pod
                        .containers
                        .extend(desired.spec.job_template.pod.containers.first().cloned()),
                }
            }
        }
    }
}

/// What happened to one scheduled job during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub name: String,
    pub stream: JobStream,
    pub state: JobState,
    pub created: bool,
    pub patched: Vec<DriftField>,
}

/// Create `desired` if absent and, when `managed`, bring its monitored fields
/// back in line with the desired definition.
///
/// A job that disappears between creation and fetch is left for the next pass.
pub fn reconcile_scheduled_job(
    store: &dyn ResourceStore,
    stream: JobStream,
    desired: &ScheduledJob,
    managed: bool,
    policy: &RetryPolicy,
) -> Result<JobOutcome, CoreError> {
    let object = desired.object_ref();
    let created = ensure_created(store, &desired.clone().into())? == Creation::Created;

    // Present from here on, whether this pass created it or not.
    let mut state = JobState::Created;
    let mut outcome = JobOutcome {
        name: object.name.to_string(),
        stream,
        state,
        created,
        patched: Vec::new(),
    };
    if !managed {
        return Ok(outcome);
    }

    let patched = retry_on_conflict(policy, |_attempt| {
        let mut live: ScheduledJob = match store.get_as(&object) {
            Ok(job) => job,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(CoreError::resource(Operation::Fetch, &object, e)),
        };

        let diff = diff_scheduled_job(&live, desired);
        if !diff.changed {
            return Ok(Some(diff));
        }
        for field in &diff.fields {
            info!("curator {field} drift found, updating {}", object.qualified_name());
        }
        apply_patch(&mut live, desired, &diff);
        store
            .update(&live.into_resource())
            .map_err(|e| CoreError::resource(Operation::Update, &object, e))?;
        Ok(Some(diff))
    })?;

    match patched {
        None => {
            debug!("{object} vanished before it could be compared, deferring");
            advance(&mut state, JobState::Absent)?;
        }
        Some(diff) if diff.changed => {
            advance(&mut state, JobState::Diverged)?;
            advance(&mut state, JobState::InSync)?;
            outcome.patched = diff.fields;
        }
        Some(_) => advance(&mut state, JobState::InSync)?,
    }
    outcome.state = state;
    Ok(outcome)
}
