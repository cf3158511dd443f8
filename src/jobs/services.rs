use std::collections::BTreeMap;

use time::{macros::format_description, format_description::well_known::Rfc3339, Date, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::jobs::{
    dto::{DeletedJobResponse, JobPayload, JobResponse, JobStats},
    repo::JobStore,
    repo_types::{JobChanges, JobStatus, NewJob},
};

/// Payload fields after validation, before create/update defaults are applied.
#[derive(Debug)]
struct ValidatedJob {
    company: String,
    position: String,
    status: Option<JobStatus>,
    notes: Option<Option<String>>,
    application_date: Option<OffsetDateTime>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(payload: JobPayload) -> Result<ValidatedJob, AppError> {
    let company = non_empty(payload.company);
    let position = non_empty(payload.position);
    let (company, position) = match (company, position) {
        (Some(c), Some(p)) => (c, p),
        (company, position) => {
            let mut errors = BTreeMap::new();
            if company.is_none() {
                errors.insert("company", "Company is required".to_string());
            }
            if position.is_none() {
                errors.insert("position", "Position is required".to_string());
            }
            return Err(AppError::invalid_fields(
                "Company and position are required",
                errors,
            ));
        }
    };

    let status = match payload.status.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(JobStatus::parse_exact(raw).ok_or_else(|| {
            let allowed = JobStatus::ALL.map(JobStatus::as_str).join(", ");
            let message = format!("Invalid status. Must be one of: {allowed}");
            AppError::invalid_fields(message.clone(), BTreeMap::from([("status", message)]))
        })?),
    };

    let application_date = match payload.application_date.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(parse_application_date(raw).ok_or_else(|| {
            let message = "Invalid application date format";
            AppError::invalid_fields(
                message,
                BTreeMap::from([("applicationDate", message.to_string())]),
            )
        })?),
    };

    Ok(ValidatedJob {
        company,
        position,
        status,
        notes: payload.notes,
        application_date,
    })
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_application_date(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

impl JobStats {
    /// Folds `(status, count)` groups into the fixed categories, matching case-insensitively.
    pub fn tally<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (Option<S>, i64)>,
        S: AsRef<str>,
    {
        let mut stats = JobStats::default();
        for (status, count) in groups {
            let Some(status) = status.as_ref().and_then(|s| JobStatus::parse_loose(s.as_ref()))
            else {
                continue;
            };
            match status {
                JobStatus::Applied => stats.applied += count,
                JobStatus::Interview => stats.interview += count,
                JobStatus::Rejected => stats.rejected += count,
                JobStatus::Offer => stats.offer += count,
            }
        }
        stats
    }
}

pub async fn list_jobs<J>(jobs: &J, owner: Uuid) -> Result<Vec<JobResponse>, AppError>
where
    J: JobStore + ?Sized,
{
    let rows = jobs.list_by_user(owner).await?;
    info!(user_id = %owner, count = rows.len(), "jobs listed");
    Ok(rows.into_iter().map(JobResponse::from).collect())
}

pub async fn job_stats<J>(jobs: &J, owner: Uuid) -> Result<JobStats, AppError>
where
    J: JobStore + ?Sized,
{
    let groups = jobs.status_counts(owner).await?;
    Ok(JobStats::tally(groups))
}

pub async fn create_job<J>(jobs: &J, owner: Uuid, payload: JobPayload) -> Result<JobResponse, AppError>
where
    J: JobStore + ?Sized,
{
    let valid = validate(payload).map_err(|e| {
        warn!(user_id = %owner, error = %e, "create job rejected");
        e
    })?;

    let job = jobs
        .insert(NewJob {
            user_id: owner,
            company: valid.company,
            position: valid.position,
            status: valid.status.unwrap_or(JobStatus::Applied),
            notes: valid.notes.flatten(),
            application_date: valid.application_date.unwrap_or_else(OffsetDateTime::now_utc),
        })
        .await?;

    info!(user_id = %owner, job_id = %job.id, "job created");
    Ok(job.into())
}

pub async fn update_job<J>(
    jobs: &J,
    owner: Uuid,
    id: &str,
    payload: JobPayload,
) -> Result<JobResponse, AppError>
where
    J: JobStore + ?Sized,
{
    let valid = validate(payload).map_err(|e| {
        warn!(user_id = %owner, job_id = %id, error = %e, "update job rejected");
        e
    })?;

    // An unparsable ID cannot name any stored job.
    let Ok(job_id) = Uuid::parse_str(id) else {
        warn!(user_id = %owner, job_id = %id, "update target not found");
        return Err(AppError::NotFound("Job"));
    };

    let changes = JobChanges {
        company: valid.company,
        position: valid.position,
        status: valid.status,
        notes: valid.notes,
        application_date: valid.application_date,
    };

    match jobs.update_owned(job_id, owner, changes).await? {
        Some(job) => {
            info!(user_id = %owner, %job_id, "job updated");
            Ok(job.into())
        }
        None => {
            warn!(user_id = %owner, %job_id, "update target not found");
            Err(AppError::NotFound("Job"))
        }
    }
}

pub async fn delete_job<J>(jobs: &J, owner: Uuid, id: &str) -> Result<DeletedJobResponse, AppError>
where
    J: JobStore + ?Sized,
{
    let job_id = Uuid::parse_str(id).map_err(|_| {
        warn!(user_id = %owner, job_id = %id, "malformed job id");
        AppError::invalid_input("Invalid job ID format")
    })?;

    match jobs.delete_owned(job_id, owner).await? {
        Some(job) => {
            info!(user_id = %owner, %job_id, "job deleted");
            Ok(DeletedJobResponse {
                message: "Job deleted successfully",
                job: job.into(),
            })
        }
        None => {
            warn!(user_id = %owner, %job_id, "delete target not found");
            Err(AppError::NotFound("Job"))
        }
    }
}
