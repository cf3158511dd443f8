use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::jobs::repo_types::Job;

/// Body of create and update requests. Any owner field sent by the client is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
    /// `None` when absent, `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    pub application_date: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub company: String,
    pub position: String,
    pub status: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub application_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Job> for JobResponse {
    fn from(j: Job) -> Self {
        Self {
            id: j.id,
            user: j.user_id,
            company: j.company,
            position: j.position,
            status: j.status,
            notes: j.notes,
            application_date: j.application_date,
            created_at: j.created_at,
            updated_at: j.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedJobResponse {
    pub message: &'static str,
    pub job: JobResponse,
}

/// Per-status counts for one user. Statuses outside the fixed set are not counted.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobStats {
    pub applied: i64,
    pub interview: i64,
    pub rejected: i64,
    pub offer: i64,
}
