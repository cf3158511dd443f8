use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Application status a job entry can be created or updated with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }

    /// Exact, case-sensitive match, as required for input.
    pub fn parse_exact(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Case-insensitive match, as used when counting stored rows.
    pub fn parse_loose(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s))
    }
}

/// Job application row. `status` is kept as stored text; it may predate the current status set.
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub position: String,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub application_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub user_id: Uuid,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub notes: Option<String>,
    pub application_date: OffsetDateTime,
}

/// Update payload. `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct JobChanges {
    pub company: String,
    pub position: String,
    pub status: Option<JobStatus>,
    /// `Some(None)` clears the stored notes.
    pub notes: Option<Option<String>>,
    pub application_date: Option<OffsetDateTime>,
}
