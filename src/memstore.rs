//! In-memory stores backing the unit and router tests.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::{IdentityResolver, UserStore},
    repo_types::{NewUser, User},
};
use crate::error::StoreError;
use crate::jobs::{
    repo::JobStore,
    repo_types::{Job, JobChanges, NewJob},
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    jobs: RwLock<Vec<Job>>,
}

impl MemoryStore {
    pub async fn seed_user(&self, email: &str) -> User {
        self.create(NewUser {
            name: "Seeded",
            email,
            password_hash: "$argon2id$unused",
        })
        .await
        .expect("seed user")
    }

    /// Inserts a row with any stored status, bypassing input validation.
    pub async fn seed_job(&self, user_id: Uuid, status: Option<&str>) -> Job {
        let now = OffsetDateTime::now_utc();
        let job = Job {
            id: Uuid::new_v4(),
            user_id,
            company: "Seeded".into(),
            position: "Seeded".into(),
            status: status.map(str::to_string),
            notes: None,
            application_date: now,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.push(job.clone());
        job
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser<'_>) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Job>, StoreError> {
        // newest insert first so equal timestamps still come out newest-first
        let mut rows: Vec<Job> = self
            .jobs
            .read()
            .await
            .iter()
            .rev()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.application_date
                .cmp(&a.application_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows)
    }

    async fn status_counts(&self, user_id: Uuid) -> Result<Vec<(Option<String>, i64)>, StoreError> {
        Ok(self
            .jobs
            .read()
            .await
            .iter()
            .filter(|j| j.user_id == user_id)
            .map(|j| (j.status.as_ref().map(|s| s.to_lowercase()), 1))
            .collect())
    }

    async fn insert(&self, job: NewJob) -> Result<Job, StoreError> {
        let now = OffsetDateTime::now_utc();
        let row = Job {
            id: Uuid::new_v4(),
            user_id: job.user_id,
            company: job.company,
            position: job.position,
            status: Some(job.status.as_str().to_string()),
            notes: job.notes,
            application_date: job.application_date,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.push(row.clone());
        Ok(row)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: JobChanges,
    ) -> Result<Option<Job>, StoreError> {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.iter_mut().find(|j| j.id == id && j.user_id == user_id) else {
            return Ok(None);
        };
        job.company = changes.company;
        job.position = changes.position;
        if let Some(status) = changes.status {
            job.status = Some(status.as_str().to_string());
        }
        if let Some(notes) = changes.notes {
            job.notes = notes;
        }
        if let Some(date) = changes.application_date {
            job.application_date = date;
        }
        job.updated_at = OffsetDateTime::now_utc();
        Ok(Some(job.clone()))
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Job>, StoreError> {
        let mut jobs = self.jobs.write().await;
        let pos = jobs.iter().position(|j| j.id == id && j.user_id == user_id);
        Ok(pos.map(|i| jobs.remove(i)))
    }
}
