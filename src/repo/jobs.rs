//! Job repository: persistent priority queue with dependency gating and
//! exponential backoff retry.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::{CuratorError, Result};
use crate::models::job::{EnqueueJob, Job, JobStatus};

pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, spec: EnqueueJob) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO jobs (id, job_type, priority, status, payload, retry_count, max_retries, manual, created_at, updated_at)
               VALUES (?,?,?,'pending',?,0,?,?,?,?)"#,
        )
        .bind(uuid_to_text(id))
        .bind(&spec.job_type)
        .bind(spec.priority)
        .bind(spec.payload.to_string())
        .bind(spec.max_retries)
        .bind(bool_to_int(spec.manual))
        .bind(datetime_to_text(now))
        .bind(datetime_to_text(now))
        .execute(&mut *tx)
        .await?;

        for dep in &spec.depends_on {
            sqlx::query("INSERT INTO job_dependencies (job_id, depends_on_job_id) VALUES (?, ?)")
                .bind(uuid_to_text(id))
                .bind(uuid_to_text(*dep))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Transactionally selects the oldest-highest-priority eligible job and
    /// marks it `processing` ( `pickNext`). A job is eligible when it is
    /// `pending`, or `retrying` with `next_retry_at <= now`, and every row in
    /// `job_dependencies` for it points to a `completed` job.
    pub async fn pick_next(&self, worker_id: &str) -> Result<Option<Job>> {
        let mut tx = self.pool.begin().await?;
        let now = datetime_to_text(Utc::now());

        let row = sqlx::query(
            r#"SELECT j.* FROM jobs j
               WHERE (j.status = 'pending' OR (j.status = 'retrying' AND j.next_retry_at <= ?))
                 AND NOT EXISTS (
                     SELECT 1 FROM job_dependencies jd
                     JOIN jobs dep ON dep.id = jd.depends_on_job_id
                     WHERE jd.job_id = j.id AND dep.status != 'completed'
                 )
               ORDER BY j.priority ASC, j.created_at ASC
               LIMIT 1"#,
        )
        .bind(&now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let id_text: String = row.try_get("id")?;
        sqlx::query("UPDATE jobs SET status = 'processing', started_at = ?, worker_id = ?, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(worker_id)
            .bind(&now)
            .bind(&id_text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.get(text_to_uuid(&id_text)?).await
    }

    pub async fn complete(&self, id: Uuid, result: Option<serde_json::Value>) -> Result<()> {
        let now = datetime_to_text(Utc::now());
        sqlx::query("UPDATE jobs SET status = 'completed', result = ?, completed_at = ?, updated_at = ? WHERE id = ?")
            .bind(result.map(|r| r.to_string()))
            .bind(&now)
            .bind(&now)
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    ///  `fail`: retry with exponential backoff (capped at 300s) below
    /// `max_retries`, else transition to terminal `failed`. A `permanent`
    /// error bypasses retry entirely regardless of remaining budget.
    pub async fn fail(&self, id: Uuid, error: &str, permanent: bool) -> Result<()> {
        let Some(job) = self.get(id).await? else {
            return Err(CuratorError::not_found("job", id.to_string()));
        };

        let now = Utc::now();
        if !permanent && job.retry_count < job.max_retries {
            let retry_count = job.retry_count + 1;
            let next_retry_at = now + chrono::Duration::seconds(Job::backoff_secs(retry_count));
            sqlx::query(
                "UPDATE jobs SET status = 'retrying', retry_count = ?, next_retry_at = ?, error = ?, updated_at = ? WHERE id = ?",
            )
            .bind(retry_count)
            .bind(datetime_to_text(next_retry_at))
            .bind(error)
            .bind(datetime_to_text(now))
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE jobs SET status = 'failed', error = ?, completed_at = ?, updated_at = ? WHERE id = ?")
                .bind(error)
                .bind(datetime_to_text(now))
                .bind(datetime_to_text(now))
                .bind(uuid_to_text(id))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    ///  `cancel`: allowed only from `pending`/`retrying`.
    pub async fn cancel(&self, id: Uuid) -> Result<()> {
        let now = datetime_to_text(Utc::now());
        let result = sqlx::query(
            "UPDATE jobs SET status = 'failed', error = 'cancelled', completed_at = ?, updated_at = ? WHERE id = ? AND status IN ('pending','retrying')",
        )
        .bind(&now)
        .bind(&now)
        .bind(uuid_to_text(id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CuratorError::conflict("job is not cancellable in its current state"));
        }
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(from_row).transpose()
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<Job> {
    let id_text: String = row.try_get("id")?;
    let status_text: String = row.try_get("status")?;
    let payload_text: String = row.try_get("payload")?;
    let result_text: Option<String> = row.try_get("result")?;
    let manual: i64 = row.try_get("manual")?;
    let next_retry_at: Option<String> = row.try_get("next_retry_at")?;
    let started_at: Option<String> = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Job {
        id: text_to_uuid(&id_text)?,
        job_type: row.try_get("job_type")?,
        priority: row.try_get("priority")?,
        status: JobStatus::from_str(&status_text).unwrap_or(JobStatus::Pending),
        payload: serde_json::from_str(&payload_text).unwrap_or(serde_json::Value::Null),
        result: result_text.and_then(|r| serde_json::from_str(&r).ok()),
        error: row.try_get("error")?,
        retry_count: row.try_get("retry_count")?,
        max_retries: row.try_get("max_retries")?,
        next_retry_at: opt_text_to_datetime(next_retry_at)?,
        worker_id: row.try_get("worker_id")?,
        started_at: opt_text_to_datetime(started_at)?,
        completed_at: opt_text_to_datetime(completed_at)?,
        manual: int_to_bool(manual),
        created_at: text_to_datetime(&created_at)?,
        updated_at: text_to_datetime(&updated_at)?,
    })
}
