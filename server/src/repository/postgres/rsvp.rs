use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Rsvp, RsvpStatus};
use crate::repository::{RsvpRepository, Upsert};
use crate::utils::response::{Page, Pagination};
use crate::utils::{AppError, AppResult};

const RSVP_SELECT: &str = r#"
    SELECT r.id, r.event_id, r.user_id,
           u.username AS user_username, e.title AS event_title,
           r.status, r.created_at, r.updated_at
    FROM rsvps r
    INNER JOIN users u ON u.id = r.user_id
    INNER JOIN events e ON e.id = r.event_id
"#;

#[derive(FromRow)]
struct UpsertedRsvp {
    #[sqlx(flatten)]
    rsvp: Rsvp,
    inserted: bool,
}

fn rsvp_not_found() -> AppError {
    AppError::NotFound("RSVP not found.".to_string())
}

pub struct PgRsvpRepository {
    pool: PgPool,
}

impl PgRsvpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RsvpRepository for PgRsvpRepository {
    #[instrument(skip(self))]
    async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> AppResult<Upsert<Rsvp>> {
        // One statement keyed on the (event_id, user_id) unique constraint;
        // xmax = 0 only for a freshly inserted tuple.
        let row = sqlx::query_as::<_, UpsertedRsvp>(
            r#"
            WITH upserted AS (
                INSERT INTO rsvps (id, event_id, user_id, status)
                VALUES ($1, $2, $3, COALESCE($4, 'going'::rsvp_status))
                ON CONFLICT (event_id, user_id) DO UPDATE
                SET status = COALESCE($4, rsvps.status),
                    updated_at = NOW()
                RETURNING id, event_id, user_id, status, created_at, updated_at,
                          (xmax = 0) AS inserted
            )
            SELECT r.id, r.event_id, r.user_id,
                   u.username AS user_username, e.title AS event_title,
                   r.status, r.created_at, r.updated_at, r.inserted
            FROM upserted r
            INNER JOIN users u ON u.id = r.user_id
            INNER JOIN events e ON e.id = r.event_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(if row.inserted {
            Upsert::Created(row.rsvp)
        } else {
            Upsert::Updated(row.rsvp)
        })
    }

    async fn list_for_user(&self, user_id: Uuid, pagination: Pagination) -> AppResult<Page<Rsvp>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rsvps WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let rsvps = sqlx::query_as::<_, Rsvp>(&format!(
            "{RSVP_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(rsvps, count, pagination))
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Rsvp>> {
        let rsvps = sqlx::query_as::<_, Rsvp>(&format!(
            "{RSVP_SELECT} WHERE r.event_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rsvps)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Rsvp>> {
        let rsvp = sqlx::query_as::<_, Rsvp>(&format!("{RSVP_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rsvp)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: Uuid, status: RsvpStatus) -> AppResult<Rsvp> {
        let res = sqlx::query("UPDATE rsvps SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() < 1 {
            return Err(rsvp_not_found());
        }

        self.find_by_id(id).await?.ok_or_else(rsvp_not_found)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM rsvps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() < 1 {
            return Err(rsvp_not_found());
        }
        Ok(())
    }
}
