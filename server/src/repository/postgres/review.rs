use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Review, ReviewValues};
use crate::repository::ReviewRepository;
use crate::utils::response::{Page, Pagination};
use crate::utils::{AppError, AppResult};

const REVIEW_SELECT: &str = r#"
    SELECT rv.id, rv.event_id, rv.user_id,
           u.username AS user_username, e.title AS event_title,
           rv.rating, rv.comment, rv.created_at, rv.updated_at
    FROM reviews rv
    INNER JOIN users u ON u.id = rv.user_id
    INNER JOIN events e ON e.id = rv.event_id
"#;

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found.".to_string())
}

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    #[instrument(skip(self, values), fields(rating = values.rating))]
    async fn create_if_absent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        values: ReviewValues,
    ) -> AppResult<Option<Review>> {
        // DO NOTHING on the (event_id, user_id) constraint yields no row
        // for a duplicate, so the existence check and insert are one step.
        let review = sqlx::query_as::<_, Review>(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (id, event_id, user_id, rating, comment)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (event_id, user_id) DO NOTHING
                RETURNING id, event_id, user_id, rating, comment, created_at, updated_at
            )
            SELECT rv.id, rv.event_id, rv.user_id,
                   u.username AS user_username, e.title AS event_title,
                   rv.rating, rv.comment, rv.created_at, rv.updated_at
            FROM inserted rv
            INNER JOIN users u ON u.id = rv.user_id
            INNER JOIN events e ON e.id = rv.event_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(values.rating)
        .bind(&values.comment)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn list(&self, event_id: Option<Uuid>, pagination: Pagination) -> AppResult<Page<Review>> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reviews rv");
        let mut query = QueryBuilder::<Postgres>::new(REVIEW_SELECT);
        if let Some(event_id) = event_id {
            count_query.push(" WHERE rv.event_id = ").push_bind(event_id);
            query.push(" WHERE rv.event_id = ").push_bind(event_id);
        }

        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        query
            .push(" ORDER BY rv.created_at DESC, rv.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let reviews: Vec<Review> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(reviews, count, pagination))
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE rv.event_id = $1 ORDER BY rv.created_at DESC, rv.id DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE rv.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    #[instrument(skip(self, values))]
    async fn update(&self, id: Uuid, values: ReviewValues) -> AppResult<Review> {
        let res = sqlx::query(
            "UPDATE reviews SET rating = $2, comment = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(values.rating)
        .bind(&values.comment)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() < 1 {
            return Err(review_not_found());
        }

        self.find_by_id(id).await?.ok_or_else(review_not_found)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() < 1 {
            return Err(review_not_found());
        }
        Ok(())
    }
}
