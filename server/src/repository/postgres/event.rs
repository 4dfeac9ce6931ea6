use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::filters::{like_pattern, EventFilter};
use crate::models::{Event, EventRow, EventValues};
use crate::repository::EventRepository;
use crate::utils::response::{Page, Pagination};
use crate::utils::{AppError, AppResult};

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.organizer_id, e.title, e.description, e.location,
           e.start_time, e.end_time, e.is_public, e.created_at, e.updated_at,
           u.username AS organizer_username,
           u.first_name AS organizer_first_name,
           u.last_name AS organizer_last_name,
           COALESCE(p.full_name, '') AS organizer_full_name,
           (SELECT COUNT(*) FROM rsvps r WHERE r.event_id = e.id) AS rsvp_count,
           (SELECT COUNT(*) FROM reviews rv WHERE rv.event_id = e.id) AS review_count,
           (SELECT COALESCE(SUM(rv.rating), 0)::BIGINT FROM reviews rv WHERE rv.event_id = e.id) AS rating_sum
    FROM events e
    INNER JOIN users u ON u.id = e.organizer_id
    LEFT JOIN profiles p ON p.user_id = e.organizer_id
"#;

const EVENT_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM events e
    INNER JOIN users u ON u.id = e.organizer_id
"#;

fn event_not_found() -> AppError {
    AppError::NotFound("Event not found.".to_string())
}

/// Appends the visibility scope and every active filter as a WHERE clause.
fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, viewer: Option<Uuid>, filter: &EventFilter) {
    match viewer {
        Some(viewer) => {
            qb.push(" WHERE (e.is_public OR e.organizer_id = ")
                .push_bind(viewer)
                .push(")");
        }
        None => {
            qb.push(" WHERE e.is_public");
        }
    }

    if let Some(term) = filter.title_term() {
        qb.push(" AND e.title ILIKE ").push_bind(like_pattern(term));
    }
    if let Some(term) = filter.location_term() {
        qb.push(" AND e.location ILIKE ").push_bind(like_pattern(term));
    }
    if let Some(term) = filter.organizer_term() {
        qb.push(" AND u.username ILIKE ").push_bind(like_pattern(term));
    }
    if let Some(is_public) = filter.is_public {
        qb.push(" AND e.is_public = ").push_bind(is_public);
    }
    if let Some(bound) = filter.start_bound() {
        qb.push(" AND e.start_time >= ").push_bind(bound);
    }
    if let Some(bound) = filter.end_bound() {
        qb.push(" AND e.end_time <= ").push_bind(bound);
    }
    if let Some(term) = filter.search_term() {
        let pattern = like_pattern(term);
        qb.push(" AND (e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.location ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.username ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip(self, filter))]
    async fn list(
        &self,
        viewer: Option<Uuid>,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> AppResult<Page<Event>> {
        let mut count_query = QueryBuilder::<Postgres>::new(EVENT_COUNT);
        push_conditions(&mut count_query, viewer, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_conditions(&mut query, viewer, filter);
        query
            .push(" ORDER BY ")
            .push(filter.ordering().sql())
            .push(" LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<EventRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(Event::from).collect(),
            count,
            pagination,
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("{EVENT_SELECT} WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Event::from))
    }

    #[instrument(skip(self, values), fields(title = %values.title))]
    async fn create(&self, organizer_id: Uuid, values: EventValues) -> AppResult<Event> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO events
            (id, organizer_id, title, description, location, start_time, end_time, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(organizer_id)
        .bind(&values.title)
        .bind(&values.description)
        .bind(&values.location)
        .bind(values.start_time)
        .bind(values.end_time)
        .bind(values.is_public)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(event_not_found)
    }

    #[instrument(skip(self, values))]
    async fn update(&self, id: Uuid, values: EventValues) -> AppResult<Event> {
        let res = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, location = $4,
                start_time = $5, end_time = $6, is_public = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&values.title)
        .bind(&values.description)
        .bind(&values.location)
        .bind(values.start_time)
        .bind(values.end_time)
        .bind(values.is_public)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() < 1 {
            return Err(event_not_found());
        }

        self.find_by_id(id).await?.ok_or_else(event_not_found)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<()> {
        // rsvps and reviews go with it via ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() < 1 {
            return Err(event_not_found());
        }
        Ok(())
    }
}
