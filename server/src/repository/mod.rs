//! Storage traits and the registry handing them to the handlers.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::filters::EventFilter;
use crate::models::{
    Event, EventValues, NewUser, Profile, ProfileChanges, Review, ReviewValues, Rsvp, RsvpStatus,
    User, UserCredentials,
};
use crate::utils::response::{Page, Pagination};
use crate::utils::AppResult;

pub mod memory;
pub mod postgres;

/// Outcome of an insert-or-update keyed on a unique pair.
#[derive(Debug, Clone)]
pub enum Upsert<T> {
    Created(T),
    Updated(T),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user and an empty profile as one unit.
    async fn create(&self, user: NewUser) -> AppResult<User>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;
    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> AppResult<Profile>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Public events plus, for a signed-in viewer, the viewer's own events.
    async fn list(
        &self,
        viewer: Option<Uuid>,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> AppResult<Page<Event>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;
    async fn create(&self, organizer_id: Uuid, values: EventValues) -> AppResult<Event>;
    async fn update(&self, id: Uuid, values: EventValues) -> AppResult<Event>;
    /// Removes the event together with its RSVPs and reviews.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait RsvpRepository: Send + Sync {
    /// Creates the (event, user) RSVP or updates its status in one step.
    /// `None` keeps an existing status and defaults a new one to going.
    async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> AppResult<Upsert<Rsvp>>;
    async fn list_for_user(&self, user_id: Uuid, pagination: Pagination) -> AppResult<Page<Rsvp>>;
    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Rsvp>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Rsvp>>;
    async fn update_status(&self, id: Uuid, status: RsvpStatus) -> AppResult<Rsvp>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts the review unless the user already reviewed the event,
    /// in which case nothing is written and `None` is returned.
    async fn create_if_absent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        values: ReviewValues,
    ) -> AppResult<Option<Review>>;
    async fn list(&self, event_id: Option<Uuid>, pagination: Pagination) -> AppResult<Page<Review>>;
    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Review>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>>;
    async fn update(&self, id: Uuid, values: ReviewValues) -> AppResult<Review>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(Clone)]
pub struct AppRegistry {
    user_repository: Arc<dyn UserRepository>,
    event_repository: Arc<dyn EventRepository>,
    rsvp_repository: Arc<dyn RsvpRepository>,
    review_repository: Arc<dyn ReviewRepository>,
}

impl AppRegistry {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            event_repository: Arc::new(postgres::PgEventRepository::new(pool.clone())),
            rsvp_repository: Arc::new(postgres::PgRsvpRepository::new(pool.clone())),
            review_repository: Arc::new(postgres::PgReviewRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            user_repository: store.clone(),
            event_repository: store.clone(),
            rsvp_repository: store.clone(),
            review_repository: store,
        }
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn events(&self) -> Arc<dyn EventRepository> {
        self.event_repository.clone()
    }

    pub fn rsvps(&self) -> Arc<dyn RsvpRepository> {
        self.rsvp_repository.clone()
    }

    pub fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.review_repository.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const CONCURRENT_CALLS: usize = 16;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_keep_pair_unique() {
        let registry = AppRegistry::in_memory();
        let user = registry
            .users()
            .create(NewUser {
                username: "alice".to_string(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let start = Utc::now() + Duration::days(1);
        let event = registry
            .events()
            .create(
                user.id,
                EventValues {
                    title: "Party".to_string(),
                    description: String::new(),
                    location: "Lisbon".to_string(),
                    start_time: start,
                    end_time: start + Duration::hours(2),
                    is_public: true,
                },
            )
            .await
            .unwrap();

        let (event_id, user_id) = (event.id, user.id);

        let mut rsvp_calls = Vec::new();
        let mut review_calls = Vec::new();
        for i in 0..CONCURRENT_CALLS {
            let rsvps = registry.rsvps();
            rsvp_calls.push(tokio::spawn(async move {
                let status = if i % 2 == 0 {
                    RsvpStatus::Going
                } else {
                    RsvpStatus::Maybe
                };
                rsvps.upsert(event_id, user_id, Some(status)).await
            }));

            let reviews = registry.reviews();
            review_calls.push(tokio::spawn(async move {
                let values = ReviewValues {
                    rating: 4,
                    comment: format!("take {i}"),
                };
                reviews.create_if_absent(event_id, user_id, values).await
            }));
        }

        let mut created = 0;
        for call in rsvp_calls {
            match call.await.unwrap().unwrap() {
                Upsert::Created(_) => created += 1,
                Upsert::Updated(_) => {}
            }
        }
        assert_eq!(created, 1);

        let mut inserted = 0;
        for call in review_calls {
            if call.await.unwrap().unwrap().is_some() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);

        assert_eq!(registry.rsvps().list_for_event(event_id).await.unwrap().len(), 1);
        assert_eq!(registry.reviews().list_for_event(event_id).await.unwrap().len(), 1);
    }
}
