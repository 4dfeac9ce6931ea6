//! In-process store implementing every repository trait.
//!
//! Used for `STORAGE_BACKEND=memory` and by the test suite. The unique
//! (event, user) pairs and cascading deletes mirror the SQL schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filters::EventFilter;
use crate::models::event::{average_rating, organizer_display_name};
use crate::models::{
    Event, EventValues, NewUser, Profile, ProfileChanges, Review, ReviewValues, Rsvp, RsvpStatus,
    User, UserCredentials,
};
use crate::repository::{
    EventRepository, ReviewRepository, RsvpRepository, Upsert, UserRepository,
};
use crate::utils::response::{Page, Pagination};
use crate::utils::{AppError, AppResult};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredEvent {
    seq: u64,
    organizer_id: Uuid,
    values: EventValues,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct StoredRsvp {
    seq: u64,
    event_id: Uuid,
    user_id: Uuid,
    status: RsvpStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct StoredReview {
    seq: u64,
    event_id: Uuid,
    user_id: Uuid,
    values: ReviewValues,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    next_seq: u64,
    users: HashMap<Uuid, StoredUser>,
    profiles: HashMap<Uuid, Profile>,
    events: HashMap<Uuid, StoredEvent>,
    rsvps: HashMap<Uuid, StoredRsvp>,
    reviews: HashMap<Uuid, StoredReview>,
}

impl MemoryState {
    /// Insertion counter used to order records created within one clock tick.
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn username(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.user.username.clone())
            .unwrap_or_default()
    }

    fn event_title(&self, event_id: Uuid) -> String {
        self.events
            .get(&event_id)
            .map(|e| e.values.title.clone())
            .unwrap_or_default()
    }

    fn event_view(&self, id: Uuid, stored: &StoredEvent) -> Event {
        let (username, first_name, last_name) = self
            .users
            .get(&stored.organizer_id)
            .map(|u| {
                (
                    u.user.username.as_str(),
                    u.user.first_name.as_str(),
                    u.user.last_name.as_str(),
                )
            })
            .unwrap_or_default();
        let full_name = self
            .profiles
            .get(&stored.organizer_id)
            .map(|p| p.full_name.as_str())
            .unwrap_or_default();

        let rsvp_count = self.rsvps.values().filter(|r| r.event_id == id).count() as i64;
        let ratings: Vec<i64> = self
            .reviews
            .values()
            .filter(|r| r.event_id == id)
            .map(|r| i64::from(r.values.rating))
            .collect();
        let review_count = ratings.len() as i64;

        Event {
            id,
            title: stored.values.title.clone(),
            description: stored.values.description.clone(),
            organizer_id: stored.organizer_id,
            organizer_username: username.to_string(),
            organizer_name: organizer_display_name(full_name, first_name, last_name, username),
            location: stored.values.location.clone(),
            start_time: stored.values.start_time,
            end_time: stored.values.end_time,
            is_public: stored.values.is_public,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            rsvp_count,
            review_count,
            average_rating: average_rating(ratings.iter().sum(), review_count),
        }
    }

    fn rsvp_view(&self, id: Uuid, stored: &StoredRsvp) -> Rsvp {
        Rsvp {
            id,
            event_id: stored.event_id,
            user_id: stored.user_id,
            user_username: self.username(stored.user_id),
            event_title: self.event_title(stored.event_id),
            status: stored.status,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    fn review_view(&self, id: Uuid, stored: &StoredReview) -> Review {
        Review {
            id,
            event_id: stored.event_id,
            user_id: stored.user_id,
            user_username: self.username(stored.user_id),
            event_title: self.event_title(stored.event_id),
            rating: stored.values.rating,
            comment: stored.values.comment.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    /// RSVPs matching `keep`, newest first.
    fn rsvps_where(&self, keep: impl Fn(&StoredRsvp) -> bool) -> Vec<Rsvp> {
        let mut matched: Vec<(&Uuid, &StoredRsvp)> =
            self.rsvps.iter().filter(|(_, r)| keep(r)).collect();
        matched.sort_by(|a, b| (b.1.created_at, b.1.seq).cmp(&(a.1.created_at, a.1.seq)));
        matched
            .into_iter()
            .map(|(id, r)| self.rsvp_view(*id, r))
            .collect()
    }

    /// Reviews matching `keep`, newest first.
    fn reviews_where(&self, keep: impl Fn(&StoredReview) -> bool) -> Vec<Review> {
        let mut matched: Vec<(&Uuid, &StoredReview)> =
            self.reviews.iter().filter(|(_, r)| keep(r)).collect();
        matched.sort_by(|a, b| (b.1.created_at, b.1.seq).cmp(&(a.1.created_at, a.1.seq)));
        matched
            .into_iter()
            .map(|(id, r)| self.review_view(*id, r))
            .collect()
    }

    fn require_event_and_user(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if !self.events.contains_key(&event_id) || !self.users.contains_key(&user_id) {
            return Err(AppError::NotFound(
                "Referenced record does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.user.username == new_user.username)
        {
            return Err(AppError::Conflict(
                "A record with these values already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            date_joined: Utc::now(),
        };
        let profile = Profile {
            id: Uuid::new_v4(),
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: String::new(),
            bio: String::new(),
            location: String::new(),
            profile_picture: String::new(),
        };

        state.profiles.insert(user.id, profile);
        state.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|u| u.user.clone()))
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.user.username == username)
            .map(|u| UserCredentials {
                id: u.user.id,
                username: u.user.username.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let state = self.state.read().await;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn update_profile(&self, user_id: Uuid, changes: ProfileChanges) -> AppResult<Profile> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found.".to_string()))?;
        profile.apply(changes);
        Ok(profile.clone())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn list(
        &self,
        viewer: Option<Uuid>,
        filter: &EventFilter,
        pagination: Pagination,
    ) -> AppResult<Page<Event>> {
        let state = self.state.read().await;
        let ordering = filter.ordering();

        let mut matched: Vec<(u64, Event)> = state
            .events
            .iter()
            .map(|(id, stored)| (stored.seq, state.event_view(*id, stored)))
            .filter(|(_, event)| filter.matches(event, viewer))
            .collect();
        matched.sort_by(|a, b| {
            let tie = if ordering.descending {
                b.0.cmp(&a.0)
            } else {
                a.0.cmp(&b.0)
            };
            ordering.compare(&a.1, &b.1).then(tie)
        });

        Ok(Page::from_all(
            matched.into_iter().map(|(_, event)| event).collect(),
            pagination,
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .get(&id)
            .map(|stored| state.event_view(id, stored)))
    }

    async fn create(&self, organizer_id: Uuid, values: EventValues) -> AppResult<Event> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&organizer_id) {
            return Err(AppError::NotFound(
                "Referenced record does not exist".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let seq = state.seq();
        state.events.insert(
            id,
            StoredEvent {
                seq,
                organizer_id,
                values,
                created_at: now,
                updated_at: now,
            },
        );

        let stored = &state.events[&id];
        Ok(state.event_view(id, stored))
    }

    async fn update(&self, id: Uuid, values: EventValues) -> AppResult<Event> {
        let mut state = self.state.write().await;
        let stored = state
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
        stored.values = values;
        stored.updated_at = Utc::now();

        let stored = &state.events[&id];
        Ok(state.event_view(id, stored))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.events.remove(&id).is_none() {
            return Err(AppError::NotFound("Event not found.".to_string()));
        }
        state.rsvps.retain(|_, r| r.event_id != id);
        state.reviews.retain(|_, r| r.event_id != id);
        Ok(())
    }
}

#[async_trait]
impl RsvpRepository for MemoryStore {
    async fn upsert(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> AppResult<Upsert<Rsvp>> {
        // The write lock covers lookup and insert, so the pair stays unique.
        let mut state = self.state.write().await;
        state.require_event_and_user(event_id, user_id)?;

        let existing = state
            .rsvps
            .iter()
            .find(|(_, r)| r.event_id == event_id && r.user_id == user_id)
            .map(|(id, _)| *id);

        if let Some(id) = existing {
            if let Some(stored) = state.rsvps.get_mut(&id) {
                if let Some(status) = status {
                    stored.status = status;
                }
                stored.updated_at = Utc::now();
            }
            let stored = &state.rsvps[&id];
            return Ok(Upsert::Updated(state.rsvp_view(id, stored)));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let seq = state.seq();
        state.rsvps.insert(
            id,
            StoredRsvp {
                seq,
                event_id,
                user_id,
                status: status.unwrap_or_default(),
                created_at: now,
                updated_at: now,
            },
        );
        let stored = &state.rsvps[&id];
        Ok(Upsert::Created(state.rsvp_view(id, stored)))
    }

    async fn list_for_user(&self, user_id: Uuid, pagination: Pagination) -> AppResult<Page<Rsvp>> {
        let state = self.state.read().await;
        Ok(Page::from_all(
            state.rsvps_where(|r| r.user_id == user_id),
            pagination,
        ))
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Rsvp>> {
        let state = self.state.read().await;
        Ok(state.rsvps_where(|r| r.event_id == event_id))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Rsvp>> {
        let state = self.state.read().await;
        Ok(state.rsvps.get(&id).map(|r| state.rsvp_view(id, r)))
    }

    async fn update_status(&self, id: Uuid, status: RsvpStatus) -> AppResult<Rsvp> {
        let mut state = self.state.write().await;
        let stored = state
            .rsvps
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("RSVP not found.".to_string()))?;
        stored.status = status;
        stored.updated_at = Utc::now();

        let stored = &state.rsvps[&id];
        Ok(state.rsvp_view(id, stored))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .rsvps
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("RSVP not found.".to_string()))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_if_absent(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        values: ReviewValues,
    ) -> AppResult<Option<Review>> {
        let mut state = self.state.write().await;
        state.require_event_and_user(event_id, user_id)?;

        if state
            .reviews
            .values()
            .any(|r| r.event_id == event_id && r.user_id == user_id)
        {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let seq = state.seq();
        state.reviews.insert(
            id,
            StoredReview {
                seq,
                event_id,
                user_id,
                values,
                created_at: now,
                updated_at: now,
            },
        );
        let stored = &state.reviews[&id];
        Ok(Some(state.review_view(id, stored)))
    }

    async fn list(&self, event_id: Option<Uuid>, pagination: Pagination) -> AppResult<Page<Review>> {
        let state = self.state.read().await;
        Ok(Page::from_all(
            state.reviews_where(|r| event_id.map_or(true, |id| r.event_id == id)),
            pagination,
        ))
    }

    async fn list_for_event(&self, event_id: Uuid) -> AppResult<Vec<Review>> {
        let state = self.state.read().await;
        Ok(state.reviews_where(|r| r.event_id == event_id))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let state = self.state.read().await;
        Ok(state.reviews.get(&id).map(|r| state.review_view(id, r)))
    }

    async fn update(&self, id: Uuid, values: ReviewValues) -> AppResult<Review> {
        let mut state = self.state.write().await;
        let stored = state
            .reviews
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))?;
        stored.values = values;
        stored.updated_at = Utc::now();

        let stored = &state.reviews[&id];
        Ok(state.review_view(id, stored))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))
    }
}
