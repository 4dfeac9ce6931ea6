use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "rsvp_status", rename_all = "snake_case")]
pub enum RsvpStatus {
    #[default]
    Going,
    Maybe,
    NotGoing,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    #[serde(rename = "event")]
    pub event_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub user_username: String,
    pub event_title: String,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /rsvps`.
#[derive(Debug, Deserialize)]
pub struct CreateRsvpRequest {
    pub event: Uuid,
    #[serde(default)]
    pub status: Option<RsvpStatus>,
}

/// Body of `PUT` / `PATCH /rsvps/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateRsvpRequest {
    #[serde(default)]
    pub status: Option<RsvpStatus>,
}

impl UpdateRsvpRequest {
    /// A full update must name the new status; a partial one may keep the old.
    pub fn resolve(self, current: RsvpStatus, partial: bool) -> AppResult<RsvpStatus> {
        match (self.status, partial) {
            (Some(status), _) => Ok(status),
            (None, true) => Ok(current),
            (None, false) => Err(AppError::field("status", "This field is required.")),
        }
    }
}
