use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use garde::Validate;

use super::rules::{ends_after, not_blank};
use crate::utils::AppResult;

/// Event joined with its organizer and aggregated RSVP / review figures.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub organizer_username: String,
    pub organizer_first_name: String,
    pub organizer_last_name: String,
    pub organizer_full_name: String,
    pub rsvp_count: i64,
    pub review_count: i64,
    pub rating_sum: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "organizer")]
    pub organizer_id: Uuid,
    pub organizer_username: String,
    pub organizer_name: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub rsvp_count: i64,
    pub review_count: i64,
    pub average_rating: Option<Decimal>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        let organizer_name = organizer_display_name(
            &row.organizer_full_name,
            &row.organizer_first_name,
            &row.organizer_last_name,
            &row.organizer_username,
        );
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            organizer_id: row.organizer_id,
            organizer_username: row.organizer_username,
            organizer_name,
            location: row.location,
            start_time: row.start_time,
            end_time: row.end_time,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
            rsvp_count: row.rsvp_count,
            review_count: row.review_count,
            average_rating: average_rating(row.rating_sum, row.review_count),
        }
    }
}

/// Profile full name, then "first last", then the username.
pub fn organizer_display_name(
    full_name: &str,
    first_name: &str,
    last_name: &str,
    username: &str,
) -> String {
    if !full_name.trim().is_empty() {
        return full_name.to_string();
    }
    let joined = format!("{} {}", first_name, last_name);
    let joined = joined.trim();
    if joined.is_empty() {
        username.to_string()
    } else {
        joined.to_string()
    }
}

/// Mean rating rounded to two decimal places, or `None` without reviews.
pub fn average_rating(rating_sum: i64, review_count: i64) -> Option<Decimal> {
    if review_count <= 0 {
        return None;
    }
    let mean = Decimal::from(rating_sum) / Decimal::from(review_count);
    Some(mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Complete, validated event fields used for inserts and updates.
#[derive(Debug, Clone, Validate)]
pub struct EventValues {
    #[garde(length(chars, max = 255), custom(not_blank))]
    pub title: String,
    #[garde(skip)]
    pub description: String,
    #[garde(length(chars, max = 255), custom(not_blank))]
    pub location: String,
    #[garde(skip)]
    pub start_time: DateTime<Utc>,
    #[garde(custom(ends_after(&self.start_time)))]
    pub end_time: DateTime<Utc>,
    #[garde(skip)]
    pub is_public: bool,
}

impl EventValues {
    fn checked(self) -> AppResult<Self> {
        self.validate(&())?;
        Ok(self)
    }
}

/// Body of `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
}

fn default_is_public() -> bool {
    true
}

impl EventRequest {
    pub fn into_values(self) -> AppResult<EventValues> {
        EventValues {
            title: self.title,
            description: self.description,
            location: self.location,
            start_time: self.start_time,
            end_time: self.end_time,
            is_public: self.is_public,
        }
        .checked()
    }
}

/// Body of `PATCH /events/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
}

impl EventPatch {
    /// Overlays the patch on the stored event and validates the result.
    pub fn merge(self, current: &Event) -> AppResult<EventValues> {
        EventValues {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            location: self.location.unwrap_or_else(|| current.location.clone()),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            is_public: self.is_public.unwrap_or(current.is_public),
        }
        .checked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AppError;
    use chrono::Duration;
    use std::str::FromStr;

    fn request() -> EventRequest {
        let start = Utc::now() + Duration::days(1);
        EventRequest {
            title: "Rust Meetup".to_string(),
            description: "Monthly meetup".to_string(),
            location: "Berlin".to_string(),
            start_time: start,
            end_time: start + Duration::hours(3),
            is_public: true,
        }
    }

    #[test]
    fn test_average_rating_none_without_reviews() {
        assert_eq!(average_rating(0, 0), None);
    }

    #[test]
    fn test_average_rating_rounds_to_two_places() {
        // 5 + 4 + 4 = 13 / 3 = 4.333...
        assert_eq!(average_rating(13, 3), Some(Decimal::from_str("4.33").unwrap()));
        // 5 + 4 + 4 + 4 + 4 + 4 = 25 / 6 = 4.1666...
        assert_eq!(average_rating(25, 6), Some(Decimal::from_str("4.17").unwrap()));
        assert_eq!(average_rating(5, 1), Some(Decimal::from(5)));
    }

    #[test]
    fn test_organizer_display_name_fallbacks() {
        assert_eq!(organizer_display_name("Ada L.", "Ada", "Lovelace", "ada"), "Ada L.");
        assert_eq!(organizer_display_name("", "Ada", "Lovelace", "ada"), "Ada Lovelace");
        assert_eq!(organizer_display_name("", "Ada", "", "ada"), "Ada");
        assert_eq!(organizer_display_name("  ", "", "", "ada"), "ada");
    }

    fn failed_field(result: AppResult<EventValues>) -> String {
        match result {
            Err(AppError::InvalidFields(report)) => report
                .iter()
                .map(|(path, _)| path.to_string())
                .next()
                .unwrap_or_default(),
            other => panic!("expected a validation report, got {other:?}"),
        }
    }

    #[test]
    fn test_event_request_validation() {
        assert!(request().into_values().is_ok());

        let mut blank = request();
        blank.title = "   ".to_string();
        assert_eq!(failed_field(blank.into_values()), "title");

        let mut long_location = request();
        long_location.location = "x".repeat(256);
        assert_eq!(failed_field(long_location.into_values()), "location");

        let mut backwards = request();
        backwards.end_time = backwards.start_time - Duration::hours(1);
        assert_eq!(failed_field(backwards.into_values()), "end_time");

        let mut instant = request();
        instant.end_time = instant.start_time;
        assert_eq!(failed_field(instant.into_values()), "end_time");
    }

    #[test]
    fn test_patch_merges_over_current_values() {
        let values = request().into_values().unwrap();
        let current = Event {
            id: Uuid::new_v4(),
            title: values.title,
            description: values.description,
            organizer_id: Uuid::new_v4(),
            organizer_username: "ada".to_string(),
            organizer_name: "ada".to_string(),
            location: values.location,
            start_time: values.start_time,
            end_time: values.end_time,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            rsvp_count: 0,
            review_count: 0,
            average_rating: None,
        };

        let patch = EventPatch {
            is_public: Some(false),
            ..Default::default()
        };
        let merged = patch.merge(&current).unwrap();
        assert!(!merged.is_public);
        assert_eq!(merged.title, "Rust Meetup");

        let bad = EventPatch {
            end_time: Some(current.start_time),
            ..Default::default()
        };
        assert!(bad.merge(&current).is_err());
    }
}
