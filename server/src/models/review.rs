use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::rules::not_blank;
use crate::utils::{AppError, AppResult};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    #[serde(rename = "event")]
    pub event_id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub user_username: String,
    pub event_title: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn rating_in_range(rating: &i64, _: &()) -> garde::Result {
    if !(MIN_RATING..=MAX_RATING).contains(rating) {
        return Err(garde::Error::new("Rating must be between 1 and 5."));
    }
    Ok(())
}

fn optional_rating(rating: &Option<i64>, ctx: &()) -> garde::Result {
    rating.as_ref().map_or(Ok(()), |r| rating_in_range(r, ctx))
}

fn optional_comment(comment: &Option<String>, ctx: &()) -> garde::Result {
    comment.as_deref().map_or(Ok(()), |c| not_blank(c, ctx))
}

/// Ratings narrow to the column type only after `rating_in_range` passed.
fn narrow(rating: i64) -> i16 {
    rating as i16
}

#[derive(Debug, Clone)]
pub struct ReviewValues {
    pub rating: i16,
    pub comment: String,
}

/// Body of `POST /reviews`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[garde(skip)]
    pub event: Uuid,
    #[garde(custom(rating_in_range))]
    pub rating: i64,
    #[garde(custom(not_blank))]
    pub comment: String,
}

impl CreateReviewRequest {
    pub fn into_values(self) -> AppResult<(Uuid, ReviewValues)> {
        self.validate(&())?;
        Ok((
            self.event,
            ReviewValues {
                rating: narrow(self.rating),
                comment: self.comment,
            },
        ))
    }
}

/// Body of `PUT` / `PATCH /reviews/{id}`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[garde(custom(optional_rating))]
    pub rating: Option<i64>,
    #[garde(custom(optional_comment))]
    pub comment: Option<String>,
}

impl UpdateReviewRequest {
    pub fn merge(self, current: &Review, partial: bool) -> AppResult<ReviewValues> {
        if !partial {
            if self.rating.is_none() {
                return Err(AppError::field("rating", "This field is required."));
            }
            if self.comment.is_none() {
                return Err(AppError::field("comment", "This field is required."));
            }
        }
        self.validate(&())?;

        Ok(ReviewValues {
            rating: self.rating.map_or(current.rating, narrow),
            comment: self.comment.unwrap_or_else(|| current.comment.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(rating: i64, comment: &str) -> CreateReviewRequest {
        CreateReviewRequest {
            event: Uuid::new_v4(),
            rating,
            comment: comment.to_string(),
        }
    }

    #[test]
    fn test_rating_accepts_exactly_one_to_five() {
        for rating in -10..=10 {
            let result = create(rating, "fine").into_values();
            if (1..=5).contains(&rating) {
                assert_eq!(result.unwrap().1.rating, rating as i16);
            } else {
                assert!(result.is_err(), "rating {} should be rejected", rating);
            }
        }
        assert!(create(i64::MAX, "fine").into_values().is_err());
        assert!(create(i64::from(i16::MAX) + 6, "fine").into_values().is_err());
    }

    #[test]
    fn test_rating_error_message() {
        match create(7, "fine").into_values() {
            Err(AppError::InvalidFields(report)) => {
                let (path, error) = report.iter().next().unwrap();
                assert_eq!(path.to_string(), "rating");
                assert_eq!(error.to_string(), "Rating must be between 1 and 5.");
            }
            other => panic!("expected rating report, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_comment_rejected() {
        assert!(create(4, "  ").into_values().is_err());
    }

    #[test]
    fn test_update_rejects_out_of_range_rating() {
        let req = UpdateReviewRequest {
            rating: Some(0),
            comment: None,
        };
        assert!(req.validate(&()).is_err());
    }

    #[test]
    fn test_partial_update_keeps_existing_values() {
        let current = Review {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_username: "bob".to_string(),
            event_title: "Launch".to_string(),
            rating: 3,
            comment: "ok".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let patch = UpdateReviewRequest {
            rating: Some(5),
            comment: None,
        };
        let merged = patch.merge(&current, true).unwrap();
        assert_eq!(merged.rating, 5);
        assert_eq!(merged.comment, "ok");

        let put = UpdateReviewRequest {
            rating: Some(5),
            comment: None,
        };
        assert!(put.merge(&current, false).is_err());
    }
}
