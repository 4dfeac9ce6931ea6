//! Authorization predicates evaluated per request against a target record.
//!
//! The predicates are pure; the `ensure_*` helpers turn a failed check into
//! the [`AppError`] the handlers return.

use uuid::Uuid;

use crate::models::{Event, Review, Rsvp};
use crate::utils::{AppError, AppResult};

const PRIVATE_EVENT_MESSAGE: &str = "You do not have permission to view this private event.";
const NOT_INVITED_MESSAGE: &str = "This is a private event. You are not invited.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// A record with a single user holding write rights over it.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Event {
    fn owner_id(&self) -> Uuid {
        self.organizer_id
    }
}

impl Owned for Rsvp {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Review {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

fn write_restricted_to_owner<T: Owned>(access: Access, record: &T, requester: Option<Uuid>) -> bool {
    match access {
        Access::Read => true,
        Access::Write => requester == Some(record.owner_id()),
    }
}

/// Reads always pass; writes only for the organizer.
pub fn organizer_write_only(access: Access, event: &Event, requester: Option<Uuid>) -> bool {
    write_restricted_to_owner(access, event, requester)
}

/// Reads always pass; writes only for the RSVP's or review's author.
pub fn owner_write_only<T: Owned>(access: Access, record: &T, requester: Option<Uuid>) -> bool {
    write_restricted_to_owner(access, record, requester)
}

/// Public events are visible to everyone, private ones to their organizer.
///
/// There is no invitee list; this same rule decides RSVP eligibility.
pub fn visible_to(event: &Event, requester: Option<Uuid>) -> bool {
    event.is_public || requester == Some(event.organizer_id)
}

pub fn ensure_can_view(event: &Event, requester: Option<Uuid>) -> AppResult<()> {
    if visible_to(event, requester) {
        Ok(())
    } else {
        Err(AppError::Forbidden(PRIVATE_EVENT_MESSAGE.to_string()))
    }
}

pub fn ensure_organizer(event: &Event, requester: Uuid) -> AppResult<()> {
    if organizer_write_only(Access::Write, event, Some(requester)) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the organizer can modify this event.".to_string(),
        ))
    }
}

pub fn ensure_owner<T: Owned>(record: &T, requester: Uuid) -> AppResult<()> {
    if owner_write_only(Access::Write, record, Some(requester)) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ))
    }
}

/// RSVPs to an event the requester cannot see are a validation failure.
pub fn ensure_rsvp_eligible(event: &Event, requester: Uuid) -> AppResult<()> {
    if visible_to(event, Some(requester)) {
        Ok(())
    } else {
        Err(AppError::ValidationError(NOT_INVITED_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RsvpStatus;
    use chrono::{Duration, Utc};

    fn event(organizer_id: Uuid, is_public: bool) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            description: String::new(),
            organizer_id,
            organizer_username: "org".to_string(),
            organizer_name: "org".to_string(),
            location: "HQ".to_string(),
            start_time: now,
            end_time: now + Duration::hours(1),
            is_public,
            created_at: now,
            updated_at: now,
            rsvp_count: 0,
            review_count: 0,
            average_rating: None,
        }
    }

    fn rsvp(user_id: Uuid) -> Rsvp {
        Rsvp {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            user_id,
            user_username: "u".to_string(),
            event_title: "Launch".to_string(),
            status: RsvpStatus::Going,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_organizer_write_only() {
        let organizer = Uuid::new_v4();
        let other = Uuid::new_v4();
        let e = event(organizer, true);

        assert!(organizer_write_only(Access::Read, &e, None));
        assert!(organizer_write_only(Access::Read, &e, Some(other)));
        assert!(organizer_write_only(Access::Write, &e, Some(organizer)));
        assert!(!organizer_write_only(Access::Write, &e, Some(other)));
        assert!(!organizer_write_only(Access::Write, &e, None));
    }

    #[test]
    fn test_visibility_gate() {
        let organizer = Uuid::new_v4();
        let other = Uuid::new_v4();

        let public = event(organizer, true);
        assert!(visible_to(&public, None));
        assert!(visible_to(&public, Some(other)));

        let private = event(organizer, false);
        assert!(!visible_to(&private, None));
        assert!(!visible_to(&private, Some(other)));
        assert!(visible_to(&private, Some(organizer)));
    }

    #[test]
    fn test_owner_write_only() {
        let owner = Uuid::new_v4();
        let r = rsvp(owner);
        assert!(owner_write_only(Access::Read, &r, None));
        assert!(owner_write_only(Access::Write, &r, Some(owner)));
        assert!(!owner_write_only(Access::Write, &r, Some(Uuid::new_v4())));
    }

    #[test]
    fn test_failed_checks_map_to_errors() {
        let organizer = Uuid::new_v4();
        let private = event(organizer, false);
        let outsider = Uuid::new_v4();

        assert!(matches!(
            ensure_can_view(&private, Some(outsider)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_rsvp_eligible(&private, outsider),
            Err(AppError::ValidationError(_))
        ));
        assert!(ensure_rsvp_eligible(&private, organizer).is_ok());
        assert!(matches!(
            ensure_organizer(&private, outsider),
            Err(AppError::Forbidden(_))
        ));
    }
}
