//! Query-parameter filters for the event listing.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::Event;
use crate::permissions::visible_to;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub title: Option<String>,
    pub location: Option<String>,
    /// Substring of the organizer's username.
    pub organizer: Option<String>,
    pub is_public: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl EventFilter {
    /// Events starting at or after midnight (UTC) of `start_date`.
    pub fn start_bound(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Inclusive upper bound at midnight (UTC) of `end_date`.
    pub fn end_bound(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn ordering(&self) -> EventOrdering {
        self.ordering
            .as_deref()
            .and_then(EventOrdering::parse)
            .unwrap_or_default()
    }

    pub fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    pub fn title_term(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn location_term(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    pub fn organizer_term(&self) -> Option<&str> {
        non_blank(self.organizer.as_deref())
    }

    /// In-process evaluation of the listing scope plus every filter.
    pub fn matches(&self, event: &Event, viewer: Option<Uuid>) -> bool {
        if !visible_to(event, viewer) {
            return false;
        }
        if let Some(term) = self.title_term() {
            if !contains_ci(&event.title, term) {
                return false;
            }
        }
        if let Some(term) = self.location_term() {
            if !contains_ci(&event.location, term) {
                return false;
            }
        }
        if let Some(term) = self.organizer_term() {
            if !contains_ci(&event.organizer_username, term) {
                return false;
            }
        }
        if let Some(is_public) = self.is_public {
            if event.is_public != is_public {
                return false;
            }
        }
        if let Some(bound) = self.start_bound() {
            if event.start_time < bound {
                return false;
            }
        }
        if let Some(bound) = self.end_bound() {
            if event.end_time > bound {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let hit = [
                &event.title,
                &event.description,
                &event.location,
                &event.organizer_username,
            ]
            .iter()
            .any(|field| contains_ci(field, term));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    StartTime,
    CreatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventOrdering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for EventOrdering {
    fn default() -> Self {
        Self {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl EventOrdering {
    /// Parses `field` or `-field`; unknown fields yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        let field = match name {
            "start_time" => OrderField::StartTime,
            "created_at" => OrderField::CreatedAt,
            "title" => OrderField::Title,
            _ => return None,
        };
        Some(Self { field, descending })
    }

    pub fn sql(&self) -> &'static str {
        match (self.field, self.descending) {
            (OrderField::StartTime, false) => "e.start_time ASC, e.id ASC",
            (OrderField::StartTime, true) => "e.start_time DESC, e.id DESC",
            (OrderField::CreatedAt, false) => "e.created_at ASC, e.id ASC",
            (OrderField::CreatedAt, true) => "e.created_at DESC, e.id DESC",
            (OrderField::Title, false) => "e.title ASC, e.id ASC",
            (OrderField::Title, true) => "e.title DESC, e.id DESC",
        }
    }

    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let ord = match self.field {
            OrderField::StartTime => a.start_time.cmp(&b.start_time),
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderField::Title => a.title.cmp(&b.title),
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(title: &str, organizer: &str, is_public: bool) -> Event {
        let start = Utc.with_ymd_and_hms(2030, 5, 10, 18, 0, 0).unwrap();
        Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "An evening of talks".to_string(),
            organizer_id: Uuid::new_v4(),
            organizer_username: organizer.to_string(),
            organizer_name: organizer.to_string(),
            location: "New York".to_string(),
            start_time: start,
            end_time: start + Duration::hours(4),
            is_public,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            rsvp_count: 0,
            review_count: 0,
            average_rating: None,
        }
    }

    #[test]
    fn test_ordering_parse() {
        assert_eq!(
            EventOrdering::parse("-start_time"),
            Some(EventOrdering {
                field: OrderField::StartTime,
                descending: true
            })
        );
        assert_eq!(
            EventOrdering::parse("title").map(|o| o.descending),
            Some(false)
        );
        assert_eq!(EventOrdering::parse("organizer"), None);

        let filter = EventFilter {
            ordering: Some("bogus".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.ordering(), EventOrdering::default());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }

    #[test]
    fn test_substring_filters_are_case_insensitive() {
        let e = event("RustConf", "ferris", true);
        let filter = EventFilter {
            title: Some("rustc".to_string()),
            location: Some("york".to_string()),
            organizer: Some("FERR".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&e, None));

        let miss = EventFilter {
            title: Some("golang".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&e, None));
    }

    #[test]
    fn test_private_events_need_organizer_viewer() {
        let e = event("Secret", "org", false);
        let filter = EventFilter::default();
        assert!(!filter.matches(&e, None));
        assert!(!filter.matches(&e, Some(Uuid::new_v4())));
        assert!(filter.matches(&e, Some(e.organizer_id)));
    }

    #[test]
    fn test_date_range_filters() {
        let e = event("Talks", "org", true);
        let spanning = EventFilter {
            start_date: NaiveDate::from_ymd_opt(2030, 5, 10),
            end_date: NaiveDate::from_ymd_opt(2030, 5, 11),
            ..Default::default()
        };
        assert!(spanning.matches(&e, None));

        // The event ends at 22:00, after midnight of its own day.
        let same_day = EventFilter {
            end_date: NaiveDate::from_ymd_opt(2030, 5, 10),
            ..Default::default()
        };
        assert!(!same_day.matches(&e, None));

        let too_late = EventFilter {
            start_date: NaiveDate::from_ymd_opt(2030, 5, 11),
            ..Default::default()
        };
        assert!(!too_late.matches(&e, None));

        let ends_at_midnight = Event {
            end_time: Utc.with_ymd_and_hms(2030, 5, 11, 0, 0, 0).unwrap(),
            ..e.clone()
        };
        assert!(spanning.matches(&ends_at_midnight, None));

        let too_early = EventFilter {
            end_date: NaiveDate::from_ymd_opt(2030, 5, 9),
            ..Default::default()
        };
        assert!(!too_early.matches(&e, None));
    }

    #[test]
    fn test_search_covers_description_and_organizer() {
        let e = event("Meetup", "grace", true);
        let by_description = EventFilter {
            search: Some("TALKS".to_string()),
            ..Default::default()
        };
        assert!(by_description.matches(&e, None));

        let by_organizer = EventFilter {
            search: Some("grace".to_string()),
            ..Default::default()
        };
        assert!(by_organizer.matches(&e, None));

        let blank = EventFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.matches(&e, None));
    }
}
