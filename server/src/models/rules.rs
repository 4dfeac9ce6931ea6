//! Custom `garde` rules shared by the request models.

use chrono::{DateTime, Utc};
use garde::Validate;

pub fn not_blank(value: &str, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("This field may not be blank."));
    }
    Ok(())
}

/// `end_time` must be strictly later than the paired start.
pub fn ends_after(start: &DateTime<Utc>) -> impl FnOnce(&DateTime<Utc>, &()) -> garde::Result + '_ {
    move |end, _| {
        if end <= start {
            return Err(garde::Error::new("End time must be after start time."));
        }
        Ok(())
    }
}

#[derive(Validate)]
struct Link {
    #[garde(url)]
    href: String,
}

/// An empty value clears the link; anything else must be an http(s) URL.
pub fn optional_http_url(value: &Option<String>, _: &()) -> garde::Result {
    let Some(href) = value.as_deref().filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let parses = Link {
        href: href.to_string(),
    }
    .validate(&())
    .is_ok();

    if parses && (href.starts_with("http://") || href.starts_with("https://")) {
        Ok(())
    } else {
        Err(garde::Error::new("Enter a valid URL."))
    }
}
