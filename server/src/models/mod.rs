pub mod event;
pub mod review;
pub mod rsvp;
pub mod rules;
pub mod user;

pub use event::{Event, EventPatch, EventRequest, EventRow, EventValues};
pub use review::{CreateReviewRequest, Review, ReviewValues, UpdateReviewRequest};
pub use rsvp::{CreateRsvpRequest, Rsvp, RsvpStatus, UpdateRsvpRequest};
pub use user::{NewUser, Profile, ProfileChanges, User, UserCredentials};
