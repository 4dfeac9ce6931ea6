//! PostgreSQL implementations backed by a `sqlx` pool.

mod event;
mod review;
mod rsvp;
mod user;

pub use event::PgEventRepository;
pub use review::PgReviewRepository;
pub use rsvp::PgRsvpRepository;
pub use user::PgUserRepository;
