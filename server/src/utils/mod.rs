pub mod error;
pub mod json;
pub mod query;
pub mod response;

pub use error::{AppError, AppResult};
pub use json::ApiJson;
pub use query::ApiQuery;
