use axum::extract::FromRequestParts;

use crate::utils::error::AppError;

/// `axum::extract::Query` whose rejections render as 400 through [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
