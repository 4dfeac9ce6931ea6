use axum::extract::FromRequest;

use crate::utils::error::AppError;

/// `axum::Json` whose rejections render as 400 through [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
