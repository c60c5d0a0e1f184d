use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejections are turned into plain-text 400 responses.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
