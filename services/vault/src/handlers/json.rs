use axum::extract::FromRequest;

use crate::error::VaultError;

/// `axum::Json` whose rejections use the `{kind, message}` error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(VaultError))]
pub struct JsonBody<T>(pub T);
