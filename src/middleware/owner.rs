use crate::common::response::ApiError;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

/// Header carrying the user id that the upstream gateway has already authenticated.
pub const OWNER_HEADER: &str = "x-user-id";

/// Authenticated owner of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerId(pub i64);

pub fn owner_from_headers(headers: &HeaderMap) -> Option<OwnerId> {
    headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .map(OwnerId)
}

/// Rejects requests without a usable owner id and exposes it to handlers as
/// `Extension<OwnerId>`.
pub async fn owner_middleware(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let owner = owner_from_headers(req.headers()).ok_or_else(|| {
        ApiError(
            "Unauthorized: missing or invalid user id".to_string(),
            StatusCode::UNAUTHORIZED,
        )
    })?;

    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}
