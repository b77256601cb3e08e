use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

/// Header carrying the signed-in user's id, set by the upstream authenticator.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
}

pub async fn require_user(mut req: Request<Body>, next: Next) -> Response {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    let Some(user_id) = user_id else {
        warn!("request without `{USER_ID_HEADER}` header");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    req.extensions_mut().insert(SessionUser { user_id });
    next.run(req).await
}
