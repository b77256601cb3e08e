use axum::{Extension, Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::notification::Notification;
use utils::response::ApiResponse;

use crate::{AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new().route("/notifications", get(drain_notifications))
}

/// Hands out every alert raised on the caller's page since the previous call.
async fn drain_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ResponseJson<ApiResponse<Vec<Notification>>> {
    let page = state.pages().mount(&user.user_id).await;
    ResponseJson(ApiResponse::success(page.notifications().drain().await))
}
