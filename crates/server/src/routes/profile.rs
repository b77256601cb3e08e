use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Json, Multipart, Path, State},
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use serde::Serialize;
use services::services::{
    notification::{CHANGES_SAVED_MESSAGE, GENERAL_ERROR_MESSAGE, USER_NOT_FOUND_MESSAGE},
    profile::{
        Editor, LoadOutcome, PendingFile, PersonalInfoEdit, ProfilePicture, ProfileViewController,
        SubmitOutcome,
    },
    profile_view::ProfilePageView,
};
use tracing::instrument;
use ts_rs::TS;
use utils::{
    api::profile::{PersonalInfo, ProfileRecord, ShowCase},
    response::ApiResponse,
};

use crate::{AppState, error::ApiError, session::SessionUser};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/reload", post(reload_profile))
        .route("/profile/editors/personal_info", get(personal_form_values))
        .route("/profile/editors/show_case", get(show_case_form_values))
        .route("/profile/editors/{editor}/open", post(open_editor))
        .route("/profile/editors/{editor}/close", post(close_editor))
        .route(
            "/profile/personal",
            patch(update_personal_info)
                .post(upload_personal_info)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/profile/showcase", patch(update_show_case))
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ProfilePageResponse {
    pub profile: ProfileRecord,
    pub view: ProfilePageView,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ReloadResponse {
    pub outcome: LoadOutcome,
    pub page: ProfilePageResponse,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub page: ProfilePageResponse,
}

pub async fn page_response(page: &ProfileViewController) -> ProfilePageResponse {
    let profile = page.state().await;
    let view = ProfilePageView::build(&profile, page.editors().await, page.is_busy());
    ProfilePageResponse { profile, view }
}

async fn submit_response(
    page: &ProfileViewController,
    outcome: SubmitOutcome,
) -> ApiResponse<SubmitResponse> {
    let data = SubmitResponse {
        outcome,
        page: page_response(page).await,
    };
    match outcome {
        SubmitOutcome::Saved => ApiResponse::success_with_message(data, CHANGES_SAVED_MESSAGE),
        SubmitOutcome::Failed => ApiResponse::error_with_data(data, GENERAL_ERROR_MESSAGE),
    }
}

#[instrument(name = "profile.get", skip_all, fields(user_id = %user.user_id))]
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ResponseJson<ApiResponse<ProfilePageResponse>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    ResponseJson(ApiResponse::success(page_response(page).await))
}

#[instrument(name = "profile.reload", skip_all, fields(user_id = %user.user_id))]
async fn reload_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ResponseJson<ApiResponse<ReloadResponse>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    let outcome = page.load().await;
    let data = ReloadResponse {
        outcome,
        page: page_response(page).await,
    };
    ResponseJson(match outcome {
        LoadOutcome::Loaded => ApiResponse::success(data),
        LoadOutcome::NotFound => ApiResponse::error_with_data(data, USER_NOT_FOUND_MESSAGE),
        LoadOutcome::Failed => ApiResponse::error_with_data(data, GENERAL_ERROR_MESSAGE),
    })
}

async fn personal_form_values(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ResponseJson<ApiResponse<PersonalInfo>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    ResponseJson(ApiResponse::success(
        page.personal_form_initial_values().await,
    ))
}

async fn show_case_form_values(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ResponseJson<ApiResponse<ShowCase>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    ResponseJson(ApiResponse::success(
        page.show_case_form_initial_values().await,
    ))
}

async fn open_editor(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(editor): Path<Editor>,
) -> ResponseJson<ApiResponse<ProfilePageResponse>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    page.open_editor(editor).await;
    ResponseJson(ApiResponse::success(page_response(page).await))
}

async fn close_editor(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(editor): Path<Editor>,
) -> ResponseJson<ApiResponse<ProfilePageResponse>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    page.close_editor(editor).await;
    ResponseJson(ApiResponse::success(page_response(page).await))
}

/// Personal-info save where the picture is already a URL.
#[instrument(name = "profile.update_personal_info", skip_all, fields(user_id = %user.user_id))]
async fn update_personal_info(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<PersonalInfo>,
) -> ResponseJson<ApiResponse<SubmitResponse>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    let outcome = page
        .submit_personal_info(PersonalInfoEdit::from(payload))
        .await;
    ResponseJson(submit_response(page, outcome).await)
}

/// Personal-info save from a multipart form. A `profile_picture` part with a
/// file name is a newly chosen picture; a plain text part is the current URL.
#[instrument(name = "profile.upload_personal_info", skip_all, fields(user_id = %user.user_id))]
async fn upload_personal_info(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    mut multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<SubmitResponse>>, ApiError> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    let current = page.personal_form_initial_values().await;

    let mut info = PersonalInfo::default();
    let mut picture = ProfilePicture::Uploaded(current.profile_picture);

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "first_name" => info.first_name = field.text().await?,
            "last_name" => info.last_name = field.text().await?,
            "email" => info.email = field.text().await?,
            "about" => info.about = field.text().await?,
            "profile_picture" => {
                let file_name = field.file_name().map(str::to_owned);
                match file_name {
                    // An empty file input still submits a part with a blank name.
                    Some(file_name) if file_name.is_empty() => {}
                    Some(file_name) => {
                        let bytes = field.bytes().await?;
                        picture = ProfilePicture::Pending(PendingFile {
                            name: file_name,
                            bytes,
                        });
                    }
                    None => picture = ProfilePicture::Uploaded(field.text().await?),
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    let edit = PersonalInfoEdit {
        first_name: info.first_name,
        last_name: info.last_name,
        email: info.email,
        about: info.about,
        profile_picture: picture,
    };
    let outcome = page.submit_personal_info(edit).await;
    Ok(ResponseJson(submit_response(page, outcome).await))
}

#[instrument(name = "profile.update_show_case", skip_all, fields(user_id = %user.user_id))]
async fn update_show_case(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<ShowCase>,
) -> ResponseJson<ApiResponse<SubmitResponse>> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    let outcome = page.submit_show_case(payload).await;
    ResponseJson(submit_response(page, outcome).await)
}
