//! Server-rendered HTML for the profile page.

use axum::{
    Extension, Router,
    extract::State,
    response::Html,
    routing::get,
};
use services::services::{
    profile::{Editor, EditorState},
    profile_view::{IdentityHeader, PersonalInformationPanel, ProfilePageView, ShowcasePanel},
};

use crate::{AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile_page))
}

async fn profile_page(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Html<String> {
    let mounted = state.pages().mount(&user.user_id).await;
    let page = mounted.controller();
    let view = ProfilePageView::build(&page.state().await, page.editors().await, page.is_busy());
    Html(render_profile_page(&view))
}

pub fn render_profile_page(view: &ProfilePageView) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>My Profile</title>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 1.5rem; display: flex; flex-direction: column; gap: 1.5rem; }}
      section {{ border: 1px solid #eee; border-radius: 8px; padding: 1rem; }}
      .avatar {{ width: 96px; height: 96px; border-radius: 50%; object-fit: cover; }}
      .label {{ color: grey; }}
      .panel-head {{ display: flex; justify-content: space-between; font-size: 1.2rem; }}
      dl {{ display: grid; grid-template-columns: repeat(2, 1fr); gap: 1.5rem; }}
    </style>
  </head>
  <body{busy}>
{identity}
{personal}
{showcase}
  </body>
</html>
"#,
        busy = if view.busy { r#" data-busy="true""# } else { "" },
        identity = render_identity(&view.identity),
        personal = render_personal_information(&view.personal_information, view.editors),
        showcase = render_showcase(&view.showcase, view.editors),
    )
}

fn render_identity(identity: &IdentityHeader) -> String {
    let avatar = match &identity.avatar_url {
        Some(url) => format!(r#"<img class="avatar" src="{}" alt="">"#, escape(url)),
        None => r#"<div class="avatar"></div>"#.to_owned(),
    };
    format!(
        r#"    <section class="identity">
      {avatar}
      <div class="name">{name}</div>
      <div class="role">{role}</div>
      <div class="email">{email}</div>
    </section>"#,
        avatar = avatar,
        name = escape(&identity.full_name),
        role = escape(&identity.role_label),
        email = escape(&identity.email),
    )
}

fn render_personal_information(panel: &PersonalInformationPanel, editors: EditorState) -> String {
    let fields = panel
        .fields
        .iter()
        .map(|field| {
            format!(
                r#"        <div><dt class="label">{}</dt><dd>{}</dd></div>"#,
                escape(&field.label),
                escape(&field.value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    render_panel(&panel.title, panel.edit_trigger, editors, &fields)
}

fn render_showcase(panel: &ShowcasePanel, editors: EditorState) -> String {
    let links = panel
        .links
        .iter()
        .map(|link| {
            let value = match &link.url {
                Some(url) => format!(
                    r#"<a href="{}" target="_blank" rel="noopener">Visit</a>"#,
                    escape(url)
                ),
                None => String::new(),
            };
            format!(
                r#"        <div><dt class="label">{}</dt><dd>{}</dd></div>"#,
                escape(&link.label),
                value
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    render_panel(&panel.title, panel.edit_trigger, editors, &links)
}

fn render_panel(title: &str, editor: Editor, editors: EditorState, body: &str) -> String {
    let open = if editors.is_open(editor) {
        r#" data-editor-open="true""#
    } else {
        ""
    };
    let editor = match editor {
        Editor::PersonalInfo => "personal_info",
        Editor::ShowCase => "show_case",
    };
    format!(
        r#"    <section{open}>
      <div class="panel-head">
        <span>{title}</span>
        <button type="button" data-editor="{editor}">Edit</button>
      </div>
      <dl>
{body}
      </dl>
    </section>"#,
        open = open,
        title = escape(title),
        editor = editor,
        body = body,
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
