use std::{env, fs, path::PathBuf};

use server::routes::profile::{ProfilePageResponse, ReloadResponse, SubmitResponse};
use services::services::{
    notification::{Notification, Severity},
    profile::{Editor, EditorState, LoadOutcome, SubmitOutcome},
    profile_view::{
        IdentityHeader, LabeledValue, PersonalInformationPanel, ProfilePageView, ShowcaseLink,
        ShowcasePanel,
    },
};
use ts_rs::TS;
use utils::api::profile::{PersonalInfo, ProfileRecord, ShowCase};

fn main() -> anyhow::Result<()> {
    let out = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared/types.ts"));

    let decls = [
        ShowCase::decl(),
        PersonalInfo::decl(),
        ProfileRecord::decl(),
        Editor::decl(),
        EditorState::decl(),
        LoadOutcome::decl(),
        SubmitOutcome::decl(),
        Severity::decl(),
        Notification::decl(),
        IdentityHeader::decl(),
        LabeledValue::decl(),
        PersonalInformationPanel::decl(),
        ShowcaseLink::decl(),
        ShowcasePanel::decl(),
        ProfilePageView::decl(),
        ProfilePageResponse::decl(),
        ReloadResponse::decl(),
        SubmitResponse::decl(),
    ];

    let mut contents = String::from(
        "// This file was generated by `generate-types`. Do not edit it by hand.\n\n",
    );
    for decl in decls {
        contents.push_str("export ");
        contents.push_str(&decl);
        contents.push_str("\n\n");
    }

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out, contents)?;
    println!("wrote {}", out.display());
    Ok(())
}
