//! Read-only view models for the three panels of the profile page.

use serde::Serialize;
use ts_rs::TS;
use utils::api::profile::ProfileRecord;

use super::profile::{Editor, EditorState};

pub const ROLE_LABEL: &str = "Web Developer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct IdentityHeader {
    pub avatar_url: Option<String>,
    pub full_name: String,
    pub role_label: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct PersonalInformationPanel {
    pub title: String,
    pub edit_trigger: Editor,
    pub fields: Vec<LabeledValue>,
}

/// A showcase entry; `url` is `None` when the user left the field blank, in
/// which case no "Visit" link is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct ShowcaseLink {
    pub label: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct ShowcasePanel {
    pub title: String,
    pub edit_trigger: Editor,
    pub links: Vec<ShowcaseLink>,
}

impl ShowcasePanel {
    pub fn visit_links(&self) -> impl Iterator<Item = &ShowcaseLink> {
        self.links.iter().filter(|link| link.url.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct ProfilePageView {
    pub identity: IdentityHeader,
    pub personal_information: PersonalInformationPanel,
    pub showcase: ShowcasePanel,
    pub editors: EditorState,
    pub busy: bool,
}

impl ProfilePageView {
    pub fn build(record: &ProfileRecord, editors: EditorState, busy: bool) -> Self {
        Self {
            identity: identity_header(record),
            personal_information: personal_information_panel(record),
            showcase: showcase_panel(record),
            editors,
            busy,
        }
    }
}

fn identity_header(record: &ProfileRecord) -> IdentityHeader {
    IdentityHeader {
        avatar_url: non_empty(&record.profile_picture),
        full_name: format!("{} {}", record.first_name, record.last_name)
            .trim()
            .to_owned(),
        role_label: ROLE_LABEL.to_owned(),
        email: record.email.clone(),
    }
}

fn personal_information_panel(record: &ProfileRecord) -> PersonalInformationPanel {
    let fields = [
        ("First Name", &record.first_name),
        ("Last Name", &record.last_name),
        ("Email", &record.email),
        ("About Me", &record.about),
    ]
    .into_iter()
    .map(|(label, value)| LabeledValue {
        label: label.to_owned(),
        value: value.clone(),
    })
    .collect();

    PersonalInformationPanel {
        title: "Personal Information".to_owned(),
        edit_trigger: Editor::PersonalInfo,
        fields,
    }
}

fn showcase_panel(record: &ProfileRecord) -> ShowcasePanel {
    let show_case = &record.show_case;
    let links = [
        ("Linked In", &show_case.linked_in),
        ("Resume", &show_case.resume),
        ("Github", &show_case.github),
        ("Youtube", &show_case.youtube),
        ("Instagram", &show_case.instagram),
    ]
    .into_iter()
    .map(|(label, url)| ShowcaseLink {
        label: label.to_owned(),
        url: non_empty(url),
    })
    .collect();

    ShowcasePanel {
        title: "Work Showcase".to_owned(),
        edit_trigger: Editor::ShowCase,
        links,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
